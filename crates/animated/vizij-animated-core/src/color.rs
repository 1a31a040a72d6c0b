//! CSS colour canonicalisation for string interpolation.
//!
//! Recognised colours are rewritten as `rgba(r, g, b, a)` with integral channels
//! and `a = alpha_byte / 255`, so samples written in different syntaxes share one
//! numeric shape. Anything unrecognised is returned untouched.

use crate::value::format_number;

/// Packed `0xRRGGBBAA` colour.
pub type Rgba32 = u32;

/// Canonicalise `input` to `rgba(...)` if it is a colour, otherwise return it as is.
pub fn color_to_rgba(input: &str) -> String {
    match normalize_color(input) {
        Some(packed) => {
            let r = (packed >> 24) & 0xff;
            let g = (packed >> 16) & 0xff;
            let b = (packed >> 8) & 0xff;
            let a = f64::from(packed & 0xff) / 255.0;
            format!("rgba({r}, {g}, {b}, {})", format_number(a))
        }
        None => input.to_string(),
    }
}

/// Parse a CSS colour into packed RGBA bytes.
pub fn normalize_color(input: &str) -> Option<Rgba32> {
    let input = input.trim();
    if let Some(hex) = input.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = function_args(input, "rgba") {
        let [r, g, b, a] = fixed_args::<4>(&args)?;
        return Some(pack(parse_255(r)?, parse_255(g)?, parse_255(b)?, parse_alpha(a)?));
    }
    if let Some(args) = function_args(input, "rgb") {
        let [r, g, b] = fixed_args::<3>(&args)?;
        return Some(pack(parse_255(r)?, parse_255(g)?, parse_255(b)?, 0xff));
    }
    if let Some(args) = function_args(input, "hsla") {
        let [h, s, l, a] = fixed_args::<4>(&args)?;
        let rgb = hsl_to_rgb(parse_360(h)?, parse_percentage(s)?, parse_percentage(l)?);
        return Some(rgb | parse_alpha(a)?);
    }
    if let Some(args) = function_args(input, "hsl") {
        let [h, s, l] = fixed_args::<3>(&args)?;
        let rgb = hsl_to_rgb(parse_360(h)?, parse_percentage(s)?, parse_percentage(l)?);
        return Some(rgb | 0xff);
    }
    named_color(input)
}

fn pack(r: u32, g: u32, b: u32, a: u32) -> Rgba32 {
    (r << 24) | (g << 16) | (b << 8) | a
}

fn parse_hex(hex: &str) -> Option<Rgba32> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expand = |s: &str| -> Option<u32> {
        let doubled: String = s.chars().flat_map(|c| [c, c]).collect();
        u32::from_str_radix(&doubled, 16).ok()
    };
    match hex.len() {
        3 => Some((expand(hex)? << 8) | 0xff),
        4 => expand(hex),
        6 => Some((u32::from_str_radix(hex, 16).ok()? << 8) | 0xff),
        8 => u32::from_str_radix(hex, 16).ok(),
        _ => None,
    }
}

/// Arguments of `name(...)`, split on commas and trimmed.
fn function_args<'a>(input: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let head = input.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = input[name.len()..].trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

fn fixed_args<'a, const N: usize>(args: &[&'a str]) -> Option<[&'a str; N]> {
    args.try_into().ok()
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Channels truncate toward zero before clamping.
fn parse_255(s: &str) -> Option<u32> {
    let v = parse_number(s)?.trunc();
    Some(v.clamp(0.0, 255.0) as u32)
}

fn parse_alpha(s: &str) -> Option<u32> {
    let v = parse_number(s)?.clamp(0.0, 1.0);
    Some(round_half_up(v * 255.0) as u32)
}

fn parse_360(s: &str) -> Option<f64> {
    let v = parse_number(s.trim_end_matches("deg"))?;
    Some((((v % 360.0) + 360.0) % 360.0) / 360.0)
}

fn parse_percentage(s: &str) -> Option<f64> {
    let v = parse_number(s.strip_suffix('%')?)?;
    Some(v.clamp(0.0, 100.0) / 100.0)
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// RGB bytes of an HSL colour, alpha byte left at zero.
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgba32 {
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f64| round_half_up(hue_to_rgb(p, q, t) * 255.0).clamp(0.0, 255.0) as u32;
    pack(
        channel(h + 1.0 / 3.0),
        channel(h),
        channel(h - 1.0 / 3.0),
        0,
    )
}

fn named_color(name: &str) -> Option<Rgba32> {
    let lower = name.to_ascii_lowercase();
    if lower == "transparent" {
        return Some(0x0000_0000);
    }
    NAMED_COLORS
        .binary_search_by(|(n, _)| n.cmp(&lower.as_str()))
        .ok()
        .map(|idx| (NAMED_COLORS[idx].1 << 8) | 0xff)
}

/// CSS named colours as `0xRRGGBB`, sorted by name.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("burntsienna", 0xea7e5d),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

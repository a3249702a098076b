use once_cell::sync::Lazy;
use regex::Regex;

static RGB_FUNC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+\s*)?\)$")
        .unwrap()
});

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, bare hex digits,
    /// `rgb(...)`/`rgba(...)` and the common CSS color names. Alpha is
    /// discarded.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(caps) = RGB_FUNC_RE.captures(trimmed) {
            let channel = |idx: usize| caps.get(idx)?.as_str().parse::<u8>().ok();
            return Some(Self::new(channel(1)?, channel(2)?, channel(3)?));
        }
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if let Some(rgb) = parse_hex(hex) {
            return Some(rgb);
        }
        named_color(&trimmed.to_ascii_lowercase())
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise linear interpolation, `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let value = a as f64 + (b as f64 - a as f64) * t;
            value.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// YIQ brightness in `[0, 255]`.
    pub fn brightness(self) -> f64 {
        (self.r as f64 * 299.0 + self.g as f64 * 587.0 + self.b as f64 * 114.0) / 1000.0
    }

    pub fn is_light(self) -> bool {
        self.brightness() >= 128.0
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let digit = |idx: usize| u8::from_str_radix(&hex[idx..idx + 1], 16).ok();
            let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
            Some(Rgb::new(r * 17, g * 17, b * 17))
        }
        6 | 8 => {
            let pair = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
            Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::BLACK,
        "white" => Rgb::WHITE,
        "red" => Rgb::new(255, 0, 0),
        "lime" => Rgb::new(0, 255, 0),
        "green" => Rgb::new(0, 128, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "orange" => Rgb::new(255, 165, 0),
        "purple" => Rgb::new(128, 0, 128),
        "cyan" | "aqua" => Rgb::new(0, 255, 255),
        "magenta" | "fuchsia" => Rgb::new(255, 0, 255),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "silver" => Rgb::new(192, 192, 192),
        "maroon" => Rgb::new(128, 0, 0),
        "navy" => Rgb::new(0, 0, 128),
        "olive" => Rgb::new(128, 128, 0),
        "teal" => Rgb::new(0, 128, 128),
        "pink" => Rgb::new(255, 192, 203),
        "brown" => Rgb::new(165, 42, 42),
        _ => return None,
    };
    Some(rgb)
}

/// Picks the text color that reads best on `fill`. Unparsable fills get
/// the dark text color.
pub fn contrast_text<'a>(fill: &str, dark: &'a str, light: &'a str) -> &'a str {
    match Rgb::parse(fill) {
        Some(rgb) if !rgb.is_light() => light,
        _ => dark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb::parse("#ff6666"), Some(Rgb::new(255, 102, 102)));
        assert_eq!(Rgb::parse("FF6666"), Some(Rgb::new(255, 102, 102)));
        assert_eq!(Rgb::parse("#0f0"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("#1234567"), None);
        assert_eq!(Rgb::parse("#gg0000"), None);
    }

    #[test]
    fn hex_alpha_channel_is_dropped() {
        assert_eq!(Rgb::parse("#ff6666ff"), Some(Rgb::new(255, 102, 102)));
        assert_eq!(Rgb::parse("#8ec84380"), Some(Rgb::new(142, 200, 67)));
        assert_eq!(Rgb::parse("#0f08"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::parse("#ff6666ff").map(Rgb::to_hex).as_deref(), Some("#ff6666"));
    }

    #[test]
    fn parses_functional_and_named_colors() {
        assert_eq!(Rgb::parse("rgb(1, 2, 3)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(Rgb::parse("rgba(10,20,30, 0.5)"), Some(Rgb::new(10, 20, 30)));
        assert_eq!(Rgb::parse("Red"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse("not-a-color"), None);
        assert_eq!(Rgb::parse(""), None);
    }

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        let red = Rgb::new(255, 0, 0);
        let green = Rgb::new(0, 255, 0);
        assert_eq!(red.lerp(green, 0.0), red);
        assert_eq!(red.lerp(green, 1.0), green);
        assert_eq!(red.lerp(green, 0.5).to_hex(), "#808000");
    }

    #[test]
    fn contrast_text_flips_on_dark_fills() {
        assert_eq!(contrast_text("#ffffff", "black", "white"), "black");
        assert_eq!(contrast_text("#000080", "black", "white"), "white");
        assert_eq!(contrast_text("#000080ff", "black", "white"), "white");
        assert_eq!(contrast_text("???", "black", "white"), "black");
    }
}

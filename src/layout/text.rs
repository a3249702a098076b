use crate::config::LayoutConfig;
use crate::text_metrics;

/// Label lines sized to fit a box.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub line_height: f32,
    pub width: f32,
    pub height: f32,
}

/// Wraps `text` on word boundaries and shrinks the font from `max_font`
/// until the block fits `max_width` x `max_height`, stopping at the
/// configured minimum font size.
pub(crate) fn fit_text(
    text: &str,
    max_width: f32,
    max_height: f32,
    max_font: f32,
    font_family: &str,
    config: &LayoutConfig,
) -> FittedText {
    let min_font = config.min_font_size.max(1.0);
    let mut font_size = max_font.max(min_font);
    if text.trim().is_empty() {
        return FittedText {
            lines: Vec::new(),
            font_size,
            line_height: font_size * config.line_height,
            width: 0.0,
            height: 0.0,
        };
    }
    loop {
        let lines = wrap_words(text, max_width, font_size, font_family, config.fast_text_metrics);
        let width = lines
            .iter()
            .map(|line| text_width(line, font_size, font_family, config.fast_text_metrics))
            .fold(0.0, f32::max);
        let line_height = font_size * config.line_height;
        let height = lines.len() as f32 * line_height;
        let fits = width <= max_width && height <= max_height;
        if fits || font_size <= min_font {
            return FittedText {
                lines,
                font_size,
                line_height,
                width,
                height,
            };
        }
        font_size = (font_size - 0.5).max(min_font);
    }
}

pub(crate) fn text_width(text: &str, font_size: f32, font_family: &str, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return fallback_text_width(text, font_size);
    }
    text_metrics::measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Rough em-relative advance for a sans-serif face.
fn char_width_factor(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 0.26,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '/' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.88,
        'A'..='Z' => 0.66,
        '0'..='9' => 0.58,
        c if c.is_ascii() => 0.55,
        c if (c as u32) >= 0x2E80 => 1.0,
        _ => 0.6,
    }
}

pub(crate) fn wrap_words(
    text: &str,
    max_width: f32,
    font_size: f32,
    font_family: &str,
    fast_metrics: bool,
) -> Vec<String> {
    let trimmed = text.trim();
    if text_width(trimmed, font_size, font_family, fast_metrics) <= max_width {
        return vec![trimmed.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in trimmed.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && text_width(&candidate, font_size, font_family, fast_metrics) > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

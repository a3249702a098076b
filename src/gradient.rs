use serde::Deserialize;
use serde_json::Value;

use crate::color::Rgb;
use crate::error::{ExportError, Result};

/// Color stops spread evenly over the integer domain `[min_value, max_value]`.
///
/// Only constructed through [`Gradient::new`] (or deserialization, which
/// goes through the same checks), so every stop is a parsable color and
/// the domain is well formed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawGradient")]
pub struct Gradient {
    colors: Vec<String>,
    stops: Vec<Rgb>,
    min_value: i64,
    max_value: i64,
}

impl Gradient {
    pub fn new(colors: Vec<String>, min_value: i64, max_value: i64) -> Result<Self> {
        if colors.is_empty() {
            return Err(ExportError::InvalidField {
                type_name: "Gradient",
                field: "colors",
                expected: "a non-empty array of color strings",
            });
        }
        let mut stops = Vec::with_capacity(colors.len());
        for (index, value) in colors.iter().enumerate() {
            let rgb = Rgb::parse(value).ok_or_else(|| ExportError::InvalidColor {
                index,
                value: value.clone(),
            })?;
            stops.push(rgb);
        }
        if min_value > max_value {
            return Err(ExportError::InvertedRange {
                min: min_value,
                max: max_value,
            });
        }
        if min_value == max_value && colors.len() > 1 {
            return Err(ExportError::EmptyRange(min_value));
        }
        Ok(Self {
            colors,
            stops,
            min_value,
            max_value,
        })
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    /// Segment index and local fraction for `value` after clamping into the
    /// domain. Single-stop gradients always report `(0, 0.0)`.
    pub fn interpolation_position(&self, value: f64) -> (usize, f64) {
        let segments = self.stops.len() - 1;
        if segments == 0 {
            return (0, 0.0);
        }
        let min = self.min_value as f64;
        let max = self.max_value as f64;
        let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
        let position = (clamped - min) / (max - min);
        let scaled = position * segments as f64;
        let index = (scaled.floor().max(0.0) as usize).min(segments - 1);
        (index, scaled - index as f64)
    }

    pub fn compute_color(&self, value: f64) -> String {
        if self.stops.len() == 1 {
            return self.colors[0].clone();
        }
        let (index, t) = self.interpolation_position(value);
        if t <= 0.0 {
            return self.colors[index].clone();
        }
        if t >= 1.0 {
            return self.colors[index + 1].clone();
        }
        self.stops[index].lerp(self.stops[index + 1], t).to_hex()
    }

    /// Values the header legend samples: `min_value`, then `2N - 1`
    /// multiples of `floor(max_value / 2N)`. Negative maxima floor toward
    /// negative infinity.
    pub fn legend_points(&self) -> Vec<i64> {
        let count = 2 * self.colors.len() as i64;
        let step = self.max_value.div_euclid(count);
        std::iter::once(self.min_value)
            .chain((1..count).map(|i| step * i))
            .collect()
    }

    /// Swatch colors for the header legend, one per [`Gradient::legend_points`] value.
    pub fn legend_samples(&self) -> Vec<String> {
        self.legend_points()
            .into_iter()
            .map(|value| self.compute_color(value as f64))
            .collect()
    }
}

/// Wire form, kept loosely typed so a mismatch can name the offending field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGradient {
    colors: Value,
    min_value: Value,
    max_value: Value,
}

impl TryFrom<RawGradient> for Gradient {
    type Error = ExportError;

    fn try_from(raw: RawGradient) -> Result<Self> {
        let colors = raw
            .colors
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or(ExportError::InvalidField {
                type_name: "Gradient",
                field: "colors",
                expected: "an array of strings",
            })?;
        let min_value = raw.min_value.as_i64().ok_or(ExportError::InvalidField {
            type_name: "Gradient",
            field: "minValue",
            expected: "an integer",
        })?;
        let max_value = raw.max_value.as_i64().ok_or(ExportError::InvalidField {
            type_name: "Gradient",
            field: "maxValue",
            expected: "an integer",
        })?;
        Gradient::new(colors, min_value, max_value)
    }
}

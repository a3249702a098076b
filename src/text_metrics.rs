use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static FONT_MEASURER: Lazy<Mutex<FontMeasurer>> = Lazy::new(|| Mutex::new(FontMeasurer::default()));

/// Advance width of `text` in the first installed font of the CSS-style
/// `font_family` list. `None` when no matching font is available.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = FONT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

#[derive(Default)]
struct FontMeasurer {
    db: Option<Database>,
    faces: HashMap<String, Option<FaceMetrics>>,
}

impl FontMeasurer {
    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.faces.contains_key(&key) {
            let metrics = self.load(&key);
            self.faces.insert(key.clone(), metrics);
        }
        let metrics = self.faces.get(&key)?.as_ref()?;
        Some(metrics.width(text, font_size))
    }

    fn load(&mut self, font_family: &str) -> Option<FaceMetrics> {
        let db = self.db.get_or_insert_with(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            db
        });
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names.iter().map(|name| css_family(name)).collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = db.query(&query)?;
        db.with_face_data(id, |data, index| FaceMetrics::parse(data.to_vec(), index))
            .flatten()
    }
}

fn css_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

struct FaceMetrics {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascii_advances: [u16; 128],
    fallback_advance: u16,
}

impl FaceMetrics {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let (units_per_em, ascii_advances, fallback_advance) = {
            let face = Face::parse(&data, index).ok()?;
            let units_per_em = face.units_per_em().max(1);
            let mut advances = [0u16; 128];
            for byte in 0u8..=127 {
                if let Some(glyph) = face.glyph_index(byte as char) {
                    advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
                }
            }
            let fallback = (units_per_em as f32 * 0.56) as u16;
            (units_per_em, advances, fallback)
        };
        Some(Self {
            data,
            index,
            units_per_em: units_per_em as f32,
            ascii_advances,
            fallback_advance,
        })
    }

    fn width(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em;
        let face = if text.is_ascii() {
            None
        } else {
            Face::parse(&self.data, self.index).ok()
        };
        let mut units = 0u32;
        for ch in text.chars() {
            let advance = if ch.is_ascii() {
                self.ascii_advances[ch as usize]
            } else {
                face.as_ref()
                    .and_then(|face| face.glyph_index(ch).and_then(|g| face.glyph_hor_advance(g)))
                    .unwrap_or(0)
            };
            units += if advance == 0 { self.fallback_advance } else { advance } as u32;
        }
        units as f32 * scale
    }
}

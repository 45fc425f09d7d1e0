use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use ttf_parser::{Face, GlyphId};

static FACE_CACHE: Lazy<Mutex<FaceCache>> = Lazy::new(|| Mutex::new(FaceCache::new()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Oblique => "oblique",
        }
    }
}

/// Fully resolved font: everything needed to measure and paint a line.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub style: FontStyle,
    pub line_height: f32,
}

impl FontSpec {
    /// Vertical advance of one line set in this font.
    pub fn line_size(&self) -> f32 {
        self.size * self.line_height
    }

    /// CSS shorthand, e.g. `italic 600 12px sans-serif`.
    pub fn css(&self) -> String {
        format!(
            "{} {} {}px {}",
            self.style.as_css(),
            self.weight,
            self.size,
            self.family
        )
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 12.0,
            weight: 400,
            style: FontStyle::Normal,
            line_height: 1.2,
        }
    }
}

/// Source of text widths. Heights come from [`FontSpec::line_size`].
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;
}

/// Measures against installed system fonts, falling back to
/// [`FastMetrics`] when no face can be resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMetrics;

impl TextMeasure for FontMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        measure_text_width(text, font).unwrap_or_else(|| FastMetrics.text_width(text, font))
    }
}

/// Deterministic per-character estimate; needs no fonts on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastMetrics;

impl TextMeasure for FastMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        let bold_scale = if font.weight >= 600 { 1.06 } else { 1.0 };
        text.chars().map(char_width_factor).sum::<f32>() * font.size * bold_scale
    }
}

pub fn measure_text_width(text: &str, font: &FontSpec) -> Option<f32> {
    if text.is_empty() || font.size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = FACE_CACHE.lock().ok()?;
    guard.measure(text, font)
}

fn char_width_factor(ch: char) -> f32 {
    // Advance widths of a typical sans-serif face, in ems.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' | 'K' | 'V' | 'X' | 'Y' => 0.652,
        'B' | 'R' | 'P' | 'S' => 0.633,
        'C' | 'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'U' => 0.742,
        'E' | 'F' | 'L' | 'T' | 'Z' => 0.590,
        'I' => 0.272,
        'J' => 0.557,
        'M' => 0.903,
        'W' => 0.958,
        'f' | 'r' | 't' => 0.340,
        'i' | 'j' | 'l' => 0.235,
        'm' => 0.867,
        'w' => 0.811,
        'a'..='z' => 0.570,
        '1' => 0.396,
        '0'..='9' => 0.605,
        '@' | '#' | '%' | '&' => 0.946,
        '\u{2026}' => 1.0,
        _ => 0.568,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    weight: u16,
    style: FontStyle,
}

impl FaceKey {
    fn from_spec(font: &FontSpec) -> Self {
        let trimmed = font.family.trim();
        Self {
            family: if trimmed.is_empty() {
                "sans-serif".to_string()
            } else {
                trimmed.to_string()
            },
            weight: font.weight,
            style: font.style,
        }
    }

    fn cache_name(&self) -> String {
        format!("{}|{}|{}", self.family, self.weight, self.style.as_css())
    }
}

struct FaceCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<FaceKey, Option<FontFace>>,
}

impl FaceCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font: &FontSpec) -> Option<f32> {
        let key = FaceKey::from_spec(font);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get_mut(&key).and_then(|face| face.as_mut())?;
        face.measure_width(&text.replace('\t', "    "), font.size)
    }

    fn load_face(&mut self, key: &FaceKey) -> Option<FontFace> {
        if let Some(face) = load_cached_face(key) {
            return Some(face);
        }

        let names: Vec<String> = key
            .family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names.iter().map(|name| generic_or_named(name)).collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight(key.weight),
            stretch: Stretch::Normal,
            style: match key.style {
                FontStyle::Normal => Style::Normal,
                FontStyle::Italic => Style::Italic,
                FontStyle::Oblique => Style::Oblique,
            },
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FontFace> = None;
        self.db.with_face_data(id, |data, index| {
            let bytes = data.to_vec();
            if Face::parse(&bytes, index).is_ok() {
                if let Some((font_path, meta_path)) = cache_paths(key)
                    && !font_path.exists()
                {
                    if let Some(parent) = font_path.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    let _ = fs::write(&font_path, &bytes);
                    let _ = fs::write(&meta_path, index.to_string());
                }
                loaded = FontFace::new(bytes, index);
            }
        });
        loaded
    }
}

fn generic_or_named(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

/// Horizontal advances extracted once from a parsed face.
struct FontFace {
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advances: HashMap<char, Option<u16>>,
    data: Vec<u8>,
    index: u32,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph_id) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph_id).unwrap_or(0);
            }
        }
        let units_per_em = face.units_per_em().max(1);
        Some(Self {
            units_per_em,
            ascii_advances,
            advances: HashMap::new(),
            data,
            index,
        })
    }

    fn advance(&mut self, ch: char) -> Option<u16> {
        if ch.is_ascii() {
            let advance = self.ascii_advances[ch as usize];
            return (advance > 0).then_some(advance);
        }
        if let Some(cached) = self.advances.get(&ch) {
            return *cached;
        }
        let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
            let glyph: GlyphId = face.glyph_index(ch)?;
            face.glyph_hor_advance(glyph)
        });
        self.advances.insert(ch, advance);
        advance
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            width += match self.advance(ch) {
                Some(advance) => advance as f32 * scale,
                None => fallback,
            };
        }
        Some(width.max(0.0))
    }
}

fn cache_paths(key: &FaceKey) -> Option<(PathBuf, PathBuf)> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.cache_name().hash(&mut hasher);
    let hash = hasher.finish();
    let dir = base.join("outlabels").join("font-cache");
    Some((
        dir.join(format!("{hash:x}.font")),
        dir.join(format!("{hash:x}.meta")),
    ))
}

fn load_cached_face(key: &FaceKey) -> Option<FontFace> {
    let (font_path, meta_path) = cache_paths(key)?;
    if !font_path.exists() || !meta_path.exists() {
        return None;
    }
    let bytes = fs::read(font_path).ok()?;
    let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
    FontFace::new(bytes, index)
}

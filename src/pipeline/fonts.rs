//! Report fonts: discovery, validation and text measurement.
//!
//! The report is Vietnamese, so the built-in PDF base fonts (WinAnsi only)
//! cannot draw it. One regular and one bold TrueType face are embedded
//! instead, taken either from explicit files or from the system font
//! database (`fontdb`).
//!
//! A face is accepted only if `ttf-parser` can parse it and it has a glyph
//! for every character of [`VIETNAMESE_PROBE`]. Measuring uses the real
//! horizontal advances so word wrapping matches what is drawn.

use crate::config::FontSource;
use crate::error::RenderError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Characters a report font must be able to draw.
///
/// Covers the Vietnamese letters outside Latin-1 plus a sample of the
/// stacked tone marks.
pub const VIETNAMESE_PROBE: &str =
    "ĂăÂâĐđÊêÔôƠơƯư ạảấầẩẫậắằẳẵặẹẻẽếềểễệỉịọỏốồổỗộớờởỡợụủứừửữựỳỵỷỹ";

/// System families tried in order before any sans-serif.
const PREFERRED_FAMILIES: [&str; 4] = ["DejaVu Sans", "Noto Sans", "Liberation Sans", "Arial"];

/// A parsed and validated font face.
#[derive(Clone)]
pub struct FontFace {
    /// Display name used in error messages and logs.
    pub name: String,
    pub data: Arc<Vec<u8>>,
    /// Face index inside a font collection (0 for plain `.ttf`).
    pub index: u32,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("name", &self.name)
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

impl FontFace {
    /// Parse `data` and reject it unless it covers the Vietnamese alphabet.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>, index: u32) -> Result<Self, RenderError> {
        let face = Self {
            name: name.into(),
            data: Arc::new(data),
            index,
        };
        let missing = face.missing_glyphs(VIETNAMESE_PROBE)?;
        if !missing.is_empty() {
            return Err(RenderError::FontCoverage {
                font: face.name,
                missing: missing.into_iter().collect(),
            });
        }
        Ok(face)
    }

    /// Read a font file from disk.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path)
            .map_err(|e| RenderError::FontUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(path.display().to_string(), data, 0)
    }

    fn parse(&self) -> Result<ttf_parser::Face<'_>, RenderError> {
        ttf_parser::Face::parse(&self.data, self.index).map_err(|_| RenderError::FontParse {
            font: self.name.clone(),
        })
    }

    /// Characters of `text` (whitespace excluded) the face has no glyph for.
    pub fn missing_glyphs(&self, text: &str) -> Result<Vec<char>, RenderError> {
        let face = self.parse()?;
        Ok(text
            .chars()
            .filter(|c| !c.is_whitespace() && face.glyph_index(*c).is_none())
            .collect())
    }

    /// Width of `text` in points at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let Ok(face) = self.parse() else {
            // Validated at load; only reachable for hand-built faces.
            return text.chars().count() as f32 * size * 0.5;
        };
        let units_per_em = f32::from(face.units_per_em().max(1));
        let units: u32 = text
            .chars()
            .map(|c| {
                face.glyph_index(c)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map_or(0, u32::from)
            })
            .sum();
        units as f32 * size / units_per_em
    }
}

/// The regular and bold faces of one render call.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: FontFace,
    pub bold: FontFace,
}

impl FontSet {
    /// Load the faces described by `source`.
    ///
    /// Without a usable bold face, the regular face is used for labels too.
    pub fn load(source: &FontSource) -> Result<Self, RenderError> {
        match source {
            FontSource::Files { regular, bold } => {
                let regular = FontFace::from_path(regular)?;
                let bold = match bold {
                    Some(path) => FontFace::from_path(path)?,
                    None => regular.clone(),
                };
                Ok(Self { regular, bold })
            }
            FontSource::System => load_system(),
        }
    }
}

// ── System discovery ─────────────────────────────────────────────────────

fn load_system() -> Result<FontSet, RenderError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!("fontdb: {} system faces", db.len());

    let mut families: Vec<fontdb::Family<'_>> = PREFERRED_FAMILIES
        .iter()
        .map(|name| fontdb::Family::Name(name))
        .collect();
    families.push(fontdb::Family::SansSerif);

    let mut last_err = None;
    for family in &families {
        let Some((regular, family_name)) = query_face(&db, *family, fontdb::Weight::NORMAL) else {
            continue;
        };
        let regular = match regular {
            Ok(face) => face,
            Err(e) => {
                debug!("Skipping system font {:?}: {}", family, e);
                last_err = Some(e);
                continue;
            }
        };

        let bold = match query_face(&db, fontdb::Family::Name(&family_name), fontdb::Weight::BOLD) {
            Some((Ok(face), _)) => face,
            _ => {
                warn!("No bold face for {}; labels use the regular face", family_name);
                regular.clone()
            }
        };

        debug!("Report fonts: {} / {}", regular.name, bold.name);
        return Ok(FontSet { regular, bold });
    }

    Err(last_err.unwrap_or_else(|| {
        RenderError::FontUnavailable("no sans-serif system font found".into())
    }))
}

/// Best face of `family` at `weight`, validated, with its family name.
fn query_face(
    db: &fontdb::Database,
    family: fontdb::Family<'_>,
    weight: fontdb::Weight,
) -> Option<(Result<FontFace, RenderError>, String)> {
    let id = db.query(&fontdb::Query {
        families: &[family],
        weight,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    })?;
    let info = db.face(id)?;
    let family_name = info
        .families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| info.post_script_name.clone());
    let name = info.post_script_name.clone();

    let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
    Some((FontFace::from_bytes(name, data, index), family_name))
}

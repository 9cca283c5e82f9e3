//! Slide fonts.
//!
//! Fonts are read from configured paths at startup. A path that is missing or
//! does not parse falls back to the DejaVu Sans face compiled into the binary,
//! so rendering never depends on the host's font packages.

use std::path::Path;

use ab_glyph::FontArc;

use crate::error::RenderError;

static EMBEDDED_REGULAR: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Bold face for headlines and slide numbers, regular face for body text.
#[derive(Clone)]
pub struct FontSet {
    pub bold: FontArc,
    pub regular: FontArc,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet").finish_non_exhaustive()
    }
}

impl FontSet {
    /// Both faces from the embedded font.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] if the embedded font cannot be parsed.
    pub fn embedded() -> Result<Self, RenderError> {
        let face = embedded_face()?;
        Ok(Self {
            bold: face.clone(),
            regular: face,
        })
    }

    /// Loads both faces from disk, substituting the embedded font per face.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] only if a fallback is needed and the
    /// embedded font cannot be parsed.
    pub fn load(bold_path: &Path, regular_path: &Path) -> Result<Self, RenderError> {
        let bold = match read_face(bold_path) {
            Some(face) => face,
            None => embedded_face()?,
        };
        let regular = match read_face(regular_path) {
            Some(face) => face,
            None => embedded_face()?,
        };
        Ok(Self { bold, regular })
    }
}

fn embedded_face() -> Result<FontArc, RenderError> {
    FontArc::try_from_slice(EMBEDDED_REGULAR)
        .map_err(|e| RenderError::Font(format!("embedded font: {e}")))
}

fn read_face(path: &Path) -> Option<FontArc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "font not readable; using embedded font");
            return None;
        }
    };

    match FontArc::try_from_vec(bytes) {
        Ok(face) => Some(face),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "font did not parse; using embedded font");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_font_parses() {
        assert!(FontSet::embedded().is_ok());
    }

    #[test]
    fn missing_paths_fall_back_to_embedded() {
        let fonts = FontSet::load(
            Path::new("/nonexistent/bold.ttf"),
            Path::new("/nonexistent/regular.ttf"),
        );
        assert!(fonts.is_ok());
    }

    #[test]
    fn garbage_font_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").expect("write");

        assert!(read_face(&path).is_none());
        assert!(FontSet::load(&path, &path).is_ok());
    }
}

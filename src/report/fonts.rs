//! Fonts available to the PDF report.
//!
//! Text is always written with `WinAnsiEncoding`, so both the built-in
//! Helvetica and an embedded TrueType font share one 256-entry width table
//! measured in thousandths of an em.

use std::path::Path;

pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TrueType font: {0}")]
    Parse(String),
}

/// TrueType program plus the descriptor values a PDF viewer needs
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub base_name: String,
    pub data: Vec<u8>,
    pub ascent: i64,
    pub descent: i64,
    pub cap_height: i64,
    pub bbox: [i64; 4],
}

#[derive(Debug, Clone)]
pub enum FontProgram {
    Helvetica,
    TrueType(EmbeddedFont),
}

#[derive(Debug, Clone)]
pub struct ReportFont {
    program: FontProgram,
    widths: Vec<u16>,
}

impl ReportFont {
    pub fn helvetica() -> Self {
        let widths = (0..=255u8)
            .map(|code| win_ansi_char(code).map(helvetica_width).unwrap_or(0))
            .collect();

        Self {
            program: FontProgram::Helvetica,
            widths,
        }
    }

    /// Register a TrueType font file for embedding
    pub fn from_truetype(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        let face =
            ttf_parser::Face::parse(&data, 0).map_err(|e| FontError::Parse(e.to_string()))?;

        let units = f32::from(face.units_per_em());
        if units <= 0.0 {
            return Err(FontError::Parse("units per em is zero".to_string()));
        }
        let scale = |v: i16| (f32::from(v) * 1000.0 / units).round() as i64;

        let missing = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|w| (f32::from(w) * 1000.0 / units).round() as u16)
            .unwrap_or(500);

        let widths = (0..=255u8)
            .map(|code| {
                win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|w| (f32::from(w) * 1000.0 / units).round() as u16)
                    .unwrap_or(missing)
            })
            .collect();

        let bbox = face.global_bounding_box();
        let base_name: String = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();

        let embedded = EmbeddedFont {
            base_name: if base_name.is_empty() {
                "EmbeddedFont".to_string()
            } else {
                base_name
            },
            ascent: scale(face.ascender()),
            descent: scale(face.descender()),
            cap_height: scale(face.capital_height().unwrap_or_else(|| face.ascender())),
            bbox: [
                scale(bbox.x_min),
                scale(bbox.y_min),
                scale(bbox.x_max),
                scale(bbox.y_max),
            ],
            data,
        };

        Ok(Self {
            program: FontProgram::TrueType(embedded),
            widths,
        })
    }

    /// Try the TrueType font and quietly fall back to Helvetica.
    pub fn load_or_fallback(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::from_truetype(path) {
                Ok(font) => font,
                Err(e) => {
                    log::debug!(
                        "Font {} unavailable ({}), using Helvetica",
                        path.display(),
                        e
                    );
                    Self::helvetica()
                }
            },
            None => Self::helvetica(),
        }
    }

    pub fn program(&self) -> &FontProgram {
        &self.program
    }

    pub fn widths(&self) -> &[u16] {
        &self.widths
    }

    /// Width of `text` in points at `size`
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = encode_win_ansi(text)
            .iter()
            .map(|code| u32::from(self.widths[usize::from(*code)]))
            .sum();
        units as f32 * size / 1000.0
    }

    /// Shorten `text` with an ellipsis until it fits in `max_width`
    pub fn fit_text(&self, text: &str, size: f32, max_width: f32) -> String {
        if self.text_width(text, size) <= max_width {
            return text.to_string();
        }

        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate: String = chars.iter().collect::<String>() + "…";
            if self.text_width(&candidate, size) <= max_width {
                return candidate;
            }
        }
        String::new()
    }

    /// Break `text` into lines no wider than `max_width`; overlong words keep their own line.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if self.text_width(&candidate, size) <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        if !current.is_empty() || lines.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// Code points 0x80..=0x9F of WinAnsiEncoding
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

/// Character drawn for a WinAnsi code, if the code is printable
pub fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(char::from(code)),
        0x80..=0x9F => WIN_ANSI_HIGH[usize::from(code - 0x80)],
        _ => None,
    }
}

/// Encode text for a WinAnsi font; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\t' | '\n' | '\r' => b' ',
            ' '..='~' | '\u{A0}'..='\u{FF}' => ch as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .position(|c| *c == Some(ch))
                .map(|i| 0x80 + i as u8)
                .unwrap_or(b'?'),
        })
        .collect()
}

// Helvetica advance widths for ' '..='~'
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn helvetica_width(ch: char) -> u16 {
    if (' '..='~').contains(&ch) {
        return HELVETICA_ASCII[ch as usize - 0x20];
    }

    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ì'..='ï' | '\u{A0}' => return 278,
        '¡' | '‘' | '’' | '“' | '”' => return 333,
        '¿' => return 611,
        '°' => return 400,
        '•' => return 350,
        '…' | '—' | '‰' => return 1000,
        _ => return 556,
    };
    HELVETICA_ASCII[base as usize - 0x20]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_text_stays_in_single_bytes() {
        assert_eq!(encode_win_ansi("Sí"), vec![b'S', 0xED]);
        assert_eq!(encode_win_ansi("Votación"), b"Votaci\xF3n".to_vec());
        assert_eq!(encode_win_ansi("…"), vec![0x85]);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn helvetica_measures_known_widths() {
        let font = ReportFont::helvetica();
        // "Hi" = 722 + 222 units
        assert!((font.text_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert_eq!(font.text_width("á", 1000.0), font.text_width("a", 1000.0));
    }

    #[test]
    fn missing_font_falls_back_to_helvetica() {
        let font = ReportFont::load_or_fallback(Some(Path::new("/nonexistent/font.ttf")));
        assert!(matches!(font.program(), FontProgram::Helvetica));
    }

    #[test]
    fn garbage_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert!(matches!(
            ReportFont::from_truetype(&path),
            Err(FontError::Parse(_))
        ));
        assert!(matches!(
            ReportFont::load_or_fallback(Some(&path)).program(),
            FontProgram::Helvetica
        ));
    }

    #[test]
    fn registers_system_truetype_font() {
        let path = Path::new(DEFAULT_FONT_PATH);
        if !path.is_file() {
            eprintln!("skipping: {} not installed", DEFAULT_FONT_PATH);
            return;
        }

        let font = ReportFont::from_truetype(path).unwrap();
        match font.program() {
            FontProgram::TrueType(embedded) => {
                assert_eq!(embedded.base_name, "DejaVuSans");
                assert!(embedded.ascent > 0);
                assert!(embedded.descent < 0);
                assert!(!embedded.data.is_empty());
            }
            FontProgram::Helvetica => panic!("expected an embedded font"),
        }
        assert!(font.text_width("Votó", 10.0) > 0.0);
        assert!(font.widths()[usize::from(b'W')] > font.widths()[usize::from(b'i')]);
    }

    #[test]
    fn wrap_respects_width() {
        let font = ReportFont::helvetica();
        let lines = font.wrap("Unidad Educativa el Milenio 11 de Noviembre", 12.0, 120.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(font.text_width(line, 12.0) <= 120.0 || !line.contains(' '));
        }
        assert_eq!(lines.join(" "), "Unidad Educativa el Milenio 11 de Noviembre");
    }

    #[test]
    fn fit_text_adds_ellipsis() {
        let font = ReportFont::helvetica();
        let fitted = font.fit_text("Jaramillo Castro Guamán Ibarra", 10.0, 60.0);

        assert!(fitted.ends_with('…'));
        assert!(font.text_width(&fitted, 10.0) <= 60.0);
        assert_eq!(font.fit_text("Ana", 10.0, 60.0), "Ana");
    }
}

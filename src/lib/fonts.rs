use std::fs;
use std::path::{Path, PathBuf};

use fontdb::Database;
use log::{debug, info, warn};
use printpdf::BuiltinFont;
use rusttype::Font;

use crate::layout::FontWeight;
use crate::ExportError;

/// Returns common aliases for a font name.
///
/// This allows users to specify "Arial" and have the system try
/// "Helvetica", "Liberation Sans", etc.
fn get_font_aliases(name: &str) -> Vec<&'static str> {
    match name.to_lowercase().as_str() {
        "arial" => vec!["Helvetica", "Liberation Sans", "FreeSans"],
        "helvetica" => vec!["Arial", "Liberation Sans", "FreeSans"],
        "times new roman" | "times" => {
            vec!["Times", "Times New Roman", "Liberation Serif", "FreeSerif"]
        }
        "courier new" | "courier" => vec!["Courier", "Courier New", "Liberation Mono", "FreeMono"],
        "verdana" => vec!["DejaVu Sans", "Bitstream Vera Sans"],
        "georgia" => vec!["Liberation Serif", "FreeSerif", "DejaVu Serif"],
        "garamond" | "eb garamond" => vec!["EB Garamond", "Liberation Serif", "FreeSerif"],
        "palatino" | "palatino linotype" => {
            vec!["Palatino Linotype", "TeX Gyre Pagella", "URW Palladio L"]
        }
        _ => vec![],
    }
}

/// The three PDF base font families every viewer provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFamily {
    Helvetica,
    Times,
    Courier,
}

impl BuiltinFamily {
    /// Maps a family name to the closest base family, `None` when the name is not recognized.
    pub fn lookup(name: &str) -> Option<BuiltinFamily> {
        let key = name.trim().to_lowercase();
        let key = key.as_str();
        if key.contains("courier") || key.contains("mono") || key == "consolas" {
            Some(BuiltinFamily::Courier)
        } else if key.contains("times")
            || key.contains("georgia")
            || key.contains("garamond")
            || key.contains("palatino")
            || key.contains("baskerville")
            || key.contains("book antiqua")
            || key.contains("cambria")
            || key.contains("merriweather")
            || (key.contains("serif") && !key.contains("sans"))
        {
            Some(BuiltinFamily::Times)
        } else if key.contains("helvetica")
            || key.contains("arial")
            || key.contains("verdana")
            || key.contains("sans")
            || key.contains("calibri")
            || key.contains("roboto")
            || key.contains("open sans")
            || key.contains("lato")
        {
            Some(BuiltinFamily::Helvetica)
        } else {
            None
        }
    }

    /// Like [`BuiltinFamily::lookup`], falling back to Helvetica.
    pub fn from_name(name: &str) -> BuiltinFamily {
        Self::lookup(name).unwrap_or_else(|| {
            debug!("Unknown font family '{}', using Helvetica metrics", name);
            BuiltinFamily::Helvetica
        })
    }

    pub fn builtin(self, weight: FontWeight) -> BuiltinFont {
        match self {
            BuiltinFamily::Helvetica => match weight {
                FontWeight::Regular => BuiltinFont::Helvetica,
                FontWeight::Bold => BuiltinFont::HelveticaBold,
                FontWeight::Italic => BuiltinFont::HelveticaOblique,
            },
            BuiltinFamily::Times => match weight {
                FontWeight::Regular => BuiltinFont::TimesRoman,
                FontWeight::Bold => BuiltinFont::TimesBold,
                FontWeight::Italic => BuiltinFont::TimesItalic,
            },
            BuiltinFamily::Courier => match weight {
                FontWeight::Regular => BuiltinFont::Courier,
                FontWeight::Bold => BuiltinFont::CourierBold,
                FontWeight::Italic => BuiltinFont::CourierOblique,
            },
        }
    }

    /// Generic CSS family closing a font stack.
    pub fn css_generic(self) -> &'static str {
        match self {
            BuiltinFamily::Helvetica => "Helvetica, Arial, sans-serif",
            BuiltinFamily::Times => "'Times New Roman', Times, serif",
            BuiltinFamily::Courier => "'Courier New', Courier, monospace",
        }
    }
}

/// CSS `font-family` value for a family name: the name itself, then its base-family stack.
pub fn css_font_stack(name: &str) -> String {
    let generic = BuiltinFamily::from_name(name).css_generic();
    let name = name.trim().replace('\'', "");
    if name.is_empty() {
        generic.to_string()
    } else {
        format!("'{}', {}", name, generic)
    }
}

/// Configuration for font lookup when embedding fonts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontConfig {
    /// Font files or directories searched before the system fonts
    pub custom_paths: Vec<PathBuf>,
    /// Embed matching system fonts instead of referencing the PDF base fonts
    pub embed_system_fonts: bool,
}

impl FontConfig {
    /// True when rendering should try to embed real font files.
    pub fn wants_embedding(&self) -> bool {
        self.embed_system_fonts || !self.custom_paths.is_empty()
    }
}

/// Byte drawn for characters the base fonts have no glyph for.
pub const WIN_ANSI_REPLACEMENT: u8 = b'?';

/// Code points of WinAnsiEncoding bytes 0x80..=0x9F. Zero marks an unassigned byte.
const WIN_ANSI_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, // 0x80
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0, // 0x88
    0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, // 0x90
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178, // 0x98
];

/// The WinAnsiEncoding byte the base-14 fonts draw `c` with, if they have it.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => Some(code as u8),
        code => WIN_ANSI_HIGH
            .iter()
            .position(|&mapped| mapped != 0 && mapped == code)
            .map(|i| 0x80 + i as u8),
    }
}

/// Encodes `text` for a base-14 font.
///
/// Characters without a WinAnsi glyph become [`WIN_ANSI_REPLACEMENT`] and are returned in
/// the second element, once each, in order of appearance.
pub fn encode_win_ansi(text: &str) -> (Vec<u8>, Vec<char>) {
    let mut bytes = Vec::with_capacity(text.len());
    let mut missing = Vec::new();
    for c in text.chars() {
        match win_ansi_byte(c) {
            Some(b) => bytes.push(b),
            None => {
                bytes.push(WIN_ANSI_REPLACEMENT);
                if !missing.contains(&c) {
                    missing.push(c);
                }
            }
        }
    }
    (bytes, missing)
}

/// Font bytes found for a family name.
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub family: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| {
            ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf")
        })
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Searches the configured paths for a file whose name contains the family name.
fn find_in_custom_paths(name: &str, config: &FontConfig) -> Option<PathBuf> {
    let wanted = squash(name);
    if wanted.is_empty() {
        return None;
    }
    let matches = |path: &Path| {
        is_font_file(path)
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .map_or(false, |stem| squash(stem).contains(&wanted))
    };

    for base in &config.custom_paths {
        if base.is_file() {
            if matches(base) {
                return Some(base.clone());
            }
            continue;
        }
        let entries = match fs::read_dir(base) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read font directory {}: {}", base.display(), e);
                continue;
            }
        };
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| matches(p))
            .collect();
        // Prefer the regular face: shortest file name first, then alphabetical.
        candidates.sort_by_key(|p| (p.as_os_str().len(), p.clone()));
        if let Some(first) = candidates.into_iter().next() {
            return Some(first);
        }
    }
    None
}

/// Asks fontdb for a regular face of the family or one of its aliases.
fn find_system_font(name: &str) -> Option<(String, PathBuf)> {
    let mut db = Database::new();
    db.load_system_fonts();

    let mut candidates = vec![name];
    candidates.extend(get_font_aliases(name));

    for candidate in candidates {
        let wanted = candidate.to_lowercase();
        for face in db.faces() {
            let path = match &face.source {
                fontdb::Source::File(p) => p,
                _ => continue,
            };
            // Skip collections (.ttc) because rusttype can't read them directly
            if !is_font_file(path) {
                continue;
            }
            let family_matches = face
                .families
                .iter()
                .any(|(family, _)| family.to_lowercase() == wanted);
            if family_matches
                && face.weight == fontdb::Weight::NORMAL
                && face.style == fontdb::Style::Normal
            {
                return Some((candidate.to_string(), path.clone()));
            }
        }
    }
    None
}

/// Finds and loads the font file for `name`.
///
/// Returns `Ok(None)` when no file is found, so callers can fall back to a base font. A file
/// that is found but cannot be read or parsed is an error.
pub fn load_font_face(name: &str, config: &FontConfig) -> Result<Option<LoadedFace>, ExportError> {
    let found = find_in_custom_paths(name, config)
        .map(|p| (name.to_string(), p))
        .or_else(|| {
            if config.embed_system_fonts {
                find_system_font(name)
            } else {
                None
            }
        });

    let (family, path) = match found {
        Some(found) => found,
        None => {
            warn!("Font '{}' not found, using the PDF base font", name);
            return Ok(None);
        }
    };

    let bytes = fs::read(&path).map_err(|e| ExportError::RenderError {
        message: format!("cannot read font file for '{}': {}", name, e),
        page: None,
        suggestion: format!("Check permissions on {}", path.display()),
    })?;
    if Font::try_from_bytes(&bytes).is_none() {
        return Err(ExportError::RenderError {
            message: format!("font file for '{}' could not be parsed", name),
            page: None,
            suggestion: format!(
                "Replace {} with a valid TrueType or OpenType file",
                path.display()
            ),
        });
    }
    info!("Using font file {} for '{}'", path.display(), family);
    Ok(Some(LoadedFace {
        family,
        path,
        bytes,
    }))
}

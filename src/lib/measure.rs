//! Text measurement.
//!
//! Layout needs string widths to wrap lines and anchor text, but must stay independent of
//! any renderer. [`BuiltinMetrics`] uses the Adobe width tables of the PDF base fonts for
//! printable ASCII and fixed estimates for everything else, so it needs no font files and
//! gives the same answer on every machine. [`FaceMetrics`] measures with the real glyph
//! advances of embedded font files and defers to [`BuiltinMetrics`] for other families.

use std::collections::HashMap;

use rusttype::{Font, Scale};

use crate::fonts::{win_ansi_byte, BuiltinFamily, LoadedFace, WIN_ANSI_REPLACEMENT};
use crate::layout::FontWeight;
use crate::options::PT_TO_MM;
use crate::ExportError;

/// Width of a string in millimetres.
pub trait TextMeasure {
    fn text_width(&self, text: &str, family: &str, size_pt: f32, weight: FontWeight) -> f32;
}

/// Helvetica advance widths for U+0020..=U+007E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

/// Times-Roman advance widths for U+0020..=U+007E, in 1/1000 em.
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '../
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // 0-9
    278, 278, 564, 564, 564, 444, 921, // :..@
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, // A-M
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, // N-Z
    333, 278, 333, 469, 500, 333, // [..`
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, // a-m
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, // n-z
    480, 200, 480, 541, // {..~
];

const COURIER_WIDTH: u16 = 600;

/// Bold faces of the base families run about 6% wider than the regular ones.
const BOLD_FACTOR: f32 = 1.06;

/// Width table for the PDF base fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

impl BuiltinMetrics {
    fn char_units(family: BuiltinFamily, c: char) -> u16 {
        if family == BuiltinFamily::Courier {
            return COURIER_WIDTH;
        }
        let table = match family {
            BuiltinFamily::Times => &TIMES_WIDTHS,
            _ => &HELVETICA_WIDTHS,
        };
        let serif = family == BuiltinFamily::Times;
        match c {
            ' '..='~' => table[c as usize - 0x20],
            '\u{2018}' | '\u{2019}' => {
                if serif {
                    333
                } else {
                    222
                }
            }
            '\u{201c}' | '\u{201d}' => {
                if serif {
                    444
                } else {
                    333
                }
            }
            '\u{2013}' => 500 + if serif { 0 } else { 56 },
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{00a0}' => table[0],
            c if c.is_control() => 0,
            // Drawn as the replacement glyph.
            c if win_ansi_byte(c).is_none() => table[WIN_ANSI_REPLACEMENT as usize - 0x20],
            _ => {
                if serif {
                    500
                } else {
                    556
                }
            }
        }
    }

    /// Width in 1/1000 em of `text` in a base family.
    pub fn units(family: BuiltinFamily, text: &str) -> u32 {
        text.chars()
            .map(|c| Self::char_units(family, c) as u32)
            .sum()
    }
}

impl TextMeasure for BuiltinMetrics {
    fn text_width(&self, text: &str, family: &str, size_pt: f32, weight: FontWeight) -> f32 {
        let family = BuiltinFamily::from_name(family);
        let mut em = Self::units(family, text) as f32 / 1000.0;
        if weight == FontWeight::Bold && family != BuiltinFamily::Courier {
            em *= BOLD_FACTOR;
        }
        em * size_pt * PT_TO_MM
    }
}

/// Measures families with loaded font files; other families use [`BuiltinMetrics`].
pub struct FaceMetrics {
    faces: HashMap<String, Font<'static>>,
}

impl FaceMetrics {
    pub fn new() -> Self {
        Self {
            faces: HashMap::new(),
        }
    }

    /// Adds a face for a family name (matched case-insensitively).
    pub fn add_face(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), ExportError> {
        let font = Font::try_from_vec(bytes).ok_or_else(|| ExportError::RenderError {
            message: format!("font data for '{}' could not be parsed", family),
            page: None,
            suggestion: "Use a TrueType or OpenType font file".to_string(),
        })?;
        self.faces.insert(family.trim().to_lowercase(), font);
        Ok(())
    }

    /// Builds metrics for the faces, registering each under the requested family name.
    pub fn from_faces<'a>(
        faces: impl IntoIterator<Item = (&'a str, &'a LoadedFace)>,
    ) -> Result<Self, ExportError> {
        let mut metrics = Self::new();
        for (family, face) in faces {
            metrics.add_face(family, face.bytes.clone())?;
        }
        Ok(metrics)
    }

    pub fn has_face(&self, family: &str) -> bool {
        self.faces.contains_key(&family.trim().to_lowercase())
    }

    fn face_width(font: &Font<'static>, text: &str, size_pt: f32) -> f32 {
        let units_per_em = font.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return 0.0;
        }
        // A scale equal to the unscaled ascent-descent height makes rusttype report
        // advances in font units.
        let v = font.v_metrics_unscaled();
        let scale = Scale::uniform(v.ascent - v.descent);

        let mut total = 0.0;
        let mut previous = None;
        for glyph in font.glyphs_for(text.chars()) {
            let id = glyph.id();
            if let Some(prev) = previous {
                total += font.pair_kerning(scale, prev, id);
            }
            total += glyph.scaled(scale).h_metrics().advance_width;
            previous = Some(id);
        }
        total / units_per_em * size_pt * PT_TO_MM
    }
}

impl Default for FaceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for FaceMetrics {
    fn text_width(&self, text: &str, family: &str, size_pt: f32, weight: FontWeight) -> f32 {
        match self.faces.get(&family.trim().to_lowercase()) {
            Some(font) => {
                let width = Self::face_width(font, text, size_pt);
                // One face serves every weight; bold is emulated and runs wider.
                if weight == FontWeight::Bold {
                    width * BOLD_FACTOR
                } else {
                    width
                }
            }
            None => BuiltinMetrics.text_width(text, family, size_pt, weight),
        }
    }
}

use image::Rgb;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LogoError;

/// Residue colors keyed by amino acid code.
/// Codes without an entry keep the ink of their glyph asset.
pub type ColorMap = HashMap<char, Rgb<u8>>;

/// Sentinel written into a window where the sequence has no residue.
pub const SENTINEL: char = '-';

/// Anchoring of a window around its reference position.
///
/// `NTerminal` reads the position as a 1-based start boundary (e.g. TMD start),
/// `CTerminal` reads it as a stop boundary and uses it unshifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Orientation {
    #[default]
    #[value(name = "n-term")]
    NTerminal,
    #[value(name = "c-term")]
    CTerminal,
}

impl Orientation {
    /// Tag used in output file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Orientation::NTerminal => "N_term",
            Orientation::CTerminal => "C_term",
        }
    }
}

/// Flanking residues around one reference position.
///
/// The right flank always starts at offset 0. The left flank starts at `left_offset`,
/// which is `-left.len()` unless the flank was cut short by the end of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub left: String,
    pub left_offset: i64,
    pub right: String,
}

impl Window {
    /// Window whose left flank ends right before the reference position.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        let left = left.into();
        Window {
            left_offset: -(left.chars().count() as i64),
            left,
            right: right.into(),
        }
    }

    pub fn with_left_offset(mut self, offset: i64) -> Self {
        self.left_offset = offset;
        self
    }
}

/// Glyph set used to draw the residues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum FontType {
    Classic,
    #[default]
    Bold,
    Modern,
}

impl FontType {
    /// Directory of the glyph set inside the asset store.
    pub fn dir_name(&self) -> &'static str {
        match self {
            FontType::Classic => "classic_AA_fonts",
            FontType::Bold => "bold_AA_fonts",
            FontType::Modern => "modern_AA_fonts",
        }
    }
}

impl fmt::Display for FontType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for FontType {
    type Err = LogoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "classic_aa_fonts" => Ok(FontType::Classic),
            "bold" | "bold_aa_fonts" => Ok(FontType::Bold),
            "modern" | "modern_aa_fonts" => Ok(FontType::Modern),
            _ => Err(LogoError::invalid_parameter(
                "font_type",
                s,
                "expected classic, bold or modern",
            )),
        }
    }
}

/// One row of the category legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb<u8>,
}

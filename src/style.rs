//! Style configuration (`LogoStyle.ini`).
//!
//! The file is read once into a [`StyleConfig`] which is then handed to the color
//! resolver and the compositor. Layout of the file:
//!
//! ```ini
//! [bg_style]
//! tmd = [217, 189, 130]
//! jmd = [153, 192, 222]
//! gradient = [255, 255, 255]
//!
//! [OG_AA_config]
//! Aromatic = ["F,Y,W", [216,116,45]]
//! Acidic = ["D,E", [224,60,60]]
//! ```
use image::Rgb;
use ini::{Ini, ParseOption};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use crate::error::{LogoError, Result};

pub const BACKGROUND_SECTION: &str = "bg_style";

/// #d9bd82
pub const DEFAULT_TMD_COLOR: Rgb<u8> = Rgb([217, 189, 130]);
/// #99c0de
pub const DEFAULT_JMD_COLOR: Rgb<u8> = Rgb([153, 192, 222]);

/// Region colors of the logo background.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundStyle {
    pub tmd: Rgb<u8>,
    pub jmd: Rgb<u8>,
    /// Recolors the white part of the boundary gradient decoration when set.
    pub gradient: Option<Rgb<u8>>,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        BackgroundStyle {
            tmd: DEFAULT_TMD_COLOR,
            jmd: DEFAULT_JMD_COLOR,
            gradient: None,
        }
    }
}

/// A named group of amino acid codes sharing one color.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    /// Codes as written in the file; the color resolver drops unknown ones.
    pub codes: Vec<String>,
    pub color: Rgb<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySection {
    pub name: String,
    pub categories: Vec<Category>,
}

#[derive(Deserialize)]
struct CategoryLiteral(String, [f64; 3]);

/// Parsed style file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleConfig {
    pub background: BackgroundStyle,
    sections: Vec<CategorySection>,
}

impl StyleConfig {
    /// Reads a style file from disk.
    ///
    /// # Errors
    /// * Returns `LogoError::Config` if the file cannot be read or a value is malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let ini = Ini::load_from_file_opt(path.as_ref(), parse_option())
            .map_err(|e| LogoError::config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_ini(&ini)
    }

    /// Parses style file contents.
    ///
    /// # Errors
    /// * Returns `LogoError::Config` if the contents are malformed
    pub fn parse(contents: &str) -> Result<Self> {
        let ini = Ini::load_from_str_opt(contents, parse_option())
            .map_err(|e| LogoError::config(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = StyleConfig::default();

        for (section, properties) in ini.iter() {
            let Some(section) = section else {
                continue;
            };

            if section == BACKGROUND_SECTION {
                for (key, value) in properties.iter() {
                    match key {
                        "tmd" => config.background.tmd = parse_color_literal(key, value)?,
                        "jmd" => config.background.jmd = parse_color_literal(key, value)?,
                        "gradient" => {
                            config.background.gradient = Some(parse_color_literal(key, value)?)
                        }
                        other => warn!("ignoring unknown {} key '{}'", BACKGROUND_SECTION, other),
                    }
                }
                continue;
            }

            let categories = properties
                .iter()
                .map(|(label, value)| parse_category(section, label, value))
                .collect::<Result<Vec<_>>>()?;
            config.sections.push(CategorySection {
                name: section.to_string(),
                categories,
            });
        }

        Ok(config)
    }

    /// Category section by name.
    pub fn section(&self, name: &str) -> Option<&CategorySection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Names of all category sections in file order.
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }
}

fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

/// Python literals use single quotes as often as double quotes.
fn to_json(literal: &str) -> String {
    literal.trim().replace('\'', "\"")
}

fn parse_category(section: &str, label: &str, value: &str) -> Result<Category> {
    let CategoryLiteral(codes, color) = serde_json::from_str(&to_json(value)).map_err(|e| {
        LogoError::config(format!(
            "[{}] {} must look like [\"A,B\", [r, g, b]]: {}",
            section, label, e
        ))
    })?;

    let codes = codes
        .split(',')
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect();

    Ok(Category {
        label: label.to_string(),
        codes,
        color: rgb_from_components(label, color)?,
    })
}

/// Parses `[r, g, b]` or `#rrggbb`.
///
/// # Errors
/// * Returns `LogoError::Config` for any other shape or out of range components
pub fn parse_color_literal(name: &str, value: &str) -> Result<Rgb<u8>> {
    let value = value.trim();
    if let Some(hex) = value.trim_matches('"').strip_prefix('#') {
        return parse_hex(name, hex);
    }
    let components: [f64; 3] = serde_json::from_str(&to_json(value)).map_err(|e| {
        LogoError::config(format!("{} must be [r, g, b] or #rrggbb, got {}: {}", name, value, e))
    })?;
    rgb_from_components(name, components)
}

fn parse_hex(name: &str, hex: &str) -> Result<Rgb<u8>> {
    let malformed = || LogoError::config(format!("{} is not a #rrggbb color: #{}", name, hex));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(malformed());
    }
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).map_err(|_| malformed())?;
    }
    Ok(Rgb(rgb))
}

/// Converts RGB components in `[0, 255]` (integer or float) into a color.
///
/// # Errors
/// * Returns `LogoError::Config` if a component is not finite or out of range
pub fn rgb_from_components(name: &str, components: [f64; 3]) -> Result<Rgb<u8>> {
    let mut rgb = [0u8; 3];
    for (channel, value) in rgb.iter_mut().zip(components) {
        if !value.is_finite() || !(0.0..=255.0).contains(&value) {
            return Err(LogoError::config(format!(
                "{} has color component {} outside of [0, 255]",
                name, value
            )));
        }
        *channel = value.round() as u8;
    }
    Ok(Rgb(rgb))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE: &str = r#"
[bg_style]
tmd = [10, 20, 30]
jmd = [10, 20, 30.4]
gradient = [255, 255, 255]

[OG_AA_config]
Aromatic =  ["F,Y,W", [216,116,45]]
Special = ['P, G', [50.0, 50.0, 50.0]]
"#;

    #[test]
    fn test_parse_background() {
        let config = StyleConfig::parse(STYLE).unwrap();
        assert_eq!(config.background.tmd, Rgb([10, 20, 30]));
        assert_eq!(config.background.jmd, Rgb([10, 20, 30]));
        assert_eq!(config.background.gradient, Some(Rgb([255, 255, 255])));
    }

    #[test]
    fn test_parse_categories_in_file_order() {
        let config = StyleConfig::parse(STYLE).unwrap();
        assert_eq!(config.section_names(), vec!["OG_AA_config"]);

        let section = config.section("OG_AA_config").unwrap();
        assert_eq!(section.categories.len(), 2);
        assert_eq!(section.categories[0].label, "Aromatic");
        assert_eq!(section.categories[0].codes, vec!["F", "Y", "W"]);
        assert_eq!(section.categories[1].codes, vec!["P", "G"]);
        assert_eq!(section.categories[1].color, Rgb([50, 50, 50]));
        assert!(config.section("og_aa_config").is_none());
    }

    #[test]
    fn test_missing_background_uses_defaults() {
        let config = StyleConfig::parse("[Mini]\nCharged = [\"D,E,K,R\", [1,2,3]]\n").unwrap();
        assert_eq!(config.background, BackgroundStyle::default());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(StyleConfig::parse("[bg_style]\ntmd = [1, 2]\n").is_err());
        assert!(StyleConfig::parse("[bg_style]\ntmd = [1, 2, 300]\n").is_err());
        assert!(StyleConfig::parse("[Mini]\nCharged = [\"D,E\", \"red\"]\n").is_err());
        assert!(parse_color_literal("jmd", "#12345").is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_color_literal("jmd", "#99c0de").unwrap(), DEFAULT_JMD_COLOR);
        assert_eq!(parse_color_literal("tmd", "\"#d9bd82\"").unwrap(), DEFAULT_TMD_COLOR);
    }
}

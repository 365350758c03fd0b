//! Numeric amino acid scales (hydrophobicity themes) used to order and shade
//! the gradient color scheme.
use phf::phf_map;
use polars::prelude::*;
use std::path::Path;
use tracing::warn;

use crate::error::{LogoError, Result};
use crate::sequence::{is_canonical, CANONICAL_ORDER};

pub const DEFAULT_THEME: &str = "Kyte-Doolittle";

const CODE_COLUMN: &str = "aa_code";

/// Kyte & Doolittle (1982) hydropathy index.
static KYTE_DOOLITTLE: phf::Map<char, f64> = phf_map! {
    'I' => 4.5, 'V' => 4.2, 'L' => 3.8, 'F' => 2.8, 'C' => 2.5,
    'M' => 1.9, 'A' => 1.8, 'G' => -0.4, 'T' => -0.7, 'S' => -0.8,
    'W' => -0.9, 'Y' => -1.3, 'P' => -1.6, 'H' => -3.2, 'E' => -3.5,
    'Q' => -3.5, 'D' => -3.5, 'N' => -3.5, 'K' => -3.9, 'R' => -4.5,
};

/// Amino acid codes of one theme sorted by descending scale value.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeRanking {
    pub theme: String,
    pub order: Vec<char>,
    pub values: Vec<f64>,
}

/// Table of per amino acid values across several named scales.
///
/// Stored as a DataFrame with an "aa_code" column and one numeric column per theme.
#[derive(Debug, Clone)]
pub struct ScaleTable {
    df: DataFrame,
}

impl ScaleTable {
    /// Wraps a DataFrame that carries an "aa_code" column.
    ///
    /// # Errors
    /// * Returns `LogoError::MissingColumn` if "aa_code" is absent
    pub fn new(df: DataFrame) -> Result<Self> {
        if df.column(CODE_COLUMN).is_err() {
            return Err(LogoError::MissingColumn(CODE_COLUMN.to_string()));
        }
        Ok(ScaleTable { df })
    }

    /// Reads a scale table from a CSV file with a header row.
    ///
    /// # Errors
    /// * Returns `LogoError::DataError` if the file cannot be parsed
    /// * Returns `LogoError::MissingColumn` if "aa_code" is absent
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let df = LazyCsvReader::new(path.as_ref())
            .with_has_header(true)
            .finish()?
            .collect()?;
        Self::new(df)
    }

    /// Table holding only the built-in Kyte-Doolittle scale.
    pub fn kyte_doolittle() -> Self {
        let codes: Vec<String> = CANONICAL_ORDER.iter().map(|c| c.to_string()).collect();
        let values: Vec<f64> = CANONICAL_ORDER
            .iter()
            .map(|c| KYTE_DOOLITTLE.get(c).copied().unwrap_or_default())
            .collect();
        let df = DataFrame::new(vec![
            Column::new(CODE_COLUMN.into(), codes),
            Column::new(DEFAULT_THEME.into(), values),
        ])
        .unwrap_or_default();
        ScaleTable { df }
    }

    /// Names of all numeric scale columns.
    pub fn themes(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|column| {
                let name = column.name().as_str();
                name != CODE_COLUMN && !name.is_empty() && !name.starts_with("Unnamed")
            })
            .filter(|column| {
                matches!(
                    column.dtype(),
                    DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
                )
            })
            .map(|column| column.name().to_string())
            .collect()
    }

    /// Ranks the amino acids of a theme by descending value.
    ///
    /// Unknown theme names fall back to Kyte-Doolittle, taken from this table when
    /// present and from the built-in scale otherwise. Rows with non-canonical codes
    /// or missing values are skipped; ties keep their table order.
    ///
    /// # Errors
    /// * Returns `LogoError::DataError` if the columns cannot be read
    pub fn ranking(&self, theme: &str) -> Result<ThemeRanking> {
        let themes = self.themes();
        if !themes.iter().any(|t| t == theme) {
            warn!("unknown scale theme '{}', using {}", theme, DEFAULT_THEME);
            if theme != DEFAULT_THEME && themes.iter().any(|t| t == DEFAULT_THEME) {
                return self.ranking(DEFAULT_THEME);
            }
            return Self::kyte_doolittle().ranking(DEFAULT_THEME);
        }

        let sorted = self
            .df
            .clone()
            .lazy()
            .select([col(CODE_COLUMN), col(theme).cast(DataType::Float64)])
            .sort(
                [theme],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )
            .collect()?;

        let codes = sorted.column(CODE_COLUMN)?.str()?;
        let values = sorted.column(theme)?.f64()?;

        let mut order = Vec::new();
        let mut ranked_values = Vec::new();
        for (code, value) in codes.into_iter().zip(values.into_iter()) {
            let (Some(code), Some(value)) = (code, value) else {
                continue;
            };
            let Some(code) = code.trim().chars().next().map(|c| c.to_ascii_uppercase()) else {
                continue;
            };
            if !is_canonical(code) {
                warn!("'{}' in scale table is not a canonical amino acid code", code);
                continue;
            }
            if order.contains(&code) {
                continue;
            }
            order.push(code);
            ranked_values.push(value);
        }

        Ok(ThemeRanking {
            theme: theme.to_string(),
            order,
            values: ranked_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kyte_doolittle_ranking() {
        let ranking = ScaleTable::kyte_doolittle().ranking(DEFAULT_THEME).unwrap();
        assert_eq!(ranking.order.len(), 20);
        assert_eq!(ranking.order[0], 'I');
        assert_eq!(ranking.order[19], 'R');
        assert!(ranking.values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let ranking = ScaleTable::kyte_doolittle().ranking("Wimley-White").unwrap();
        assert_eq!(ranking.theme, DEFAULT_THEME);
    }

    #[test]
    fn test_themes_skip_code_column() {
        let df = df!(
            "aa_code" => ["A", "K", "x"],
            "Hessa" => [0.11, 2.71, 0.0],
            "Eisenberg" => [0.62, -1.5, 0.0],
        )
        .unwrap();
        let table = ScaleTable::new(df).unwrap();
        assert_eq!(table.themes(), vec!["Hessa".to_string(), "Eisenberg".to_string()]);

        let ranking = table.ranking("Hessa").unwrap();
        assert_eq!(ranking.order, vec!['K', 'A']);
        assert_eq!(ranking.values, vec![2.71, 0.11]);
    }

    #[test]
    fn test_missing_code_column() {
        let df = df!("code" => ["A"], "Hessa" => [0.11]).unwrap();
        assert!(matches!(
            ScaleTable::new(df),
            Err(LogoError::MissingColumn(_))
        ));
    }
}

//! Position resolved amino acid frequencies.
use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::Window;

/// Frequency of every amino acid code at every window offset.
///
/// Rows follow the glyph order handed to [`tabulate`], columns run over the
/// offsets `-length_left..length_right`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    codes: Vec<char>,
    length_left: usize,
    length_right: usize,
    values: Array2<f64>,
}

impl FrequencyTable {
    pub fn codes(&self) -> &[char] {
        &self.codes
    }

    pub fn length_left(&self) -> usize {
        self.length_left
    }

    pub fn length_right(&self) -> usize {
        self.length_right
    }

    /// Offsets in column order, `-length_left` first.
    pub fn offsets(&self) -> impl Iterator<Item = i64> {
        -(self.length_left as i64)..self.length_right as i64
    }

    fn column_index(&self, offset: i64) -> Option<usize> {
        let index = offset + self.length_left as i64;
        (0..self.values.ncols() as i64)
            .contains(&index)
            .then_some(index as usize)
    }

    /// Frequency of `code` at `offset`, `None` if either is not part of the table.
    pub fn get(&self, offset: i64, code: char) -> Option<f64> {
        let column = self.column_index(offset)?;
        let row = self.codes.iter().position(|&c| c == code)?;
        Some(self.values[[row, column]])
    }

    /// Frequencies of all codes at one offset, in glyph order.
    pub fn column(&self, offset: i64) -> Option<ArrayView1<'_, f64>> {
        let column = self.column_index(offset)?;
        Some(self.values.index_axis(Axis(1), column))
    }

    /// Converts the table into a DataFrame with an "offset" column followed by
    /// one column per amino acid code in glyph order.
    ///
    /// # Errors
    /// * Returns `LogoError::DataError` if DataFrame creation fails
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new(
            "offset".into(),
            self.offsets().collect::<Vec<i64>>(),
        )];
        columns.extend(self.codes.iter().enumerate().map(|(row, code)| {
            Column::new(code.to_string().into(), self.values.row(row).to_vec())
        }));
        Ok(DataFrame::new(columns)?)
    }
}

/// Tabulates per-offset amino acid frequencies over a set of windows.
///
/// The left flank of each window starts at its `left_offset`, which puts the last
/// residue of a full flank at offset -1. The right flank starts at offset 0. Only codes listed in
/// `amino_acid_order` are counted, and each offset is normalized by the number of
/// counted residues at that offset. Padding sentinels, unknown symbols and positions
/// a short window does not reach therefore do not dilute the frequencies. An offset
/// without a single counted residue has frequency 0 for every code.
///
/// # Arguments
/// * `windows` - Windows from the extractor
/// * `length_left`, `length_right` - Requested flank lengths
/// * `amino_acid_order` - Codes to count, in glyph order (duplicates are ignored)
///
/// # Returns
/// * `FrequencyTable` - Frequencies in `[0, 1]`, each offset summing to 1 or 0
pub fn tabulate(
    windows: &[Window],
    length_left: usize,
    length_right: usize,
    amino_acid_order: &[char],
) -> FrequencyTable {
    let mut codes: Vec<char> = Vec::with_capacity(amino_acid_order.len());
    for &code in amino_acid_order {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    let rows: HashMap<char, usize> = codes.iter().enumerate().map(|(i, &c)| (c, i)).collect();

    let width = length_left + length_right;
    let mut values = Array2::<f64>::zeros((codes.len(), width));
    let mut counted = vec![0usize; width];

    let mut count = |column: usize, symbol: char| {
        if let Some(&row) = rows.get(&symbol) {
            values[[row, column]] += 1.0;
            counted[column] += 1;
        }
    };

    for window in windows {
        let first_column = window.left_offset.saturating_add(length_left as i64);
        for (i, symbol) in window.left.chars().enumerate() {
            let column = first_column.saturating_add(i as i64);
            if (0..length_left as i64).contains(&column) {
                count(column as usize, symbol);
            }
        }
        for (i, symbol) in window.right.chars().take(length_right).enumerate() {
            count(length_left + i, symbol);
        }
    }

    for (column, mut frequencies) in values.axis_iter_mut(Axis(1)).enumerate() {
        if counted[column] > 0 {
            frequencies /= counted[column] as f64;
        }
    }

    FrequencyTable {
        codes,
        length_left,
        length_right,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::CANONICAL_ORDER;

    #[test]
    fn test_tabulate_counts_per_offset() {
        let windows = vec![Window::new("AK", "LL"), Window::new("AW", "LF")];
        let table = tabulate(&windows, 2, 2, &CANONICAL_ORDER);

        assert_eq!(table.get(-2, 'A'), Some(1.0));
        assert_eq!(table.get(-1, 'K'), Some(0.5));
        assert_eq!(table.get(-1, 'W'), Some(0.5));
        assert_eq!(table.get(0, 'L'), Some(1.0));
        assert_eq!(table.get(1, 'F'), Some(0.5));
        assert_eq!(table.get(2, 'A'), None);
        assert_eq!(table.get(0, 'X'), None);
    }

    #[test]
    fn test_tabulate_ignores_sentinel_in_denominator() {
        let windows = vec![Window::new("--M", "K"), Window::new("-AM", "K"), Window::new("GAM", "K")];
        let table = tabulate(&windows, 3, 1, &CANONICAL_ORDER);

        assert_eq!(table.get(-3, 'G'), Some(1.0));
        assert_eq!(table.get(-2, 'A'), Some(1.0));
        assert_eq!(table.get(-1, 'M'), Some(1.0));
    }

    #[test]
    fn test_tabulate_all_sentinel_offset_is_zero() {
        let windows = vec![Window::new("-M", "K"), Window::new("-A", "K")];
        let table = tabulate(&windows, 2, 1, &CANONICAL_ORDER);

        let column = table.column(-2).unwrap();
        assert_eq!(column.sum(), 0.0);
        assert!(column.iter().all(|f| !f.is_nan()));
    }

    #[test]
    fn test_tabulate_short_windows_stay_aligned() {
        // left flank cut short by the sequence start, right flank by its end
        let windows = vec![Window::new("M", "K"), Window::new("AM", "KL")];
        let table = tabulate(&windows, 2, 2, &CANONICAL_ORDER);

        assert_eq!(table.get(-2, 'A'), Some(1.0));
        assert_eq!(table.get(-1, 'M'), Some(1.0));
        assert_eq!(table.get(0, 'K'), Some(1.0));
        assert_eq!(table.get(1, 'L'), Some(1.0));
    }

    #[test]
    fn test_tabulate_left_flank_past_sequence_end() {
        // reference two residues past the end: "HIJ" covers -5..-3, nothing reaches -1
        let window = Window::new("HIJ", "").with_left_offset(-5);
        let table = tabulate(&[window], 5, 2, &CANONICAL_ORDER);

        assert_eq!(table.get(-5, 'H'), Some(1.0));
        assert_eq!(table.get(-4, 'I'), Some(1.0));
        assert_eq!(table.get(-3, 'J'), Some(1.0));
        assert_eq!(table.column(-2).unwrap().sum(), 0.0);
        assert_eq!(table.column(-1).unwrap().sum(), 0.0);
    }

    #[test]
    fn test_tabulate_excludes_unknown_codes() {
        let windows = vec![Window::new("X", "A"), Window::new("A", "A")];
        let table = tabulate(&windows, 1, 1, &CANONICAL_ORDER);

        // the unknown symbol neither counts nor enlarges the denominator
        assert_eq!(table.get(-1, 'A'), Some(1.0));
        assert_eq!(table.column(-1).unwrap().sum(), 1.0);
        assert_eq!(table.get(0, 'A'), Some(1.0));
    }

    #[test]
    fn test_to_dataframe_layout() {
        let windows = vec![Window::new("A", "K")];
        let table = tabulate(&windows, 1, 1, &['K', 'A']);
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["offset", "K", "A"]);
    }
}

//! Sequence windows around reference positions.
use polars::prelude::*;

use crate::error::{LogoError, Result};
use crate::sequence::validate;
use crate::types::{Orientation, Window, SENTINEL};

/// Substring by char index with both bounds clamped into the sequence.
fn clamped_slice(residues: &[char], start: i64, end: i64) -> String {
    let len = residues.len() as i64;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    if start >= end {
        return String::new();
    }
    residues[start..end].iter().collect()
}

/// Cuts the window of one sequence around a reference position.
///
/// # Arguments
/// * `sequence` - Raw amino acid sequence
/// * `ref_position` - Reference position as found in the input table
/// * `length_left` - Number of residues requested left of the reference
/// * `length_right` - Number of residues requested right of the reference
/// * `orientation` - `NTerminal` reads `ref_position` as a 1-based start and shifts it
///   down by one, `CTerminal` reads it as a stop boundary and uses it as is
///
/// # Returns
/// * `Result<Window>` - Both flanks, normalized by [`validate`]. In N-terminal
///   orientation a left flank running past the sequence start is filled up with `-`.
///   Right flanks and C-terminal windows are never padded and come back shorter
///   when the sequence runs out. `left_offset` keeps the offset of the first left
///   residue even when the reference lies past the sequence end.
///
/// # Errors
/// * Returns `LogoError::InvalidParameter` if the reference position lies before the
///   first residue
pub fn extract(
    sequence: &str,
    ref_position: i64,
    length_left: usize,
    length_right: usize,
    orientation: Orientation,
) -> Result<Window> {
    let residues: Vec<char> = sequence.chars().collect();
    let len = residues.len() as i64;
    let left_len = i64::try_from(length_left).unwrap_or(i64::MAX);
    let right_len = i64::try_from(length_right).unwrap_or(i64::MAX);

    let (left, left_offset, right) = match orientation {
        Orientation::NTerminal => {
            let start = ref_position
                .checked_sub(1)
                .filter(|start| *start >= 0)
                .ok_or_else(|| {
                    LogoError::invalid_parameter(
                        "ref_position",
                        ref_position,
                        "start positions are 1-based and must be at least 1",
                    )
                })?;
            let (left, left_offset) = if start - left_len >= 0 {
                let first = (start - left_len).min(len);
                (clamped_slice(&residues, start - left_len, start), first - start)
            } else {
                let overhang = SENTINEL.to_string().repeat((left_len - start) as usize);
                let left = format!("{}{}", overhang, clamped_slice(&residues, 0, start));
                (left, -left_len)
            };
            let right = clamped_slice(&residues, start, start.saturating_add(right_len));
            (left, left_offset, right)
        }
        Orientation::CTerminal => {
            let stop = ref_position;
            if stop < 0 {
                return Err(LogoError::invalid_parameter(
                    "ref_position",
                    ref_position,
                    "stop positions must not be negative",
                ));
            }
            let first = stop.saturating_sub(left_len).clamp(0, len);
            (
                clamped_slice(&residues, first, stop),
                first - stop,
                clamped_slice(&residues, stop, stop.saturating_add(right_len)),
            )
        }
    };

    Ok(Window::new(validate(&left), validate(&right)).with_left_offset(left_offset))
}

/// Extracts one window per row of an input table.
///
/// # Arguments
/// * `df` - Table holding the sequences and their reference positions
/// * `sequence_column` - Name of the text column with the amino acid sequences
/// * `position_column` - Name of the integer column with the reference positions
/// * `length_left`, `length_right`, `orientation` - See [`extract`]
///
/// # Returns
/// * `Result<Vec<Window>>` - Windows in row order
///
/// # Errors
/// * Returns `LogoError::MissingColumn` if either column does not exist
/// * Returns `LogoError::InputType` for a non-text sequence column, missing sequences
///   or missing/non-integer positions
pub fn extract_windows(
    df: &DataFrame,
    sequence_column: &str,
    position_column: &str,
    length_left: usize,
    length_right: usize,
    orientation: Orientation,
) -> Result<Vec<Window>> {
    let sequences = df
        .column(sequence_column)
        .map_err(|_| LogoError::MissingColumn(sequence_column.to_string()))?;
    let positions = df
        .column(position_column)
        .map_err(|_| LogoError::MissingColumn(position_column.to_string()))?;

    let sequences = sequences.str().map_err(|_| {
        LogoError::input_type(
            0,
            sequence_column,
            format!("expected text, found {}", sequences.dtype()),
        )
    })?;
    let positions = positions.cast(&DataType::Int64).map_err(|_| {
        LogoError::input_type(
            0,
            position_column,
            format!("expected integers, found {}", positions.dtype()),
        )
    })?;
    let positions = positions.i64()?;

    sequences
        .into_iter()
        .zip(positions.into_iter())
        .enumerate()
        .map(|(row, (sequence, position))| {
            let sequence = sequence
                .ok_or_else(|| LogoError::input_type(row, sequence_column, "missing sequence"))?;
            let position = position
                .ok_or_else(|| LogoError::input_type(row, position_column, "missing position"))?;
            extract(sequence, position, length_left, length_right, orientation)
        })
        .collect()
}

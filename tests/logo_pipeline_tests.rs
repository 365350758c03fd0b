use aa_logo_rs::color::{gradient_weights, ColorScheme, GradientParams};
use aa_logo_rs::frequency::tabulate;
use aa_logo_rs::scales::ScaleTable;
use aa_logo_rs::sequence::CANONICAL_ORDER;
use aa_logo_rs::style::StyleConfig;
use aa_logo_rs::types::Orientation;
use aa_logo_rs::window::{extract, extract_windows};
use polars::prelude::*;

fn read_proteins() -> DataFrame {
    LazyCsvReader::new("tests/data/tmd_proteins.csv")
        .with_has_header(true)
        .finish()
        .unwrap()
        .collect()
        .unwrap()
}

#[test]
fn test_uniform_sequences_have_unit_frequency() {
    let sequences = vec!["A".repeat(20); 100];
    let positions = vec![10i64; 100];
    let df = df!("sequence" => sequences, "start" => positions).unwrap();

    let windows = extract_windows(&df, "sequence", "start", 5, 5, Orientation::NTerminal).unwrap();
    assert_eq!(windows.len(), 100);
    let table = tabulate(&windows, 5, 5, &CANONICAL_ORDER);

    for offset in -5..5 {
        for code in CANONICAL_ORDER {
            let expected = if code == 'A' { 1.0 } else { 0.0 };
            assert_eq!(table.get(offset, code), Some(expected));
        }
    }
}

#[test]
fn test_short_sequence_boundary() {
    let window = extract("MKA", 2, 5, 2, Orientation::NTerminal).unwrap();
    assert_eq!(window.left, "----M");
    assert_eq!(window.right, "KA");

    let table = tabulate(&[window], 5, 2, &CANONICAL_ORDER);
    // padded offsets count nothing
    for offset in -5..-1 {
        let column = table.column(offset).unwrap();
        assert_eq!(column.sum(), 0.0);
    }
    assert_eq!(table.get(-1, 'M'), Some(1.0));
    assert_eq!(table.get(0, 'K'), Some(1.0));
    assert_eq!(table.get(1, 'A'), Some(1.0));
}

#[test]
fn test_position_past_sequence_end_keeps_offsets() {
    let window = extract("ABCDEFGHIJ", 13, 5, 2, Orientation::NTerminal).unwrap();
    let table = tabulate(&[window], 5, 2, &CANONICAL_ORDER);

    assert_eq!(table.get(-5, 'H'), Some(1.0));
    assert_eq!(table.get(-3, 'J'), Some(1.0));
    assert_eq!(table.column(-1).unwrap().sum(), 0.0);
}

#[test]
fn test_unknown_symbols_are_not_counted() {
    let df = df!(
        "sequence" => ["MBKL", "MAKL"],
        "start" => [3i64, 3],
    )
    .unwrap();
    let windows = extract_windows(&df, "sequence", "start", 1, 1, Orientation::NTerminal).unwrap();
    assert_eq!(windows[0].left, "B");

    let table = tabulate(&windows, 1, 1, &CANONICAL_ORDER);
    assert_eq!(table.get(-1, 'A'), Some(1.0));
    assert_eq!(table.get(0, 'K'), Some(1.0));
}

#[test]
fn test_frequencies_sum_to_one_per_offset() {
    let df = read_proteins();
    for (column, orientation) in [
        ("tmd_start", Orientation::NTerminal),
        ("tmd_stop", Orientation::CTerminal),
    ] {
        let windows = extract_windows(&df, "sequence", column, 8, 8, orientation).unwrap();
        let table = tabulate(&windows, 8, 8, &CANONICAL_ORDER);
        for offset in table.offsets() {
            let sum = table.column(offset).unwrap().sum();
            assert!(
                (sum - 1.0).abs() < 1e-9 || sum == 0.0,
                "offset {} sums to {}",
                offset,
                sum
            );
        }
    }
}

#[test]
fn test_padding_does_not_dilute_frequencies() {
    // the short protein only reaches offset -1, the others fill every offset
    let df = read_proteins();
    let windows = extract_windows(&df, "sequence", "tmd_start", 5, 2, Orientation::NTerminal).unwrap();
    assert_eq!(windows[3].left, "----M");

    let table = tabulate(&windows, 5, 2, &CANONICAL_ORDER);
    let counted_at_minus_five: f64 = table.column(-5).unwrap().sum();
    assert!((counted_at_minus_five - 1.0).abs() < 1e-9);
    // three long proteins at offset -5, each code is a multiple of 1/3
    for value in table.column(-5).unwrap() {
        let scaled = value * 3.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }
}

#[test]
fn test_frequency_table_export() {
    let df = read_proteins();
    let windows = extract_windows(&df, "sequence", "tmd_start", 3, 3, Orientation::NTerminal).unwrap();
    let table = tabulate(&windows, 3, 3, &CANONICAL_ORDER);
    let exported = table.to_dataframe().unwrap();

    assert_eq!(exported.height(), 6);
    assert_eq!(exported.width(), 21);
    assert_eq!(exported.get_column_names()[0].as_str(), "offset");
    let offsets: Vec<i64> = exported
        .column("offset")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(offsets, vec![-3, -2, -1, 0, 1, 2]);
}

#[test]
fn test_missing_sequence_is_an_input_error() {
    let df = df!(
        "sequence" => [Some("MKALIV"), None],
        "start" => [2i64, 2],
    )
    .unwrap();
    let result = extract_windows(&df, "sequence", "start", 2, 2, Orientation::NTerminal);
    assert!(result.is_err());
}

#[test]
fn test_category_section_dominates_gradient() {
    let style = StyleConfig::load("tests/data/LogoStyle.ini").unwrap();
    let gradient = GradientParams {
        order: Some(vec!['K', 'R', 'H']),
        color_advance: Some(vec![3.0, 2.0, 1.0]),
        ..GradientParams::default()
    };

    let resolution = ColorScheme::select(&style, Some("Charge"), gradient.clone()).resolve();
    assert_eq!(&resolution.glyph_order[..5], &['K', 'R', 'H', 'D', 'E']);
    assert_eq!(resolution.colors.len(), 5);
    assert_eq!(resolution.legend.as_ref().unwrap().len(), 2);

    let resolution = ColorScheme::select(&style, Some("OG_AA_config"), gradient).resolve();
    assert_eq!(resolution.colors.len(), 20);
    assert_eq!(resolution.legend.unwrap().len(), 7);
}

#[test]
fn test_gradient_from_scale_table() {
    let scales = ScaleTable::read_csv("tests/data/scales_hydrophobicity.csv").unwrap();
    assert_eq!(scales.themes(), vec!["Kyte-Doolittle", "Hessa", "Eisenberg"]);

    let ranking = scales.ranking("Hessa").unwrap();
    assert_eq!(ranking.order[0], 'D');
    assert_eq!(ranking.order[19], 'I');

    let params = GradientParams {
        order: Some(ranking.order.clone()),
        color_advance: Some(ranking.values.clone()),
        ..GradientParams::default()
    };
    let resolution = ColorScheme::Gradient(params).resolve();
    assert!(resolution.legend.is_none());
    // the largest value gets the top color, the smallest the bottom color
    assert_eq!(resolution.colors[&'D'].0, [223, 130, 48]);
    assert_eq!(resolution.colors[&'I'].0, [51, 154, 205]);
}

#[test]
fn test_rank_based_gradient_weights() {
    let weights = gradient_weights(20, None);
    for (i, weight) in weights.iter().enumerate() {
        assert_eq!(*weight, (i + 1) as f64 / 20.0);
    }
    assert_eq!(weights[0], 0.05);
    assert_eq!(weights[19], 1.0);
}

//! Residue colors.
//!
//! Two schemes exist and exactly one is active per logo:
//! - **Category**: a style file section assigns fixed colors to groups of codes
//!   and provides the legend.
//! - **Gradient**: codes are ranked (usually by a hydrophobicity scale) and shaded
//!   between a top and a bottom color. No legend.
use image::Rgb;
use statrs::statistics::{Data, Max, Min};
use tracing::{debug, warn};

use crate::sequence::{is_canonical, CANONICAL_ORDER};
use crate::style::{CategorySection, StyleConfig};
use crate::types::{ColorMap, LegendEntry};

/// Orange, top of the default gradient (hydrophobic end).
pub const DEFAULT_GRADIENT_TOP: [f64; 3] = [223.0, 130.0, 48.0];
/// Light blue, bottom of the default gradient (hydrophilic end).
pub const DEFAULT_GRADIENT_BOTTOM: [f64; 3] = [51.0, 154.0, 205.0];

/// Parameters of the gradient scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientParams {
    pub top: [f64; 3],
    pub bottom: [f64; 3],
    /// Ranking of the codes, top first. Missing canonical codes are appended.
    pub order: Option<Vec<char>>,
    /// Raw per-rank values (e.g. scale values) turned into interpolation weights.
    pub color_advance: Option<Vec<f64>>,
}

impl Default for GradientParams {
    fn default() -> Self {
        GradientParams {
            top: DEFAULT_GRADIENT_TOP,
            bottom: DEFAULT_GRADIENT_BOTTOM,
            order: None,
            color_advance: None,
        }
    }
}

/// Represents the color scheme applied to the glyphs.
#[derive(Debug, Clone)]
pub enum ColorScheme<'a> {
    Category(&'a CategorySection),
    Gradient(GradientParams),
}

impl<'a> ColorScheme<'a> {
    /// Picks the scheme for a request.
    ///
    /// A section name always wins over gradient parameters. A name that the style
    /// file does not define falls back to the gradient scheme with a warning.
    pub fn select(
        style: &'a StyleConfig,
        section_name: Option<&str>,
        gradient: GradientParams,
    ) -> Self {
        match section_name {
            Some(name) => match style.section(name) {
                Some(section) => ColorScheme::Category(section),
                None => {
                    warn!(
                        "style section '{}' not found (available: {:?}), using the gradient scheme",
                        name,
                        style.section_names()
                    );
                    ColorScheme::Gradient(gradient)
                }
            },
            None => ColorScheme::Gradient(gradient),
        }
    }

    /// Resolves glyph order, residue colors and legend entries.
    pub fn resolve(&self) -> ColorResolution {
        match self {
            ColorScheme::Category(section) => resolve_categories(section),
            ColorScheme::Gradient(params) => resolve_gradient(params),
        }
    }
}

/// Output of the color resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorResolution {
    /// All 20 canonical codes, top of the stack first.
    pub glyph_order: Vec<char>,
    pub colors: ColorMap,
    /// `None` for the gradient scheme.
    pub legend: Option<Vec<LegendEntry>>,
}

fn append_missing(order: &mut Vec<char>) {
    for code in CANONICAL_ORDER {
        if !order.contains(&code) {
            order.push(code);
        }
    }
}

fn resolve_categories(section: &CategorySection) -> ColorResolution {
    let mut glyph_order = Vec::with_capacity(CANONICAL_ORDER.len());
    let mut colors = ColorMap::new();
    let mut legend = Vec::with_capacity(section.categories.len());

    for category in &section.categories {
        for token in &category.codes {
            let mut chars = token.chars();
            let code = match (chars.next(), chars.next()) {
                (Some(code), None) if is_canonical(code) => code,
                _ => {
                    warn!(
                        "'{}' in category '{}' is not a valid amino acid code, dropped",
                        token, category.label
                    );
                    continue;
                }
            };
            if glyph_order.contains(&code) {
                warn!(
                    "'{}' is listed in more than one category, keeping its first color",
                    code
                );
                continue;
            }
            glyph_order.push(code);
            colors.insert(code, category.color);
        }
        legend.push(LegendEntry {
            label: category.label.clone(),
            color: category.color,
        });
    }

    append_missing(&mut glyph_order);
    debug!("category glyph order {:?}", glyph_order);

    ColorResolution {
        glyph_order,
        colors,
        legend: Some(legend),
    }
}

fn resolve_gradient(params: &GradientParams) -> ColorResolution {
    let mut glyph_order = Vec::with_capacity(CANONICAL_ORDER.len());
    for &code in params.order.iter().flatten() {
        let code = code.to_ascii_uppercase();
        if !is_canonical(code) {
            warn!("'{}' in gradient order is not a canonical amino acid code", code);
            continue;
        }
        if !glyph_order.contains(&code) {
            glyph_order.push(code);
        }
    }
    append_missing(&mut glyph_order);

    let weights = gradient_weights(glyph_order.len(), params.color_advance.as_deref());
    let colors = glyph_order
        .iter()
        .zip(weights)
        .map(|(&code, weight)| (code, interpolate(params.top, params.bottom, weight)))
        .collect();
    debug!("gradient glyph order {:?}", glyph_order);

    ColorResolution {
        glyph_order,
        colors,
        legend: None,
    }
}

/// Interpolation weight of every rank.
///
/// Without `color_advance` rank `i` gets `(i + 1) / 20`. With it, the values are min-max
/// scaled and inverted, `1 - (v - min) / (max - min)`, so the largest value maps to the
/// top color. Ranks beyond the supplied values, and constant value sets, keep the
/// rank based weight.
pub fn gradient_weights(ranks: usize, color_advance: Option<&[f64]>) -> Vec<f64> {
    let normalized = color_advance.and_then(normalize_advance).unwrap_or_default();
    (0..ranks)
        .map(|i| {
            normalized
                .get(i)
                .copied()
                .unwrap_or((i + 1) as f64 / CANONICAL_ORDER.len() as f64)
        })
        .collect()
}

fn normalize_advance(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let data = Data::new(values.to_vec());
    let (min, max) = (data.min(), data.max());
    let span = max - min;
    if span <= 0.0 {
        warn!("color advance values are all equal, using rank based weights");
        return None;
    }
    Some(values.iter().map(|v| 1.0 - (v - min) / span).collect())
}

/// Linear interpolation `(1 - weight) * top + weight * bottom`, per component.
pub fn interpolate(top: [f64; 3], bottom: [f64; 3], weight: f64) -> Rgb<u8> {
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let value = (1.0 - weight) * top[i] + weight * bottom[i];
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(rgb)
}

//! Request validation and the two logo modes.
//!
//! [`LogoOptions`] is the validated form of a request. [`LogoMaker`] binds an input
//! table to a style, a scale table and a glyph asset directory and renders one logo
//! per position column (single mode) or a start/stop pair (TMD mode).
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::color::{ColorResolution, ColorScheme, GradientParams};
use crate::error::{LogoError, Result};
use crate::frequency::{tabulate, FrequencyTable};
use crate::glyph::{GlyphStore, COMMON_DIR};
use crate::logo::{self, LayoutParams};
use crate::scales::{ScaleTable, DEFAULT_THEME};
use crate::style::{rgb_from_components, StyleConfig};
use crate::types::{FontType, Orientation};
use crate::window::extract_windows;

pub const MIN_FLANK: usize = 1;
pub const MAX_FLANK: usize = 40;
pub const DEFAULT_FLANK: usize = 5;

/// Label font picked up from the asset directory when present.
pub const LABEL_FONT_FILE: &str = "label_font.ttf";

/// Validated parameters of a logo request.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoOptions {
    pub length_left: usize,
    pub length_right: usize,
    pub orientation: Orientation,
    pub font: FontType,
    /// Scale used to rank and shade the gradient scheme.
    pub theme: String,
    /// Category section of the style file. Dominates every gradient setting.
    pub section: Option<String>,
    /// Top and bottom gradient colors.
    pub gradient_colors: Option<[[f64; 3]; 2]>,
    /// Explicit gradient ranking, replaces the theme ranking.
    pub gradient_order: Option<Vec<char>>,
    /// Titles over the left and right region.
    pub headers: Option<[String; 2]>,
    pub legend: bool,
}

impl Default for LogoOptions {
    fn default() -> Self {
        LogoOptions {
            length_left: DEFAULT_FLANK,
            length_right: DEFAULT_FLANK,
            orientation: Orientation::default(),
            font: FontType::default(),
            theme: DEFAULT_THEME.to_string(),
            section: None,
            gradient_colors: None,
            gradient_order: None,
            headers: None,
            legend: true,
        }
    }
}

impl LogoOptions {
    pub fn builder() -> LogoOptionsBuilder {
        LogoOptionsBuilder::default()
    }

    /// Gradient parameters for this request, ranked by `scales` unless an explicit
    /// order was given.
    ///
    /// # Errors
    /// * Returns `LogoError::DataError` if the scale table cannot be read
    pub fn gradient_params(&self, scales: &ScaleTable) -> Result<GradientParams> {
        let mut params = GradientParams::default();
        if let Some([top, bottom]) = self.gradient_colors {
            params.top = top;
            params.bottom = bottom;
        }
        match &self.gradient_order {
            Some(order) => params.order = Some(order.clone()),
            None => {
                let ranking = scales.ranking(&self.theme)?;
                debug!("gradient ranked by {}", ranking.theme);
                params.order = Some(ranking.order);
                params.color_advance = Some(ranking.values);
            }
        }
        Ok(params)
    }
}

/// Collects raw request parameters and validates them in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct LogoOptionsBuilder {
    length_left: Option<i64>,
    length_right: Option<i64>,
    orientation: Option<Orientation>,
    font: Option<FontType>,
    theme: Option<String>,
    section: Option<String>,
    gradient_colors: Option<Vec<Vec<f64>>>,
    gradient_order: Option<String>,
    headers: Option<Vec<String>>,
    legend: Option<bool>,
}

impl LogoOptionsBuilder {
    pub fn length_left(mut self, length: i64) -> Self {
        self.length_left = Some(length);
        self
    }

    pub fn length_right(mut self, length: i64) -> Self {
        self.length_right = Some(length);
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn font(mut self, font: FontType) -> Self {
        self.font = Some(font);
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Top and bottom gradient colors as `[[r, g, b], [r, g, b]]`.
    pub fn gradient_colors(mut self, colors: Vec<Vec<f64>>) -> Self {
        self.gradient_colors = Some(colors);
        self
    }

    /// Gradient ranking as a string of one letter codes, top first.
    pub fn gradient_order(mut self, order: impl Into<String>) -> Self {
        self.gradient_order = Some(order.into());
        self
    }

    pub fn headers(mut self, headers: Vec<String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn legend(mut self, legend: bool) -> Self {
        self.legend = Some(legend);
        self
    }

    /// Validates the request.
    ///
    /// Flank lengths outside `MIN_FLANK..=MAX_FLANK` are clamped with a warning.
    ///
    /// # Errors
    /// * Returns `LogoError::InvalidParameter` if the gradient colors are not two RGB
    ///   triples in `[0, 255]` or the headers are not exactly two titles
    pub fn build(self) -> Result<LogoOptions> {
        let defaults = LogoOptions::default();

        let gradient_colors = self
            .gradient_colors
            .map(|colors| validate_gradient_colors(&colors))
            .transpose()?;

        let headers = match self.headers {
            Some(headers) => match <[String; 2]>::try_from(headers) {
                Ok(pair) => Some(pair),
                Err(headers) => {
                    return Err(LogoError::invalid_parameter(
                        "headers",
                        format!("{:?}", headers),
                        "expected [left_title, right_title]",
                    ))
                }
            },
            None => None,
        };

        let gradient_order = self
            .gradient_order
            .map(|order| {
                order
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != ',')
                    .map(|c| c.to_ascii_uppercase())
                    .collect::<Vec<_>>()
            })
            .filter(|order| !order.is_empty());

        Ok(LogoOptions {
            length_left: clamp_flank("length_left", self.length_left, defaults.length_left),
            length_right: clamp_flank("length_right", self.length_right, defaults.length_right),
            orientation: self.orientation.unwrap_or(defaults.orientation),
            font: self.font.unwrap_or(defaults.font),
            theme: self.theme.unwrap_or(defaults.theme),
            section: self.section,
            gradient_colors,
            gradient_order,
            headers,
            legend: self.legend.unwrap_or(defaults.legend),
        })
    }
}

fn clamp_flank(name: &str, length: Option<i64>, default: usize) -> usize {
    let Some(length) = length else {
        return default;
    };
    if length > MAX_FLANK as i64 {
        warn!("{} = {} exceeds the maximum of {} residues", name, length, MAX_FLANK);
        MAX_FLANK
    } else if length < MIN_FLANK as i64 {
        warn!("{} = {} is below the minimum of {} residue", name, length, MIN_FLANK);
        MIN_FLANK
    } else {
        length as usize
    }
}

fn validate_gradient_colors(colors: &[Vec<f64>]) -> Result<[[f64; 3]; 2]> {
    let malformed = || {
        LogoError::invalid_parameter(
            "gradient_colors",
            format!("{:?}", colors),
            "expected [[r, g, b], [r, g, b]] with components in [0, 255]",
        )
    };
    let [top, bottom] = colors else {
        return Err(malformed());
    };
    let mut validated = [[0.0; 3]; 2];
    for (target, color) in validated.iter_mut().zip([top, bottom]) {
        *target = <[f64; 3]>::try_from(color.as_slice()).map_err(|_| malformed())?;
        rgb_from_components("gradient_colors", *target).map_err(|_| malformed())?;
    }
    Ok(validated)
}

/// One logo to render: a position column with its orientation and geometry.
#[derive(Debug, Clone)]
struct LogoJob<'a> {
    column: &'a str,
    file_name: String,
    orientation: Orientation,
    length_left: usize,
    length_right: usize,
    titles: Option<[String; 2]>,
}

/// Renders logos for an input table.
pub struct LogoMaker<'a> {
    df: &'a DataFrame,
    name: String,
    sequence_column: String,
    position_columns: Vec<String>,
    style: &'a StyleConfig,
    scales: &'a ScaleTable,
    assets: PathBuf,
    output_dir: PathBuf,
    table_dir: Option<PathBuf>,
}

impl<'a> LogoMaker<'a> {
    /// Binds an input table to its configuration.
    ///
    /// A `label_font.ttf` inside the shared asset directory is registered for all
    /// logo text.
    ///
    /// # Errors
    /// * Returns `LogoError::MissingColumn` if the sequence column or a position
    ///   column is not in `df`
    /// * Returns `LogoError::InvalidParameter` if no position column is given
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        df: &'a DataFrame,
        name: impl Into<String>,
        sequence_column: impl Into<String>,
        position_columns: Vec<String>,
        style: &'a StyleConfig,
        scales: &'a ScaleTable,
        assets: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let sequence_column = sequence_column.into();
        if position_columns.is_empty() {
            return Err(LogoError::invalid_parameter(
                "position_columns",
                "[]",
                "at least one position column is required",
            ));
        }
        for column in std::iter::once(&sequence_column).chain(&position_columns) {
            if df.column(column).is_err() {
                return Err(LogoError::MissingColumn(column.clone()));
            }
        }

        let assets = assets.into();
        let font_path = assets.join(COMMON_DIR).join(LABEL_FONT_FILE);
        if font_path.is_file() {
            logo::register_label_font(&font_path)?;
        }

        Ok(LogoMaker {
            df,
            name: name.into(),
            sequence_column,
            position_columns,
            style,
            scales,
            assets,
            output_dir: output_dir.into(),
            table_dir: None,
        })
    }

    /// Also writes the frequency table of every logo as CSV into `dir`.
    pub fn with_table_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.table_dir = Some(dir.into());
        self
    }

    /// One logo per position column, all in `options.orientation`.
    ///
    /// # Returns
    /// * `Result<Vec<PathBuf>>` - The written image files
    pub fn single_mode(&self, options: &LogoOptions) -> Result<Vec<PathBuf>> {
        let several = self.position_columns.len() > 1;
        let jobs: Vec<LogoJob> = self
            .position_columns
            .iter()
            .map(|column| LogoJob {
                column,
                file_name: logo::output_file_name(
                    &self.name,
                    several.then_some(column.as_str()),
                    options.orientation,
                ),
                orientation: options.orientation,
                length_left: options.length_left,
                length_right: options.length_right,
                titles: options.headers.clone(),
            })
            .collect();
        self.run(options, &jobs)
    }

    /// Start and stop logos of a transmembrane domain.
    ///
    /// The first position column is the TMD start and renders N-terminal anchored with
    /// the juxtamembrane flank (`length_left`) on the left. The second is the TMD stop,
    /// rendered C-terminal anchored with both flanks and titles mirrored.
    ///
    /// # Errors
    /// * Returns `LogoError::InvalidParameter` if fewer than two position columns were given
    pub fn tmd_mode(&self, options: &LogoOptions) -> Result<Vec<PathBuf>> {
        let (start, stop) = match self.position_columns.as_slice() {
            [start, stop] => (start, stop),
            [start, stop, rest @ ..] => {
                warn!(
                    "TMD mode takes a start and a stop column, ignoring {:?}",
                    rest
                );
                (start, stop)
            }
            columns => {
                return Err(LogoError::invalid_parameter(
                    "position_columns",
                    format!("{:?}", columns),
                    "TMD mode needs a start and a stop column",
                ))
            }
        };

        let jobs = [
            LogoJob {
                column: start,
                file_name: logo::output_file_name(&self.name, None, Orientation::NTerminal),
                orientation: Orientation::NTerminal,
                length_left: options.length_left,
                length_right: options.length_right,
                titles: options.headers.clone(),
            },
            LogoJob {
                column: stop,
                file_name: logo::output_file_name(&self.name, None, Orientation::CTerminal),
                orientation: Orientation::CTerminal,
                length_left: options.length_right,
                length_right: options.length_left,
                titles: options
                    .headers
                    .clone()
                    .map(|[left, right]| [right, left]),
            },
        ];
        self.run(options, &jobs)
    }

    /// Palette of a request. A section found in the style file is resolved directly,
    /// so the scale table is only ranked when the gradient scheme is used.
    fn resolve_colors(&self, options: &LogoOptions) -> Result<ColorResolution> {
        let section = options.section.as_deref();
        if let Some(category) = section.and_then(|name| self.style.section(name)) {
            return Ok(ColorScheme::Category(category).resolve());
        }
        let gradient = options.gradient_params(self.scales)?;
        Ok(ColorScheme::select(self.style, section, gradient).resolve())
    }

    fn run(&self, options: &LogoOptions, jobs: &[LogoJob]) -> Result<Vec<PathBuf>> {
        let glyphs = GlyphStore::load(&self.assets, options.font)?;
        debug!("glyph set {}", glyphs.font());
        let resolution = self.resolve_colors(options)?;
        if options.legend && resolution.legend.is_none() {
            debug!("legend requested without a category scheme, skipped");
        }

        let mut written = Vec::with_capacity(jobs.len());
        for job in jobs {
            info!(
                "rendering {} ({}, {} + {} residues)",
                job.file_name,
                job.column,
                job.length_left,
                job.length_right
            );
            let windows = extract_windows(
                self.df,
                &self.sequence_column,
                job.column,
                job.length_left,
                job.length_right,
                job.orientation,
            )?;
            let table = tabulate(
                &windows,
                job.length_left,
                job.length_right,
                &resolution.glyph_order,
            );

            if let Some(dir) = &self.table_dir {
                write_table(&table, dir, &job.file_name)?;
            }

            let layout = LayoutParams {
                orientation: job.orientation,
                titles: job.titles.clone(),
                legend: options.legend,
            };
            let image = logo::render(
                &table,
                &resolution,
                &glyphs,
                &self.style.background,
                &layout,
            )?;
            written.push(logo::write_logo(&image, &self.output_dir, &job.file_name)?);
        }
        Ok(written)
    }
}

/// Writes a frequency table next to its logo name, `GPCR_N_term.png` -> `GPCR_N_term.csv`.
fn write_table(table: &FrequencyTable, dir: &Path, logo_file: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(Path::new(logo_file).with_extension("csv"));
    let mut df = table.to_dataframe()?;
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    debug!("frequency table written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_are_clamped() {
        let options = LogoOptions::builder()
            .length_left(0)
            .length_right(55)
            .build()
            .unwrap();
        assert_eq!(options.length_left, MIN_FLANK);
        assert_eq!(options.length_right, MAX_FLANK);

        let options = LogoOptions::builder().length_left(-3).build().unwrap();
        assert_eq!(options.length_left, MIN_FLANK);
        assert_eq!(options.length_right, DEFAULT_FLANK);
    }

    #[test]
    fn test_malformed_gradient_colors() {
        for colors in [
            vec![vec![1.0, 2.0, 3.0]],
            vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]],
            vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 256.0]],
            vec![vec![1.0, 2.0, 3.0], vec![1.0, f64::NAN, 3.0]],
        ] {
            let result = LogoOptions::builder().gradient_colors(colors).build();
            assert!(matches!(result, Err(LogoError::InvalidParameter { .. })));
        }

        let options = LogoOptions::builder()
            .gradient_colors(vec![vec![0.0, 0.0, 0.0], vec![255.0, 127.5, 1.0]])
            .build()
            .unwrap();
        assert_eq!(
            options.gradient_colors,
            Some([[0.0, 0.0, 0.0], [255.0, 127.5, 1.0]])
        );
    }

    #[test]
    fn test_headers_need_two_titles() {
        let result = LogoOptions::builder()
            .headers(vec!["JMD".to_string()])
            .build();
        assert!(matches!(result, Err(LogoError::InvalidParameter { .. })));

        let options = LogoOptions::builder()
            .headers(vec!["JMD".to_string(), "TMD".to_string()])
            .build()
            .unwrap();
        assert_eq!(options.headers, Some(["JMD".to_string(), "TMD".to_string()]));
    }

    #[test]
    fn test_gradient_order_is_normalized() {
        let options = LogoOptions::builder()
            .gradient_order("k, r,h")
            .build()
            .unwrap();
        assert_eq!(options.gradient_order, Some(vec!['K', 'R', 'H']));

        let options = LogoOptions::builder().gradient_order(" ").build().unwrap();
        assert_eq!(options.gradient_order, None);
    }

    #[test]
    fn test_gradient_params_from_theme() {
        let options = LogoOptions::default();
        let params = options.gradient_params(&ScaleTable::kyte_doolittle()).unwrap();
        let order = params.order.unwrap();
        assert_eq!(order[0], 'I');
        assert_eq!(params.color_advance.unwrap().len(), order.len());

        let options = LogoOptions {
            gradient_order: Some(vec!['K']),
            ..LogoOptions::default()
        };
        let params = options.gradient_params(&ScaleTable::kyte_doolittle()).unwrap();
        assert_eq!(params.order, Some(vec!['K']));
        assert!(params.color_advance.is_none());
    }
}

//! Logo compositing.
//!
//! Background regions, spines, ticks and labels are drawn with plotters into an RGB
//! buffer. Decorations, legend swatches and the stacked residue glyphs are then
//! alpha blended on top with `image`.
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, Color, DrawingArea, IntoDrawingArea, IntoFont, RGBColor, Rectangle, Text,
    BLACK, WHITE,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, FontTransform, TextStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::color::ColorResolution;
use crate::error::{LogoError, Result};
use crate::frequency::FrequencyTable;
use crate::glyph::GlyphStore;
use crate::style::BackgroundStyle;
use crate::types::{LegendEntry, Orientation};

/// Pixel height of a glyph at frequency 1, also the height of the plot area.
pub const GLYPH_SCALE: u32 = 554;
pub const GLYPH_WIDTH: u32 = 110;
pub const COLUMN_WIDTH: u32 = 120;

const MARGIN_LEFT: u32 = 130;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 80;
const MARGIN_BOTTOM: u32 = 110;
const LEGEND_WIDTH: u32 = 300;
const SPINE_WIDTH: i32 = 3;
const TICK_LENGTH: i32 = 10;
const Y_TICKS: u32 = 5;

const LEGEND_SWATCH_SIZE: u32 = 28;
/// Vertical legend step and first row offset, as fractions of the plot height.
const LEGEND_STEP: f64 = 0.05;
const LEGEND_OFFSET: f64 = 0.03;

pub const CROP_PADDING: u32 = 25;

/// Family name the label font is registered under.
pub const LABEL_FONT: &str = "aa-logo-label";

static REGISTERED_LABEL_FONT: OnceLock<PathBuf> = OnceLock::new();

/// Registers a TrueType font for titles, tick labels and legend text.
///
/// Without a registered font the logo is still rendered, only without text. The
/// first successful registration holds for the whole process, later calls are no-ops.
///
/// # Errors
/// * Returns `LogoError::Io` if the file cannot be read
/// * Returns `LogoError::Asset` if it is not a usable font
pub fn register_label_font(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(registered) = REGISTERED_LABEL_FONT.get() {
        if registered != path {
            warn!(
                "label font {} already registered, ignoring {}",
                registered.display(),
                path.display()
            );
        }
        return Ok(());
    }

    let bytes: &'static [u8] = Box::leak(fs::read(path)?.into_boxed_slice());
    plotters::style::register_font(LABEL_FONT, FontStyle::Normal, bytes)
        .map_err(|_| LogoError::asset(path, "not a valid TrueType font"))?;
    let _ = REGISTERED_LABEL_FONT.set(path.to_path_buf());
    debug!("registered label font {}", path.display());
    Ok(())
}

/// Path of the label font in use, if one was registered.
pub fn registered_label_font() -> Option<&'static Path> {
    REGISTERED_LABEL_FONT.get().map(PathBuf::as_path)
}

/// Everything about a logo besides the data and the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub orientation: Orientation,
    /// Titles over the left and right region.
    pub titles: Option<[String; 2]>,
    pub legend: bool,
}

/// Pixel geometry of the plot area. Data coordinates follow the axes: x in
/// `[-length_left - 0.5, length_right - 0.5]`, y in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub length_left: usize,
    pub length_right: usize,
    pub left: i32,
    pub top: i32,
}

impl PlotFrame {
    pub fn new(length_left: usize, length_right: usize) -> Self {
        PlotFrame {
            length_left,
            length_right,
            left: MARGIN_LEFT as i32,
            top: MARGIN_TOP as i32,
        }
    }

    pub fn columns(&self) -> usize {
        self.length_left + self.length_right
    }

    pub fn width(&self) -> u32 {
        self.columns() as u32 * COLUMN_WIDTH
    }

    pub fn right(&self) -> i32 {
        self.left + self.width() as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + GLYPH_SCALE as i32
    }

    pub fn x(&self, data_x: f64) -> i32 {
        let shifted = data_x + self.length_left as f64 + 0.5;
        self.left + (shifted * COLUMN_WIDTH as f64).round() as i32
    }

    pub fn y(&self, data_y: f64) -> i32 {
        self.top + ((1.0 - data_y) * GLYPH_SCALE as f64).round() as i32
    }

    /// Pixel x of the center of an offset column.
    pub fn column_center(&self, offset: i64) -> i32 {
        self.x(offset as f64)
    }

    /// Region boundary, i.e. data x = -0.5.
    pub fn boundary(&self) -> i32 {
        self.x(-0.5)
    }
}

/// Canvas size for a frame; the width grows linearly with the window length.
pub fn canvas_size(frame: &PlotFrame, legend: bool) -> (u32, u32) {
    let right = if legend { LEGEND_WIDTH } else { MARGIN_RIGHT };
    (
        MARGIN_LEFT + frame.width() + right,
        MARGIN_TOP + GLYPH_SCALE + MARGIN_BOTTOM,
    )
}

fn plot_color(rgb: Rgb<u8>) -> RGBColor {
    RGBColor(rgb[0], rgb[1], rgb[2])
}

fn label_style(size: f64) -> TextStyle<'static> {
    (LABEL_FONT, size, FontStyle::Normal).into_font().color(&BLACK)
}

/// Draws text, remembering failures instead of aborting the logo.
struct Labels<'a, 'b> {
    root: &'a DrawingArea<BitMapBackend<'b>, Shift>,
    skipped: usize,
}

impl<'a, 'b> Labels<'a, 'b> {
    fn draw(&mut self, text: &str, position: (i32, i32), style: TextStyle) {
        if let Err(e) = self.root.draw(&Text::new(text, position, style)) {
            debug!("label '{}' not drawn: {}", text, e);
            self.skipped += 1;
        }
    }
}

fn render_error(e: impl std::fmt::Display) -> LogoError {
    LogoError::Render(e.to_string())
}

/// Draws regions, spines, ticks and all text into a fresh RGB canvas.
fn draw_background(
    frame: &PlotFrame,
    size: (u32, u32),
    background: &BackgroundStyle,
    layout: &LayoutParams,
    legend: &[LegendEntry],
) -> Result<RgbImage> {
    let mut buffer = vec![u8::MAX; size.0 as usize * size.1 as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        // region bands, the N-terminal side of a start boundary is juxtamembrane
        let (left_color, right_color) = match layout.orientation {
            Orientation::NTerminal => (background.jmd, background.tmd),
            Orientation::CTerminal => (background.tmd, background.jmd),
        };
        let left_edge = frame.x(-(frame.length_left as f64) - 0.5);
        let right_edge = frame.x(frame.length_right as f64 - 0.5);
        root.draw(&Rectangle::new(
            [(left_edge, frame.top), (frame.boundary(), frame.bottom())],
            plot_color(left_color).filled(),
        ))
        .map_err(render_error)?;
        root.draw(&Rectangle::new(
            [(frame.boundary(), frame.top), (right_edge, frame.bottom())],
            plot_color(right_color).filled(),
        ))
        .map_err(render_error)?;

        // left and bottom spines only
        root.draw(&Rectangle::new(
            [
                (frame.left - SPINE_WIDTH, frame.top),
                (frame.left, frame.bottom() + SPINE_WIDTH),
            ],
            BLACK.filled(),
        ))
        .map_err(render_error)?;
        root.draw(&Rectangle::new(
            [
                (frame.left - SPINE_WIDTH, frame.bottom()),
                (frame.right(), frame.bottom() + SPINE_WIDTH),
            ],
            BLACK.filled(),
        ))
        .map_err(render_error)?;

        let mut labels = Labels {
            root: &root,
            skipped: 0,
        };

        let below = frame.bottom() + SPINE_WIDTH;
        for offset in -(frame.length_left as i64)..frame.length_right as i64 {
            let x = frame.column_center(offset);
            root.draw(&Rectangle::new(
                [(x - 1, below), (x + 1, below + TICK_LENGTH)],
                BLACK.filled(),
            ))
            .map_err(render_error)?;
            labels.draw(
                &offset.to_string(),
                (x, below + TICK_LENGTH + 6),
                label_style(18.0).pos(Pos::new(HPos::Center, VPos::Top)),
            );
        }

        let outside = frame.left - SPINE_WIDTH;
        for tick in 0..=Y_TICKS {
            let value = tick as f64 / Y_TICKS as f64;
            let y = frame.y(value);
            root.draw(&Rectangle::new(
                [(outside - TICK_LENGTH, y - 1), (outside, y + 1)],
                BLACK.filled(),
            ))
            .map_err(render_error)?;
            labels.draw(
                &format!("{:.1}", value),
                (outside - TICK_LENGTH - 6, y),
                label_style(18.0).pos(Pos::new(HPos::Right, VPos::Center)),
            );
        }

        labels.draw(
            "sequence position",
            ((frame.left + frame.right()) / 2, below + TICK_LENGTH + 45),
            label_style(18.0).pos(Pos::new(HPos::Center, VPos::Top)),
        );
        labels.draw(
            "AA frequency",
            (outside - TICK_LENGTH - 85, (frame.top + frame.bottom()) / 2),
            (LABEL_FONT, 18.0, FontStyle::Normal)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        );

        if let Some([left_title, right_title]) = &layout.titles {
            let above = frame.top - 12;
            labels.draw(
                left_title,
                ((left_edge + frame.boundary()) / 2, above),
                label_style(22.0).pos(Pos::new(HPos::Center, VPos::Bottom)),
            );
            labels.draw(
                right_title,
                ((frame.boundary() + right_edge) / 2, above),
                label_style(22.0).pos(Pos::new(HPos::Center, VPos::Bottom)),
            );
        }

        let legend_x = frame.right() + 12 + LEGEND_SWATCH_SIZE as i32 + 10;
        for (row, entry) in legend.iter().enumerate() {
            let y = legend_row_y(frame, row) + LEGEND_SWATCH_SIZE as i32 / 2;
            labels.draw(
                &entry.label,
                (legend_x, y),
                label_style(14.0).pos(Pos::new(HPos::Left, VPos::Center)),
            );
        }

        if labels.skipped > 0 {
            warn!(
                "{} labels skipped, register a label font to draw text",
                labels.skipped
            );
        }

        root.present().map_err(render_error)?;
    }

    RgbImage::from_raw(size.0, size.1, buffer)
        .ok_or_else(|| LogoError::Render("canvas buffer has the wrong size".into()))
}

fn legend_row_y(frame: &PlotFrame, row: usize) -> i32 {
    frame.top + ((LEGEND_OFFSET + LEGEND_STEP * row as f64) * GLYPH_SCALE as f64).round() as i32
}

/// Pixel height of a glyph at `frequency`, never below one pixel.
pub fn glyph_height(frequency: f64) -> u32 {
    (frequency * GLYPH_SCALE as f64) as u32 + 1
}

/// Composites one logo.
///
/// # Arguments
/// * `table` - Frequencies; its code order is the stacking order, top first
/// * `resolution` - Residue colors and legend entries
/// * `glyphs` - Glyph asset store
/// * `background` - Region and gradient colors
/// * `layout` - Orientation, titles and legend switch
///
/// # Returns
/// * `Result<RgbaImage>` - The uncropped canvas, see [`crop_to_content`]
///
/// # Errors
/// * Returns `LogoError::Render` if drawing fails
/// * Returns `LogoError::InvalidParameter` if a code has no glyph
pub fn render(
    table: &FrequencyTable,
    resolution: &ColorResolution,
    glyphs: &GlyphStore,
    background: &BackgroundStyle,
    layout: &LayoutParams,
) -> Result<RgbaImage> {
    let frame = PlotFrame::new(table.length_left(), table.length_right());
    let legend: &[LegendEntry] = match (&resolution.legend, layout.legend) {
        (Some(entries), true) => entries,
        _ => &[],
    };
    let size = canvas_size(&frame, !legend.is_empty());

    let mut canvas =
        DynamicImage::ImageRgb8(draw_background(&frame, size, background, layout, legend)?)
            .into_rgba8();

    // boundary gradient, anchored at the x axis and fading into the region it borders
    let gradient = glyphs.gradient_decoration(layout.orientation, background.gradient);
    if gradient.height() > 0 {
        let width = ((gradient.width() as u64 * GLYPH_SCALE as u64) / gradient.height() as u64)
            .max(1) as u32;
        let gradient = imageops::resize(&gradient, width, GLYPH_SCALE, FilterType::Triangle);
        let x = match layout.orientation {
            Orientation::NTerminal => frame.boundary() - width as i32,
            Orientation::CTerminal => frame.boundary(),
        };
        imageops::overlay(&mut canvas, &gradient, x as i64, frame.top as i64);
    }

    let swatch_x = frame.right() + 12;
    for (row, entry) in legend.iter().enumerate() {
        let swatch = imageops::resize(
            &glyphs.legend_swatch(entry.color),
            LEGEND_SWATCH_SIZE,
            LEGEND_SWATCH_SIZE,
            FilterType::Triangle,
        );
        imageops::overlay(
            &mut canvas,
            &swatch,
            swatch_x as i64,
            legend_row_y(&frame, row) as i64,
        );
    }

    let colored: HashMap<char, RgbaImage> = table
        .codes()
        .iter()
        .map(|&code| {
            glyphs
                .colored_glyph(code, resolution.colors.get(&code).copied())
                .map(|glyph| (code, glyph))
                .ok_or_else(|| {
                    LogoError::invalid_parameter("code", code, "no glyph in the asset store")
                })
        })
        .collect::<Result<_>>()?;

    for offset in table.offsets() {
        let Some(frequencies) = table.column(offset) else {
            continue;
        };
        let x = frame.column_center(offset) - GLYPH_WIDTH as i32 / 2;
        let mut stacked = 0.0;
        for (code, &frequency) in table.codes().iter().zip(frequencies.iter()) {
            if frequency <= 0.0 {
                continue;
            }
            stacked += frequency;
            let height = glyph_height(frequency);
            let glyph = imageops::resize(&colored[code], GLYPH_WIDTH, height, FilterType::Triangle);
            // bottom of the glyph sits at 1 - stacked, so the first code tops the bar
            let y = frame.y(1.0 - stacked) - height as i32;
            imageops::overlay(&mut canvas, &glyph, x as i64, y as i64);
        }
    }

    Ok(canvas)
}

/// Crops to the bounding box of all non-white pixels plus `padding`.
pub fn crop_to_content(image: &RgbaImage, padding: u32) -> RgbaImage {
    let background = Rgba([u8::MAX; 4]);
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if *pixel == background || pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return image.clone();
    };
    let x0 = x0.saturating_sub(padding);
    let y0 = y0.saturating_sub(padding);
    let x1 = (x1 + padding).min(image.width() - 1);
    let y1 = (y1 + padding).min(image.height() - 1);
    imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

/// Output file name, `{name}_{tag}.png` or `{name}_{column}_{tag}.png`.
pub fn output_file_name(name: &str, column: Option<&str>, orientation: Orientation) -> String {
    match column {
        Some(column) => format!("{}_{}_{}.png", name, column, orientation.tag()),
        None => format!("{}_{}.png", name, orientation.tag()),
    }
}

/// Crops a rendered logo and writes it as PNG into `output_dir`.
///
/// # Errors
/// * Returns `LogoError::Io` if the directory cannot be created
/// * Returns `LogoError::Image` if encoding or writing fails
pub fn write_logo(image: &RgbaImage, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(file_name);
    crop_to_content(image, CROP_PADDING).save(&path)?;
    info!("logo written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_geometry() {
        let frame = PlotFrame::new(3, 2);
        assert_eq!(frame.columns(), 5);
        assert_eq!(frame.x(-3.5), frame.left);
        assert_eq!(frame.x(1.5), frame.right());
        assert_eq!(frame.boundary(), frame.left + 3 * COLUMN_WIDTH as i32);
        assert_eq!(frame.y(1.0), frame.top);
        assert_eq!(frame.y(0.0), frame.bottom());
    }

    #[test]
    fn test_canvas_width_scales_with_window() {
        let (narrow, height) = canvas_size(&PlotFrame::new(2, 2), false);
        let (wide, same_height) = canvas_size(&PlotFrame::new(4, 4), false);
        assert_eq!(wide - narrow, 4 * COLUMN_WIDTH);
        assert_eq!(height, same_height);
    }

    #[test]
    fn test_glyph_height() {
        assert_eq!(glyph_height(1.0), GLYPH_SCALE + 1);
        assert_eq!(glyph_height(0.5), GLYPH_SCALE / 2 + 1);
        assert_eq!(glyph_height(1e-9), 1);
    }

    #[test]
    fn test_crop_to_content() {
        let mut image = RgbaImage::from_pixel(100, 80, Rgba([255, 255, 255, 255]));
        image.put_pixel(40, 30, Rgba([0, 0, 0, 255]));
        image.put_pixel(50, 35, Rgba([0, 0, 0, 255]));

        let cropped = crop_to_content(&image, 5);
        assert_eq!(cropped.dimensions(), (21, 16));

        let blank = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        assert_eq!(crop_to_content(&blank, 5).dimensions(), (10, 10));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name("GPCR", None, Orientation::NTerminal),
            "GPCR_N_term.png"
        );
        assert_eq!(
            output_file_name("GPCR", Some("tmd_stop"), Orientation::CTerminal),
            "GPCR_tmd_stop_C_term.png"
        );
    }
}

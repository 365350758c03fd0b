//! Glyph assets and recoloring.
//!
//! An asset store is a directory with one sub directory per [`FontType`] holding
//! `<code>.png` for each canonical amino acid, plus `AA_letters_common/` with the
//! boundary gradients (`white_r_grad.png`, `white_l_grad.png`) and the legend swatch
//! template (`color_box_index.png`). Pure white pixels of any asset are its fill mask.
use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LogoError, Result};
use crate::sequence::CANONICAL_ORDER;
use crate::types::{FontType, Orientation};

pub const COMMON_DIR: &str = "AA_letters_common";
pub const RIGHT_GRADIENT: &str = "white_r_grad";
pub const LEFT_GRADIENT: &str = "white_l_grad";
pub const LEGEND_SWATCH: &str = "color_box_index";

/// Replaces every pure white pixel with `rgb`, keeping its alpha.
///
/// All other pixels are copied unchanged and the source image is left untouched.
pub fn recolor(image: &DynamicImage, rgb: Rgb<u8>) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, alpha]) = *pixel;
        if r == u8::MAX && g == u8::MAX && b == u8::MAX {
            *pixel = Rgba([rgb[0], rgb[1], rgb[2], alpha]);
        }
    }
    rgba
}

/// Shared decoration images.
#[derive(Debug, Clone)]
pub struct Decorations {
    pub right_gradient: DynamicImage,
    pub left_gradient: DynamicImage,
    pub legend_swatch: DynamicImage,
}

/// Read-only glyph images of one font type.
#[derive(Debug, Clone)]
pub struct GlyphStore {
    font: FontType,
    glyphs: HashMap<char, DynamicImage>,
    decorations: Decorations,
}

fn open_asset(path: PathBuf) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(LogoError::asset(path, "file not found"));
    }
    image::open(&path).map_err(|e| LogoError::asset(path, e.to_string()))
}

impl GlyphStore {
    /// Loads all glyphs of `font` and the shared decorations from an asset directory.
    ///
    /// # Errors
    /// * Returns `LogoError::Asset` if an image is missing or cannot be decoded
    pub fn load(root: impl AsRef<Path>, font: FontType) -> Result<Self> {
        let root = root.as_ref();
        let font_dir = root.join(font.dir_name());
        let common_dir = root.join(COMMON_DIR);

        let glyphs = CANONICAL_ORDER
            .iter()
            .map(|&code| Ok((code, open_asset(font_dir.join(format!("{}.png", code)))?)))
            .collect::<Result<HashMap<_, _>>>()?;

        let decorations = Decorations {
            right_gradient: open_asset(common_dir.join(format!("{}.png", RIGHT_GRADIENT)))?,
            left_gradient: open_asset(common_dir.join(format!("{}.png", LEFT_GRADIENT)))?,
            legend_swatch: open_asset(common_dir.join(format!("{}.png", LEGEND_SWATCH)))?,
        };
        debug!("loaded {} glyphs from {}", glyphs.len(), font_dir.display());

        Ok(GlyphStore {
            font,
            glyphs,
            decorations,
        })
    }

    /// Builds a store from images already in memory.
    ///
    /// # Errors
    /// * Returns `LogoError::InvalidParameter` if a canonical code has no glyph
    pub fn from_images(
        font: FontType,
        glyphs: HashMap<char, DynamicImage>,
        decorations: Decorations,
    ) -> Result<Self> {
        if let Some(missing) = CANONICAL_ORDER.iter().find(|c| !glyphs.contains_key(*c)) {
            return Err(LogoError::invalid_parameter(
                "glyphs",
                missing,
                "every canonical amino acid needs a glyph",
            ));
        }
        Ok(GlyphStore {
            font,
            glyphs,
            decorations,
        })
    }

    pub fn font(&self) -> FontType {
        self.font
    }

    pub fn glyph(&self, code: char) -> Option<&DynamicImage> {
        self.glyphs.get(&code)
    }

    /// Glyph of `code` recolored to `color`, or in its own colors when `color` is `None`.
    pub fn colored_glyph(&self, code: char, color: Option<Rgb<u8>>) -> Option<RgbaImage> {
        let glyph = self.glyph(code)?;
        Some(match color {
            Some(rgb) => recolor(glyph, rgb),
            None => glyph.to_rgba8(),
        })
    }

    /// Boundary gradient for an orientation. N-terminal logos fade towards the right
    /// region, C-terminal logos use the mirrored asset.
    pub fn gradient_decoration(
        &self,
        orientation: Orientation,
        color: Option<Rgb<u8>>,
    ) -> RgbaImage {
        let image = match orientation {
            Orientation::NTerminal => &self.decorations.right_gradient,
            Orientation::CTerminal => &self.decorations.left_gradient,
        };
        match color {
            Some(rgb) => recolor(image, rgb),
            None => image.to_rgba8(),
        }
    }

    pub fn legend_swatch(&self, color: Rgb<u8>) -> RgbaImage {
        recolor(&self.decorations.legend_swatch, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> DynamicImage {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        image.put_pixel(1, 0, Rgba([255, 255, 255, 40]));
        image.put_pixel(2, 0, Rgba([10, 10, 10, 255]));
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn test_recolor_replaces_white_only() {
        let source = sample_image();
        let recolored = recolor(&source, Rgb([200, 0, 100]));

        assert_eq!(*recolored.get_pixel(0, 0), Rgba([200, 0, 100, 255]));
        assert_eq!(*recolored.get_pixel(1, 0), Rgba([200, 0, 100, 40]));
        assert_eq!(*recolored.get_pixel(2, 0), Rgba([10, 10, 10, 255]));
        // source untouched
        assert_eq!(source.to_rgba8().get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_recolor_is_idempotent() {
        let source = sample_image();
        let color = Rgb([12, 34, 56]);
        let once = recolor(&source, color);
        let again = recolor(&source, color);
        let twice = recolor(&DynamicImage::ImageRgba8(once.clone()), color);

        assert_eq!(once, again);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_images_requires_all_codes() {
        let decorations = Decorations {
            right_gradient: sample_image(),
            left_gradient: sample_image(),
            legend_swatch: sample_image(),
        };
        let glyphs: HashMap<char, DynamicImage> =
            [('A', sample_image())].into_iter().collect();
        assert!(GlyphStore::from_images(FontType::Bold, glyphs, decorations).is_err());
    }

    #[test]
    fn test_load_reports_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let result = GlyphStore::load(dir.path(), FontType::Bold);
        assert!(matches!(result, Err(LogoError::Asset { .. })));
    }
}

//! CPU rasterisation of the debug console lines into an RGBA texture.
//!
//! The layout mirrors the web panel: 20px text, first baseline at 30px,
//! 24px between lines, over a 70% black background.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use anyhow::Result;
use log::warn;

pub const TEXTURE_WIDTH: u32 = 1024;
pub const TEXTURE_HEIGHT: u32 = 512;

const FONT_PX: f32 = 20.0;
const FIRST_BASELINE: f32 = 30.0;
const LINE_HEIGHT: f32 = 24.0;
const LEFT_MARGIN: f32 = 10.0;
const BACKGROUND: [u8; 4] = [0, 0, 0, 179];

/// Overrides the font search with a TTF/OTF path.
pub const FONT_ENV: &str = "ROOM_VIEWER_FONT";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Baseline of the `line`-th console line in texture pixels.
pub fn baseline(line: usize) -> f32 {
    FIRST_BASELINE + line as f32 * LINE_HEIGHT
}

/// First readable font among `$ROOM_VIEWER_FONT` and the usual system locations.
pub fn load_font() -> Option<FontArc> {
    let candidates = env::var_os(FONT_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
    for path in candidates {
        if let Ok(font) = read_font(&path) {
            return Some(font);
        }
    }
    warn!("no console font found; set {FONT_ENV} to show console text");
    None
}

fn read_font(path: &Path) -> Result<FontArc> {
    let bytes = fs::read(path)?;
    Ok(FontArc::try_from_vec(bytes)?)
}

/// Owns the console pixels and redraws them on demand.
pub struct ConsoleRaster {
    font: Option<FontArc>,
    pixels: Vec<u8>,
}

impl ConsoleRaster {
    /// Without a font only the background is drawn.
    pub fn new(font: Option<FontArc>) -> Self {
        Self {
            font,
            pixels: vec![0; (TEXTURE_WIDTH * TEXTURE_HEIGHT * 4) as usize],
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Redraws the texture from the given lines, oldest first.
    pub fn render<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) -> &[u8] {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&BACKGROUND);
        }
        if let Some(font) = &self.font {
            for (index, line) in lines.into_iter().enumerate() {
                let y = baseline(index);
                if y > TEXTURE_HEIGHT as f32 {
                    break;
                }
                draw_line(font, &mut self.pixels, line, y);
            }
        }
        &self.pixels
    }
}

fn draw_line(font: &FontArc, pixels: &mut [u8], text: &str, baseline: f32) {
    let scale = PxScale::from(FONT_PX);
    let scaled = font.as_scaled(scale);
    let mut x = LEFT_MARGIN;
    let mut previous = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(previous) = previous {
            x += scaled.kern(previous, id);
        }
        previous = Some(id);
        let glyph = Glyph {
            id,
            scale,
            position: point(x, baseline),
        };
        x += scaled.h_advance(id);
        if x > TEXTURE_WIDTH as f32 {
            break;
        }
        let Some(outline) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outline.px_bounds();
        outline.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= TEXTURE_WIDTH as i32 || py >= TEXTURE_HEIGHT as i32 {
                return;
            }
            blend_white(pixels, px as u32, py as u32, coverage);
        });
    }
}

fn blend_white(pixels: &mut [u8], x: u32, y: u32, coverage: f32) {
    let index = ((y * TEXTURE_WIDTH + x) * 4) as usize;
    let alpha = coverage.clamp(0.0, 1.0);
    for channel in &mut pixels[index..index + 3] {
        *channel = (*channel as f32 + (255.0 - *channel as f32) * alpha).round() as u8;
    }
    pixels[index + 3] = pixels[index + 3].max((alpha * 255.0) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_font() -> Option<FontArc> {
        SYSTEM_FONTS
            .iter()
            .find_map(|path| read_font(Path::new(path)).ok())
    }

    fn row_has_text(pixels: &[u8], rows: std::ops::Range<u32>) -> bool {
        rows.flat_map(|y| (0..TEXTURE_WIDTH).map(move |x| (x, y)))
            .any(|(x, y)| pixels[((y * TEXTURE_WIDTH + x) * 4) as usize] > 128)
    }

    #[test]
    fn twenty_lines_fit_the_texture() {
        assert_eq!(baseline(0), 30.0);
        assert_eq!(baseline(1), 54.0);
        assert!(baseline(19) < TEXTURE_HEIGHT as f32);
    }

    #[test]
    fn fontless_raster_is_background_only() {
        let mut raster = ConsoleRaster::new(None);
        let pixels = raster.render(["[LOG] Avatar loaded"]);
        assert_eq!(pixels.len(), (TEXTURE_WIDTH * TEXTURE_HEIGHT * 4) as usize);
        assert!(pixels.chunks_exact(4).all(|pixel| pixel == BACKGROUND));
    }

    #[test]
    fn draws_lines_on_their_rows() {
        let Some(font) = system_font() else {
            return;
        };
        let mut raster = ConsoleRaster::new(Some(font));
        assert!(raster.has_font());
        let pixels = raster.render(["[ERR] Avatar error"]).to_vec();
        assert!(row_has_text(&pixels, 10..36));
        assert!(!row_has_text(&pixels, 40..TEXTURE_HEIGHT));

        let cleared = raster.render(std::iter::empty());
        assert!(!row_has_text(cleared, 0..TEXTURE_HEIGHT));
    }
}

//! Text on top of `RgbImage` buffers, drawn through the plotters bitmap backend.
use image::{Rgb, RgbImage};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const FONT_FAMILY: &str = "sans-serif";

fn text_style(size: u32, color: Rgb<u8>) -> TextStyle<'static> {
    (FONT_FAMILY, size as f64)
        .into_font()
        .color(&RGBColor(color[0], color[1], color[2]))
        .pos(Pos::new(HPos::Left, VPos::Top))
}

/// Pixel size of `text` at `size`; falls back to an estimate when no font is available.
pub(crate) fn text_size(text: &str, size: u32) -> (u32, u32) {
    let style = text_style(size, Rgb([0, 0, 0]));
    match style.font.box_size(text) {
        Ok((width, height)) if width > 0 && height > 0 => (width, height),
        _ => (((text.chars().count() as u32) * size * 3).div_ceil(5), size),
    }
}

/// Draw `text` with its top-left corner at `origin`.
pub(crate) fn draw_text(image: &mut RgbImage, text: &str, origin: (i32, i32), size: u32, color: Rgb<u8>) -> Result<(), String> {
    let dimensions = image.dimensions();
    let buffer: &mut [u8] = &mut *image;
    let root = BitMapBackend::with_buffer(buffer, dimensions).into_drawing_area();

    root.draw_text(text, &text_style(size, color), origin)
        .map_err(|e| e.to_string())?;
    root.present().map_err(|e| e.to_string())
}

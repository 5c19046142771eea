//! Bounding box overlays drawn directly into RGB captures
//!
//! Each box gets an outline and, when labelled, a filled caption box above its
//! top edge (or just inside it when there is no room above).
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use image::{Rgb, RgbImage};
use log::{debug, warn};
use md5::{Digest, Md5};

use super::text::{draw_text, text_size};
use super::RenderError;
use crate::perception::BBox2D;

/// A palette entry: outline/caption background color and caption text color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub fill: [u8; 3],
    pub text: [u8; 3],
}

const fn named(name: &'static str, fill: [u8; 3], text: [u8; 3]) -> NamedColor {
    NamedColor { name, fill, text }
}

pub const COLORS: [NamedColor; 15] = [
    named("navy", [0, 38, 63], [119, 193, 250]),
    named("blue", [0, 120, 210], [173, 220, 252]),
    named("aqua", [115, 221, 252], [0, 76, 100]),
    named("teal", [15, 205, 202], [0, 0, 0]),
    named("olive", [52, 153, 114], [25, 58, 45]),
    named("green", [0, 204, 84], [15, 64, 31]),
    named("lime", [1, 255, 127], [0, 102, 53]),
    named("yellow", [255, 216, 70], [103, 87, 28]),
    named("orange", [255, 125, 57], [104, 48, 19]),
    named("red", [255, 47, 65], [131, 0, 17]),
    named("maroon", [135, 13, 75], [239, 117, 173]),
    named("fuchsia", [246, 0, 184], [103, 0, 78]),
    named("purple", [179, 17, 193], [241, 167, 244]),
    named("gray", [168, 168, 168], [0, 0, 0]),
    named("silver", [220, 220, 220], [0, 0, 0]),
];

pub const DEFAULT_COLOR_NAME: &str = "green";

/// Only the first missing-font failure is logged.
static TEXT_WARNING_SHOWN: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxStyle {
    /// Outline width in pixels
    pub line_width: u32,
    /// Caption font size is `image_width / font_scale`
    pub font_scale: u32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self { line_width: 3, font_scale: 50 }
    }
}

impl BoxStyle {
    fn font_size(&self, image_width: u32) -> u32 {
        (image_width / self.font_scale.max(1)).max(10)
    }
}

pub fn color_by_name(name: &str) -> Result<&'static NamedColor, RenderError> {
    COLORS.iter().find(|color| color.name == name).ok_or_else(|| {
        let names: Vec<&str> = COLORS.iter().map(|color| color.name).collect();
        RenderError::UnknownColor(names.join(", "))
    })
}

/// Stable palette color for a label, so the same class always gets the same color.
pub fn color_for_label(label: &str) -> &'static NamedColor {
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&Md5::digest(label.as_bytes()));
    let index = (u128::from_be_bytes(digest) % COLORS.len() as u128) as usize;
    &COLORS[index]
}

/// `"<name>: <score>%"` with a blank sign slot for non-negative scores.
fn score_caption(name: &str, score: f32) -> String {
    let percent = score * 100.0;
    if percent.is_sign_negative() {
        format!("{}: {:.2}%", name, percent)
    } else {
        format!("{}:  {:.2}%", name, percent)
    }
}

/// Fill the inclusive rectangle `[left, right] x [top, bottom]`, clipped to the image.
fn fill_rect(image: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = right.min(width as i64 - 1);
    let y1 = bottom.min(height as i64 - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Outline centered on the rectangle edges.
fn draw_outline(image: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64, line_width: u32, color: Rgb<u8>) {
    let half = (line_width / 2) as i64;
    let extra = (line_width as i64 - 1) - half;

    fill_rect(image, left - half, top - half, right + extra, top + extra, color);
    fill_rect(image, left - half, bottom - half, right + extra, bottom + extra, color);
    fill_rect(image, left - half, top - half, left + extra, bottom + extra, color);
    fill_rect(image, right - half, top - half, right + extra, bottom + extra, color);
}

/// Where a caption goes for a box whose top-left corner is `(left, top)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPlacement {
    /// Caption background (left, top, right, bottom), inclusive
    pub rect: (i64, i64, i64, i64),
    /// Top-left corner of the caption text
    pub text_origin: (i64, i64),
}

pub fn label_placement(left: i64, top: i64, image_width: u32, label_size: (u32, u32)) -> LabelPlacement {
    let (label_width, label_height) = (label_size.0 as i64, label_size.1 as i64);
    let rect_width = label_width + 1;
    let rect_height = label_height + 1;

    let mut rect_bottom = top;
    let rect_left = (left - 1).min(image_width as i64 - rect_width).max(0);
    let mut rect_top = rect_bottom - rect_height;
    let rect_right = rect_left + rect_width;
    let mut text_top = rect_top + 1;

    // No room above the box: put the caption just inside its top edge
    if rect_top < 0 {
        rect_top = top;
        rect_bottom = rect_top + label_height + 1;
        text_top = rect_top;
    }

    LabelPlacement {
        rect: (rect_left, rect_top, rect_right, rect_bottom),
        text_origin: (rect_left + 1, text_top),
    }
}

/// Draw one box, and its caption when `label` is given.
///
/// Without an explicit `color`, a labelled box is colored by its label and an
/// unlabelled one uses [`DEFAULT_COLOR_NAME`].
#[allow(clippy::too_many_arguments)]
pub fn add(
    image: &mut RgbImage,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    label: Option<&str>,
    color: Option<&str>,
    style: &BoxStyle,
) -> Result<(), RenderError> {
    let palette = match (color, label) {
        (Some(name), _) => color_by_name(name)?,
        (None, Some(label)) => color_for_label(label),
        (None, None) => color_by_name(DEFAULT_COLOR_NAME)?,
    };
    let fill = Rgb(palette.fill);

    let (left, top, right, bottom) = (left as i64, top as i64, right as i64, bottom as i64);
    draw_outline(image, left, top, right, bottom, style.line_width, fill);

    let Some(label) = label.filter(|label| !label.is_empty()) else {
        return Ok(());
    };

    let font_size = style.font_size(image.width());
    let placement = label_placement(left, top, image.width(), text_size(label, font_size));
    let (rect_left, rect_top, rect_right, rect_bottom) = placement.rect;
    fill_rect(image, rect_left, rect_top, rect_right, rect_bottom, fill);

    let origin = (placement.text_origin.0 as i32, placement.text_origin.1 as i32);
    if let Err(e) = draw_text(image, label, origin, font_size, Rgb(palette.text)) {
        if !TEXT_WARNING_SHOWN.swap(true, Ordering::Relaxed) {
            warn!("Box captions are drawn without text: {}", e);
        }
    }

    Ok(())
}

/// Copy of `image` with every box drawn.
///
/// With `colors`, box `i` uses `colors[i]` and its caption shows the score.
pub fn plot_bboxes(
    image: &RgbImage,
    boxes: &[BBox2D],
    label_mappings: &BTreeMap<u64, String>,
    colors: Option<&[String]>,
    style: &BoxStyle,
) -> Result<RgbImage, RenderError> {
    if let Some(colors) = colors {
        if colors.len() < boxes.len() {
            return Err(RenderError::MissingColors { boxes: boxes.len(), colors: colors.len() });
        }
    }

    let mut combined = image.clone();
    for (i, bbox) in boxes.iter().enumerate() {
        let (left, top, right, bottom) = bbox.to_corners();
        let name = label_mappings
            .get(&bbox.label)
            .cloned()
            .unwrap_or_else(|| bbox.label.to_string());

        match colors {
            Some(colors) => {
                let caption = score_caption(&name, bbox.score);
                add(&mut combined, left, top, right, bottom, Some(caption.as_str()), Some(colors[i].as_str()), style)?;
            }
            None => add(&mut combined, left, top, right, bottom, Some(name.as_str()), None, style)?,
        }
    }

    debug!("Drew {} boxes on {}x{} image", boxes.len(), image.width(), image.height());
    Ok(combined)
}

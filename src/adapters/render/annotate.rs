//! Draws detection boxes and captions onto a copy of the input image.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::domain::detection::Detection;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const PALETTE: [[u8; 3]; 20] = [
    [255, 56, 56], [255, 157, 151], [255, 112, 31], [255, 178, 29], [207, 210, 49],
    [72, 249, 10], [146, 204, 23], [61, 219, 134], [26, 147, 52], [0, 212, 187],
    [44, 153, 168], [0, 194, 255], [52, 69, 147], [100, 115, 255], [0, 24, 236],
    [132, 56, 255], [82, 0, 133], [203, 56, 255], [255, 149, 200], [255, 55, 199],
];

const SYSTEM_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

pub struct Annotator {
    font: Option<FontVec>,
    font_scale: f32,
    thickness: i32,
}

impl Default for Annotator {
    fn default() -> Self {
        Self { font: None, font_scale: 18.0, thickness: 2 }
    }
}

impl Annotator {
    /// Uses `font_path` if given, otherwise the first readable system font.
    /// Without a font only the boxes are drawn.
    pub fn new(font_path: Option<&Path>) -> Self {
        let candidates: Vec<&Path> = match font_path {
            Some(p) => vec![p],
            None => SYSTEM_FONTS.iter().map(Path::new).collect(),
        };

        for path in candidates {
            if let Ok(data) = std::fs::read(path) {
                match FontVec::try_from_vec(data) {
                    Ok(font) => {
                        info!("Loaded caption font: {}", path.display());
                        return Self { font: Some(font), ..Self::default() };
                    }
                    Err(_) => warn!("Unreadable font file: {}", path.display()),
                }
            }
        }

        debug!("No font found, captions will be skipped");
        Self::default()
    }

    pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);
        if w == 0 || h == 0 {
            return canvas;
        }

        for det in detections {
            let color = class_color(det.class_id);
            let x1 = (det.x1.round() as i32).clamp(0, w - 1);
            let y1 = (det.y1.round() as i32).clamp(0, h - 1);
            let x2 = (det.x2.round() as i32).clamp(0, w - 1);
            let y2 = (det.y2.round() as i32).clamp(0, h - 1);

            for t in 0..self.thickness {
                let (bw, bh) = (x2 - x1 - 2 * t, y2 - y1 - 2 * t);
                if bw <= 0 || bh <= 0 {
                    break;
                }
                let rect = Rect::at(x1 + t, y1 + t).of_size(bw as u32, bh as u32);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            if let Some(font) = &self.font {
                let caption = format!("{} {:.2}", det.label, det.score);
                let scale = PxScale::from(self.font_scale);
                let (tw, th) = text_size(scale, font, &caption);
                let pad = 2;
                // Above the box when it fits, otherwise inside it.
                let ty = if y1 - th as i32 - 2 * pad >= 0 { y1 - th as i32 - 2 * pad } else { y1 };
                let bg = Rect::at(x1, ty).of_size(tw + 2 * pad as u32, th + 2 * pad as u32);
                draw_filled_rect_mut(&mut canvas, bg, color);
                draw_text_mut(&mut canvas, TEXT_COLOR, x1 + pad, ty + pad, scale, font, &caption);
            }
        }
        canvas
    }
}

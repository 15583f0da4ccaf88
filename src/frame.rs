//! Frames returned by the backend as base64 PNG, and ROI annotation of them.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::PanelError;
use crate::overlay::overlay_boxes;
use crate::roi::{RoiSet, W};

/// A decoded display frame. The backend already upscales it for display.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub png: Vec<u8>,
}

impl Frame {
    pub fn from_png(png: Vec<u8>) -> Result<Self, PanelError> {
        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .map_err(|err| PanelError::Frame(err.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(PanelError::Frame("empty image".to_string()));
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
            png,
        })
    }

    /// Accepts the raw payload or a `data:` URL.
    pub fn from_base64(payload: &str) -> Result<Self, PanelError> {
        let payload = payload.trim();
        let payload = payload
            .split_once(";base64,")
            .map_or(payload, |(_, data)| data);
        let png = BASE64
            .decode(payload)
            .map_err(|err| PanelError::Frame(err.to_string()))?;
        Self::from_png(png)
    }

    /// Display pixels per source pixel.
    pub fn scale(&self) -> f32 {
        self.width as f32 / W as f32
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }
}

/// Copy of the frame with every ROI box stroked in its overlay colour.
pub fn annotate(frame: &Frame, rois: &RoiSet) -> Result<RgbaImage, PanelError> {
    let mut canvas = frame
        .to_image()
        .ok_or_else(|| PanelError::Frame("pixel buffer does not match dimensions".to_string()))?;

    for item in overlay_boxes(rois, frame.scale()) {
        let [r, g, b] = item.color;
        let color = Rgba([r, g, b, 255]);
        let size = item.size.round().max(1.0) as u32;
        let x = item.x.round() as i32;
        let y = item.y.round() as i32;
        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(size, size), color);
        if size > 2 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + 1, y + 1).of_size(size - 2, size - 2),
                color,
            );
        }
    }

    Ok(canvas)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::roi::{Roi, Target};
    use std::io::Cursor;

    pub(crate) fn grey_png(side: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(side, side, Rgba([40, 40, 40, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        let b64 = BASE64.encode(grey_png(480));
        let frame = Frame::from_base64(&b64).expect("plain");
        assert_eq!((frame.width, frame.height), (480, 480));
        assert_eq!(frame.rgba.len(), 480 * 480 * 4);
        assert_eq!(frame.scale(), 3.0);

        let url = format!("data:image/png;base64,{b64}");
        assert!(Frame::from_base64(&url).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(Frame::from_base64("%%%"), Err(PanelError::Frame(_))));
        let not_png = BASE64.encode(b"hello");
        assert!(matches!(Frame::from_base64(&not_png), Err(PanelError::Frame(_))));
    }

    #[test]
    fn annotation_strokes_box_edges() {
        let frame = Frame::from_png(grey_png(160)).expect("frame");
        let rois = RoiSet::new([
            Roi::new(80, 40),
            Roi::new(40, 120),
            Roi::new(120, 40),
            Roi::new(120, 120),
        ]);
        let out = annotate(&frame, &rois).expect("annotate");
        let [r, g, b] = Target::Internal.color();
        // Internal box top-left corner at (55, 15) at scale 1.
        assert_eq!(*out.get_pixel(55, 15), Rgba([r, g, b, 255]));
        assert_eq!(*out.get_pixel(80, 40), Rgba([40, 40, 40, 255]));
    }
}

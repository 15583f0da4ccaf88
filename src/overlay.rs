//! ROI overlay geometry, shared by the canvas layer and the SVG export.

use std::fmt::Write as _;

use crate::roi::{H, ROI_SIZE, RoiSet, SCALE, Target, W};

pub const STROKE_WIDTH: f32 = 2.0;
pub const LABEL_SIZE: f32 = 12.0;
/// Label anchor relative to the box corner, in display pixels (SVG baseline).
pub const LABEL_OFFSET: (f32, f32) = (6.0, 14.0);

/// One ROI as drawn on screen: a stroked square plus its caption.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub target: Target,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: [u8; 3],
    pub label: String,
}

impl OverlayBox {
    pub fn label_anchor(&self) -> (f32, f32) {
        (self.x + LABEL_OFFSET.0, self.y + LABEL_OFFSET.1)
    }
}

/// Rebuilds the whole overlay from the current ROI state, in slot order.
pub fn overlay_boxes(rois: &RoiSet, scale: f32) -> Vec<OverlayBox> {
    rois.as_array()
        .iter()
        .enumerate()
        .map(|(i, roi)| {
            let target = Target::from_index(i);
            let (x, y) = roi.top_left();
            OverlayBox {
                target,
                x: x as f32 * scale,
                y: y as f32 * scale,
                size: ROI_SIZE as f32 * scale,
                color: target.color(),
                label: format!("{} ({},{})", target.name(), roi.cx, roi.cy),
            }
        })
        .collect()
}

/// Standalone SVG document of the overlay at display scale.
pub fn render_svg(rois: &RoiSet) -> String {
    let width = W * SCALE;
    let height = H * SCALE;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );

    for item in overlay_boxes(rois, SCALE as f32) {
        let [r, g, b] = item.color;
        let color = format!("#{r:02x}{g:02x}{b:02x}");
        let (lx, ly) = item.label_anchor();
        // Writing to a String cannot fail.
        let _ = writeln!(
            svg,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{STROKE_WIDTH}\"/>",
            item.x, item.y, item.size, item.size
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{lx}\" y=\"{ly}\" fill=\"{color}\" font-size=\"{LABEL_SIZE}px\" font-weight=\"700\">{}</text>",
            item.label
        );
    }

    svg.push_str("</svg>\n");
    svg
}

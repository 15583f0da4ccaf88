//! ROI model: four fixed-size boxes, one per assay target, positioned by centroid.

use serde::{Deserialize, Serialize};

/// Frame width in source pixels.
pub const W: i32 = 160;
/// Frame height in source pixels.
pub const H: i32 = 160;
/// Side length of every ROI box in source pixels.
pub const ROI_SIZE: i32 = 50;
/// Display scale of the frame view (160px frame shown at 480px).
pub const SCALE: i32 = 3;

const HALF: i32 = ROI_SIZE / 2;

/// Smallest legal centroid coordinate.
pub const MIN_CENTER: i32 = HALF;
/// Largest legal centroid coordinate along x.
pub const MAX_CX: i32 = W - HALF;
/// Largest legal centroid coordinate along y.
pub const MAX_CY: i32 = H - HALF;

pub fn clamp(v: i32, min: i32, max: i32) -> i32 {
    v.max(min).min(max)
}

/// Top-left corner of the box centered at `(cx, cy)`. No bounds checking.
pub fn centroid_to_top_left(cx: i32, cy: i32) -> (i32, i32) {
    (cx - HALF, cy - HALF)
}

/// Assay target bound to each ROI slot. The discriminant is the slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Internal = 0,
    Hiv = 1,
    Hbv = 2,
    Hcv = 3,
}

impl Target {
    /// Slot order used for state, overlay and wire payloads.
    pub const ALL: [Target; 4] = [Target::Internal, Target::Hiv, Target::Hbv, Target::Hcv];

    /// Layout of the ROI control grid: HBV/HCV on top, Internal/HIV below.
    pub const DISPLAY_ROWS: [[Target; 2]; 2] = [
        [Target::Hbv, Target::Hcv],
        [Target::Internal, Target::Hiv],
    ];

    const PALETTE: [[u8; 3]; 4] = [
        [0x00, 0xa3, 0xff],
        [0xff, 0x6b, 0x6b],
        [0xff, 0xd9, 0x3d],
        [0x7c, 0xff, 0x91],
    ];

    const NAMES: [&'static str; 4] = ["Internal", "HIV", "HBV", "HCV"];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Target for an arbitrary slot index, wrapping around the palette.
    pub fn from_index(index: usize) -> Target {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.index() % Self::NAMES.len()]
    }

    /// Overlay colour as RGB bytes.
    pub fn color(self) -> [u8; 3] {
        Self::PALETTE[self.index() % Self::PALETTE.len()]
    }

    pub fn hex_color(self) -> String {
        let [r, g, b] = self.color();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One-pixel move applied by the arrow buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Up,
    Left,
    Right,
    Down,
}

impl Nudge {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Nudge::Up => (0, -1),
            Nudge::Left => (-1, 0),
            Nudge::Right => (1, 0),
            Nudge::Down => (0, 1),
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Nudge::Up => "↑",
            Nudge::Left => "←",
            Nudge::Right => "→",
            Nudge::Down => "↓",
        }
    }
}

/// Centroid of one ROI in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub cx: i32,
    pub cy: i32,
}

impl Roi {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    pub fn clamped(self) -> Self {
        Self {
            cx: clamp(self.cx, MIN_CENTER, MAX_CX),
            cy: clamp(self.cy, MIN_CENTER, MAX_CY),
        }
    }

    pub fn top_left(self) -> (i32, i32) {
        centroid_to_top_left(self.cx, self.cy)
    }
}

/// The four ROIs in slot order. Every mutation keeps each centroid in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[Roi; 4]", into = "[Roi; 4]")]
pub struct RoiSet([Roi; 4]);

impl RoiSet {
    /// Matches the backend's built-in layout: one ROI near each corner.
    pub const DEFAULT: [Roi; 4] = [
        Roi::new(35, 125),
        Roi::new(125, 125),
        Roi::new(35, 35),
        Roi::new(125, 35),
    ];

    pub fn new(rois: [Roi; 4]) -> Self {
        Self(rois.map(Roi::clamped))
    }

    pub fn get(&self, target: Target) -> Roi {
        self.0[target.index()]
    }

    pub fn as_array(&self) -> &[Roi; 4] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Target, Roi)> + '_ {
        Target::ALL.iter().map(|&t| (t, self.0[t.index()]))
    }

    pub fn nudge(&mut self, target: Target, nudge: Nudge) {
        let (dx, dy) = nudge.delta();
        let roi = &mut self.0[target.index()];
        *roi = Roi::new(roi.cx + dx, roi.cy + dy).clamped();
    }

    pub fn reset(&mut self, defaults: &RoiSet) {
        *self = *defaults;
    }
}

impl Default for RoiSet {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl From<[Roi; 4]> for RoiSet {
    fn from(rois: [Roi; 4]) -> Self {
        Self::new(rois)
    }
}

impl From<RoiSet> for [Roi; 4] {
    fn from(set: RoiSet) -> Self {
        set.0
    }
}

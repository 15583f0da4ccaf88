pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod panel;
pub mod report;
pub mod roi;

pub use client::PanelClient;
pub use config::{ConfigArgs, PanelConfig};
pub use error::{ConfigError, PanelError, Workflow};
pub use panel::{FrameState, Panel};
pub use roi::{Nudge, Roi, RoiSet, Target};

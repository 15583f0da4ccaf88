//! Controller state for the capture/ROI panel, independent of any toolkit.
//!
//! Every workflow is split into a `begin_*` step, which claims the workflow's
//! in-flight slot and returns what the request needs, and a `finish_*` step,
//! which applies the outcome and returns the alert text on failure.

use crate::api::ExtractRequest;
use crate::config::PanelConfig;
use crate::error::{PanelError, Workflow};
use crate::frame::Frame;
use crate::report::{ExtractReport, Polarity, ResultRow};
use crate::roi::{Nudge, RoiSet, Target};

/// Where the panel is in the frame lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    NoFrame,
    Placeholder,
    FrameLoaded,
    ResultsShown,
}

#[derive(Debug)]
pub struct Panel {
    defaults: RoiSet,
    rois: RoiSet,
    polarity: Polarity,
    csv_import: bool,
    frame: Option<Frame>,
    /// Capture or CSV import; both replace the same frame.
    frame_request: Option<Workflow>,
    extract_pending: bool,
    download_pending: bool,
    report: Option<ExtractReport>,
}

impl Panel {
    pub fn new(config: &PanelConfig) -> Self {
        let defaults = config.default_roi_set();
        Self {
            defaults,
            rois: defaults,
            polarity: config.positive_color,
            csv_import: config.csv_import,
            frame: None,
            frame_request: None,
            extract_pending: false,
            download_pending: false,
            report: None,
        }
    }

    pub fn rois(&self) -> &RoiSet {
        &self.rois
    }

    pub fn defaults(&self) -> &RoiSet {
        &self.defaults
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn csv_import_enabled(&self) -> bool {
        self.csv_import
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn report(&self) -> Option<&ExtractReport> {
        self.report.as_ref()
    }

    pub fn result_rows(&self) -> Option<Vec<ResultRow>> {
        self.report.as_ref().map(|report| report.rows(self.polarity))
    }

    pub fn frame_state(&self) -> FrameState {
        match (&self.frame_request, &self.frame, &self.report) {
            (Some(_), _, _) => FrameState::Placeholder,
            (None, None, _) => FrameState::NoFrame,
            (None, Some(_), None) => FrameState::FrameLoaded,
            (None, Some(_), Some(_)) => FrameState::ResultsShown,
        }
    }

    /// The placeholder covers the view while no frame is displayable.
    pub fn showing_placeholder(&self) -> bool {
        self.frame_request.is_some() || self.frame.is_none()
    }

    /// The overlay is withdrawn while a new frame is on its way.
    pub fn overlay_visible(&self) -> bool {
        self.frame_request.is_none()
    }

    pub fn frame_request(&self) -> Option<Workflow> {
        self.frame_request
    }

    pub fn can_capture(&self) -> bool {
        self.frame_request.is_none()
    }

    pub fn can_import_csv(&self) -> bool {
        self.csv_import && self.frame_request.is_none()
    }

    pub fn can_extract(&self) -> bool {
        !self.extract_pending
    }

    pub fn can_download(&self) -> bool {
        self.report.is_some() && !self.download_pending
    }

    pub fn nudge(&mut self, target: Target, nudge: Nudge) {
        self.rois.nudge(target, nudge);
    }

    pub fn reset_rois(&mut self) {
        self.rois.reset(&self.defaults);
    }

    pub fn begin_capture(&mut self) -> bool {
        self.begin_frame(Workflow::Capture)
    }

    pub fn begin_csv_import(&mut self) -> bool {
        self.csv_import && self.begin_frame(Workflow::CsvImport)
    }

    fn begin_frame(&mut self, workflow: Workflow) -> bool {
        if self.frame_request.is_some() {
            return false;
        }
        self.frame_request = Some(workflow);
        true
    }

    /// Applies a capture or CSV import outcome. A new frame invalidates shown results.
    pub fn finish_frame(&mut self, outcome: Result<Frame, PanelError>) -> Option<String> {
        let workflow = self.frame_request.take().unwrap_or(Workflow::Capture);
        match outcome {
            Ok(frame) => {
                log::debug!("{workflow:?} produced a {}x{} frame", frame.width, frame.height);
                if workflow == Workflow::CsvImport {
                    log::info!("CSV frame loaded successfully.");
                }
                self.frame = Some(frame);
                self.report = None;
                None
            }
            Err(err) => Some(Self::failure(workflow, &err)),
        }
    }

    /// Snapshot of the ROIs to send, or `None` while an extraction is outstanding.
    pub fn begin_extract(&mut self) -> Option<ExtractRequest> {
        if self.extract_pending {
            return None;
        }
        self.extract_pending = true;
        Some(ExtractRequest::from(&self.rois))
    }

    pub fn finish_extract(&mut self, outcome: Result<ExtractReport, PanelError>) -> Option<String> {
        self.extract_pending = false;
        match outcome {
            Ok(report) => {
                log::debug!("extraction produced {}", report.csv);
                self.report = Some(report);
                None
            }
            Err(err) => Some(Self::failure(Workflow::Extract, &err)),
        }
    }

    /// Artifact name to fetch, or `None` when there is nothing to download yet.
    pub fn begin_download(&mut self) -> Option<String> {
        if !self.can_download() {
            return None;
        }
        self.download_pending = true;
        self.report.as_ref().map(|report| report.csv.clone())
    }

    /// The operator dismissed the save dialog.
    pub fn cancel_download(&mut self) {
        self.download_pending = false;
    }

    pub fn finish_download<T>(&mut self, outcome: Result<T, PanelError>) -> Option<String> {
        self.download_pending = false;
        outcome
            .err()
            .map(|err| Self::failure(Workflow::Download, &err))
    }

    fn failure(workflow: Workflow, err: &PanelError) -> String {
        let alert = workflow.alert(err);
        log::warn!("{alert}");
        alert
    }
}

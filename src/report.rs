//! Extraction results and how they are presented.

use serde::{Deserialize, Serialize};

pub const NORMALIZATION_NOTE: &str =
    "* ROI values are min–max normalized within each frame before scoring.";
pub const NO_ANALYSIS: &str = "No analysis yet";
pub const DOWNLOAD_LABEL: &str = "Download CSV (normalized ROI values)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Positive,
    Negative,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Positive => "Positive",
            Status::Negative => "Negative",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TargetScore {
    pub status: Status,
    pub score: f64,
}

/// Successful `/api/extract` reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractReport {
    pub csv: String,
    pub ic_ok: bool,
    pub hiv: TargetScore,
    pub hbv: TargetScore,
    pub hcv: TargetScore,
    #[serde(default)]
    pub vmin: Option<i64>,
    #[serde(default)]
    pub vmax: Option<i64>,
}

/// Colour family a status is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Red,
    Green,
}

/// Which colour marks a Positive result. Negative always takes the other one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Red,
    Green,
}

impl Polarity {
    pub fn tone(self, status: Status) -> Tone {
        match (self, status) {
            (Polarity::Red, Status::Positive) | (Polarity::Green, Status::Negative) => Tone::Red,
            (Polarity::Red, Status::Negative) | (Polarity::Green, Status::Positive) => Tone::Green,
        }
    }
}

/// One line of the results panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub label: &'static str,
    pub value: String,
    pub tone: Option<Tone>,
    pub detail: Option<String>,
}

impl std::fmt::Display for ResultRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)?;
        if let Some(detail) = &self.detail {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}

pub fn format_score(score: f64) -> String {
    format!("score={score:.2}")
}

impl ExtractReport {
    pub fn targets(&self) -> [(&'static str, TargetScore); 3] {
        [("HIV", self.hiv), ("HBV", self.hbv), ("HCV", self.hcv)]
    }

    pub fn rows(&self, polarity: Polarity) -> Vec<ResultRow> {
        let mut rows = Vec::with_capacity(4);
        rows.push(ResultRow {
            label: "Internal Control",
            value: if self.ic_ok { "OK" } else { "Fail" }.to_string(),
            tone: None,
            detail: None,
        });
        rows.extend(self.targets().into_iter().map(|(label, target)| ResultRow {
            label,
            value: target.status.to_string(),
            tone: Some(polarity.tone(target.status)),
            detail: Some(format_score(target.score)),
        }));
        rows
    }

    pub fn normalization_range(&self) -> Option<String> {
        match (self.vmin, self.vmax) {
            (Some(min), Some(max)) => Some(format!("normalized range: {min}–{max}")),
            _ => None,
        }
    }

    /// Last path segment of the artifact name, used as the default save name.
    pub fn csv_file_name(&self) -> &str {
        self.csv
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("roi_extract.csv")
    }
}

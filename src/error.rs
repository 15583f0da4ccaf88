use std::path::PathBuf;

/// Failure of one backend round-trip or of the local work around it.
///
/// Payloads are strings so the error can travel inside GUI messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// The backend answered `ok: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("invalid frame image: {0}")]
    Frame(String),

    #[error("{0}")]
    Io(String),

    #[error("CSV import is disabled")]
    Disabled,
}

impl From<reqwest::Error> for PanelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PanelError::Malformed(err.to_string())
        } else {
            PanelError::Transport(err.to_string())
        }
    }
}

/// User-facing operations that can fail; each owns its alert wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Capture,
    CsvImport,
    Extract,
    Download,
}

impl Workflow {
    fn prefixes(self) -> (&'static str, &'static str) {
        match self {
            Workflow::Capture => ("Capture error", "Capture failed"),
            Workflow::CsvImport => ("CSV load error", "CSV upload failed"),
            Workflow::Extract => ("Extract error", "Extract failed"),
            Workflow::Download => ("Download error", "Download failed"),
        }
    }

    /// Alert text: backend rejections read "<X> error", everything else "<X> failed".
    pub fn alert(self, err: &PanelError) -> String {
        let (rejected, failed) = self.prefixes();
        match err {
            PanelError::Rejected(msg) if msg.is_empty() => format!("{rejected}: unknown"),
            PanelError::Rejected(msg) => format!("{rejected}: {msg}"),
            other => format!("{failed}: {other}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid server url {url:?}: {reason}")]
    ServerUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

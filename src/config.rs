//! Panel configuration: an optional JSON file plus command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::report::Polarity;
use crate::roi::{Roi, RoiSet};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5050/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub server_url: String,
    /// Internal, HIV, HBV, HCV.
    pub default_rois: [Roi; 4],
    pub csv_import: bool,
    pub positive_color: Polarity,
    pub request_timeout_secs: Option<u64>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            default_rois: RoiSet::DEFAULT,
            csv_import: true,
            positive_color: Polarity::default(),
            request_timeout_secs: None,
        }
    }
}

impl PanelConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Default ROIs with out-of-bounds centroids pulled back inside the frame.
    pub fn default_roi_set(&self) -> RoiSet {
        let set = RoiSet::new(self.default_rois);
        if set.as_array() != &self.default_rois {
            log::warn!(
                "default ROIs {:?} clamped to {:?}",
                self.default_rois,
                set.as_array()
            );
        }
        set
    }

    /// Backend root, always ending in `/` so endpoint paths join beneath it.
    pub fn server_base(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::ServerUrl {
            url: self.server_url.clone(),
            reason,
        };
        let mut url = Url::parse(self.server_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) url".to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Flags shared by the GUI and the CLI.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://127.0.0.1:5050
    #[arg(short = 's', long = "server")]
    pub server: Option<String>,

    /// Hide and refuse loading frames from CSV files
    #[arg(long = "no-csv-import")]
    pub no_csv_import: bool,

    /// Colour used for Positive results
    #[arg(long = "positive-color", value_enum)]
    pub positive_color: Option<Polarity>,

    /// Per-request timeout in seconds (none by default)
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<PanelConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => PanelConfig::load(path)?,
            None => PanelConfig::default(),
        };
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if self.no_csv_import {
            config.csv_import = false;
        }
        if let Some(polarity) = self.positive_color {
            config.positive_color = polarity;
        }
        if self.timeout_secs.is_some() {
            config.request_timeout_secs = self.timeout_secs;
        }
        config.server_base()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PanelConfig::from_json("{}").expect("config");
        assert_eq!(config, PanelConfig::default());
        assert!(config.csv_import);
        assert_eq!(config.positive_color, Polarity::Red);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = PanelConfig::from_json(
            r#"{
                "default_rois": [{"cx":80,"cy":40},{"cx":40,"cy":120},{"cx":120,"cy":40},{"cx":120,"cy":120}],
                "positive_color": "green",
                "csv_import": false,
                "request_timeout_secs": 5
            }"#,
        )
        .expect("config");
        assert_eq!(config.default_rois[0], Roi::new(80, 40));
        assert_eq!(config.positive_color, Polarity::Green);
        assert!(!config.csv_import);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn wrong_roi_count_is_rejected() {
        let result = PanelConfig::from_json(r#"{"default_rois": [{"cx":80,"cy":40}]}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn out_of_bounds_defaults_are_clamped() {
        let config = PanelConfig {
            default_rois: [
                Roi::new(0, 80),
                Roi::new(80, 80),
                Roi::new(80, 80),
                Roi::new(80, 999),
            ],
            ..PanelConfig::default()
        };
        let set = config.default_roi_set();
        assert_eq!(set.as_array()[0], Roi::new(25, 80));
        assert_eq!(set.as_array()[3], Roi::new(80, 135));
    }

    #[test]
    fn server_base_gains_trailing_slash() {
        let config = PanelConfig {
            server_url: "http://device.local:5050/panel".to_string(),
            ..PanelConfig::default()
        };
        let base = config.server_base().expect("url");
        assert_eq!(base.as_str(), "http://device.local:5050/panel/");
        assert_eq!(
            base.join("api/capture").unwrap().as_str(),
            "http://device.local:5050/panel/api/capture"
        );
    }

    #[test]
    fn bad_server_url_is_rejected() {
        for url in ["not a url", "ftp://host/", "mailto:someone@example.com"] {
            let config = PanelConfig {
                server_url: url.to_string(),
                ..PanelConfig::default()
            };
            assert!(
                matches!(config.server_base(), Err(ConfigError::ServerUrl { .. })),
                "{url} accepted"
            );
        }
    }

    #[test]
    fn flags_override_file_values() {
        let args = ConfigArgs {
            server: Some("http://10.0.0.2:8080".to_string()),
            no_csv_import: true,
            positive_color: Some(Polarity::Green),
            ..ConfigArgs::default()
        };
        let config = args.resolve().expect("resolve");
        assert_eq!(config.server_url, "http://10.0.0.2:8080");
        assert!(!config.csv_import);
        assert_eq!(config.positive_color, Polarity::Green);
    }
}

//! HTTP client for the imaging backend.

use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::api::{
    CAPTURE_PATH, CSV_FIELD, DOWNLOAD_PATH, EXTRACT_PATH, ExtractRequest, FramePayload,
    OPEN_CSV_PATH, open_envelope,
};
use crate::config::PanelConfig;
use crate::error::{ConfigError, PanelError};
use crate::frame::Frame;
use crate::report::ExtractReport;

/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PanelClient {
    http: reqwest::Client,
    base: Url,
    csv_import: bool,
}

impl PanelClient {
    pub fn new(config: &PanelConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base: config.server_base()?,
            csv_import: config.csv_import,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, PanelError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| PanelError::Transport(format!("{path}: {err}")))
    }

    /// Asks the device for a new frame.
    pub async fn capture(&self) -> Result<Frame, PanelError> {
        let url = self.endpoint(CAPTURE_PATH)?;
        log::debug!("POST {url}");
        let body: Value = self.http.post(url).send().await?.json().await?;
        let payload: FramePayload = open_envelope(body)?;
        decode_frame(payload.image_b64).await
    }

    /// Uploads a saved CSV frame and returns the backend's rendering of it.
    pub async fn open_csv(&self, path: PathBuf) -> Result<Frame, PanelError> {
        if !self.csv_import {
            return Err(PanelError::Disabled);
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| PanelError::Io(format!("{}: {err}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame.csv".to_string());

        let url = self.endpoint(OPEN_CSV_PATH)?;
        log::debug!(
            "POST {url} ({file_name}, {})",
            ByteSize::b(bytes.len() as u64)
        );
        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        let form = Form::new().part(CSV_FIELD, part);
        let body: Value = self.http.post(url).multipart(form).send().await?.json().await?;
        let payload: FramePayload = open_envelope(body)?;
        decode_frame(payload.image_b64).await
    }

    pub async fn extract(&self, request: ExtractRequest) -> Result<ExtractReport, PanelError> {
        let url = self.endpoint(EXTRACT_PATH)?;
        log::debug!("POST {url} {:?}", request.rois);
        let body: Value = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        open_envelope(body)
    }

    pub fn download_url(&self, csv: &str) -> Result<Url, PanelError> {
        self.endpoint(&format!("{DOWNLOAD_PATH}{}", csv.trim_start_matches('/')))
    }

    /// Fetches a produced CSV artifact and writes it to `dest`.
    pub async fn download(&self, csv: String, dest: PathBuf) -> Result<PathBuf, PanelError> {
        let url = self.download_url(&csv)?;
        log::debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            let reason = reason.trim();
            return Err(PanelError::Rejected(if reason.is_empty() {
                status.to_string()
            } else {
                reason.to_string()
            }));
        }
        let bytes = response.bytes().await?;
        write_file(&dest, &bytes).await?;
        log::info!("saved {} ({})", dest.display(), ByteSize::b(bytes.len() as u64));
        Ok(dest)
    }
}

async fn write_file(dest: &Path, bytes: &[u8]) -> Result<(), PanelError> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| PanelError::Io(format!("{}: {err}", parent.display())))?;
    }
    tokio::fs::write(dest, bytes)
        .await
        .map_err(|err| PanelError::Io(format!("{}: {err}", dest.display())))
}

async fn decode_frame(image_b64: String) -> Result<Frame, PanelError> {
    tokio::task::spawn_blocking(move || Frame::from_base64(&image_b64))
        .await
        .map_err(|err| PanelError::Frame(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PanelClient {
        let config = PanelConfig {
            server_url: "http://127.0.0.1:5050".to_string(),
            ..PanelConfig::default()
        };
        PanelClient::new(&config).expect("client")
    }

    #[test]
    fn download_url_keeps_nested_path() {
        let url = client()
            .download_url("roi_extract/03-14-2025/10-20-30_ROI.csv")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5050/download/roi_extract/03-14-2025/10-20-30_ROI.csv"
        );
    }

    #[test]
    fn endpoints_join_under_base() {
        let client = client();
        assert_eq!(
            client.endpoint(EXTRACT_PATH).unwrap().as_str(),
            "http://127.0.0.1:5050/api/extract"
        );
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:5050/");
    }

    #[tokio::test]
    async fn disabled_import_is_refused_locally() {
        let config = PanelConfig {
            csv_import: false,
            ..PanelConfig::default()
        };
        let client = PanelClient::new(&config).expect("client");
        let result = client.open_csv(PathBuf::from("frame.csv")).await;
        assert_eq!(result.unwrap_err(), PanelError::Disabled);
    }
}

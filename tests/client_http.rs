use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;

use base64::Engine as _;
use image::{Rgba, RgbaImage};
use roi_panel::api::ExtractRequest;
use roi_panel::report::Polarity;
use roi_panel::{PanelClient, PanelConfig, PanelError, Roi, RoiSet, Workflow};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Accepts one connection, answers with `body`, and hands back the raw request.
async fn serve_once(content_type: &'static str, body: String) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        let _ = socket.shutdown().await;
        request
    });
    (addr, handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        if head.contains("transfer-encoding: chunked") {
            if buf.ends_with(b"0\r\n\r\n") {
                break;
            }
            continue;
        }
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn client_for(addr: SocketAddr) -> PanelClient {
    let config = PanelConfig {
        server_url: format!("http://{addr}"),
        ..PanelConfig::default()
    };
    PanelClient::new(&config).expect("client")
}

fn frame_b64() -> String {
    let img = RgbaImage::from_pixel(480, 480, Rgba([90, 90, 90, 255]));
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode");
    base64::engine::general_purpose::STANDARD.encode(png)
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("roi_panel_{}_{name}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

#[tokio::test]
async fn capture_decodes_returned_frame() {
    let body = serde_json::json!({"ok": true, "image_b64": frame_b64()}).to_string();
    let (addr, server) = serve_once("application/json", body).await;

    let frame = client_for(addr).capture().await.expect("capture");
    assert_eq!((frame.width, frame.height), (480, 480));

    let request = server.await.expect("server");
    assert!(request.starts_with("POST /api/capture "), "{request}");
}

#[tokio::test]
async fn capture_rejection_becomes_alert() {
    let body = r#"{"ok": false, "error": "camera busy"}"#.to_string();
    let (addr, _server) = serve_once("application/json", body).await;

    let err = client_for(addr).capture().await.unwrap_err();
    assert_eq!(err, PanelError::Rejected("camera busy".into()));
    assert!(Workflow::Capture.alert(&err).contains("camera busy"));
}

#[tokio::test]
async fn extract_posts_rois_and_parses_report() {
    let body = serde_json::json!({
        "ok": true,
        "csv": "roi_extract/03-14-2025/10-20-30_ROI.csv",
        "ic_ok": true,
        "hiv": {"status": "Positive", "score": 0.91},
        "hbv": {"status": "Negative", "score": 3.5},
        "hcv": {"status": "Negative", "score": 1.25},
        "vmin": 4,
        "vmax": 251
    })
    .to_string();
    let (addr, server) = serve_once("application/json", body).await;

    let rois = RoiSet::new([
        Roi::new(80, 40),
        Roi::new(40, 120),
        Roi::new(120, 39),
        Roi::new(120, 120),
    ]);
    let report = client_for(addr)
        .extract(ExtractRequest::from(&rois))
        .await
        .expect("extract");

    let rows = report.rows(Polarity::Red);
    assert_eq!(rows[0].to_string(), "Internal Control: OK");
    assert_eq!(rows[1].to_string(), "HIV: Positive score=0.91");
    assert_eq!(report.vmax, Some(251));

    let request = server.await.expect("server");
    assert!(request.starts_with("POST /api/extract "));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(request.contains(
        r#"{"rois":[{"cx":80,"cy":40},{"cx":40,"cy":120},{"cx":120,"cy":39},{"cx":120,"cy":120}]}"#
    ));
}

#[tokio::test]
async fn non_json_reply_is_a_failure_not_a_rejection() {
    let (addr, _server) = serve_once("text/html", "<h1>oops</h1>".to_string()).await;

    let err = client_for(addr)
        .extract(ExtractRequest::from(&RoiSet::default()))
        .await
        .unwrap_err();
    assert!(!matches!(err, PanelError::Rejected(_)));
    assert!(Workflow::Extract.alert(&err).starts_with("Extract failed: "));
}

#[tokio::test]
async fn open_csv_uploads_file_field() {
    let dir = scratch("upload");
    let path = dir.join("frame.csv");
    std::fs::write(&path, "1,2,3\n4,5,6\n").expect("write csv");

    let body = serde_json::json!({"ok": true, "image_b64": frame_b64()}).to_string();
    let (addr, server) = serve_once("application/json", body).await;

    let frame = client_for(addr).open_csv(path).await.expect("open csv");
    assert_eq!(frame.width, 480);

    let request = server.await.expect("server");
    assert!(request.starts_with("POST /api/open_csv "));
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"frame.csv\""));
    assert!(request.contains("1,2,3\n4,5,6\n"));
}

#[tokio::test]
async fn missing_csv_file_fails_before_request() {
    let config = PanelConfig {
        server_url: "http://127.0.0.1:9".to_string(),
        ..PanelConfig::default()
    };
    let client = PanelClient::new(&config).expect("client");
    let err = client
        .open_csv(scratch("missing").join("nope.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, PanelError::Io(_)));
    assert!(Workflow::CsvImport.alert(&err).starts_with("CSV upload failed: "));
}

#[tokio::test]
async fn download_saves_artifact() {
    let (addr, server) = serve_once("text/csv", "12,34,56\n".to_string()).await;
    let dest = scratch("download").join("nested").join("result.csv");

    let saved = client_for(addr)
        .download("roi_extract/03-14-2025/10-20-30_ROI.csv".to_string(), dest.clone())
        .await
        .expect("download");
    assert_eq!(saved, dest);
    assert_eq!(std::fs::read_to_string(&dest).expect("read"), "12,34,56\n");

    let request = server.await.expect("server");
    assert!(request.starts_with("GET /download/roi_extract/03-14-2025/10-20-30_ROI.csv "));
}

use clap::{Parser, Subcommand};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use roi_panel::api::ExtractRequest;
use roi_panel::frame::{Frame, annotate};
use roi_panel::overlay::render_svg;
use roi_panel::report::NORMALIZATION_NOTE;
use roi_panel::{ConfigArgs, PanelClient, PanelConfig, Roi, RoiSet, Workflow};

#[derive(Parser, Debug)]
#[command(
    name = "roi_panel_cli",
    about = "Headless capture, CSV import and ROI extraction against the imaging backend",
    version
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a new frame from the device
    Capture {
        /// Write the returned PNG here
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,

        /// Write the frame with ROI boxes drawn on it here
        #[arg(short = 'a', long = "annotated")]
        annotated: Option<PathBuf>,

        /// ROIs as JSON, e.g. '[{"cx":35,"cy":125},...]' (defaults from config)
        #[arg(long = "rois", value_parser = parse_rois)]
        rois: Option<RoiSet>,
    },
    /// Load a saved frame from a CSV file
    OpenCsv {
        file: PathBuf,

        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,

        #[arg(short = 'a', long = "annotated")]
        annotated: Option<PathBuf>,

        #[arg(long = "rois", value_parser = parse_rois)]
        rois: Option<RoiSet>,
    },
    /// Score the ROIs of the backend's current frame
    Extract {
        #[arg(long = "rois", value_parser = parse_rois)]
        rois: Option<RoiSet>,

        /// Directory to save the produced CSV into
        #[arg(short = 'd', long = "download")]
        download: Option<PathBuf>,
    },
    /// Export the ROI overlay as SVG
    Overlay {
        #[arg(long = "svg")]
        svg: PathBuf,

        #[arg(long = "rois", value_parser = parse_rois)]
        rois: Option<RoiSet>,
    },
}

fn parse_rois(value: &str) -> Result<RoiSet, String> {
    let rois: [Roi; 4] = serde_json::from_str(value).map_err(|e| e.to_string())?;
    Ok(RoiSet::new(rois))
}

fn write_bytes(path: &Path, contents: &[u8]) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn save_frame(
    frame: &Frame,
    rois: &RoiSet,
    out: Option<&Path>,
    annotated: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    println!("frame {}x{}", frame.width, frame.height);
    if let Some(path) = out {
        write_bytes(path, &frame.png)?;
        log::info!("saved {}", path.display());
    }
    if let Some(path) = annotated {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        annotate(frame, rois)?.save(path)?;
        log::info!("saved {}", path.display());
    }
    Ok(())
}

fn resolve_rois(config: &PanelConfig, rois: Option<RoiSet>) -> RoiSet {
    rois.unwrap_or_else(|| config.default_roi_set())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;
    let client = PanelClient::new(&config)?;

    match cli.command {
        Command::Capture {
            out,
            annotated,
            rois,
        } => {
            let frame = client
                .capture()
                .await
                .map_err(|err| Workflow::Capture.alert(&err))?;
            let rois = resolve_rois(&config, rois);
            save_frame(&frame, &rois, out.as_deref(), annotated.as_deref())?;
        }
        Command::OpenCsv {
            file,
            out,
            annotated,
            rois,
        } => {
            let frame = client
                .open_csv(file)
                .await
                .map_err(|err| Workflow::CsvImport.alert(&err))?;
            log::info!("CSV frame loaded successfully.");
            let rois = resolve_rois(&config, rois);
            save_frame(&frame, &rois, out.as_deref(), annotated.as_deref())?;
        }
        Command::Extract { rois, download } => {
            let rois = resolve_rois(&config, rois);
            let report = client
                .extract(ExtractRequest::from(&rois))
                .await
                .map_err(|err| Workflow::Extract.alert(&err))?;

            println!("csv: {}", report.csv);
            for row in report.rows(config.positive_color) {
                println!("{row}");
            }
            if let Some(range) = report.normalization_range() {
                println!("{range}");
            }
            println!("{NORMALIZATION_NOTE}");

            if let Some(dir) = download {
                let dest = dir.join(report.csv_file_name());
                client
                    .download(report.csv.clone(), dest)
                    .await
                    .map_err(|err| Workflow::Download.alert(&err))?;
            }
        }
        Command::Overlay { svg, rois } => {
            let rois = resolve_rois(&config, rois);
            write_bytes(&svg, render_svg(&rois).as_bytes())?;
            log::info!("saved {}", svg.display());
        }
    }

    Ok(())
}

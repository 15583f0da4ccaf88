use clap::Parser;

use roi_panel::{ConfigArgs, PanelClient};

#[derive(Parser, Debug)]
#[command(
    name = "roi_panel",
    about = "Capture frames, position assay ROIs and score them against the imaging backend",
    version
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;
    let client = PanelClient::new(&config)?;

    log::info!("ROI Panel - connecting to {}", client.base_url());
    roi_panel::app::run(config, client)?;
    Ok(())
}

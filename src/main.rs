use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use medgraph::config::{ConfigPatch, load_patch};
use medgraph::graph::NodeIdScheme;
use medgraph::{ExplorerApp, LoadRequest};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON entity file; the built-in depression data set when omitted.
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON file with a partial graph configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,

    #[arg(long, value_enum, default_value_t = NodeIdScheme::Name)]
    id_scheme: NodeIdScheme,
}

impl Args {
    fn config_patch(&self) -> Result<ConfigPatch> {
        let from_file = match &self.config {
            Some(path) => load_patch(path)?,
            None => ConfigPatch::default(),
        };
        let from_flags = ConfigPatch {
            canvas_width: self.width,
            canvas_height: self.height,
            ..ConfigPatch::default()
        };
        Ok(from_file.merge(from_flags))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let startup_config = args
        .config_patch()
        .context("failed to prepare startup configuration")?;
    let request = LoadRequest {
        data: args.data.clone(),
        id_scheme: args.id_scheme,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "medgraph",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, request, startup_config)))),
    )
    .map_err(|error| anyhow!("failed to run the explorer window: {error}"))
}

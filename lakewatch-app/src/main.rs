use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lakewatch_schemas::api::TimeseriesMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod plotting;
mod surface;
mod workflow;

#[derive(Parser, Debug)]
#[command(name = "lakewatch", version, about = "Microplastic sample dashboard for Laguna de Bay")]
struct Cli {
    /// Dashboard YAML file. Defaults to config/dashboard.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data server base URL, overriding the config file.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch samples for a date range and draw them as map markers.
    Map {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "map.svg")]
        out: PathBuf,
        /// Also write every rendered marker to this CSV file.
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long)]
        terrain: bool,
    },
    /// Draw the average density time series.
    Chart {
        #[arg(long, default_value = "daily")]
        mode: TimeseriesMode,
        #[arg(long, default_value = "chart.png")]
        out: PathBuf,
        /// Print the detailed-data link for the point at this index.
        #[arg(long)]
        drill: Option<usize>,
    },
    /// Print the sidebar values for a date range.
    Stats {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Open the popup of the marker nearest to a point.
    Inspect {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Also open and close the full-size image preview.
        #[arg(long)]
        preview: bool,
        /// Print the popup as HTML instead of plain text.
        #[arg(long)]
        html: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lakewatch=info,lakewatch_core=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    println!("--- Lakewatch ---");

    let settings = config::resolve_settings(cli.config.as_deref(), cli.server.as_deref())?;

    match cli.command {
        Command::Map {
            from,
            to,
            out,
            log,
            terrain,
        } => workflow::run_map(&settings, from, to, &out, log.as_deref(), terrain),
        Command::Chart { mode, out, drill } => workflow::run_chart(&settings, mode, &out, drill),
        Command::Stats { from, to, json } => workflow::run_stats(&settings, from, to, json),
        Command::Inspect {
            from,
            to,
            lat,
            lon,
            preview,
            html,
        } => workflow::run_inspect(&settings, from, to, (lat, lon), preview, html),
    }
}

//! CLI entry point for the vaccination-by-political-lean animation.
//!
//! With no arguments, reads the two default CSVs from the working directory
//! and writes `T3.gif`. Subcommands expose the rendered animation and the
//! intermediate pivot table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vax_lean::output::{TableFormat, print_summary, write_table};
use vax_lean::pipeline;
use vax_lean::render::{self, RenderConfig, render_animation};

#[derive(Parser)]
#[command(name = "vax_lean")]
#[command(about = "Animate county vaccination rates by 2020 two-party vote share", long_about = None)]
struct Cli {
    /// County-level 2020 presidential results CSV
    #[arg(long, global = true, default_value = "2020_US_County_Level_Presidential_Results.csv")]
    election: PathBuf,

    /// County-level vaccination CSV
    #[arg(
        long,
        global = true,
        default_value = "COVID-19_Vaccinations_in_the_United_States_County_Reduced.csv"
    )]
    vaccinations: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the smoothed rates as an animated GIF (default)
    Render {
        /// GIF file to write
        #[arg(short, long, default_value = render::DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Delay between frames in milliseconds
        #[arg(long, default_value_t = 50)]
        frame_delay_ms: u32,

        /// Do not open the animation after writing it
        #[arg(long, default_value_t = false)]
        no_show: bool,
    },
    /// Write the pivoted date × bin rate table
    Table {
        /// File to write
        #[arg(short, long, default_value = "pivot.csv")]
        output: PathBuf,

        /// Write the smoothed table instead of the raw rates
        #[arg(long, default_value_t = false)]
        smoothed: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = TableFormat::Csv)]
        format: TableFormat,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/vax_lean.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("vax_lean.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Render {
        output: PathBuf::from(render::DEFAULT_OUTPUT),
        frame_delay_ms: RenderConfig::default().frame_delay_ms,
        no_show: false,
    });

    let tables = pipeline::run(&cli.election, &cli.vaccinations)?;
    print_summary("raw", &tables.raw);
    print_summary("smoothed", &tables.smoothed);

    match command {
        Commands::Render {
            output,
            frame_delay_ms,
            no_show,
        } => {
            let config = RenderConfig {
                frame_delay_ms,
                ..RenderConfig::default()
            };
            let frames = render_animation(&tables.smoothed, &config, &output)?;
            info!(output = %output.display(), frames, "Saved animation");

            if !no_show {
                render::show(&output);
            }
        }
        Commands::Table {
            output,
            smoothed,
            format,
        } => {
            let table = if smoothed {
                &tables.smoothed
            } else {
                &tables.raw
            };
            write_table(&output, table, format)?;
            info!(output = %output.display(), rows = table.len(), "Saved table");
        }
    }

    Ok(())
}

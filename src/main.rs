use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use xyscatter::data::rows_from_csv;
use xyscatter::render::render_scene;
use xyscatter::{render_chart, ChartLayout, Container, OutputFormat, Settings, PLUGIN};

#[derive(Parser, Debug)]
#[command(name = "xyscatter")]
#[command(about = "Render an X/Y scatter chart from plugin settings and CSV rows", long_about = None)]
struct Args {
    /// Settings JSON (realValues, mainValues, data, colorStyles, ...)
    #[arg(short, long, required_unless_present = "plugin_info")]
    settings: Option<PathBuf>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    #[arg(short, long, value_enum, default_value_t = ChartLayout::Single)]
    layout: ChartLayout,

    /// Pointer position "x,y" in pixels, shows the tooltip of the nearest point
    #[arg(long, value_parser = parse_pointer)]
    pointer: Option<(f64, f64)>,

    /// Print the plugin metadata as JSON and exit
    #[arg(long)]
    plugin_info: bool,
}

fn parse_pointer(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{}'", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.plugin_info {
        serde_json::to_writer_pretty(&mut handle, &PLUGIN).context("Failed to write plugin info")?;
        writeln!(handle).context("Failed to write plugin info")?;
        return Ok(());
    }

    let settings_path = args.settings.context("--settings is required")?;
    let file = File::open(&settings_path)
        .with_context(|| format!("Failed to open settings file {}", settings_path.display()))?;
    let mut settings = Settings::from_reader(file)?;

    // Read CSV rows from stdin when piped; they replace the settings' data
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        let rows = rows_from_csv(stdin.lock(), &settings.main_values)
            .context("Failed to read CSV from stdin")?;
        if !rows.is_empty() {
            log::debug!("Read {} rows from stdin", rows.len());
            settings.data = rows;
        }
    }

    let mut container = Container::new(args.width, args.height);
    if let Some((x, y)) = args.pointer {
        container = container.with_pointer(x, y);
    }

    let rendered = render_chart(&container, &settings, args.layout)
        .context("Failed to render chart")?;
    let bytes = render_scene(&rendered.scene, args.format)
        .context("Failed to render chart")?;

    handle.write_all(&bytes).context("Failed to write image to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

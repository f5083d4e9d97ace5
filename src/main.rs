use anyhow::Context;
use clap::Parser;
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thermal_forecast::core::diagnostics::process_diagnostics;
use thermal_forecast::output::FileOutput;
use thermal_forecast::read_weather_file::forecast_from_csv;
use thermal_forecast::{run_monthly_project, run_project};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct ForecastArgs {
    /// Path to the JSON input document
    input_file: String,
    #[arg(long, help = "Path to an hourly forecast CSV used instead of the input's forecast")]
    forecast_csv: Option<String>,
    #[arg(
        long,
        short,
        help = "Directory for results (defaults to <input stem>__results)"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long,
        short,
        default_value_t = false,
        help = "Project a month's bill from the input's monthly section instead"
    )]
    monthly: bool,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = ForecastArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting tracing subscriber failed")?;

    let input_file = args.input_file.as_str();
    let input_file_ext = Path::new(input_file).extension().and_then(OsStr::to_str);
    let input_file_stem = match input_file_ext {
        Some(ext) => &input_file[..(input_file.len() - ext.len() - 1)],
        None => input_file,
    };
    let input_file_name = Path::new(input_file_stem)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("forecast");

    let output_path = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(format!("{input_file_stem}__results")));
    fs::create_dir_all(&output_path)?;
    let file_output = FileOutput::new(output_path, format!("{input_file_name}__{{}}.csv"));

    if args.monthly {
        let summary = run_monthly_project(
            BufReader::new(File::open(Path::new(input_file))?),
            &file_output,
            process_diagnostics(),
        )?;
        println!(
            "month: ${:.2} total (${:.2} heating/cooling, ${:.2} baseload, ${:.2} fixed), ${:.2}/week",
            summary.total_cost,
            summary.hvac_cost,
            summary.baseload_cost,
            summary.fixed_cost,
            summary.weekly_equivalent_cost
        );
        info!(
            total_energy_kwh = summary.total_energy_kwh,
            total_cost = summary.total_cost,
            "monthly projection complete"
        );
        return Ok(());
    }

    let forecast = args
        .forecast_csv
        .map(|path| -> anyhow::Result<_> {
            forecast_from_csv(BufReader::new(
                File::open(&path).with_context(|| format!("Could not open forecast {path}"))?,
            ))
        })
        .transpose()?;

    let summary = run_project(
        BufReader::new(File::open(Path::new(input_file))?),
        &file_output,
        forecast,
        process_diagnostics(),
    )?;

    for day in &summary.days {
        println!(
            "{}: {:.1} kWh heat pump, {:.1} kWh aux, ${:.2} (${:.2} with aux)",
            day.date, day.hp_kwh, day.aux_kwh, day.cost, day.cost_with_aux
        );
    }
    info!(
        total_energy_kwh = summary.total_energy_kwh(),
        total_cost_with_aux = summary.total_cost_with_aux,
        "forecast complete"
    );

    Ok(())
}

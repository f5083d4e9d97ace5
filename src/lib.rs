pub mod core;
pub mod errors;
pub mod external_conditions;
pub mod forecast;
pub mod input;
pub mod output;
pub mod read_weather_file;

#[macro_use]
extern crate is_close;

use crate::core::cooling_systems::air_conditioning::AirConditioning;
use crate::core::diagnostics::DiagnosticSink;
use crate::core::energy_supply::tariff_data::RateSchedule;
use crate::core::heating_systems::heat_pump::{HeatPump, HourlyPerformance};
use crate::core::space_heat_demand::heat_loss::DesignHeatLoss;
use crate::core::SpaceConditioningSystem;
use crate::errors::{ForecastCalculationError, OutputError, ThermalForecastError};
use crate::external_conditions::{adjust_for_elevation, WeatherHour};
use crate::forecast::monthly::{MonthlyForecaster, MonthlySummary};
use crate::forecast::weekly::{HourResult, WeeklyAggregator, WeeklySummary};
use crate::input::{ingest_for_processing, HvacMode, Input};
use crate::output::Output;
use anyhow::anyhow;
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

/// Run a forecast from a JSON input document, writing `hourly` and `daily` CSV results to
/// `output` and returning the per-day and whole-forecast totals.
///
/// Arguments:
/// * `input` - JSON input document
/// * `output` - destination of the CSV results
/// * `forecast_override` - hourly forecast to use instead of the one in the input document
/// * `diagnostics` - sink told about any input that had to be replaced during calculation
pub fn run_project(
    input: impl Read,
    output: impl Output,
    forecast_override: Option<Vec<WeatherHour>>,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Result<WeeklySummary, ThermalForecastError> {
    let input = ingest_for_processing(input)?;
    let forecast = forecast_for_input(&input, forecast_override, diagnostics.as_ref())?;

    let design_heat_loss =
        DesignHeatLoss::resolve(input.heat_loss, &input.building, diagnostics.as_ref());
    info!(
        design_heat_loss_btu_hr = design_heat_loss.btu_per_hour(),
        "resolved design heat loss ({design_heat_loss:?})"
    );

    let system = space_conditioning_system(&input, design_heat_loss, diagnostics);

    let rates = RateSchedule::from_input(&input.tariff)?;
    let aggregator = WeeklyAggregator::new(
        system,
        rates,
        input.indoor_setpoint,
        design_heat_loss.btu_per_hour(),
    );
    let forecast = aggregator.run(&forecast);

    check_totals_are_finite(&forecast.summary)?;

    if !output.is_noop() {
        write_hourly_output_file(&output, &forecast.hours)
            .and_then(|_| write_daily_output_file(&output, &forecast.summary))
            .map_err(|err| ThermalForecastError::FailureInOutput(OutputError::new(err)))?;
    }

    Ok(forecast.summary)
}

/// Project a month's bill from the daily weather in the input's `monthly` section, writing a
/// one-row `monthly` CSV to `output`.
///
/// Arguments:
/// * `input` - JSON input document with a `monthly` section
/// * `output` - destination of the CSV result
/// * `diagnostics` - sink told about any input that had to be replaced during calculation
pub fn run_monthly_project(
    input: impl Read,
    output: impl Output,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Result<MonthlySummary, ThermalForecastError> {
    let input = ingest_for_processing(input)?;
    let monthly = input
        .monthly
        .as_ref()
        .ok_or_else(|| anyhow!("Input has no monthly section"))?;
    if monthly.days.is_empty() {
        return Err(anyhow!("No days of weather were provided for the month").into());
    }

    let design_heat_loss =
        DesignHeatLoss::resolve(input.heat_loss, &input.building, diagnostics.as_ref());
    info!(
        design_heat_loss_btu_hr = design_heat_loss.btu_per_hour(),
        days = monthly.days.len(),
        "projecting month ({design_heat_loss:?})"
    );

    let system = space_conditioning_system(&input, design_heat_loss, diagnostics.clone());
    let summary = MonthlyForecaster::new(system, monthly.settings.clone(), diagnostics)
        .forecast(&monthly.days, design_heat_loss.btu_per_hour())?;

    if !summary.total_cost.is_finite() || !summary.total_energy_kwh.is_finite() {
        return Err(ForecastCalculationError::new(anyhow!(
            "Monthly totals were not finite: {summary:?}"
        ))
        .into());
    }

    if !output.is_noop() {
        write_monthly_output_file(&output, &summary)
            .map_err(|err| ThermalForecastError::FailureInOutput(OutputError::new(err)))?;
    }

    Ok(summary)
}

fn space_conditioning_system(
    input: &Input,
    design_heat_loss: DesignHeatLoss,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Arc<dyn SpaceConditioningSystem> {
    match input.mode {
        HvacMode::Heating => {
            let heat_pump = HeatPump::new(&input.system, diagnostics);
            debug!(
                compressor_power_kw = input.system.compressor_power_kw(),
                "rated heat pump compressor power"
            );
            match heat_pump.balance_point(design_heat_loss.btu_per_hour(), input.indoor_setpoint) {
                Some(balance_point) => info!(balance_point, "heat pump balance point (°F)"),
                None => debug!("heat pump covers the load at every temperature above its cutoff"),
            }
            Arc::new(heat_pump)
        }
        HvacMode::Cooling => Arc::new(AirConditioning::new(
            &input.system,
            input.solar_exposure,
            diagnostics,
        )),
    }
}

fn forecast_for_input(
    input: &Input,
    forecast_override: Option<Vec<WeatherHour>>,
    diagnostics: &dyn DiagnosticSink,
) -> anyhow::Result<Vec<WeatherHour>> {
    let forecast = forecast_override.unwrap_or_else(|| input.forecast.clone());
    if forecast.is_empty() {
        return Err(anyhow!("No forecast hours were provided"));
    }

    Ok(match input.elevation {
        Some(elevation) => adjust_for_elevation(
            &forecast,
            elevation.home_ft,
            elevation.station_ft,
            diagnostics,
        ),
        None => forecast,
    })
}

fn check_totals_are_finite(summary: &WeeklySummary) -> Result<(), ForecastCalculationError> {
    let totals = [
        summary.total_hp_kwh,
        summary.total_aux_kwh,
        summary.total_cost,
        summary.total_cost_with_aux,
    ];
    if totals.iter().all(|total| total.is_finite()) {
        Ok(())
    } else {
        Err(ForecastCalculationError::new(anyhow!(
            "Forecast totals were not finite: {totals:?}"
        )))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HourlyRow {
    time: NaiveDateTime,
    outdoor_temp: f64,
    humidity: Option<f64>,
    hp_kwh: f64,
    aux_kwh: f64,
    aux_kw: f64,
    electrical_kw: f64,
    building_load_btu_hr: f64,
    delivered_hp_btu_hr: f64,
    deficit_btu_hr: f64,
    available_capacity_btu_hr: f64,
    capacity_utilization: f64,
    runtime: f64,
    defrost_penalty_multiplier: f64,
    effective_cop: f64,
    actual_indoor_temp: f64,
    dt_hours: f64,
    hp_cost: f64,
    aux_cost: f64,
}

impl From<&HourResult> for HourlyRow {
    fn from(hour: &HourResult) -> Self {
        let HourlyPerformance {
            hp_kwh,
            aux_kwh,
            aux_kw,
            building_load_btu_hr,
            delivered_hp_btu_hr,
            deficit_btu_hr,
            available_capacity_btu_hr,
            capacity_utilization,
            defrost_penalty_multiplier,
            effective_cop,
            actual_indoor_temp,
            dt_hours,
        } = hour.performance;

        Self {
            time: hour.time,
            outdoor_temp: hour.outdoor_temp,
            humidity: hour.humidity,
            hp_kwh,
            aux_kwh,
            aux_kw,
            electrical_kw: hour.performance.electrical_kw(),
            building_load_btu_hr,
            delivered_hp_btu_hr,
            deficit_btu_hr,
            available_capacity_btu_hr,
            capacity_utilization,
            runtime: hour.performance.runtime(),
            defrost_penalty_multiplier,
            effective_cop,
            actual_indoor_temp,
            dt_hours,
            hp_cost: hour.hp_cost,
            aux_cost: hour.aux_cost,
        }
    }
}

fn write_hourly_output_file(output: &impl Output, hours: &[HourResult]) -> anyhow::Result<()> {
    let output_key = "hourly";
    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    for hour in hours {
        writer.serialize(HourlyRow::from(hour))?;
    }

    writer.flush()?;

    Ok(())
}

fn write_daily_output_file(output: &impl Output, summary: &WeeklySummary) -> anyhow::Result<()> {
    let output_key = "daily";
    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key)?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    for day in &summary.days {
        writer.serialize(day)?;
    }

    let hours = summary.days.iter().map(|day| day.hours).sum::<usize>();
    writer.write_record([
        "total".to_string(),
        hours.to_string(),
        String::new(),
        String::new(),
        String::new(),
        summary.total_hp_kwh.to_string(),
        summary.total_aux_kwh.to_string(),
        summary.total_hp_cost.to_string(),
        summary.total_aux_cost.to_string(),
        summary.total_cost.to_string(),
        summary.total_cost_with_aux.to_string(),
    ])?;

    writer.flush()?;

    Ok(())
}

fn write_monthly_output_file(output: &impl Output, summary: &MonthlySummary) -> anyhow::Result<()> {
    let output_key = "monthly";
    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests;

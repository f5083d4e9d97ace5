use crate::core::diagnostics::{DiagnosticSink, InputField};
use crate::core::energy_supply::tariff_data::RateSchedule;
use crate::core::units::HOURS_PER_DAY;
use crate::core::validation::finite_or;
use crate::core::SpaceConditioningSystem;
use crate::external_conditions::DailyWeather;
use crate::forecast::weekly::WeeklyAggregator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// This module projects a month's heating bill from daily high/low weather, adding the
/// household's non-HVAC baseload and fixed charges.

const DAY_HOURS: f64 = 16.;
const MIN_BASELOAD_KWH_PER_DAY: f64 = 5.;
const MAX_BASELOAD_KWH_PER_DAY: f64 = 25.;
/// Average number of weeks in a month
const WEEKS_PER_MONTH: f64 = 4.33;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonthlySettings {
    #[serde(default = "default_day_setpoint")]
    pub day_setpoint: f64,
    #[serde(default = "default_night_setpoint")]
    pub night_setpoint: f64,
    #[serde(default = "default_flat_rate")]
    pub flat_rate: f64,
    /// Fixed monthly electricity charge, in $
    #[serde(default)]
    pub fixed_cost: f64,
    /// Household electricity use other than heating and cooling
    #[serde(default = "default_baseload_kwh_per_day")]
    pub baseload_kwh_per_day: f64,
}

fn default_day_setpoint() -> f64 {
    70.
}

fn default_night_setpoint() -> f64 {
    68.
}

fn default_flat_rate() -> f64 {
    0.10
}

fn default_baseload_kwh_per_day() -> f64 {
    10.
}

impl Default for MonthlySettings {
    fn default() -> Self {
        Self {
            day_setpoint: default_day_setpoint(),
            night_setpoint: default_night_setpoint(),
            flat_rate: default_flat_rate(),
            fixed_cost: 0.,
            baseload_kwh_per_day: default_baseload_kwh_per_day(),
        }
    }
}

impl MonthlySettings {
    /// Setpoint held on average over a day of 16 daytime and 8 night-time hours.
    pub fn weighted_setpoint(&self) -> f64 {
        let hours_per_day = HOURS_PER_DAY as f64;
        self.day_setpoint * DAY_HOURS / hours_per_day
            + self.night_setpoint * (hours_per_day - DAY_HOURS) / hours_per_day
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub hvac_cost: f64,
    pub baseload_cost: f64,
    pub fixed_cost: f64,
    pub total_cost: f64,
    pub total_energy_kwh: f64,
    pub hp_energy_kwh: f64,
    pub aux_energy_kwh: f64,
    pub weekly_equivalent_cost: f64,
}

#[derive(Debug)]
pub struct MonthlyForecaster {
    system: Arc<dyn SpaceConditioningSystem>,
    settings: MonthlySettings,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl MonthlyForecaster {
    pub fn new(
        system: Arc<dyn SpaceConditioningSystem>,
        settings: MonthlySettings,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            system,
            settings,
            diagnostics,
        }
    }

    /// Cost of the month described by `days`, one entry per day.
    pub fn forecast(
        &self,
        days: &[DailyWeather],
        design_heat_loss: f64,
    ) -> anyhow::Result<MonthlySummary> {
        let rates = RateSchedule::flat(self.settings.flat_rate)?;
        let flat_rate = rates.flat_rate();
        let aggregator = WeeklyAggregator::new(
            self.system.clone(),
            rates,
            self.settings.weighted_setpoint(),
            design_heat_loss,
        );

        let hours = days.iter().flat_map(DailyWeather::hourly).collect::<Vec<_>>();
        let summary = aggregator.run(&hours).summary;

        let baseload_kwh_per_day = finite_or(
            InputField::BaseloadKwhPerDay,
            self.settings.baseload_kwh_per_day,
            default_baseload_kwh_per_day(),
            self.diagnostics.as_ref(),
        )
        .clamp(MIN_BASELOAD_KWH_PER_DAY, MAX_BASELOAD_KWH_PER_DAY);
        let fixed_cost = finite_or(
            InputField::FixedCost,
            self.settings.fixed_cost,
            0.,
            self.diagnostics.as_ref(),
        );

        let total_energy_kwh = summary.total_energy_kwh();
        let hvac_cost = total_energy_kwh * flat_rate;
        let baseload_cost = baseload_kwh_per_day * days.len() as f64 * flat_rate;
        let total_cost = hvac_cost + baseload_cost + fixed_cost;

        Ok(MonthlySummary {
            hvac_cost,
            baseload_cost,
            fixed_cost,
            total_cost,
            total_energy_kwh,
            hp_energy_kwh: summary.total_hp_kwh,
            aux_energy_kwh: summary.total_aux_kwh,
            weekly_equivalent_cost: total_cost / WEEKS_PER_MONTH,
        })
    }
}

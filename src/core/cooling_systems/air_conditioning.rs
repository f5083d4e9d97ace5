use crate::core::diagnostics::{DiagnosticSink, InputField};
use crate::core::heating_systems::heat_pump::HourlyPerformance;
use crate::core::units::{
    btu_per_hour_per_degree, seasonal_rating_to_cop, BTU_PER_HOUR_PER_TON,
    WATT_HOURS_PER_KILOWATT_HOUR,
};
use crate::core::validation::{
    finite_in_range, finite_or, or_fallback, relative_humidity, timestep_hours, MAX_TONS,
};
use crate::core::{check_energy_balance, SpaceConditioningSystem};
use crate::external_conditions::HourlyConditions;
use crate::input::SystemProfile;
use std::sync::Arc;

/// This module provides objects to model air conditioning (or a heat pump in cooling mode).
///
/// Heat gain follows the same per-degree rate as heat loss, scaled for sun and latent load.
/// There is no backup path: load the unit cannot remove is reported as a deficit and lets the
/// indoor temperature drift up.

const DEFAULT_SEER2: f64 = 15.;
const DEFAULT_INDOOR_SETPOINT: f64 = 75.;
const DEFAULT_SOLAR_EXPOSURE: f64 = 1.;
/// Outdoor temperature (°F) above which cooling capacity derates
const CAPACITY_DERATE_START_TEMP: f64 = 95.;
const CAPACITY_DERATE_PER_DEGREE: f64 = 0.01;
const MIN_CAPACITY_FRACTION: f64 = 0.75;
/// Humidity (%) above which latent load is added
const LATENT_LOAD_THRESHOLD: f64 = 50.;
/// Extra load at 100% humidity, as a fraction of sensible load
const MAX_LATENT_LOAD_FRACTION: f64 = 0.1;

/// Fraction of nominal cooling capacity available at `outdoor_temp`.
pub fn cooling_capacity_fraction(outdoor_temp: f64) -> f64 {
    if outdoor_temp > CAPACITY_DERATE_START_TEMP {
        (1. - (outdoor_temp - CAPACITY_DERATE_START_TEMP) * CAPACITY_DERATE_PER_DEGREE)
            .max(MIN_CAPACITY_FRACTION)
    } else {
        1.
    }
}

/// Multiplier (>= 1) approximating the latent (dehumidification) load.
pub fn latent_load_factor(relative_humidity: f64) -> f64 {
    1. + MAX_LATENT_LOAD_FRACTION
        * ((relative_humidity - LATENT_LOAD_THRESHOLD) / (100. - LATENT_LOAD_THRESHOLD)).max(0.)
}

#[derive(Clone, Debug)]
pub struct AirConditioning {
    nominal_capacity_btu_hr: f64,
    seer2: f64,
    solar_exposure: f64,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl AirConditioning {
    /// Construct an air conditioning object
    ///
    /// Arguments:
    /// * `system` - tonnage and SEER2 rating of the unit
    /// * `solar_exposure` - multiplier on heat gain for sun on the building (1.0 = typical)
    /// * `diagnostics` - sink told about any input that had to be replaced
    pub fn new(
        system: &SystemProfile,
        solar_exposure: f64,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let tons = or_fallback(
            finite_in_range(InputField::Tons, system.tons, 0., MAX_TONS),
            0.,
            diagnostics.as_ref(),
        );
        let seer2 = or_fallback(
            finite_in_range(InputField::Seer2, system.seer2, f64::MIN_POSITIVE, f64::MAX),
            DEFAULT_SEER2,
            diagnostics.as_ref(),
        );
        let solar_exposure = or_fallback(
            finite_in_range(InputField::SolarExposure, solar_exposure, 0., f64::MAX),
            DEFAULT_SOLAR_EXPOSURE,
            diagnostics.as_ref(),
        );

        Self {
            nominal_capacity_btu_hr: tons * BTU_PER_HOUR_PER_TON,
            seer2,
            solar_exposure,
            diagnostics,
        }
    }

    pub fn available_capacity_btu_hr(&self, outdoor_temp: f64) -> f64 {
        self.nominal_capacity_btu_hr * cooling_capacity_fraction(outdoor_temp)
    }

    /// Cooling performance for one timestep.
    ///
    /// Arguments:
    /// * `indoor_setpoint` - in °F
    /// * `design_heat_loss` - building heat loss at a 70°F indoor-outdoor difference, in BTU/hr
    /// * `conditions` - outdoor temperature, humidity and timestep length
    pub fn hourly_performance(
        &self,
        indoor_setpoint: f64,
        design_heat_loss: f64,
        conditions: &HourlyConditions,
    ) -> HourlyPerformance {
        let diagnostics = self.diagnostics.as_ref();
        let indoor_setpoint = finite_or(
            InputField::IndoorSetpoint,
            indoor_setpoint,
            DEFAULT_INDOOR_SETPOINT,
            diagnostics,
        );
        let design_heat_loss =
            finite_or(InputField::DesignHeatLoss, design_heat_loss, 0., diagnostics);
        let outdoor_temp = finite_or(
            InputField::OutdoorTemp,
            conditions.outdoor_temp,
            indoor_setpoint,
            diagnostics,
        );
        let humidity = relative_humidity(conditions.humidity, diagnostics);
        let dt_hours = timestep_hours(conditions.dt_hours, diagnostics);

        let gain_per_degree = btu_per_hour_per_degree(design_heat_loss)
            * self.solar_exposure
            * latent_load_factor(humidity);
        let building_load_btu_hr = gain_per_degree * (outdoor_temp - indoor_setpoint).max(0.);

        let available_capacity_btu_hr = self.available_capacity_btu_hr(outdoor_temp);
        let delivered_hp_btu_hr = building_load_btu_hr.min(available_capacity_btu_hr);
        let deficit_btu_hr = (building_load_btu_hr - delivered_hp_btu_hr).max(0.);

        let hp_kwh = delivered_hp_btu_hr * dt_hours / (self.seer2 * WATT_HOURS_PER_KILOWATT_HOUR);

        let capacity_utilization = if available_capacity_btu_hr > 0. {
            (delivered_hp_btu_hr / available_capacity_btu_hr * 100.).min(100.)
        } else {
            0.
        };

        // indoor settles where the gain matches what the unit can remove
        let actual_indoor_temp = if deficit_btu_hr > 0. && gain_per_degree > 0. {
            (outdoor_temp - available_capacity_btu_hr / gain_per_degree).max(indoor_setpoint)
        } else {
            indoor_setpoint
        };

        check_energy_balance(
            diagnostics,
            building_load_btu_hr * dt_hours,
            delivered_hp_btu_hr * dt_hours,
            deficit_btu_hr * dt_hours,
        );

        HourlyPerformance {
            hp_kwh,
            aux_kwh: 0.,
            aux_kw: 0.,
            building_load_btu_hr,
            delivered_hp_btu_hr,
            deficit_btu_hr,
            available_capacity_btu_hr,
            capacity_utilization,
            defrost_penalty_multiplier: 1.,
            effective_cop: seasonal_rating_to_cop(self.seer2),
            actual_indoor_temp,
            dt_hours,
        }
    }
}

impl SpaceConditioningSystem for AirConditioning {
    fn hourly_performance(
        &self,
        indoor_setpoint: f64,
        design_heat_loss: f64,
        conditions: &HourlyConditions,
    ) -> HourlyPerformance {
        AirConditioning::hourly_performance(self, indoor_setpoint, design_heat_loss, conditions)
    }

    fn holds_setpoint_with_backup(&self) -> bool {
        false
    }
}

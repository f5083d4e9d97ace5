use crate::core::diagnostics::{DiagnosticSink, InputField};
use crate::core::heating_systems::capacity::capacity_fraction;
use crate::core::heating_systems::defrost::defrost_penalty;
use crate::core::heating_systems::efficiency::cop;
use crate::core::solvers::find_root_in_bracket;
use crate::core::units::{
    btu_per_hour_per_degree, btu_to_kwh, BTU_PER_HOUR_PER_TON, BTU_PER_KILOWATT_HOUR,
};
use crate::core::validation::{
    finite, finite_in_range, finite_or, or_fallback, relative_humidity, timestep_hours, MAX_TONS,
};
use crate::core::{check_energy_balance, SpaceConditioningSystem};
use crate::external_conditions::HourlyConditions;
use crate::input::{default_cutoff_temp, SystemProfile};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// This module provides the hour-by-hour performance of an air-source heat pump heating a
/// building, with electric resistance backup covering whatever the compressor cannot.

/// Effective COP never drops below this, whatever the defrost penalty.
const MIN_EFFECTIVE_COP: f64 = 0.5;
const DEFAULT_HSPF2: f64 = 9.;
const DEFAULT_INDOOR_SETPOINT: f64 = 70.;

/// Performance of the heating system over one timestep.
///
/// `hp_kwh` and `aux_kwh` are energies already scaled by the timestep and must only ever be
/// summed. `aux_kw` is the instantaneous backup power and must never be summed across steps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(into = "HourlyPerformanceRecord")]
pub struct HourlyPerformance {
    pub hp_kwh: f64,
    pub aux_kwh: f64,
    pub aux_kw: f64,
    pub building_load_btu_hr: f64,
    pub delivered_hp_btu_hr: f64,
    pub deficit_btu_hr: f64,
    pub available_capacity_btu_hr: f64,
    /// Share of available capacity in use, in percent (0-100)
    pub capacity_utilization: f64,
    pub defrost_penalty_multiplier: f64,
    pub effective_cop: f64,
    /// Indoor temperature the heat pump alone can hold; below setpoint when undersized
    pub actual_indoor_temp: f64,
    pub dt_hours: f64,
}

impl HourlyPerformance {
    /// Average heat pump electrical draw over the timestep, in kW.
    pub fn electrical_kw(&self) -> f64 {
        if self.dt_hours > 0. {
            self.hp_kwh / self.dt_hours
        } else {
            0.
        }
    }

    /// Alias of `capacity_utilization`, for consumers of the older field name.
    pub fn runtime(&self) -> f64 {
        self.capacity_utilization
    }

    pub fn total_kwh(&self) -> f64 {
        self.hp_kwh + self.aux_kwh
    }
}

/// Serialised form of `HourlyPerformance`, including the derived fields, under the field
/// names consumers depend on.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HourlyPerformanceRecord {
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
}

impl From<HourlyPerformance> for HourlyPerformanceRecord {
    fn from(performance: HourlyPerformance) -> Self {
        Self {
            hp_kwh: performance.hp_kwh,
            aux_kwh: performance.aux_kwh,
            aux_kw: performance.aux_kw,
            electrical_kw: performance.electrical_kw(),
            building_load_btu_hr: performance.building_load_btu_hr,
            delivered_hp_btu_hr: performance.delivered_hp_btu_hr,
            deficit_btu_hr: performance.deficit_btu_hr,
            available_capacity_btu_hr: performance.available_capacity_btu_hr,
            capacity_utilization: performance.capacity_utilization,
            runtime: performance.runtime(),
            defrost_penalty_multiplier: performance.defrost_penalty_multiplier,
            effective_cop: performance.effective_cop,
            actual_indoor_temp: performance.actual_indoor_temp,
            dt_hours: performance.dt_hours,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeatPump {
    rated_capacity_btu_hr: f64,
    hspf2: f64,
    cutoff_temp: f64,
    aux_heat_enabled: bool,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl HeatPump {
    /// Construct a heat pump from its ratings.
    ///
    /// Arguments:
    /// * `system` - tonnage, HSPF2, lockout temperature and whether backup heat is fitted
    /// * `diagnostics` - sink told about any input that had to be replaced
    pub fn new(system: &SystemProfile, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        let tons = or_fallback(
            finite_in_range(InputField::Tons, system.tons, 0., MAX_TONS),
            0.,
            diagnostics.as_ref(),
        );
        let hspf2 = or_fallback(
            finite_in_range(InputField::Hspf2, system.hspf2, f64::MIN_POSITIVE, f64::MAX),
            DEFAULT_HSPF2,
            diagnostics.as_ref(),
        );
        let cutoff_temp = finite_or(
            InputField::CutoffTemp,
            system.cutoff_temp,
            default_cutoff_temp(),
            diagnostics.as_ref(),
        );

        Self {
            rated_capacity_btu_hr: tons * BTU_PER_HOUR_PER_TON,
            hspf2,
            cutoff_temp,
            aux_heat_enabled: system.aux_heat_enabled,
            diagnostics,
        }
    }

    pub fn aux_heat_enabled(&self) -> bool {
        self.aux_heat_enabled
    }

    pub fn cutoff_temp(&self) -> f64 {
        self.cutoff_temp
    }

    /// Heating capacity the compressor can deliver at `outdoor_temp`, in BTU/hr.
    pub fn available_capacity_btu_hr(&self, outdoor_temp: f64) -> f64 {
        self.rated_capacity_btu_hr * capacity_fraction(outdoor_temp, self.cutoff_temp)
    }

    /// Heat pump and backup heat performance for one timestep.
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
        // an unknown outdoor temperature is treated as needing no heat
        let outdoor_temp = finite_or(
            InputField::OutdoorTemp,
            conditions.outdoor_temp,
            indoor_setpoint,
            diagnostics,
        );
        let humidity = relative_humidity(conditions.humidity, diagnostics);
        let dt_hours = timestep_hours(conditions.dt_hours, diagnostics);

        let btu_per_degree = btu_per_hour_per_degree(design_heat_loss);
        // warm spells give no load rather than negative energy
        let temp_diff = (indoor_setpoint - outdoor_temp).max(0.);
        let building_load_btu_hr = btu_per_degree * temp_diff;

        let available_capacity_btu_hr = self.available_capacity_btu_hr(outdoor_temp);
        let delivered_hp_btu_hr = building_load_btu_hr.min(available_capacity_btu_hr);
        let deficit_btu_hr = (building_load_btu_hr - delivered_hp_btu_hr).max(0.);

        let defrost_penalty_multiplier = defrost_penalty(outdoor_temp, humidity);
        let effective_cop =
            (cop(outdoor_temp, self.hspf2) / defrost_penalty_multiplier).max(MIN_EFFECTIVE_COP);

        let hp_kwh = if delivered_hp_btu_hr > 0. {
            delivered_hp_btu_hr * dt_hours / (effective_cop * BTU_PER_KILOWATT_HOUR)
        } else {
            0.
        };
        let (aux_kw, aux_kwh) = if self.aux_heat_enabled {
            let aux_kw = btu_to_kwh(deficit_btu_hr);
            (aux_kw, aux_kw * dt_hours)
        } else {
            (0., 0.)
        };

        let capacity_utilization = if available_capacity_btu_hr > 0. {
            (delivered_hp_btu_hr / available_capacity_btu_hr * 100.).min(100.)
        } else {
            0.
        };

        // With the compressor flat out the house settles where its losses match capacity
        let actual_indoor_temp = if deficit_btu_hr > 0. && btu_per_degree > 0. {
            (outdoor_temp + available_capacity_btu_hr / btu_per_degree).min(indoor_setpoint)
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
        }
    }

    /// Outdoor temperature (°F) above the lockout at which available capacity just meets the
    /// building load. Below it backup heat is needed.
    ///
    /// Returns None when the heat pump covers the load at every temperature above the lockout,
    /// or when there is no capacity or load to compare.
    pub fn balance_point(&self, design_heat_loss: f64, indoor_setpoint: f64) -> Option<f64> {
        let design_heat_loss = finite(InputField::DesignHeatLoss, design_heat_loss).ok()?;
        let btu_per_degree = btu_per_hour_per_degree(design_heat_loss);
        let indoor_setpoint = finite(InputField::IndoorSetpoint, indoor_setpoint).ok()?;
        if btu_per_degree <= 0. || self.rated_capacity_btu_hr <= 0. {
            return None;
        }

        let surplus = |outdoor_temp: f64| {
            self.available_capacity_btu_hr(outdoor_temp)
                - btu_per_degree * (indoor_setpoint - outdoor_temp).max(0.)
        };

        let lowest_running_temp = self.cutoff_temp + 1e-6;
        if lowest_running_temp >= indoor_setpoint || surplus(lowest_running_temp) >= 0. {
            return None;
        }

        match find_root_in_bracket(surplus, lowest_running_temp, indoor_setpoint, 1e-6) {
            Ok(balance_point) => Some(balance_point),
            Err(err) => {
                debug!("balance point search failed: {err}");
                None
            }
        }
    }
}

impl SpaceConditioningSystem for HeatPump {
    fn hourly_performance(
        &self,
        indoor_setpoint: f64,
        design_heat_loss: f64,
        conditions: &HourlyConditions,
    ) -> HourlyPerformance {
        HeatPump::hourly_performance(self, indoor_setpoint, design_heat_loss, conditions)
    }

    fn holds_setpoint_with_backup(&self) -> bool {
        self.aux_heat_enabled
    }
}

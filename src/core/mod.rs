use crate::core::diagnostics::{Diagnostic, DiagnosticSink};
use crate::core::heating_systems::heat_pump::HourlyPerformance;
use crate::external_conditions::HourlyConditions;
use std::fmt::Debug;

pub mod cooling_systems;
pub mod diagnostics;
pub mod energy_supply;
pub mod heating_systems;
pub(crate) mod solvers;
pub mod space_heat_demand;
pub mod units;
pub mod validation;

/// A system that conditions the building space, heating or cooling it towards a setpoint.
pub trait SpaceConditioningSystem: Debug + Send + Sync {
    /// Performance over one timestep of conditions
    fn hourly_performance(
        &self,
        indoor_setpoint: f64,
        design_heat_loss: f64,
        conditions: &HourlyConditions,
    ) -> HourlyPerformance;

    /// Whether a backup source makes up any shortfall, so the setpoint is held regardless.
    fn holds_setpoint_with_backup(&self) -> bool;
}

/// Absolute tolerance (BTU) of the per-timestep energy balance.
const ENERGY_BALANCE_ABS_TOL: f64 = 0.1;
/// Relative tolerance of the per-timestep energy balance.
const ENERGY_BALANCE_REL_TOL: f64 = 1e-3;

/// Report an `EnergyImbalance` unless heat delivered plus deficit accounts for the whole load
/// of a timestep.
pub(crate) fn check_energy_balance(
    diagnostics: &dyn DiagnosticSink,
    load_btu: f64,
    delivered_btu: f64,
    deficit_btu: f64,
) {
    let supplied_btu = delivered_btu + deficit_btu;
    if !is_close!(
        supplied_btu,
        load_btu,
        rel_tol = ENERGY_BALANCE_REL_TOL,
        abs_tol = ENERGY_BALANCE_ABS_TOL
    ) {
        diagnostics.report(Diagnostic::EnergyImbalance {
            load_btu,
            delivered_btu,
            deficit_btu,
            mismatch_btu: supplied_btu - load_btu,
        });
    }
}

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::{Arc, LazyLock};
use strum::{Display, IntoStaticStr};
use tracing::warn;

/// This module provides the diagnostics capability handed to the performance engines.
///
/// The engines never fail on bad numbers. Instead they substitute a safe value and report what
/// happened to a `DiagnosticSink`, which decides whether and how to surface it.

/// Names of the numeric inputs that pass through the validation boundary.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum InputField {
    SquareFeet,
    InsulationLevel,
    HomeShape,
    CeilingHeight,
    WallHeight,
    Tons,
    Hspf2,
    Seer2,
    CutoffTemp,
    IndoorSetpoint,
    DesignHeatLoss,
    OutdoorTemp,
    Humidity,
    TimestepHours,
    SolarExposure,
    Elevation,
    BaseloadKwhPerDay,
    FixedCost,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// A numeric input was NaN or infinite and `fallback` was substituted for it.
    NonFiniteInput {
        field: InputField,
        value: f64,
        fallback: f64,
    },
    /// A finite numeric input lay outside the range it can take and `fallback` was
    /// substituted for it.
    OutOfRangeInput {
        field: InputField,
        value: f64,
        fallback: f64,
    },
    /// A building description could not produce a heat loss, so zero was returned.
    InvalidHeatLossInput { field: InputField, value: f64 },
    /// Delivered plus deficit heat did not add up to the building load for a timestep.
    EnergyImbalance {
        load_btu: f64,
        delivered_btu: f64,
        deficit_btu: f64,
        mismatch_btu: f64,
    },
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct RateLimitKey {
    kind: &'static str,
    field: InputField,
}

impl Diagnostic {
    /// Key identifying diagnostics that only need surfacing once. Energy imbalances have none:
    /// every one of them points at a modelling bug.
    fn rate_limit_key(&self) -> Option<RateLimitKey> {
        match self {
            Diagnostic::NonFiniteInput { field, .. } => Some(RateLimitKey {
                kind: "non_finite_input",
                field: *field,
            }),
            Diagnostic::OutOfRangeInput { field, .. } => Some(RateLimitKey {
                kind: "out_of_range_input",
                field: *field,
            }),
            Diagnostic::InvalidHeatLossInput { field, .. } => Some(RateLimitKey {
                kind: "invalid_heat_loss_input",
                field: *field,
            }),
            Diagnostic::EnergyImbalance { .. } => None,
        }
    }
}

pub trait DiagnosticSink: Debug + Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink emitting diagnostics as `tracing` warnings, each invalid-input kind at most once per
/// field for the lifetime of the sink.
#[derive(Debug, Default)]
pub struct TracingDiagnostics {
    already_reported: Mutex<HashSet<RateLimitKey>>,
}

impl TracingDiagnostics {
    pub fn new() -> Self {
        Default::default()
    }
}

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        if let Some(key) = diagnostic.rate_limit_key() {
            if !self.already_reported.lock().insert(key) {
                return;
            }
        }

        match diagnostic {
            Diagnostic::NonFiniteInput {
                field,
                value,
                fallback,
            } => {
                let field: &'static str = field.into();
                warn!(field, value, fallback, "non-finite numeric input replaced with default; further occurrences will not be logged");
            }
            Diagnostic::OutOfRangeInput {
                field,
                value,
                fallback,
            } => {
                let field: &'static str = field.into();
                warn!(field, value, fallback, "out of range numeric input replaced with default; further occurrences will not be logged");
            }
            Diagnostic::InvalidHeatLossInput { field, value } => {
                let field: &'static str = field.into();
                warn!(field, value, "heat loss could not be calculated from building inputs; returning 0");
            }
            Diagnostic::EnergyImbalance {
                load_btu,
                delivered_btu,
                deficit_btu,
                mismatch_btu,
            } => {
                warn!(
                    load_btu,
                    delivered_btu, deficit_btu, mismatch_btu, "energy balance violated for timestep"
                );
            }
        }
    }
}

static PROCESS_DIAGNOSTICS: LazyLock<Arc<TracingDiagnostics>> =
    LazyLock::new(|| Arc::new(TracingDiagnostics::new()));

/// The process-wide tracing sink, shared so that rate limiting applies across every engine.
pub fn process_diagnostics() -> Arc<dyn DiagnosticSink> {
    PROCESS_DIAGNOSTICS.clone()
}

/// Sink that keeps every diagnostic it is given, in order.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    reported: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.reported.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.reported.lock().push(diagnostic);
    }
}

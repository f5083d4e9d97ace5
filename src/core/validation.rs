use crate::core::diagnostics::{Diagnostic, DiagnosticSink, InputField};
use thiserror::Error;

/// Validation boundary for the numeric inputs of the performance engines.
///
/// Every public entry point passes its raw numbers through here once, so the calculation
/// bodies can assume finite values.

pub const DEFAULT_RELATIVE_HUMIDITY: f64 = 70.;
/// Largest nominal tonnage accepted for a single system. Anything bigger is a units mistake,
/// and far enough past it the rated capacity overflows to infinity.
pub const MAX_TONS: f64 = 1_000.;

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum InvalidInputError {
    #[error("{field} was not a finite number (got {value})")]
    NonFinite { field: InputField, value: f64 },
    #[error("{field} was outside its valid range (got {value})")]
    OutOfRange { field: InputField, value: f64 },
}

impl InvalidInputError {
    fn into_diagnostic(self, fallback: f64) -> Diagnostic {
        match self {
            InvalidInputError::NonFinite { field, value } => Diagnostic::NonFiniteInput {
                field,
                value,
                fallback,
            },
            InvalidInputError::OutOfRange { field, value } => Diagnostic::OutOfRangeInput {
                field,
                value,
                fallback,
            },
        }
    }
}

pub fn finite(field: InputField, value: f64) -> Result<f64, InvalidInputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidInputError::NonFinite { field, value })
    }
}

pub fn finite_in_range(
    field: InputField,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, InvalidInputError> {
    let value = finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(InvalidInputError::OutOfRange { field, value })
    }
}

/// Resolve a validation outcome, reporting and substituting `fallback` when it failed.
pub fn or_fallback(
    outcome: Result<f64, InvalidInputError>,
    fallback: f64,
    diagnostics: &dyn DiagnosticSink,
) -> f64 {
    outcome.unwrap_or_else(|err| {
        diagnostics.report(err.into_diagnostic(fallback));
        fallback
    })
}

pub fn finite_or(
    field: InputField,
    value: f64,
    fallback: f64,
    diagnostics: &dyn DiagnosticSink,
) -> f64 {
    or_fallback(finite(field, value), fallback, diagnostics)
}

/// Relative humidity in percent. Absent values silently default; present but unusable ones
/// (non-finite, or outside 0-100) default with a diagnostic.
pub fn relative_humidity(humidity: Option<f64>, diagnostics: &dyn DiagnosticSink) -> f64 {
    match humidity {
        None => DEFAULT_RELATIVE_HUMIDITY,
        Some(value) => or_fallback(
            finite_in_range(InputField::Humidity, value, 0., 100.),
            DEFAULT_RELATIVE_HUMIDITY,
            diagnostics,
        ),
    }
}

/// Timestep length in hours. Must be finite and positive; defaults to one hour.
pub fn timestep_hours(dt_hours: Option<f64>, diagnostics: &dyn DiagnosticSink) -> f64 {
    match dt_hours {
        None => 1.,
        Some(value) => or_fallback(
            finite_in_range(InputField::TimestepHours, value, f64::MIN_POSITIVE, f64::MAX),
            1.,
            diagnostics,
        ),
    }
}

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThermalForecastError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("Error identified during forecast calculation: {0}")]
    FailureInCalculation(#[from] ForecastCalculationError),
    #[error("Error writing forecast output: {0}")]
    FailureInOutput(OutputError),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ForecastCalculationError {
    error: anyhow::Error,
}

impl ForecastCalculationError {
    pub(crate) fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub(crate) fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

#[derive(Debug, Error)]
#[error("Could not parse forecast row on line {line}")]
pub struct InvalidForecastRow {
    pub line: usize,
    source: csv::Error,
}

impl InvalidForecastRow {
    pub(crate) fn new(line: usize, source: csv::Error) -> Self {
        Self { line, source }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidRateSchedule {
    #[error("Flat electricity rate must be a non-negative number (got {0})")]
    FlatRate(f64),
    #[error("Time-of-use rate from {start} to {end} must be a non-negative number (got {rate})")]
    TimeOfUseRate {
        start: NaiveTime,
        end: NaiveTime,
        rate: f64,
    },
}

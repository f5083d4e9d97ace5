use crate::errors::InvalidRateSchedule;
use crate::input::TariffInput;
use anyhow::bail;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// This module contains the electricity prices used to cost the forecast.

/// A price in $/kWh applying between two times of day. `start` is inclusive and `end`
/// exclusive; a rule whose start is after its end runs past midnight.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimeOfUseRule {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub rate: f64,
}

impl TimeOfUseRule {
    pub fn new(start: NaiveTime, end: NaiveTime, rate: f64) -> Self {
        Self { start, end, rate }
    }

    fn applies_at(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RateSchedule {
    flat_rate: f64,
    time_of_use: Vec<TimeOfUseRule>,
}

impl RateSchedule {
    pub fn flat(flat_rate: f64) -> anyhow::Result<Self> {
        Self::new(flat_rate, vec![])
    }

    pub fn new(flat_rate: f64, time_of_use: Vec<TimeOfUseRule>) -> anyhow::Result<Self> {
        if !flat_rate.is_finite() || flat_rate < 0. {
            bail!(InvalidRateSchedule::FlatRate(flat_rate));
        }
        if let Some(rule) = time_of_use
            .iter()
            .find(|rule| !rule.rate.is_finite() || rule.rate < 0.)
        {
            bail!(InvalidRateSchedule::TimeOfUseRate {
                start: rule.start,
                end: rule.end,
                rate: rule.rate,
            });
        }

        Ok(Self {
            flat_rate,
            time_of_use,
        })
    }

    pub fn from_input(tariff: &TariffInput) -> anyhow::Result<Self> {
        Self::new(
            tariff.flat_rate,
            tariff.time_of_use.clone().unwrap_or_default(),
        )
    }

    pub fn flat_rate(&self) -> f64 {
        self.flat_rate
    }

    pub fn has_time_of_use(&self) -> bool {
        !self.time_of_use.is_empty()
    }

    /// Price in $/kWh at `time`: the first time-of-use rule covering it, otherwise the flat rate.
    pub fn rate_at(&self, time: NaiveDateTime) -> f64 {
        let time_of_day = time.time();
        self.time_of_use
            .iter()
            .find(|rule| rule.applies_at(time_of_day))
            .map_or(self.flat_rate, |rule| rule.rate)
    }

    pub fn cost(&self, energy_kwh: f64, time: NaiveDateTime) -> f64 {
        energy_kwh * self.rate_at(time)
    }
}

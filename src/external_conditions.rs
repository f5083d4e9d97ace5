use crate::core::diagnostics::{DiagnosticSink, InputField};
use crate::core::units::{FEET_PER_KILOFOOT, HOURS_PER_DAY};
use crate::core::validation::{finite_or, relative_humidity};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// This module provides the weather inputs of the forecast: hourly conditions, daily
/// summaries expanded into hours, and the adjustment for the elevation difference between
/// the weather station and the building.

/// Temperature fall with height of dry air, in °F per 1000 ft.
const DRY_ADIABATIC_LAPSE_RATE: f64 = 5.4;
/// Temperature fall with height of saturated air, in °F per 1000 ft.
const SATURATED_LAPSE_RATE: f64 = 3.0;
/// Elevation differences below this (ft) make no measurable difference to temperature.
const MIN_ELEVATION_DIFFERENCE_FT: f64 = 10.;

const DEFAULT_DAILY_HUMIDITY: f64 = 60.;

/// Outdoor conditions for one forecast step, in local time.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherHour {
    pub time: NaiveDateTime,
    /// Outdoor dry-bulb temperature in °F
    #[serde(alias = "outdoorTemp")]
    pub temp: f64,
    /// Relative humidity, 0-100
    #[serde(default, alias = "relativeHumidity")]
    pub humidity: Option<f64>,
    /// Length of the step in hours, for sub-hourly forecasts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_hours: Option<f64>,
}

impl WeatherHour {
    pub fn new(time: NaiveDateTime, temp: f64, humidity: Option<f64>) -> Self {
        Self {
            time,
            temp,
            humidity,
            dt_hours: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }
}

/// The outdoor conditions one performance calculation needs, before validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourlyConditions {
    pub outdoor_temp: f64,
    pub humidity: Option<f64>,
    pub dt_hours: Option<f64>,
}

impl HourlyConditions {
    pub fn new(outdoor_temp: f64, humidity: Option<f64>) -> Self {
        Self {
            outdoor_temp,
            humidity,
            dt_hours: None,
        }
    }

    pub fn with_timestep(self, dt_hours: f64) -> Self {
        Self {
            dt_hours: Some(dt_hours),
            ..self
        }
    }
}

impl From<&WeatherHour> for HourlyConditions {
    fn from(hour: &WeatherHour) -> Self {
        Self {
            outdoor_temp: hour.temp,
            humidity: hour.humidity,
            dt_hours: hour.dt_hours,
        }
    }
}

/// Humidity-weighted lapse rate in °F per 1000 ft, between the dry adiabatic rate (0% RH)
/// and the saturated rate (100% RH).
pub fn lapse_rate(relative_humidity: f64) -> f64 {
    let saturation = (relative_humidity / 100.).clamp(0., 1.);
    DRY_ADIABATIC_LAPSE_RATE + (SATURATED_LAPSE_RATE - DRY_ADIABATIC_LAPSE_RATE) * saturation
}

/// Shift forecast temperatures from the weather station's elevation to the building's.
///
/// A building above the station is colder and one below it warmer. Differences under 10 ft
/// return the forecast unchanged.
pub fn adjust_for_elevation(
    forecast: &[WeatherHour],
    home_elevation_ft: f64,
    station_elevation_ft: f64,
    diagnostics: &dyn DiagnosticSink,
) -> Vec<WeatherHour> {
    let home_elevation_ft = finite_or(InputField::Elevation, home_elevation_ft, 0., diagnostics);
    let station_elevation_ft =
        finite_or(InputField::Elevation, station_elevation_ft, 0., diagnostics);
    let elevation_difference_ft = home_elevation_ft - station_elevation_ft;

    if elevation_difference_ft.abs() < MIN_ELEVATION_DIFFERENCE_FT {
        return forecast.to_vec();
    }

    forecast
        .iter()
        .map(|hour| {
            let humidity = relative_humidity(hour.humidity, diagnostics);
            WeatherHour {
                temp: hour.temp
                    - (elevation_difference_ft / FEET_PER_KILOFOOT) * lapse_rate(humidity),
                ..hour.clone()
            }
        })
        .collect()
}

/// Daily high/low summary, as returned by daily weather archives and long-range forecasts.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub low: f64,
    pub high: f64,
    pub avg: Option<f64>,
    pub humidity: Option<f64>,
}

impl DailyWeather {
    pub fn new(date: NaiveDate, low: f64, high: f64) -> Self {
        Self {
            date,
            low,
            high,
            avg: None,
            humidity: None,
        }
    }

    pub fn average(&self) -> f64 {
        self.avg.unwrap_or((self.low + self.high) / 2.)
    }

    /// Temperature at `hour` (0-23) on a sinusoidal profile with its minimum at 06:00 and
    /// maximum twelve hours later.
    pub fn temperature_at_hour(&self, hour: u32) -> f64 {
        let phase = ((hour as f64 - 6.) / 12.) * PI;
        self.average() + (phase - PI).cos() * ((self.high - self.low) / 2.)
    }

    pub fn hourly(&self) -> Vec<WeatherHour> {
        let humidity = self.humidity.unwrap_or(DEFAULT_DAILY_HUMIDITY);
        (0..HOURS_PER_DAY)
            .filter_map(|hour| {
                self.date.and_hms_opt(hour, 0, 0).map(|time| {
                    WeatherHour::new(time, self.temperature_at_hour(hour), Some(humidity))
                })
            })
            .collect()
    }
}

use crate::core::energy_supply::tariff_data::TimeOfUseRule;
use crate::external_conditions::{DailyWeather, WeatherHour};
use crate::forecast::monthly::MonthlySettings;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read};

pub fn ingest_for_processing(json: impl Read) -> anyhow::Result<Input> {
    Ok(serde_json::from_reader(BufReader::new(json))?)
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Input {
    pub building: BuildingProfile,
    #[serde(default)]
    pub system: SystemProfile,
    pub heat_loss: Option<HeatLossOverride>,
    #[serde(default)]
    pub mode: HvacMode,
    #[serde(default = "default_indoor_setpoint")]
    pub indoor_setpoint: f64,
    #[serde(default = "default_solar_exposure")]
    pub solar_exposure: f64,
    pub elevation: Option<ElevationInput>,
    #[serde(default)]
    pub tariff: TariffInput,
    #[serde(default)]
    pub forecast: Vec<WeatherHour>,
    pub monthly: Option<MonthlyInput>,
}

fn default_indoor_setpoint() -> f64 {
    70.
}

fn default_solar_exposure() -> f64 {
    1.
}

/// Geometry and insulation of the building, as entered by the user.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildingProfile {
    pub square_feet: f64,
    #[serde(default = "default_multiplier")]
    pub insulation_level: f64,
    #[serde(default = "default_multiplier")]
    pub home_shape: f64,
    #[serde(default = "default_ceiling_height")]
    pub ceiling_height: f64,
    pub wall_height: Option<f64>,
    #[serde(default)]
    pub has_loft: bool,
}

fn default_multiplier() -> f64 {
    1.
}

fn default_ceiling_height() -> f64 {
    8.
}

impl BuildingProfile {
    pub fn new(
        square_feet: f64,
        insulation_level: f64,
        home_shape: f64,
        ceiling_height: f64,
    ) -> Self {
        Self {
            square_feet,
            insulation_level,
            home_shape,
            ceiling_height,
            wall_height: None,
            has_loft: false,
        }
    }
}

/// Ratings of the installed heat pump / air conditioner.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemProfile {
    pub tons: f64,
    #[serde(default = "default_hspf2")]
    pub hspf2: f64,
    #[serde(default = "default_seer2")]
    pub seer2: f64,
    /// Rated compressor power in kW; derived from tonnage and HSPF2 when absent.
    pub compressor_power: Option<f64>,
    #[serde(default = "default_cutoff_temp")]
    pub cutoff_temp: f64,
    #[serde(default = "default_aux_heat_enabled")]
    pub aux_heat_enabled: bool,
}

fn default_hspf2() -> f64 {
    9.
}

fn default_seer2() -> f64 {
    15.
}

pub(crate) fn default_cutoff_temp() -> f64 {
    -15.
}

fn default_aux_heat_enabled() -> bool {
    true
}

impl Default for SystemProfile {
    fn default() -> Self {
        Self {
            tons: 2.,
            hspf2: default_hspf2(),
            seer2: default_seer2(),
            compressor_power: None,
            cutoff_temp: default_cutoff_temp(),
            aux_heat_enabled: default_aux_heat_enabled(),
        }
    }
}

impl SystemProfile {
    pub fn new(tons: f64, hspf2: f64) -> Self {
        Self {
            tons,
            hspf2,
            ..Default::default()
        }
    }

    pub fn compressor_power_kw(&self) -> f64 {
        match self.compressor_power {
            Some(power) if power.is_finite() && power > 0. => power,
            _ if self.hspf2 > 0. => self.tons * 15. / self.hspf2,
            _ => self.tons * 1.67,
        }
    }
}

/// Measured building heat loss in BTU/hr/°F, taking precedence over the geometric estimate.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatLossOverride {
    Manual(f64),
    Analyzer(f64),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HvacMode {
    #[default]
    Heating,
    Cooling,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ElevationInput {
    pub home_ft: f64,
    pub station_ft: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TariffInput {
    #[serde(default = "default_flat_rate")]
    pub flat_rate: f64,
    pub time_of_use: Option<Vec<TimeOfUseRule>>,
}

fn default_flat_rate() -> f64 {
    0.10
}

impl Default for TariffInput {
    fn default() -> Self {
        Self {
            flat_rate: default_flat_rate(),
            time_of_use: None,
        }
    }
}

/// A month of daily high/low weather to project a bill from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonthlyInput {
    #[serde(default)]
    pub settings: MonthlySettings,
    pub days: Vec<DailyWeather>,
}

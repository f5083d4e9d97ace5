use crate::core::energy_supply::tariff_data::RateSchedule;
use crate::core::heating_systems::heat_pump::HourlyPerformance;
use crate::core::SpaceConditioningSystem;
use crate::external_conditions::{HourlyConditions, WeatherHour};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::sync::Arc;

/// This module runs a conditioning system across a forecast and rolls the results up into
/// calendar days and a whole-forecast total.

/// Result for one forecast step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourResult {
    pub time: NaiveDateTime,
    pub outdoor_temp: f64,
    pub humidity: Option<f64>,
    pub performance: HourlyPerformance,
    pub hp_cost: f64,
    pub aux_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub hours: usize,
    pub min_outdoor_temp: Option<f64>,
    pub max_outdoor_temp: Option<f64>,
    /// Mean of the hours that reported humidity
    pub avg_humidity: Option<f64>,
    pub hp_kwh: f64,
    pub aux_kwh: f64,
    pub hp_cost: f64,
    pub aux_cost: f64,
    /// Cost of heat pump energy alone
    pub cost: f64,
    pub cost_with_aux: f64,
    /// Lowest indoor temperature reached when backup heat makes up any shortfall
    pub min_indoor_temp_with_aux: f64,
    /// Lowest indoor temperature reached on heat pump capacity alone
    pub min_indoor_temp_hp_only: f64,
    pub max_indoor_temp: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub days: Vec<DailySummary>,
    pub total_hp_kwh: f64,
    pub total_aux_kwh: f64,
    pub total_hp_cost: f64,
    pub total_aux_cost: f64,
    pub total_cost: f64,
    pub total_cost_with_aux: f64,
}

impl WeeklySummary {
    fn from_days(days: Vec<DailySummary>) -> Self {
        let mut summary = Self::default();
        for day in &days {
            summary.total_hp_kwh += day.hp_kwh;
            summary.total_aux_kwh += day.aux_kwh;
            summary.total_hp_cost += day.hp_cost;
            summary.total_aux_cost += day.aux_cost;
            summary.total_cost += day.cost;
            summary.total_cost_with_aux += day.cost_with_aux;
        }
        summary.days = days;
        summary
    }

    pub fn total_energy_kwh(&self) -> f64 {
        self.total_hp_kwh + self.total_aux_kwh
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyForecast {
    pub hours: Vec<HourResult>,
    pub summary: WeeklySummary,
}

#[derive(Debug)]
pub struct WeeklyAggregator {
    system: Arc<dyn SpaceConditioningSystem>,
    rates: RateSchedule,
    indoor_setpoint: f64,
    design_heat_loss: f64,
}

impl WeeklyAggregator {
    /// Arguments:
    /// * `system` - heat pump or air conditioner run for every step
    /// * `rates` - electricity prices; a flat schedule prices every hour the same
    /// * `indoor_setpoint` - in °F
    /// * `design_heat_loss` - building heat loss at a 70°F indoor-outdoor difference, in BTU/hr
    pub fn new(
        system: Arc<dyn SpaceConditioningSystem>,
        rates: RateSchedule,
        indoor_setpoint: f64,
        design_heat_loss: f64,
    ) -> Self {
        Self {
            system,
            rates,
            indoor_setpoint,
            design_heat_loss,
        }
    }

    pub fn hour(&self, weather: &WeatherHour) -> HourResult {
        let performance = self.system.hourly_performance(
            self.indoor_setpoint,
            self.design_heat_loss,
            &HourlyConditions::from(weather),
        );
        let rate = self.rates.rate_at(weather.time);

        HourResult {
            time: weather.time,
            outdoor_temp: weather.temp,
            humidity: weather.humidity,
            performance,
            hp_cost: performance.hp_kwh * rate,
            aux_cost: performance.aux_kwh * rate,
        }
    }

    /// Run every step of `forecast` and group the results by calendar day, in order of first
    /// appearance.
    pub fn run(&self, forecast: &[WeatherHour]) -> WeeklyForecast {
        let hours = forecast.iter().map(|weather| self.hour(weather)).collect_vec();

        let mut by_date: IndexMap<NaiveDate, Vec<&HourResult>> = IndexMap::new();
        for hour in &hours {
            by_date.entry(hour.time.date()).or_default().push(hour);
        }

        let days = by_date
            .into_iter()
            .map(|(date, day_hours)| self.summarise_day(date, &day_hours))
            .collect_vec();

        WeeklyForecast {
            hours,
            summary: WeeklySummary::from_days(days),
        }
    }

    fn summarise_day(&self, date: NaiveDate, hours: &[&HourResult]) -> DailySummary {
        let (min_outdoor_temp, max_outdoor_temp) = hours
            .iter()
            .map(|hour| hour.outdoor_temp)
            .filter(|temp| temp.is_finite())
            .minmax()
            .into_option()
            .map_or((None, None), |(min, max)| (Some(min), Some(max)));

        let humidities = hours
            .iter()
            .filter_map(|hour| hour.humidity)
            .filter(|humidity| humidity.is_finite())
            .collect_vec();
        let avg_humidity = (!humidities.is_empty())
            .then(|| humidities.iter().sum::<f64>() / humidities.len() as f64);

        let hp_kwh = hours.iter().map(|hour| hour.performance.hp_kwh).sum::<f64>();
        let aux_kwh = hours.iter().map(|hour| hour.performance.aux_kwh).sum::<f64>();
        let hp_cost = hours.iter().map(|hour| hour.hp_cost).sum::<f64>();
        let aux_cost = hours.iter().map(|hour| hour.aux_cost).sum::<f64>();

        let backup_holds_setpoint = self.system.holds_setpoint_with_backup();
        let indoor_temps = hours
            .iter()
            .map(|hour| hour.performance.actual_indoor_temp)
            .collect_vec();
        let min_indoor_temp_hp_only = indoor_temps.iter().copied().fold(f64::INFINITY, f64::min);
        let min_indoor_temp_with_aux = indoor_temps
            .iter()
            .map(|temp| {
                if backup_holds_setpoint {
                    temp.max(self.indoor_setpoint)
                } else {
                    *temp
                }
            })
            .fold(f64::INFINITY, f64::min);
        let max_indoor_temp = indoor_temps
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        DailySummary {
            date,
            hours: hours.len(),
            min_outdoor_temp,
            max_outdoor_temp,
            avg_humidity,
            hp_kwh,
            aux_kwh,
            hp_cost,
            aux_cost,
            cost: hp_cost,
            cost_with_aux: hp_cost + aux_cost,
            min_indoor_temp_with_aux,
            min_indoor_temp_hp_only,
            max_indoor_temp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cooling_systems::air_conditioning::AirConditioning;
    use crate::core::diagnostics::RecordingDiagnostics;
    use crate::core::energy_supply::tariff_data::TimeOfUseRule;
    use crate::core::heating_systems::heat_pump::HeatPump;
    use crate::input::SystemProfile;
    use approx::assert_relative_eq;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const DESIGN_HEAT_LOSS: f64 = 35_000.;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn heat_pump(system: SystemProfile) -> Arc<dyn SpaceConditioningSystem> {
        Arc::new(HeatPump::new(
            &system,
            Arc::new(RecordingDiagnostics::new()),
        ))
    }

    #[fixture]
    pub fn aggregator() -> WeeklyAggregator {
        WeeklyAggregator::new(
            heat_pump(SystemProfile::new(3., 9.)),
            RateSchedule::flat(0.15).unwrap(),
            70.,
            DESIGN_HEAT_LOSS,
        )
    }

    #[rstest]
    fn should_sum_identical_hours_within_a_day(aggregator: WeeklyAggregator) {
        let forecast = (6..=12)
            .flat_map(|day| {
                [
                    WeatherHour::new(at(day, 3), 5., Some(80.)),
                    WeatherHour::new(at(day, 4), 5., Some(80.)),
                ]
            })
            .collect_vec();
        let single = aggregator.hour(&forecast[0]);

        let WeeklyForecast { hours, summary } = aggregator.run(&forecast);

        assert_eq!(hours.len(), 14);
        assert_eq!(summary.days.len(), 7);
        for day in &summary.days {
            assert_eq!(day.hours, 2);
            assert_eq!(day.min_outdoor_temp, day.max_outdoor_temp);
            assert_eq!(day.min_outdoor_temp, Some(5.));
            assert_eq!(day.avg_humidity, Some(80.));
            assert_relative_eq!(day.hp_kwh, 2. * single.performance.hp_kwh, epsilon = 1e-12);
            assert_relative_eq!(day.aux_kwh, 2. * single.performance.aux_kwh, epsilon = 1e-12);
            assert_relative_eq!(day.cost, 2. * single.hp_cost, epsilon = 1e-12);
            assert_relative_eq!(
                day.cost_with_aux,
                2. * (single.hp_cost + single.aux_cost),
                epsilon = 1e-12
            );
        }
        assert_relative_eq!(
            summary.total_hp_kwh,
            14. * single.performance.hp_kwh,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            summary.total_energy_kwh(),
            14. * single.performance.total_kwh(),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_keep_days_in_order_of_first_appearance(aggregator: WeeklyAggregator) {
        let forecast = vec![
            WeatherHour::new(at(7, 0), 30., None),
            WeatherHour::new(at(6, 23), 32., None),
            WeatherHour::new(at(7, 1), 20., None),
        ];
        let summary = aggregator.run(&forecast).summary;

        assert_eq!(
            summary.days.iter().map(|day| day.date).collect_vec(),
            vec![at(7, 0).date(), at(6, 0).date()]
        );
        assert_eq!(summary.days[0].hours, 2);
        assert_eq!(summary.days[0].min_outdoor_temp, Some(20.));
        assert_eq!(summary.days[0].max_outdoor_temp, Some(30.));
        assert_eq!(summary.days[0].avg_humidity, None);
    }

    #[rstest]
    fn should_scale_sub_hourly_steps_once(aggregator: WeeklyAggregator) {
        let hourly = vec![WeatherHour::new(at(6, 0), 10., Some(60.))];
        let quarter_hours = (0..4)
            .map(|quarter| WeatherHour {
                dt_hours: Some(0.25),
                time: at(6, 0) + chrono::Duration::minutes(15 * quarter),
                ..hourly[0].clone()
            })
            .collect_vec();

        let hourly = aggregator.run(&hourly).summary;
        let quarter_hours = aggregator.run(&quarter_hours).summary;
        assert_relative_eq!(
            quarter_hours.total_hp_kwh,
            hourly.total_hp_kwh,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            quarter_hours.total_aux_kwh,
            hourly.total_aux_kwh,
            epsilon = 1e-12
        );
    }

    #[rstest]
    fn should_track_indoor_temperature_with_and_without_aux() {
        let forecast = vec![
            WeatherHour::new(at(6, 5), -20., None),
            WeatherHour::new(at(6, 14), 40., None),
        ];
        let with_aux = WeeklyAggregator::new(
            heat_pump(SystemProfile::new(2., 9.)),
            RateSchedule::flat(0.1).unwrap(),
            70.,
            DESIGN_HEAT_LOSS,
        );
        let day = &with_aux.run(&forecast).summary.days[0];
        assert_eq!(day.min_indoor_temp_with_aux, 70.);
        assert!(day.min_indoor_temp_hp_only < 70.);
        assert_eq!(day.max_indoor_temp, 70.);
        assert!(day.aux_kwh > 0.);
        assert!(day.cost_with_aux > day.cost);

        let without_aux = WeeklyAggregator::new(
            heat_pump(SystemProfile {
                aux_heat_enabled: false,
                ..SystemProfile::new(2., 9.)
            }),
            RateSchedule::flat(0.1).unwrap(),
            70.,
            DESIGN_HEAT_LOSS,
        );
        let day = &without_aux.run(&forecast).summary.days[0];
        assert_eq!(day.min_indoor_temp_with_aux, day.min_indoor_temp_hp_only);
        assert!(day.min_indoor_temp_hp_only < 70.);
        assert_eq!(day.aux_kwh, 0.);
        assert_eq!(day.cost_with_aux, day.cost);
    }

    #[rstest]
    fn should_price_hours_by_time_of_use() {
        let rates = RateSchedule::new(
            0.10,
            vec![TimeOfUseRule::new(
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
                0.30,
            )],
        )
        .unwrap();
        let aggregator = WeeklyAggregator::new(
            heat_pump(SystemProfile::new(3., 9.)),
            rates,
            70.,
            DESIGN_HEAT_LOSS,
        );
        let off_peak = aggregator.hour(&WeatherHour::new(at(6, 10), 30., Some(50.)));
        let peak = aggregator.hour(&WeatherHour::new(at(6, 17), 30., Some(50.)));

        assert_eq!(off_peak.performance, peak.performance);
        assert_relative_eq!(peak.hp_cost, 3. * off_peak.hp_cost, epsilon = 1e-12);
    }

    #[rstest]
    fn should_aggregate_cooling_days() {
        let aggregator = WeeklyAggregator::new(
            Arc::new(AirConditioning::new(
                &SystemProfile::new(1., 9.),
                1.,
                Arc::new(RecordingDiagnostics::new()),
            )),
            RateSchedule::flat(0.2).unwrap(),
            75.,
            DESIGN_HEAT_LOSS,
        );
        let forecast = vec![
            WeatherHour::new(at(6, 9), 80., Some(40.)),
            WeatherHour::new(at(6, 15), 105., Some(40.)),
        ];
        let day = &aggregator.run(&forecast).summary.days[0];

        assert_eq!(day.aux_kwh, 0.);
        assert!(day.hp_kwh > 0.);
        assert_eq!(day.min_indoor_temp_hp_only, 75.);
        assert!(day.max_indoor_temp > 75.);
    }

    #[rstest]
    fn should_return_empty_summary_for_empty_forecast(aggregator: WeeklyAggregator) {
        let forecast = aggregator.run(&[]);
        assert!(forecast.hours.is_empty());
        assert_eq!(forecast.summary, WeeklySummary::default());
    }
}

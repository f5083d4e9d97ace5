use crate::core::units::seasonal_rating_to_cop;
use std::sync::LazyLock;

/// This module provides the heat pump coefficient of performance as a function of outdoor
/// temperature.
///
/// A fixed curve shape is scaled so that, weighted by the standard heating-season bin hours,
/// its average equals the seasonal COP implied by the unit's HSPF2 rating. Simulating a
/// standard season therefore reproduces the rated HSPF2 whatever the local climate.

/// Heating-season bin hours used for HSPF2 ratings: (bin centre temperature in °F, hours).
pub const HSPF2_BIN_HOURS: [(f64, f64); 16] = [
    (62., 87.),
    (57., 183.),
    (52., 294.),
    (47., 358.),
    (42., 415.),
    (37., 460.),
    (33., 430.),
    (28., 407.),
    (23., 311.),
    (18., 239.),
    (13., 152.),
    (8., 91.),
    (3., 47.),
    (-2., 20.),
    (-7., 8.),
    (-13., 3.),
];

const BASE_COP_AT_RATED_TEMP: f64 = 4.8;
const BASE_COP_AT_LOW_TEMP: f64 = 2.2;
const RATED_TEMP: f64 = 47.;
const LOW_TEMP: f64 = 17.;
const BASE_COP_SLOPE_ABOVE_LOW_TEMP: f64 = 0.0867;
const BASE_COP_SLOPE_BELOW_LOW_TEMP: f64 = 0.02;
/// Unscaled curve floor; resistance heat is COP 1.0, a running compressor always beats it.
pub const BASE_COP_FLOOR: f64 = 1.2;

/// Shape of the COP curve before calibration to an HSPF2 rating.
pub fn base_cop(outdoor_temp: f64) -> f64 {
    if outdoor_temp >= RATED_TEMP {
        BASE_COP_AT_RATED_TEMP
    } else if outdoor_temp >= LOW_TEMP {
        BASE_COP_AT_RATED_TEMP - (RATED_TEMP - outdoor_temp) * BASE_COP_SLOPE_ABOVE_LOW_TEMP
    } else {
        (BASE_COP_AT_LOW_TEMP - (LOW_TEMP - outdoor_temp) * BASE_COP_SLOPE_BELOW_LOW_TEMP)
            .max(BASE_COP_FLOOR)
    }
}

/// Bin-hour weighted average of `cop` over the standard heating season.
pub fn bin_weighted_seasonal_average(cop: impl Fn(f64) -> f64) -> f64 {
    let (weighted, hours) = HSPF2_BIN_HOURS
        .iter()
        .fold((0., 0.), |(weighted, hours), (temp, bin_hours)| {
            (weighted + cop(*temp) * bin_hours, hours + bin_hours)
        });
    weighted / hours
}

static BASE_SEASONAL_COP: LazyLock<f64> =
    LazyLock::new(|| bin_weighted_seasonal_average(base_cop));

/// Seasonal average of the uncalibrated curve, computed once per process.
pub fn base_seasonal_cop() -> f64 {
    *BASE_SEASONAL_COP
}

/// COP at `outdoor_temp` for a heat pump rated at `hspf2`.
pub fn cop(outdoor_temp: f64, hspf2: f64) -> f64 {
    base_cop(outdoor_temp) * seasonal_rating_to_cop(hspf2) / base_seasonal_cop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(70., 4.8)]
    #[case(47., 4.8)]
    #[case(32., 3.4995)]
    #[case(17., 2.199)]
    #[case(7., 2.0)]
    #[case(-13., 1.6)]
    #[case(-30., 1.26)]
    #[case(-33., 1.2)]
    #[case(-100., 1.2)]
    fn should_follow_base_curve_shape(#[case] temp: f64, #[case] expected: f64) {
        assert_relative_eq!(base_cop(temp), expected, epsilon = 1e-9);
    }

    #[rstest]
    fn should_never_drop_base_curve_below_floor() {
        for temp in -100..=100 {
            assert!(base_cop(temp as f64) >= BASE_COP_FLOOR);
        }
    }

    #[rstest]
    fn should_memoize_base_seasonal_cop() {
        let expected = bin_weighted_seasonal_average(base_cop);
        assert_eq!(base_seasonal_cop(), expected);
        assert_eq!(base_seasonal_cop(), base_seasonal_cop());
        assert_relative_eq!(expected, 3.6848233666, epsilon = 1e-9);
    }

    #[rstest]
    #[case(6.)]
    #[case(7.5)]
    #[case(9.)]
    #[case(10.5)]
    #[case(13.)]
    fn should_reproduce_rated_hspf2_over_standard_season(#[case] hspf2: f64) {
        let seasonal = bin_weighted_seasonal_average(|temp| cop(temp, hspf2));
        assert_relative_eq!(seasonal, hspf2 * 1000. / 3412.14, max_relative = 1e-12);
    }

    #[rstest]
    fn should_scale_in_proportion_to_rating() {
        assert_relative_eq!(cop(25., 12.), 2. * cop(25., 6.), max_relative = 1e-12);
    }

    #[rstest]
    fn should_decrease_with_falling_temperature() {
        let mut previous = cop(70., 9.);
        for temp in (-40..70).rev() {
            let current = cop(temp as f64, 9.);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[rstest]
    fn should_be_idempotent() {
        assert_eq!(cop(12.3, 8.5), cop(12.3, 8.5));
    }
}

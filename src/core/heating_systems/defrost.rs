use crate::core::validation::DEFAULT_RELATIVE_HUMIDITY;

/// Extra electrical draw caused by outdoor-coil defrost cycles, as a multiplier in [1, 2].
///
/// Frost builds fastest just above freezing in humid air, so the penalty peaks between 36°F and
/// 40°F and grows with humidity. It tapers off above 45°F, where the coil stays clear, and below
/// 20°F, where the air holds less moisture, without ever vanishing in the cold.

pub const MIN_PENALTY: f64 = 1.;
pub const MAX_PENALTY: f64 = 2.;

/// Weighting (0-1) of the defrost penalty by outdoor temperature.
fn temperature_weighting(outdoor_temp: f64) -> f64 {
    match outdoor_temp {
        t if (36. ..=40.).contains(&t) => 1.,
        t if t > 40. && t <= 45. => 1. - ((t - 40.) / 5.) * 0.5,
        t if t > 45. && t <= 50. => 0.5 - ((t - 45.) / 5.) * 0.4,
        t if t > 50. => 0.1,
        t if (32. ..36.).contains(&t) => 1. - ((36. - t) / 4.) * 0.1,
        t if (20. ..32.).contains(&t) => 0.9 - ((32. - t) / 12.) * 0.3,
        t => (0.6 - ((20. - t) / 30.) * 0.4).max(0.2),
    }
}

fn in_peak_band(outdoor_temp: f64) -> bool {
    (36. ..=40.).contains(&outdoor_temp)
}

/// Penalty fraction at full weighting and 100% humidity.
fn base_penalty(outdoor_temp: f64, saturation: f64) -> f64 {
    if in_peak_band(outdoor_temp) && saturation >= 0.9 {
        0.20
    } else if in_peak_band(outdoor_temp) && saturation >= 0.8 {
        0.18
    } else {
        0.15
    }
}

/// Defrost penalty multiplier for an outdoor temperature (°F) and relative humidity (0-100).
pub fn defrost_penalty(outdoor_temp: f64, relative_humidity: f64) -> f64 {
    let relative_humidity = if relative_humidity.is_finite() {
        relative_humidity
    } else {
        DEFAULT_RELATIVE_HUMIDITY
    };
    let saturation = (relative_humidity / 100.).clamp(0., 1.);
    let weighting = temperature_weighting(outdoor_temp);

    let mut penalty = base_penalty(outdoor_temp, saturation) * saturation * weighting;
    if saturation >= 0.95 && (32. ..=42.).contains(&outdoor_temp) {
        penalty += (saturation - 0.95) * 0.10 * weighting;
    }

    // max/min rather than clamp so a NaN temperature still lands in range
    (1. + penalty).max(MIN_PENALTY).min(MAX_PENALTY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(38., 95., 1.19)]
    #[case(38., 100., 1.205)]
    #[case(38., 85., 1.153)]
    #[case(38., 70., 1.105)]
    #[case(42., 70., 1.084)]
    #[case(45., 70., 1.0525)]
    #[case(34., 70., 1.0997500)]
    #[case(26., 70., 1.07875)]
    #[case(20., 70., 1.063)]
    #[case(-10., 70., 1.021)]
    #[case(70., 70., 1.0105)]
    fn should_calc_defrost_penalty(
        #[case] temp: f64,
        #[case] humidity: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(defrost_penalty(temp, humidity), expected, epsilon = 1e-9);
    }

    #[rstest]
    fn should_peak_in_humid_mid_thirties() {
        let peak = defrost_penalty(38., 100.);
        for temp in -30..=80 {
            assert!(defrost_penalty(temp as f64, 100.) <= peak);
        }
    }

    #[rstest]
    fn should_taper_but_not_vanish_in_the_cold() {
        assert!(defrost_penalty(10., 70.) < defrost_penalty(30., 70.));
        assert!(defrost_penalty(-40., 70.) > 1.);
        assert_eq!(
            temperature_weighting(-40.),
            0.2,
            "weighting floors in the cold"
        );
    }

    #[rstest]
    fn should_stay_within_bounds_for_non_finite_temperature() {
        assert_relative_eq!(defrost_penalty(f64::NAN, 70.), 1.021, epsilon = 1e-9);
        assert_relative_eq!(defrost_penalty(f64::INFINITY, 70.), 1.0105, epsilon = 1e-9);
    }

    #[rstest]
    fn should_have_no_penalty_in_dry_air() {
        assert_eq!(defrost_penalty(38., 0.), 1.);
    }

    #[rstest]
    fn should_be_continuous_either_side_of_45f() {
        assert_relative_eq!(
            defrost_penalty(45., 80.),
            defrost_penalty(45.000001, 80.),
            epsilon = 1e-6
        );
        assert_relative_eq!(temperature_weighting(45.), 0.5);
        assert!(temperature_weighting(45.1) < 0.5);
    }

    #[rstest]
    #[case(20.)]
    #[case(32.)]
    #[case(36.)]
    #[case(40.)]
    #[case(50.)]
    fn should_be_continuous_at_weighting_breakpoints(#[case] breakpoint: f64) {
        assert_relative_eq!(
            temperature_weighting(breakpoint - 1e-7),
            temperature_weighting(breakpoint + 1e-7),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn should_stay_within_bounds_for_any_conditions() {
        for temp in -60..=120 {
            for humidity in [-50., 0., 35., 80., 90., 95., 100., 250., f64::NAN] {
                let penalty = defrost_penalty(temp as f64, humidity);
                assert!(
                    (MIN_PENALTY..=MAX_PENALTY).contains(&penalty),
                    "{temp} {humidity} {penalty}"
                );
            }
        }
    }
}

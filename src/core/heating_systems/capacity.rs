/// Capacity of an air-source heat pump relative to its rated capacity at 47°F.
///
/// Derates linearly to 64% at 17°F and then by a further 1% per °F, never below zero. At or
/// below `cutoff_temp` the compressor is locked out and delivers nothing.

pub const RATED_TEMP: f64 = 47.;
pub const LOW_TEMP_TEST_POINT: f64 = 17.;
pub const CAPACITY_AT_LOW_TEMP_TEST_POINT: f64 = 0.64;
const DERATE_PER_DEGREE_BELOW_LOW_TEMP: f64 = 0.01;

/// Fraction of rated capacity the compressor could deliver, ignoring lockout.
pub fn available_capacity_fraction(outdoor_temp: f64) -> f64 {
    if outdoor_temp >= RATED_TEMP {
        1.
    } else if outdoor_temp >= LOW_TEMP_TEST_POINT {
        let derate_per_degree =
            (1. - CAPACITY_AT_LOW_TEMP_TEST_POINT) / (RATED_TEMP - LOW_TEMP_TEST_POINT);
        1. - (RATED_TEMP - outdoor_temp) * derate_per_degree
    } else {
        (CAPACITY_AT_LOW_TEMP_TEST_POINT
            - (LOW_TEMP_TEST_POINT - outdoor_temp) * DERATE_PER_DEGREE_BELOW_LOW_TEMP)
            .max(0.)
    }
}

/// Capacity fraction in [0, 1], zero at or below the lockout temperature.
pub fn capacity_fraction(outdoor_temp: f64, cutoff_temp: f64) -> f64 {
    if outdoor_temp <= cutoff_temp {
        return 0.;
    }
    available_capacity_fraction(outdoor_temp).clamp(0., 1.)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const DEFAULT_CUTOFF: f64 = -15.;

    #[rstest]
    #[case(60.)]
    #[case(47.)]
    #[case(100.)]
    fn should_deliver_full_capacity_at_or_above_rated_temp(#[case] temp: f64) {
        assert_eq!(capacity_fraction(temp, DEFAULT_CUTOFF), 1.);
    }

    #[rstest]
    #[case(17., 0.64)]
    #[case(32., 0.82)]
    #[case(7., 0.54)]
    #[case(-10., 0.37)]
    fn should_derate_capacity(#[case] temp: f64, #[case] expected: f64) {
        assert_relative_eq!(
            capacity_fraction(temp, DEFAULT_CUTOFF),
            expected,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_never_go_negative_without_lockout() {
        assert_eq!(available_capacity_fraction(-60.), 0.);
        assert_eq!(capacity_fraction(-60., -100.), 0.);
    }

    #[rstest]
    #[case(-15.)]
    #[case(-15.5)]
    #[case(-40.)]
    fn should_lock_out_at_or_below_cutoff(#[case] temp: f64) {
        assert_eq!(capacity_fraction(temp, DEFAULT_CUTOFF), 0.);
    }

    #[rstest]
    fn should_lock_out_at_custom_cutoff() {
        assert_eq!(capacity_fraction(5., 5.), 0.);
        assert!(capacity_fraction(5.1, 5.) > 0.);
    }

    #[rstest]
    fn should_stay_within_unit_interval() {
        for tenth in -800..=1200 {
            let fraction = capacity_fraction(tenth as f64 / 10., DEFAULT_CUTOFF);
            assert!((0. ..=1.).contains(&fraction), "{fraction}");
        }
    }

    #[rstest]
    fn should_be_continuous_at_breakpoints() {
        assert_relative_eq!(available_capacity_fraction(46.9999999), 1., epsilon = 1e-6);
        assert_relative_eq!(
            available_capacity_fraction(16.9999999),
            available_capacity_fraction(17.),
            epsilon = 1e-6
        );
    }
}

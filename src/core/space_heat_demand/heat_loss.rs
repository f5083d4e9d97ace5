use crate::core::diagnostics::{Diagnostic, DiagnosticSink, InputField};
use crate::core::units::DESIGN_DELTA_T_FAHRENHEIT;
use crate::input::{BuildingProfile, HeatLossOverride};

/// This module estimates a building's design heat loss (BTU/hr at a 70°F indoor-outdoor
/// difference) from its floor area, insulation, shape and ceiling height.

/// Design heat loss per square foot of an average-insulated, simply shaped, 8 ft ceiling home.
const BASE_BTU_PER_SQUARE_FOOT: f64 = 22.67;
const REFERENCE_CEILING_HEIGHT_FT: f64 = 8.;
const CEILING_MULTIPLIER_PER_FOOT: f64 = 0.1;

/// Shape multipliers in this range describe a cabin / A-frame with a pitched interior.
const CABIN_SHAPE_RANGE: std::ops::Range<f64> = 1.2..1.3;
const LOFT_AREA_FRACTION: f64 = 0.35;
const LOFT_EXPOSURE_REDUCTION: f64 = 0.5;

/// Building inputs that passed validation.
struct Geometry {
    square_feet: f64,
    insulation_level: f64,
    home_shape: f64,
    ceiling_height: f64,
    wall_height: Option<f64>,
    has_loft: bool,
}

impl Geometry {
    fn validated(building: &BuildingProfile) -> Result<Self, (InputField, f64)> {
        let check = |field: InputField, value: f64| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err((field, value))
            }
        };

        Ok(Self {
            square_feet: check(InputField::SquareFeet, building.square_feet)?,
            insulation_level: check(InputField::InsulationLevel, building.insulation_level)?,
            home_shape: check(InputField::HomeShape, building.home_shape)?,
            ceiling_height: check(InputField::CeilingHeight, building.ceiling_height)?,
            wall_height: building
                .wall_height
                .map(|height| check(InputField::WallHeight, height))
                .transpose()?,
            has_loft: building.has_loft,
        })
    }

    fn is_cabin(&self) -> bool {
        CABIN_SHAPE_RANGE.contains(&self.home_shape)
    }

    fn effective_square_feet(&self) -> f64 {
        if self.is_cabin() && self.has_loft {
            self.square_feet * (1. - LOFT_AREA_FRACTION * LOFT_EXPOSURE_REDUCTION)
        } else {
            self.square_feet
        }
    }

    fn ceiling_multiplier(&self) -> f64 {
        1. + (self.ceiling_height - REFERENCE_CEILING_HEIGHT_FT) * CEILING_MULTIPLIER_PER_FOOT
    }

    fn shape_multiplier(&self) -> f64 {
        if self.is_cabin() {
            self.home_shape.max(self.cabin_envelope_ratio())
        } else {
            self.home_shape
        }
    }

    /// Ratio of a gabled envelope (walls, gable ends and two roof planes) to the envelope of
    /// the same square footprint with its walls under a flat ceiling.
    ///
    /// For cabins the ceiling height is taken to be the interior peak.
    fn cabin_envelope_ratio(&self) -> f64 {
        let footprint = if self.has_loft {
            self.square_feet * (1. - LOFT_AREA_FRACTION)
        } else {
            self.square_feet
        };
        if footprint <= 0. {
            return 1.;
        }

        let peak_height = self.ceiling_height.max(0.);
        let wall_height = self
            .wall_height
            .unwrap_or(REFERENCE_CEILING_HEIGHT_FT)
            .clamp(0., peak_height);
        let rise = peak_height - wall_height;

        let side = footprint.sqrt();
        let walls = 4. * side * wall_height;
        let gables = 2. * (0.5 * side * rise);
        let roof_planes = 2. * side * ((side / 2.).powi(2) + rise.powi(2)).sqrt();
        let reference = walls + footprint;

        (walls + gables + roof_planes) / reference
    }
}

/// Design heat loss in BTU/hr, rounded to the nearest 1000.
///
/// Non-finite inputs give a heat loss of zero, as does any combination producing a negative
/// estimate.
pub fn calculate_heat_loss(building: &BuildingProfile, diagnostics: &dyn DiagnosticSink) -> f64 {
    let geometry = match Geometry::validated(building) {
        Ok(geometry) => geometry,
        Err((field, value)) => {
            diagnostics.report(Diagnostic::InvalidHeatLossInput { field, value });
            return 0.;
        }
    };

    let raw = geometry.effective_square_feet()
        * BASE_BTU_PER_SQUARE_FOOT
        * geometry.insulation_level
        * geometry.shape_multiplier()
        * geometry.ceiling_multiplier();

    ((raw / 1000.).round() * 1000.).max(0.)
}

/// Design heat loss (BTU/hr at the 70°F design difference) for a building, preferring a
/// measured loss rate over the geometric estimate when one is given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DesignHeatLoss {
    Measured(f64),
    Estimated(f64),
}

impl DesignHeatLoss {
    pub fn resolve(
        measured: Option<HeatLossOverride>,
        building: &BuildingProfile,
        diagnostics: &dyn DiagnosticSink,
    ) -> Self {
        let measured_btu_per_degree = measured.map(|measured| match measured {
            HeatLossOverride::Manual(rate) | HeatLossOverride::Analyzer(rate) => rate,
        });

        match measured_btu_per_degree {
            Some(rate) if rate.is_finite() && rate > 0. => {
                Self::Measured(rate * DESIGN_DELTA_T_FAHRENHEIT)
            }
            _ => Self::Estimated(calculate_heat_loss(building, diagnostics)),
        }
    }

    pub fn btu_per_hour(&self) -> f64 {
        match self {
            Self::Measured(btu_per_hour) | Self::Estimated(btu_per_hour) => *btu_per_hour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::RecordingDiagnostics;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn heat_loss(building: &BuildingProfile) -> f64 {
        calculate_heat_loss(building, &RecordingDiagnostics::new())
    }

    #[rstest]
    fn should_calc_heat_loss_for_reference_home() {
        let building = BuildingProfile::new(2000., 1., 1., 8.);
        // 2000 * 22.67 = 45,340
        assert_eq!(heat_loss(&building), 45_000.);
        assert!(heat_loss(&building) > 10_000.);
    }

    #[rstest]
    #[case(1500., 0.65, 0.9, 8., 20_000.)]
    #[case(1500., 1.4, 1.1, 8., 52_000.)]
    #[case(2000., 1., 1., 10., 54_000.)]
    #[case(2000., 1., 1., 7., 41_000.)]
    #[case(0., 1., 1., 8., 0.)]
    fn should_calc_heat_loss(
        #[case] square_feet: f64,
        #[case] insulation: f64,
        #[case] shape: f64,
        #[case] ceiling: f64,
        #[case] expected: f64,
    ) {
        let building = BuildingProfile::new(square_feet, insulation, shape, ceiling);
        let result = heat_loss(&building);
        assert_eq!(result, expected);
        assert_eq!(result % 1000., 0.);
    }

    #[rstest]
    fn should_not_return_negative_heat_loss() {
        assert_eq!(heat_loss(&BuildingProfile::new(-2000., 1., 1., 8.)), 0.);
        assert_eq!(heat_loss(&BuildingProfile::new(2000., 1., 1., -4.)), 0.);
    }

    #[rstest]
    #[case(BuildingProfile::new(f64::NAN, 1., 1., 8.), InputField::SquareFeet)]
    #[case(BuildingProfile::new(2000., f64::INFINITY, 1., 8.), InputField::InsulationLevel)]
    #[case(BuildingProfile::new(2000., 1., f64::NAN, 8.), InputField::HomeShape)]
    #[case(BuildingProfile::new(2000., 1., 1., f64::NEG_INFINITY), InputField::CeilingHeight)]
    #[case(BuildingProfile { wall_height: Some(f64::NAN), ..BuildingProfile::new(2000., 1., 1.25, 8.) }, InputField::WallHeight)]
    fn should_return_zero_and_report_invalid_inputs(
        #[case] building: BuildingProfile,
        #[case] field: InputField,
    ) {
        let diagnostics = RecordingDiagnostics::new();
        assert_eq!(calculate_heat_loss(&building, &diagnostics), 0.);
        let reported = diagnostics.diagnostics();
        assert_eq!(reported.len(), 1);
        assert!(matches!(
            reported[0],
            Diagnostic::InvalidHeatLossInput { field: reported_field, .. } if reported_field == field
        ));
    }

    #[rstest]
    fn should_keep_shape_multiplier_for_cabin_with_flat_ceiling() {
        // peak equal to wall height: envelope ratio is exactly 1, below the 1.25 constant
        let cabin = BuildingProfile::new(1000., 1., 1.25, 8.);
        assert_eq!(heat_loss(&cabin), (1000. * 22.67 * 1.25f64 / 1000.).round() * 1000.);
    }

    #[rstest]
    fn should_raise_shape_multiplier_for_steep_roof_cabin() {
        let steep = BuildingProfile {
            wall_height: Some(4.),
            ..BuildingProfile::new(900., 1., 1.2, 20.)
        };
        let geometry = Geometry::validated(&steep).unwrap();
        // side 30 ft, rise 16 ft: walls 480, gables 480, roof 2*30*sqrt(225+256) = 1315.86,
        // reference 480 + 900
        let expected_ratio = (480. + 480. + 60. * 481f64.sqrt()) / 1380.;
        assert!((geometry.cabin_envelope_ratio() - expected_ratio).abs() < 1e-9);
        assert!(geometry.shape_multiplier() > 1.2);
        assert_eq!(geometry.shape_multiplier(), expected_ratio);
    }

    #[rstest]
    fn should_ignore_geometry_outside_cabin_range() {
        let steep_but_not_cabin = BuildingProfile {
            wall_height: Some(4.),
            ..BuildingProfile::new(900., 1., 1.1, 20.)
        };
        let geometry = Geometry::validated(&steep_but_not_cabin).unwrap();
        assert_eq!(geometry.shape_multiplier(), 1.1);
    }

    #[rstest]
    fn should_discount_loft_area_for_cabins_only() {
        let cabin = BuildingProfile::new(2000., 1., 1.25, 8.);
        let cabin_with_loft = BuildingProfile {
            has_loft: true,
            ..cabin.clone()
        };
        let geometry = Geometry::validated(&cabin_with_loft).unwrap();
        assert!((geometry.effective_square_feet() - 1650.).abs() < 1e-9);
        assert!(heat_loss(&cabin_with_loft) < heat_loss(&cabin));

        let house_with_loft = BuildingProfile {
            has_loft: true,
            ..BuildingProfile::new(2000., 1., 1., 8.)
        };
        assert_eq!(heat_loss(&house_with_loft), 45_000.);
    }

    #[rstest]
    #[case(Some(HeatLossOverride::Manual(500.)), DesignHeatLoss::Measured(35_000.))]
    #[case(Some(HeatLossOverride::Analyzer(650.)), DesignHeatLoss::Measured(45_500.))]
    #[case(Some(HeatLossOverride::Manual(0.)), DesignHeatLoss::Estimated(45_000.))]
    #[case(Some(HeatLossOverride::Analyzer(f64::NAN)), DesignHeatLoss::Estimated(45_000.))]
    #[case(None, DesignHeatLoss::Estimated(45_000.))]
    fn should_resolve_design_heat_loss(
        #[case] measured: Option<HeatLossOverride>,
        #[case] expected: DesignHeatLoss,
    ) {
        let building = BuildingProfile::new(2000., 1., 1., 8.);
        let resolved = DesignHeatLoss::resolve(measured, &building, &RecordingDiagnostics::new());
        assert_eq!(resolved, expected);
        assert_eq!(resolved.btu_per_hour(), expected.btu_per_hour());
    }
}

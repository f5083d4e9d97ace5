pub const BTU_PER_KILOWATT_HOUR: f64 = 3412.14;
pub const BTU_PER_HOUR_PER_TON: f64 = 12_000.;
pub const WATT_HOURS_PER_KILOWATT_HOUR: f64 = 1_000.;
pub const HOURS_PER_DAY: u32 = 24;
pub const FEET_PER_KILOFOOT: f64 = 1_000.;

/// Indoor-outdoor temperature difference (°F) at which design heat loss is quoted.
pub const DESIGN_DELTA_T_FAHRENHEIT: f64 = 70.;

/// Converts a heat quantity in BTU to its electrical equivalent in kWh (resistive, COP 1).
pub fn btu_to_kwh(btu: f64) -> f64 {
    btu / BTU_PER_KILOWATT_HOUR
}

/// Building heat loss rate per degree of indoor-outdoor difference, in BTU/hr/°F.
pub fn btu_per_hour_per_degree(design_heat_loss_btu_hr: f64) -> f64 {
    if design_heat_loss_btu_hr > 0. {
        design_heat_loss_btu_hr / DESIGN_DELTA_T_FAHRENHEIT
    } else {
        0.
    }
}

/// Seasonal efficiency rating (HSPF2/SEER2, in BTU per Wh) expressed as a coefficient of performance.
pub fn seasonal_rating_to_cop(rating: f64) -> f64 {
    rating * WATT_HOURS_PER_KILOWATT_HOUR / BTU_PER_KILOWATT_HOUR
}

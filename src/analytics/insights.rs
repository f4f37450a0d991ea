//! Numeric helpers for insight derivation.
//!
//! All thresholds elsewhere compare the *rounded* magnitude, matching the
//! fixed-decimal value shown to the user.

/// Rounds half away from zero at `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Month-over-month change as a percentage, rounded to one decimal place.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    round_to((current - previous) / previous * 100.0, 1)
}

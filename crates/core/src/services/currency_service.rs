use crate::models::holding::Currency;

/// Multiplier that converts an amount denominated in `asset` currency
/// into `base` currency, given the USD→TWD reference rate.
///
/// Only the two-currency USD/TWD system is modeled; this is an inherited
/// simplification of the domain, not a gap.
pub fn rate_multiplier(asset: Currency, base: Currency, usd_to_twd: f64) -> f64 {
    match (asset, base) {
        (Currency::Usd, Currency::Twd) => usd_to_twd,
        (Currency::Twd, Currency::Usd) => {
            // Zero-rate guard: identity beats dividing by zero.
            if usd_to_twd > 0.0 {
                1.0 / usd_to_twd
            } else {
                1.0
            }
        }
        // Same currency on both sides.
        _ => 1.0,
    }
}

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits every monetary field is stored with.
pub const SCALE: u32 = 8;

/// Rescales `value` to exactly [`SCALE`] fractional digits, rounding half away from zero.
pub fn with_scale(value: Decimal) -> Decimal {
    let mut scaled = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    scaled.rescale(SCALE);
    scaled
}

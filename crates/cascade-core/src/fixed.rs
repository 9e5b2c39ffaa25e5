use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every time value inside the engine (clock, fault arrivals, trip
/// deadlines, relay constants, edge lengths) is carried in this type so that
/// comparisons at tick boundaries are exact and platform independent.
pub type Fixed64 = I32F32;

/// Tick index. The simulation clock is `tick * step`.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and export.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Simulated time at the start of `tick` for a clock advancing by `step`.
///
/// Saturates at [`Fixed64::MAX`] instead of wrapping, so a clock that runs
/// past the representable range keeps comparing as "later than everything".
#[inline]
pub fn time_at(step: Fixed64, tick: Ticks) -> Fixed64 {
    let tick = Fixed64::checked_from_num(tick).unwrap_or(Fixed64::MAX);
    step.saturating_mul(tick)
}

/// Number of whole steps that fit in `max_time`, the way a fixed-step run
/// derives its tick count. Returns 0 for a non-positive step.
pub fn ticks_for(max_time: Fixed64, step: Fixed64) -> Ticks {
    if step <= Fixed64::ZERO || max_time <= Fixed64::ZERO {
        return 0;
    }
    match max_time.checked_div(step) {
        Some(q) => q.to_num::<i64>().max(0) as Ticks,
        None => 0,
    }
}

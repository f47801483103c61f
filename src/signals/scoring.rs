//! Score normalization helpers shared by the normalization strategies

/// Clip a value into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clip a value into [-1, 1]; NaN maps to 0.
pub fn clamp_signed(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-1.0, 1.0)
}

/// Normalize a value to the -1 to +1 range
///
/// For indicators that output values in different ranges, this converts them
/// to a standardized -1 (at `min`) to +1 (at `max`) scale
pub fn normalize_score(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.0;
    }
    clamp_signed(2.0 * ((value - min) / (max - min)) - 1.0)
}

/// Distance of an oscillator value from the midpoint of `[min, max]`,
/// as a fraction of the half range, in [0, 1]
pub fn distance_from_midpoint(value: f64, min: f64, max: f64) -> f64 {
    normalize_score(value, min, max).abs()
}

/// Relative spread of a fast line over a slow line
///
/// Returns 0 when the reference is zero.
pub fn relative_spread(fast: f64, slow: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    (fast - slow) / reference.abs()
}

/// Signed position of price inside an envelope
///
/// 0 at the middle band, +1 at the upper band, -1 at the lower band, beyond
/// ±1 outside the bands. Returns `None` for a degenerate band.
pub fn band_position(price: f64, lower: f64, middle: f64, upper: f64) -> Option<f64> {
    if price >= middle {
        let half_width = upper - middle;
        (half_width > 0.0).then(|| (price - middle) / half_width)
    } else {
        let half_width = middle - lower;
        (half_width > 0.0).then(|| (price - middle) / half_width)
    }
}

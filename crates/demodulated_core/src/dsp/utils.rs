/// Peak output voltage of every voice.
pub const OUTPUT_SCALE: f32 = 5.0;

/// Wrap a phase into `[0, 1)` using floor subtraction.
///
/// For tiny negative inputs `x - floor(x)` rounds to exactly 1.0; that case
/// folds back to 0.0. Non-finite inputs yield NaN.
#[inline]
pub fn wrap_unit(x: f32) -> f32 {
    let wrapped = x - x.floor();
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Sine of an angle in radians.
#[inline]
pub fn sine_radians(angle: f32) -> f32 {
    angle.sin()
}

pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

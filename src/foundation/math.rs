pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Pixel size of the axis-aligned box enclosing a `width`x`height` bitmap rotated by
/// `angle_deg` about its centre.
///
/// The compositor and the CPU rasterizer must agree on this box, so both go through here.
pub(crate) fn rotated_bounds(width: u32, height: u32, angle_deg: f64) -> (u32, u32) {
    let rad = angle_deg.to_radians();
    let (s, c) = (rad.sin().abs(), rad.cos().abs());
    let w = f64::from(width);
    let h = f64::from(height);
    let rw = (w * c + h * s).round().max(1.0);
    let rh = (w * s + h * c).round().max(1.0);
    (rw as u32, rh as u32)
}

/// True when `angle_deg` is a whole number of turns.
pub(crate) fn is_full_turn(angle_deg: f64) -> bool {
    (angle_deg % 360.0).abs() < 1e-9
}

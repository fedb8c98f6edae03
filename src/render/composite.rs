use crate::foundation::error::{LenticularError, LenticularResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = src[i].saturating_add(dc);
    }
    out
}

/// Draw a `src_w`x`src_h` premultiplied buffer over `dst` with its top-left at `(x, y)`.
///
/// Pixels falling outside `dst` are clipped.
pub fn over_at(
    dst: &mut [u8],
    (dst_w, dst_h): (u32, u32),
    src: &[u8],
    (src_w, src_h): (u32, u32),
    (x, y): (i64, i64),
) -> LenticularResult<()> {
    if dst.len() != dst_w as usize * dst_h as usize * 4
        || src.len() != src_w as usize * src_h as usize * 4
    {
        return Err(LenticularError::render(
            "over_at expects buffers matching width*height*4",
        ));
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(i64::from(src_w)).min(i64::from(dst_w));
    let y1 = y.saturating_add(i64::from(src_h)).min(i64::from(dst_h));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        for dx in x0..x1 {
            let sx = (dx - x) as usize;
            let si = (sy * src_w as usize + sx) * 4;
            let di = (dy as usize * dst_w as usize + dx as usize) * 4;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

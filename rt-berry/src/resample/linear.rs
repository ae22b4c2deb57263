use crate::data::{Rounding, Volume3D, Voxel};
use crate::geometry::Point3D;

/// 单个轴上的插值参数: 两个相邻下标与靠近 `hi` 的权重.
#[derive(Copy, Clone, Debug, PartialEq)]
struct AxisWeight {
    lo: usize,
    hi: usize,
    frac: f64,
}

impl AxisWeight {
    /// 计算连续坐标 `c` 在长度为 `dim` 的轴上的插值参数.
    ///
    /// - `c` 不在 `[-0.5, dim - 0.5)` 内 (包括 `NaN`) 时返回 `None`;
    /// - `c < 0` 或 `c >= dim - 1` 时位于边界带, 下标被夹到首/末体素, 权重为 0.
    fn new(c: f64, dim: usize) -> Option<Self> {
        if !(c >= -0.5 && c < dim as f64 - 0.5) {
            return None;
        }
        let last = dim - 1;
        let ans = if c < 0.0 {
            Self::clamped(0)
        } else if c >= last as f64 {
            Self::clamped(last)
        } else {
            let lo = c.floor() as usize;
            Self {
                lo,
                hi: (lo + 1).min(last),
                frac: c - lo as f64,
            }
        };
        Some(ans)
    }

    #[inline]
    fn clamped(i: usize) -> Self {
        Self {
            lo: i,
            hi: i,
            frac: 0.0,
        }
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// 在输入体素坐标 `p` 处做三线性采样.
pub(super) fn sample<T: Voxel>(input: &Volume3D<T>, p: Point3D, outside: T, rounding: Rounding) -> T {
    let [dx, dy, dz] = input.geometry().dim();
    let (Some(wx), Some(wy), Some(wz)) = (
        AxisWeight::new(p.x, dx),
        AxisWeight::new(p.y, dy),
        AxisWeight::new(p.z, dz),
    ) else {
        return outside;
    };
    let data = input.array();
    let v = |x: usize, y: usize, z: usize| data[(z, y, x)].as_f64();

    let c00 = lerp(v(wx.lo, wy.lo, wz.lo), v(wx.hi, wy.lo, wz.lo), wx.frac);
    let c10 = lerp(v(wx.lo, wy.hi, wz.lo), v(wx.hi, wy.hi, wz.lo), wx.frac);
    let c01 = lerp(v(wx.lo, wy.lo, wz.hi), v(wx.hi, wy.lo, wz.hi), wx.frac);
    let c11 = lerp(v(wx.lo, wy.hi, wz.hi), v(wx.hi, wy.hi, wz.hi), wx.frac);
    let c0 = lerp(c00, c10, wy.frac);
    let c1 = lerp(c01, c11, wy.frac);
    T::from_f64(lerp(c0, c1, wz.frac), rounding)
}

#[cfg(test)]
mod tests {
    use super::AxisWeight;

    #[test]
    fn test_axis_weight() {
        assert_eq!(AxisWeight::new(-0.6, 4), None);
        assert_eq!(AxisWeight::new(-0.2, 4), Some(AxisWeight::clamped(0)));
        assert_eq!(
            AxisWeight::new(1.25, 4),
            Some(AxisWeight {
                lo: 1,
                hi: 2,
                frac: 0.25
            })
        );
        assert_eq!(AxisWeight::new(3.0, 4), Some(AxisWeight::clamped(3)));
        assert_eq!(AxisWeight::new(3.4, 4), Some(AxisWeight::clamped(3)));
        assert_eq!(AxisWeight::new(3.5, 4), None);
        assert_eq!(AxisWeight::new(0.2, 1), Some(AxisWeight::clamped(0)));
    }
}

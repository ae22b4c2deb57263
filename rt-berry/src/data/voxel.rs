//! 体素数值类型.

/// 浮点数转换为整数体素时的舍入方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Rounding {
    /// 四舍六入五成双 (银行家舍入).
    #[default]
    HalfEven,

    /// 四舍五入, `.5` 远离零.
    HalfAwayFromZero,
}

impl Rounding {
    /// 按当前方式舍入 `v`.
    #[inline]
    pub fn round(self, v: f64) -> f64 {
        match self {
            Self::HalfEven => v.round_ties_even(),
            Self::HalfAwayFromZero => v.round(),
        }
    }
}

/// 可存入 [`crate::Volume3D`] 的体素类型.
///
/// 整数类型从 `f64` 转换时先按 [`Rounding`] 舍入, 再饱和到该类型的取值范围
/// (`NaN` 变为 0). 浮点类型直接转换, 忽略舍入方式.
pub trait Voxel: Copy + Default + PartialOrd + Send + Sync + 'static {
    /// 是否是整数类型.
    const IS_INTEGER: bool;

    /// 按 `rounding` 将 `v` 转换为该体素类型, 超出范围时饱和.
    fn from_f64(v: f64, rounding: Rounding) -> Self;

    /// 转换为 `f64`.
    fn as_f64(self) -> f64;
}

macro_rules! impl_integer_voxel {
    ($($t: ty),*) => {
        $(
            impl Voxel for $t {
                const IS_INTEGER: bool = true;

                #[inline]
                fn from_f64(v: f64, rounding: Rounding) -> Self {
                    // `as` 对浮点到整数的转换本身是饱和的.
                    rounding.round(v) as $t
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

macro_rules! impl_float_voxel {
    ($($t: ty),*) => {
        $(
            impl Voxel for $t {
                const IS_INTEGER: bool = false;

                #[inline]
                fn from_f64(v: f64, _: Rounding) -> Self {
                    v as $t
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_integer_voxel!(u8, i16, u16, i32);
impl_float_voxel!(f32, f64);

/// 将 `v` 四舍五入 (远离零) 并饱和到 `u8`.
#[inline]
pub fn clamp_to_byte(v: f64) -> u8 {
    u8::from_f64(v, Rounding::HalfAwayFromZero)
}

/// 将 `v` 四舍五入 (远离零) 并饱和到 `i16`.
#[inline]
pub fn clamp_to_i16(v: f64) -> i16 {
    i16::from_f64(v, Rounding::HalfAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::{clamp_to_byte, clamp_to_i16, Rounding, Voxel};

    #[test]
    fn test_rounding_modes() {
        assert_eq!(u8::from_f64(2.5, Rounding::HalfEven), 2);
        assert_eq!(u8::from_f64(3.5, Rounding::HalfEven), 4);
        assert_eq!(u8::from_f64(2.5, Rounding::HalfAwayFromZero), 3);
        assert_eq!(i16::from_f64(-2.5, Rounding::HalfEven), -2);
        assert_eq!(i16::from_f64(-2.5, Rounding::HalfAwayFromZero), -3);
        assert_eq!(f32::from_f64(2.5, Rounding::HalfEven), 2.5);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(clamp_to_byte(-3.0), 0);
        assert_eq!(clamp_to_byte(255.4), 255);
        assert_eq!(clamp_to_byte(1e9), 255);
        assert_eq!(clamp_to_byte(f64::NAN), 0);
        assert_eq!(clamp_to_i16(40000.0), i16::MAX);
        assert_eq!(clamp_to_i16(-40000.0), i16::MIN);
        assert_eq!(clamp_to_i16(-0.5), -1);
        assert_eq!(i32::from_f64(f64::INFINITY, Rounding::HalfEven), i32::MAX);
    }

    fn midpoint<T: Voxel>(a: T, b: T) -> T {
        T::from_f64((a.as_f64() + b.as_f64()) / 2.0, Rounding::HalfEven)
    }

    #[test]
    fn test_generic_voxel_use() {
        assert_eq!(midpoint(3u8, 6u8), 4);
        assert_eq!(midpoint(-3i16, 6), 2);
        assert_eq!(midpoint(u16::MAX, u16::MAX), u16::MAX);
        assert_eq!(midpoint(1i32, 2), 2);
        assert_eq!(midpoint(1.0f32, 2.0), 1.5);
        assert!(!f64::IS_INTEGER && u8::IS_INTEGER);
    }
}

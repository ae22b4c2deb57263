//! 逐体素的数值运算.

use super::{clamp_to_byte, Volume, Volume3D, Voxel};
use crate::consts::mask;

/// 单次遍历求出所有体素的最小值与最大值.
///
/// 体积为空时返回 `None`. 浮点体积中的 `NaN` 不参与比较.
pub fn min_max<T: Voxel, V: Volume<T> + ?Sized>(volume: &V) -> Option<(T, T)> {
    let mut it = volume.as_slice().iter().copied();
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), p| {
        (if p < lo { p } else { lo }, if p > hi { p } else { hi })
    }))
}

/// 将所有体素截断到 `[lo, hi]` 内.
pub fn clip_to_range_in_place<T: Voxel, V: Volume<T> + ?Sized>(volume: &mut V, lo: T, hi: T) {
    for p in volume.as_slice_mut() {
        if *p < lo {
            *p = lo;
        } else if *p > hi {
            *p = hi;
        }
    }
}

/// 将 `[min, max]` 线性映射到 `[0, 255]`.
///
/// 当 `max <= min` (包括空体积) 时, 结果全为 0.
pub fn scale_to_byte_range<T: Voxel>(volume: &Volume3D<T>) -> Volume3D<u8> {
    let (lo, hi) = match min_max(volume) {
        Some((lo, hi)) if hi > lo => (lo.as_f64(), hi.as_f64()),
        _ => return volume.create_same_size(),
    };
    let scale = 255.0 / (hi - lo);
    volume.map(|p| clamp_to_byte((p.as_f64() - lo) * scale))
}

/// 生成阈值掩膜: 体素值 `>= threshold` 处为前景.
pub fn threshold<T: Voxel>(volume: &Volume3D<T>, threshold: T) -> Volume3D<u8> {
    volume.map(|&p| {
        if p >= threshold {
            mask::FOREGROUND
        } else {
            mask::BACKGROUND
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{clip_to_range_in_place, min_max, scale_to_byte_range, threshold};
    use crate::data::{Volume, Volume3D, VolumeGeometry};

    fn volume<T>(data: Vec<T>) -> Volume3D<T> {
        let g = VolumeGeometry::with_spacing([data.len(), 1, 1], [1.0; 3]).unwrap();
        Volume3D::from_vec(g, data).unwrap()
    }

    #[test]
    fn test_min_max() {
        let v = volume(vec![3i16, -7, 12, 0]);
        assert_eq!(min_max(&v), Some((-7, 12)));
        let v = volume(vec![1.5f32]);
        assert_eq!(min_max(&v), Some((1.5, 1.5)));
    }

    #[test]
    fn test_clip_in_place() {
        let mut v = volume(vec![-1000i16, -20, 0, 50, 3000]);
        clip_to_range_in_place(&mut v, -100, 200);
        assert_eq!(v.as_slice(), &[-100, -20, 0, 50, 200]);
    }

    #[test]
    fn test_scale_to_byte_range() {
        let v = volume(vec![-10.0f32, 0.0, 40.0]);
        let b = scale_to_byte_range(&v);
        assert_eq!(b.as_slice(), &[0, 51, 255]);

        let flat = volume(vec![7u16; 4]);
        assert!(scale_to_byte_range(&flat).as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_threshold() {
        let v = volume(vec![0.0f64, 0.5, 1.0, 2.0]);
        let m = threshold(&v, 1.0);
        assert_eq!(m.as_slice(), &[0, 0, 1, 1]);
        assert!(m.geometry().same_grid(v.geometry()));
    }
}

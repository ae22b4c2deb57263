use crate::data::Volume3D;
use crate::geometry::Point3D;

/// 连续坐标 `c` 在长度为 `dim` 的轴上最近的体素下标.
///
/// `c` 不在 `[-0.5, dim - 0.5)` 内 (包括 `NaN`) 时返回 `None`.
#[inline]
fn nearest_index(c: f64, dim: usize) -> Option<usize> {
    if !(c >= -0.5 && c < dim as f64 - 0.5) {
        return None;
    }
    Some((c.round().max(0.0) as usize).min(dim - 1))
}

/// 在输入体素坐标 `p` 处做最近邻采样.
pub(super) fn sample<T: Copy>(input: &Volume3D<T>, p: Point3D, outside: T) -> T {
    let [dx, dy, dz] = input.geometry().dim();
    match (
        nearest_index(p.x, dx),
        nearest_index(p.y, dy),
        nearest_index(p.z, dz),
    ) {
        (Some(x), Some(y), Some(z)) => input.array()[(z, y, x)],
        _ => outside,
    }
}

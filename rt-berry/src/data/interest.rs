use super::{Region3D, Volume3D};
use crate::par;

/// 求出所有 `>= threshold` 的体素构成的最小包围盒.
///
/// 逐水平切片并行扫描, 最后合并各层结果.
/// 没有任何体素满足条件时返回 [`Region3D::empty`].
pub fn interest_region<T>(volume: &Volume3D<T>, threshold: T) -> Region3D<i32>
where
    T: PartialOrd + Copy + Send + Sync,
{
    par::map_z_slices(volume.array(), |z, slice| {
        let mut region = Region3D::empty();
        for ((y, x), p) in slice.indexed_iter() {
            if *p >= threshold {
                region = region.include(x as i32, y as i32, z as i32);
            }
        }
        region
    })
    .into_iter()
    .fold(Region3D::empty(), |acc, r| acc.union(&r))
}

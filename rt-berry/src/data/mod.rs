//! 三维体素网格数据结构与基础体素运算.

mod interest;
mod ops;
mod region;
mod volume_2d;
mod volume_3d;
pub mod voxel;

pub use interest::interest_region;
pub use ops::{clip_to_range_in_place, min_max, scale_to_byte_range, threshold};
pub use region::Region3D;
pub use volume_2d::Volume2D;
pub use volume_3d::{Volume3D, VolumeGeometry};
pub use voxel::{clamp_to_byte, clamp_to_i16, Rounding, Voxel};

/// 稠密体素网格的共用属性和部分通用操作.
///
/// 实现者必须保证 [`Self::as_slice`] 按 x 最快的顺序给出全部体素.
pub trait Volume<T> {
    /// 全部体素的只读切片.
    fn as_slice(&self) -> &[T];

    /// 全部体素的可变切片.
    fn as_slice_mut(&mut self) -> &mut [T];

    /// 体素总数.
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// 是否不含任何体素.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按线性索引获取体素值. 越界时返回 `None`.
    #[inline]
    fn get_linear(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// 按线性索引获取体素值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    fn get_linear_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_slice_mut().get_mut(index)
    }

    /// 将所有体素设置为 `value`.
    #[inline]
    fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.as_slice_mut().fill(value);
    }

    /// 统计满足谓词 `pred` 的体素个数.
    #[inline]
    fn count_where<F: Fn(&T) -> bool>(&self, pred: F) -> usize {
        self.as_slice().iter().filter(|p| pred(p)).count()
    }
}

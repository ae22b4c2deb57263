//! 轴对齐包围盒.

use num::Num;

/// 三维轴对齐区域. 六个边界均为闭区间端点.
///
/// 任一轴 `min > max` 即为空区域. [`Self::empty`] 使用
/// `(0, 0, 0, -1, -1, -1)` 作为空区域哨兵, 而不是类型的极值,
/// 以便对空区域做算术时不会溢出.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region3D<T> {
    /// x 下界.
    pub min_x: T,
    /// y 下界.
    pub min_y: T,
    /// z 下界.
    pub min_z: T,
    /// x 上界.
    pub max_x: T,
    /// y 上界.
    pub max_y: T,
    /// z 上界.
    pub max_z: T,
}

impl<T: Num + Copy + PartialOrd> Region3D<T> {
    /// 直接初始化.
    #[inline]
    pub fn new(min_x: T, min_y: T, min_z: T, max_x: T, max_y: T, max_z: T) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    /// 空区域哨兵 `(0, 0, 0, -1, -1, -1)`.
    #[inline]
    pub fn empty() -> Self
    where
        T: std::ops::Neg<Output = T>,
    {
        let (z, m) = (T::zero(), -T::one());
        Self::new(z, z, z, m, m, m)
    }

    /// 是否为空区域.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_z > self.max_z
    }

    /// 点 `(x, y, z)` 是否位于区域内 (含边界).
    #[inline]
    pub fn contains(&self, x: T, y: T, z: T) -> bool {
        (self.min_x..=self.max_x).contains(&x)
            && (self.min_y..=self.max_y).contains(&y)
            && (self.min_z..=self.max_z).contains(&z)
    }

    /// `other` 是否完全位于区域内. 空区域被任何区域包含.
    pub fn contains_region(&self, other: &Self) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && self.contains(other.min_x, other.min_y, other.min_z)
                && self.contains(other.max_x, other.max_y, other.max_z))
    }

    /// 各轴分别向两侧扩张 `dx`, `dy`, `dz`. 空区域保持不变.
    pub fn dilate(&self, dx: T, dy: T, dz: T) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(
            self.min_x - dx,
            self.min_y - dy,
            self.min_z - dz,
            self.max_x + dx,
            self.max_y + dy,
            self.max_z + dz,
        )
    }

    /// 同时包含 `self` 和 `other` 的最小区域. 空区域不参与计算.
    pub fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => Self::new(
                min(self.min_x, other.min_x),
                min(self.min_y, other.min_y),
                min(self.min_z, other.min_z),
                max(self.max_x, other.max_x),
                max(self.max_y, other.max_y),
                max(self.max_z, other.max_z),
            ),
        }
    }

    /// 两区域的交集. 结果可能为空 (但不一定是哨兵形式).
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            max(self.min_x, other.min_x),
            max(self.min_y, other.min_y),
            max(self.min_z, other.min_z),
            min(self.max_x, other.max_x),
            min(self.max_y, other.max_y),
            min(self.max_z, other.max_z),
        )
    }

    /// 将点 `(x, y, z)` 纳入区域. 空区域会变为单点区域.
    pub fn include(&self, x: T, y: T, z: T) -> Self {
        self.union(&Self::new(x, y, z, x, y, z))
    }
}

/// 整数区域的体素计数方法.
impl<T: Num + Copy + PartialOrd + Into<i64>> Region3D<T> {
    /// x, y, z 三个方向上包含的体素个数. 空区域为 `[0, 0, 0]`.
    pub fn voxel_extent(&self) -> [usize; 3] {
        if self.is_empty() {
            return [0; 3];
        }
        let len = |lo: T, hi: T| {
            let (lo, hi): (i64, i64) = (lo.into(), hi.into());
            (hi - lo + 1) as usize
        };
        [
            len(self.min_x, self.max_x),
            len(self.min_y, self.max_y),
            len(self.min_z, self.max_z),
        ]
    }

    /// 区域包含的体素总数.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.voxel_extent().iter().product()
    }
}

#[inline]
fn min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

#[inline]
fn max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

use ndarray::{Array2, ArrayView2};

use super::Volume;
use crate::geometry::{Matrix2, Point2D};

/// 二维稠密体素网格, 一般来自三维体积的某个水平切片.
///
/// 像素按 x 最快的顺序存储, 底层是形状为 `(y, x)` 的标准布局 `Array2`.
#[derive(Debug, Clone)]
pub struct Volume2D<T> {
    data: Array2<T>,
    spacing: [f64; 2],
    origin: Point2D,
    direction: Matrix2,
}

impl<T> Volume<T> for Volume2D<T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        // 构造时保证了标准布局, 可直接 unwrap.
        self.data.as_slice().unwrap()
    }

    #[inline]
    fn as_slice_mut(&mut self) -> &mut [T] {
        self.data.as_slice_mut().unwrap()
    }
}

impl<T: Clone> Volume2D<T> {
    /// 由 `(y, x)` 形状的数据与二维几何信息直接创建.
    pub(crate) fn from_parts(
        data: Array2<T>,
        spacing: [f64; 2],
        origin: Point2D,
        direction: Matrix2,
    ) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        Self {
            data,
            spacing,
            origin,
            direction,
        }
    }
}

impl<T> Volume2D<T> {
    /// 维度 `[x, y]`.
    #[inline]
    pub fn dim(&self) -> [usize; 2] {
        let (y, x) = self.data.dim();
        [x, y]
    }

    /// 像素间距 `[x, y]`, 单位为毫米.
    #[inline]
    pub fn spacing(&self) -> [f64; 2] {
        self.spacing
    }

    /// 像素 `(0, 0)` 的物理坐标.
    #[inline]
    pub fn origin(&self) -> Point2D {
        self.origin
    }

    /// 方向矩阵.
    #[inline]
    pub fn direction(&self) -> &Matrix2 {
        &self.direction
    }

    /// 单个像素的面积, 单位为平方毫米.
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.spacing[0] * self.spacing[1]
    }

    /// 获取给定位置的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.data.get((y, x))
    }

    /// 将像素坐标转换为物理坐标.
    pub fn pixel_to_physical(&self, x: f64, y: f64) -> Point2D {
        let [sx, sy] = self.spacing;
        self.direction * Point2D::new(x * sx, y * sy) + self.origin
    }

    /// 获得底层数据 (形状 `(y, x)`) 的不可变视图.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }
}

#[cfg(test)]
mod tests {
    use super::Volume2D;
    use crate::data::Volume;
    use crate::geometry::{Matrix2, Point2D};
    use ndarray::Array2;

    #[test]
    fn test_volume_2d_geometry() {
        let data = Array2::from_shape_vec((2, 3), vec![0u8, 1, 0, 1, 1, 0]).unwrap();
        let v = Volume2D::from_parts(
            data,
            [0.5, 2.0],
            Point2D::new(10.0, -1.0),
            Matrix2::IDENTITY,
        );
        assert_eq!(v.dim(), [3, 2]);
        assert_eq!(v.pixel_area(), 1.0);
        assert_eq!(v.count_where(|&p| p == 1), 3);
        assert_eq!(v.pixel_to_physical(2.0, 1.0), Point2D::new(11.0, 1.0));
        assert_eq!(*v.get(0, 1).unwrap(), 1);
    }
}

use std::ops::Mul;

use super::{Point2D, Point3D};
use crate::error::GeometryError;

/// 3x3 矩阵, 按行优先存储.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix3 {
    data: [f64; 9],
}

impl Default for Matrix3 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix3 {
    /// 单位阵.
    pub const IDENTITY: Self = Self {
        data: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    /// 由行优先数组直接初始化.
    #[inline]
    pub const fn from_row_major(data: [f64; 9]) -> Self {
        Self { data }
    }

    /// 由三个列向量初始化.
    pub fn from_columns(c0: Point3D, c1: Point3D, c2: Point3D) -> Self {
        Self::from_row_major([c0.x, c1.x, c2.x, c0.y, c1.y, c2.y, c0.z, c1.z, c2.z])
    }

    /// 对角阵.
    pub fn diagonal([a, b, c]: [f64; 3]) -> Self {
        Self::from_row_major([a, 0.0, 0.0, 0.0, b, 0.0, 0.0, 0.0, c])
    }

    /// 行优先存储的数据.
    #[inline]
    pub const fn as_row_major(&self) -> &[f64; 9] {
        &self.data
    }

    /// 获取第 `row` 行第 `col` 列元素. 越界时 panic.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * 3 + col]
    }

    /// 第 `col` 列.
    pub fn column(&self, col: usize) -> Point3D {
        Point3D::new(self.at(0, col), self.at(1, col), self.at(2, col))
    }

    /// 转置.
    pub fn transpose(&self) -> Self {
        let d = &self.data;
        Self::from_row_major([d[0], d[3], d[6], d[1], d[4], d[7], d[2], d[5], d[8]])
    }

    /// 行列式.
    pub fn determinant(&self) -> f64 {
        let d = &self.data;
        d[0] * (d[4] * d[8] - d[5] * d[7]) - d[1] * (d[3] * d[8] - d[5] * d[6])
            + d[2] * (d[3] * d[7] - d[4] * d[6])
    }

    /// 通过伴随矩阵 / 行列式求逆.
    ///
    /// 行列式为 0 或非有限值时返回 `Err(GeometryError::SingularTransform)`.
    pub fn inverse(&self) -> Result<Self, GeometryError> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(GeometryError::SingularTransform(det));
        }
        let d = &self.data;
        let cof = [
            d[4] * d[8] - d[5] * d[7],
            d[2] * d[7] - d[1] * d[8],
            d[1] * d[5] - d[2] * d[4],
            d[5] * d[6] - d[3] * d[8],
            d[0] * d[8] - d[2] * d[6],
            d[2] * d[3] - d[0] * d[5],
            d[3] * d[7] - d[4] * d[6],
            d[1] * d[6] - d[0] * d[7],
            d[0] * d[4] - d[1] * d[3],
        ];
        let inv = cof.map(|c| c / det);
        if inv.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::SingularTransform(det));
        }
        Ok(Self::from_row_major(inv))
    }

    /// 各元素之差的绝对值是否都不超过 `tol`.
    pub fn approx_eq(&self, rhs: &Self, tol: f64) -> bool {
        self.data
            .iter()
            .zip(rhs.data.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Mul for Matrix3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut data = [0.0; 9];
        for (i, v) in data.iter_mut().enumerate() {
            let (r, c) = (i / 3, i % 3);
            *v = (0..3).map(|k| self.at(r, k) * rhs.at(k, c)).sum();
        }
        Self::from_row_major(data)
    }
}

impl Mul<Point3D> for Matrix3 {
    type Output = Point3D;

    #[inline]
    fn mul(self, p: Point3D) -> Point3D {
        let d = &self.data;
        Point3D::new(
            d[0] * p.x + d[1] * p.y + d[2] * p.z,
            d[3] * p.x + d[4] * p.y + d[5] * p.z,
            d[6] * p.x + d[7] * p.y + d[8] * p.z,
        )
    }
}

/// 2x2 矩阵, 按行优先存储. 用于二维切片的方向信息.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix2 {
    data: [f64; 4],
}

impl Default for Matrix2 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix2 {
    /// 单位阵.
    pub const IDENTITY: Self = Self {
        data: [1.0, 0.0, 0.0, 1.0],
    };

    /// 由行优先数组直接初始化.
    #[inline]
    pub const fn from_row_major(data: [f64; 4]) -> Self {
        Self { data }
    }

    /// 取 3x3 矩阵左上角的 2x2 子阵.
    pub fn upper_left(m: &Matrix3) -> Self {
        Self::from_row_major([m.at(0, 0), m.at(0, 1), m.at(1, 0), m.at(1, 1)])
    }

    /// 行优先存储的数据.
    #[inline]
    pub const fn as_row_major(&self) -> &[f64; 4] {
        &self.data
    }
}

impl Mul<Point2D> for Matrix2 {
    type Output = Point2D;

    #[inline]
    fn mul(self, p: Point2D) -> Point2D {
        let d = &self.data;
        Point2D::new(d[0] * p.x + d[1] * p.y, d[2] * p.x + d[3] * p.y)
    }
}

/// 4x4 齐次矩阵, 按行优先存储.
///
/// 仅用于与外部仿射表示 (如 nifti 的 sform) 互相转换, 内部计算统一使用
/// [`super::Transform3`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix4 {
    data: [f64; 16],
}

impl Default for Matrix4 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// 单位阵.
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// 由行优先数组直接初始化.
    #[inline]
    pub const fn from_row_major(data: [f64; 16]) -> Self {
        Self { data }
    }

    /// 由仿射矩阵的前三行初始化, 最后一行为 `[0, 0, 0, 1]`.
    pub fn from_affine_rows(r0: [f64; 4], r1: [f64; 4], r2: [f64; 4]) -> Self {
        let mut data = Self::IDENTITY.data;
        data[..4].copy_from_slice(&r0);
        data[4..8].copy_from_slice(&r1);
        data[8..12].copy_from_slice(&r2);
        Self { data }
    }

    /// 获取第 `row` 行第 `col` 列元素. 越界时 panic.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * 4 + col]
    }

    /// 行优先存储的数据.
    #[inline]
    pub const fn as_row_major(&self) -> &[f64; 16] {
        &self.data
    }

    /// 最后一行是否是 `[0, 0, 0, 1]`, 即该矩阵是否表示一个仿射变换.
    pub fn is_affine(&self) -> bool {
        self.data[12..] == [0.0, 0.0, 0.0, 1.0]
    }

    /// 左上角 3x3 线性部分.
    pub fn linear_part(&self) -> Matrix3 {
        let d = &self.data;
        Matrix3::from_row_major([d[0], d[1], d[2], d[4], d[5], d[6], d[8], d[9], d[10]])
    }

    /// 平移部分.
    pub fn translation(&self) -> Point3D {
        Point3D::new(self.data[3], self.data[7], self.data[11])
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut data = [0.0; 16];
        for (i, v) in data.iter_mut().enumerate() {
            let (r, c) = (i / 4, i % 4);
            *v = (0..4).map(|k| self.at(r, k) * rhs.at(k, c)).sum();
        }
        Self::from_row_major(data)
    }
}

impl Mul<Point3D> for Matrix4 {
    type Output = Point3D;

    /// 以齐次坐标 `(x, y, z, 1)` 作用于点. 不做透视除法.
    #[inline]
    fn mul(self, p: Point3D) -> Point3D {
        self.linear_part() * p + self.translation()
    }
}

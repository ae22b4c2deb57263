use std::ops::Mul;

use super::{Matrix3, Matrix4, Point3D};
use crate::error::GeometryError;

/// 三维仿射变换 `basis * p + origin`.
///
/// 复合 `a * b` 表示 "先作用 `b`, 再作用 `a`".
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Transform3 {
    basis: Matrix3,
    origin: Point3D,
}

impl Transform3 {
    /// 恒等变换.
    pub const IDENTITY: Self = Self {
        basis: Matrix3::IDENTITY,
        origin: Point3D::ZERO,
    };

    /// 直接初始化.
    #[inline]
    pub const fn new(basis: Matrix3, origin: Point3D) -> Self {
        Self { basis, origin }
    }

    /// 线性部分.
    #[inline]
    pub fn basis(&self) -> &Matrix3 {
        &self.basis
    }

    /// 平移部分.
    #[inline]
    pub fn origin(&self) -> Point3D {
        self.origin
    }

    /// 将变换作用于点 `p`.
    #[inline]
    pub fn apply(&self, p: Point3D) -> Point3D {
        self.basis * p + self.origin
    }

    /// 逆变换.
    ///
    /// 基矩阵奇异时返回 `Err(GeometryError::SingularTransform)`.
    pub fn inverse(&self) -> Result<Self, GeometryError> {
        let basis = self.basis.inverse()?;
        Ok(Self {
            basis,
            origin: -(basis * self.origin),
        })
    }

    /// 转换为齐次矩阵形式.
    pub fn to_matrix4(&self) -> Matrix4 {
        let b = self.basis.as_row_major();
        let o = self.origin;
        Matrix4::from_affine_rows(
            [b[0], b[1], b[2], o.x],
            [b[3], b[4], b[5], o.y],
            [b[6], b[7], b[8], o.z],
        )
    }

    /// 从齐次矩阵构造. 若最后一行不是 `[0, 0, 0, 1]` 则返回 `None`.
    pub fn from_matrix4(m: &Matrix4) -> Option<Self> {
        m.is_affine()
            .then(|| Self::new(m.linear_part(), m.translation()))
    }
}

impl Mul for Transform3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            basis: self.basis * rhs.basis,
            origin: self.basis * rhs.origin + self.origin,
        }
    }
}

/// 体素坐标与物理坐标之间的双向变换.
///
/// 正逆变换在构造时一次性计算, 之后的坐标转换不再求逆.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VolumeTransform {
    data_to_physical: Transform3,
    physical_to_data: Transform3,
}

impl VolumeTransform {
    /// 由体素间距、原点和方向矩阵构造.
    ///
    /// `data_to_physical = (direction * diag(spacing), origin)`.
    pub fn new(
        spacing: [f64; 3],
        origin: Point3D,
        direction: &Matrix3,
    ) -> Result<Self, GeometryError> {
        let data_to_physical = Transform3::new(*direction * Matrix3::diagonal(spacing), origin);
        let physical_to_data = data_to_physical.inverse()?;
        Ok(Self {
            data_to_physical,
            physical_to_data,
        })
    }

    /// 体素坐标 -> 物理坐标.
    #[inline]
    pub fn data_to_physical(&self) -> &Transform3 {
        &self.data_to_physical
    }

    /// 物理坐标 -> 体素坐标.
    #[inline]
    pub fn physical_to_data(&self) -> &Transform3 {
        &self.physical_to_data
    }

    /// 将 (连续) 体素坐标转换为物理坐标.
    #[inline]
    pub fn pixel_to_physical(&self, p: Point3D) -> Point3D {
        self.data_to_physical.apply(p)
    }

    /// 将物理坐标转换为 (连续) 体素坐标.
    #[inline]
    pub fn physical_to_pixel(&self, p: Point3D) -> Point3D {
        self.physical_to_data.apply(p)
    }
}

#[cfg(test)]
mod tests {
    use super::{Transform3, VolumeTransform};
    use crate::error::GeometryError;
    use crate::geometry::{Matrix3, Point3D};

    #[test]
    fn test_transform_compose_order() {
        let scale = Transform3::new(Matrix3::diagonal([2.0, 2.0, 2.0]), Point3D::ZERO);
        let shift = Transform3::new(Matrix3::IDENTITY, Point3D::new(1.0, 0.0, 0.0));
        let p = Point3D::new(1.0, 1.0, 1.0);
        // 先平移, 再缩放.
        assert_eq!((scale * shift).apply(p), Point3D::new(4.0, 2.0, 2.0));
        // 先缩放, 再平移.
        assert_eq!((shift * scale).apply(p), Point3D::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn test_transform_inverse_round_trip() {
        let basis = Matrix3::from_row_major([0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 2.5]);
        let t = Transform3::new(basis, Point3D::new(-100.0, 20.0, 3.0));
        let inv = t.inverse().unwrap();
        let p = Point3D::new(7.0, -3.0, 11.0);
        assert!(inv.apply(t.apply(p)).approx_eq(&p, 1e-12));
        assert!(Transform3::from_matrix4(&t.to_matrix4()) == Some(t));
    }

    #[test]
    fn test_volume_transform() {
        let vt = VolumeTransform::new(
            [0.5, 0.5, 2.0],
            Point3D::new(-10.0, -20.0, 5.0),
            &Matrix3::IDENTITY,
        )
        .unwrap();
        let phys = vt.pixel_to_physical(Point3D::new(2.0, 4.0, 1.0));
        assert!(phys.approx_eq(&Point3D::new(-9.0, -18.0, 7.0), 1e-12));
        assert!(vt
            .physical_to_pixel(phys)
            .approx_eq(&Point3D::new(2.0, 4.0, 1.0), 1e-12));
    }

    #[test]
    fn test_volume_transform_singular() {
        let r = VolumeTransform::new([1.0, 0.0, 1.0], Point3D::ZERO, &Matrix3::IDENTITY);
        assert!(matches!(r, Err(GeometryError::SingularTransform(_))));
    }
}

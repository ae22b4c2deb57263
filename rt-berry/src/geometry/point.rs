use std::ops::{Add, Mul, Neg, Sub};

/// 三维点 (或向量). 物理坐标以毫米为单位.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3D {
    /// x 分量.
    pub x: f64,
    /// y 分量.
    pub y: f64,
    /// z 分量.
    pub z: f64,
}

impl Point3D {
    /// 原点.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// 直接初始化.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 由体素索引构造点.
    #[inline]
    pub fn from_index(x: usize, y: usize, z: usize) -> Self {
        Self::new(x as f64, y as f64, z as f64)
    }

    /// 以数组形式返回三个分量.
    #[inline]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// 点积.
    #[inline]
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// 欧氏范数.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// 三个分量是否都是有限值.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// 两点各分量之差的绝对值是否都不超过 `tol`.
    #[inline]
    pub fn approx_eq(&self, rhs: &Self, tol: f64) -> bool {
        (self.x - rhs.x).abs() <= tol
            && (self.y - rhs.y).abs() <= tol
            && (self.z - rhs.z).abs() <= tol
    }
}

impl From<[f64; 3]> for Point3D {
    #[inline]
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Point3D {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Point3D {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Self;

    #[inline]
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

/// 二维点 (或向量).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2D {
    /// x 分量.
    pub x: f64,
    /// y 分量.
    pub y: f64,
}

impl Point2D {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

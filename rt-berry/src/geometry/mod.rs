//! 几何基础: 点, 矩阵, 仿射变换.
//!
//! 体素坐标 (pixel/data) 与物理坐标 (patient/physical, 单位为毫米)
//! 之间的转换都经由 [`VolumeTransform`] 完成.

mod matrix;
mod point;
mod transform;

pub use matrix::{Matrix2, Matrix3, Matrix4};
pub use point::{Point2D, Point3D};
pub use transform::{Transform3, VolumeTransform};

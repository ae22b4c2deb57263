//! 借助 `nifti` crate 读取 nii 扫描与掩膜.

use std::path::Path;

use ndarray::ArrayD;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::mask;
use crate::data::{Volume, Volume3D, VolumeGeometry};
use crate::error::{GeometryError, Result};
use crate::geometry::{Matrix3, Matrix4, Point3D};

/// 从 nifti header 中读取体素网格几何信息.
///
/// 依次尝试:
///
/// 1. `sform_code > 0` 时使用 `srow_x/y/z` 仿射矩阵;
/// 2. `qform_code > 0` 时使用四元数、`quatern_x/y/z` 偏移 与 `pixdim`;
/// 3. 否则只使用 `pixdim`, 原点为 0, 方向为单位阵.
///
/// 坐标沿用 nifti 的物理坐标系, 不做额外翻转.
pub fn geometry_from_header(header: &NiftiHeader) -> std::result::Result<VolumeGeometry, GeometryError> {
    let [_, dx, dy, dz, ..] = header.dim;
    let dim = [dx as usize, dy as usize, dz as usize];
    let [qfac, px, py, pz, ..] = header.pixdim.map(f64::from);

    if header.sform_code > 0 {
        let row = |r: [f32; 4]| r.map(f64::from);
        let affine = Matrix4::from_affine_rows(
            row(header.srow_x),
            row(header.srow_y),
            row(header.srow_z),
        );
        let linear = affine.linear_part();
        let spacing: [f64; 3] = std::array::from_fn(|i| linear.column(i).norm());
        if spacing.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(GeometryError::InvalidSpacing(spacing));
        }
        let cols: [Point3D; 3] = std::array::from_fn(|i| linear.column(i) * (1.0 / spacing[i]));
        let direction = Matrix3::from_columns(cols[0], cols[1], cols[2]);
        return VolumeGeometry::new(dim, spacing, affine.translation(), direction);
    }

    let spacing = [px.abs(), py.abs(), pz.abs()];
    if header.qform_code > 0 {
        let (b, c, d) = (
            f64::from(header.quatern_b),
            f64::from(header.quatern_c),
            f64::from(header.quatern_d),
        );
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        // qfac 只能是 1 或 -1, 为 -1 时 z 轴反向.
        let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };
        let direction = Matrix3::from_row_major([
            a * a + b * b - c * c - d * d,
            2.0 * (b * c - a * d),
            2.0 * (b * d + a * c) * qfac,
            2.0 * (b * c + a * d),
            a * a + c * c - b * b - d * d,
            2.0 * (c * d - a * b) * qfac,
            2.0 * (b * d - a * c),
            2.0 * (c * d + a * b),
            (a * a + d * d - c * c - b * b) * qfac,
        ]);
        let origin = Point3D::new(
            f64::from(header.quatern_x),
            f64::from(header.quatern_y),
            f64::from(header.quatern_z),
        );
        return VolumeGeometry::new(dim, spacing, origin, direction);
    }

    VolumeGeometry::with_spacing(dim, spacing)
}

/// 将 nifti 数据 (`[x, y, z, ...]`, x 最快) 转为体积.
fn into_volume<T: Clone>(header: &NiftiHeader, data: ArrayD<T>) -> Result<Volume3D<T>> {
    let geometry = geometry_from_header(header)?;
    // 逆序各轴后为标准布局, 原始数据即按 x 最快排列.
    let data = data.reversed_axes();
    let data = if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().to_owned()
    };
    Ok(Volume3D::from_vec(geometry, data.into_raw_vec())?)
}

/// 打开 nii 扫描文件, 体素值以 `f32` 保存.
pub fn open_scan<P: AsRef<Path>>(path: P) -> Result<Volume3D<f32>> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let header = obj.header().clone();
    let data = obj.into_volume().into_ndarray::<f32>()?;
    into_volume(&header, data)
}

/// 打开 nii 掩膜文件. 所有非零体素被视为前景.
pub fn open_mask<P: AsRef<Path>>(path: P) -> Result<Volume3D<u8>> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    let header = obj.header().clone();
    let data = obj.into_volume().into_ndarray::<u8>()?;
    let mut volume = into_volume(&header, data)?;
    volume
        .as_slice_mut()
        .iter_mut()
        .for_each(|p| *p = mask::binarize(*p));
    Ok(volume)
}

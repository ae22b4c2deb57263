//! 体素网格重采样.
//!
//! 对任意 [`Voxel`] 类型提供最近邻与三线性两种插值方式.
//! 输出体素通过 "输出体素坐标 → 物理坐标 → 输入体素坐标" 两次变换
//! 映射回输入体积, 按输出的水平切片并行计算.

mod linear;
mod nearest;

use crate::data::{Rounding, Volume3D, VolumeGeometry, Voxel};
use crate::error::GeometryError;
use crate::geometry::{Point3D, Transform3};
use crate::par;

/// 插值方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Interpolation {
    /// 最近邻插值. 适用于掩膜与标签.
    Nearest,

    /// 三线性插值.
    #[default]
    Linear,
}

/// 计算将 `input` 重采样为 `out_dim` 个体素时的输出几何信息.
///
/// 每个轴的输出间距为 `in_spacing * (in_dim - 1) / (out_dim - 1)`,
/// 即首尾体素中心保持不动. 原点与方向不变.
///
/// # 返回值
///
/// 任一轴 `out_dim < 2` 时返回 `Err(GeometryError::InvalidResampleDimension)`.
pub fn resampled_geometry(
    input: &VolumeGeometry,
    out_dim: [usize; 3],
) -> Result<VolumeGeometry, GeometryError> {
    if out_dim.iter().any(|&d| d < 2) {
        return Err(GeometryError::InvalidResampleDimension(out_dim));
    }
    let (in_dim, in_spacing) = (input.dim(), input.spacing());
    let spacing: [f64; 3] =
        std::array::from_fn(|i| in_spacing[i] * (in_dim[i] - 1) as f64 / (out_dim[i] - 1) as f64);
    input.with_dim_and_spacing(out_dim, spacing)
}

/// 最近邻重采样为 `out_dim` 个体素. 落在输入体积外的输出体素取 `outside`.
pub fn resample_nearest<T: Voxel>(
    input: &Volume3D<T>,
    out_dim: [usize; 3],
    outside: T,
) -> Result<Volume3D<T>, GeometryError> {
    let output = resampled_geometry(input.geometry(), out_dim)?;
    Ok(resample_onto(input, &output, Interpolation::Nearest, outside))
}

/// 三线性重采样为 `out_dim` 个体素. 整数体素按四舍六入五成双舍入.
pub fn resample_linear<T: Voxel>(
    input: &Volume3D<T>,
    out_dim: [usize; 3],
    outside: T,
) -> Result<Volume3D<T>, GeometryError> {
    resample_linear_with_rounding(input, out_dim, outside, Rounding::default())
}

/// 三线性重采样为 `out_dim` 个体素, 整数体素使用指定的舍入方式.
pub fn resample_linear_with_rounding<T: Voxel>(
    input: &Volume3D<T>,
    out_dim: [usize; 3],
    outside: T,
    rounding: Rounding,
) -> Result<Volume3D<T>, GeometryError> {
    let output = resampled_geometry(input.geometry(), out_dim)?;
    Ok(resample_with(input, output, |p| {
        linear::sample(input, p, outside, rounding)
    }))
}

/// 将 `input` 重采样到任意参考网格 `reference` 上.
///
/// 用于把各通道配准到参考通道. 几何完全一致时直接复制.
pub fn resample_onto<T: Voxel>(
    input: &Volume3D<T>,
    reference: &VolumeGeometry,
    interpolation: Interpolation,
    outside: T,
) -> Volume3D<T> {
    if input.geometry().same_grid(reference) {
        return input.clone();
    }
    match interpolation {
        Interpolation::Nearest => {
            resample_with(input, *reference, |p| nearest::sample(input, p, outside))
        }
        Interpolation::Linear => resample_with(input, *reference, |p| {
            linear::sample(input, p, outside, Rounding::default())
        }),
    }
}

/// 将 `input` 重采样为体素间距 `spacing`, 原点与方向不变.
///
/// 每个轴的输出体素数为 `floor(物理跨度 / spacing) + 1`, 因此输出覆盖的
/// 物理范围不会超出输入.
///
/// # 返回值
///
/// `spacing` 不是有限正数时返回 `Err(GeometryError::InvalidSpacing)`.
pub fn resample_to_spacing<T: Voxel>(
    input: &Volume3D<T>,
    spacing: [f64; 3],
    interpolation: Interpolation,
    outside: T,
) -> Result<Volume3D<T>, GeometryError> {
    if spacing.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
        return Err(GeometryError::InvalidSpacing(spacing));
    }
    let g = input.geometry();
    let (in_dim, in_spacing) = (g.dim(), g.spacing());
    let dim: [usize; 3] = std::array::from_fn(|i| {
        let extent = in_spacing[i] * in_dim[i].saturating_sub(1) as f64;
        // 容差用于吸收 `extent / spacing` 恰为整数时的浮点误差.
        (extent / spacing[i] + 1e-6).floor() as usize + 1
    });
    let output = g.with_dim_and_spacing(dim, spacing)?;
    Ok(resample_onto(input, &output, interpolation, outside))
}

/// 输出体素坐标到输入体素坐标的变换.
#[inline]
fn output_to_input(input: &VolumeGeometry, output: &VolumeGeometry) -> Transform3 {
    *input.transform().physical_to_data() * *output.transform().data_to_physical()
}

/// 按输出水平切片并行地对每个输出体素调用 `sample`.
fn resample_with<T, F>(input: &Volume3D<T>, output: VolumeGeometry, sample: F) -> Volume3D<T>
where
    T: Voxel,
    F: Fn(Point3D) -> T + Sync + Send,
{
    let transform = output_to_input(input.geometry(), &output);
    let mut ans = Volume3D::new(output);
    par::for_each_z_slice_mut(ans.array_mut(), |z, mut slice| {
        for ((y, x), p) in slice.indexed_iter_mut() {
            *p = sample(transform.apply(Point3D::from_index(x, y, z)));
        }
    });
    ans
}

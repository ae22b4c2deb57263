#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将 "扫描序列 + 放疗结构 (RT structure)" 数据集规范化为逐受试者的三维体素网格数据集:
//! 扫描体积与二值结构掩膜, 支持结构重命名、派生结构、结构互斥、重采样与统计质控.
//!
//! 该 crate 只提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. DICOM 解析与数据集写出不在本 crate 范围内. 读取方面只提供基于 `nifti` crate 的
//!   [`dataset::nifti_io`].
//! 2. 核心算法不输出日志. 流水线返回结构化报告, 由调用方决定是否通过 `log` 输出.
//!
//! # 开发计划
//!
//! ### 几何基础 ✅
//!
//! 点、矩阵、仿射变换及体素 ↔ 物理坐标变换.
//!
//! 实现位于 `rt-berry/src/geometry`.
//!
//! ### 三维体素网格 ✅
//!
//! `Volume3D<T>`、`Volume2D<T>`、包围盒 `Region3D<T>` 及基础体素运算 (min/max、阈值、
//! 截断、饱和转换).
//!
//! 实现位于 `rt-berry/src/data`.
//!
//! ### 泛型重采样 ✅
//!
//! 最近邻与三线性插值, 按水平切片并行. 支持重采样到给定维度、给定网格与给定体素间距.
//!
//! 实现位于 `rt-berry/src/resample`.
//!
//! ### 结构集代数 ✅
//!
//! 1. 结构运算 `a.op.b` (交、并、差与四种 z 向裁剪). ✅
//! 2. 单条与批量重命名 / 增广. ✅
//! 3. 派生结构. ✅
//! 4. 按真值列表优先级的结构互斥. ✅
//!
//! 实现位于 `rt-berry/src/structures`.
//!
//! ### 数据集转换流水线 ✅
//!
//! 通道配准、重命名、派生、互斥、间距规范化, 以及逐受试者报告.
//!
//! 实现位于 `rt-berry/src/dataset`.
//!
//! ### 统计质控 ✅
//!
//! 结构统计量与离群值检测.
//!
//! 实现位于 `rt-berry/src/analysis`.
//!
//! ### 数据集写出 ⌛️
//!
//! 目前只读不写. 转换结果由调用方自行持久化.

pub mod analysis;
pub mod consts;
pub mod data;
pub mod dataset;
pub mod error;
pub mod geometry;
mod par;
pub mod prelude;
pub mod resample;
pub mod structures;

pub use data::{Region3D, Volume, Volume2D, Volume3D, VolumeGeometry};
pub use error::{ConfigError, Error, GeometryError, Result, StructureError};

//! 运行时错误.

use thiserror::Error;

/// 几何相关错误. 均为局部致命错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// 数据长度与声明的体素个数不符.
    ///
    /// 第一个参数是声明的维度 `[x, y, z]`, 第二个参数是实际数据长度.
    #[error("体素数据长度 {1} 与维度 {0:?} 不一致")]
    ArrayLengthMismatch([usize; 3], usize),

    /// 体素间距不是有限正数.
    #[error("体素间距 {0:?} 必须是有限正数")]
    InvalidSpacing([f64; 3]),

    /// 仿射变换的基矩阵奇异, 无法求逆.
    #[error("仿射变换奇异 (行列式为 {0}), 无法求逆")]
    SingularTransform(f64),

    /// 重采样目标维度非法 (某轴为 0 或 1).
    #[error("重采样目标维度 {0:?} 非法, 每个轴至少需要 2 个体素")]
    InvalidResampleDimension([usize; 3]),
}

/// 结构集相关错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureError {
    /// 目标结构名已存在, 且不允许重名覆盖.
    #[error("结构 `{0}` 已存在")]
    NameClash(String),

    /// 同一条重命名规则涉及的多个结构名同时存在.
    #[error("重命名规则 `{rule}` 有歧义, 以下结构同时存在: {existing:?}")]
    AmbiguousRename {
        /// 规则的文本形式.
        rule: String,
        /// 同时存在的结构名.
        existing: Vec<String>,
    },

    /// 所需的结构不存在.
    #[error("结构 `{0}` 不存在")]
    MissingStructure(String),

    /// 缺少必需的真值结构.
    #[error("缺少真值结构: {0:?}")]
    MissingGroundTruth(Vec<String>),

    /// 两个体积的几何信息不一致.
    #[error("`{0}` 与 `{1}` 的体素网格几何不一致")]
    GeometryMismatch(String, String),

    /// 规则或运算表达式文本格式错误.
    #[error("无法解析 `{0}`")]
    Malformed(String),
}

/// 配置错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// 引用通道不存在.
    #[error("引用通道 `{0}` 不存在")]
    MissingReferenceChannel(String),

    /// 目标体素间距非法.
    #[error("目标体素间距 {0:?} 必须是有限正数")]
    InvalidTargetSpacing([f64; 3]),
}

/// crate 级错误.
#[derive(Debug, Error)]
pub enum Error {
    /// 几何错误.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// 结构集错误.
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// 配置错误.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// nifti 读取错误.
    #[error("nifti: {0}")]
    Nifti(#[from] nifti::NiftiError),
}

/// crate 级运行结果.
pub type Result<T> = std::result::Result<T, Error>;

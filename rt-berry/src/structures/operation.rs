//! 结构运算表达式 `左操作数.运算符.右操作数`.

use std::fmt;
use std::str::FromStr;

use ndarray::s;

use super::normalize_name;
use crate::consts::{mask, names};
use crate::data::{interest_region, Region3D, Volume3D};
use crate::error::StructureError;
use crate::par;

/// 结构运算符.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operator {
    /// `a.gt.b`: 只保留 `a` 中严格高于 `b` 最高层的部分.
    Gt,

    /// `a.ge.b`: 只保留 `a` 中不低于 `b` 最低层的部分.
    Ge,

    /// `a.lt.b`: 只保留 `a` 中严格低于 `b` 最低层的部分.
    Lt,

    /// `a.le.b`: 只保留 `a` 中不高于 `b` 最高层的部分.
    Le,

    /// 交集.
    Intersection,

    /// 并集.
    Union,

    /// 差集.
    Minus,
}

impl Operator {
    /// 表达式中的文本形式.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Intersection => "intersection",
            Self::Union => "union",
            Self::Minus => "minus",
        }
    }

    /// 是否是按层裁剪的运算符.
    #[inline]
    pub const fn is_crop(&self) -> bool {
        matches!(self, Self::Gt | Self::Ge | Self::Lt | Self::Le)
    }
}

impl FromStr for Operator {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "intersection" => Self::Intersection,
            "union" => Self::Union,
            "minus" => Self::Minus,
            _ => return Err(StructureError::Malformed(s.to_string())),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析后的结构运算.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StructureOperation {
    /// 左操作数 (已规范化的结构名).
    pub left: String,

    /// 运算符.
    pub op: Operator,

    /// 右操作数 (已规范化的结构名).
    pub right: String,
}

impl StructureOperation {
    /// 直接初始化. 操作数会被规范化.
    pub fn new(left: &str, op: Operator, right: &str) -> Self {
        Self {
            left: normalize_name(left),
            op,
            right: normalize_name(right),
        }
    }

    /// 尝试把 `text` 解析为结构运算.
    ///
    /// 只有恰好三段 (以 `.` 分隔)、中间一段是合法运算符且两侧操作数非空时
    /// 才返回 `Some`. 其他文本 (例如本身带 `.` 的结构名) 返回 `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = normalize_name(text);
        let mut it = text.split(names::OPERATION_SEP);
        let (left, op, right) = (it.next()?, it.next()?, it.next()?);
        if it.next().is_some() || left.is_empty() || right.is_empty() {
            return None;
        }
        let op = op.parse().ok()?;
        Some(Self::new(left, op, right))
    }

    /// 计算运算结果. 结果是新的掩膜, 两个操作数均不被修改.
    ///
    /// 两个操作数几何不一致时返回 `Err(StructureError::GeometryMismatch)`.
    pub fn apply(
        &self,
        left: &Volume3D<u8>,
        right: &Volume3D<u8>,
    ) -> Result<Volume3D<u8>, StructureError> {
        if !left.geometry().same_grid(right.geometry()) {
            return Err(StructureError::GeometryMismatch(
                self.left.clone(),
                self.right.clone(),
            ));
        }
        let mut ans = left.clone();
        let (a, b) = (
            interest_region(left, mask::FOREGROUND),
            interest_region(right, mask::FOREGROUND),
        );
        match self.op {
            Operator::Intersection => patch(&mut ans, right, &a, |l, r| l && r),
            Operator::Minus => patch(&mut ans, right, &a, |l, r| l && !r),
            Operator::Union => patch(&mut ans, right, &b, |l, r| l || r),
            op => crop(&mut ans, op, &a, &b),
        }
        Ok(ans)
    }
}

impl FromStr for StructureOperation {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| StructureError::Malformed(s.to_string()))
    }
}

impl fmt::Display for StructureOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = names::OPERATION_SEP;
        write!(f, "{}{sep}{}{sep}{}", self.left, self.op, self.right)
    }
}

/// 在 `a` 的 XY 包围盒内清除由 `b` 决定的 z 区间.
///
/// 任一操作数为空时不做修改.
fn crop(ans: &mut Volume3D<u8>, op: Operator, a: &Region3D<i32>, b: &Region3D<i32>) {
    if a.is_empty() || b.is_empty() {
        return;
    }
    // 需要清除的闭区间 [lo, hi], 可能为空.
    let (lo, hi) = match op {
        Operator::Gt => (a.min_z, b.max_z),
        Operator::Ge => (a.min_z, b.min_z - 1),
        Operator::Lt => (b.min_z, a.max_z),
        Operator::Le => (b.max_z + 1, a.max_z),
        _ => return,
    };
    let (lo, hi) = (lo.max(a.min_z), hi.min(a.max_z));
    if lo > hi {
        return;
    }
    let (x0, x1, y0, y1) = (
        a.min_x as usize,
        a.max_x as usize,
        a.min_y as usize,
        a.max_y as usize,
    );
    let z_range = lo as usize..=hi as usize;
    par::for_each_z_slice_mut(ans.array_mut(), |z, mut slice| {
        if z_range.contains(&z) {
            slice.slice_mut(s![y0..=y1, x0..=x1]).fill(mask::BACKGROUND);
        }
    });
}

/// 仅在 `region` 内逐体素计算 `ans = f(ans, other)`.
fn patch<F>(ans: &mut Volume3D<u8>, other: &Volume3D<u8>, region: &Region3D<i32>, f: F)
where
    F: Fn(bool, bool) -> bool + Sync + Send,
{
    if region.is_empty() {
        return;
    }
    let (x0, x1, y0, y1) = (
        region.min_x as usize,
        region.max_x as usize,
        region.min_y as usize,
        region.max_y as usize,
    );
    let z_range = region.min_z as usize..=region.max_z as usize;
    let other = other.array();
    par::for_each_z_slice_mut(ans.array_mut(), |z, mut slice| {
        if !z_range.contains(&z) {
            return;
        }
        let rhs = other.slice(s![z, y0..=y1, x0..=x1]);
        slice
            .slice_mut(s![y0..=y1, x0..=x1])
            .zip_mut_with(&rhs, |l, &r| {
                *l = if f(mask::is_foreground(*l), mask::is_foreground(r)) {
                    mask::FOREGROUND
                } else {
                    mask::BACKGROUND
                };
            });
    });
}

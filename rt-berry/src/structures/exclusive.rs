//! 真值结构列表与按优先级的结构互斥.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use ndarray::{ArrayViewMut2, Axis};

use super::{normalize_name, StructureSet};
use crate::consts::{mask, names};
use crate::error::StructureError;
use crate::par;

/// 真值结构列表中的一项.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroundTruthEntry {
    /// 结构名 (已规范化).
    pub name: String,

    /// 为 `true` 时该结构被接受, 但不参与互斥.
    pub exempt: bool,
}

/// 按优先级从高到低排列的真值结构列表.
///
/// 文本形式为逗号分隔的结构名, 例如 `"ptv,+body,rectum,*"`.
/// 带 `+` 前缀的结构不参与互斥; `*` 表示接受所有结构.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<String>", into = "Vec<String>")
)]
pub struct GroundTruth {
    entries: Vec<GroundTruthEntry>,
    wildcard: bool,
}

impl GroundTruth {
    /// 由若干项构建. 重复的结构名只保留第一次出现.
    ///
    /// 空项返回 `Err(StructureError::Malformed)`.
    pub fn from_items<S: AsRef<str>>(items: &[S]) -> Result<Self, StructureError> {
        let mut ans = Self::default();
        for item in items.iter().map(|s| s.as_ref().trim()) {
            if item == names::WILDCARD {
                ans.wildcard = true;
                continue;
            }
            let (name, exempt) = match item.strip_prefix(names::EXEMPT_PREFIX) {
                Some(n) => (normalize_name(n), true),
                None => (normalize_name(item), false),
            };
            if name.is_empty() {
                return Err(StructureError::Malformed(item.to_string()));
            }
            if !ans.entries.iter().any(|e| e.name == name) {
                ans.entries.push(GroundTruthEntry { name, exempt });
            }
        }
        Ok(ans)
    }

    /// 所有具名项, 按优先级排列.
    #[inline]
    pub fn entries(&self) -> &[GroundTruthEntry] {
        &self.entries
    }

    /// 是否含通配符 `*`.
    #[inline]
    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    /// 是否既没有具名项也没有通配符.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && !self.wildcard
    }

    /// 结构 `name` 是否被接受.
    pub fn accepts(&self, name: &str) -> bool {
        self.wildcard || self.entries.iter().any(|e| e.name == name)
    }

    /// 参与互斥的结构名, 按优先级排列.
    pub fn exclusive_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|e| !e.exempt)
            .map(|e| e.name.as_str())
    }
}

impl FromStr for GroundTruth {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let items: Vec<&str> = s.split(names::OLD_NAME_SEP).collect();
        Self::from_items(&items)
    }
}

impl TryFrom<Vec<String>> for GroundTruth {
    type Error = StructureError;

    #[inline]
    fn try_from(items: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_items(&items)
    }
}

impl From<GroundTruth> for Vec<String> {
    fn from(gt: GroundTruth) -> Self {
        let mut ans: Vec<String> = gt
            .entries
            .into_iter()
            .map(|e| {
                if e.exempt {
                    format!("{}{}", names::EXEMPT_PREFIX, e.name)
                } else {
                    e.name
                }
            })
            .collect();
        if gt.wildcard {
            ans.push(names::WILDCARD.to_string());
        }
        ans
    }
}

impl fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.clone().into();
        f.write_str(&items.iter().join(","))
    }
}

/// 结构互斥的结果.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExclusionReport {
    /// `(保留者, 被清除者)` → 被清除的体素个数. 只含非零项.
    pub masked: BTreeMap<(String, String), usize>,

    /// 存在但不被真值列表接受的结构名.
    pub unrecognized: Vec<String>,
}

impl StructureSet {
    /// 按 `ground_truth` 的优先级使结构两两互斥.
    ///
    /// 对每个体素, 优先级最高的前景结构保留该体素, 其余参与互斥的结构在该处被清除.
    /// 豁免结构 (`+名称`) 既不清除别人, 也不被清除.
    pub fn make_mutually_exclusive(&mut self, ground_truth: &GroundTruth) -> ExclusionReport {
        let unrecognized: Vec<String> = self
            .names()
            .filter(|n| !ground_truth.accepts(n))
            .map(String::from)
            .collect();

        let priority: Vec<String> = ground_truth
            .exclusive_names()
            .filter(|n| self.masks.contains_key(*n))
            .map(String::from)
            .collect();
        let n = priority.len();
        if n < 2 {
            return ExclusionReport {
                masked: BTreeMap::new(),
                unrecognized,
            };
        }

        let dz = self.geometry.dim()[2];
        let mut slices: Vec<Vec<ArrayViewMut2<'_, u8>>> =
            (0..dz).map(|_| Vec::with_capacity(n)).collect();
        for m in self.get_many_mut(&priority) {
            for (z, s) in m.array_mut().axis_iter_mut(Axis(0)).enumerate() {
                slices[z].push(s);
            }
        }

        let per_slice = par::map_vec(slices, |views| exclude_slice(views, n));
        let mut counts = vec![0usize; n * n];
        for partial in per_slice {
            counts.iter_mut().zip(partial).for_each(|(c, p)| *c += p);
        }

        let masked = itertools::iproduct!(0..n, 0..n)
            .filter(|&(w, l)| counts[w * n + l] > 0)
            .map(|(w, l)| {
                let key = (priority[w].clone(), priority[l].clone());
                (key, counts[w * n + l])
            })
            .collect();
        ExclusionReport {
            masked,
            unrecognized,
        }
    }
}

/// 在一个水平切片上执行互斥. `views` 按优先级排列.
///
/// 返回 `n * n` 的计数矩阵, `[w * n + l]` 为 `w` 从 `l` 中清除的体素数.
fn exclude_slice(mut views: Vec<ArrayViewMut2<'_, u8>>, n: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n * n];
    let mut iters: Vec<_> = views.iter_mut().map(|v| v.iter_mut()).collect();
    let len = iters.first().map_or(0, |it| it.len());
    for _ in 0..len {
        let mut winner = None;
        for (k, it) in iters.iter_mut().enumerate() {
            let Some(p) = it.next() else {
                continue;
            };
            if !mask::is_foreground(*p) {
                continue;
            }
            match winner {
                None => winner = Some(k),
                Some(w) => {
                    *p = mask::BACKGROUND;
                    counts[w * n + k] += 1;
                }
            }
        }
    }
    counts
}

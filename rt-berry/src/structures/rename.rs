//! 结构重命名与增广.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use super::{normalize_name, StructureOperation, StructureSet};
use crate::consts::{mask, names};
use crate::data::Volume3D;
use crate::error::StructureError;

/// 一条重命名规则: 若干候选旧名 → 新名.
///
/// 文本形式为 `旧名1,旧名2:新名`. 新名带 `+` 前缀 (`旧名:+新名`) 时为增广规则,
/// 即把旧结构的体素并入已有的新结构, 而不是替换它. 旧名可以是结构运算表达式.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct NameMapping {
    /// 候选旧名, 按优先级排列.
    pub old_names: Vec<String>,

    /// 新名.
    pub new_name: String,

    /// 是否为增广规则.
    pub augment: bool,
}

impl NameMapping {
    /// 直接初始化. 名称会被规范化.
    pub fn new<S: AsRef<str>>(old_names: &[S], new_name: &str, augment: bool) -> Self {
        Self {
            old_names: old_names.iter().map(|s| normalize_name(s.as_ref())).collect(),
            new_name: normalize_name(new_name),
            augment,
        }
    }
}

impl FromStr for NameMapping {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || StructureError::Malformed(s.to_string());
        let (old, new) = s.split_once(names::MAPPING_SEP).ok_or_else(malformed)?;
        let new = new.trim();
        let (new, augment) = match new.strip_prefix(names::AUGMENT_PREFIX) {
            Some(n) => (n, true),
            None => (new, false),
        };
        let old_names: Vec<&str> = old.split(names::OLD_NAME_SEP).map(str::trim).collect();
        let new = normalize_name(new);
        if new.is_empty() || new.contains(names::MAPPING_SEP) || old_names.iter().any(|n| n.is_empty())
        {
            return Err(malformed());
        }
        Ok(Self::new(&old_names, &new, augment))
    }
}

impl TryFrom<String> for NameMapping {
    type Error = StructureError;

    #[inline]
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NameMapping> for String {
    #[inline]
    fn from(m: NameMapping) -> Self {
        m.to_string()
    }
}

impl fmt::Display for NameMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old_names.iter().join(&names::OLD_NAME_SEP.to_string());
        let prefix = if self.augment { "+" } else { "" };
        write!(f, "{old}{}{prefix}{}", names::MAPPING_SEP, self.new_name)
    }
}

/// 一次实际生效的重命名.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppliedRename {
    /// 生效的旧名 (或运算表达式).
    pub from: String,

    /// 新名.
    pub to: String,

    /// 是否为增广.
    pub augment: bool,
}

/// `target |= source`.
fn or_into(target: &mut Volume3D<u8>, source: &Volume3D<u8>) {
    target
        .array_mut()
        .zip_mut_with(source.array(), |t, &s| {
            if mask::is_foreground(s) {
                *t = mask::FOREGROUND;
            }
        });
}

/// `target &= !source`.
fn clear_from(target: &mut Volume3D<u8>, source: &Volume3D<u8>) {
    target
        .array_mut()
        .zip_mut_with(source.array(), |t, &s| {
            if mask::is_foreground(s) {
                *t = mask::BACKGROUND;
            }
        });
}

impl StructureSet {
    /// 按单条 `旧名 → 新名` 重命名或增广.
    ///
    /// `old` 可以是结构运算表达式:
    ///
    /// - 两个操作数都存在时计算运算结果. 增广时把结果并入 `new`
    ///   (`new` 不存在则创建), 同时从左操作数中移除这些体素, 两个掩膜一并更新;
    ///   否则把结果写为新结构 `new`.
    /// - 任一操作数不存在时什么也不做.
    ///
    /// 否则 `old` 按普通结构名处理: 增广时把 `old` 并入 `new` 并移除 `old`,
    /// 否则把 `old` 改名为 `new`.
    ///
    /// # 返回值
    ///
    /// - 是否实际做了修改. `old == new` 视为已完成, 返回 `Ok(true)`;
    /// - 非增广且 `new` 已存在, 并且 `allow_clash == false` 时返回
    ///   `Err(StructureError::NameClash)`.
    pub fn rename_or_augment(
        &mut self,
        old: &str,
        new: &str,
        augment: bool,
        allow_clash: bool,
    ) -> Result<bool, StructureError> {
        let new = normalize_name(new);
        if let Some(op) = StructureOperation::parse(old) {
            let (Some(left), Some(right)) = (self.masks.get(&op.left), self.masks.get(&op.right))
            else {
                return Ok(false);
            };
            let result = op.apply(left, right)?;
            if augment {
                self.augment_with(&new, &op.left, result)?;
            } else {
                if !allow_clash && self.masks.contains_key(&new) {
                    return Err(StructureError::NameClash(new));
                }
                self.put(new, result)?;
            }
            return Ok(true);
        }

        let old = normalize_name(old);
        if !self.masks.contains_key(&old) {
            return Ok(false);
        }
        if old == new {
            return Ok(true);
        }
        if !augment && !allow_clash && self.masks.contains_key(&new) {
            return Err(StructureError::NameClash(new));
        }
        let Some(source) = self.masks.remove(&old) else {
            return Ok(false);
        };
        match self.masks.get_mut(&new) {
            Some(target) if augment => or_into(target, &source),
            _ => {
                self.masks.insert(new, source);
            }
        }
        Ok(true)
    }

    /// 把 `result` 并入 `target`, 并从 `left` 中移除 `result` 的体素.
    ///
    /// 两个新掩膜都计算完成后才写回.
    fn augment_with(
        &mut self,
        target: &str,
        left: &str,
        result: Volume3D<u8>,
    ) -> Result<(), StructureError> {
        let new_target = match self.masks.get(target) {
            Some(t) => {
                let mut t = t.clone();
                or_into(&mut t, &result);
                t
            }
            None => result.clone(),
        };
        if target == left {
            return self.put(target.to_string(), new_target);
        }
        let new_left = self.masks.get(left).map(|l| {
            let mut l = l.clone();
            clear_from(&mut l, &result);
            l
        });
        self.put(target.to_string(), new_target)?;
        if let Some(l) = new_left {
            self.put(left.to_string(), l)?;
        }
        Ok(())
    }

    /// 按顺序执行一组重命名规则.
    ///
    /// 对每条规则, 依次尝试各个候选旧名, 第一个生效的旧名即结束该规则.
    /// `allow_clash == false` 时, 非增广规则的所有旧名与新名中最多只能有一个
    /// 已经存在, 否则返回 `Err(StructureError::AmbiguousRename)`.
    ///
    /// 返回实际生效的重命名.
    pub fn rename(
        &mut self,
        rules: &[NameMapping],
        allow_clash: bool,
    ) -> Result<Vec<AppliedRename>, StructureError> {
        let mut ans = vec![];
        for rule in rules {
            if !allow_clash && !rule.augment {
                let existing: Vec<String> = rule
                    .old_names
                    .iter()
                    .chain(std::iter::once(&rule.new_name))
                    .unique()
                    .filter(|n| self.masks.contains_key(*n))
                    .cloned()
                    .collect();
                if existing.len() > 1 {
                    return Err(StructureError::AmbiguousRename {
                        rule: rule.to_string(),
                        existing,
                    });
                }
            }
            for old in rule.old_names.iter() {
                if self.rename_or_augment(old, &rule.new_name, rule.augment, allow_clash)? {
                    ans.push(AppliedRename {
                        from: old.clone(),
                        to: rule.new_name.clone(),
                        augment: rule.augment,
                    });
                    break;
                }
            }
        }
        Ok(ans)
    }
}

#[cfg(test)]
mod tests {
    use super::NameMapping;
    use crate::data::{Region3D, Volume};
    use crate::error::StructureError;
    use crate::structures::testing::{boxed, geometry};
    use crate::structures::StructureSet;

    const DIM: [usize; 3] = [4, 4, 4];

    fn set(entries: &[(&str, Region3D<i32>)]) -> StructureSet {
        let mut s = StructureSet::new(geometry(DIM));
        for (n, r) in entries {
            s.insert(n, boxed(DIM, *r)).unwrap();
        }
        s
    }

    fn count(s: &StructureSet, name: &str) -> usize {
        s.get(name).unwrap().count_where(|&p| p == 1)
    }

    #[test]
    fn test_parse_mapping() {
        let m: NameMapping = "Heart, Coeur :HEART_".parse().unwrap();
        assert_eq!(m, NameMapping::new(&["heart", "coeur"], "heart_", false));
        assert_eq!(m.to_string(), "heart,coeur:heart_");

        let m: NameMapping = "ptv.minus.rectum:+ptv_opt".parse().unwrap();
        assert!(m.augment);
        assert_eq!(m.old_names, vec!["ptv.minus.rectum"]);
        assert_eq!(m.to_string(), "ptv.minus.rectum:+ptv_opt");

        for bad in ["heart", "a,,b:c", "a:", "a:+", ":b"] {
            assert!(
                matches!(bad.parse::<NameMapping>(), Err(StructureError::Malformed(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_literal_rename() {
        let r = Region3D::new(0, 0, 0, 1, 1, 1);
        let mut s = set(&[("Coeur", r)]);
        assert_eq!(s.rename_or_augment("coeur", "Heart", false, false), Ok(true));
        assert!(!s.contains("coeur"));
        assert_eq!(count(&s, "heart"), 8);
        assert_eq!(s.rename_or_augment("missing", "x", false, false), Ok(false));
        assert_eq!(s.rename_or_augment("heart", "heart", false, false), Ok(true));
    }

    #[test]
    fn test_rename_clash() {
        let mut s = set(&[
            ("a", Region3D::new(0, 0, 0, 0, 0, 0)),
            ("b", Region3D::new(0, 0, 0, 1, 1, 1)),
        ]);
        assert_eq!(
            s.rename_or_augment("a", "b", false, false),
            Err(StructureError::NameClash("b".into()))
        );
        assert_eq!(s.len(), 2);
        assert_eq!(s.rename_or_augment("a", "b", false, true), Ok(true));
        assert_eq!(s.len(), 1);
        assert_eq!(count(&s, "b"), 1);
    }

    #[test]
    fn test_literal_augment() {
        let mut s = set(&[
            ("a", Region3D::new(0, 0, 0, 0, 0, 0)),
            ("b", Region3D::new(1, 1, 1, 2, 2, 2)),
        ]);
        assert_eq!(s.rename_or_augment("a", "b", true, false), Ok(true));
        assert!(!s.contains("a"));
        assert_eq!(count(&s, "b"), 9);
        // 目标不存在时退化为改名.
        assert_eq!(s.rename_or_augment("b", "c", true, false), Ok(true));
        assert_eq!(count(&s, "c"), 9);
    }

    #[test]
    fn test_operation_rename_and_augment() {
        let mut s = set(&[
            ("ptv", Region3D::new(0, 0, 0, 3, 3, 3)),
            ("rectum", Region3D::new(0, 0, 0, 3, 3, 1)),
            ("ring", Region3D::new(0, 0, 3, 0, 0, 3)),
        ]);
        assert_eq!(
            s.rename_or_augment("ptv.minus.rectum", "ptv_opt", false, false),
            Ok(true)
        );
        assert_eq!(count(&s, "ptv_opt"), 32);
        assert_eq!(count(&s, "ptv"), 64);
        assert_eq!(
            s.rename_or_augment("ptv.minus.rectum", "ptv_opt", false, false),
            Err(StructureError::NameClash("ptv_opt".into()))
        );
        assert_eq!(
            s.rename_or_augment("ptv.minus.nothing", "x", false, false),
            Ok(false)
        );

        // 增广: 结果并入 ring, 同时从 ptv 中移除.
        assert_eq!(
            s.rename_or_augment("ptv.intersection.rectum", "ring", true, false),
            Ok(true)
        );
        assert_eq!(count(&s, "ring"), 32 + 1);
        assert_eq!(count(&s, "ptv"), 32);
        assert_eq!(count(&s, "rectum"), 32);
    }

    #[test]
    fn test_batch_rename() {
        let r = Region3D::new(0, 0, 0, 1, 1, 1);
        let mut s = set(&[("coeur", r), ("lung_l", r)]);
        let rules: Vec<NameMapping> = ["herz,coeur,heart_old:heart", "lung_l:lung_left"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        let applied = s.rename(&rules, false).unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].from, "coeur");
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["heart", "lung_left"]);
    }

    #[test]
    fn test_batch_rename_ambiguous() {
        let r = Region3D::new(0, 0, 0, 1, 1, 1);
        let mut s = set(&[("coeur", r), ("herz", r)]);
        let rules = vec!["herz,coeur:heart".parse::<NameMapping>().unwrap()];
        assert!(matches!(
            s.rename(&rules, false),
            Err(StructureError::AmbiguousRename { .. })
        ));
        // 允许重名时第一个候选胜出.
        let applied = s.rename(&rules, true).unwrap();
        assert_eq!(applied[0].from, "herz");
        assert!(s.contains("coeur"));

        // 增广规则的目标应当已经存在, 不视为歧义.
        let rules = vec!["coeur:+heart".parse::<NameMapping>().unwrap()];
        assert_eq!(s.rename(&rules, false).unwrap().len(), 1);
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["heart"]);
    }
}

use std::fmt;
use std::str::FromStr;

use super::{normalize_name, StructureOperation, StructureSet};
use crate::consts::names;
use crate::error::StructureError;

/// 派生结构: 由结构运算生成的新结构.
///
/// 文本形式为 `左操作数.运算符.右操作数:结果名`, 例如 `"ptv.minus.rectum:ptv_opt"`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct DerivedStructure {
    /// 结构运算.
    pub operation: StructureOperation,

    /// 结果结构名 (已规范化).
    pub result: String,
}

impl FromStr for DerivedStructure {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || StructureError::Malformed(s.to_string());
        let (op, result) = s.rsplit_once(names::MAPPING_SEP).ok_or_else(malformed)?;
        let operation = StructureOperation::parse(op).ok_or_else(malformed)?;
        let result = normalize_name(result);
        if result.is_empty() {
            return Err(malformed());
        }
        Ok(Self { operation, result })
    }
}

impl TryFrom<String> for DerivedStructure {
    type Error = StructureError;

    #[inline]
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DerivedStructure> for String {
    #[inline]
    fn from(d: DerivedStructure) -> Self {
        d.to_string()
    }
}

impl fmt::Display for DerivedStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.operation, names::MAPPING_SEP, self.result)
    }
}

impl StructureSet {
    /// 计算派生结构并加入结构集.
    ///
    /// # 返回值
    ///
    /// - 任一操作数不存在时返回 `Err(StructureError::MissingStructure)`;
    /// - 结果结构已存在且 `allow_clash == false` 时返回 `Err(StructureError::NameClash)`.
    pub fn derive(&mut self, derived: &DerivedStructure, allow_clash: bool) -> Result<(), StructureError> {
        let op = &derived.operation;
        let left = self
            .masks
            .get(&op.left)
            .ok_or_else(|| StructureError::MissingStructure(op.left.clone()))?;
        let right = self
            .masks
            .get(&op.right)
            .ok_or_else(|| StructureError::MissingStructure(op.right.clone()))?;
        if !allow_clash && self.masks.contains_key(&derived.result) {
            return Err(StructureError::NameClash(derived.result.clone()));
        }
        let result = op.apply(left, right)?;
        self.put(derived.result.clone(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::DerivedStructure;
    use crate::data::{Region3D, Volume};
    use crate::error::StructureError;
    use crate::structures::testing::{boxed, geometry};
    use crate::structures::{Operator, StructureSet};

    #[test]
    fn test_parse_derived() {
        let d: DerivedStructure = "PTV.minus.Rectum : PTV_opt".parse().unwrap();
        assert_eq!(d.operation.op, Operator::Minus);
        assert_eq!(d.result, "ptv_opt");
        assert_eq!(d.to_string(), "ptv.minus.rectum:ptv_opt");
        assert!("ptv:opt".parse::<DerivedStructure>().is_err());
        assert!("a.union.b:".parse::<DerivedStructure>().is_err());
        assert!("a.union.b".parse::<DerivedStructure>().is_err());
    }

    #[test]
    fn test_derive() {
        let dim = [4, 4, 4];
        let mut s = StructureSet::new(geometry(dim));
        s.insert("a", boxed(dim, Region3D::new(0, 0, 0, 1, 1, 1))).unwrap();
        s.insert("b", boxed(dim, Region3D::new(1, 1, 1, 2, 2, 2))).unwrap();

        let d: DerivedStructure = "a.union.b:ab".parse().unwrap();
        s.derive(&d, false).unwrap();
        assert_eq!(s.get("ab").unwrap().count_where(|&p| p == 1), 15);
        assert_eq!(
            s.derive(&d, false),
            Err(StructureError::NameClash("ab".into()))
        );
        assert!(s.derive(&d, true).is_ok());

        let d: DerivedStructure = "a.minus.c:ac".parse().unwrap();
        assert_eq!(
            s.derive(&d, false),
            Err(StructureError::MissingStructure("c".into()))
        );
    }
}

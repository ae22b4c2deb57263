//! 结构集: 结构名到二值掩膜的映射, 及其上的重命名、派生与互斥运算.
//!
//! 结构集中的所有掩膜与所属扫描体积共享同一个体素网格,
//! 掩膜体素只取 [`mask::BACKGROUND`] 或 [`mask::FOREGROUND`].

use std::collections::btree_map::{self, BTreeMap};

use crate::consts::mask;
use crate::data::{Volume, Volume3D, VolumeGeometry};
use crate::error::StructureError;
use crate::resample::{resample_onto, Interpolation};

mod derived;
mod exclusive;
mod operation;
mod rename;

pub use derived::DerivedStructure;
pub use exclusive::{ExclusionReport, GroundTruth, GroundTruthEntry};
pub use operation::{Operator, StructureOperation};
pub use rename::{AppliedRename, NameMapping};

/// 规范化结构名: 去除首尾空白并转为小写.
#[inline]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 结构名到二值掩膜的映射.
///
/// 键总是规范化后的结构名 (见 [`normalize_name`]), 按字典序排列.
#[derive(Debug, Clone)]
pub struct StructureSet {
    geometry: VolumeGeometry,
    masks: BTreeMap<String, Volume3D<u8>>,
}

impl StructureSet {
    /// 创建与 `geometry` 对应的空结构集.
    pub fn new(geometry: VolumeGeometry) -> Self {
        Self {
            geometry,
            masks: BTreeMap::new(),
        }
    }

    /// 所有掩膜共享的几何信息.
    #[inline]
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// 结构个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// 是否不含任何结构.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// 是否含有名为 `name` 的结构. `name` 会先被规范化.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.masks.contains_key(&normalize_name(name))
    }

    /// 获取结构掩膜.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Volume3D<u8>> {
        self.masks.get(&normalize_name(name))
    }

    /// 获取可变结构掩膜.
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Volume3D<u8>> {
        self.masks.get_mut(&normalize_name(name))
    }

    /// 移除并返回结构掩膜.
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Volume3D<u8>> {
        self.masks.remove(&normalize_name(name))
    }

    /// 按字典序遍历结构名.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.masks.keys().map(String::as_str)
    }

    /// 按字典序遍历 `(结构名, 掩膜)`.
    #[inline]
    pub fn iter(&self) -> btree_map::Iter<'_, String, Volume3D<u8>> {
        self.masks.iter()
    }

    /// 加入一个新载入的结构. 掩膜会被二值化.
    ///
    /// # 返回值
    ///
    /// - 规范化后的结构名已存在时不做修改, 返回 `Ok(false)` (保留先载入者);
    /// - 掩膜几何与结构集不一致时返回 `Err(StructureError::GeometryMismatch)`;
    /// - 否则返回 `Ok(true)`.
    pub fn insert(&mut self, name: &str, mut volume: Volume3D<u8>) -> Result<bool, StructureError> {
        let name = normalize_name(name);
        self.check_geometry(&name, &volume)?;
        match self.masks.entry(name) {
            btree_map::Entry::Occupied(_) => Ok(false),
            btree_map::Entry::Vacant(e) => {
                volume
                    .as_slice_mut()
                    .iter_mut()
                    .for_each(|p| *p = mask::binarize(*p));
                e.insert(volume);
                Ok(true)
            }
        }
    }

    /// 写入结构, 名称已存在时覆盖. `name` 必须已经规范化.
    pub(crate) fn put(&mut self, name: String, volume: Volume3D<u8>) -> Result<(), StructureError> {
        self.check_geometry(&name, &volume)?;
        self.masks.insert(name, volume);
        Ok(())
    }

    /// 仅保留满足 `f(结构名)` 的结构, 返回被移除的结构名.
    pub fn retain_names<F: FnMut(&str) -> bool>(&mut self, mut f: F) -> Vec<String> {
        let removed: Vec<String> = self.names().filter(|n| !f(*n)).map(String::from).collect();
        for n in removed.iter() {
            self.masks.remove(n);
        }
        removed
    }

    /// 将所有掩膜以最近邻方式重采样到 `geometry`.
    pub fn resample_onto(&self, geometry: &VolumeGeometry) -> Self {
        let masks = self
            .masks
            .iter()
            .map(|(k, v)| {
                let m = resample_onto(v, geometry, Interpolation::Nearest, mask::BACKGROUND);
                (k.clone(), m)
            })
            .collect();
        Self {
            geometry: *geometry,
            masks,
        }
    }

    fn check_geometry(&self, name: &str, volume: &Volume3D<u8>) -> Result<(), StructureError> {
        if volume.geometry().same_grid(&self.geometry) {
            Ok(())
        } else {
            Err(StructureError::GeometryMismatch(
                name.to_string(),
                "<scan>".to_string(),
            ))
        }
    }

    /// 同时取得多个结构的可变引用, 顺序与 `names` 一致. 不存在的结构被跳过.
    ///
    /// `names` 中不能有重复项.
    pub(crate) fn get_many_mut(&mut self, names: &[String]) -> Vec<&mut Volume3D<u8>> {
        let mut found: BTreeMap<&str, &mut Volume3D<u8>> = self
            .masks
            .iter_mut()
            .filter(|(k, _)| names.contains(*k))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        names
            .iter()
            .filter_map(|n| found.remove(n.as_str()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a StructureSet {
    type Item = (&'a String, &'a Volume3D<u8>);
    type IntoIter = btree_map::Iter<'a, String, Volume3D<u8>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 测试辅助: 在 `dim` 网格上创建掩膜.
#[cfg(test)]
pub(crate) mod testing {
    use crate::data::{Region3D, Volume3D, VolumeGeometry};

    pub(crate) fn geometry(dim: [usize; 3]) -> VolumeGeometry {
        VolumeGeometry::with_spacing(dim, [1.0, 1.0, 1.0]).unwrap()
    }

    /// `region` 内为前景的掩膜.
    pub(crate) fn boxed(dim: [usize; 3], region: Region3D<i32>) -> Volume3D<u8> {
        let mut v = Volume3D::new(geometry(dim));
        for z in 0..dim[2] {
            for y in 0..dim[1] {
                for x in 0..dim[0] {
                    if region.contains(x as i32, y as i32, z as i32) {
                        v.set(x, y, z, 1);
                    }
                }
            }
        }
        v
    }

    pub(crate) fn full(dim: [usize; 3]) -> Volume3D<u8> {
        let [x, y, z] = dim.map(|d| d as i32 - 1);
        boxed(dim, Region3D::new(0, 0, 0, x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{full, geometry};
    use super::{normalize_name, StructureSet};
    use crate::data::{Volume, Volume3D};
    use crate::error::StructureError;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Heart "), "heart");
        assert_eq!(normalize_name("PTV_High"), "ptv_high");
    }

    #[test]
    fn test_insert_first_wins() {
        let mut s = StructureSet::new(geometry([2, 2, 2]));
        let mut a = Volume3D::<u8>::new(geometry([2, 2, 2]));
        a.set(0, 0, 0, 255);
        assert_eq!(s.insert("Liver", a), Ok(true));
        assert_eq!(s.insert("LIVER", full([2, 2, 2])), Ok(false));
        assert_eq!(s.len(), 1);
        let m = s.get("liver").unwrap();
        assert_eq!(m.as_slice(), &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert!(s.contains(" Liver"));
    }

    #[test]
    fn test_insert_geometry_mismatch() {
        let mut s = StructureSet::new(geometry([2, 2, 2]));
        let r = s.insert("a", full([2, 2, 3]));
        assert!(matches!(r, Err(StructureError::GeometryMismatch(..))));
    }

    #[test]
    fn test_get_many_mut_and_retain() {
        let mut s = StructureSet::new(geometry([2, 2, 2]));
        for n in ["a", "b", "c"] {
            s.insert(n, full([2, 2, 2])).unwrap();
        }
        let names = ["c".to_string(), "x".to_string(), "a".to_string()];
        let many = s.get_many_mut(&names);
        assert_eq!(many.len(), 2);
        many.into_iter().for_each(|m| m.fill(0));
        assert_eq!(s.get("a").unwrap().count_where(|&p| p == 1), 0);
        assert_eq!(s.get("b").unwrap().count_where(|&p| p == 1), 8);

        let removed = s.retain_names(|n| n != "b");
        assert_eq!(removed, vec!["b"]);
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["a", "c"]);

        let removed = s.retain_names(|n| n == "c");
        assert_eq!(removed, vec!["a"]);
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["c"]);
    }
}

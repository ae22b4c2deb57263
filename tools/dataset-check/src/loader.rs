//! 对 `rt-berry::dataset` 的更一层封装. 从目录树加载受试者.
//!
//! 目录布局:
//!
//! ```text
//! <root>/<subject>/<channel>.nii[.gz]                     扫描
//! <root>/<subject>/structures/<name>.nii[.gz]             引用通道的结构
//! <root>/<subject>/structures/<channel>/<name>.nii[.gz]   其它通道的结构
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rt_berry::dataset::nifti_io::{open_mask, open_scan};
use rt_berry::dataset::{ChannelMetadata, ChannelRecord, SubjectRecord};

use crate::CheckError;

/// 结构掩膜所在子目录名.
const STRUCTURES_DIR: &str = "structures";

/// 去掉 `.nii` 或 `.nii.gz` 后缀. 不是 nii 文件时返回 `None`.
fn nii_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_suffix(".nii.gz")
        .or_else(|| name.strip_suffix(".nii"))?;
    (!stem.is_empty()).then(|| stem.to_string())
}

/// 目录下的所有 nii 文件, 按文件名排序.
fn nii_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, CheckError> {
    let mut ans = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = nii_stem(&path) {
            ans.push((stem, path));
        }
    }
    ans.sort();
    Ok(ans)
}

/// 目录下的所有子目录, 按目录名排序.
pub fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, CheckError> {
    let mut ans = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            ans.push(path);
        }
    }
    ans.sort();
    Ok(ans)
}

/// 加载单个受试者. 受试者编号取目录名, 序列编号取 `受试者编号.通道名`.
pub fn load_subject(dir: &Path, reference_channel: &str) -> Result<SubjectRecord, CheckError> {
    let id = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CheckError::BadPath(dir.to_path_buf()))?;
    let mut subject = SubjectRecord::new(id);

    for (channel, path) in nii_files(dir)? {
        let meta = ChannelMetadata::new(id, &format!("{id}.{channel}"), &channel);
        subject.channels.push(ChannelRecord::new(meta, open_scan(path)?));
    }

    let structures = dir.join(STRUCTURES_DIR);
    if !structures.is_dir() {
        return Ok(subject);
    }
    for (name, path) in nii_files(&structures)? {
        subject.add_structure(reference_channel, &name, open_mask(path)?)?;
    }
    for path in subdirs(&structures)? {
        let Some(channel) = path.file_name() else {
            continue;
        };
        let channel = channel.to_string_lossy().into_owned();
        for (name, mask) in nii_files(&path)? {
            subject.add_structure(&channel, &name, open_mask(mask)?)?;
        }
    }
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::{nii_files, nii_stem, subdirs};
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_nii_stem() {
        assert_eq!(nii_stem(Path::new("a/ct.nii.gz")).as_deref(), Some("ct"));
        assert_eq!(nii_stem(Path::new("mr.nii")).as_deref(), Some("mr"));
        assert_eq!(nii_stem(Path::new("notes.txt")), None);
        assert_eq!(nii_stem(Path::new(".nii")), None);
    }

    #[test]
    fn test_sorted_listing() {
        let root = std::env::temp_dir().join(format!("dataset-check-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        for d in ["mr", "ct", "pet"] {
            fs::create_dir_all(root.join(d)).unwrap();
        }
        for f in ["b.nii", "a.nii.gz", "notes.txt"] {
            fs::write(root.join(f), b"").unwrap();
        }

        let dirs: Vec<_> = subdirs(&root)
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(dirs, ["ct", "mr", "pet"]);

        let files: Vec<_> = nii_files(&root).unwrap().into_iter().map(|(s, _)| s).collect();
        assert_eq!(files, ["a", "b"]);

        fs::remove_dir_all(&root).unwrap();
    }
}

//! 数据集操作: 受试者记录、转换配置、nii 读取与转换流水线.

use std::path::{Path, PathBuf};

mod config;
pub mod nifti_io;
mod pipeline;
mod record;
mod report;

pub use config::{ConversionConfig, DEFAULT_REFERENCE_CHANNEL};
pub use pipeline::{convert_dataset, process_subject};
pub use record::{ChannelMetadata, ChannelRecord, SubjectRecord};
pub use report::{DatasetReport, SubjectReport, SubjectStatus};

/// 数据集根目录的环境变量名.
pub const DATASET_DIR_ENV: &str = "RT_DATASET_DIR";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 数据集根目录: 优先取环境变量 [`DATASET_DIR_ENV`], 否则为 [`home_dataset_dir`].
pub fn dataset_dir() -> Option<PathBuf> {
    match std::env::var_os(DATASET_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => home_dataset_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::{home_dataset_dir, home_dataset_dir_with};

    #[test]
    fn test_home_dataset_dir_with() {
        if let Some(root) = home_dataset_dir() {
            let p = home_dataset_dir_with(["s01", "ct.nii.gz"]).unwrap();
            assert_eq!(p, root.join("s01").join("ct.nii.gz"));
        }
    }
}

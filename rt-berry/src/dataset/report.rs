//! 受试者与数据集级别的转换报告.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{info, warn};

use crate::structures::AppliedRename;

/// 受试者的转换结果.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubjectStatus {
    /// 转换成功.
    Converted,

    /// 已丢弃, 附带原因.
    Discarded(String),
}

/// 单个受试者的转换报告.
///
/// 结构名均为 `通道名/结构名` 形式.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectReport {
    /// 受试者编号.
    pub subject_id: String,

    /// 转换结果.
    pub status: SubjectStatus,

    /// 生效的重命名.
    pub renamed: Vec<AppliedRename>,

    /// 新增的结构.
    pub added: Vec<String>,

    /// 移除的结构.
    pub removed: Vec<String>,

    /// 互斥中被清除的体素数, `(保留者, 被清除者) → 体素数`.
    pub masked: BTreeMap<(String, String), usize>,

    /// 不被真值列表接受的结构.
    pub unrecognized: Vec<String>,

    /// 警告.
    pub warnings: Vec<String>,
}

impl SubjectReport {
    /// 创建转换成功、其余为空的报告.
    pub fn new(subject_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            status: SubjectStatus::Converted,
            renamed: vec![],
            added: vec![],
            removed: vec![],
            masked: BTreeMap::new(),
            unrecognized: vec![],
            warnings: vec![],
        }
    }

    /// 创建已丢弃的报告.
    pub fn discarded(subject_id: &str, reason: String, warnings: Vec<String>) -> Self {
        Self {
            status: SubjectStatus::Discarded(reason),
            warnings,
            ..Self::new(subject_id)
        }
    }

    /// 是否转换成功.
    #[inline]
    pub fn is_converted(&self) -> bool {
        self.status == SubjectStatus::Converted
    }

    /// 通过 `log` 输出报告.
    pub fn log(&self) {
        let id = &self.subject_id;
        match &self.status {
            SubjectStatus::Converted => info!("[{id}] converted"),
            SubjectStatus::Discarded(reason) => warn!("[{id}] discarded: {reason}"),
        }
        for r in self.renamed.iter() {
            let kind = if r.augment { "augmented into" } else { "renamed to" };
            info!("[{id}] `{}` {kind} `{}`", r.from, r.to);
        }
        if !self.added.is_empty() {
            info!("[{id}] added: {}", self.added.iter().join(", "));
        }
        if !self.removed.is_empty() {
            info!("[{id}] removed: {}", self.removed.iter().join(", "));
        }
        if !self.unrecognized.is_empty() {
            info!("[{id}] unrecognized: {}", self.unrecognized.iter().join(", "));
        }
        for ((winner, loser), n) in self.masked.iter() {
            info!("[{id}] {n} voxels of `{loser}` masked by `{winner}`");
        }
        for w in self.warnings.iter() {
            warn!("[{id}] {w}");
        }
    }
}

/// 整个数据集的转换报告.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetReport {
    /// 每个受试者的报告, 按处理顺序排列.
    pub subjects: Vec<SubjectReport>,
}

impl DatasetReport {
    /// 转换成功的受试者个数.
    pub fn converted_count(&self) -> usize {
        self.subjects.iter().filter(|s| s.is_converted()).count()
    }

    /// 被丢弃的受试者及原因.
    pub fn discarded(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.subjects.iter().filter_map(|s| match &s.status {
            SubjectStatus::Discarded(reason) => Some((s.subject_id.as_str(), reason.as_str())),
            SubjectStatus::Converted => None,
        })
    }

    /// 通过 `log` 输出汇总信息 (不含每个受试者的细节).
    pub fn log(&self) {
        info!(
            "{} of {} subjects converted",
            self.converted_count(),
            self.subjects.len()
        );
        for (id, reason) in self.discarded() {
            warn!("discarded `{id}`: {reason}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetReport, SubjectReport};

    #[test]
    fn test_dataset_summary() {
        let mut ok = SubjectReport::new("s01");
        ok.added.push("ct/ring".into());
        let bad = SubjectReport::discarded("s02", "missing ptv".into(), vec!["w".into()]);
        let report = DatasetReport {
            subjects: vec![ok, bad],
        };
        assert_eq!(report.converted_count(), 1);
        assert_eq!(report.discarded().collect::<Vec<_>>(), vec![("s02", "missing ptv")]);
        assert_eq!(report.subjects[1].warnings, vec!["w"]);

        // 没有安装 logger 时 log 不产生任何输出.
        report.log();
        report.subjects.iter().for_each(SubjectReport::log);
    }
}

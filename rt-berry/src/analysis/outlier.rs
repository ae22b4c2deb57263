use std::collections::BTreeMap;

use super::StructureStatistics;

/// 默认离群阈值 (标准差倍数).
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// 参与离群检测的统计量.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Statistic {
    /// 体积.
    Volume,

    /// x 方向尺寸.
    ExtentX,

    /// y 方向尺寸.
    ExtentY,

    /// z 方向尺寸.
    ExtentZ,

    /// 最大水平切片面积.
    LargestAxialArea,

    /// 平均强度.
    MeanIntensity,
}

impl Statistic {
    /// 全部统计量.
    pub const ALL: [Statistic; 6] = [
        Self::Volume,
        Self::ExtentX,
        Self::ExtentY,
        Self::ExtentZ,
        Self::LargestAxialArea,
        Self::MeanIntensity,
    ];

    /// 从 `stats` 中取出该统计量. 空结构没有平均强度.
    pub fn value(&self, stats: &StructureStatistics) -> Option<f64> {
        match self {
            Self::Volume => Some(stats.volume_cm3),
            Self::ExtentX => Some(stats.extent_mm[0]),
            Self::ExtentY => Some(stats.extent_mm[1]),
            Self::ExtentZ => Some(stats.extent_mm[2]),
            Self::LargestAxialArea => Some(stats.largest_axial_area_mm2),
            Self::MeanIntensity => stats.mean_intensity,
        }
    }

    /// 名称, 用于日志.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volume => "volume_cm3",
            Self::ExtentX => "extent_x_mm",
            Self::ExtentY => "extent_y_mm",
            Self::ExtentZ => "extent_z_mm",
            Self::LargestAxialArea => "largest_axial_area_mm2",
            Self::MeanIntensity => "mean_intensity",
        }
    }
}

/// 一个离群值.
#[derive(Clone, Debug, PartialEq)]
pub struct Outlier {
    /// 受试者编号.
    pub subject_id: String,

    /// 通道名.
    pub channel: String,

    /// 结构名.
    pub structure: String,

    /// 统计量.
    pub statistic: Statistic,

    /// 统计量取值.
    pub value: f64,

    /// 该统计量在同名结构上的总体均值.
    pub mean: f64,

    /// 该统计量在同名结构上的总体标准差.
    pub std_dev: f64,
}

impl Outlier {
    /// 偏离均值的标准差倍数.
    #[inline]
    pub fn z_score(&self) -> f64 {
        (self.value - self.mean) / self.std_dev
    }
}

/// 找出离群值.
///
/// 按 `(通道, 结构)` 分组, 对每个统计量计算总体均值与标准差,
/// `|v - mean| > k * std` 的值被视为离群. 标准差为 0 的组不产生离群值.
/// 结果按 `(通道, 结构, 统计量, 输入顺序)` 排列.
pub fn find_outliers(stats: &[StructureStatistics], k: f64) -> Vec<Outlier> {
    let mut groups: BTreeMap<(&str, &str), Vec<&StructureStatistics>> = BTreeMap::new();
    for s in stats {
        groups
            .entry((s.channel.as_str(), s.structure.as_str()))
            .or_default()
            .push(s);
    }

    let mut ans = vec![];
    for members in groups.values() {
        for statistic in Statistic::ALL {
            let values: Vec<(&StructureStatistics, f64)> = members
                .iter()
                .filter_map(|s| statistic.value(s).map(|v| (*s, v)))
                .collect();
            let Some((mean, std_dev)) = mean_std(values.iter().map(|(_, v)| *v)) else {
                continue;
            };
            if std_dev == 0.0 {
                continue;
            }
            ans.extend(
                values
                    .iter()
                    .filter(|(_, v)| (v - mean).abs() > k * std_dev)
                    .map(|(s, v)| Outlier {
                        subject_id: s.subject_id.clone(),
                        channel: s.channel.clone(),
                        structure: s.structure.clone(),
                        statistic,
                        value: *v,
                        mean,
                        std_dev,
                    }),
            );
        }
    }
    ans
}

/// 总体均值与总体标准差. 没有任何值时返回 `None`.
fn mean_std<I: Iterator<Item = f64> + Clone>(values: I) -> Option<(f64, f64)> {
    let n = values.clone().count();
    if n == 0 {
        return None;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    Some((mean, var.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::{find_outliers, mean_std, Statistic, DEFAULT_OUTLIER_THRESHOLD};
    use crate::analysis::StructureStatistics;

    fn stats(subject: &str, structure: &str, volume: f64) -> StructureStatistics {
        StructureStatistics {
            subject_id: subject.to_string(),
            channel: "ct".to_string(),
            structure: structure.to_string(),
            voxel_count: 1,
            volume_cm3: volume,
            extent_mm: [1.0; 3],
            largest_axial_area_mm2: 1.0,
            mean_intensity: None,
        }
    }

    #[test]
    fn test_mean_std() {
        assert_eq!(mean_std(std::iter::empty()), None);
        let (m, s) = mean_std([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter()).unwrap();
        assert_eq!((m, s), (5.0, 2.0));
    }

    #[test]
    fn test_find_outliers() {
        let mut all: Vec<_> = (0..20).map(|i| stats(&format!("s{i:02}"), "ptv", 10.0)).collect();
        all.push(stats("s20", "ptv", 100.0));
        // 另一个结构的值各不相同, 但都不离群.
        all.extend((0..5).map(|i| stats(&format!("s{i:02}"), "rectum", i as f64)));

        let found = find_outliers(&all, DEFAULT_OUTLIER_THRESHOLD);
        assert_eq!(found.len(), 1);
        let o = &found[0];
        assert_eq!((o.subject_id.as_str(), o.structure.as_str()), ("s20", "ptv"));
        assert_eq!(o.statistic, Statistic::Volume);
        // z = 90 * 20 / 21 / (90 * sqrt(20) / 21) = sqrt(20).
        assert!((o.z_score() - 20f64.sqrt()).abs() < 1e-9);

        assert!(find_outliers(&all, 5.0).is_empty());
    }
}

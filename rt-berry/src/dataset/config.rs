//! 数据集转换配置.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::resample::Interpolation;
use crate::structures::{DerivedStructure, GroundTruth, NameMapping};

/// 默认的引用通道名.
pub const DEFAULT_REFERENCE_CHANNEL: &str = "ct";

/// 数据集转换配置.
///
/// 打开 `serde` feature 时可以从 JSON 等格式读取, 未给出的字段取默认值.
/// 规则类字段使用其文本形式, 例如:
///
/// ```json
/// {
///     "reference_channel": "ct",
///     "ground_truth": ["ptv", "+body", "rectum", "*"],
///     "name_mappings": ["coeur,herz:heart", "ptv.minus.rectum:+ptv_opt"],
///     "derived_structures": ["ptv.minus.bladder:ptv_nobladder"],
///     "target_spacing": [1.0, 1.0, 3.0]
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConversionConfig {
    /// 引用通道名. 其它通道都会被配准 (重采样) 到该通道的网格上.
    pub reference_channel: String,

    /// 按优先级排列的真值结构列表.
    pub ground_truth: GroundTruth,

    /// 重命名规则, 按顺序执行.
    pub name_mappings: Vec<NameMapping>,

    /// 是否允许重命名/派生覆盖已有结构.
    pub allow_name_clash: bool,

    /// 派生结构, 在重命名之后按顺序计算.
    pub derived_structures: Vec<DerivedStructure>,

    /// 目标体素间距. 为 `None` 时保持引用通道的间距.
    pub target_spacing: Option<[f64; 3]>,

    /// 扫描体积的插值方式. 结构掩膜总是使用最近邻插值.
    pub interpolation: Interpolation,

    /// 扫描体积外的填充值.
    pub scan_padding: f32,

    /// 为 `true` 时丢弃出错的受试者, 否则整个转换中止.
    pub discard_invalid_subjects: bool,

    /// 是否要求每个受试者含有全部真值结构.
    pub require_all_ground_truth_structures: bool,

    /// 是否移除不被真值列表接受的结构.
    pub remove_unrecognized_structures: bool,

    /// 通道改名, `旧名 → 新名`.
    pub channel_renames: BTreeMap<String, String>,

    /// 序列编号前缀.
    pub series_id_prefix: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            reference_channel: DEFAULT_REFERENCE_CHANNEL.to_string(),
            ground_truth: GroundTruth::default(),
            name_mappings: vec![],
            allow_name_clash: false,
            derived_structures: vec![],
            target_spacing: None,
            interpolation: Interpolation::Linear,
            scan_padding: 0.0,
            discard_invalid_subjects: true,
            require_all_ground_truth_structures: false,
            remove_unrecognized_structures: false,
            channel_renames: BTreeMap::new(),
            series_id_prefix: None,
        }
    }
}

impl ConversionConfig {
    /// 检查配置本身是否合法.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(s) = self.target_spacing {
            if s.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(ConfigError::InvalidTargetSpacing(s));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ConversionConfig;
    use crate::error::ConfigError;

    #[test]
    fn test_validate() {
        let mut c = ConversionConfig::default();
        assert!(c.validate().is_ok());
        c.target_spacing = Some([1.0, -1.0, 2.0]);
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidTargetSpacing([1.0, -1.0, 2.0]))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        use crate::resample::Interpolation;

        let text = r#"{
            "reference_channel": "CT",
            "ground_truth": ["PTV", "+body", "*"],
            "name_mappings": ["coeur,herz:heart", "ptv.minus.rectum:+ring"],
            "derived_structures": ["ptv.minus.bladder:ptv_nb"],
            "target_spacing": [1.0, 1.0, 3.0],
            "interpolation": "nearest",
            "channel_renames": {"CT": "ct_plan"}
        }"#;
        let c: ConversionConfig = serde_json::from_str(text).unwrap();
        assert_eq!(c.reference_channel, "CT");
        assert!(c.ground_truth.has_wildcard());
        assert_eq!(c.name_mappings.len(), 2);
        assert!(c.name_mappings[1].augment);
        assert_eq!(c.derived_structures[0].result, "ptv_nb");
        assert_eq!(c.target_spacing, Some([1.0, 1.0, 3.0]));
        assert_eq!(c.interpolation, Interpolation::Nearest);
        assert!(c.discard_invalid_subjects);
        assert_eq!(c.channel_renames["CT"], "ct_plan");

        let back = serde_json::to_string(&c).unwrap();
        let again: ConversionConfig = serde_json::from_str(&back).unwrap();
        assert_eq!(again, c);

        assert!(serde_json::from_str::<ConversionConfig>(r#"{"name_mappings": ["bad"]}"#).is_err());
    }
}

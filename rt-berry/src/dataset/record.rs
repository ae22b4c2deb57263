//! 受试者、通道与其元数据.

use crate::data::{Volume3D, VolumeGeometry};
use crate::error::{GeometryError, StructureError};
use crate::resample::{resample_onto, resample_to_spacing, Interpolation};
use crate::structures::StructureSet;

/// 通道元数据. 不可变, 修改时总是生成新值.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMetadata {
    subject_id: String,
    series_id: String,
    channel: String,
}

impl ChannelMetadata {
    /// 直接初始化.
    pub fn new(subject_id: &str, series_id: &str, channel: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            series_id: series_id.to_string(),
            channel: channel.to_string(),
        }
    }

    /// 受试者编号.
    #[inline]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// 序列编号.
    #[inline]
    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    /// 通道名.
    #[inline]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 通道改名为 `channel` 后的元数据.
    pub fn renamed(&self, channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ..self.clone()
        }
    }

    /// 序列编号加上前缀 `prefix` 后的元数据.
    pub fn with_series_prefix(&self, prefix: &str) -> Self {
        Self {
            series_id: format!("{prefix}{}", self.series_id),
            ..self.clone()
        }
    }
}

/// 单个通道: 扫描体积、结构集与元数据.
///
/// 结构集中的掩膜总是与扫描体积共享同一网格.
#[derive(Clone, Debug)]
pub struct ChannelRecord {
    metadata: ChannelMetadata,
    scan: Volume3D<f32>,
    structures: StructureSet,
}

impl ChannelRecord {
    /// 创建不含结构的通道.
    pub fn new(metadata: ChannelMetadata, scan: Volume3D<f32>) -> Self {
        let structures = StructureSet::new(*scan.geometry());
        Self {
            metadata,
            scan,
            structures,
        }
    }

    /// 元数据.
    #[inline]
    pub fn metadata(&self) -> &ChannelMetadata {
        &self.metadata
    }

    /// 扫描体积.
    #[inline]
    pub fn scan(&self) -> &Volume3D<f32> {
        &self.scan
    }

    /// 结构集.
    #[inline]
    pub fn structures(&self) -> &StructureSet {
        &self.structures
    }

    /// 可变结构集.
    #[inline]
    pub fn structures_mut(&mut self) -> &mut StructureSet {
        &mut self.structures
    }

    /// 替换元数据.
    #[inline]
    pub fn set_metadata(&mut self, metadata: ChannelMetadata) {
        self.metadata = metadata;
    }

    /// 将扫描以 `interpolation`、结构以最近邻方式重采样到 `geometry`.
    /// 扫描体积外的体素取 `padding`.
    pub fn resample_onto(
        &mut self,
        geometry: &VolumeGeometry,
        interpolation: Interpolation,
        padding: f32,
    ) {
        self.scan = resample_onto(&self.scan, geometry, interpolation, padding);
        self.structures = self.structures.resample_onto(geometry);
    }

    /// 将通道重采样到体素间距 `spacing`.
    pub fn resample_to_spacing(
        &mut self,
        spacing: [f64; 3],
        interpolation: Interpolation,
        padding: f32,
    ) -> Result<(), GeometryError> {
        let scan = resample_to_spacing(&self.scan, spacing, interpolation, padding)?;
        self.structures = self.structures.resample_onto(scan.geometry());
        self.scan = scan;
        Ok(())
    }

    /// `通道名/结构名` 形式的结构全名.
    pub(crate) fn qualified_names(&self) -> Vec<String> {
        let channel = self.metadata.channel();
        self.structures
            .names()
            .map(|n| format!("{channel}/{n}"))
            .collect()
    }
}

/// 单个受试者的全部通道.
#[derive(Clone, Debug)]
pub struct SubjectRecord {
    /// 受试者编号.
    pub subject_id: String,

    /// 所有通道, 按载入顺序排列.
    pub channels: Vec<ChannelRecord>,

    /// 载入过程中产生的警告.
    pub warnings: Vec<String>,
}

impl SubjectRecord {
    /// 创建不含通道的受试者.
    pub fn new(subject_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            channels: vec![],
            warnings: vec![],
        }
    }

    /// 通道名为 `channel` 的通道.
    pub fn channel(&self, channel: &str) -> Option<&ChannelRecord> {
        self.channels
            .iter()
            .find(|c| c.metadata.channel() == channel)
    }

    /// 通道名为 `channel` 的可变通道.
    pub fn channel_mut(&mut self, channel: &str) -> Option<&mut ChannelRecord> {
        self.channels
            .iter_mut()
            .find(|c| c.metadata.channel() == channel)
    }

    /// 向通道 `channel` 添加结构 `name`.
    ///
    /// 大小写折叠后与已有结构重名时, 保留先载入者并记录一条警告.
    /// 通道不存在时返回 `Err(StructureError::MissingStructure)`.
    pub fn add_structure(
        &mut self,
        channel: &str,
        name: &str,
        mask: Volume3D<u8>,
    ) -> Result<(), StructureError> {
        let record = self
            .channels
            .iter_mut()
            .find(|c| c.metadata.channel() == channel)
            .ok_or_else(|| StructureError::MissingStructure(format!("{channel}/{name}")))?;
        if !record.structures.insert(name, mask)? {
            self.warnings.push(format!(
                "duplicate structure `{name}` in channel `{channel}` ignored"
            ));
        }
        Ok(())
    }
}

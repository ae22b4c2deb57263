//! 转换后数据集的结构统计量, 以及基于统计量的离群值检测.

mod outlier;

pub use outlier::{find_outliers, Outlier, Statistic, DEFAULT_OUTLIER_THRESHOLD};

use crate::consts::mask;
use crate::data::{interest_region, Volume, Volume3D};
use crate::dataset::{ChannelRecord, SubjectRecord};

/// 每立方厘米对应的立方毫米数.
const MM3_PER_CM3: f64 = 1000.0;

/// 单个结构的统计量.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureStatistics {
    /// 受试者编号.
    pub subject_id: String,

    /// 通道名.
    pub channel: String,

    /// 结构名.
    pub structure: String,

    /// 前景体素个数.
    pub voxel_count: usize,

    /// 体积 (cm³).
    pub volume_cm3: f64,

    /// 包围盒在 x, y, z 方向上的物理尺寸 (mm).
    pub extent_mm: [f64; 3],

    /// 面积最大的水平切片的前景面积 (mm²).
    pub largest_axial_area_mm2: f64,

    /// 结构内扫描体素的均值. 空结构为 `None`.
    pub mean_intensity: Option<f64>,
}

/// 计算受试者所有通道中所有结构的统计量, 按通道、结构名顺序排列.
pub fn structure_statistics(subject: &SubjectRecord) -> Vec<StructureStatistics> {
    subject
        .channels
        .iter()
        .flat_map(|c| {
            c.structures()
                .iter()
                .map(move |(name, m)| statistics_of(&subject.subject_id, c, name, m))
        })
        .collect()
}

fn statistics_of(
    subject_id: &str,
    channel: &ChannelRecord,
    name: &str,
    m: &Volume3D<u8>,
) -> StructureStatistics {
    let is_fg = |p: &u8| mask::is_foreground(*p);
    let voxel_count = m.count_where(is_fg);
    let spacing = m.spacing();
    let extent = interest_region(m, mask::FOREGROUND).voxel_extent();

    let largest_axial_area_mm2 = (0..m.dim_z())
        .filter_map(|z| m.axial_slice(z))
        .map(|s| s.count_where(is_fg) as f64 * s.pixel_area())
        .fold(0.0, f64::max);

    let mean_intensity = match voxel_count {
        0 => None,
        n => {
            let sum: f64 = m
                .as_slice()
                .iter()
                .zip(channel.scan().as_slice())
                .filter(|(p, _)| is_fg(*p))
                .map(|(_, v)| f64::from(*v))
                .sum();
            Some(sum / n as f64)
        }
    };

    StructureStatistics {
        subject_id: subject_id.to_string(),
        channel: channel.metadata().channel().to_string(),
        structure: name.to_string(),
        voxel_count,
        volume_cm3: voxel_count as f64 * m.geometry().voxel_volume() / MM3_PER_CM3,
        extent_mm: std::array::from_fn(|i| extent[i] as f64 * spacing[i]),
        largest_axial_area_mm2,
        mean_intensity,
    }
}

#[cfg(test)]
mod tests {
    use super::structure_statistics;
    use crate::data::{Region3D, Volume3D, VolumeGeometry};
    use crate::dataset::{ChannelMetadata, ChannelRecord, SubjectRecord};

    fn assert_f64_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_structure_statistics() {
        let g = VolumeGeometry::with_spacing([4, 4, 4], [2.0, 2.0, 5.0]).unwrap();
        let mut scan = Volume3D::<f32>::new(g);
        for z in 0..4 {
            for y in 0..4 {
                for x in 0..4 {
                    scan.set(x, y, z, z as f32 * 10.0);
                }
            }
        }
        let mut s = SubjectRecord::new("s01");
        s.channels
            .push(ChannelRecord::new(ChannelMetadata::new("s01", "1", "ct"), scan));

        // z = 1 层 2x2, z = 2 层 2x3. 前景用 255 表示.
        let mut m = Volume3D::<u8>::new(g);
        let r = Region3D::new(0, 0, 1, 1, 1, 2);
        for (x, y, z) in itertools::iproduct!(0..4, 0..4, 0..4) {
            if r.contains(x as i32, y as i32, z as i32) || (x < 2 && y == 2 && z == 2) {
                m.set(x, y, z, 255);
            }
        }
        s.add_structure("ct", "gtv", m).unwrap();
        s.add_structure("ct", "empty", Volume3D::new(g)).unwrap();

        let stats = structure_statistics(&s);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].structure, "empty");
        assert_eq!(stats[0].voxel_count, 0);
        assert_eq!(stats[0].extent_mm, [0.0; 3]);
        assert_eq!(stats[0].mean_intensity, None);

        let gtv = &stats[1];
        assert_eq!(gtv.voxel_count, 10);
        assert_f64_eq(gtv.volume_cm3, 10.0 * 20.0 / 1000.0);
        assert_eq!(gtv.extent_mm, [4.0, 6.0, 10.0]);
        assert_f64_eq(gtv.largest_axial_area_mm2, 6.0 * 4.0);
        assert_f64_eq(gtv.mean_intensity.unwrap(), (4.0 * 10.0 + 6.0 * 20.0) / 10.0);
    }
}

//! 受试者转换流水线.
//!
//! 对每个受试者依次执行:
//!
//! 1. 将所有通道配准到引用通道的网格上;
//! 2. 重命名结构;
//! 3. 计算派生结构;
//! 4. 按真值列表做结构互斥;
//! 5. 检查真值结构是否齐全, 并按需移除未识别结构;
//! 6. 规范化体素间距;
//! 7. 通道改名与序列编号加前缀.

use std::collections::BTreeSet;

use super::{ConversionConfig, DatasetReport, SubjectRecord, SubjectReport};
use crate::error::{ConfigError, Result, StructureError};

/// 转换单个受试者.
///
/// 任何一步出错都会立即返回 `Err`, 是否丢弃由调用方决定.
pub fn process_subject(
    mut subject: SubjectRecord,
    config: &ConversionConfig,
) -> Result<(SubjectRecord, SubjectReport)> {
    let mut report = SubjectReport::new(&subject.subject_id);
    report.warnings.append(&mut subject.warnings);

    let reference = subject
        .channel(&config.reference_channel)
        .ok_or_else(|| ConfigError::MissingReferenceChannel(config.reference_channel.clone()))?;
    let grid = *reference.scan().geometry();
    for c in subject.channels.iter_mut() {
        if !c.scan().geometry().same_grid(&grid) {
            c.resample_onto(&grid, config.interpolation, config.scan_padding);
        }
    }

    let before: BTreeSet<String> = subject
        .channels
        .iter()
        .flat_map(|c| c.qualified_names())
        .collect();

    let gt = &config.ground_truth;
    for c in subject.channels.iter_mut() {
        let channel = c.metadata().channel().to_string();
        let structures = c.structures_mut();

        report
            .renamed
            .extend(structures.rename(&config.name_mappings, config.allow_name_clash)?);
        for d in config.derived_structures.iter() {
            structures.derive(d, config.allow_name_clash)?;
        }

        // 空的真值列表表示不做任何限制.
        if gt.is_empty() {
            continue;
        }
        let excl = structures.make_mutually_exclusive(gt);
        for ((w, l), n) in excl.masked {
            let key = (format!("{channel}/{w}"), format!("{channel}/{l}"));
            *report.masked.entry(key).or_default() += n;
        }
        if config.remove_unrecognized_structures {
            structures.retain_names(|n| gt.accepts(n));
        }
        report
            .unrecognized
            .extend(excl.unrecognized.iter().map(|n| format!("{channel}/{n}")));
    }

    if config.require_all_ground_truth_structures {
        let missing: Vec<String> = gt
            .entries()
            .iter()
            .filter(|e| !subject.channels.iter().any(|c| c.structures().contains(&e.name)))
            .map(|e| e.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(StructureError::MissingGroundTruth(missing).into());
        }
    }

    if let Some(spacing) = config.target_spacing {
        for c in subject.channels.iter_mut() {
            c.resample_to_spacing(spacing, config.interpolation, config.scan_padding)?;
        }
    }

    for c in subject.channels.iter_mut() {
        let mut meta = c.metadata().clone();
        if let Some(new) = config.channel_renames.get(meta.channel()) {
            meta = meta.renamed(new);
        }
        if let Some(prefix) = config.series_id_prefix.as_deref() {
            meta = meta.with_series_prefix(prefix);
        }
        c.set_metadata(meta);
    }

    // 通道改名前后结构名的通道前缀不同, 因此按改名前的通道名比较.
    let after: BTreeSet<String> = subject
        .channels
        .iter()
        .flat_map(|c| {
            let channel = original_channel(config, c.metadata().channel());
            c.structures()
                .names()
                .map(|n| format!("{channel}/{n}"))
                .collect::<Vec<_>>()
        })
        .collect();
    report.added = after.difference(&before).cloned().collect();
    report.removed = before.difference(&after).cloned().collect();

    Ok((subject, report))
}

/// 改名后的通道 `channel` 在改名前的名字.
fn original_channel<'a>(config: &'a ConversionConfig, channel: &'a str) -> &'a str {
    config
        .channel_renames
        .iter()
        .find(|(_, new)| new.as_str() == channel)
        .map_or(channel, |(old, _)| old.as_str())
}

/// 转换整个数据集.
///
/// 受试者出错时, 若 `config.discard_invalid_subjects` 为 `true` 则丢弃该受试者并记录原因,
/// 否则立即返回该错误. 配置本身非法时总是返回 `Err`.
pub fn convert_dataset<I>(
    subjects: I,
    config: &ConversionConfig,
) -> Result<(Vec<SubjectRecord>, DatasetReport)>
where
    I: IntoIterator<Item = SubjectRecord>,
{
    config.validate()?;
    let mut records = vec![];
    let mut report = DatasetReport::default();
    for subject in subjects {
        let id = subject.subject_id.clone();
        let warnings = subject.warnings.clone();
        match process_subject(subject, config) {
            Ok((record, r)) => {
                records.push(record);
                report.subjects.push(r);
            }
            Err(e) if config.discard_invalid_subjects => {
                report
                    .subjects
                    .push(SubjectReport::discarded(&id, e.to_string(), warnings));
            }
            Err(e) => return Err(e),
        }
    }
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::{convert_dataset, process_subject};
    use crate::data::{Region3D, Volume, Volume3D, VolumeGeometry};
    use crate::dataset::{ChannelMetadata, ChannelRecord, ConversionConfig, SubjectRecord};
    use crate::error::{ConfigError, Error, StructureError};
    use crate::structures::testing::boxed;

    const DIM: [usize; 3] = [4, 4, 4];

    fn subject(id: &str, structures: &[(&str, Region3D<i32>)]) -> SubjectRecord {
        let g = VolumeGeometry::with_spacing(DIM, [1.0; 3]).unwrap();
        let mut scan = Volume3D::<f32>::new(g);
        scan.fill(100.0);
        let mut s = SubjectRecord::new(id);
        s.channels
            .push(ChannelRecord::new(ChannelMetadata::new(id, "1.2", "ct"), scan));
        for (n, r) in structures {
            s.add_structure("ct", n, boxed(DIM, *r)).unwrap();
        }
        s
    }

    fn config() -> ConversionConfig {
        ConversionConfig {
            ground_truth: "ptv,+body,rectum".parse().unwrap(),
            name_mappings: vec!["rect,rectum_old:rectum".parse().unwrap()],
            derived_structures: vec!["ptv.minus.rectum:ptv_opt".parse().unwrap()],
            remove_unrecognized_structures: true,
            ..ConversionConfig::default()
        }
    }

    #[test]
    fn test_process_subject() {
        let s = subject(
            "s01",
            &[
                ("PTV", Region3D::new(0, 0, 0, 2, 2, 2)),
                ("Rect", Region3D::new(2, 2, 2, 3, 3, 3)),
                ("body", Region3D::new(0, 0, 0, 3, 3, 3)),
                ("couch", Region3D::new(0, 0, 0, 3, 0, 0)),
            ],
        );
        let mut c = config();
        c.channel_renames.insert("ct".into(), "ct_plan".into());
        c.series_id_prefix = Some("x.".into());
        let (s, r) = process_subject(s, &c).unwrap();

        let ch = &s.channels[0];
        assert_eq!(ch.metadata().channel(), "ct_plan");
        assert_eq!(ch.metadata().series_id(), "x.1.2");
        let names: Vec<&str> = ch.structures().names().collect();
        assert_eq!(names, vec!["body", "ptv", "rectum"]);

        assert_eq!(r.renamed.len(), 1);
        assert_eq!(r.renamed[0].from, "rect");
        assert_eq!(r.unrecognized, vec!["ct/couch", "ct/ptv_opt"]);
        assert_eq!(r.added, vec!["ct/rectum"]);
        assert_eq!(r.removed, vec!["ct/couch", "ct/rect"]);
        assert_eq!(r.masked[&("ct/ptv".to_string(), "ct/rectum".to_string())], 1);
        assert_eq!(ch.structures().get("rectum").unwrap().count_where(|&p| p == 1), 7);
        assert_eq!(ch.structures().get("body").unwrap().count_where(|&p| p == 1), 64);
    }

    #[test]
    fn test_missing_ground_truth() {
        let s = subject("s01", &[("ptv", Region3D::new(0, 0, 0, 1, 1, 1))]);
        let c = ConversionConfig {
            require_all_ground_truth_structures: true,
            ..config()
        };
        let e = process_subject(s, &c).unwrap_err();
        assert!(matches!(
            e,
            Error::Structure(StructureError::MissingStructure(_))
        ));

        let s = subject("s01", &[("ptv", Region3D::new(0, 0, 0, 1, 1, 1))]);
        let c = ConversionConfig {
            derived_structures: vec![],
            ..c
        };
        match process_subject(s, &c).unwrap_err() {
            Error::Structure(StructureError::MissingGroundTruth(m)) => {
                assert_eq!(m, vec!["body", "rectum"])
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_discard_policy() {
        let good = subject("s01", &[("ptv", Region3D::new(0, 0, 0, 1, 1, 1))]);
        let mut bad = subject("s02", &[]);
        bad.channels.clear();
        let c = ConversionConfig {
            target_spacing: Some([2.0, 2.0, 2.0]),
            ..ConversionConfig::default()
        };

        let (records, report) = convert_dataset(vec![good.clone(), bad.clone()], &c).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channels[0].scan().geometry().dim(), [2, 2, 2]);
        assert_eq!(report.converted_count(), 1);
        assert_eq!(report.discarded().count(), 1);

        let strict = ConversionConfig {
            discard_invalid_subjects: false,
            ..c
        };
        assert!(matches!(
            convert_dataset(vec![good, bad], &strict),
            Err(Error::Config(ConfigError::MissingReferenceChannel(_)))
        ));
    }

    #[test]
    fn test_registration_onto_reference() {
        let mut s = subject("s01", &[("ptv", Region3D::new(0, 0, 0, 3, 3, 3))]);
        let g = VolumeGeometry::with_spacing([2, 2, 2], [3.0; 3]).unwrap();
        s.channels
            .push(ChannelRecord::new(ChannelMetadata::new("s01", "9", "mr"), Volume3D::new(g)));
        let (s, _) = process_subject(s, &ConversionConfig::default()).unwrap();
        let grid = s.channels[0].scan().geometry();
        assert!(s.channels[1].scan().geometry().same_grid(grid));
        assert!(s.channels[1].structures().geometry().same_grid(grid));
    }

    #[test]
    fn test_invalid_config() {
        let c = ConversionConfig {
            target_spacing: Some([0.0, 1.0, 1.0]),
            ..ConversionConfig::default()
        };
        assert!(matches!(
            convert_dataset(Vec::<SubjectRecord>::new(), &c),
            Err(Error::Config(ConfigError::InvalidTargetSpacing(_)))
        ));
    }
}

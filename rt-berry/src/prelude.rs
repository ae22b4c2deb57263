//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::data::{Region3D, Rounding, Volume, Volume2D, Volume3D, VolumeGeometry, Voxel};
pub use crate::error::{ConfigError, Error, GeometryError, Result, StructureError};
pub use crate::geometry::{Point2D, Point3D};

pub use crate::consts::mask::{BACKGROUND, FOREGROUND};

pub use crate::resample::{resample_onto, resample_to_spacing, Interpolation};
pub use crate::structures::{
    DerivedStructure, GroundTruth, NameMapping, StructureOperation, StructureSet,
};

pub use crate::dataset::{
    self, convert_dataset, ChannelMetadata, ChannelRecord, ConversionConfig, SubjectRecord,
};
pub use crate::dataset::{dataset_dir, home_dataset_dir_with};

pub use crate::analysis::{find_outliers, structure_statistics, StructureStatistics};

//! 数据集检查工具.
//!
//! 用法: `dataset-check [数据集根目录] [转换配置.json]`. 两者也可分别由环境变量
//! `$RT_DATASET_DIR` 与 `$RT_CONVERSION_CONFIG` 给出.
//!
//! 载入全部受试者, 运行转换流水线, 输出每个受试者的报告、数据集汇总与离群值表.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use thiserror::Error;

use rt_berry::analysis::{self, DEFAULT_OUTLIER_THRESHOLD};
use rt_berry::dataset::{self, ConversionConfig, SubjectReport};

mod loader;

/// 命令行参数.
#[derive(Debug, Parser)]
#[command(name = "dataset-check")]
#[command(about = "Load a nii dataset, run the conversion pipeline and report outliers")]
struct Args {
    /// 数据集根目录. 缺省时为 `$HOME/dataset`.
    #[arg(value_name = "ROOT", env = "RT_DATASET_DIR")]
    root: Option<PathBuf>,

    /// 转换配置 (JSON). 缺省时使用默认配置.
    #[arg(value_name = "CONFIG", env = "RT_CONVERSION_CONFIG")]
    config: Option<PathBuf>,
}

/// 工具运行错误.
#[derive(Debug, Error)]
pub enum CheckError {
    /// 没有给出数据集目录, 且无法推断.
    #[error("no dataset directory given and $HOME is unknown")]
    NoDatasetDir,

    /// 路径不是合法的 UTF-8 目录名.
    #[error("bad path `{0}`")]
    BadPath(PathBuf),

    /// 文件系统错误.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件格式错误.
    #[error("config: {0}")]
    Json(#[from] serde_json::Error),

    /// 载入结构时出错.
    #[error(transparent)]
    Structure(#[from] rt_berry::StructureError),

    /// 转换出错.
    #[error(transparent)]
    Rt(#[from] rt_berry::Error),
}

fn read_config(path: Option<PathBuf>) -> Result<ConversionConfig, CheckError> {
    match path {
        Some(path) => {
            info!("reading config from `{}`", path.display());
            Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
        }
        None => {
            info!("no config given, using defaults");
            Ok(ConversionConfig::default())
        }
    }
}

fn run() -> Result<(), CheckError> {
    let args = Args::parse();
    let root = match args.root {
        Some(root) => root,
        None => dataset::dataset_dir().ok_or(CheckError::NoDatasetDir)?,
    };
    let config = read_config(args.config)?;
    info!("dataset root: `{}`", root.display());

    let mut subjects = vec![];
    let mut load_failures = vec![];
    for dir in loader::subdirs(&root)? {
        match loader::load_subject(&dir, &config.reference_channel) {
            Ok(s) => subjects.push(s),
            Err(e) => {
                warn!("failed to load `{}`: {e}", dir.display());
                load_failures.push(dir);
            }
        }
    }
    info!("{} subjects loaded", subjects.len());

    let (records, report) = dataset::convert_dataset(subjects, &config)?;
    report.subjects.iter().for_each(SubjectReport::log);
    report.log();
    if !load_failures.is_empty() {
        warn!("{} subject directories could not be loaded", load_failures.len());
    }

    let stats: Vec<_> = records
        .iter()
        .flat_map(analysis::structure_statistics)
        .collect();
    let outliers = analysis::find_outliers(&stats, DEFAULT_OUTLIER_THRESHOLD);
    info!(
        "{} structures analysed, {} outliers (k = {DEFAULT_OUTLIER_THRESHOLD})",
        stats.len(),
        outliers.len()
    );
    for o in outliers.iter() {
        warn!(
            "[{}] {}/{} {} = {:.3} (mean {:.3}, std {:.3}, z {:+.2})",
            o.subject_id,
            o.channel,
            o.structure,
            o.statistic.as_str(),
            o.value,
            o.mean,
            o.std_dev,
            o.z_score()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    // 可以通过 `RUST_LOG` 覆盖默认等级.
    if let Err(e) = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("failed to install logger: {e}");
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::{error::ErrorKind, CommandFactory, Parser};
    use std::path::Path;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["dataset-check", "/data/rt", "conv.json"]).unwrap();
        assert_eq!(args.root.as_deref(), Some(Path::new("/data/rt")));
        assert_eq!(args.config.as_deref(), Some(Path::new("conv.json")));

        let e = Args::try_parse_from(["dataset-check", "--help"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::DisplayHelp);

        let e = Args::try_parse_from(["dataset-check", "a", "b", "c"]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnknownArgument);
    }
}

use std::fs::File;
use std::io::Read;

use anyhow::Context;
use configparser::ini::Ini;

use super::extractor_config::ExtractorConfig;
use super::pipeline_config::PipelineConfig;
use super::runtime_config::RuntimeConfig;
use super::sinker_config::SinkerConfig;
use crate::error::Error;

#[derive(Clone)]
pub struct TaskConfig {
    pub extractor: ExtractorConfig,
    pub sinker: SinkerConfig,
    pub pipeline: PipelineConfig,
    pub runtime: RuntimeConfig,
}

const EXTRACTOR: &str = "extractor";
const SINKER: &str = "sinker";
const PIPELINE: &str = "pipeline";
const RUNTIME: &str = "runtime";
const FILE_PATH: &str = "file_path";
const URL: &str = "url";
const BATCH_SIZE: &str = "batch_size";
const BUFFER_SIZE: &str = "buffer_size";

const DEFAULT_BATCH_SIZE: usize = 200;
const DEFAULT_BUFFER_SIZE: usize = 10;

impl TaskConfig {
    pub fn new(task_config_file: &str) -> anyhow::Result<Self> {
        let mut config_str = String::new();
        File::open(task_config_file)
            .with_context(|| format!("task config not found: [{}]", task_config_file))?
            .read_to_string(&mut config_str)?;
        let mut ini = Ini::new();
        ini.read(config_str).map_err(Error::Unexpected)?;

        Ok(Self {
            extractor: Self::load_extractor_config(&ini)?,
            sinker: Self::load_sinker_config(&ini)?,
            pipeline: Self::load_pipeline_config(&ini)?,
            runtime: Self::load_runtime_config(&ini)?,
        })
    }

    fn load_extractor_config(ini: &Ini) -> anyhow::Result<ExtractorConfig> {
        let file_path = ini
            .get(EXTRACTOR, FILE_PATH)
            .with_context(|| format!("no {} in [{}]", FILE_PATH, EXTRACTOR))?;
        let skip_emit = ini
            .getbool(EXTRACTOR, "skip_emit")
            .map_err(Error::Unexpected)?
            .unwrap_or(false);

        Ok(ExtractorConfig::RdbSnapshotFile {
            file_path,
            skip_emit,
        })
    }

    fn load_sinker_config(ini: &Ini) -> anyhow::Result<SinkerConfig> {
        let url = ini
            .get(SINKER, URL)
            .with_context(|| format!("no {} in [{}]", URL, SINKER))?;
        let batch_size = ini
            .getuint(SINKER, BATCH_SIZE)
            .map_err(Error::Unexpected)?
            .unwrap_or(DEFAULT_BATCH_SIZE as u64) as usize;
        let is_replace = ini
            .getbool(SINKER, "is_replace")
            .map_err(Error::Unexpected)?
            .unwrap_or(true);

        Ok(SinkerConfig::Redis {
            url,
            batch_size,
            is_replace,
        })
    }

    fn load_pipeline_config(ini: &Ini) -> anyhow::Result<PipelineConfig> {
        let buffer_size = ini
            .getuint(PIPELINE, BUFFER_SIZE)
            .map_err(Error::Unexpected)?
            .unwrap_or(DEFAULT_BUFFER_SIZE as u64) as usize;
        Ok(PipelineConfig { buffer_size })
    }

    fn load_runtime_config(ini: &Ini) -> anyhow::Result<RuntimeConfig> {
        Ok(RuntimeConfig {
            log_level: ini
                .get(RUNTIME, "log_level")
                .unwrap_or_else(|| "info".to_string()),
            log_dir: ini
                .get(RUNTIME, "log_dir")
                .unwrap_or_else(|| "./logs".to_string()),
            log4rs_file: ini
                .get(RUNTIME, "log4rs_file")
                .unwrap_or_else(|| "./log4rs.yaml".to_string()),
        })
    }
}

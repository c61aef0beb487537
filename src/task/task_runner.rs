use std::fs::{self, File};
use std::io::Read;
use std::sync::{atomic::AtomicBool, Arc};

use concurrent_queue::ConcurrentQueue;
use futures::future::join;
use log4rs::config::RawConfig;

use crate::config::extractor_config::ExtractorConfig;
use crate::config::sinker_config::SinkerConfig;
use crate::config::task_config::TaskConfig;
use crate::extractor::base_extractor::BaseExtractor;
use crate::extractor::rdb_snapshot_file_extractor::RdbSnapshotFileExtractor;
use crate::pipeline::base_pipeline::BasePipeline;
use crate::sinker::redis_client::RedisClient;
use crate::sinker::redis_sinker::RedisSinker;
use crate::traits::Extractor;

pub struct TaskRunner {
    config: TaskConfig,
}

const LOG_LEVEL_PLACEHODLER: &str = "LOG_LEVEL_PLACEHODLER";
const LOG_DIR_PLACEHODLER: &str = "LOG_DIR_PLACEHODLER";

impl TaskRunner {
    pub fn new(task_config_file: &str) -> anyhow::Result<Self> {
        Ok(Self {
            config: TaskConfig::new(task_config_file)?,
        })
    }

    pub async fn start_task(&self, enable_log4rs: bool) -> anyhow::Result<()> {
        if enable_log4rs {
            self.init_log4rs()?;
        }

        let buffer = Arc::new(ConcurrentQueue::bounded(self.config.pipeline.buffer_size));
        let shut_down = Arc::new(AtomicBool::new(false));

        let ExtractorConfig::RdbSnapshotFile {
            file_path,
            skip_emit,
        } = &self.config.extractor;
        let SinkerConfig::Redis {
            url,
            batch_size,
            is_replace,
        } = &self.config.sinker;

        let mut extractor = RdbSnapshotFileExtractor {
            file_path: file_path.clone(),
            is_replace: *is_replace,
            base_extractor: BaseExtractor {
                buffer: buffer.clone(),
                shut_down: shut_down.clone(),
                skip_emit: *skip_emit,
                emitted_count: 0,
                data_size: 0,
            },
        };

        let conn = RedisClient::new(url).await?;
        let sinker = RedisSinker {
            batch_size: *batch_size,
            conn,
        };
        let mut pipeline = BasePipeline {
            buffer,
            sinker,
            shut_down,
        };

        let result = join(extractor.extract(), pipeline.start()).await;
        pipeline.stop().await?;
        extractor.close().await?;
        if result.0.is_err() {
            return result.0;
        }
        result.1
    }

    fn init_log4rs(&self) -> anyhow::Result<()> {
        let log4rs_file = &self.config.runtime.log4rs_file;
        if fs::metadata(log4rs_file).is_err() {
            return Ok(());
        }

        let mut config_str = String::new();
        File::open(log4rs_file)?.read_to_string(&mut config_str)?;

        config_str = config_str
            .replace(LOG_DIR_PLACEHODLER, &self.config.runtime.log_dir)
            .replace(LOG_LEVEL_PLACEHODLER, &self.config.runtime.log_level);

        let config: RawConfig = serde_yaml::from_str(&config_str)?;
        log4rs::init_raw_config(config)?;
        Ok(())
    }
}

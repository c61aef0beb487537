use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::bail;
use concurrent_queue::ConcurrentQueue;

use crate::error::Error;
use crate::log_info;
use crate::meta::redis_object::RedisCmd;
use crate::utils::time_util::TimeUtil;

pub struct BaseExtractor {
    pub buffer: Arc<ConcurrentQueue<RedisCmd>>,
    pub shut_down: Arc<AtomicBool>,
    pub skip_emit: bool,
    pub emitted_count: u64,
    pub data_size: u64,
}

impl BaseExtractor {
    pub async fn push_cmd(&mut self, cmd: RedisCmd) -> anyhow::Result<()> {
        if self.skip_emit {
            return Ok(());
        }

        while self.buffer.is_full() {
            if self.shut_down.load(Ordering::Acquire) {
                bail!(Error::Unexpected(
                    "pipeline has terminated, command dropped".into()
                ));
            }
            TimeUtil::sleep_millis(1).await;
        }

        self.emitted_count += 1;
        self.data_size += cmd.get_malloc_size() as u64;
        if self.buffer.push(cmd).is_err() {
            bail!(Error::Unexpected("buffer closed while pushing".into()));
        }
        Ok(())
    }

    pub async fn wait_task_finish(&mut self) -> anyhow::Result<()> {
        // wait for all pushed commands to be shipped
        while !self.buffer.is_empty() {
            TimeUtil::sleep_millis(1).await;
        }

        log_info!(
            "extractor finished, emitted commands: {}, data size: {}",
            self.emitted_count,
            self.data_size
        );
        self.shut_down.store(true, Ordering::Release);
        Ok(())
    }
}

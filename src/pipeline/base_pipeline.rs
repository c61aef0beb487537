use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use concurrent_queue::ConcurrentQueue;

use crate::log_info;
use crate::meta::redis_object::RedisCmd;
use crate::sinker::redis_sinker::RedisSinker;
use crate::traits::Sinker;
use crate::utils::time_util::TimeUtil;

pub struct BasePipeline {
    pub buffer: Arc<ConcurrentQueue<RedisCmd>>,
    pub sinker: RedisSinker,
    pub shut_down: Arc<AtomicBool>,
}

impl BasePipeline {
    pub async fn start(&mut self) -> anyhow::Result<()> {
        log_info!("pipeline starts, batch_size: {}", self.sinker.batch_size);

        while !self.shut_down.load(Ordering::Acquire) || !self.buffer.is_empty() {
            let data = self.drain();
            if data.is_empty() {
                TimeUtil::sleep_millis(1).await;
                continue;
            }

            if let Err(err) = self.sinker.sink_raw(data).await {
                // unblock the producer if it is waiting on a full buffer
                self.shut_down.store(true, Ordering::Release);
                return Err(err);
            }
        }

        log_info!("pipeline stops");
        Ok(())
    }

    pub async fn stop(&mut self) -> anyhow::Result<()> {
        self.sinker.close().await
    }

    fn drain(&mut self) -> Vec<RedisCmd> {
        let mut data = Vec::new();
        while data.len() < self.sinker.batch_size {
            match self.buffer.pop() {
                Ok(cmd) => data.push(cmd),
                Err(_) => break,
            }
        }
        data
    }
}

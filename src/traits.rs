use async_trait::async_trait;

use crate::meta::redis_object::RedisCmd;

#[async_trait]
pub trait Extractor {
    async fn extract(&mut self) -> anyhow::Result<()>;

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait Sinker {
    async fn sink_raw(&mut self, data: Vec<RedisCmd>) -> anyhow::Result<()>;

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

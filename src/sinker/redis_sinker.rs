use async_trait::async_trait;

use super::cmd_encoder::CmdEncoder;
use super::redis_client::RedisClient;
use crate::meta::redis_object::RedisCmd;
use crate::traits::Sinker;

pub struct RedisSinker {
    pub batch_size: usize,
    pub conn: RedisClient,
}

#[async_trait]
impl Sinker for RedisSinker {
    async fn sink_raw(&mut self, data: Vec<RedisCmd>) -> anyhow::Result<()> {
        for batch in data.chunks(self.batch_size.max(1)) {
            self.batch_sink(batch).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.conn.close().await
    }
}

impl RedisSinker {
    async fn batch_sink(&mut self, batch: &[RedisCmd]) -> anyhow::Result<()> {
        let mut packed_cmds = Vec::new();
        for cmd in batch {
            packed_cmds.extend_from_slice(&CmdEncoder::encode(cmd));
        }
        self.conn.send_packed(&packed_cmds).await?;

        // one reply per pipelined command, any server error is terminal
        for cmd in batch {
            if let Err(err) = self.conn.read().await {
                return Err(err.context(format!(
                    "sink failed, command: [{} {}]",
                    cmd.get_str_arg(0),
                    cmd.get_str_arg(1)
                )));
            }
        }
        Ok(())
    }
}

use anyhow::bail;
use async_std::io::BufReader;
use async_std::net::TcpStream;
use async_std::prelude::*;
use url::Url;

use super::cmd_encoder::CmdEncoder;
use super::redis_resp_reader::RedisRespReader;
use super::redis_resp_types::Value;
use crate::error::Error;
use crate::meta::redis_object::RedisCmd;

pub struct RedisClient {
    stream: BufReader<TcpStream>,
}

impl RedisClient {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let url_info = Url::parse(url)?;
        let host = match url_info.host_str() {
            Some(host) => host,
            None => bail!(Error::Unexpected(format!("no host in url: [{}]", url))),
        };
        let port = match url_info.port() {
            Some(port) => port,
            None => bail!(Error::Unexpected(format!("no port in url: [{}]", url))),
        };
        let username = url_info.username();
        let password = url_info.password();

        let stream = TcpStream::connect(format!("{}:{}", host, port)).await?;
        let mut me = Self {
            stream: BufReader::new(stream),
        };

        if let Some(password) = password {
            let mut cmd = RedisCmd::new();
            cmd.add_str_arg("AUTH");
            if !username.is_empty() {
                cmd.add_str_arg(username);
            }
            cmd.add_str_arg(password);

            me.send(&cmd).await?;
            if let Value::Okay = me.read().await? {
                return Ok(me);
            }
            bail!(Error::Unexpected(format!(
                "can't connect redis: [{}], auth failed",
                url
            )))
        }

        Ok(me)
    }

    pub async fn close(&mut self) -> anyhow::Result<()> {
        self.stream.get_mut().shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }

    pub async fn send_packed(&mut self, packed_cmd: &[u8]) -> anyhow::Result<()> {
        self.stream.get_mut().write_all(packed_cmd).await?;
        Ok(())
    }

    pub async fn send(&mut self, cmd: &RedisCmd) -> anyhow::Result<()> {
        self.send_packed(&CmdEncoder::encode(cmd)).await
    }

    pub async fn read(&mut self) -> anyhow::Result<Value> {
        RedisRespReader::decode(&mut self.stream).await
    }
}

use anyhow::bail;
use async_recursion::async_recursion;
use async_std::io::BufReader;
use async_std::net::TcpStream;
use async_std::prelude::*;

use super::redis_resp_types::Value;
use crate::error::Error;

/// Bulk or array lengths above this are treated as protocol corruption
/// rather than something to allocate for.
const MAX_REPLY_LEN: i64 = 512 * 1024 * 1024;

/// Reads single replies off the target connection. An `-ERR ...` reply
/// raises `Error::RespError` carrying the server message, so callers treat
/// server rejections and protocol corruption the same way: terminal.
pub struct RedisRespReader {}

impl RedisRespReader {
    #[async_recursion]
    pub async fn decode(reader: &mut BufReader<TcpStream>) -> anyhow::Result<Value> {
        let line = Self::read_line(reader).await?;
        let (prefix, payload) = match line.split_first() {
            Some(split) => split,
            None => bail!(Error::RespError("empty reply line".into())),
        };

        match *prefix {
            super::RESP_STATUS => {
                let status = String::from_utf8(payload.to_vec())?;
                if status == "OK" {
                    Ok(Value::Okay)
                } else {
                    Ok(Value::Status(status))
                }
            }

            super::RESP_ERROR => {
                let message = String::from_utf8_lossy(payload).to_string();
                bail!(Error::RespError(message))
            }

            super::RESP_INT => Ok(Value::Int(Self::parse_int(payload)?)),

            super::RESP_STRING => match Self::parse_int(payload)? {
                -1 => Ok(Value::Nil),
                len if len < 0 || len > MAX_REPLY_LEN => {
                    bail!(Error::RespError(format!("bad bulk length: {}", len)))
                }
                len => Ok(Value::Data(Self::read_bulk(reader, len as usize).await?)),
            },

            super::RESP_ARRAY => match Self::parse_int(payload)? {
                -1 => Ok(Value::Nil),
                len if len < 0 || len > MAX_REPLY_LEN => {
                    bail!(Error::RespError(format!("bad array length: {}", len)))
                }
                len => {
                    let mut values = Vec::with_capacity(len as usize);
                    for _ in 0..len {
                        values.push(Self::decode(reader).await?);
                    }
                    Ok(Value::Bulk(values))
                }
            },

            prefix => bail!(Error::RespError(format!(
                "unknown reply prefix: {:#04x}",
                prefix
            ))),
        }
    }

    /// One reply header line with the crlf stripped.
    async fn read_line(reader: &mut BufReader<TcpStream>) -> anyhow::Result<Vec<u8>> {
        let mut line: Vec<u8> = Vec::new();
        reader.read_until(b'\n', &mut line).await?;

        if !line.ends_with(b"\r\n") {
            bail!(Error::RespError(format!(
                "reply line without crlf: {:?}",
                line
            )))
        }
        line.truncate(line.len() - 2);
        Ok(line)
    }

    async fn read_bulk(
        reader: &mut BufReader<TcpStream>,
        len: usize,
    ) -> anyhow::Result<Vec<u8>> {
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await?;

        if !buf.ends_with(b"\r\n") {
            bail!(Error::RespError("bulk reply without crlf".into()))
        }
        buf.truncate(len);
        Ok(buf)
    }

    fn parse_int(payload: &[u8]) -> anyhow::Result<i64> {
        let text = std::str::from_utf8(payload)?;
        match text.parse() {
            Ok(value) => Ok(value),
            Err(_) => bail!(Error::RespError(format!("bad reply integer: {}", text))),
        }
    }
}

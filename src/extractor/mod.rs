use std::io::{Cursor, Read};

use anyhow::bail;

use crate::error::Error;

pub mod base_extractor;
pub mod rdb;
pub mod rdb_snapshot_file_extractor;

pub trait StreamReader {
    fn read_bytes(&mut self, size: usize) -> anyhow::Result<Vec<u8>>;
}

impl StreamReader for Cursor<&[u8]> {
    fn read_bytes(&mut self, size: usize) -> anyhow::Result<Vec<u8>> {
        let mut buf = vec![0; size];
        if let Err(err) = self.read_exact(&mut buf) {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                bail!(Error::ShortRead)
            }
            bail!(Error::IoError(err))
        }
        Ok(buf)
    }
}

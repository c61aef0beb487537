use std::fs::File;
use std::io::Read;
use std::sync::atomic::Ordering;

use anyhow::{bail, Context};
use async_trait::async_trait;

use super::base_extractor::BaseExtractor;
use super::rdb::rdb_parser::RdbParser;
use super::rdb::reader::rdb_reader::RdbReader;
use super::StreamReader;
use crate::error::Error;
use crate::log_info;
use crate::sinker::entry_rewriter::EntryRewriter;
use crate::traits::Extractor;

pub struct RdbSnapshotFileExtractor {
    pub file_path: String,
    pub is_replace: bool,
    pub base_extractor: BaseExtractor,
}

struct RdbFileReader {
    pub file: File,
}

#[async_trait]
impl Extractor for RdbSnapshotFileExtractor {
    async fn extract(&mut self) -> anyhow::Result<()> {
        let result = self.extract_internal().await;
        if result.is_err() {
            // unblock the consumer, it drains whatever was queued and exits
            self.base_extractor
                .shut_down
                .store(true, Ordering::Release);
        }
        result
    }
}

impl RdbSnapshotFileExtractor {
    async fn extract_internal(&mut self) -> anyhow::Result<()> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("rdb file not found: [{}]", self.file_path))?;
        let mut file_reader = RdbFileReader { file };

        let mut parser = RdbParser {
            reader: RdbReader::new(&mut file_reader),
            version: 0,
            now_db_id: 0,
            expire_ms: 0,
            is_end: false,
        };

        let version = parser.load_meta()?;
        log_info!("source rdb version: {}", version);

        loop {
            if let Some(entry) = parser.load_entry()? {
                let cmd = EntryRewriter::rewrite_as_restore(&entry, self.is_replace)?;
                self.base_extractor.push_cmd(cmd).await?;
            }

            if parser.is_end {
                log_info!(
                    "end extracting data from rdb, all count: {}",
                    self.base_extractor.emitted_count
                );
                break;
            }
        }
        self.base_extractor.wait_task_finish().await
    }
}

impl StreamReader for RdbFileReader {
    fn read_bytes(&mut self, size: usize) -> anyhow::Result<Vec<u8>> {
        let mut buf = vec![0; size];
        if let Err(err) = self.file.read_exact(&mut buf) {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                bail!(Error::ShortRead)
            }
            bail!(Error::IoError(err))
        }
        Ok(buf)
    }
}

use anyhow::bail;

use super::module2_parser::ModuleParser;
use crate::error::Error;
use crate::extractor::rdb::reader::rdb_reader::RdbReader;

pub struct EntryParser {}

impl EntryParser {
    /// Walk one value payload. The caller has already enabled raw capture
    /// on the reader, so every byte consumed here ends up in the payload;
    /// inner collection encodings (ziplist, intset, zipmap, quicklist
    /// nodes) are forwarded as opaque strings.
    pub fn copy_object(reader: &mut RdbReader, type_byte: u8) -> anyhow::Result<()> {
        match type_byte {
            super::RDB_TYPE_STRING
            | super::RDB_TYPE_HASH_ZIPMAP
            | super::RDB_TYPE_LIST_ZIPLIST
            | super::RDB_TYPE_SET_INTSET
            | super::RDB_TYPE_ZSET_ZIPLIST
            | super::RDB_TYPE_HASH_ZIPLIST => reader.copy_string(),

            super::RDB_TYPE_LIST | super::RDB_TYPE_SET => Self::copy_list_or_set(reader),

            super::RDB_TYPE_HASH => Self::copy_hash(reader),

            super::RDB_TYPE_ZSET => Self::copy_zset(reader),

            super::RDB_TYPE_ZSET_2 => Self::copy_zset_2(reader),

            super::RDB_TYPE_LIST_QUICKLIST => Self::copy_quick_list(reader),

            super::RDB_TYPE_STREAM_LISTPACKS => bail!(Error::UnsupportedStreamListpacks),

            super::RDB_TYPE_MODULE_2 => ModuleParser::copy_module_2(reader),

            _ => bail!(Error::UnsupportedOp(type_byte)),
        }
    }

    fn copy_list_or_set(reader: &mut RdbReader) -> anyhow::Result<()> {
        let size = reader.read_length()?;
        for _ in 0..size {
            reader.copy_string()?;
        }
        Ok(())
    }

    fn copy_hash(reader: &mut RdbReader) -> anyhow::Result<()> {
        let size = reader.read_length()?;
        for _ in 0..size {
            // field
            reader.copy_string()?;
            // value
            reader.copy_string()?;
        }
        Ok(())
    }

    fn copy_zset(reader: &mut RdbReader) -> anyhow::Result<()> {
        let size = reader.read_length()?;
        for _ in 0..size {
            reader.copy_string()?;

            // score is an ascii double prefixed with its length; 0xfd, 0xfe
            // and 0xff are nan/+inf/-inf markers with no trailing bytes
            let score_len = reader.read_byte()?;
            if score_len < 0xfd {
                reader.read_bytes(score_len as usize)?;
            }
        }
        Ok(())
    }

    fn copy_zset_2(reader: &mut RdbReader) -> anyhow::Result<()> {
        let size = reader.read_length()?;
        for _ in 0..size {
            reader.copy_string()?;
            // binary double score, little endian
            reader.read_bytes(8)?;
        }
        Ok(())
    }

    fn copy_quick_list(reader: &mut RdbReader) -> anyhow::Result<()> {
        let size = reader.read_length()?;
        for _ in 0..size {
            // each node is a ziplist serialized as a string
            reader.copy_string()?;
        }
        Ok(())
    }
}

use anyhow::{bail, Context};
use chrono::Utc;

use super::entry_parser::entry_parser::EntryParser;
use super::entry_parser::{
    RDB_TYPE_HASH, RDB_TYPE_HASH_ZIPLIST, RDB_TYPE_HASH_ZIPMAP, RDB_TYPE_LIST,
    RDB_TYPE_LIST_QUICKLIST, RDB_TYPE_LIST_ZIPLIST, RDB_TYPE_MODULE_2, RDB_TYPE_SET,
    RDB_TYPE_SET_INTSET, RDB_TYPE_STREAM_LISTPACKS, RDB_TYPE_STRING, RDB_TYPE_ZSET,
    RDB_TYPE_ZSET_2, RDB_TYPE_ZSET_ZIPLIST,
};
use super::reader::rdb_reader::RdbReader;
use crate::error::Error;
use crate::meta::redis_entry::RedisEntry;
use crate::{log_debug, log_info};

const K_FLAG_AUX: u8 = 0xfa; // RDB aux field.
const K_FLAG_RESIZE_DB: u8 = 0xfb; // Hash table resize hint.
const K_FLAG_EXPIRE_MS: u8 = 0xfc; // Expire time in milliseconds.
const K_FLAG_EXPIRE: u8 = 0xfd; // Old expire time in seconds.
const K_FLAG_SELECT: u8 = 0xfe; // DB number of the following keys.
const K_EOF: u8 = 0xff; // End of the RDB file.

const MAX_SUPPORTED_VERSION: u32 = 9;

pub struct RdbParser<'a> {
    pub reader: RdbReader<'a>,
    pub version: u16,
    pub now_db_id: i64,
    pub expire_ms: i64,

    pub is_end: bool,
}

impl RdbParser<'_> {
    pub fn load_meta(&mut self) -> anyhow::Result<String> {
        // magic
        let buf = self.reader.read_bytes(5)?;
        if buf != b"REDIS" {
            bail!(Error::WrongSignature)
        }

        // 4 ascii digits
        let buf = self.reader.read_bytes(4)?;
        let version_str = String::from_utf8(buf).map_err(|_| Error::WrongSignature)?;
        let version: u32 = version_str.parse().map_err(|_| Error::WrongSignature)?;
        if version > MAX_SUPPORTED_VERSION {
            bail!(Error::VersionUnsupported(version))
        }

        self.version = version as u16;
        Ok(version_str)
    }

    pub fn load_entry(&mut self) -> anyhow::Result<Option<RedisEntry>> {
        let type_byte = self.reader.read_byte()?;
        log_debug!("rdb type_byte: {}", type_byte);

        match type_byte {
            K_FLAG_AUX => {
                let key = self.reader.read_string()?;
                let value = self.reader.read_string()?;
                log_info!("RDB aux field. key=[{}], value=[{}]", key, value);
            }

            K_FLAG_RESIZE_DB => {
                let db_size = self.reader.read_length()?;
                let expire_size = self.reader.read_length()?;
                log_info!(
                    "RDB resize db. db_size=[{}], expire_size=[{}]",
                    db_size,
                    expire_size
                )
            }

            K_FLAG_EXPIRE_MS => {
                let expire_at = self.reader.read_u64()? as i64;
                self.expire_ms = Self::to_relative_ms(expire_at);
            }

            K_FLAG_EXPIRE => {
                let expire_at = self.reader.read_u32()? as i64 * 1000;
                self.expire_ms = Self::to_relative_ms(expire_at);
            }

            K_FLAG_SELECT => {
                self.now_db_id = self.reader.read_length()? as i64;
                log_info!("RDB select db. db_id=[{}]", self.now_db_id);
            }

            K_EOF => {
                // files since version 5 carry a crc64 trailer; we rebuild a
                // checksum per payload instead of validating this one
                if self.version > 4 {
                    self.reader.read_bytes(8)?;
                }
                self.is_end = true;
            }

            RDB_TYPE_STRING
            | RDB_TYPE_LIST
            | RDB_TYPE_SET
            | RDB_TYPE_ZSET
            | RDB_TYPE_HASH
            | RDB_TYPE_ZSET_2
            | RDB_TYPE_MODULE_2
            | RDB_TYPE_HASH_ZIPMAP
            | RDB_TYPE_LIST_ZIPLIST
            | RDB_TYPE_SET_INTSET
            | RDB_TYPE_ZSET_ZIPLIST
            | RDB_TYPE_HASH_ZIPLIST
            | RDB_TYPE_LIST_QUICKLIST
            | RDB_TYPE_STREAM_LISTPACKS => return self.load_value_entry(type_byte).map(Some),

            _ => bail!(Error::UnsupportedOp(type_byte)),
        }

        Ok(None)
    }

    fn load_value_entry(&mut self, type_byte: u8) -> anyhow::Result<RedisEntry> {
        // the key is a command argument, not part of the payload
        let key = self.reader.read_string()?;

        self.reader.copy_raw = true;
        let result = EntryParser::copy_object(&mut self.reader, type_byte);
        self.reader.copy_raw = false;
        result.with_context(|| {
            format!(
                "parsing value failed, type_byte: {}, key: {}, position: {}",
                type_byte, key, self.reader.position
            )
        })?;

        let mut entry = RedisEntry::new();
        entry.key = key;
        entry.value_type_byte = type_byte;
        entry.rdb_version = self.version;
        entry.raw_bytes = self.reader.drain_raw_bytes();
        entry.expire_ms = self.expire_ms;
        // consumed by this record
        self.expire_ms = 0;
        Ok(entry)
    }

    fn to_relative_ms(expire_at_ms: i64) -> i64 {
        let ttl_ms = expire_at_ms - Utc::now().timestamp_millis();
        if ttl_ms <= 0 {
            // already expired, restore with the shortest possible ttl
            1
        } else {
            ttl_ms
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn str_raw(s: &[u8]) -> Vec<u8> {
        let mut buf = vec![s.len() as u8];
        buf.extend_from_slice(s);
        buf
    }

    fn module_unsigned(value: u8) -> Vec<u8> {
        // uint opcode tag, then the value, both 6 bit lengths
        vec![0x02, value]
    }

    fn parse_all(input: &[u8]) -> anyhow::Result<Vec<RedisEntry>> {
        let mut cursor = Cursor::new(input);
        let mut parser = RdbParser {
            reader: RdbReader::new(&mut cursor),
            version: 0,
            now_db_id: 0,
            expire_ms: 0,
            is_end: false,
        };
        parser.load_meta()?;

        let mut entries = Vec::new();
        loop {
            if let Some(entry) = parser.load_entry()? {
                entries.push(entry);
            }
            if parser.is_end {
                return Ok(entries);
            }
        }
    }

    #[test]
    fn test_empty_database() {
        let mut input = b"REDIS0006".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xff);
        // trailer crc, discarded
        input.extend_from_slice(&[0u8; 8]);

        let entries = parse_all(&input).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_old_version_has_no_crc_trailer() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_string_entry_capture() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"foo"));
        let value_start = input.len();
        input.extend_from_slice(&str_raw(b"bar"));
        let value_end = input.len();
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.key.bytes, b"foo");
        assert_eq!(entry.value_type_byte, 0x00);
        assert_eq!(entry.rdb_version, 3);
        assert_eq!(entry.expire_ms, 0);
        // the capture is exactly the file slice between key end and the
        // next opcode
        assert_eq!(entry.raw_bytes, input[value_start..value_end].to_vec());
    }

    #[test]
    fn test_integer_encoded_keys() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x00);
        // int16 encoded key 12345
        input.extend_from_slice(&[0xc1, 0x39, 0x30]);
        input.extend_from_slice(&str_raw(b"v"));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].key.bytes, b"12345");
        assert_eq!(entries[0].expire_ms, 0);
        assert_eq!(entries[0].raw_bytes, str_raw(b"v"));
    }

    #[test]
    fn test_framing_bytes_stay_out_of_capture() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        // resize db hint
        input.extend_from_slice(&[0xfb, 0x01, 0x00]);
        // aux field
        input.push(0xfa);
        input.extend_from_slice(&str_raw(b"redis-ver"));
        input.extend_from_slice(&str_raw(b"4.0.0"));
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k"));
        input.extend_from_slice(&str_raw(b"v"));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_bytes, str_raw(b"v"));
    }

    #[test]
    fn test_expiry_ms_in_past_becomes_one() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xfc);
        // far in the past
        input.extend_from_slice(&1000u64.to_le_bytes());
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k"));
        input.extend_from_slice(&str_raw(b"v"));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].expire_ms, 1);
    }

    #[test]
    fn test_expiry_ms_in_future_is_relative() {
        let expire_at = Utc::now().timestamp_millis() + 60_000;
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xfc);
        input.extend_from_slice(&(expire_at as u64).to_le_bytes());
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k"));
        input.extend_from_slice(&str_raw(b"v"));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert!(entries[0].expire_ms > 0);
        assert!(entries[0].expire_ms <= 60_000);
    }

    #[test]
    fn test_expiry_seconds_in_past_becomes_one() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xfd);
        input.extend_from_slice(&10u32.to_le_bytes());
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k"));
        input.extend_from_slice(&str_raw(b"v"));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].expire_ms, 1);
    }

    #[test]
    fn test_expiry_is_consumed_by_one_record() {
        let expire_at = Utc::now().timestamp_millis() + 60_000;
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xfc);
        input.extend_from_slice(&(expire_at as u64).to_le_bytes());
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k1"));
        input.extend_from_slice(&str_raw(b"v1"));
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k2"));
        input.extend_from_slice(&str_raw(b"v2"));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert!(entries[0].expire_ms > 0);
        assert_eq!(entries[1].expire_ms, 0);
    }

    #[test]
    fn test_hash_entry() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x04);
        input.extend_from_slice(&str_raw(b"h"));
        let value_start = input.len();
        input.push(0x02);
        input.extend_from_slice(&str_raw(b"f1"));
        input.extend_from_slice(&str_raw(b"v1"));
        input.extend_from_slice(&str_raw(b"f2"));
        input.extend_from_slice(&str_raw(b"v2"));
        let value_end = input.len();
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].raw_bytes, input[value_start..value_end].to_vec());
    }

    #[test]
    fn test_zset_ascii_scores() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x03);
        input.extend_from_slice(&str_raw(b"z"));
        let value_start = input.len();
        input.push(0x02);
        input.extend_from_slice(&str_raw(b"m1"));
        input.push(0x04);
        input.extend_from_slice(b"3.14");
        // negative infinity marker, no trailing bytes
        input.extend_from_slice(&str_raw(b"m2"));
        input.push(0xfe);
        let value_end = input.len();
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].raw_bytes, input[value_start..value_end].to_vec());
    }

    #[test]
    fn test_zset_2_binary_scores_are_captured() {
        let mut input = b"REDIS0008".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x05);
        input.extend_from_slice(&str_raw(b"z"));
        let value_start = input.len();
        input.push(0x01);
        input.extend_from_slice(&str_raw(b"member"));
        input.extend_from_slice(&1.5f64.to_le_bytes());
        let value_end = input.len();
        input.push(0xff);
        input.extend_from_slice(&[0u8; 8]);

        let entries = parse_all(&input).unwrap();
        let entry = &entries[0];
        assert_eq!(entry.raw_bytes, input[value_start..value_end].to_vec());
        // exactly 8 score bytes after the member string
        assert_eq!(entry.raw_bytes.len(), 1 + str_raw(b"member").len() + 8);
    }

    #[test]
    fn test_intset_is_forwarded_opaquely() {
        // 16 bit intset with values 1 and 2, passed through as one string
        let mut intset = Vec::new();
        intset.extend_from_slice(&2u32.to_le_bytes());
        intset.extend_from_slice(&2u32.to_le_bytes());
        intset.extend_from_slice(&1u16.to_le_bytes());
        intset.extend_from_slice(&2u16.to_le_bytes());

        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x0b);
        input.extend_from_slice(&str_raw(b"s"));
        input.extend_from_slice(&str_raw(&intset));
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].raw_bytes, str_raw(&intset));
    }

    #[test]
    fn test_quicklist_nodes_are_forwarded_opaquely() {
        let node: &[u8] = &[0x0b, 0x00, 0x00, 0x00, 0x0a, 0x00];
        let mut input = b"REDIS0007".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x0e);
        input.extend_from_slice(&str_raw(b"l"));
        let value_start = input.len();
        input.push(0x01);
        input.extend_from_slice(&str_raw(node));
        let value_end = input.len();
        input.push(0xff);
        input.extend_from_slice(&[0u8; 8]);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].raw_bytes, input[value_start..value_end].to_vec());
    }

    #[test]
    fn test_lzf_value_stays_compressed_in_capture() {
        // lzf block for "aaaaaaaa"
        let value: &[u8] = &[0xc3, 0x04, 0x08, 0x00, b'a', 0xa0, 0x00];
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x00);
        input.extend_from_slice(&str_raw(b"k"));
        input.extend_from_slice(value);
        input.push(0xff);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].raw_bytes, value.to_vec());
    }

    #[test]
    fn test_bloom_filter_module() {
        let mut input = b"REDIS0009".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x07);
        input.extend_from_slice(&str_raw(b"bf"));
        let value_start = input.len();
        // module id, 64 bit length encoding
        input.push(0x81);
        input.extend_from_slice(&3465209449566631940u64.to_be_bytes());
        // size, nfilters = 1, options, growth
        input.extend_from_slice(&module_unsigned(0x20));
        input.extend_from_slice(&module_unsigned(0x01));
        input.extend_from_slice(&module_unsigned(0x00));
        input.extend_from_slice(&module_unsigned(0x02));
        // entries
        input.extend_from_slice(&module_unsigned(0x0a));
        // error rate
        input.push(0x04);
        input.extend_from_slice(&0.01f64.to_le_bytes());
        // hashes
        input.extend_from_slice(&module_unsigned(0x07));
        // bits per entry
        input.push(0x04);
        input.extend_from_slice(&9.6f64.to_le_bytes());
        // bits
        input.extend_from_slice(&module_unsigned(0x30));
        // n2
        input.extend_from_slice(&module_unsigned(0x01));
        // bit buffer
        input.push(0x05);
        input.extend_from_slice(&str_raw(&[0xaa, 0xbb, 0xcc]));
        // size
        input.extend_from_slice(&module_unsigned(0x06));
        // module eof
        input.push(0x00);
        let value_end = input.len();
        input.push(0xff);
        input.extend_from_slice(&[0u8; 8]);

        let entries = parse_all(&input).unwrap();
        let entry = &entries[0];
        assert_eq!(entry.raw_bytes, input[value_start..value_end].to_vec());
        // payload ends with the module eof opcode
        assert_eq!(*entry.raw_bytes.last().unwrap(), 0x00);
    }

    #[test]
    fn test_cuckoo_filter_module() {
        let mut input = b"REDIS0009".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x07);
        input.extend_from_slice(&str_raw(b"cf"));
        let value_start = input.len();
        input.push(0x81);
        input.extend_from_slice(&3465209449562641412u64.to_be_bytes());
        // numFilters = 1, numBuckets, numItems, numDeletes, bucketSize,
        // maxIterations, expansion
        input.extend_from_slice(&module_unsigned(0x01));
        input.extend_from_slice(&module_unsigned(0x10));
        input.extend_from_slice(&module_unsigned(0x05));
        input.extend_from_slice(&module_unsigned(0x00));
        input.extend_from_slice(&module_unsigned(0x02));
        input.extend_from_slice(&module_unsigned(0x14));
        input.extend_from_slice(&module_unsigned(0x01));
        // per filter: numBuckets, bucket data
        input.extend_from_slice(&module_unsigned(0x10));
        input.push(0x05);
        input.extend_from_slice(&str_raw(&[0x01, 0x02, 0x03, 0x04]));
        input.push(0x00);
        let value_end = input.len();
        input.push(0xff);
        input.extend_from_slice(&[0u8; 8]);

        let entries = parse_all(&input).unwrap();
        assert_eq!(entries[0].raw_bytes, input[value_start..value_end].to_vec());
    }

    #[test]
    fn test_unknown_module_fails() {
        let mut input = b"REDIS0009".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x07);
        input.extend_from_slice(&str_raw(b"m"));
        input.push(0x81);
        input.extend_from_slice(&1u64.to_be_bytes());

        let err = parse_all(&input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedModule { .. })
        ));
    }

    #[test]
    fn test_module_opcode_mismatch() {
        let mut input = b"REDIS0009".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x07);
        input.extend_from_slice(&str_raw(b"bf"));
        input.push(0x81);
        input.extend_from_slice(&3465209449566631940u64.to_be_bytes());
        // first field must be a uint, send a double tag instead
        input.push(0x04);

        let err = parse_all(&input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ModuleOpcodeMismatch {
                expect: 2,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_wrong_signature() {
        let err = parse_all(b"RDBIS0003").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::WrongSignature)
        ));

        let err = parse_all(b"REDIS00x3").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::WrongSignature)
        ));
    }

    #[test]
    fn test_version_unsupported() {
        let err = parse_all(b"REDIS0010").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::VersionUnsupported(10))
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0xf0);

        let err = parse_all(&input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedOp(0xf0))
        ));
    }

    #[test]
    fn test_stream_listpacks_fails_explicitly() {
        let mut input = b"REDIS0009".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        input.push(0x0f);
        input.extend_from_slice(&str_raw(b"stream"));

        let err = parse_all(&input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedStreamListpacks)
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let mut input = b"REDIS0003".to_vec();
        input.extend_from_slice(&[0xfe, 0x00]);
        for (key, value) in [(b"k1", b"v1"), (b"k2", b"v2"), (b"k3", b"v3")] {
            input.push(0x00);
            input.extend_from_slice(&str_raw(key));
            input.extend_from_slice(&str_raw(value));
        }
        input.push(0xff);

        let first = parse_all(&input).unwrap();
        let second = parse_all(&input).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.raw_bytes, b.raw_bytes);
            assert_eq!(a.expire_ms, b.expire_ms);
        }
    }
}

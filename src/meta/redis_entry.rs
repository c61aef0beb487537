use super::redis_object::RedisString;

/// One persisted key pulled out of the snapshot. `raw_bytes` holds the
/// exact value payload bytes as they appeared on disk, without the leading
/// type byte (kept in `value_type_byte`) and without the key.
#[derive(Debug, Clone)]
pub struct RedisEntry {
    pub key: RedisString,
    pub expire_ms: i64,
    pub value_type_byte: u8,
    pub rdb_version: u16,
    pub raw_bytes: Vec<u8>,
}

impl RedisEntry {
    pub fn new() -> Self {
        Self {
            key: RedisString::new(),
            expire_ms: 0,
            value_type_byte: 0,
            rdb_version: 0,
            raw_bytes: Vec::new(),
        }
    }

}

impl Default for RedisEntry {
    fn default() -> Self {
        Self::new()
    }
}

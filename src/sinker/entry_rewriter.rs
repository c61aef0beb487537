use byteorder::{LittleEndian, WriteBytesExt};

use crate::meta::redis_entry::RedisEntry;
use crate::meta::redis_object::RedisCmd;
use crate::utils::crc64;

pub struct EntryRewriter {}

impl EntryRewriter {
    /// Frame a captured value as the payload RESTORE expects:
    /// type byte, raw value bytes, 2 byte little endian rdb version,
    /// 8 byte little endian crc64 over everything before it.
    pub fn rewrite_as_restore(entry: &RedisEntry, is_replace: bool) -> anyhow::Result<RedisCmd> {
        let mut payload = Vec::with_capacity(entry.raw_bytes.len() + 11);
        payload.push(entry.value_type_byte);
        payload.extend_from_slice(&entry.raw_bytes);
        payload.write_u16::<LittleEndian>(entry.rdb_version)?;

        let checksum = crc64::crc64(0, &payload);
        payload.write_u64::<LittleEndian>(checksum)?;

        let mut cmd = RedisCmd::new();
        cmd.add_str_arg("RESTORE");
        cmd.add_redis_arg(&entry.key);
        cmd.add_str_arg(&entry.expire_ms.to_string());
        cmd.add_arg(payload);
        if is_replace {
            cmd.add_str_arg("REPLACE");
        }
        Ok(cmd)
    }
}

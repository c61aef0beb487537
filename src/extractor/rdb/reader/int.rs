use byteorder::{ByteOrder, LittleEndian};

use super::rdb_reader::RdbReader;

impl RdbReader<'_> {
    pub fn read_u32(&mut self) -> anyhow::Result<u32> {
        let buf = self.read_bytes(4)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    pub fn read_u64(&mut self) -> anyhow::Result<u64> {
        let buf = self.read_bytes(8)?;
        Ok(LittleEndian::read_u64(&buf))
    }
}

use crate::extractor::StreamReader;

/// Bytewise reader over the snapshot stream. While `copy_raw` is set every
/// byte that passes through lands in `raw_bytes` too, which is how value
/// payloads are preserved bit for bit for the RESTORE rewrite.
pub struct RdbReader<'a> {
    pub conn: &'a mut (dyn StreamReader + Send),
    pub position: usize,
    pub copy_raw: bool,
    pub raw_bytes: Vec<u8>,
}

impl<'a> RdbReader<'a> {
    pub fn new(conn: &'a mut (dyn StreamReader + Send)) -> Self {
        Self {
            conn,
            position: 0,
            copy_raw: false,
            raw_bytes: Vec::new(),
        }
    }

    pub fn read_bytes(&mut self, size: usize) -> anyhow::Result<Vec<u8>> {
        let buf = self.conn.read_bytes(size)?;
        self.position += size;
        if self.copy_raw {
            self.raw_bytes.extend_from_slice(&buf);
        }
        Ok(buf)
    }

    pub fn drain_raw_bytes(&mut self) -> Vec<u8> {
        self.raw_bytes.drain(..).collect()
    }
}

use std::sync::OnceLock;

/// Jones polynomial in reflected bit order, the variant redis uses for
/// DUMP/RESTORE payloads and the rdb file trailer.
const POLY: u64 = 0x95ac_9329_ac4b_c9b5;

static TABLE: OnceLock<[u64; 256]> = OnceLock::new();

fn table() -> &'static [u64; 256] {
    TABLE.get_or_init(|| {
        let mut table = [0u64; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = i as u64;
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ POLY
                } else {
                    crc >> 1
                };
            }
            *entry = crc;
        }
        table
    })
}

/// Continue a checksum over `data`. A fresh payload starts from crc == 0,
/// no final xor is applied.
pub fn crc64(mut crc: u64, data: &[u8]) -> u64 {
    let table = table();
    for byte in data {
        crc = table[((crc ^ *byte as u64) & 0xff) as usize] ^ (crc >> 8);
    }
    crc
}

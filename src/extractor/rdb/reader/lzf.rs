use anyhow::bail;

use crate::error::Error;

/// Decompress one lzf block into exactly `out_len` bytes.
///
/// The stream alternates literal runs (control byte < 32, run of control+1
/// bytes) and back references (`len = ctrl >> 5`, extended by one byte when
/// 7; offset = low 5 control bits << 8 | next byte). Back references copy
/// `len + 2` bytes one at a time so an overlapping reference re-reads bytes
/// it just wrote, which is how lzf encodes runs.
pub fn decompress(in_buf: &[u8], out_len: usize) -> anyhow::Result<Vec<u8>> {
    let mut out = vec![0u8; out_len];

    let mut i = 0;
    let mut o = 0;
    while i < in_buf.len() {
        let ctrl = in_buf[i] as usize;
        i += 1;

        if ctrl < 32 {
            let run = ctrl + 1;
            if o + run > out_len {
                bail!(Error::LzfCorrupt(format!(
                    "literal run overflows output, out_pos: {}, run: {}, out_len: {}",
                    o, run, out_len
                )));
            }
            if i + run > in_buf.len() {
                bail!(Error::LzfCorrupt("literal run truncated".into()));
            }
            out[o..o + run].copy_from_slice(&in_buf[i..i + run]);
            i += run;
            o += run;
        } else {
            let mut len = ctrl >> 5;
            if len == 7 {
                if i >= in_buf.len() {
                    bail!(Error::LzfCorrupt("back reference truncated".into()));
                }
                len += in_buf[i] as usize;
                i += 1;
            }

            if i >= in_buf.len() {
                bail!(Error::LzfCorrupt("back reference truncated".into()));
            }
            let offset = ((ctrl & 0x1f) << 8) | in_buf[i] as usize;
            i += 1;

            if offset + 1 > o {
                bail!(Error::LzfCorrupt(format!(
                    "back reference before start of output, out_pos: {}, offset: {}",
                    o, offset
                )));
            }
            let copy = len + 2;
            if o + copy > out_len {
                bail!(Error::LzfCorrupt(format!(
                    "back reference overflows output, out_pos: {}, copy: {}, out_len: {}",
                    o, copy, out_len
                )));
            }

            let mut r = o - offset - 1;
            for _ in 0..copy {
                out[o] = out[r];
                o += 1;
                r += 1;
            }
        }
    }

    if o != out_len {
        bail!(Error::LzfCorrupt(format!(
            "decompressed size mismatch, expect: {}, actual: {}",
            out_len, o
        )));
    }
    Ok(out)
}

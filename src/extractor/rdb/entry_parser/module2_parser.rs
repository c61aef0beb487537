use anyhow::bail;

use crate::error::Error;
use crate::extractor::rdb::reader::rdb_reader::RdbReader;

const MODULE_TYPE_NAME_CHAR_SET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

// RedisBloom, the only module family whose payloads we can walk
const BLOOM_FILTER_MODULE_ID: u64 = 3465209449566631940; // MBbloom--
const CUCKOO_FILTER_MODULE_ID: u64 = 3465209449562641412; // MBbloomCF

const RDB_MODULE_OPCODE_EOF: u64 = 0;
const RDB_MODULE_OPCODE_UINT: u64 = 2;
const RDB_MODULE_OPCODE_DOUBLE: u64 = 4;
const RDB_MODULE_OPCODE_STRING: u64 = 5;

pub struct ModuleParser {}

impl ModuleParser {
    pub fn copy_module_2(reader: &mut RdbReader) -> anyhow::Result<()> {
        let module_id = reader.read_length()?;
        match module_id {
            BLOOM_FILTER_MODULE_ID => Self::copy_bloom_filter(reader),
            CUCKOO_FILTER_MODULE_ID => Self::copy_cuckoo_filter(reader),
            _ => {
                bail!(Error::UnsupportedModule {
                    id: module_id,
                    name: Self::module_type_name_by_id(module_id),
                })
            }
        }
    }

    fn copy_bloom_filter(reader: &mut RdbReader) -> anyhow::Result<()> {
        // size
        Self::read_unsigned(reader)?;
        let nfilters = Self::read_unsigned(reader)?;
        // options
        Self::read_unsigned(reader)?;
        // growth
        Self::read_unsigned(reader)?;

        for _ in 0..nfilters {
            // entries
            Self::read_unsigned(reader)?;
            // error rate
            Self::read_double(reader)?;
            // hashes
            Self::read_unsigned(reader)?;
            // bits per entry
            Self::read_double(reader)?;
            // bits
            Self::read_unsigned(reader)?;
            // n2
            Self::read_unsigned(reader)?;
            // bit buffer
            Self::read_string_buffer(reader)?;
            // size
            Self::read_unsigned(reader)?;
        }

        Self::read_eof(reader)
    }

    fn copy_cuckoo_filter(reader: &mut RdbReader) -> anyhow::Result<()> {
        let num_filters = Self::read_unsigned(reader)?;
        // numBuckets
        Self::read_unsigned(reader)?;
        // numItems
        Self::read_unsigned(reader)?;
        // numDeletes
        Self::read_unsigned(reader)?;
        // bucketSize
        Self::read_unsigned(reader)?;
        // maxIterations
        Self::read_unsigned(reader)?;
        // expansion
        Self::read_unsigned(reader)?;

        for _ in 0..num_filters {
            // numBuckets
            Self::read_unsigned(reader)?;
            // bucket data
            Self::read_string_buffer(reader)?;
        }

        Self::read_eof(reader)
    }

    fn expect_opcode(reader: &mut RdbReader, expect: u64) -> anyhow::Result<()> {
        let actual = reader.read_length()?;
        if actual != expect {
            bail!(Error::ModuleOpcodeMismatch { expect, actual })
        }
        Ok(())
    }

    fn read_unsigned(reader: &mut RdbReader) -> anyhow::Result<u64> {
        Self::expect_opcode(reader, RDB_MODULE_OPCODE_UINT)?;
        reader.read_length()
    }

    fn read_double(reader: &mut RdbReader) -> anyhow::Result<()> {
        Self::expect_opcode(reader, RDB_MODULE_OPCODE_DOUBLE)?;
        reader.read_bytes(8)?;
        Ok(())
    }

    fn read_string_buffer(reader: &mut RdbReader) -> anyhow::Result<()> {
        Self::expect_opcode(reader, RDB_MODULE_OPCODE_STRING)?;
        reader.copy_string()
    }

    fn read_eof(reader: &mut RdbReader) -> anyhow::Result<()> {
        Self::expect_opcode(reader, RDB_MODULE_OPCODE_EOF)
    }

    /// Module ids pack a 9 char name (6 bits per char) plus a 10 bit
    /// encoding version.
    pub fn module_type_name_by_id(module_id: u64) -> String {
        let mut name_list: Vec<u8> = vec![0; 9];
        let mut module_id = module_id >> 10;
        let name_char_set = MODULE_TYPE_NAME_CHAR_SET.chars().collect::<Vec<char>>();

        for i in (0..9).rev() {
            name_list[i] = name_char_set[(module_id & 63) as usize] as u8;
            module_id >>= 6;
        }
        String::from_utf8(name_list).unwrap()
    }
}

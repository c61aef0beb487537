pub mod crc64;
pub mod time_util;

pub mod cmd_encoder;
pub mod entry_rewriter;
pub mod redis_client;
pub mod redis_resp_reader;
pub mod redis_resp_types;
pub mod redis_sinker;

/// redis resp protocol data type
pub const RESP_STATUS: u8 = b'+'; // +<string>\r\n
pub const RESP_ERROR: u8 = b'-'; // -<string>\r\n
pub const RESP_STRING: u8 = b'$'; // $<length>\r\n<bytes>\r\n
pub const RESP_INT: u8 = b':'; // :<number>\r\n
pub const RESP_ARRAY: u8 = b'*'; // *<len>\r\n...

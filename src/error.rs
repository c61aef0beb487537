use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("rdb: wrong signature")]
    WrongSignature,

    #[error("rdb: version unsupported: [{0}]")]
    VersionUnsupported(u32),

    #[error("rdb: unsupported opcode: [{0:#04x}]")]
    UnsupportedOp(u8),

    #[error("rdb: unsupported string encoding: [{0}]")]
    UnsupportedStringEncoding(u8),

    #[error("rdb: illegal length encoding: [{0:#04x}]")]
    IllegalLengthEncoding(u8),

    #[error("rdb: unsupported module: id=[{id}], name=[{name}]")]
    UnsupportedModule { id: u64, name: String },

    #[error("rdb: stream listpacks not supported")]
    UnsupportedStreamListpacks,

    #[error("rdb: module opcode mismatch, expect: [{expect}], actual: [{actual}]")]
    ModuleOpcodeMismatch { expect: u64, actual: u64 },

    #[error("rdb: short read, stream ended mid record")]
    ShortRead,

    #[error("lzf: corrupt stream: {0}")]
    LzfCorrupt(String),

    #[error("resp: {0}")]
    RespError(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

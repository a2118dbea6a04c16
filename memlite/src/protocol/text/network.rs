use crate::cache::cache::KeyType;
use crate::cache::error::CacheError;
use bytes::Bytes;

pub const CRLF: &[u8] = b"\r\n";
pub const END_OF_TRANSMISSION: u8 = 0x04;
pub const MAX_KEY_LENGTH: usize = 250;
pub const NOREPLY: &[u8] = b"noreply";

/// Which storage command carried a data block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCommand {
    Set,
    Add,
    Replace,
    Cas,
    Append,
    Prepend,
}

impl StorageCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageCommand::Set => "set",
            StorageCommand::Add => "add",
            StorageCommand::Replace => "replace",
            StorageCommand::Cas => "cas",
            StorageCommand::Append => "append",
            StorageCommand::Prepend => "prepend",
        }
    }
}

/// Parsed command line of a storage command, before its data block arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHeader {
    pub command: StorageCommand,
    pub key: KeyType,
    pub flags: u32,
    pub exptime: i64,
    pub bytes: usize,
    /// only meaningful for `cas`
    pub cas_unique: u64,
    pub noreply: bool,
}

/// set, add, replace and cas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRequest {
    pub key: KeyType,
    pub flags: u32,
    pub exptime: i64,
    pub value: Bytes,
    pub noreply: bool,
}

pub type AddRequest = SetRequest;
pub type ReplaceRequest = SetRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasRequest {
    pub request: SetRequest,
    pub cas_unique: u64,
}

/// append and prepend, `value` is `None` when no data was supplied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRequest {
    pub key: KeyType,
    pub value: Option<Bytes>,
    pub noreply: bool,
}

pub type PrependRequest = AppendRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub keys: Vec<KeyType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub key: KeyType,
    pub noreply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchRequest {
    pub key: KeyType,
    pub exptime: i64,
    pub noreply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRequest {
    pub key: KeyType,
    pub delta: u64,
    pub noreply: bool,
}

pub type IncrementRequest = DeltaRequest;
pub type DecrementRequest = DeltaRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbosityRequest {
    /// `None` when the level is missing or not a number
    pub level: Option<u8>,
    pub noreply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushRequest {
    pub noreply: bool,
}

/// Request rejected while framing or parsing the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRequest {
    pub command: String,
    pub error: CacheError,
    pub noreply: bool,
}

/// One value block of a get/gets response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueResponse {
    pub key: KeyType,
    pub flags: u32,
    pub cas: u64,
    pub value: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsResponse {
    pub stats: Vec<(&'static str, String)>,
}

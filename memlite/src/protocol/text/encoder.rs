use crate::cache::error::CacheError;
use crate::protocol::text::network::{StatsResponse, ValueResponse, CRLF};
use bytes::{BufMut, Bytes, BytesMut};

/// Server response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextResponse {
    Stored,
    NotStored,
    Exists,
    NotFound,
    Deleted,
    Touched,
    Ok,
    /// generic error line
    Error,
    Version(String),
    Stats(StatsResponse),
    /// get, misses are omitted
    Values(Vec<ValueResponse>),
    /// gets, cas appended to each value line
    ValuesWithCas(Vec<ValueResponse>),
    Number(u64),
    Failure(CacheError),
}

pub struct ResponseMessage {
    pub(crate) data: Bytes,
}

impl ResponseMessage {
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

pub struct MemcacheTextEncoder {}

impl Default for MemcacheTextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemcacheTextEncoder {
    pub fn new() -> MemcacheTextEncoder {
        MemcacheTextEncoder {}
    }

    /// Encodes a response into the bytes sent on the wire
    pub fn encode_message(&self, msg: &TextResponse) -> ResponseMessage {
        let mut dst = BytesMut::with_capacity(self.get_length(msg));
        match msg {
            TextResponse::Stored => dst.put_slice(b"STORED\r\n"),
            TextResponse::NotStored => dst.put_slice(b"NOT_STORED\r\n"),
            TextResponse::Exists => dst.put_slice(b"EXISTS\r\n"),
            TextResponse::NotFound => dst.put_slice(b"NOT_FOUND\r\n"),
            TextResponse::Deleted => dst.put_slice(b"DELETED\r\n"),
            TextResponse::Touched => dst.put_slice(b"TOUCHED\r\n"),
            TextResponse::Ok => dst.put_slice(b"OK\r\n"),
            TextResponse::Error => dst.put_slice(b"ERROR\r\n"),
            TextResponse::Version(version) => {
                dst.put_slice(b"VERSION ");
                dst.put_slice(version.as_bytes());
                dst.put_slice(CRLF);
            }
            TextResponse::Stats(response) => {
                for (name, value) in response.stats.iter() {
                    dst.put_slice(format!("STAT {} {}\r\n", name, value).as_bytes());
                }
                dst.put_slice(b"END\r\n");
            }
            TextResponse::Values(values) => self.encode_values(values, false, &mut dst),
            TextResponse::ValuesWithCas(values) => self.encode_values(values, true, &mut dst),
            TextResponse::Number(value) => {
                dst.put_slice(value.to_string().as_bytes());
                dst.put_slice(CRLF);
            }
            TextResponse::Failure(err) => {
                dst.put_slice(err.to_string().as_bytes());
                dst.put_slice(CRLF);
            }
        }
        ResponseMessage { data: dst.freeze() }
    }

    fn encode_values(&self, values: &[ValueResponse], with_cas: bool, dst: &mut BytesMut) {
        for value in values {
            dst.put_slice(b"VALUE ");
            dst.put_slice(&value.key);
            if with_cas {
                dst.put_slice(
                    format!(" {} {} {}\r\n", value.flags, value.value.len(), value.cas).as_bytes(),
                );
            } else {
                dst.put_slice(format!(" {} {}\r\n", value.flags, value.value.len()).as_bytes());
            }
            dst.put_slice(&value.value);
            dst.put_slice(CRLF);
        }
        dst.put_slice(b"END\r\n");
    }

    // capacity hint, exact for value blocks which dominate the size
    fn get_length(&self, msg: &TextResponse) -> usize {
        const LINE_OVERHEAD: usize = 64;
        match msg {
            TextResponse::Values(values) | TextResponse::ValuesWithCas(values) => values
                .iter()
                .map(|value| value.key.len() + value.value.len() + LINE_OVERHEAD)
                .sum::<usize>()
                + LINE_OVERHEAD,
            TextResponse::Stats(response) => response.stats.len() * LINE_OVERHEAD,
            _ => LINE_OVERHEAD,
        }
    }
}

use crate::cache::cache::KeyType;
use crate::cache::error::CacheError;
use crate::protocol::text::network::{
    self, AppendRequest, CasRequest, DeleteRequest, DeltaRequest, FlushRequest, GetRequest,
    MalformedRequest, SetRequest, StorageCommand, StorageHeader, TouchRequest, VerbosityRequest,
    CRLF, END_OF_TRANSMISSION, MAX_KEY_LENGTH, NOREPLY,
};
use bytes::{Buf, Bytes, BytesMut};
use std::cmp;
use std::io;
use std::io::{Error, ErrorKind};
use std::str::FromStr;
use tokio_util::codec::Decoder;

/// Longest command line accepted without a terminator
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRequest {
    Version,
    Stats,
    FlushAll(FlushRequest),
    Verbosity(VerbosityRequest),
    Delete(DeleteRequest),
    Set(SetRequest),
    Add(network::AddRequest),
    Replace(network::ReplaceRequest),
    Cas(CasRequest),
    Append(AppendRequest),
    Prepend(network::PrependRequest),
    Touch(TouchRequest),
    Get(GetRequest),
    Gets(GetRequest),
    Increment(network::IncrementRequest),
    Decrement(network::DecrementRequest),
    Quit,
    EndOfTransmission,
    /// any input while the server sheds load
    FastReject,
    Malformed(MalformedRequest),
    Unknown(String),
}

impl TextRequest {
    /// True if the client asked for the response to be suppressed
    pub fn is_noreply(&self) -> bool {
        match self {
            TextRequest::FlushAll(FlushRequest { noreply })
            | TextRequest::Verbosity(VerbosityRequest { noreply, .. })
            | TextRequest::Delete(DeleteRequest { noreply, .. })
            | TextRequest::Set(SetRequest { noreply, .. })
            | TextRequest::Add(SetRequest { noreply, .. })
            | TextRequest::Replace(SetRequest { noreply, .. })
            | TextRequest::Append(AppendRequest { noreply, .. })
            | TextRequest::Prepend(AppendRequest { noreply, .. })
            | TextRequest::Touch(TouchRequest { noreply, .. })
            | TextRequest::Increment(DeltaRequest { noreply, .. })
            | TextRequest::Decrement(DeltaRequest { noreply, .. })
            | TextRequest::Malformed(MalformedRequest { noreply, .. }) => *noreply,
            TextRequest::Cas(request) => request.request.noreply,
            TextRequest::Version
            | TextRequest::Stats
            | TextRequest::Get(_)
            | TextRequest::Gets(_)
            | TextRequest::Quit
            | TextRequest::EndOfTransmission
            | TextRequest::FastReject
            | TextRequest::Unknown(_) => false,
        }
    }

    /// True if the connection has to be closed after this request
    pub fn closes_connection(&self) -> bool {
        matches!(self, TextRequest::Quit | TextRequest::EndOfTransmission)
    }
}

impl StorageHeader {
    fn into_request(self, value: Option<Bytes>) -> TextRequest {
        let set_request = |value: Option<Bytes>| SetRequest {
            key: self.key.clone(),
            flags: self.flags,
            exptime: self.exptime,
            value: value.unwrap_or_default(),
            noreply: self.noreply,
        };
        match self.command {
            StorageCommand::Set => TextRequest::Set(set_request(value)),
            StorageCommand::Add => TextRequest::Add(set_request(value)),
            StorageCommand::Replace => TextRequest::Replace(set_request(value)),
            StorageCommand::Cas => TextRequest::Cas(CasRequest {
                request: set_request(value),
                cas_unique: self.cas_unique,
            }),
            StorageCommand::Append => TextRequest::Append(AppendRequest {
                key: self.key.clone(),
                value,
                noreply: self.noreply,
            }),
            StorageCommand::Prepend => TextRequest::Prepend(AppendRequest {
                key: self.key.clone(),
                value,
                noreply: self.noreply,
            }),
        }
    }

    fn malformed(&self, error: CacheError) -> TextRequest {
        TextRequest::Malformed(MalformedRequest {
            command: String::from(self.command.as_str()),
            error,
            noreply: self.noreply,
        })
    }
}

enum ParsedLine {
    Request(TextRequest),
    /// data block of `bytes` length follows
    Data(StorageHeader),
    /// append/prepend without byte count, data is the next line
    DataLine(StorageHeader),
    /// rejected storage line, its `bytes` long data block is discarded
    /// before the rejection is reported
    Rejected { request: TextRequest, bytes: usize },
}

#[derive(Debug, PartialEq)]
enum RequestParserState {
    AwaitingLine,
    AwaitingData(StorageHeader),
    AwaitingDataLine(StorageHeader),
    SkippingData {
        request: TextRequest,
        remaining: usize,
    },
}

pub struct MemcacheTextDecoder {
    state: RequestParserState,
    item_size_limit: usize,
    fast: bool,
}

impl MemcacheTextDecoder {
    pub fn new(item_size_limit: u32) -> MemcacheTextDecoder {
        MemcacheTextDecoder {
            state: RequestParserState::AwaitingLine,
            item_size_limit: item_size_limit as usize,
            fast: false,
        }
    }

    /// Every chunk of input is answered with a generic error
    pub fn with_fast_mode(mut self, fast: bool) -> MemcacheTextDecoder {
        self.fast = fast;
        self
    }

    pub fn is_awaiting_line(&self) -> bool {
        self.state == RequestParserState::AwaitingLine
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Result<Option<ParsedLine>, io::Error> {
        if src.first() == Some(&END_OF_TRANSMISSION) {
            src.clear();
            return Ok(Some(ParsedLine::Request(TextRequest::EndOfTransmission)));
        }

        if self.fast {
            if src.is_empty() {
                return Ok(None);
            }
            src.clear();
            return Ok(Some(ParsedLine::Request(TextRequest::FastReject)));
        }

        Ok(split_line(src)?.map(|line| parse_line(&line)))
    }
}

impl Decoder for MemcacheTextDecoder {
    type Item = TextRequest;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let state = std::mem::replace(&mut self.state, RequestParserState::AwaitingLine);
            match state {
                RequestParserState::AwaitingLine => match self.decode_line(src)? {
                    None => return Ok(None),
                    Some(ParsedLine::Request(request)) => return Ok(Some(request)),
                    Some(ParsedLine::Data(header)) => {
                        if header.bytes > self.item_size_limit {
                            debug!(
                                "Item too large: {} bytes, limit: {}",
                                header.bytes, self.item_size_limit
                            );
                            let remaining = header.bytes.saturating_add(CRLF.len());
                            let request = header.malformed(CacheError::ServerError(
                                String::from(CacheError::OBJECT_TOO_LARGE),
                            ));
                            self.state = RequestParserState::SkippingData { request, remaining };
                        } else {
                            self.state = RequestParserState::AwaitingData(header);
                        }
                    }
                    Some(ParsedLine::DataLine(header)) => {
                        // nothing sent after the command line means no data
                        if src.is_empty() {
                            return Ok(Some(header.into_request(None)));
                        }
                        self.state = RequestParserState::AwaitingDataLine(header);
                    }
                    Some(ParsedLine::Rejected { request, bytes }) => {
                        let remaining = bytes.saturating_add(CRLF.len());
                        self.state = RequestParserState::SkippingData { request, remaining };
                    }
                },
                RequestParserState::AwaitingData(header) => {
                    let frame_length = header.bytes + CRLF.len();
                    if src.len() < frame_length {
                        src.reserve(frame_length - src.len());
                        self.state = RequestParserState::AwaitingData(header);
                        return Ok(None);
                    }
                    let value = src.split_to(header.bytes).freeze();
                    let terminator = src.split_to(CRLF.len());
                    if &terminator[..] != CRLF {
                        return Ok(Some(header.malformed(CacheError::ClientError(
                            String::from(CacheError::BAD_DATA_CHUNK),
                        ))));
                    }
                    return Ok(Some(header.into_request(Some(value))));
                }
                RequestParserState::AwaitingDataLine(header) => match split_line(src)? {
                    Some(line) => return Ok(Some(header.into_request(Some(line)))),
                    None => {
                        self.state = RequestParserState::AwaitingDataLine(header);
                        return Ok(None);
                    }
                },
                RequestParserState::SkippingData { request, remaining } => {
                    let skip = cmp::min(remaining, src.len());
                    src.advance(skip);
                    let remaining = remaining - skip;
                    if remaining > 0 {
                        self.state = RequestParserState::SkippingData { request, remaining };
                        return Ok(None);
                    }
                    return Ok(Some(request));
                }
            }
        }
    }
}

/// Splits the next `\n` terminated line off `src`, without its terminator
fn split_line(src: &mut BytesMut) -> Result<Option<Bytes>, io::Error> {
    match src.iter().position(|byte| *byte == b'\n') {
        Some(position) => {
            let mut line = src.split_to(position + 1);
            line.truncate(position);
            if line.last() == Some(&b'\r') {
                line.truncate(position - 1);
            }
            Ok(Some(line.freeze()))
        }
        None => {
            if src.len() > MAX_LINE_LENGTH {
                error!("Command line longer than {} bytes", MAX_LINE_LENGTH);
                return Err(Error::new(ErrorKind::InvalidData, "Command line too long"));
            }
            Ok(None)
        }
    }
}

fn parse_line(line: &[u8]) -> ParsedLine {
    let tokens: Vec<&[u8]> = line
        .split(|byte| byte.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .collect();
    let Some((command, args)) = tokens.split_first() else {
        return ParsedLine::Request(TextRequest::Unknown(String::new()));
    };

    let request = match *command {
        b"get" => parse_get(args).map(TextRequest::Get),
        b"gets" => parse_get(args).map(TextRequest::Gets),
        b"set" => return parse_storage(StorageCommand::Set, args),
        b"add" => return parse_storage(StorageCommand::Add, args),
        b"replace" => return parse_storage(StorageCommand::Replace, args),
        b"cas" => return parse_storage(StorageCommand::Cas, args),
        b"append" => return parse_append(StorageCommand::Append, args),
        b"prepend" => return parse_append(StorageCommand::Prepend, args),
        b"delete" => parse_delete(args),
        b"touch" => parse_touch(args),
        b"incr" => parse_delta(args).map(TextRequest::Increment),
        b"decr" => parse_delta(args).map(TextRequest::Decrement),
        b"verbosity" => {
            let (args, noreply) = split_noreply(args);
            Ok(TextRequest::Verbosity(VerbosityRequest {
                level: args.first().and_then(|level| parse_number::<u8>(level)),
                noreply,
            }))
        }
        b"flush_all" => {
            let (_delay, noreply) = split_noreply(args);
            Ok(TextRequest::FlushAll(FlushRequest { noreply }))
        }
        b"version" => Ok(TextRequest::Version),
        b"stats" => Ok(TextRequest::Stats),
        b"quit" => Ok(TextRequest::Quit),
        other => Ok(TextRequest::Unknown(
            String::from_utf8_lossy(other).into_owned(),
        )),
    };

    ParsedLine::Request(request.unwrap_or_else(|error| {
        let (_args, noreply) = split_noreply(args);
        TextRequest::Malformed(MalformedRequest {
            command: String::from_utf8_lossy(command).into_owned(),
            error,
            noreply,
        })
    }))
}

fn split_noreply<'a, 'b>(args: &'a [&'b [u8]]) -> (&'a [&'b [u8]], bool) {
    match args.split_last() {
        Some((last, rest)) if *last == NOREPLY => (rest, true),
        _ => (args, false),
    }
}

fn parse_number<T: FromStr>(token: &[u8]) -> Option<T> {
    std::str::from_utf8(token).ok()?.parse::<T>().ok()
}

fn parse_key(token: &[u8]) -> Result<KeyType, CacheError> {
    if token.len() > MAX_KEY_LENGTH {
        return Err(CacheError::bad_command_line());
    }
    Ok(Bytes::copy_from_slice(token))
}

fn parse_get(args: &[&[u8]]) -> Result<GetRequest, CacheError> {
    let keys = args
        .iter()
        .map(|key| parse_key(key))
        .collect::<Result<Vec<KeyType>, CacheError>>()?;
    Ok(GetRequest { keys })
}

/// Rejects a storage line. When its byte count is readable the data
/// block that follows is consumed too, so it never runs as a command.
fn reject_storage(command: StorageCommand, args: &[&[u8]], noreply: bool) -> ParsedLine {
    let request = TextRequest::Malformed(MalformedRequest {
        command: String::from(command.as_str()),
        error: CacheError::bad_command_line(),
        noreply,
    });
    match args.get(3).and_then(|bytes| parse_number::<usize>(bytes)) {
        Some(bytes) => ParsedLine::Rejected { request, bytes },
        None => ParsedLine::Request(request),
    }
}

fn parse_storage(command: StorageCommand, args: &[&[u8]]) -> ParsedLine {
    let (args, noreply) = split_noreply(args);
    let malformed = || reject_storage(command, args, noreply);

    let expected_args = if command == StorageCommand::Cas { 5 } else { 4 };
    if args.len() != expected_args {
        return malformed();
    }
    let Ok(key) = parse_key(args[0]) else {
        return malformed();
    };
    let (Some(flags), Some(exptime), Some(bytes)) = (
        parse_number::<u32>(args[1]),
        parse_number::<i64>(args[2]),
        parse_number::<usize>(args[3]),
    ) else {
        return malformed();
    };
    let cas_unique = match command {
        StorageCommand::Cas => match parse_number::<u64>(args[4]) {
            Some(cas_unique) => cas_unique,
            None => return malformed(),
        },
        _ => 0,
    };

    ParsedLine::Data(StorageHeader {
        command,
        key,
        flags,
        exptime,
        bytes,
        cas_unique,
        noreply,
    })
}

// append|prepend <key> <flags> <exptime> <bytes> [noreply]
// append|prepend <key> [noreply], data is the following line
fn parse_append(command: StorageCommand, args: &[&[u8]]) -> ParsedLine {
    let (args, noreply) = split_noreply(args);
    let malformed = || reject_storage(command, args, noreply);

    let key = match args.first().map(|key| parse_key(key)) {
        Some(Ok(key)) => key,
        _ => return malformed(),
    };
    let mut header = StorageHeader {
        command,
        key,
        flags: 0,
        exptime: 0,
        bytes: 0,
        cas_unique: 0,
        noreply,
    };
    match args.len() {
        1 => ParsedLine::DataLine(header),
        4 => match parse_number::<usize>(args[3]) {
            Some(bytes) => {
                header.bytes = bytes;
                ParsedLine::Data(header)
            }
            None => malformed(),
        },
        _ => malformed(),
    }
}

fn parse_delete(args: &[&[u8]]) -> Result<TextRequest, CacheError> {
    let (args, noreply) = split_noreply(args);
    // an empty key is rejected by the store
    let key = match args.first() {
        Some(key) => parse_key(key)?,
        None => KeyType::new(),
    };
    Ok(TextRequest::Delete(DeleteRequest { key, noreply }))
}

fn parse_touch(args: &[&[u8]]) -> Result<TextRequest, CacheError> {
    let (args, noreply) = split_noreply(args);
    let key = args
        .first()
        .ok_or_else(CacheError::bad_command_line)
        .and_then(|key| parse_key(key))?;
    let exptime = args
        .get(1)
        .and_then(|exptime| parse_number::<i64>(exptime))
        .ok_or_else(CacheError::invalid_integer)?;
    Ok(TextRequest::Touch(TouchRequest {
        key,
        exptime,
        noreply,
    }))
}

fn parse_delta(args: &[&[u8]]) -> Result<DeltaRequest, CacheError> {
    let (args, noreply) = split_noreply(args);
    let key = args
        .first()
        .ok_or_else(CacheError::bad_command_line)
        .and_then(|key| parse_key(key))?;
    let delta = args
        .get(1)
        .and_then(|delta| parse_number::<u64>(delta))
        .ok_or_else(CacheError::invalid_integer)?;
    Ok(DeltaRequest {
        key,
        delta,
        noreply,
    })
}

#[cfg(test)]
mod text_decoder_tests;

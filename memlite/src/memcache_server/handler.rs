use crate::cache::error::{CacheError, Result};
use crate::memcache::store::{self, SetStatus};
use crate::memcache_server::server_stats::ServerStats;
use crate::protocol::text::decoder::TextRequest;
use crate::protocol::text::encoder::TextResponse;
use crate::protocol::text::network;
use crate::version::MEMLITE_VERSION;
use bytes::Bytes;
use log::LevelFilter;
use std::sync::Arc;

fn display_key(key: &Bytes) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(key)
}

fn into_set_response(result: Result<SetStatus>) -> TextResponse {
    match result {
        Ok(SetStatus::Stored) => TextResponse::Stored,
        Ok(SetStatus::NotStored) => TextResponse::NotStored,
        Ok(SetStatus::Exists) => TextResponse::Exists,
        Ok(SetStatus::NotFound) => TextResponse::NotFound,
        Err(err) => TextResponse::Failure(err),
    }
}

/// Maps the `verbosity` protocol level onto the log threshold
fn verbosity_to_level(level: u8) -> Option<LevelFilter> {
    match level {
        0 => Some(LevelFilter::Off),
        1 => Some(LevelFilter::Debug),
        2 => Some(LevelFilter::Info),
        3 => Some(LevelFilter::Warn),
        4 => Some(LevelFilter::Error),
        _ => None,
    }
}

/// Executes parsed requests against the store
pub struct TextHandler {
    storage: Arc<store::MemcStore>,
    stats: Arc<ServerStats>,
}

impl TextHandler {
    pub fn new(store: Arc<store::MemcStore>, stats: Arc<ServerStats>) -> TextHandler {
        TextHandler {
            storage: store,
            stats,
        }
    }

    /// Returns `None` when the request asked for `noreply` or the
    /// connection is about to be closed
    pub fn handle_request(&self, req: TextRequest) -> Option<TextResponse> {
        let noreply = req.is_noreply();
        let response = self.dispatch(req)?;
        if noreply {
            return None;
        }
        Some(response)
    }

    fn dispatch(&self, req: TextRequest) -> Option<TextResponse> {
        let response = match req {
            TextRequest::Version => {
                debug!("version");
                TextResponse::Version(String::from(MEMLITE_VERSION))
            }
            TextRequest::Stats => {
                debug!("stats");
                TextResponse::Stats(self.stats.snapshot(&self.storage))
            }
            TextRequest::FlushAll(_request) => {
                debug!("flush_all");
                match self.storage.flush() {
                    Ok(()) => TextResponse::Ok,
                    Err(err) => TextResponse::Failure(err),
                }
            }
            TextRequest::Verbosity(request) => self.verbosity(request),
            TextRequest::Delete(request) => self.delete(request),
            TextRequest::Set(request) => self.set(request),
            TextRequest::Add(request) => self.add_replace(request, true),
            TextRequest::Replace(request) => self.add_replace(request, false),
            TextRequest::Cas(request) => self.cas(request),
            TextRequest::Append(request) => self.append_prepend(request, false),
            TextRequest::Prepend(request) => self.append_prepend(request, true),
            TextRequest::Touch(request) => self.touch(request),
            TextRequest::Get(request) => TextResponse::Values(self.get(request, "get")),
            TextRequest::Gets(request) => TextResponse::ValuesWithCas(self.get(request, "gets")),
            TextRequest::Increment(request) => self.delta(request, true),
            TextRequest::Decrement(request) => self.delta(request, false),
            TextRequest::Quit | TextRequest::EndOfTransmission => {
                debug!("quit");
                return None;
            }
            TextRequest::FastReject => TextResponse::Error,
            TextRequest::Malformed(request) => {
                debug!("{}: {}", request.command, request.error);
                TextResponse::Failure(request.error)
            }
            TextRequest::Unknown(command) => {
                debug!("unknown command: {}", command);
                TextResponse::Failure(CacheError::unknown_command(&command))
            }
        };
        Some(response)
    }

    fn verbosity(&self, request: network::VerbosityRequest) -> TextResponse {
        debug!("verbosity: {:?}", request.level);
        if let Some(level) = request.level.and_then(verbosity_to_level) {
            log::set_max_level(level);
        }
        TextResponse::Ok
    }

    fn delete(&self, request: network::DeleteRequest) -> TextResponse {
        debug!("delete: {}", display_key(&request.key));
        match self.storage.delete(&request.key) {
            Ok(true) => TextResponse::Deleted,
            Ok(false) => TextResponse::NotFound,
            Err(err) => TextResponse::Failure(err),
        }
    }

    fn set(&self, request: network::SetRequest) -> TextResponse {
        debug!("set: {}", display_key(&request.key));
        let record = self
            .storage
            .create_record(request.value, request.exptime, request.flags);
        match self.storage.set(request.key, record) {
            Ok(()) => TextResponse::Stored,
            Err(err) => TextResponse::Failure(err),
        }
    }

    fn add_replace(&self, request: network::SetRequest, add: bool) -> TextResponse {
        let record = self
            .storage
            .create_record(request.value, request.exptime, request.flags);
        let result = if add {
            debug!("add: {}", display_key(&request.key));
            self.storage.add(request.key, record)
        } else {
            debug!("replace: {}", display_key(&request.key));
            self.storage.replace(request.key, record)
        };
        into_set_response(result)
    }

    fn cas(&self, request: network::CasRequest) -> TextResponse {
        let network::CasRequest {
            request,
            cas_unique,
        } = request;
        debug!("cas: {} {}", display_key(&request.key), cas_unique);
        let record = self
            .storage
            .create_record(request.value, request.exptime, request.flags);
        into_set_response(self.storage.cas(request.key, record, cas_unique))
    }

    fn append_prepend(&self, request: network::AppendRequest, prepend: bool) -> TextResponse {
        let command = if prepend { "prepend" } else { "append" };
        debug!("{}: {}", command, display_key(&request.key));
        let Some(data) = request.value else {
            return match self.storage.get(&request.key) {
                Ok(Some(_record)) => TextResponse::Failure(CacheError::bad_command_line()),
                Ok(None) => TextResponse::NotFound,
                Err(err) => TextResponse::Failure(err),
            };
        };
        let result = if prepend {
            self.storage.prepend(request.key, data)
        } else {
            self.storage.append(request.key, data)
        };
        into_set_response(result)
    }

    fn touch(&self, request: network::TouchRequest) -> TextResponse {
        debug!("touch: {}", display_key(&request.key));
        match self.storage.touch(request.key, request.exptime) {
            Ok(true) => TextResponse::Touched,
            Ok(false) => TextResponse::NotFound,
            Err(err) => TextResponse::Failure(err),
        }
    }

    fn get(&self, request: network::GetRequest, command: &str) -> Vec<network::ValueResponse> {
        let mut values = Vec::with_capacity(request.keys.len());
        for key in request.keys {
            debug!("{}: {}", command, display_key(&key));
            match self.storage.get(&key) {
                Ok(Some(record)) => values.push(network::ValueResponse {
                    flags: record.flags(),
                    cas: record.cas(),
                    value: record.value().clone(),
                    key,
                }),
                Ok(None) => {}
                Err(err) => error!("{}: {} failed: {}", command, display_key(&key), err),
            }
        }
        values
    }

    fn delta(&self, request: network::DeltaRequest, increment: bool) -> TextResponse {
        let result = if increment {
            debug!("incr: {}", display_key(&request.key));
            self.storage.increment(request.key, request.delta)
        } else {
            debug!("decr: {}", display_key(&request.key));
            self.storage.decrement(request.key, request.delta)
        };
        match result {
            Ok(Some(value)) => TextResponse::Number(value),
            Ok(None) => TextResponse::NotFound,
            Err(err) => TextResponse::Failure(err),
        }
    }
}

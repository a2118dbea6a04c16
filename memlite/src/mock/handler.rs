use crate::memcache_server::handler::TextHandler;
use crate::memcache_server::server_stats::ServerStats;
use crate::memory_store::in_memory_store::InMemoryStoreConfig;
use crate::protocol::text::decoder::{MemcacheTextDecoder, TextRequest};
use crate::protocol::text::encoder::{MemcacheTextEncoder, TextResponse};
use bytes::BytesMut;
use std::sync::Arc;
use tokio_util::codec::Decoder;

use super::mock_server::{create_server, MockServer};

const ITEM_SIZE_LIMIT: u32 = 1024 * 1024;

pub struct TextHandlerWithMocks {
    pub handler: TextHandler,
    pub server: MockServer,
    pub stats: Arc<ServerStats>,
}

impl TextHandlerWithMocks {
    pub fn handle_request(&self, req: TextRequest) -> Option<TextResponse> {
        self.handler.handle_request(req)
    }

    /// Decodes every request in `input`, dispatches it like a connection
    /// would and returns the bytes written back as a string
    pub fn wire(&self, input: &str) -> String {
        let mut decoder = MemcacheTextDecoder::new(ITEM_SIZE_LIMIT);
        let encoder = MemcacheTextEncoder::new();
        let mut buffer = BytesMut::from(input);
        let mut output = Vec::new();
        while let Some(request) = decoder.decode(&mut buffer).unwrap() {
            let response = self.handler.handle_request(request);
            self.server.storage.run_pending_tasks();
            if let Some(response) = response {
                output.extend_from_slice(encoder.encode_message(&response).data());
            }
        }
        String::from_utf8(output).unwrap()
    }
}

pub fn create_handler_with_config(config: InMemoryStoreConfig) -> TextHandlerWithMocks {
    let server = create_server(config);
    let stats = Arc::new(ServerStats::new(
        server.timer.clone(),
        server.memory.clone(),
        config.max_size_mb(),
        config.evictions_enabled(),
    ));
    TextHandlerWithMocks {
        handler: TextHandler::new(server.storage.clone(), stats.clone()),
        server,
        stats,
    }
}

pub fn create_handler() -> TextHandlerWithMocks {
    create_handler_with_config(InMemoryStoreConfig::default())
}

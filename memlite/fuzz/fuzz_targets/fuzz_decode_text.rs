#![no_main]
use libfuzzer_sys::fuzz_target;
extern crate memlite;
use bytes::{BufMut, BytesMut};
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let mut codec = memlite::protocol::text::decoder::MemcacheTextDecoder::new(1024);
    let mut src = BytesMut::with_capacity(data.len());
    src.put(data);
    while let Ok(Some(_request)) = codec.decode(&mut src) {}
});

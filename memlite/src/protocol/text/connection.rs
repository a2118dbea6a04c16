use crate::protocol::text::decoder::{MemcacheTextDecoder, TextRequest};
use crate::protocol::text::encoder::{MemcacheTextEncoder, ResponseMessage, TextResponse};
use bytes::BytesMut;
use std::io;
use std::io::{Error, ErrorKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Decoder;

const INITIAL_BUFFER_SIZE: usize = 4 * 1024;

pub struct MemcacheTextConnection {
    stream: TcpStream,
    decoder: MemcacheTextDecoder,
    encoder: MemcacheTextEncoder,
    buffer: BytesMut,
}

impl MemcacheTextConnection {
    pub fn new(socket: TcpStream, decoder: MemcacheTextDecoder) -> Self {
        MemcacheTextConnection {
            stream: socket,
            decoder,
            encoder: MemcacheTextEncoder::new(),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
        }
    }

    /// Returns the next request, `None` on a clean end of stream
    pub async fn read_frame(&mut self) -> Result<Option<TextRequest>, io::Error> {
        loop {
            // Attempt to parse a frame from the buffered data. If enough data
            // has been buffered, the frame is returned.
            if let Some(frame) = self.decoder.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            // There is not enough buffered data to read a frame. Attempt to
            // read more data from the socket.
            //
            // On success, the number of bytes is returned. `0` indicates "end
            // of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // The remote closed the connection. For this to be a clean
                // shutdown, there should be no data in the read buffer and
                // no data block pending.
                if self.buffer.is_empty() && self.decoder.is_awaiting_line() {
                    return Ok(None);
                } else {
                    return Err(Error::new(
                        ErrorKind::ConnectionReset,
                        "Connection reset by peer",
                    ));
                }
            }
        }
    }

    pub async fn write(&mut self, msg: &TextResponse) -> io::Result<()> {
        let message = self.encoder.encode_message(msg);
        self.write_data_to_stream(message).await?;
        Ok(())
    }

    async fn write_data_to_stream(&mut self, msg: ResponseMessage) -> io::Result<()> {
        self.stream.write_all(&msg.data[..]).await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::id::Id;
use crate::message::Message;
use crate::uri::ActorUri;

#[cfg(test)]
#[path = "./net.test.rs"]
mod tests;

/// Protocol version for wire format
pub const CURRENT_PROTOCOL_VERSION: u16 = 1;

/// A host/port pair as configured, before any name resolution.
///
/// Resolution is deferred: building a `NetAddr` never touches the network,
/// and an unresolvable host only surfaces when something tries to bind or
/// dial it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetAddr {
    pub host: String,
    pub port: u16,
}

impl NetAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolve to the first socket address for this host/port pair.
    pub async fn lookup(&self) -> std::io::Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no addresses found for {}", self),
                )
            })
    }
}

impl FromStr for NetAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((host, port_str)) = s.rsplit_once(':') {
            if let Ok(port) = port_str.parse::<u16>() {
                if !host.is_empty() {
                    return Ok(NetAddr::new(host, port));
                }
            }
        }
        Err(format!("failed to parse '{}' as host:port", s))
    }
}

impl std::fmt::Display for NetAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error types for wire format operations
#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] bincode::error::DecodeError),

    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    ProtocolVersionMismatch { expected: u16, actual: u16 },

    #[error("Stream error: {0}")]
    StreamError(#[from] std::io::Error),
}

/// Frame header with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    /// Instance id of the sending system
    pub origin: Id,
    /// Timestamp in UTC milliseconds
    pub timestamp: u64,
    /// Protocol version for future compatibility
    pub protocol_version: u16,
}

impl Header {
    pub fn new(origin: Id) -> Self {
        Header {
            origin,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            protocol_version: CURRENT_PROTOCOL_VERSION,
        }
    }
}

/// Top-level frame that gets encoded/decoded from the wire.
///
/// `from` carries the sender identity end to end: the receiving system
/// rebuilds a sender ref from it, which is what keeps replies and forwards
/// addressed to the original sender rather than to whichever system relayed
/// the frame. `None` means the message was sent without a sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub header: Header,
    pub to: ActorUri,
    pub from: Option<ActorUri>,
    pub msg: Message,
}

impl Frame {
    pub fn new(origin: Id, to: ActorUri, from: Option<ActorUri>, msg: Message) -> Self {
        Frame {
            header: Header::new(origin),
            to,
            from,
            msg,
        }
    }

    /// Encode the frame to bytes with a u64 big-endian length prefix.
    pub fn encode(&self) -> Result<Bytes, WireError> {
        let config = bincode::config::standard();
        let mut buffer = BytesMut::new().writer();

        let _ = bincode::serde::encode_into_std_write(self, &mut buffer, config)?;

        let buffer = buffer.into_inner();
        let length = buffer.len() as u64;

        let mut final_buffer = BytesMut::with_capacity(8 + buffer.len());

        // Length in network byte order (big-endian)
        final_buffer.put_u64(length);
        final_buffer.extend_from_slice(&buffer);

        Ok(final_buffer.freeze())
    }

    /// Decode a frame from bytes (without the length prefix).
    pub fn decode(bytes: Bytes) -> Result<Self, WireError> {
        let config = bincode::config::standard();

        let frame: Frame = match bincode::serde::decode_from_slice(&bytes, config) {
            Ok((frame, _)) => frame,
            Err(err) => return Err(WireError::DeserializationError(err)),
        };

        if frame.header.protocol_version != CURRENT_PROTOCOL_VERSION {
            return Err(WireError::ProtocolVersionMismatch {
                expected: CURRENT_PROTOCOL_VERSION,
                actual: frame.header.protocol_version,
            });
        }

        Ok(frame)
    }
}

/// Incremental frame parser for processing incoming data
pub struct FrameParser {
    state: ReaderState,
    buffer: BytesMut,
}

enum ReaderState {
    ReadingLength,
    ReadingData(usize),
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        FrameParser {
            state: ReaderState::ReadingLength,
            buffer: BytesMut::new(),
        }
    }

    /// Add data to the parser buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to parse a complete frame from the buffer
    pub fn parse(&mut self) -> Result<Option<Frame>, WireError> {
        loop {
            match &self.state {
                ReaderState::ReadingLength => {
                    // Need at least 8 bytes for the length
                    if self.buffer.len() < 8 {
                        return Ok(None);
                    }

                    let length = (&self.buffer[0..8]).get_u64() as usize;
                    self.buffer.advance(8);

                    self.state = ReaderState::ReadingData(length);
                }

                ReaderState::ReadingData(length) => {
                    if self.buffer.len() < *length {
                        return Ok(None);
                    }

                    let frame_data = self.buffer.split_to(*length).freeze();

                    // Reset state to read the next frame length
                    self.state = ReaderState::ReadingLength;

                    return Ok(Some(Frame::decode(frame_data)?));
                }
            }
        }
    }

    /// Try to parse all complete frames currently buffered
    pub fn parse_all(&mut self) -> Result<Vec<Frame>, WireError> {
        let mut frames = Vec::new();

        while let Some(frame) = self.parse()? {
            frames.push(frame);
        }

        Ok(frames)
    }
}

/// A stream for reading length-prefixed frames
pub struct FrameReader<R> {
    inner: R,
    parser: FrameParser,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Send + Unpin,
{
    pub fn new(stream: R) -> Self {
        FrameReader {
            inner: stream,
            parser: FrameParser::new(),
        }
    }

    /// Read the next frame from the stream. `None` means a clean end of
    /// stream on a frame boundary.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, WireError> {
        if let Some(frame) = self.parser.parse()? {
            return Ok(Some(frame));
        }

        let mut buffer = [0u8; 1024];
        loop {
            match self.inner.read(&mut buffer).await {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    self.parser.extend(&buffer[..n]);

                    if let Some(frame) = self.parser.parse()? {
                        return Ok(Some(frame));
                    }
                }
                Err(e) => return Err(WireError::StreamError(e)),
            }
        }
    }
}

/// A stream for writing length-prefixed frames
pub struct FrameWriter<W> {
    inner: W,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(stream: W) -> Self {
        FrameWriter { inner: stream }
    }

    /// Write a frame to the stream and flush it
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), WireError> {
        let encoded = frame.encode()?;
        self.inner.write_all(&encoded).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

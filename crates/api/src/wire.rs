//! The worker to aggregator wire protocol.
//!
//! One submission per connection:
//!
//! ```text
//! worker                          aggregator
//!   | -- [u32 be len][json] ------> |
//!   | -- (write half closed) -----> |
//!   | <----------------------- OK - |
//!   |            (closed)           |
//! ```
//!
//! The length prefix makes the message boundary explicit. The sender
//! still half-closes after writing, which costs nothing and keeps
//! "read until eof" peers working.

use crate::*;
use bytes::{BufMut, Bytes, BytesMut};

/// Length of the frame header (big-endian u32 payload length).
pub const FRAME_HEADER_LEN: usize = 4;

/// Default upper bound on a whole frame, header included. 16MiB.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// The port the aggregator listens on unless told otherwise.
pub const DEFAULT_AGGREGATOR_PORT: u16 = 5000;

/// Where workers look for the aggregator unless told otherwise.
pub const DEFAULT_AGGREGATOR_ADDR: &str = "master:5000";

/// The literal acknowledgment the aggregator sends on success.
pub const ACK: &[u8; 2] = b"OK";

/// Orchestrator-supplied worker label. Only used to key results.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct WorkerId(pub u64);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for WorkerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A worker's finished result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResultMessage {
    /// Which worker produced this result.
    pub worker_id: WorkerId,

    /// Vertex count of the graph the worker relaxed.
    pub graph_size: u64,

    /// Final hop counts, unreachable encoded as `null`.
    pub distances: DistanceVector,
}

impl ResultMessage {
    /// Construct a result, deriving `graph_size` from the vector.
    pub fn new(worker_id: WorkerId, distances: DistanceVector) -> Self {
        Self {
            worker_id,
            graph_size: distances.len() as u64,
            distances,
        }
    }

    /// Encode as json.
    pub fn encode(&self) -> HdResult<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|err| HdError::other_src("encode result message", err))
    }

    /// Decode from json, checking `graph_size` against the vector.
    pub fn decode(slice: &[u8]) -> HdResult<Self> {
        #[derive(serde::Deserialize)]
        struct Raw {
            worker_id: WorkerId,
            graph_size: u64,
            distances: DistanceVector,
        }

        let raw: Raw = serde_json::from_slice(slice)
            .map_err(|err| HdError::other_src("decode result message", err))?;

        if raw.graph_size != raw.distances.len() as u64 {
            return Err(HdError::other(format!(
                "graph_size {} does not match {} distances",
                raw.graph_size,
                raw.distances.len(),
            )));
        }

        Ok(Self {
            worker_id: raw.worker_id,
            graph_size: raw.graph_size,
            distances: raw.distances,
        })
    }
}

/// Prefix `payload` with its length.
///
/// # Errors
///
/// Returns an error if the whole frame would exceed `max_frame_bytes`.
pub fn encode_frame(payload: &[u8], max_frame_bytes: usize) -> HdResult<Bytes> {
    if payload.len().saturating_add(FRAME_HEADER_LEN) > max_frame_bytes
        || payload.len() > u32::MAX as usize
    {
        return Err(HdError::other("frame too large"));
    }
    let mut out = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.put_u32(payload.len() as u32);
    out.put_slice(payload);
    Ok(out.freeze())
}

/// Read exactly one frame and return its payload.
///
/// # Errors
///
/// Returns an error on io failure, if the stream ends before the
/// declared length, or if the declared length exceeds `max_frame_bytes`.
pub fn read_frame<R: std::io::Read>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> HdResult<Bytes> {
    let mut header = [0_u8; FRAME_HEADER_LEN];
    reader
        .read_exact(&mut header)
        .map_err(|err| HdError::other_src("frame shorter than header", err))?;

    let len = u32::from_be_bytes(header) as usize;
    if len.saturating_add(FRAME_HEADER_LEN) > max_frame_bytes {
        return Err(HdError::other(format!(
            "frame too large: {len} byte payload"
        )));
    }

    let mut payload = BytesMut::zeroed(len);
    reader.read_exact(&mut payload).map_err(|err| {
        HdError::other_src("frame shorter than declared length", err)
    })?;

    Ok(payload.freeze())
}

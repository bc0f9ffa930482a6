//! A client for the hopdist aggregator server.

#![deny(missing_docs)]

use hopdist_api::*;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

mod back_off;
pub use back_off::*;

/// Configuration for [blocking_submit].
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Where the aggregator listens, as `host:port`.
    pub aggregator_addr: String,

    /// How many attempts before giving up.
    pub max_attempts: u32,

    /// Attempt `k` (1-based) is preceded by a wait of
    /// `back_off_base * k`.
    pub back_off_base: Duration,

    /// Bound on establishing each connection.
    pub connect_timeout: Duration,

    /// Read and write timeout on an established connection.
    pub io_timeout: Duration,

    /// Refuse to send anything larger than this.
    pub max_frame_bytes: usize,
}

impl DeliveryConfig {
    /// Short waits, for use in tests.
    pub fn testing(aggregator_addr: impl Into<String>) -> Self {
        Self {
            aggregator_addr: aggregator_addr.into(),
            max_attempts: 3,
            back_off_base: Duration::from_millis(10),
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// 3 attempts, 5s/10s/15s back off and 30s timeouts.
    pub fn production(aggregator_addr: impl Into<String>) -> Self {
        Self {
            aggregator_addr: aggregator_addr.into(),
            max_attempts: 3,
            back_off_base: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(30),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// What happened on one delivery attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,

    /// How long we waited before this attempt.
    pub wait: Duration,

    /// Why the attempt failed, `None` if it was acknowledged.
    pub error: Option<HdError>,
}

/// A successful delivery.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    /// The attempt that was acknowledged.
    pub attempt: u32,

    /// Every attempt made, in order.
    pub attempts: Vec<AttemptRecord>,
}

/// Delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The message could not be encoded. Nothing was sent.
    #[error("failed to encode result: {0}")]
    Encode(HdError),

    /// Every attempt failed.
    #[error("delivery failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,

        /// The error of the final attempt.
        last_error: HdError,

        /// Every attempt made, in order.
        log: Vec<AttemptRecord>,
    },
}

/// Deliver `message` to the aggregator, retrying on a linear back off.
///
/// Each attempt opens a fresh connection, sends one frame, and waits
/// for the `OK` acknowledgment. Anything else counts as a failure.
///
/// Note the `blocking_` prefix. This is a hint to the caller that if the function is used in
/// an async context, it should be treated as a blocking operation.
pub fn blocking_submit(
    config: &DeliveryConfig,
    message: &ResultMessage,
) -> Result<DeliveryReport, DeliveryError> {
    let payload = message.encode().map_err(DeliveryError::Encode)?;
    let frame = encode_frame(&payload, config.max_frame_bytes)
        .map_err(DeliveryError::Encode)?;

    let mut log = Vec::with_capacity(config.max_attempts as usize);
    let mut back_off =
        LinearBackOff::new(config.back_off_base, config.max_attempts);

    while let Some(wait) = back_off.next() {
        let attempt = back_off.attempt();

        tracing::debug!(attempt, ?wait, "waiting before delivery attempt");
        std::thread::sleep(wait);

        match try_once(config, &frame) {
            Ok(()) => {
                tracing::info!(
                    attempt,
                    worker_id = %message.worker_id,
                    addr = %config.aggregator_addr,
                    "result delivered",
                );
                log.push(AttemptRecord {
                    attempt,
                    wait,
                    error: None,
                });
                return Ok(DeliveryReport {
                    attempt,
                    attempts: log,
                });
            }
            Err(err) => {
                tracing::warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    ?err,
                    "delivery attempt failed",
                );
                log.push(AttemptRecord {
                    attempt,
                    wait,
                    error: Some(err),
                });
            }
        }
    }

    let last_error = log
        .last()
        .and_then(|r| r.error.clone())
        .unwrap_or_else(|| HdError::other("no delivery attempts configured"));

    Err(DeliveryError::Exhausted {
        attempts: log.len() as u32,
        last_error,
        log,
    })
}

fn try_once(config: &DeliveryConfig, frame: &[u8]) -> HdResult<()> {
    let mut stream = connect(config)?;

    stream
        .set_read_timeout(Some(config.io_timeout))
        .and_then(|_| stream.set_write_timeout(Some(config.io_timeout)))
        .map_err(|err| HdError::other_src("set io timeout", err))?;

    stream
        .write_all(frame)
        .and_then(|_| stream.flush())
        .map_err(|err| HdError::other_src("send result", err))?;

    stream
        .shutdown(std::net::Shutdown::Write)
        .map_err(|err| HdError::other_src("close write half", err))?;

    // one byte past the ack is enough to notice trailing garbage
    let mut ack = Vec::with_capacity(ACK.len() + 1);
    (&mut stream)
        .take(ACK.len() as u64 + 1)
        .read_to_end(&mut ack)
        .map_err(|err| HdError::other_src("read acknowledgment", err))?;

    if ack != ACK {
        return Err(HdError::other(format!(
            "unexpected acknowledgment: {:?}",
            String::from_utf8_lossy(&ack),
        )));
    }

    Ok(())
}

fn connect(config: &DeliveryConfig) -> HdResult<TcpStream> {
    let addrs = config
        .aggregator_addr
        .to_socket_addrs()
        .map_err(|err| HdError::other_src("resolve aggregator address", err))?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.connect_timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                tracing::trace!(%addr, ?err, "connect failed");
                last_err = Some(err);
            }
        }
    }

    Err(match last_err {
        Some(err) => HdError::other_src("connect to aggregator", err),
        None => HdError::other(format!(
            "aggregator address {} resolved to nothing",
            config.aggregator_addr,
        )),
    })
}

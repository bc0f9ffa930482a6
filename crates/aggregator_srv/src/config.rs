//! config types.

/// Configuration for running an AggregatorSrv.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on connections being handled at once.
    ///
    /// Every accepted connection gets its own handler thread, so a
    /// stalled peer only ever holds up itself. Connections accepted
    /// while this many are in flight are closed straight away without
    /// an acknowledgment, and the sender retries.
    ///
    /// Defaults:
    /// - `testing = 64`
    /// - `production = 1024`
    pub max_connections: usize,

    /// How long the accept loop sleeps when no connection is pending
    /// before polling again and checking whether the server is
    /// shutting down.
    ///
    /// Setting this very high will delay accepting new submissions and
    /// slow down shutdown. Setting this very low will increase cpu
    /// overhead.
    ///
    /// Defaults:
    /// - `testing = 10ms`
    /// - `production = 100ms`
    pub request_listen_duration: std::time::Duration,

    /// The address(es) at which to listen.
    ///
    /// Defaults:
    /// - `testing = "[127.0.0.1:0]"`
    /// - `production = "[0.0.0.0:5000]"`
    pub listen_address_list: Vec<std::net::SocketAddr>,

    /// Frames larger than this (header included) are rejected.
    ///
    /// Defaults:
    /// - `testing = 16MiB`
    /// - `production = 16MiB`
    pub max_frame_bytes: usize,

    /// Give up on a connection whose peer stops sending for this long.
    /// `None` waits forever.
    ///
    /// Defaults:
    /// - `testing = Some(5s)`
    /// - `production = Some(60s)`
    pub connection_read_timeout: Option<std::time::Duration>,

    /// The number of distinct worker results the completion monitor
    /// waits for.
    ///
    /// Defaults:
    /// - `testing = 2`
    /// - `production = 2`
    pub target_worker_count: usize,

    /// How often the completion monitor checks the registry.
    ///
    /// Defaults:
    /// - `testing = 10ms`
    /// - `production = 1s`
    pub poll_interval: std::time::Duration,
}

impl Config {
    /// Get an aggregator config suitable for testing.
    pub fn testing() -> Self {
        Self {
            max_connections: 64,
            request_listen_duration: std::time::Duration::from_millis(10),
            listen_address_list: vec![(std::net::Ipv4Addr::LOCALHOST, 0).into()],
            max_frame_bytes: hopdist_api::DEFAULT_MAX_FRAME_BYTES,
            connection_read_timeout: Some(std::time::Duration::from_secs(5)),
            target_worker_count: 2,
            poll_interval: std::time::Duration::from_millis(10),
        }
    }

    /// Get an aggregator config suitable for production.
    pub fn production() -> Self {
        Self {
            max_connections: 1024,
            request_listen_duration: std::time::Duration::from_millis(100),
            listen_address_list: vec![
                (
                    std::net::Ipv4Addr::UNSPECIFIED,
                    hopdist_api::DEFAULT_AGGREGATOR_PORT,
                )
                    .into(),
            ],
            max_frame_bytes: hopdist_api::DEFAULT_MAX_FRAME_BYTES,
            connection_read_timeout: Some(std::time::Duration::from_secs(60)),
            target_worker_count: 2,
            poll_interval: std::time::Duration::from_secs(1),
        }
    }
}

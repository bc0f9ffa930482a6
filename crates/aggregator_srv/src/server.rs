//! aggregator tcp server types.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hopdist_api::*;

use crate::*;

/// Print out a message if this thread dies.
struct ThreadGuard(&'static str);

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        tracing::debug!("{}", self.0);
    }
}

/// An actual hopdist aggregator server instance.
///
/// One accept thread per listen address, one handler thread per
/// accepted connection. Handlers use blocking io on os threads rather
/// than async code; a handful of workers submit one small message
/// each, so there is nothing to gain from a runtime.
pub struct AggregatorSrv {
    cont: Arc<AtomicBool>,
    workers: Vec<std::thread::JoinHandle<std::io::Result<()>>>,
    addrs: Vec<SocketAddr>,
    registry: Registry,
}

impl Drop for AggregatorSrv {
    fn drop(&mut self) {
        let _g = ThreadGuard("Server Shutdown Complete!");

        tracing::debug!("begin server shutdown...");
        let _ = self.shutdown();
    }
}

impl AggregatorSrv {
    /// Construct a new AggregatorSrv instance.
    pub fn new(config: Config) -> std::io::Result<Self> {
        if config.max_connections == 0 {
            return Err(std::io::Error::other("max_connections must be >= 1"));
        }

        let config = Arc::new(config);

        // atomic flag for telling threads to shutdown
        let cont = Arc::new(AtomicBool::new(true));

        // the results received so far
        let registry = Registry::default();

        let mut listeners = Vec::with_capacity(config.listen_address_list.len());
        let mut addrs = Vec::with_capacity(config.listen_address_list.len());

        for addr in config.listen_address_list.iter() {
            tracing::info!("Binding to: {}", addr);
            let listener = TcpListener::bind(addr)?;
            listener.set_nonblocking(true)?;
            let addr = listener.local_addr()?;
            tracing::info!("Bound with local address: {}", addr);
            addrs.push(addr);
            listeners.push(listener);
        }

        tracing::info!(?addrs, "Listening");

        let mut workers = Vec::with_capacity(listeners.len());

        for listener in listeners {
            let config = config.clone();
            let cont = cont.clone();
            let registry = registry.clone();
            workers.push(std::thread::spawn(move || {
                accept_worker(config, cont, registry, listener)
            }));
        }

        Ok(Self {
            cont,
            workers,
            addrs,
            registry,
        })
    }

    /// Shutdown the server, returning an error result if any
    /// of the worker threads had panicked.
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        let mut is_err = false;
        self.cont.store(false, Ordering::SeqCst);
        while let Some(w) = self.workers.pop() {
            tracing::debug!(
                "waiting on {} threads to close...",
                self.workers.len() + 1
            );
            if w.join().is_err() {
                is_err = true;
            }
        }
        tracing::debug!("all threads closed.");
        if is_err {
            Err(std::io::Error::other("Failure shutting down worker thread"))
        } else {
            Ok(())
        }
    }

    /// Get the bound listening addresses of this server.
    pub fn listen_addrs(&self) -> &[SocketAddr] {
        self.addrs.as_slice()
    }

    /// Get a handle to the result registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Print the address server started on
    pub fn print_addrs(&self) {
        println!("#hopdist_aggregator#running#");
        for addr in self.addrs.iter() {
            // print these incase someone wants to parse for them
            println!("#hopdist_aggregator#listening#{addr:?}#");
        }
    }
}

/// A connection being handled. The stream clone lets shutdown unblock
/// a handler stuck reading from a silent peer.
struct InFlight {
    task: std::thread::JoinHandle<()>,
    stream: TcpStream,
}

fn accept_worker(
    config: Arc<Config>,
    cont: Arc<AtomicBool>,
    registry: Registry,
    listener: TcpListener,
) -> std::io::Result<()> {
    let _g = ThreadGuard("accept_worker thread has ended");

    let mut in_flight: Vec<InFlight> = Vec::new();

    while cont.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                tracing::trace!(?peer, "accepted connection");

                in_flight.retain(|c| !c.task.is_finished());
                if in_flight.len() >= config.max_connections {
                    tracing::warn!(
                        ?peer,
                        in_flight = in_flight.len(),
                        "too many connections, dropping",
                    );
                    continue;
                }

                match spawn_handler(&config, &registry, stream, peer) {
                    Ok(c) => in_flight.push(c),
                    Err(err) => {
                        tracing::warn!(?peer, ?err, "dropping connection");
                    }
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(config.request_listen_duration);
            }
            Err(err) => {
                tracing::warn!(?err, "accept failed");
                std::thread::sleep(config.request_listen_duration);
            }
        }
    }

    for c in in_flight {
        let _ = c.stream.shutdown(std::net::Shutdown::Both);
        let _ = c.task.join();
    }

    Ok(())
}

fn spawn_handler(
    config: &Arc<Config>,
    registry: &Registry,
    stream: TcpStream,
    peer: SocketAddr,
) -> std::io::Result<InFlight> {
    // accepted sockets may inherit the listener's mode
    stream.set_nonblocking(false)?;
    let watch = stream.try_clone()?;

    let config = config.clone();
    let registry = registry.clone();

    let task = std::thread::Builder::new()
        .name(format!("hopdist-conn-{peer}"))
        .spawn(move || {
            let handler = Handler {
                config: &config,
                registry: &registry,
                peer,
            };

            // a bad submission only ever costs its own connection
            if let Err(err) = handler.handle(stream) {
                tracing::warn!(?peer, ?err, "submission rejected");
            }
        })?;

    Ok(InFlight {
        task,
        stream: watch,
    })
}

struct Handler<'lt> {
    config: &'lt Config,
    registry: &'lt Registry,
    peer: SocketAddr,
}

impl Handler<'_> {
    /// Receive one result, store it, and acknowledge it.
    fn handle(self, mut stream: TcpStream) -> HdResult<WorkerId> {
        use std::io::Write;

        stream
            .set_read_timeout(self.config.connection_read_timeout)
            .map_err(|err| HdError::other_src("set read timeout", err))?;

        let payload = read_frame(&mut stream, self.config.max_frame_bytes)?;
        let result = ResultMessage::decode(&payload)?;
        let worker_id = result.worker_id;
        let graph_size = result.graph_size;

        if self.registry.insert(result).is_some() {
            tracing::debug!(%worker_id, "replaced earlier result");
        }

        tracing::info!(
            peer = ?self.peer,
            %worker_id,
            graph_size,
            "result stored",
        );

        stream
            .write_all(ACK)
            .and_then(|_| stream.flush())
            .map_err(|err| HdError::other_src("write ack", err))?;

        let _ = stream.shutdown(std::net::Shutdown::Both);

        Ok(worker_id)
    }
}

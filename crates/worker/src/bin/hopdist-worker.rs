//! The binary hopdist-worker.

use hopdist_api::WorkerId;
use hopdist_delivery_client::DeliveryConfig;
use hopdist_worker::*;

#[derive(clap::Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Label for this worker's result. Also picks the built-in graph
    /// when no graph file is given.
    #[arg(default_value_t = 1)]
    pub worker_id: u64,

    /// Number of ranks in the relaxation group.
    #[arg(long, default_value_t = 1)]
    pub group_size: usize,

    /// Source vertex.
    #[arg(long, default_value_t = 0)]
    pub source: usize,

    /// Load the graph from a json file instead, either an adjacency
    /// matrix or `{"vertexCount": n, "adjacency": [[..], ..]}`.
    #[arg(long)]
    pub graph_file: Option<std::path::PathBuf>,

    /// Where the aggregator listens.
    #[arg(long, default_value = hopdist_api::DEFAULT_AGGREGATOR_ADDR)]
    pub aggregator: String,

    /// Fail a collective step after this many seconds.
    #[arg(long)]
    pub collective_timeout_s: Option<u64>,

    /// By default hopdist-worker uses the "production" delivery
    /// settings: 3 attempts with 5s/10s/15s back off.
    ///
    /// Set "testing" to retry almost immediately.
    #[arg(long)]
    pub testing: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = <Args as clap::Parser>::parse();
    let worker_id = WorkerId(args.worker_id);

    let graph = match &args.graph_file {
        None => demo_graph(worker_id),
        Some(path) => match load_graph(path) {
            Ok(graph) => graph,
            Err(err) => {
                tracing::error!(?err, "failed to load graph");
                std::process::exit(1);
            }
        },
    };

    let config = WorkerConfig {
        worker_id,
        group_size: args.group_size,
        source: args.source,
        collective_timeout: args
            .collective_timeout_s
            .map(std::time::Duration::from_secs),
        graph,
    };

    let delivery = if args.testing {
        DeliveryConfig::testing(args.aggregator.clone())
    } else {
        DeliveryConfig::production(args.aggregator.clone())
    };

    match run(&config, &delivery) {
        Ok((message, report)) => {
            // print these incase someone wants to parse for them
            println!(
                "#hopdist_worker#delivered#{}#{}#{}#",
                message.worker_id, report.attempt, message.distances,
            );
        }
        Err(err) => {
            tracing::error!(%worker_id, %err, "worker failed");
            std::process::exit(err.exit_code());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::ToSocketAddrs;

    #[test]
    fn looks_where_the_aggregator_listens_by_default() {
        let args =
            <Args as clap::Parser>::try_parse_from(["hopdist-worker"]).unwrap();
        let port = args.aggregator.rsplit(':').next().unwrap();

        let listen = hopdist_aggregator_srv::Config::production()
            .listen_address_list[0];
        assert_eq!(listen.port().to_string(), port);
        assert_eq!(hopdist_api::DEFAULT_AGGREGATOR_PORT, listen.port());
    }

    #[test]
    fn aggregator_override_resolves() {
        let args = <Args as clap::Parser>::try_parse_from([
            "hopdist-worker",
            "2",
            "--aggregator",
            "127.0.0.1:5000",
            "--group-size",
            "3",
        ])
        .unwrap();
        assert_eq!(2, args.worker_id);
        assert_eq!(3, args.group_size);
        assert!(args.aggregator.to_socket_addrs().unwrap().next().is_some());
    }
}

//! The binary hopdist-aggregator.

use hopdist_aggregator_srv::*;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Every interface, on the port workers look for by default.
const DEFAULT_LISTEN: SocketAddr = SocketAddr::V4(SocketAddrV4::new(
    Ipv4Addr::UNSPECIFIED,
    hopdist_api::DEFAULT_AGGREGATOR_PORT,
));

#[derive(clap::Parser, Debug)]
#[command(version)]
pub struct Args {
    /// By default hopdist-aggregator runs in "testing" configuration,
    /// with short timeouts and fast polling.
    ///
    /// Set "production" mode for long read timeouts, more concurrent
    /// connections and a 1s completion poll.
    #[arg(long)]
    pub production: bool,

    /// The listening address(es).
    #[arg(long, default_values_t = [DEFAULT_LISTEN])]
    pub listen: Vec<SocketAddr>,

    /// The number of distinct worker results to wait for before
    /// reporting.
    #[arg(long)]
    pub target_workers: Option<usize>,

    /// Keep serving after the target has been reached, until ctrl-c.
    #[arg(long)]
    pub keep_running: bool,
}

fn config_from_args(args: &Args) -> Config {
    let mut config = if args.production {
        Config::production()
    } else {
        Config::testing()
    };

    config.listen_address_list = args.listen.clone();

    if let Some(target) = args.target_workers {
        config.target_worker_count = target;
    }

    config
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
    let config = config_from_args(&args);

    println!("{args:?}--{config:?}");

    let cont = Arc::new(AtomicBool::new(true));

    let ctrlc_cont = cont.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        ctrlc_cont.store(false, Ordering::SeqCst);
    }) {
        eprintln!("failed to set ctrl-c handler: {err}");
        std::process::exit(1);
    }

    let srv = match AggregatorSrv::new(config.clone()) {
        Ok(srv) => srv,
        Err(err) => {
            eprintln!("failed to start server: {err}");
            std::process::exit(1);
        }
    };

    srv.print_addrs();

    let monitor = CompletionMonitor::new(
        srv.registry().clone(),
        config.target_worker_count,
        config.poll_interval,
    );

    if let Some(all) = monitor.run(&cont) {
        for r in all {
            // print these incase someone wants to parse for them
            println!(
                "#hopdist_aggregator#result#{}#{}#{}#",
                r.worker_id, r.graph_size, r.distances,
            );
        }

        if args.keep_running {
            while cont.load(Ordering::SeqCst) {
                std::thread::sleep(config.poll_interval);
            }
        }
    }

    println!("Terminating...");
    drop(srv);
    println!("Done.");
    std::process::exit(0);
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let args = <Args as clap::Parser>::try_parse_from(
            std::iter::once("hopdist-aggregator").chain(args.iter().copied()),
        )
        .unwrap();
        config_from_args(&args)
    }

    #[test]
    fn listens_where_workers_look_by_default() {
        let cases: [&[&str]; 2] = [&[], &["--production"]];
        for args in cases {
            let config = parse(args);
            assert_eq!(1, config.listen_address_list.len());
            let addr = config.listen_address_list[0];
            assert!(addr.ip().is_unspecified());
            assert_eq!(hopdist_api::DEFAULT_AGGREGATOR_PORT, addr.port());
        }
    }

    #[test]
    fn listen_and_target_overrides() {
        let config = parse(&[
            "--listen",
            "127.0.0.1:0",
            "--listen",
            "127.0.0.1:7000",
            "--target-workers",
            "5",
        ]);
        assert_eq!(
            vec![
                "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
                "127.0.0.1:7000".parse().unwrap(),
            ],
            config.listen_address_list,
        );
        assert_eq!(5, config.target_worker_count);
    }
}

use hopdist_aggregator_srv::{AggregatorSrv, CompletionMonitor, Config};
use hopdist_api::*;
use hopdist_delivery_client::{DeliveryConfig, DeliveryError};
use hopdist_test_utils::enable_tracing;
use hopdist_worker::*;
use std::time::Duration;

#[test]
fn two_workers_reach_the_aggregator() {
    enable_tracing();

    let s = AggregatorSrv::new(Config::testing()).unwrap();
    let delivery = DeliveryConfig::testing(s.listen_addrs()[0].to_string());

    std::thread::scope(|scope| {
        for (worker_id, size) in [(1, 3), (2, 2)] {
            let delivery = &delivery;
            scope.spawn(move || {
                let config = WorkerConfig::demo(WorkerId(worker_id), size);
                let (_, report) = run(&config, delivery).unwrap();
                assert_eq!(1, report.attempt);
            });
        }
    });

    let all = CompletionMonitor::new(
        s.registry().clone(),
        2,
        Duration::from_millis(5),
    )
    .poll_once()
    .unwrap();

    assert_eq!(2, all.len());
    assert_eq!(WorkerId(1), all[0].worker_id);
    assert_eq!("[0, 1, 2, 2, 1]", all[0].distances.to_string());
    assert_eq!(WorkerId(2), all[1].worker_id);
    assert_eq!(6, all[1].graph_size);
    assert_eq!("[0, 1, 1, 2, 2, 3]", all[1].distances.to_string());
}

#[test]
fn graph_file_unreachable_vertex() {
    let s = AggregatorSrv::new(Config::testing()).unwrap();
    let delivery = DeliveryConfig::testing(s.listen_addrs()[0].to_string());

    let graph = Graph::from_json(br#"[[0,1,0],[1,0,0],[0,0,0]]"#).unwrap();
    let config = WorkerConfig {
        graph,
        ..WorkerConfig::demo(WorkerId(7), 2)
    };

    run(&config, &delivery).unwrap();

    let got = s.registry().get(WorkerId(7)).unwrap();
    assert_eq!("[0, 1, inf]", got.distances.to_string());
}

#[test]
fn no_aggregator_exits_with_delivery_code() {
    let addr = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().to_string()
    };
    let delivery = DeliveryConfig {
        max_attempts: 2,
        ..DeliveryConfig::testing(addr)
    };

    let err = run(&WorkerConfig::demo(WorkerId(1), 2), &delivery).unwrap_err();

    assert!(matches!(
        err,
        WorkerError::Delivery(DeliveryError::Exhausted { attempts: 2, .. })
    ));
    assert_eq!(2, err.exit_code());
}

#[test]
fn missing_graph_file_is_an_error() {
    assert!(load_graph(std::path::Path::new("/no/such/graph.json")).is_err());
}

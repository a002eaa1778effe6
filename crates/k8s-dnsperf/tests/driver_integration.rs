//! End-to-end benchmark runs against an in-memory cluster and executor

mod test_utils;

use std::sync::Arc;
use std::time::{Duration, Instant};

use k8s_dnsperf::config::BenchmarkConfig;
use k8s_dnsperf::error::RunError;
use k8s_dnsperf::fleet::{FleetError, FleetOrchestrator};
use k8s_dnsperf::orchestrator::BenchmarkDriver;
use k8s_dnsperf_common::RecordType;
use k8s_dnsperf_test_utils::{init_tracing, pod_name, TEST_RUN_PREFIX};
use test_utils::{benchmark_config, fast_retry, fleet_spec, FakeCluster, FakeExecutor, Readiness};
use tokio_util::sync::CancellationToken;

fn driver(
    cluster: &Arc<FakeCluster>,
    executor: &Arc<FakeExecutor>,
    records: u32,
    benchmark: BenchmarkConfig,
) -> BenchmarkDriver<FakeCluster, FakeExecutor> {
    BenchmarkDriver::new(
        FleetOrchestrator::new(Arc::clone(cluster)).with_retry(fast_retry()),
        Arc::clone(executor),
        fleet_spec(records),
        benchmark,
    )
}

#[tokio::test]
async fn test_run_aggregates_every_pod() {
    init_tracing();
    let cluster = Arc::new(FakeCluster::new(5));
    let executor = Arc::new(FakeExecutor::new());
    let benchmark = BenchmarkConfig {
        clients: 2,
        ..benchmark_config()
    };
    let driver = driver(&cluster, &executor, 3, benchmark);

    let summary = driver.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.nodes, 5);
    assert_eq!(summary.queries_sent, 5000);
    assert_eq!(summary.queries_completed, 4950);
    assert_eq!(summary.queries_lost, 50);
    assert_eq!(summary.queries_interrupted, 0);
    // Mean per pod, not the cluster total
    assert_eq!(summary.qps, 100.0);
    assert_eq!(summary.avg_latency_ms, 2.0);
    assert_eq!(summary.min_latency_ms, 1.0);
    assert_eq!(summary.max_latency_ms, 4.0);
    assert_eq!(summary.latency_stdev_ms, 0.5);

    assert!(summary.uuid.starts_with(TEST_RUN_PREFIX));
    assert_eq!(summary.clients, 2);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.record_type, RecordType::A);
    assert_eq!(summary.duration, 1);
    assert_eq!(summary.target_server, "172.30.0.10");

    assert_eq!(executor.calls(), 5);
    assert_eq!(cluster.deletes(), 1);
    assert!(!cluster.namespace_exists());
}

#[tokio::test]
async fn test_fan_out_yields_one_result_per_pod() {
    for _ in 0..20 {
        let cluster = Arc::new(FakeCluster::new(32));
        let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(1)));
        let driver = driver(&cluster, &executor, 1, benchmark_config());

        let summary = driver.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(summary.nodes, 32);
        assert_eq!(summary.queries_sent, 32 * 1000);
        assert_eq!(executor.calls(), 32);
        assert_eq!(cluster.deletes(), 1);
    }
}

#[tokio::test]
async fn test_parallelism_bounds_in_flight_execs() {
    let cluster = Arc::new(FakeCluster::new(8));
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(20)));
    let benchmark = BenchmarkConfig {
        parallelism: 2,
        ..benchmark_config()
    };
    let driver = driver(&cluster, &executor, 1, benchmark);

    let summary = driver.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.nodes, 8);
    assert!(executor.max_in_flight() <= 2, "{} in flight", executor.max_in_flight());
}

#[tokio::test]
async fn test_exec_failure_cancels_remaining_pods() {
    let cluster = Arc::new(FakeCluster::new(4));
    let executor = Arc::new(
        FakeExecutor::new()
            .with_delay(Duration::from_secs(30))
            .with_failing_pod(pod_name(2)),
    );
    let driver = driver(&cluster, &executor, 1, benchmark_config());

    let start = Instant::now();
    let err = driver.run(&CancellationToken::new()).await.unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(5));
    match &err {
        RunError::Exec(e) => {
            assert_eq!(e.pod(), pod_name(2));
            assert!(!e.is_cancelled());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.stderr(), Some("Error: invalid server address"));
    assert_eq!(executor.succeeded(), 0);
    assert_eq!(cluster.deletes(), 1);
}

#[tokio::test]
async fn test_parse_failure_fails_run() {
    let cluster = Arc::new(FakeCluster::new(3));
    let executor = Arc::new(FakeExecutor::new().with_garbage_pod(pod_name(1)));
    let driver = driver(&cluster, &executor, 1, benchmark_config());

    let err = driver.run(&CancellationToken::new()).await.unwrap_err();

    match err {
        RunError::Parse { pod, .. } => assert_eq!(pod, pod_name(1)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(cluster.deletes(), 1);
}

#[tokio::test]
async fn test_provision_failure_still_tears_down() {
    let cluster = Arc::new(FakeCluster::new(3).with_failing_service(1));
    let executor = Arc::new(FakeExecutor::new());
    let driver = driver(&cluster, &executor, 4, benchmark_config());

    let err = driver.run(&CancellationToken::new()).await.unwrap_err();

    assert!(
        matches!(err, RunError::Fleet(FleetError::Provision { kind: "service", .. })),
        "got {err}"
    );
    assert_eq!(executor.calls(), 0);
    assert_eq!(cluster.deletes(), 1);
    assert!(!cluster.namespace_exists());
}

#[tokio::test]
async fn test_readiness_timeout_still_tears_down() {
    let cluster = Arc::new(FakeCluster::new(3).with_readiness(Readiness::Never));
    let executor = Arc::new(FakeExecutor::new());
    let benchmark = BenchmarkConfig {
        ready_timeout: Duration::from_millis(100),
        ..benchmark_config()
    };
    let driver = driver(&cluster, &executor, 1, benchmark);

    let err = driver.run(&CancellationToken::new()).await.unwrap_err();

    assert!(
        matches!(err, RunError::Fleet(FleetError::ReadinessTimeout { .. })),
        "got {err}"
    );
    assert_eq!(executor.calls(), 0);
    assert_eq!(cluster.deletes(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_tears_down() {
    let cluster = Arc::new(FakeCluster::new(3));
    let executor = Arc::new(FakeExecutor::new());
    let driver = driver(&cluster, &executor, 1, benchmark_config());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = driver.run(&cancel).await.unwrap_err();

    assert!(matches!(err, RunError::Cancelled), "got {err}");
    assert_eq!(cluster.deletes(), 1);
}

#[tokio::test]
async fn test_interrupt_during_run_tears_down() {
    let cluster = Arc::new(FakeCluster::new(3));
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_secs(30)));
    let driver = driver(&cluster, &executor, 1, benchmark_config());

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        }
    };

    let start = Instant::now();
    let (result, ()) = tokio::join!(driver.run(&cancel), interrupt);

    assert!(matches!(result, Err(RunError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(executor.succeeded(), 0);
    assert_eq!(cluster.deletes(), 1);
}

#[tokio::test]
async fn test_teardown_failure_after_success_is_returned() {
    let cluster = Arc::new(FakeCluster::new(2).with_failing_delete());
    let executor = Arc::new(FakeExecutor::new());
    let driver = driver(&cluster, &executor, 1, benchmark_config());

    let err = driver.run(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, RunError::Teardown { .. }), "got {err}");
    let summary = err.summary().expect("summary kept after teardown failure");
    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.queries_sent, 2000);
    assert_eq!(executor.calls(), 2);
    assert_eq!(cluster.deletes(), 1);
}

#[tokio::test]
async fn test_teardown_failure_does_not_mask_run_failure() {
    let cluster = Arc::new(FakeCluster::new(2).with_failing_delete());
    let executor = Arc::new(FakeExecutor::new().with_failing_pod(pod_name(0)));
    let driver = driver(&cluster, &executor, 1, benchmark_config());

    let err = driver.run(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, RunError::Exec(_)), "got {err}");
    assert!(err.summary().is_none());
    assert_eq!(cluster.deletes(), 1);
}

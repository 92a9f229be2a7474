//! Engine workflow contract tests
//!
//! These tests verify the create/remove flows end to end:
//! - create resolves zone and load balancer, upserts, then waits
//! - a propagation timeout still reports the accepted change
//! - remove deletes without waiting
//! - the file backend carries changes across engine instances

use alias_core::backend::MemoryBackend;
use alias_core::config::{AliasConfig, BackendConfig};
use alias_core::engine::{AliasEngine, CreateAliasRequest, EngineEvent, RemoveAliasRequest};
use alias_core::error::Error;
use alias_core::registry::BackendRegistry;
use alias_core::traits::Backend;
use alias_core::types::{AliasRecord, ChangeAction, ChangeState, LoadBalancerTarget, Zone};
use alias_core::waiter::WaitOutcome;
use alias_core::FileBackend;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

fn memory_sandbox(propagation_reads: usize) -> MemoryBackend {
    MemoryBackend::new()
        .with_page_size(1)
        .with_zone(Zone::new("Z1", "example1.com."))
        .with_zone(Zone::new("Z2", "example2.com."))
        .with_load_balancer(LoadBalancerTarget::new("other.elb.amazonaws.com", "ZOTHER"))
        .with_load_balancer(LoadBalancerTarget::new("lb.amazonaws.com", "ZLB"))
        .with_propagation_reads(propagation_reads)
}

fn start(memory: &MemoryBackend) -> (AliasEngine, mpsc::Receiver<EngineEvent>) {
    let backend = Backend::from_provider(Arc::new(memory.clone()));
    assert_ok!(AliasEngine::new(backend, AliasConfig::default()))
}

fn drain(events: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut all = Vec::new();
    while let Ok(event) = events.try_recv() {
        all.push(event);
    }
    all
}

#[tokio::test(start_paused = true)]
async fn test_create_waits_for_convergence() {
    let memory = memory_sandbox(2);
    let (engine, mut events) = start(&memory);

    let report = assert_ok!(
        engine
            .create_alias(CreateAliasRequest::new("test", "example2.com", "lb.amazonaws.com"))
            .await
    );

    assert_eq!(report.zone.id, "Z2");
    assert_eq!(report.load_balancer.hosted_zone_id, "ZLB");
    assert_eq!(report.record_name, "test.example2.com.");
    assert_eq!(report.change.state, ChangeState::Pending);
    match report.wait {
        Some(WaitOutcome::Converged { ref status, polls }) => {
            assert_eq!(status.id, report.change.id);
            assert_eq!(polls, 3);
        }
        ref other => panic!("expected convergence, got {:?}", other),
    }

    let events = drain(&mut events);
    assert_eq!(events.len(), 4);
    assert!(matches!(events[3], EngineEvent::Converged { polls: 3, .. }));

    let records = memory.records("Z2");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].target_dns_name, "lb.amazonaws.com");
    assert!(records[0].evaluate_target_health);
}

#[tokio::test(start_paused = true)]
async fn test_create_timeout_keeps_the_change() {
    let memory = memory_sandbox(usize::MAX);
    let (engine, mut events) = start(&memory);

    let report = assert_ok!(
        engine
            .create_alias(
                CreateAliasRequest::new("test", "example2.com.", "lb.amazonaws.com")
                    .with_timeout(Duration::from_secs(5)),
            )
            .await
    );

    match report.wait {
        Some(WaitOutcome::TimedOut { ref change_id, waited }) => {
            assert_eq!(change_id, &report.change.id);
            assert_eq!(waited, Duration::from_secs(5));
        }
        ref other => panic!("expected timeout, got {:?}", other),
    }
    assert!(matches!(
        drain(&mut events).last(),
        Some(EngineEvent::TimedOut { .. })
    ));
    assert_eq!(memory.records("Z2").len(), 1);
}

#[tokio::test]
async fn test_remove_deletes_without_waiting() {
    let memory = memory_sandbox(usize::MAX);
    let (engine, mut events) = start(&memory);

    assert_ok!(
        engine
            .create_alias(CreateAliasRequest::new("test", "example2.com", "lb.amazonaws.com").no_wait())
            .await
    );
    let report = assert_ok!(
        engine
            .remove_alias(RemoveAliasRequest::new("test.example2.com", "example2.com"))
            .await
    );

    assert_eq!(report.record_name, "test.example2.com.");
    assert_eq!(report.change.state, ChangeState::Pending);
    assert!(memory.records("Z2").is_empty());

    let submitted = memory.submitted_changes();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[1].action, ChangeAction::Delete);
    assert_eq!(submitted[1].record, submitted[0].record);

    let events = drain(&mut events);
    assert!(matches!(
        events.last(),
        Some(EngineEvent::ChangeSubmitted { .. })
    ));
}

#[tokio::test]
async fn test_remove_in_unknown_zone_fails_before_lookup() {
    let memory = memory_sandbox(0);
    let (engine, _events) = start(&memory);

    let err = assert_err!(
        engine
            .remove_alias(RemoveAliasRequest::new("test", "missing.com"))
            .await
    );
    assert!(matches!(err, Error::ZoneNotFound(_)));
    assert!(memory.submitted_changes().is_empty());
}

#[tokio::test]
async fn test_credential_failure_stops_create() {
    let memory = memory_sandbox(0).without_credentials();
    let (engine, _events) = start(&memory);

    let err = assert_err!(
        engine
            .create_alias(CreateAliasRequest::new("test", "example2.com", "lb.amazonaws.com"))
            .await
    );
    assert_eq!(err.category(), "authentication");
    assert_eq!(memory.call_count(), 1);
}

#[tokio::test]
async fn test_file_backend_workflow_across_engines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sandbox.json");

    let sandbox = assert_ok!(FileBackend::open(&path, Duration::ZERO).await);
    assert_ok!(sandbox.add_zone(Zone::new("/hostedzone/Z2", "example2.com")).await);
    assert_ok!(
        sandbox
            .add_load_balancer(LoadBalancerTarget::new("lb.amazonaws.com", "ZLB"))
            .await
    );
    drop(sandbox);

    let registry = BackendRegistry::with_builtin();
    let config = BackendConfig::File {
        path: path.to_string_lossy().into_owned(),
        propagation_delay_secs: 0,
    };

    let first = assert_ok!(registry.create_backend(&config).await);
    let (engine, _events) = assert_ok!(AliasEngine::new(first, AliasConfig::default()));
    let created = assert_ok!(
        engine
            .create_alias(CreateAliasRequest::new("www", "example2.com", "lb.amazonaws.com").no_wait())
            .await
    );

    let second = assert_ok!(registry.create_backend(&config).await);
    let (engine, _events) = assert_ok!(AliasEngine::new(second, AliasConfig::default()));

    // zero propagation delay: already in sync, so no polling happens
    let outcome = assert_ok!(engine.wait_for_change(&created.change.id).await);
    assert!(matches!(outcome, WaitOutcome::Converged { polls: 0, .. }));

    let record = assert_ok!(
        engine
            .directory()
            .find_record(&created.zone, "www")
            .await
    );
    assert_eq!(record.target_hosted_zone_id, "ZLB");

    let removed = assert_ok!(
        engine
            .remove_alias(RemoveAliasRequest::new("www", "example2.com."))
            .await
    );
    assert_ne!(removed.change.id, created.change.id);

    let err = assert_err!(engine.change_status("/change/unknown").await);
    assert!(matches!(err, Error::ChangeNotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_create_honours_sub_second_timeout_override() {
    let memory = memory_sandbox(usize::MAX);
    let (engine, _events) = start(&memory);

    let started = tokio::time::Instant::now();
    let report = assert_ok!(
        engine
            .create_alias(
                CreateAliasRequest::new("test", "example2.com", "lb.amazonaws.com")
                    .with_timeout(Duration::from_millis(2_500)),
            )
            .await
    );

    match report.wait {
        Some(WaitOutcome::TimedOut { waited, .. }) => {
            assert_eq!(waited, Duration::from_millis(2_500));
        }
        ref other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(started.elapsed(), Duration::from_millis(2_500));
}

#[tokio::test]
async fn test_remove_reports_the_stored_record_name() {
    let memory = memory_sandbox(0).with_record(
        "Z2",
        AliasRecord {
            name: "WWW.Example2.com.".to_string(),
            target_dns_name: "lb.amazonaws.com".to_string(),
            target_hosted_zone_id: "ZLB".to_string(),
            evaluate_target_health: true,
        },
    );
    let (engine, mut events) = start(&memory);

    let report = assert_ok!(
        engine
            .remove_alias(RemoveAliasRequest::new("www", "example2.com"))
            .await
    );

    assert_eq!(report.record_name, "WWW.Example2.com.");
    assert!(matches!(
        drain(&mut events).last(),
        Some(EngineEvent::ChangeSubmitted { record_name, .. }) if record_name == "WWW.Example2.com."
    ));
}

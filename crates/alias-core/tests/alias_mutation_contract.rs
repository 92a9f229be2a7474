//! Alias mutation contract tests
//!
//! These tests verify that:
//! - `set_alias` submits exactly one upsert for the fully-qualified name
//! - Upsert then lookup round-trips the target fields
//! - `remove_alias` mirrors the stored record and never mutates when the
//!   record is missing
//! - Mutation errors are not retried

mod common;

use alias_core::backend::MemoryBackend;
use alias_core::config::DirectoryConfig;
use alias_core::directory::DirectoryClient;
use alias_core::error::{BackendError, Error};
use alias_core::mutator::AliasMutator;
use alias_core::traits::Backend;
use alias_core::types::{ChangeAction, ChangeState, LoadBalancerTarget, Zone};
use common::{Doubles, PagedListing, RecordingMutator, alias_record, zone};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn mutator_for(backend: &Backend) -> AliasMutator {
    let directory = DirectoryClient::new(backend, DirectoryConfig::default());
    AliasMutator::new(backend.mutator.clone(), directory)
}

fn empty_doubles() -> Doubles {
    Doubles::new(
        PagedListing::new(vec![vec![zone("Z2", "example2.com.")]]),
        PagedListing::new(vec![]),
        PagedListing::<LoadBalancerTarget>::new(vec![]),
    )
}

#[tokio::test]
async fn test_set_alias_submits_single_upsert() {
    let doubles = empty_doubles();
    let mutator = mutator_for(&doubles.backend());

    let status = assert_ok!(
        mutator
            .set_alias(&zone("Z2", "example2.com."), "ZLB", "lb.amazonaws.com", "test")
            .await
    );
    assert_eq!(status.state, ChangeState::Pending);
    assert!(!status.id.is_empty());

    let submitted = doubles.mutator.submitted();
    assert_eq!(submitted.len(), 1);
    let (zone_id, change) = &submitted[0];
    assert_eq!(zone_id, "Z2");
    assert_eq!(change.action, ChangeAction::Upsert);
    assert_eq!(change.record.name, "test.example2.com.");
    assert_eq!(change.record.target_dns_name, "lb.amazonaws.com");
    assert_eq!(change.record.target_hosted_zone_id, "ZLB");
    assert!(change.record.evaluate_target_health);

    // no lookups are needed for an upsert
    assert_eq!(doubles.records.call_count(), 0);
}

#[tokio::test]
async fn test_set_alias_then_find_record_round_trips() {
    let memory = MemoryBackend::new()
        .with_page_size(1)
        .with_zone(Zone::new("Z2", "example2.com."))
        .with_record("Z2", alias_record("a.example2.com.", "a.elb.amazonaws.com", "ZA"))
        .with_record("Z2", alias_record("b.example2.com.", "b.elb.amazonaws.com", "ZB"));
    let backend = Backend::from_provider(Arc::new(memory.clone()));
    let mutator = mutator_for(&backend);
    let directory = DirectoryClient::new(&backend, DirectoryConfig::default());
    let zone = Zone::new("Z2", "example2.com.");

    assert_ok!(
        mutator
            .set_alias(&zone, "ZLB", "lb.amazonaws.com", "test.example2.com")
            .await
    );

    let record = assert_ok!(directory.find_record(&zone, "test").await);
    assert_eq!(record.name, "test.example2.com.");
    assert_eq!(record.target_dns_name, "lb.amazonaws.com");
    assert_eq!(record.target_hosted_zone_id, "ZLB");
    assert_eq!(memory.records("Z2").len(), 3);
}

#[tokio::test]
async fn test_remove_missing_alias_issues_no_mutation() {
    let doubles = Doubles::new(
        PagedListing::new(vec![vec![zone("Z2", "example2.com.")]]),
        PagedListing::new(vec![
            vec![alias_record("a.example2.com.", "a.elb.amazonaws.com", "ZA")],
            vec![alias_record("b.example2.com.", "b.elb.amazonaws.com", "ZB")],
        ]),
        PagedListing::<LoadBalancerTarget>::new(vec![]),
    );
    let mutator = mutator_for(&doubles.backend());

    let err = assert_err!(
        mutator
            .remove_alias(&zone("Z2", "example2.com."), "ghost")
            .await
    );
    assert!(matches!(err, Error::RecordNotFound(_)));
    assert_eq!(doubles.records.call_count(), 2);
    assert!(doubles.mutator.submitted().is_empty());
}

#[tokio::test]
async fn test_remove_alias_mirrors_stored_fields() {
    let mut stored = alias_record("test.example2.com.", "legacy.elb.amazonaws.com", "ZOLD");
    stored.evaluate_target_health = false;
    let doubles = Doubles::new(
        PagedListing::new(vec![vec![zone("Z2", "example2.com.")]]),
        PagedListing::new(vec![vec![stored.clone()]]),
        PagedListing::<LoadBalancerTarget>::new(vec![]),
    );
    let mutator = mutator_for(&doubles.backend());

    assert_ok!(
        mutator
            .remove_alias(&zone("Z2", "example2.com."), "test.example2.com.")
            .await
    );

    let submitted = doubles.mutator.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].1.action, ChangeAction::Delete);
    assert_eq!(submitted[0].1.record, stored);
}

#[tokio::test]
async fn test_remove_alias_against_memory_backend_deletes_record() {
    let memory = MemoryBackend::new()
        .with_zone(Zone::new("Z2", "example2.com."))
        .with_record("Z2", alias_record("test.example2.com.", "lb.amazonaws.com", "ZLB"));
    let backend = Backend::from_provider(Arc::new(memory.clone()));
    let mutator = mutator_for(&backend);

    assert_ok!(
        mutator
            .remove_alias(&Zone::new("Z2", "example2.com."), "test")
            .await
    );
    assert!(memory.records("Z2").is_empty());

    let err = assert_err!(
        mutator
            .remove_alias(&Zone::new("Z2", "example2.com."), "test")
            .await
    );
    assert!(matches!(err, Error::RecordNotFound(_)));
    assert_eq!(memory.submitted_changes().len(), 1);
}

#[tokio::test]
async fn test_mutation_failure_is_not_retried() {
    let doubles = empty_doubles().with_mutator(RecordingMutator::failing(BackendError::new(
        "InvalidChangeBatch",
        "rejected",
    )));
    let mutator = mutator_for(&doubles.backend());

    let err = assert_err!(
        mutator
            .set_alias(&zone("Z2", "example2.com."), "ZLB", "lb.amazonaws.com", "test")
            .await
    );
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(doubles.mutator.submitted().len(), 1);
}

#[tokio::test]
async fn test_mutation_credential_failure_is_authentication() {
    let doubles =
        empty_doubles().with_mutator(RecordingMutator::failing(BackendError::no_credentials()));
    let mutator = mutator_for(&doubles.backend());

    let err = assert_err!(
        mutator
            .set_alias(&zone("Z2", "example2.com."), "ZLB", "lb.amazonaws.com", "test")
            .await
    );
    assert!(matches!(err, Error::Authentication(_)));
}

//! Contract Test: Credential Table Atomicity
//!
//! Constraints verified:
//! - Nothing is visible while a load is in flight
//! - A failed load publishes nothing and is retried by the next caller
//! - A partially parseable table publishes nothing

mod common;

use common::*;
use dyndns53_core::{CredentialStore, Error};
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn lookups_during_load_see_nothing() {
    let gate = Arc::new(Notify::new());
    let source = ScriptedBlobStore::new(vec![Ok(
        b"a.example.com,one\nb.example.com,two\n".to_vec(),
    )])
    .gated(Arc::clone(&gate));
    let started = source.started();
    let store = Arc::new(CredentialStore::new(Arc::new(source)));

    let loader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.ensure_loaded().await })
    };

    started.notified().await;
    assert_eq!(store.lookup("a.example.com").await, None);
    assert_eq!(store.lookup("b.example.com").await, None);

    gate.notify_one();
    loader.await.unwrap().unwrap();

    assert_eq!(store.lookup("a.example.com").await.as_deref(), Some("one"));
    assert_eq!(store.lookup("b.example.com").await.as_deref(), Some("two"));
}

#[tokio::test]
async fn failed_fetch_is_retried_by_next_caller() {
    let source = Arc::new(ScriptedBlobStore::new(vec![
        Err(Error::storage("connection reset")),
        Ok(b"a.example.com,one\n".to_vec()),
    ]));
    let store = CredentialStore::new(source.clone());

    assert!(store.verify("a.example.com", "one").await.is_err());
    assert!(!store.is_loaded().await);

    assert!(store.verify("a.example.com", "one").await.unwrap());
    assert_eq!(source.fetch_calls(), 2);

    // Published tables are not fetched again
    assert!(store.verify("a.example.com", "one").await.unwrap());
    assert_eq!(source.fetch_calls(), 2);
}

#[tokio::test]
async fn partial_table_publishes_nothing() {
    let source = Arc::new(ScriptedBlobStore::new(vec![
        Ok(b"a.example.com,one\nb.example.com,two,three\n".to_vec()),
        Ok(b"a.example.com,one\nb.example.com,two\n".to_vec()),
    ]));
    let store = CredentialStore::new(source.clone());

    let err = store.ensure_loaded().await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));
    assert_eq!(store.lookup("a.example.com").await, None);

    store.ensure_loaded().await.unwrap();
    assert_eq!(store.len().await, 2);
}

//! Test doubles shared across module tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Entity;
use crate::remote::RemoteStore;

/// In-memory remote store with call counters and failure injection
pub struct MockRemoteStore<E> {
    docs: Mutex<HashMap<String, E>>,
    upsert_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    list_calls: AtomicUsize,
    fail_upserts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_fetches: AtomicBool,
    fail_lists: AtomicBool,
}

impl<E: Entity> MockRemoteStore<E> {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            upsert_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            fail_upserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, entities: Vec<E>) {
        let mut docs = self.docs.lock().unwrap();
        for entity in entities {
            docs.insert(entity.id(), entity);
        }
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.docs.lock().unwrap().contains_key(id)
    }

    pub fn doc_count(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
            + self.fetch_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
    }

    fn injected() -> Error {
        Error::Remote("injected remote failure".to_string())
    }
}

#[async_trait]
impl<E: Entity> RemoteStore<E> for MockRemoteStore<E> {
    async fn upsert(&self, entity: &E) -> Result<E> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.docs
            .lock()
            .unwrap()
            .insert(entity.id(), entity.clone());
        Ok(entity.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.docs.lock().unwrap().remove(id);
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<E>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        Ok(self.docs.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<E>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        Ok(self.docs.lock().unwrap().values().cloned().collect())
    }
}

//! In-memory store for testing.
//!
//! Databases are keyed by connection URI. Every connection handed out is
//! recorded so tests can check how often each one was closed.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::document::Document;
use super::store::{DocumentStore, StoreConnector, StoreError};

#[derive(Default)]
struct MockState {
    /// URI → ordered (collection, documents) pairs
    databases: HashMap<String, Vec<(String, Vec<Document>)>>,
    failing_connect: HashSet<String>,
    failing_list: HashSet<String>,
    failing_find: HashSet<String>,
    failing_insert: HashSet<String>,
    failing_close: HashSet<String>,
    handles: Vec<HandleRecord>,
    next_id: u64,
}

#[derive(Debug, Clone)]
struct HandleRecord {
    uri: String,
    close_count: usize,
}

/// Snapshot of one connection handed out by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHandle {
    pub uri: String,
    pub close_count: usize,
}

impl MockHandle {
    pub fn is_open(&self) -> bool {
        self.close_count == 0
    }
}

/// Mock connector for testing.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
    connect_delay: Option<Duration>,
    list_delay: Option<Duration>,
    insert_delay: Option<Duration>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        lock_state(&self.state)
    }

    /// Seed a collection at `uri`
    pub fn with_collection(self, uri: &str, name: &str, docs: Vec<Document>) -> Self {
        {
            let mut state = self.lock();
            let db = state.databases.entry(uri.to_string()).or_default();
            match db.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = docs,
                None => db.push((name.to_string(), docs)),
            }
        }
        self
    }

    /// Make every connect to `uri` fail
    pub fn fail_connect(self, uri: &str) -> Self {
        self.lock().failing_connect.insert(uri.to_string());
        self
    }

    /// Make listing collections at `uri` fail
    pub fn fail_list(self, uri: &str) -> Self {
        self.lock().failing_list.insert(uri.to_string());
        self
    }

    /// Make reads at `uri` fail
    pub fn fail_find(self, uri: &str) -> Self {
        self.lock().failing_find.insert(uri.to_string());
        self
    }

    /// Make inserts at `uri` fail
    pub fn fail_insert(self, uri: &str) -> Self {
        self.lock().failing_insert.insert(uri.to_string());
        self
    }

    /// Make closing connections to `uri` fail
    pub fn fail_close(self, uri: &str) -> Self {
        self.lock().failing_close.insert(uri.to_string());
        self
    }

    /// Sleep this long inside every connect
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Sleep this long before listing collections
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Sleep this long before every insert
    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    /// Every connection opened so far, in order
    pub fn handles(&self) -> Vec<MockHandle> {
        self.lock()
            .handles
            .iter()
            .map(|h| MockHandle {
                uri: h.uri.clone(),
                close_count: h.close_count,
            })
            .collect()
    }

    /// Connections that have not been closed
    pub fn open_handles(&self) -> Vec<MockHandle> {
        self.handles().into_iter().filter(MockHandle::is_open).collect()
    }

    /// Current contents of a collection
    pub fn documents(&self, uri: &str, collection: &str) -> Vec<Document> {
        self.lock()
            .databases
            .get(uri)
            .and_then(|db| db.iter().find(|(n, _)| n == collection))
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default()
    }
}

fn lock_state(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl StoreConnector for MockConnector {
    async fn connect(&self, uri: &str) -> Result<Box<dyn DocumentStore>, StoreError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }

        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(StoreError::Driver(format!("invalid connection string: '{}'", uri)));
        }

        let mut state = self.lock();
        if state.failing_connect.contains(uri) {
            return Err(StoreError::Driver(format!("server selection timeout for {}", uri)));
        }

        let index = state.handles.len();
        state.handles.push(HandleRecord {
            uri: uri.to_string(),
            close_count: 0,
        });

        Ok(Box::new(MockStore {
            uri: uri.to_string(),
            index,
            state: Arc::clone(&self.state),
            list_delay: self.list_delay,
            insert_delay: self.insert_delay,
        }))
    }
}

/// One mock connection
pub struct MockStore {
    uri: String,
    index: usize,
    state: Arc<Mutex<MockState>>,
    list_delay: Option<Duration>,
    insert_delay: Option<Duration>,
}

impl MockStore {
    fn ensure_open(&self, state: &MockState) -> Result<(), StoreError> {
        if state.handles[self.index].close_count > 0 {
            return Err(StoreError::Driver("connection already closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        let state = lock_state(&self.state);
        self.ensure_open(&state)?;
        if state.failing_list.contains(&self.uri) {
            return Err(StoreError::Driver("listCollections failed".into()));
        }
        Ok(state
            .databases
            .get(&self.uri)
            .map(|db| db.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let state = lock_state(&self.state);
        self.ensure_open(&state)?;
        if state.failing_find.contains(&self.uri) {
            return Err(StoreError::Driver("network interrupted".into()));
        }
        state
            .databases
            .get(&self.uri)
            .and_then(|db| db.iter().find(|(n, _)| n == collection))
            .map(|(_, docs)| docs.clone())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<Value, StoreError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = lock_state(&self.state);
        self.ensure_open(&state)?;
        if state.failing_insert.contains(&self.uri) {
            return Err(StoreError::Driver("write rejected".into()));
        }

        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                state.next_id += 1;
                let id = Value::String(format!("{:024x}", state.next_id));
                document.insert("_id".to_string(), id.clone());
                id
            }
        };

        let db = state.databases.entry(self.uri.clone()).or_default();
        match db.iter_mut().find(|(n, _)| n == collection) {
            Some((_, docs)) => docs.push(document),
            None => db.push((collection.to_string(), vec![document])),
        }

        Ok(id)
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = lock_state(&self.state);
        state.handles[self.index].close_count += 1;
        if state.failing_close.contains(&self.uri) {
            return Err(StoreError::Driver("close timed out".into()));
        }
        Ok(())
    }
}

// TestDependencies - mock implementations for testing
//
// Mock services that can be injected into pipelines, plus an in-memory
// claimable queue with the same compare-and-swap semantics as the Postgres
// queues.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::jobs::{ClaimableQueue, JobFailure, Pipeline, QueuedItem};
use super::{BaseObjectStorage, BaseResumeParser, UploadOptions};

// =============================================================================
// Mock Object Storage
// =============================================================================

/// Arguments captured from an upload call
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub bucket: String,
    pub path: String,
    pub bytes: Vec<u8>,
    pub options: UploadOptions,
}

impl UploadCall {
    pub fn body(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Arguments captured from a signed URL call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignCall {
    pub bucket: String,
    pub path: String,
    pub ttl_secs: u64,
}

#[derive(Default)]
pub struct MockObjectStorage {
    uploads: Arc<Mutex<Vec<UploadCall>>>,
    sign_calls: Arc<Mutex<Vec<SignCall>>>,
    fail_uploads: bool,
    fail_signing: bool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload fail
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Make every signed URL request fail
    pub fn failing_signing(mut self) -> Self {
        self.fail_signing = true;
        self
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn sign_calls(&self) -> Vec<SignCall> {
        self.sign_calls.lock().unwrap().clone()
    }

    /// The URL this mock hands out for an object
    pub fn signed_url_for(bucket: &str, path: &str, ttl_secs: u64) -> String {
        format!("https://storage.test/{}/{}?expires_in={}", bucket, path, ttl_secs)
    }
}

#[async_trait]
impl BaseObjectStorage for MockObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<()> {
        if self.fail_uploads {
            bail!("mock storage rejected upload to {}/{}", bucket, path);
        }
        self.uploads.lock().unwrap().push(UploadCall {
            bucket: bucket.to_string(),
            path: path.to_string(),
            bytes,
            options,
        });
        Ok(())
    }

    async fn create_signed_url(&self, bucket: &str, path: &str, ttl_secs: u64) -> Result<String> {
        if self.fail_signing {
            bail!("mock storage cannot sign {}/{}", bucket, path);
        }
        self.sign_calls.lock().unwrap().push(SignCall {
            bucket: bucket.to_string(),
            path: path.to_string(),
            ttl_secs,
        });
        Ok(Self::signed_url_for(bucket, path, ttl_secs))
    }
}

// =============================================================================
// Mock Resume Parser
// =============================================================================

pub struct MockResumeParser {
    response: Result<serde_json::Value, String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockResumeParser {
    /// Parser that returns `parsed` for every URL
    pub fn returning(parsed: serde_json::Value) -> Self {
        Self {
            response: Ok(parsed),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Parser that fails every request with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all URLs that were submitted
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseResumeParser for MockResumeParser {
    async fn parse_url(&self, url: &str) -> Result<serde_json::Value> {
        self.calls.lock().unwrap().push(url.to_string());
        self.response.clone().map_err(|message| anyhow!(message))
    }
}

// =============================================================================
// In-memory claimable queue
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct MemoryItem {
    pub id: Uuid,
    pub label: String,
    pub status: MemoryStatus,
    pub result: Option<String>,
    pub error: Option<JobFailure>,
}

impl QueuedItem for MemoryItem {
    type Id = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Claimable queue held in process memory. Items keep insertion order.
#[derive(Default)]
pub struct InMemoryQueue {
    items: Mutex<Vec<MemoryItem>>,
    stolen: Mutex<HashSet<Uuid>>,
    failing_fetches: AtomicUsize,
    fetch_count: AtomicUsize,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a new item and return its id
    pub fn push(&self, label: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.items.lock().unwrap().push(MemoryItem {
            id,
            label: label.to_string(),
            status: MemoryStatus::Queued,
            result: None,
            error: None,
        });
        id
    }

    pub fn get(&self, id: Uuid) -> Option<MemoryItem> {
        self.items.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }

    pub fn status(&self, id: Uuid) -> Option<MemoryStatus> {
        self.get(id).map(|i| i.status)
    }

    /// Make the next `count` fetches fail
    pub fn fail_next_fetches(&self, count: usize) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    /// Simulate another worker claiming `id` just before our claim lands
    pub fn steal_on_claim(&self, id: Uuid) {
        self.stolen.lock().unwrap().insert(id);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Terminal success write, guarded like the Postgres queues
    pub fn complete(&self, id: Uuid, result: &str) -> bool {
        self.transition(id, MemoryStatus::InProgress, |item| {
            item.status = MemoryStatus::Completed;
            item.result = Some(result.to_string());
        })
    }

    fn transition(&self, id: Uuid, expected: MemoryStatus, apply: impl FnOnce(&mut MemoryItem)) -> bool {
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|i| i.id == id) {
            Some(item) if item.status == expected => {
                apply(item);
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl ClaimableQueue for InMemoryQueue {
    type Item = MemoryItem;

    fn kind(&self) -> &'static str {
        "memory_item"
    }

    async fn fetch_queued(&self, limit: i64) -> Result<Vec<MemoryItem>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_fetches.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_fetches.store(failing - 1, Ordering::SeqCst);
            bail!("simulated query error");
        }

        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| i.status == MemoryStatus::Queued)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn claim(&self, id: Uuid) -> Result<bool> {
        if self.stolen.lock().unwrap().remove(&id) {
            self.transition(id, MemoryStatus::Queued, |item| {
                item.status = MemoryStatus::InProgress;
            });
        }

        Ok(self.transition(id, MemoryStatus::Queued, |item| {
            item.status = MemoryStatus::InProgress;
        }))
    }

    async fn mark_failed(&self, id: Uuid, failure: &JobFailure) -> Result<bool> {
        Ok(self.transition(id, MemoryStatus::InProgress, |item| {
            item.status = MemoryStatus::Failed;
            item.error = Some(failure.clone());
        }))
    }
}

// =============================================================================
// Recording pipeline
// =============================================================================

/// Pipeline that records every item it runs and completes it in the queue,
/// unless told to fail or panic on a specific id.
pub struct RecordingPipeline {
    queue: Arc<InMemoryQueue>,
    calls: Mutex<Vec<Uuid>>,
    failing: HashSet<Uuid>,
    panicking: HashSet<Uuid>,
}

impl RecordingPipeline {
    pub fn new(queue: Arc<InMemoryQueue>) -> Self {
        Self {
            queue,
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            panicking: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, id: Uuid) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn panicking_on(mut self, id: Uuid) -> Self {
        self.panicking.insert(id);
        self
    }

    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pipeline<MemoryItem> for RecordingPipeline {
    async fn execute(&self, item: &MemoryItem) -> Result<()> {
        self.calls.lock().unwrap().push(item.id);

        if self.panicking.contains(&item.id) {
            panic!("pipeline blew up on {}", item.label);
        }
        if self.failing.contains(&item.id) {
            bail!("simulated failure for {}", item.label);
        }
        if !self.queue.complete(item.id, &item.label) {
            bail!("item {} was not in progress", item.id);
        }
        Ok(())
    }
}

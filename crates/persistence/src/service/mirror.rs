//! Mirroring of store mutations into the search index.
//!
//! The store write always happens first and is never undone; the mirror write
//! is a separate, separately failable step.
//!
//! # Modes
//!
//! | Mode | Description | Caller latency | Index freshness |
//! |------|-------------|----------------|-----------------|
//! | Synchronous | Index written before the service call returns | Higher | Read-your-writes |
//! | Asynchronous | Index written by a background worker, in order | Lower | Eventual |
//!
//! In both modes an index failure is logged and counted in [`MirrorStatus`]
//! and never reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::core::SearchIndex;
use crate::domain::Entity;
use crate::error::{StorageResult, ValidationError};

/// How mirror writes are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorMode {
    /// Write the index inside the service call, after the store.
    #[default]
    Synchronous,

    /// Queue the write for a background worker.
    Asynchronous,
}

impl std::str::FromStr for MirrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "synchronous" | "sync" => Ok(MirrorMode::Synchronous),
            "asynchronous" | "async" => Ok(MirrorMode::Asynchronous),
            other => Err(format!(
                "unknown mirror mode '{}' (expected synchronous|asynchronous)",
                other
            )),
        }
    }
}

/// Retry configuration for failed mirror writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retrying.
    #[serde(default)]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the delay between retries, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Factor applied to the delay after each failed retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Checks that the backoff never shrinks and stays within its bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ValidationError::InvalidConfiguration {
                message: format!(
                    "backoff_multiplier must be a finite number >= 1.0, got {}",
                    self.backoff_multiplier
                ),
            });
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidConfiguration {
                message: format!(
                    "initial_delay_ms ({}) exceeds max_delay_ms ({})",
                    self.initial_delay_ms, self.max_delay_ms
                ),
            });
        }
        Ok(())
    }
}

/// Mirror configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Synchronous or asynchronous mirroring.
    #[serde(default)]
    pub mode: MirrorMode,

    /// Capacity of the asynchronous queue. Senders wait when it is full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Retry policy for failed index writes.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_queue_capacity() -> usize {
    1000
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            mode: MirrorMode::default(),
            queue_capacity: default_queue_capacity(),
            retry: RetryConfig::default(),
        }
    }
}

impl MirrorConfig {
    /// Asynchronous mirroring with default settings.
    pub fn asynchronous() -> Self {
        Self {
            mode: MirrorMode::Asynchronous,
            ..Self::default()
        }
    }

    /// Validates the retry policy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.retry.validate()
    }
}

/// A store mutation to propagate to the index.
#[derive(Debug, Clone)]
pub enum MirrorEvent<E> {
    /// The entity was inserted or updated.
    Save(E),
    /// The entity with this id was deleted.
    Delete(i64),
}

impl<E: Entity> MirrorEvent<E> {
    /// Short name of the mutation.
    pub fn kind(&self) -> &'static str {
        match self {
            MirrorEvent::Save(_) => "save",
            MirrorEvent::Delete(_) => "delete",
        }
    }

    /// Id of the affected entity.
    pub fn id(&self) -> Option<i64> {
        match self {
            MirrorEvent::Save(entity) => entity.id(),
            MirrorEvent::Delete(id) => Some(*id),
        }
    }
}

/// Mirror health counters for one entity type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorStatus {
    /// Events applied to the index.
    pub total_mirrored: u64,

    /// Events that failed after all retries.
    pub total_errors: u64,

    /// Events queued but not yet applied.
    pub pending_events: usize,

    /// Message of the most recent failure.
    pub last_error: Option<String>,

    /// Time of the most recent successful write.
    pub last_success: Option<DateTime<Utc>>,
}

impl MirrorStatus {
    /// Returns true when nothing is waiting to be applied.
    pub fn is_idle(&self) -> bool {
        self.pending_events == 0
    }
}

/// Applies [`MirrorEvent`]s for one entity type to its search index.
pub struct MirrorWriter<E: Entity> {
    index: Arc<dyn SearchIndex<E>>,
    config: MirrorConfig,
    sender: Option<mpsc::Sender<MirrorEvent<E>>>,
    status: Arc<RwLock<MirrorStatus>>,
}

impl<E: Entity> std::fmt::Debug for MirrorWriter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorWriter")
            .field("entity", &E::NAME)
            .field("index", &self.index.backend_name())
            .field("config", &self.config)
            .field("worker", &self.sender.is_some())
            .finish()
    }
}

impl<E: Entity> MirrorWriter<E> {
    /// Creates a writer. In asynchronous mode the worker is spawned on the
    /// current tokio runtime; without one the writer mirrors synchronously.
    ///
    /// An invalid retry policy is logged; delays are then clamped to
    /// `max_delay_ms`.
    pub fn new(index: Arc<dyn SearchIndex<E>>, config: MirrorConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(entity = E::NAME, error = %e, "Invalid mirror retry policy");
        }

        let mut writer = Self {
            index,
            config,
            sender: None,
            status: Arc::new(RwLock::new(MirrorStatus::default())),
        };

        if writer.config.mode == MirrorMode::Asynchronous {
            writer.start_worker();
        }

        writer
    }

    fn start_worker(&mut self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    entity = E::NAME,
                    "Asynchronous mirroring requested outside a runtime, mirroring synchronously"
                );
                return;
            }
        };

        let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
        handle.spawn(Self::worker(
            receiver,
            self.index.clone(),
            self.config.retry.clone(),
            self.status.clone(),
        ));
        self.sender = Some(sender);
    }

    async fn worker(
        mut receiver: mpsc::Receiver<MirrorEvent<E>>,
        index: Arc<dyn SearchIndex<E>>,
        retry: RetryConfig,
        status: Arc<RwLock<MirrorStatus>>,
    ) {
        while let Some(event) = receiver.recv().await {
            let result = apply_with_retry(index.as_ref(), &event, &retry).await;
            let mut status = status.write();
            record(&mut status, &event, result);
            status.pending_events = status.pending_events.saturating_sub(1);
        }
        debug!(entity = E::NAME, "Mirror worker stopped");
    }

    /// Propagates a store mutation. Never fails.
    pub async fn mirror(&self, event: MirrorEvent<E>) {
        if let Some(sender) = &self.sender {
            self.status.write().pending_events += 1;
            match sender.send(event).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => {
                    {
                        let mut status = self.status.write();
                        status.pending_events = status.pending_events.saturating_sub(1);
                    }
                    warn!(
                        entity = E::NAME,
                        "Mirror queue closed, mirroring synchronously"
                    );
                    self.apply_now(event).await;
                }
            }
        } else {
            self.apply_now(event).await;
        }
    }

    async fn apply_now(&self, event: MirrorEvent<E>) {
        let result = apply_with_retry(self.index.as_ref(), &event, &self.config.retry).await;
        record(&mut self.status.write(), &event, result);
    }

    /// Returns a snapshot of the counters.
    pub fn status(&self) -> MirrorStatus {
        self.status.read().clone()
    }

    /// Returns true if events are queued to a background worker.
    pub fn is_asynchronous(&self) -> bool {
        self.sender.is_some()
    }

    /// Waits until every queued event has been applied.
    ///
    /// Returns false if events are still pending when the timeout expires.
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.status.read().is_idle() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}

fn record<E: Entity>(
    status: &mut MirrorStatus,
    event: &MirrorEvent<E>,
    result: StorageResult<()>,
) {
    match result {
        Ok(()) => {
            status.total_mirrored += 1;
            status.last_success = Some(Utc::now());
        }
        Err(e) => {
            status.total_errors += 1;
            status.last_error = Some(e.to_string());
            error!(
                entity = E::NAME,
                op = event.kind(),
                id = ?event.id(),
                error = %e,
                "Search index mirror failed, store write kept"
            );
        }
    }
}

async fn apply_with_retry<E: Entity>(
    index: &dyn SearchIndex<E>,
    event: &MirrorEvent<E>,
    retry: &RetryConfig,
) -> StorageResult<()> {
    let mut delay = Duration::from_millis(retry.initial_delay_ms);
    let max_delay = Duration::from_millis(retry.max_delay_ms);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let result = match event {
            MirrorEvent::Save(entity) => index.save(entity).await,
            MirrorEvent::Delete(id) => index.delete_by_id(*id).await,
        };

        match result {
            Ok(()) => {
                if attempts > 1 {
                    debug!(entity = E::NAME, attempts, "Mirror succeeded after retries");
                }
                return Ok(());
            }
            Err(e) => {
                if attempts > retry.max_retries {
                    return Err(e);
                }

                warn!(
                    entity = E::NAME,
                    attempt = attempts,
                    max_retries = retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Mirror attempt failed, retrying"
                );

                sleep(delay).await;
                delay = next_delay(delay, retry.backoff_multiplier, max_delay);
            }
        }
    }
}

/// Grows `delay` by `multiplier`, capped at `max`. A product that is not a
/// valid duration (negative, NaN or overflowing) yields `max`.
fn next_delay(delay: Duration, multiplier: f64, max: Duration) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier)
        .unwrap_or(max)
        .min(max)
}

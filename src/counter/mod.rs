//! Unique-visitor counting engine.
//!
//! [`UniqueCounter`] ties the sketch, the versioned store contract, the
//! shard router, and the retry controller together behind the three
//! operations the host system calls:
//! - `record_unique_event`: best-effort CAS write of one event
//! - `range_estimate`: per-day unique estimates summed over a day range
//! - `all_time_estimate`: one estimate over the merged lifetime bucket

mod aggregate;
mod router;

pub use router::{ShardPolicy, ShardRouter};

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::bucket::{day_range, Bucket};
use crate::config::CounterConfig;
use crate::error::{CounterError, Result};
use crate::retry::{run_cas, CasOutcome, RetryPolicy};
use crate::sketch::Sketch;
use crate::store::{decode_record, encode_record, sketch_key, ExpectedVersion, SketchStore};

use aggregate::merged_bucket_sketch;

/// Day buckets aggregated concurrently during a range query; each day in
/// flight fans out `shards` reads of its own.
const DAY_FAN_OUT: usize = 4;

/// Sharded HLL counter over an injected store client.
pub struct UniqueCounter {
    store: Arc<dyn SketchStore>,
    config: CounterConfig,
    router: ShardRouter,
    retry: RetryPolicy,
}

impl UniqueCounter {
    /// Build an engine over an explicit store client. The store is the only
    /// shared mutable resource; the engine itself keeps no mutable state.
    pub fn new(store: Arc<dyn SketchStore>, config: CounterConfig) -> Result<Self> {
        config.validate()?;
        let router = ShardRouter::new(config.shards, ShardPolicy::Random);
        let retry = RetryPolicy {
            max_attempts: config.max_retries,
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        };
        Ok(Self {
            store,
            config,
            router,
            retry,
        })
    }

    /// Replace the shard policy. Tests pin writes to one shard to force
    /// contention; production keeps the random default.
    pub fn with_shard_policy(mut self, policy: ShardPolicy) -> Self {
        self.router = ShardRouter::new(self.config.shards, policy);
        self
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Record one event for `(metric, bucket)`.
    ///
    /// Best-effort: returns `false` on invalid input, store failure, or an
    /// exhausted retry budget under write contention. A dropped event costs
    /// estimate accuracy only, so no error ever escapes to the caller whose
    /// primary operation this write accompanies.
    pub async fn record_unique_event(&self, metric: &str, bucket: Bucket, element: &str) -> bool {
        if let Err(err) = validate_metric(metric) {
            warn!(metric, error = %err, "rejecting unique-event write");
            return false;
        }
        let bucket = match bucket.canonical() {
            Ok(bucket) => bucket,
            Err(err) => {
                warn!(metric, error = %err, "rejecting unique-event write");
                return false;
            }
        };
        match self.try_record(metric, bucket, element).await {
            Ok(()) => true,
            Err(err) => {
                warn!(metric, bucket = %bucket, error = %err, "unique-event write dropped");
                false
            }
        }
    }

    /// One full CAS round per attempt: pick a shard, read its record, fold
    /// the element into a copy, write back under the observed version. A
    /// conflicting writer forces a re-read because it may have landed on the
    /// same shard.
    async fn try_record(&self, metric: &str, bucket: Bucket, element: &str) -> Result<()> {
        let precision = self.config.precision;
        let store = Arc::clone(&self.store);
        let router = self.router.clone();
        run_cas(&self.retry, move |attempt| {
            let store = Arc::clone(&store);
            let router = router.clone();
            async move {
                let shard = router.pick();
                let key = sketch_key(metric, bucket, shard);
                let (mut sketch, expected) = match store.get(&key).await? {
                    Some(found) => (
                        decode_record(&found.value, precision).into_sketch_or_empty(precision),
                        ExpectedVersion::Exists(found.version),
                    ),
                    None => (Sketch::new(precision), ExpectedVersion::CreateOnly),
                };
                sketch.insert(element);
                let outcome = store.put(&key, encode_record(&sketch)?, expected).await?;
                if outcome.modified {
                    Ok(CasOutcome::Committed(()))
                } else {
                    debug!(key = %key, attempt, "version conflict, re-reading");
                    Ok(CasOutcome::Conflict)
                }
            }
        })
        .await
    }

    /// Sum of per-day unique estimates over `[start, end]` (inclusive UTC
    /// days, any timestamps within those days).
    ///
    /// Each day is merged across its shards and estimated independently; an
    /// identifier active on two days of the range counts twice. That is the
    /// intended daily-active-style semantics; the lifetime bucket serves
    /// true cross-day uniqueness.
    pub async fn range_estimate(&self, metric: &str, start: i64, end: i64) -> Result<f64> {
        validate_metric(metric)?;
        let days = day_range(start, end)?;
        let total = stream::iter(days)
            .map(|day| merged_bucket_sketch(&self.store, &self.config, metric, Bucket::Day(day)))
            .buffer_unordered(DAY_FAN_OUT)
            .fold(0.0, |total, day_sketch| async move {
                total + day_sketch.estimate()
            })
            .await;
        Ok(total)
    }

    /// Lifetime unique estimate: merge every shard of the `all` bucket, then
    /// estimate exactly once, so repeat visitors never double-count.
    pub async fn all_time_estimate(&self, metric: &str) -> Result<f64> {
        validate_metric(metric)?;
        let merged =
            merged_bucket_sketch(&self.store, &self.config, metric, Bucket::AllTime).await;
        Ok(merged.estimate())
    }
}

/// Metric names become key prefixes, so the charset excludes the key
/// delimiter `/` outright.
fn validate_metric(metric: &str) -> Result<()> {
    if metric.is_empty() {
        return Err(CounterError::InvalidInput(
            "metric name must not be empty".into(),
        ));
    }
    if !metric
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
    {
        return Err(CounterError::InvalidInput(format!(
            "metric name {:?} contains characters outside [A-Za-z0-9._-]",
            metric
        )));
    }
    Ok(())
}

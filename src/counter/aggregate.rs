//! Read-side aggregation.
//!
//! Fans out one get per (bucket, shard), substitutes empty sketches for
//! missing or unreadable records, and folds with the commutative merge so
//! completion order cannot affect the result. Per-shard failures degrade to
//! zero contribution; they never fail the whole query.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::bucket::Bucket;
use crate::config::CounterConfig;
use crate::sketch::Sketch;
use crate::store::{decode_record, sketch_key, DecodedSketch, SketchStore};

/// Read one shard record, degrading every failure mode to an empty sketch.
pub(crate) async fn read_shard_sketch(
    store: &Arc<dyn SketchStore>,
    key: &str,
    precision: u8,
) -> Sketch {
    match store.get(key).await {
        Ok(Some(found)) => match decode_record(&found.value, precision) {
            DecodedSketch::Current(sketch) | DecodedSketch::Legacy(sketch) => sketch,
            DecodedSketch::Unrecognized => {
                warn!(key, "unrecognized sketch record, counting as empty");
                Sketch::new(precision)
            }
        },
        Ok(None) => Sketch::new(precision),
        Err(err) => {
            warn!(key, error = %err, "shard read failed, counting as empty");
            Sketch::new(precision)
        }
    }
}

/// Merge all shards of one (metric, bucket) counter into a single sketch.
pub(crate) async fn merged_bucket_sketch(
    store: &Arc<dyn SketchStore>,
    config: &CounterConfig,
    metric: &str,
    bucket: Bucket,
) -> Sketch {
    let precision = config.precision;
    stream::iter(0..config.shards)
        .map(|shard| {
            let key = sketch_key(metric, bucket, shard);
            let store = Arc::clone(store);
            async move { read_shard_sketch(&store, &key, precision).await }
        })
        .buffer_unordered(config.read_concurrency)
        .fold(Sketch::new(precision), |merged, shard_sketch| async move {
            merged.merge(&shard_sketch)
        })
        .await
}

//! Persisted sketch records.
//!
//! Wire format is JSON with an explicit format discriminator. Reads classify
//! blobs into `Current`, `Legacy` (bare register array written before the
//! discriminator existed), or `Unrecognized`. Unrecognized and mis-shaped
//! records reset to an empty sketch at the call site instead of erroring, so
//! a corrupt shard can only under-count.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::sketch::Sketch;

/// Discriminated wire record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "format")]
enum SketchRecord {
    #[serde(rename = "hll-v1")]
    HllV1 { precision: u8, registers: Vec<u8> },
}

/// Classification of a stored blob against the configured shape.
#[derive(Debug)]
pub enum DecodedSketch {
    /// Current tagged format, shape matches the running configuration.
    Current(Sketch),
    /// Pre-discriminator bare register array, shape matches configuration.
    Legacy(Sketch),
    /// Anything else; contributes an empty sketch.
    Unrecognized,
}

impl DecodedSketch {
    /// Collapse to a sketch, substituting an empty one for unrecognized
    /// blobs.
    pub fn into_sketch_or_empty(self, precision: u8) -> Sketch {
        match self {
            DecodedSketch::Current(sketch) | DecodedSketch::Legacy(sketch) => sketch,
            DecodedSketch::Unrecognized => Sketch::new(precision),
        }
    }
}

/// Serialize a sketch in the current record format.
pub fn encode_record(sketch: &Sketch) -> Result<Bytes> {
    let record = SketchRecord::HllV1 {
        precision: sketch.precision(),
        registers: sketch.registers().to_vec(),
    };
    Ok(Bytes::from(serde_json::to_vec(&record)?))
}

/// Classify a stored blob. `precision` is the configured deployment shape;
/// records written under any other shape are reset rather than surfaced.
pub fn decode_record(bytes: &[u8], precision: u8) -> DecodedSketch {
    if let Ok(SketchRecord::HllV1 {
        precision: stored,
        registers,
    }) = serde_json::from_slice::<SketchRecord>(bytes)
    {
        if stored == precision {
            if let Some(sketch) = Sketch::from_parts(stored, registers) {
                return DecodedSketch::Current(sketch);
            }
        }
        warn!(
            stored_precision = stored,
            configured_precision = precision,
            "sketch record shape mismatch, resetting to empty"
        );
        return DecodedSketch::Unrecognized;
    }

    // Records written before the discriminator were a bare register array.
    if let Ok(registers) = serde_json::from_slice::<Vec<u8>>(bytes) {
        if let Some(sketch) = Sketch::from_parts(precision, registers) {
            return DecodedSketch::Legacy(sketch);
        }
    }

    DecodedSketch::Unrecognized
}

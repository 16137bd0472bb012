//! Slot-addressed view of the extracted tile pool

use crate::analysis::extraction::{DUPLICATE_ID_REASON, TileFailure, TileId, TileRecord};
use crate::color::distance::ColorSample;
use std::collections::HashMap;
use std::sync::Arc;

/// Extracted tiles addressed by dense slot numbers
///
/// Assignment works on slots and contiguous color samples; the id map is only
/// consulted at the edges.
#[derive(Debug, Default)]
pub struct TileIndex {
    records: Vec<Arc<TileRecord>>,
    samples: Vec<ColorSample>,
    slots: HashMap<TileId, usize>,
}

impl TileIndex {
    /// Index `records` in order
    ///
    /// A record whose id was already indexed is rejected and reported as a
    /// failure. `on_record` runs after every record with the number processed.
    pub fn build<F>(records: Vec<TileRecord>, mut on_record: F) -> (Self, Vec<TileFailure>)
    where
        F: FnMut(usize),
    {
        let mut index = Self {
            records: Vec::with_capacity(records.len()),
            samples: Vec::with_capacity(records.len()),
            slots: HashMap::with_capacity(records.len()),
        };
        let mut duplicates = Vec::new();

        for (processed, record) in records.into_iter().enumerate() {
            if index.slots.contains_key(&record.id) {
                duplicates.push(TileFailure {
                    tile_id: record.id,
                    filename: record.filename,
                    reason: DUPLICATE_ID_REASON.to_string(),
                });
            } else {
                index.slots.insert(record.id, index.records.len());
                index.samples.push(record.average);
                index.records.push(Arc::new(record));
            }
            on_record(processed + 1);
        }

        (index, duplicates)
    }

    /// Number of indexed tiles
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Average colors indexed by slot
    pub fn samples(&self) -> &[ColorSample] {
        &self.samples
    }

    /// Record in `slot`
    pub fn record(&self, slot: usize) -> Option<&Arc<TileRecord>> {
        self.records.get(slot)
    }

    /// All records indexed by slot
    pub fn records(&self) -> &[Arc<TileRecord>] {
        &self.records
    }

    /// Slot holding `id`
    pub fn slot_of(&self, id: TileId) -> Option<usize> {
        self.slots.get(&id).copied()
    }
}

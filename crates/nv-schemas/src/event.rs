use crate::record::Record;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A `Record` tagged with an ingestion timestamp and source chart, carrying
/// the total order defined in spec §3:
/// `(timestamp, chart_id, bar_index, variant_discriminator)`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedEvent {
    pub record: Record,
    pub ingested_at: DateTime<Utc>,
}

impl UnifiedEvent {
    pub fn new(record: Record, ingested_at: DateTime<Utc>) -> Self {
        Self {
            record,
            ingested_at,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.record.header.symbol
    }

    pub fn chart_id(&self) -> i32 {
        self.record.header.chart_id
    }

    pub fn bar_index(&self) -> i64 {
        self.record.header.bar_index
    }

    pub fn event_timestamp(&self) -> DateTime<Utc> {
        self.record.header.timestamp()
    }

    fn order_key(&self) -> (DateTime<Utc>, i32, i64, u8) {
        (
            self.event_timestamp(),
            self.chart_id(),
            self.bar_index(),
            self.record.payload.discriminant_ordinal(),
        )
    }
}

impl Eq for UnifiedEvent {}

impl PartialOrd for UnifiedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnifiedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

//! Bulk corpus loading against the vector-store service
//!
//! Not part of the chat path: batches are uploaded through a bounded worker
//! pool and each batch retries independently, which the synchronous chat
//! pipeline never does. A settle delay at the end gives the service time to
//! flush its index before searches resume.

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use futures::StreamExt;
use tracing::info;
use tracing::warn;

use crate::config::IngestConfig;
use crate::errors::Result;
use crate::retrieval::UploadRecord;
use crate::retrieval::VectorServiceClient;

/// Outcome of a bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub batches_total: usize,
    pub batches_failed: usize,
    pub records_uploaded: usize,
}

/// Batched, concurrency-bounded uploader.
pub struct CorpusLoader {
    client: Arc<VectorServiceClient>,
    batch_size: usize,
    workers: usize,
    settle_delay: Duration,
    max_batch_retries: u32,
}

impl CorpusLoader {
    #[must_use]
    pub fn new(client: Arc<VectorServiceClient>, config: &IngestConfig) -> Self {
        Self {
            client,
            batch_size: config.batch_size.max(1),
            workers: config.workers.max(1),
            settle_delay: Duration::from_secs(config.settle_delay_secs),
            max_batch_retries: config.max_batch_retries,
        }
    }

    /// Upload all records in fixed-size batches over the worker pool, then
    /// wait out the settle delay. Failed batches are counted, not fatal.
    pub async fn load(&self, records: Vec<UploadRecord>) -> Result<IngestSummary> {
        let batches: Vec<Vec<UploadRecord>> = records
            .chunks(self.batch_size)
            .map(<[UploadRecord]>::to_vec)
            .collect();
        let batches_total = batches.len();
        info!(
            "ingesting {} records in {} batches ({} workers)",
            batches.iter().map(Vec::len).sum::<usize>(),
            batches_total,
            self.workers
        );

        let results: Vec<std::result::Result<usize, usize>> = stream::iter(batches)
            .map(|batch| self.upload_with_retry(batch))
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let records_uploaded: usize = results
            .iter()
            .filter_map(|r| r.as_ref().ok().copied())
            .sum();
        let batches_failed = results.iter().filter(|r| r.is_err()).count();

        if self.settle_delay > Duration::ZERO {
            // Let the service flush before searches hit the new data
            tokio::time::sleep(self.settle_delay).await;
        }

        Ok(IngestSummary {
            batches_total,
            batches_failed,
            records_uploaded,
        })
    }

    /// Upload one batch with bounded retry; returns the record count on
    /// success, the record count lost on exhaustion.
    async fn upload_with_retry(
        &self,
        batch: Vec<UploadRecord>,
    ) -> std::result::Result<usize, usize> {
        let size = batch.len();
        for attempt in 0..=self.max_batch_retries {
            match self.client.upload_documents(&batch).await {
                Ok(()) => return Ok(size),
                Err(e) => {
                    warn!(
                        "batch upload attempt {} of {} failed: {}",
                        attempt + 1,
                        self.max_batch_retries + 1,
                        e
                    );
                }
            }
        }
        Err(size)
    }
}

/// Built-in seed corpus for a fresh development database.
#[must_use]
pub fn sample_records() -> Vec<UploadRecord> {
    let entries = [
        (
            "Network security is the practice of protecting networked systems \
             and their data from attack, damage, and unauthorized access.",
            "definition of network security",
        ),
        (
            "A firewall is a network security system that monitors and controls \
             incoming and outgoing traffic according to configured rules.",
            "definition of a firewall",
        ),
        (
            "An intrusion detection system inspects traffic and host activity \
             for signatures and anomalies that indicate an attack in progress.",
            "definition of an IDS",
        ),
        (
            "Defense in depth layers independent controls so that the failure \
             of any single control does not compromise the whole system.",
            "defense in depth",
        ),
    ];

    entries
        .iter()
        .map(|(content, description)| {
            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "description".to_string(),
                serde_json::Value::String((*description).to_string()),
            );
            UploadRecord {
                content: (*content).to_string(),
                metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_records_have_content_and_metadata() {
        let records = sample_records();
        assert_eq!(records.len(), 4);
        for record in &records {
            assert!(!record.content.is_empty());
            assert!(record.metadata.contains_key("description"));
        }
    }
}

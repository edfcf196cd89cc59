//! Import file parser.
//!
//! Streams an uploaded CSV from the object store, turns every row into a
//! queue message, sends them in batches, and archives the file once every
//! batch has been accepted.
//!
//! ```text
//! uploaded/x.csv --parse--> records --batch--> [<=10][<=10][..] --send all-->
//!                                                                  |
//!                                        move uploaded/x.csv -> parsed/x.csv
//! ```
//!
//! If any send fails the file stays under the upload prefix, so a later run
//! picks it up again. That run may resend rows the first run already queued.

mod batch;
mod csv;
mod handler;
mod record;

pub use batch::batch_messages;
pub use csv::parse_records;
pub use handler::ImportNotificationHandler;
pub use record::ImportRecord;

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::ImportConfig;
use crate::object_store::{move_object, ObjectCreatedEvent, ObjectStore, ObjectStoreError};
use crate::queue::{MessageQueue, QueueError};

/// Errors that can occur while importing one file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to parse {key}: {source}")]
    Parse {
        key: String,
        #[source]
        source: csv_async::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ImportError {
    /// Whether running the import again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ImportError::Parse { .. } | ImportError::Encode(_) => false,
            ImportError::ObjectStore(ObjectStoreError::NotFound { .. }) => false,
            ImportError::ObjectStore(_) => true,
            ImportError::Queue(QueueError::InvalidBatch(_)) => false,
            ImportError::Queue(_) => true,
        }
    }
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Why an object was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OtherBucket,
    UnsupportedExtension,
    OutsideUploadPrefix,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OtherBucket => write!(f, "not the import bucket"),
            SkipReason::UnsupportedExtension => write!(f, "unsupported file extension"),
            SkipReason::OutsideUploadPrefix => write!(f, "outside the upload prefix"),
        }
    }
}

/// Result of importing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub records: usize,
    pub batches: usize,
    pub archived_to: String,
}

/// What happened to one object of an event.
#[derive(Debug)]
pub enum FileOutcome {
    Imported { key: String, summary: ImportSummary },
    Skipped { key: String, reason: SkipReason },
    Failed { key: String, error: ImportError },
}

impl FileOutcome {
    pub fn key(&self) -> &str {
        match self {
            FileOutcome::Imported { key, .. }
            | FileOutcome::Skipped { key, .. }
            | FileOutcome::Failed { key, .. } => key,
        }
    }
}

/// Outcomes of one event, in record order.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub outcomes: Vec<FileOutcome>,
}

impl ImportReport {
    pub fn imported(&self) -> impl Iterator<Item = (&str, &ImportSummary)> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Imported { key, summary } => Some((key.as_str(), summary)),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ImportError)> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Failed { key, error } => Some((key.as_str(), error)),
            _ => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
            .count()
    }

    /// True if some file failed in a way a retry could fix.
    pub fn has_retryable_failure(&self) -> bool {
        self.failures().any(|(_, e)| e.is_retryable())
    }
}

/// Turns uploaded CSV files into queue messages.
pub struct ImportFileParser {
    config: ImportConfig,
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn MessageQueue>,
}

impl ImportFileParser {
    pub fn new(
        config: ImportConfig,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
        }
    }

    /// Import every object the event names. One file failing never stops the
    /// others.
    #[instrument(skip_all, fields(objects = event.records.len()))]
    pub async fn handle_event(&self, event: &ObjectCreatedEvent) -> ImportReport {
        let mut report = ImportReport::default();

        for record in &event.records {
            let bucket = &record.s3.bucket.name;
            let key = record.s3.object.decoded_key();

            if let Some(reason) = self.skip_reason(bucket, &key) {
                warn!(bucket = %bucket, key = %key, %reason, "Skipping object");
                report.outcomes.push(FileOutcome::Skipped { key, reason });
                continue;
            }

            match self.import_object(bucket, &key).await {
                Ok(summary) => report.outcomes.push(FileOutcome::Imported { key, summary }),
                Err(error) => {
                    error!(
                        bucket = %bucket,
                        key = %key,
                        error = %error,
                        retryable = error.is_retryable(),
                        "Import failed"
                    );
                    report.outcomes.push(FileOutcome::Failed { key, error });
                }
            }
        }

        report
    }

    /// Parse, enqueue, and archive one object.
    #[instrument(skip(self))]
    pub async fn import_object(&self, bucket: &str, key: &str) -> Result<ImportSummary> {
        let reader = self.store.open(bucket, key).await?;
        let records = parse_records(reader)
            .await
            .map_err(|source| ImportError::Parse {
                key: key.to_string(),
                source,
            })?;
        info!(records = records.len(), "Parsed file");

        let batches = batch_messages(&records)?;
        let batch_count = batches.len();
        try_join_all(batches.into_iter().map(|batch| self.queue.send_batch(batch))).await?;
        info!(batches = batch_count, "Queued records");

        let archived_to = self.archive_key(key);
        move_object(self.store.as_ref(), bucket, key, &archived_to).await?;

        Ok(ImportSummary {
            records: records.len(),
            batches: batch_count,
            archived_to,
        })
    }

    /// Where a processed upload is moved: the upload prefix swapped for the
    /// parsed prefix.
    pub fn archive_key(&self, key: &str) -> String {
        match key.strip_prefix(&self.config.upload_prefix) {
            Some(rest) => format!("{}{}", self.config.parsed_prefix, rest),
            None => format!("{}{}", self.config.parsed_prefix, key),
        }
    }

    fn skip_reason(&self, bucket: &str, key: &str) -> Option<SkipReason> {
        if !self.config.bucket.is_empty() && bucket != self.config.bucket {
            return Some(SkipReason::OtherBucket);
        }
        if !key.ends_with(&self.config.extension) {
            return Some(SkipReason::UnsupportedExtension);
        }
        if !key.starts_with(&self.config.upload_prefix) {
            return Some(SkipReason::OutsideUploadPrefix);
        }
        None
    }
}

//! Transfer lifecycle: create a staging request, poll it to `READY`,
//! invoke the transfer backend and push the outcome back to the
//! Repository Service.
//!
//! Polling is a bounded local loop. The remote status is the only state
//! the controller trusts; it checks monotonicity on every observation
//! and gives up after `PollPolicy::max_attempts` rounds or when the
//! cancellation channel fires.

pub mod backend;

pub use backend::{HttpTransferBackend, TransferBackend};

use crate::api::{IngestProgress, RepositoryClient, TransferKind, TransferRequest, TransferStatus};
use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How long and how often to poll a transfer request
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// 5 s between polls, 120 attempts (10 minutes)
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

/// Drives one transfer request through its remote state machine
pub struct TransferController {
    client: Arc<RepositoryClient>,
    backend: Arc<dyn TransferBackend>,
    poll: PollPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl TransferController {
    pub fn new(client: Arc<RepositoryClient>, backend: Arc<dyn TransferBackend>) -> Self {
        Self {
            client,
            backend,
            poll: PollPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Attach a cancellation channel; sending `true` aborts the next
    /// poll round with [`CliError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Full ingest transfer: create the request, wait for the staging
    /// area, upload, and report the outcome back to the service.
    pub async fn run_ingest(
        &self,
        object_id: &str,
        access_point: &str,
        group: &str,
        source_dir: &Path,
    ) -> Result<usize> {
        let request = self
            .client
            .create_transfer(TransferKind::Ingest, object_id, access_point, group)
            .await?;
        info!(id = request.id, object_id = %object_id, "Ingest request created");

        let ready = self.await_ready(TransferKind::Ingest, request.id).await?;
        let staging_url = ready
            .staging_url
            .ok_or_else(|| CliError::api("READY ingest request has no staging URL"))?;

        self.client
            .update_ingest_status(request.id, IngestProgress::PreIngestRunning)
            .await?;

        match self.backend.upload(source_dir, &staging_url).await {
            Ok(files) => {
                self.client
                    .update_ingest_status(request.id, IngestProgress::PreIngestFinished)
                    .await?;
                info!(id = request.id, files, "Ingest transfer finished");
                Ok(files)
            }
            Err(err) => {
                // The remote bookkeeping must learn about the failure
                // even though the upload error is what we report.
                if let Err(push) = self
                    .client
                    .update_ingest_status(request.id, IngestProgress::PreIngestFailed)
                    .await
                {
                    warn!(id = request.id, error = %push, "Could not report failed ingest");
                }
                Err(err)
            }
        }
    }

    /// Full download transfer: create the request, wait for the staging
    /// area and fetch it into `target_dir`.
    pub async fn run_download(
        &self,
        object_id: &str,
        access_point: &str,
        group: &str,
        target_dir: &Path,
    ) -> Result<PathBuf> {
        let request = self
            .client
            .create_transfer(TransferKind::Download, object_id, access_point, group)
            .await?;
        info!(id = request.id, object_id = %object_id, "Download request created");

        let ready = self.await_ready(TransferKind::Download, request.id).await?;
        let staging_url = ready
            .staging_url
            .ok_or_else(|| CliError::api("READY download request has no staging URL"))?;

        self.backend.download(&staging_url, target_dir).await
    }

    /// Poll the request until it reaches `READY`.
    ///
    /// Fails fast on any non-`READY` terminal status, on a status that
    /// moves backwards along the happy path, on cancellation, and with
    /// [`CliError::DeadlineExceeded`] once the attempt budget is spent.
    pub async fn await_ready(&self, kind: TransferKind, id: i64) -> Result<TransferRequest> {
        let mut cancel = self.cancel.clone();
        let mut last_rank: Option<u8> = None;

        for attempt in 1..=self.poll.max_attempts {
            if let Some(rx) = &cancel {
                if *rx.borrow() {
                    return Err(CliError::Cancelled);
                }
            }

            let request = self.client.get_transfer(kind, id).await?;
            let status = request.status();
            debug!(%kind, id, attempt, status = %status, "Polled transfer request");

            if let Some(rank) = status.happy_path_rank() {
                if last_rank.is_some_and(|last| rank < last) {
                    return Err(CliError::api(format!(
                        "{} request {} moved backwards to {}",
                        kind, id, status
                    )));
                }
                last_rank = Some(rank);
            }

            if status == TransferStatus::Ready {
                return Ok(request);
            }
            if status.is_failure() {
                return Err(CliError::TransferPreparation { status });
            }

            // The budget is spent; no point sleeping before giving up.
            if attempt == self.poll.max_attempts {
                break;
            }

            let mut sender_gone = false;
            match &mut cancel {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll.interval) => {}
                        changed = rx.changed() => {
                            if changed.is_ok() {
                                if *rx.borrow() {
                                    return Err(CliError::Cancelled);
                                }
                            } else {
                                sender_gone = true;
                            }
                        }
                    }
                }
                None => tokio::time::sleep(self.poll.interval).await,
            }
            // A dropped sender resolves `changed()` immediately forever;
            // fall back to plain sleeping so the loop keeps its pace.
            if sender_gone {
                cancel = None;
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        Err(CliError::DeadlineExceeded {
            attempts: self.poll.max_attempts,
        })
    }
}

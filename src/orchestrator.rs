//! Runs every configured source concurrently and gathers their outcomes.

use crate::crawl::{CrawlCoordinator, SourceError, SourceReport};
use crate::feed::PersistError;
use crate::model::SourceConfig;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// A recoverable failure attributed to the source it happened in.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{name}: {error}")]
    Source {
        name: String,
        #[source]
        error: SourceError,
    },
    #[error("source task failed: {0}")]
    Task(String),
}

/// Outcome of a run in which no artifact failed to persist.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<SourceReport>,
    /// Reported, never retried; one source failing does not affect the others.
    pub errors: Vec<RunError>,
}

pub struct Orchestrator {
    coordinator: Arc<CrawlCoordinator>,
    sources: Vec<SourceConfig>,
}

impl Orchestrator {
    pub fn new(coordinator: CrawlCoordinator, sources: Vec<SourceConfig>) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            sources,
        }
    }

    /// Crawls all sources concurrently and waits for every one to finish.
    ///
    /// Recoverable source errors are collected through the error channel and
    /// returned in the summary. A [`PersistError`] bypasses the channel: the
    /// remaining sources are aborted and the error is returned immediately.
    pub async fn run(&self) -> Result<RunSummary, PersistError> {
        let (error_tx, mut error_rx) = mpsc::channel::<RunError>(self.sources.len().max(1));
        let mut tasks = JoinSet::new();

        for source in self.sources.iter().cloned() {
            let coordinator = Arc::clone(&self.coordinator);
            let error_tx = error_tx.clone();
            tasks.spawn(async move {
                match coordinator.run(&source).await {
                    Ok(report) => Ok(Some(report)),
                    Err(SourceError::Persist(e)) => Err(e),
                    Err(error) => {
                        tracing::error!(source = %source.name, error = %error, "Source failed");
                        let failure = RunError::Source {
                            name: source.name.clone(),
                            error,
                        };
                        if let Err(e) = error_tx.send(failure).await {
                            tracing::warn!(error = %e, "Error channel closed before report");
                        }
                        Ok(None)
                    }
                }
            });
        }
        drop(error_tx);

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some(report))) => summary.reports.push(report),
                Ok(Ok(None)) => {}
                Ok(Err(persist)) => {
                    tracing::error!(error = %persist, "Failed to place output, aborting run");
                    tasks.abort_all();
                    return Err(persist);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Source task failed");
                    summary.errors.push(RunError::Task(e.to_string()));
                }
            }
        }

        // Every sender is gone once all tasks have finished.
        while let Some(error) = error_rx.recv().await {
            summary.errors.push(error);
        }

        summary.reports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summary)
    }
}

use crate::model::DownEvent;
use crate::notify::Notifier;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

/// Run-scoped down reporter.
///
/// Each identifier is reported at most once per instance. Messages are
/// handed to a single worker task which publishes them on the notifier, so
/// a slow or failing channel never blocks or fails a check.
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    reported: Mutex<HashSet<String>>,
    events: Mutex<Vec<DownEvent>>,
    tx: tokio::sync::Mutex<Option<mpsc::Sender<String>>>,
    handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Reporter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_capacity(notifier, 1024)
    }

    /// `capacity` bounds the queued messages; further reports while it is
    /// full are logged but not delivered.
    pub fn with_capacity(notifier: Arc<dyn Notifier>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(err) = notifier.publish(&message).await {
                    error!(channel = notifier.name(), error = %err, "failed to deliver notification");
                }
            }
        });

        Self {
            inner: Arc::new(ReporterInner {
                reported: Mutex::new(HashSet::new()),
                events: Mutex::new(Vec::new()),
                tx: tokio::sync::Mutex::new(Some(tx)),
                handle: tokio::sync::Mutex::new(Some(handle)),
            }),
        }
    }

    /// Returns `true` when this call emitted the report.
    pub async fn report_down(&self, identifier: &str, reason: impl Display) -> bool {
        let event = DownEvent {
            identifier: identifier.to_string(),
            reason: reason.to_string().trim().to_string(),
        };

        {
            let mut reported = lock(&self.inner.reported);
            if !reported.insert(event.identifier.clone()) {
                return false;
            }
        }

        let message = event.message();
        warn!("{message}");
        lock(&self.inner.events).push(event);

        let tx = self.inner.tx.lock().await.clone();
        match tx {
            Some(tx) => match tx.try_send(message) {
                Ok(()) => {}
                Err(TrySendError::Full(message)) => {
                    error!(%message, "notification queue full; notification dropped")
                }
                Err(TrySendError::Closed(message)) => {
                    error!(%message, "notification worker not available")
                }
            },
            None => error!(%message, "reporter already shut down; notification dropped"),
        }
        true
    }

    pub fn is_reported(&self, identifier: &str) -> bool {
        lock(&self.inner.reported).contains(identifier)
    }

    pub fn events(&self) -> Vec<DownEvent> {
        lock(&self.inner.events).clone()
    }

    /// Waits until every queued message has been attempted.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.inner.tx.lock().await.take();

        if let Some(handle) = self.inner.handle.lock().await.take() {
            handle
                .await
                .map_err(|err| anyhow::anyhow!("failed to join notification worker: {err}"))?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

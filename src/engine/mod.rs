pub mod checker;
pub mod greeting;
pub mod resolve;
pub mod tls;

use crate::model::{CheckConfig, DownReason, HostReport, RunSummary};
use crate::notify::Notifier;
use crate::report::Reporter;
use crate::util::now_millis;
use checker::AddressChecker;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use resolve::{Resolver, SystemResolver};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tls::TlsConnector;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

pub struct Monitor {
    cfg: Arc<CheckConfig>,
    tls: TlsConnector,
    resolver: Arc<dyn Resolver>,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(cfg: CheckConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        if cfg.greeting.is_empty() {
            anyhow::bail!("expected greeting must not be empty");
        }
        Ok(Self {
            tls: TlsConnector::new(cfg.check_certificates)?,
            cfg: Arc::new(cfg),
            resolver: Arc::new(SystemResolver),
            notifier,
        })
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// One scheduled run with its own reporter. Liveliness failures are part
    /// of the summary, never an `Err`.
    #[instrument(skip(self), fields(host = %self.cfg.hostname, port = self.cfg.port))]
    pub async fn run_once(&self) -> anyhow::Result<RunSummary> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = now_millis();
        let reporter = Reporter::new(self.notifier.clone());

        let report = self.check_host(&reporter).await;
        reporter.shutdown().await?;

        let summary = RunSummary {
            hostname: self.cfg.hostname.clone(),
            port: self.cfg.port,
            started_at,
            elapsed_ms: now_millis() - start,
            attempted: report.attempted,
            outcomes: report.outcomes,
            down: reporter.events(),
        };
        info!(
            attempted = summary.attempted.len(),
            down = summary.down.len(),
            ms = summary.elapsed_ms,
            "run finished"
        );
        Ok(summary)
    }

    /// Runs every `period` until `shutdown` resolves, also while a run is in
    /// progress. Returns the number of completed runs.
    pub async fn run_every<S, F>(
        &self,
        period: Duration,
        shutdown: S,
        mut on_summary: F,
    ) -> usize
    where
        S: Future,
        F: FnMut(RunSummary),
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut completed = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }

            tokio::select! {
                result = self.run_once() => {
                    completed += 1;
                    match result {
                        Ok(summary) => on_summary(summary),
                        Err(err) => error!(error = %err, "run failed"),
                    }
                }
                _ = &mut shutdown => {
                    warn!("run cancelled by shutdown");
                    break;
                }
            }
        }
        completed
    }

    /// Resolves the hostname and checks every address concurrently.
    pub async fn check_host(&self, reporter: &Reporter) -> HostReport {
        let addrs = match self.resolver.resolve_ipv4(&self.cfg.hostname).await {
            Ok(addrs) if addrs.is_empty() => {
                reporter
                    .report_down(&self.cfg.hostname, DownReason::Dns("no addresses".into()))
                    .await;
                return HostReport::default();
            }
            Ok(addrs) => addrs,
            Err(err) => {
                reporter
                    .report_down(&self.cfg.hostname, DownReason::Dns(err.code))
                    .await;
                return HostReport::default();
            }
        };
        debug!(host = %self.cfg.hostname, count = addrs.len(), "resolved addresses");

        let mut tasks = FuturesUnordered::new();
        for addr in addrs.iter().copied() {
            let checker =
                AddressChecker::new(addr, self.cfg.clone(), self.tls.clone(), reporter.clone());
            tasks.push(tokio::spawn(checker.run()));
        }

        let mut outcomes = Vec::with_capacity(addrs.len());
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => error!(error = %err, "address check task failed"),
            }
        }

        HostReport {
            attempted: addrs,
            outcomes,
        }
    }
}

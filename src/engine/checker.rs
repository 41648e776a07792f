use crate::model::{AddressOutcome, CheckConfig, CheckState, DownReason};
use crate::report::Reporter;
use crate::util::{now_millis, sanitize_text};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info};

use super::greeting::{Feed, GreetingMatcher};
use super::tls::TlsConnector;

const READ_CHUNK: usize = 512;

/// Drives one address through connect, handshake and greeting wait.
pub struct AddressChecker {
    address: IpAddr,
    cfg: Arc<CheckConfig>,
    tls: TlsConnector,
    reporter: Reporter,
    state: CheckState,
}

impl AddressChecker {
    pub fn new(
        address: IpAddr,
        cfg: Arc<CheckConfig>,
        tls: TlsConnector,
        reporter: Reporter,
    ) -> Self {
        Self {
            address,
            cfg,
            tls,
            reporter,
            state: CheckState::Connecting,
        }
    }

    pub async fn run(mut self) -> AddressOutcome {
        let start = now_millis();
        let result = self.drive().await;

        let reason = match result {
            Ok(()) => None,
            Err(reason) => {
                debug!(address = %self.address, stage = %self.state, %reason, "check failed");
                self.state = CheckState::Down;
                self.reporter
                    .report_down(&self.address.to_string(), &reason)
                    .await;
                Some(reason.to_string())
            }
        };

        AddressOutcome {
            address: self.address,
            state: self.state,
            reason,
            elapsed_ms: now_millis() - start,
        }
    }

    /// `Ok` only once the greeting has been confirmed. Every error path
    /// drops the socket without a TLS close.
    ///
    /// Connect and handshake share one deadline; after that each read is
    /// bounded by the same length of inactivity.
    async fn drive(&mut self) -> Result<(), DownReason> {
        let wait = self.cfg.timeout;
        let deadline = Instant::now() + wait;
        let target = SocketAddr::new(self.address, self.cfg.port);

        self.state = CheckState::Connecting;
        let stream = match timeout_at(deadline, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(DownReason::Connect(err.to_string())),
            Err(_) => return Err(DownReason::Timeout),
        };

        self.state = CheckState::TlsHandshaking;
        let handshake = self.tls.handshake(&self.cfg.hostname, stream);
        let mut tls_stream = match timeout_at(deadline, handshake).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(DownReason::Tls(format!("{err:#}"))),
            Err(_) => return Err(DownReason::Timeout),
        };

        self.state = CheckState::AwaitingGreeting;
        let mut matcher = GreetingMatcher::new(self.cfg.greeting.clone());
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = match timeout(wait, tls_stream.read(&mut buf)).await {
                Ok(Ok(0)) => return Err(DownReason::GreetingNotFound),
                Ok(Ok(n)) => n,
                Ok(Err(err)) => return Err(DownReason::Tls(err.to_string())),
                Err(_) => return Err(DownReason::Timeout),
            };

            match matcher.feed(&buf[..n]) {
                Feed::Matched => break,
                Feed::Mismatched => {
                    debug!(
                        address = %self.address,
                        received = %sanitize_text(matcher.received()),
                        "greeting mismatch"
                    );
                    return Err(DownReason::UnexpectedGreeting);
                }
                Feed::Pending | Feed::Ignored => continue,
            }
        }

        self.state = CheckState::Matched;
        if self.cfg.verbose {
            info!(address = %self.address, host = %self.cfg.hostname, "greeting confirmed");
        } else {
            debug!(address = %self.address, "greeting confirmed");
        }

        // The verdict is final; a failing close is not a down event.
        if let Err(err) = timeout(wait, tls_stream.shutdown()).await.unwrap_or(Ok(())) {
            debug!(address = %self.address, error = %err, "TLS close after greeting failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use std::time::Duration;

    #[tokio::test]
    async fn refused_port_goes_down_once() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let cfg = Arc::new(CheckConfig {
            hostname: "localhost".into(),
            port,
            check_certificates: false,
            timeout: Duration::from_secs(1),
            greeting: b"NOTICE AUTH".to_vec(),
            verbose: false,
        });
        let reporter = Reporter::new(Arc::new(LogNotifier));
        let tls = TlsConnector::new(false).unwrap();
        let addr: IpAddr = "127.0.0.1".parse().unwrap();

        let outcome = AddressChecker::new(addr, cfg, tls, reporter.clone()).run().await;
        reporter.shutdown().await.unwrap();

        assert_eq!(outcome.state, CheckState::Down);
        assert!(outcome.reason.unwrap().starts_with("connection error"));
        assert!(reporter.is_reported("127.0.0.1"));
        assert_eq!(reporter.events().len(), 1);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub hostname: String,
    pub port: u16,
    /// Enforce chain and hostname verification during the TLS handshake.
    pub check_certificates: bool,
    /// Bounds the TCP connect, the TLS handshake and every read.
    pub timeout: Duration,
    pub greeting: Vec<u8>,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub check: CheckConfig,
    pub notify: NotifyConfig,
    pub interval: Option<Duration>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub url: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jsonl,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Per-address connection states. `Matched` and `Down` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Connecting,
    TlsHandshaking,
    AwaitingGreeting,
    Matched,
    Down,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckState::Connecting => "connecting",
            CheckState::TlsHandshaking => "tls_handshaking",
            CheckState::AwaitingGreeting => "awaiting_greeting",
            CheckState::Matched => "matched",
            CheckState::Down => "down",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownReason {
    Dns(String),
    Connect(String),
    Timeout,
    Tls(String),
    UnexpectedGreeting,
    GreetingNotFound,
}

impl fmt::Display for DownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownReason::Dns(code) => write!(f, "DNS error: {code}"),
            DownReason::Connect(msg) => write!(f, "connection error: {msg}"),
            DownReason::Timeout => write!(f, "timeout"),
            DownReason::Tls(msg) => write!(f, "TLS error: {msg}"),
            DownReason::UnexpectedGreeting => write!(f, "unexpected greeting"),
            DownReason::GreetingNotFound => write!(f, "greeting not found"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownEvent {
    pub identifier: String,
    pub reason: String,
}

impl DownEvent {
    pub fn message(&self) -> String {
        format!("{}: {}", self.identifier, self.reason)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressOutcome {
    pub address: IpAddr,
    pub state: CheckState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostReport {
    pub attempted: Vec<IpAddr>,
    pub outcomes: Vec<AddressOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub hostname: String,
    pub port: u16,
    pub started_at: String,
    pub elapsed_ms: u128,
    pub attempted: Vec<IpAddr>,
    pub outcomes: Vec<AddressOutcome>,
    pub down: Vec<DownEvent>,
}

impl RunSummary {
    pub fn is_healthy(&self) -> bool {
        self.down.is_empty()
    }
}

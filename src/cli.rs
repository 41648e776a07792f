use crate::model::{CheckConfig, Config, NotifyConfig, OutputConfig, OutputFormat};
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(author, version, about = "TLS greeting liveliness checker", long_about = None)]
pub struct Cli {
    /// Hostname to resolve and check
    #[arg(short = 'H', long = "host", env = "BANNER_WATCH_HOST", value_name = "HOST")]
    pub host: String,

    /// TLS port on every resolved address
    #[arg(short = 'p', long = "port", env = "BANNER_WATCH_PORT", default_value_t = 6697)]
    pub port: u16,

    /// Greeting the server must send first
    #[arg(short = 'g', long = "greeting", env = "BANNER_WATCH_GREETING", value_name = "TEXT")]
    pub greeting: String,

    /// Connect, handshake and idle timeout in milliseconds
    #[arg(long = "timeout", env = "BANNER_WATCH_TIMEOUT", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Skip certificate chain and hostname verification
    #[arg(long = "insecure", env = "BANNER_WATCH_INSECURE", action = ArgAction::SetTrue)]
    pub insecure: bool,

    /// Log confirmed greetings as well as failures
    #[arg(short = 'v', long = "verbose", env = "BANNER_WATCH_VERBOSE", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Webhook that receives down notifications
    #[arg(long = "notify-url", env = "BANNER_WATCH_NOTIFY_URL", value_name = "URL")]
    pub notify_url: Option<String>,

    /// Topic attached to every notification
    #[arg(long = "notify-topic", env = "BANNER_WATCH_NOTIFY_TOPIC", value_name = "TOPIC")]
    pub notify_topic: Option<String>,

    /// Repeat the check every N seconds instead of running once
    #[arg(long = "interval", env = "BANNER_WATCH_INTERVAL", value_name = "SECONDS")]
    pub interval_secs: Option<u64>,

    /// Run summary format
    #[arg(long = "output", default_value_t = Format::Jsonl)]
    pub output: Format,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Jsonl,
    Pretty,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Jsonl => write!(f, "jsonl"),
            Format::Pretty => write!(f, "pretty"),
        }
    }
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        let hostname = self.host.trim().to_string();
        if hostname.is_empty() {
            anyhow::bail!("--host must not be empty");
        }

        if self.port == 0 {
            anyhow::bail!("--port must be between 1 and 65535");
        }

        if self.greeting.is_empty() {
            anyhow::bail!("--greeting must not be empty");
        }

        if self.timeout_ms == 0 {
            anyhow::bail!("timeout must be greater than zero");
        }

        let interval = match self.interval_secs {
            Some(0) => anyhow::bail!("interval must be greater than zero"),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        if self.notify_topic.is_some() && self.notify_url.is_none() {
            anyhow::bail!("--notify-topic requires --notify-url");
        }

        Ok(Config {
            check: CheckConfig {
                hostname,
                port: self.port,
                check_certificates: !self.insecure,
                timeout: Duration::from_millis(self.timeout_ms),
                greeting: self.greeting.into_bytes(),
                verbose: self.verbose,
            },
            notify: NotifyConfig {
                url: self.notify_url,
                topic: self.notify_topic,
            },
            interval,
            output: OutputConfig {
                format: match self.output {
                    Format::Jsonl => OutputFormat::Jsonl,
                    Format::Pretty => OutputFormat::Pretty,
                },
            },
        })
    }
}

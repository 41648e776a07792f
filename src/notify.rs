use async_trait::async_trait;
use std::sync::Arc;

use crate::model::NotifyConfig;

/// Outbound channel for down messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, message: &str) -> anyhow::Result<()>;
}

/// Used when no channel is configured; the reporter's own log line is the
/// only record of the event.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, message: &str) -> anyhow::Result<()> {
        tracing::debug!(%message, "no notification channel configured");
        Ok(())
    }
}

#[cfg(feature = "webhook")]
pub use webhook::WebhookNotifier;

#[cfg(feature = "webhook")]
mod webhook {
    use super::Notifier;
    use anyhow::Context;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    pub struct WebhookNotifier {
        url: String,
        topic: Option<String>,
        client: reqwest::Client,
    }

    impl WebhookNotifier {
        pub fn new(url: String, topic: Option<String>) -> anyhow::Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .context("failed to build webhook client")?;
            Ok(Self { url, topic, client })
        }

        pub(super) fn payload(&self, message: &str) -> serde_json::Value {
            json!({
                "source": env!("CARGO_PKG_NAME"),
                "topic": self.topic,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })
        }
    }

    #[async_trait]
    impl Notifier for WebhookNotifier {
        fn name(&self) -> &'static str {
            "webhook"
        }

        async fn publish(&self, message: &str) -> anyhow::Result<()> {
            let response = self
                .client
                .post(&self.url)
                .json(&self.payload(message))
                .send()
                .await
                .with_context(|| format!("failed to reach webhook {}", self.url))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("webhook returned status {status}: {body}");
            }
            Ok(())
        }
    }
}

pub fn notifier_from_config(cfg: &NotifyConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match cfg.url.as_deref() {
        #[cfg(feature = "webhook")]
        Some(url) => Ok(Arc::new(WebhookNotifier::new(
            url.to_string(),
            cfg.topic.clone(),
        )?)),
        #[cfg(not(feature = "webhook"))]
        Some(_) => anyhow::bail!("a notification url needs the `webhook` feature"),
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_never_fails() {
        LogNotifier.publish("irc.example.net: timeout").await.unwrap();
    }

    #[test]
    fn defaults_to_log_channel() {
        let notifier = notifier_from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[cfg(feature = "webhook")]
    #[test]
    fn webhook_payload_carries_message_and_topic() {
        let notifier = WebhookNotifier::new(
            "http://127.0.0.1:9/hook".into(),
            Some("irc-alerts".into()),
        )
        .unwrap();
        let payload = notifier.payload("192.0.2.1: timeout");
        assert_eq!(payload["message"], "192.0.2.1: timeout");
        assert_eq!(payload["topic"], "irc-alerts");
        assert_eq!(payload["source"], "banner-watch");
    }

    #[cfg(feature = "webhook")]
    #[tokio::test]
    async fn webhook_reports_unreachable_endpoint() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = WebhookNotifier::new(format!("http://{addr}/hook"), None).unwrap();
        assert!(notifier.publish("x: timeout").await.is_err());
    }
}

use anyhow::Context;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use std::pin::Pin;
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

/// Client side TLS settings shared by every checker of a run.
#[derive(Clone)]
pub struct TlsConnector {
    connector: SslConnector,
    verify: bool,
}

impl TlsConnector {
    pub fn new(verify: bool) -> anyhow::Result<Self> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).context("failed to create TLS connector")?;
        if !verify {
            // Self-signed and internal endpoints: accept any certificate.
            builder.set_verify(SslVerifyMode::NONE);
        }
        Ok(Self {
            connector: builder.build(),
            verify,
        })
    }

    /// Runs the client handshake. `server_name` is used for SNI and, when
    /// verification is on, for hostname checks.
    pub async fn handshake(
        &self,
        server_name: &str,
        stream: TcpStream,
    ) -> anyhow::Result<SslStream<TcpStream>> {
        let ssl = self
            .connector
            .configure()
            .context("failed to configure TLS session")?
            .verify_hostname(self.verify)
            .into_ssl(server_name)
            .context("failed to configure TLS server name")?;
        let mut tls_stream =
            SslStream::new(ssl, stream).context("failed to initialize TLS stream")?;
        Pin::new(&mut tls_stream).connect().await?;
        Ok(tls_stream)
    }
}

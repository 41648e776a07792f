#![allow(dead_code)]

use async_trait::async_trait;
use banner_watch::engine::resolve::{ResolveError, Resolver};
use banner_watch::model::CheckConfig;
use banner_watch::notify::Notifier;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::ssl::{Ssl, SslAcceptor, SslMethod};
use openssl::x509::{X509NameBuilder, X509};
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_openssl::SslStream;

/// What the fake server does with each accepted connection.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// Complete the handshake, write the bytes, then keep the socket open.
    Send(&'static [u8]),
    /// Complete the handshake, write the bytes, then close with close_notify.
    SendAndClose(&'static [u8]),
    /// Complete the handshake, write the bytes, then drop the socket without
    /// close_notify.
    SendAndDrop(&'static [u8]),
    /// Complete the handshake, then write bytes that are not a TLS record.
    Garbage(&'static [u8]),
    /// Complete the handshake and stay silent.
    Silent,
    /// Accept TCP but never start TLS.
    NoHandshake,
    /// Drop the socket right after accept.
    CloseImmediately,
}

pub fn acceptor() -> SslAcceptor {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "irc.test").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pkey).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.build()
}

pub async fn spawn_server(listener: TcpListener, behavior: Behavior) {
    let acceptor = acceptor();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(serve(socket, acceptor, behavior));
        }
    });
}

/// Binds an ephemeral loopback port and serves `behavior` on it.
pub async fn start_server(behavior: Behavior) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    spawn_server(listener, behavior).await;
    addr
}

async fn serve(socket: TcpStream, acceptor: SslAcceptor, behavior: Behavior) {
    match behavior {
        Behavior::CloseImmediately => {
            drop(socket);
            return;
        }
        Behavior::NoHandshake => {
            hold(socket).await;
            return;
        }
        _ => {}
    }

    let ssl = Ssl::new(acceptor.context()).unwrap();
    let mut stream = SslStream::new(ssl, socket).unwrap();
    if Pin::new(&mut stream).accept().await.is_err() {
        return;
    }

    match behavior {
        Behavior::Send(bytes) => {
            let _ = stream.write_all(bytes).await;
            hold(stream).await;
        }
        Behavior::SendAndClose(bytes) => {
            let _ = stream.write_all(bytes).await;
            let _ = stream.shutdown().await;
        }
        Behavior::SendAndDrop(bytes) => {
            let _ = stream.write_all(bytes).await;
            let _ = stream.flush().await;
            drop(stream);
        }
        Behavior::Garbage(bytes) => {
            let _ = stream.get_mut().write_all(bytes).await;
            hold(stream).await;
        }
        Behavior::Silent => hold(stream).await,
        Behavior::NoHandshake | Behavior::CloseImmediately => {}
    }
}

async fn hold<T>(stream: T) {
    tokio::time::sleep(Duration::from_secs(30)).await;
    drop(stream);
}

pub fn check_config(port: u16, greeting: &[u8], timeout: Duration) -> CheckConfig {
    CheckConfig {
        hostname: "irc.test".into(),
        port,
        check_certificates: false,
        timeout,
        greeting: greeting.to_vec(),
        verbose: true,
    }
}

pub struct StaticResolver(pub Result<Vec<IpAddr>, ResolveError>);

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve_ipv4(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct Recorder {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn publish(&self, message: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

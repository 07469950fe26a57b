//! Duplex byte channel carrying control input and sensor output.
//!
//! The concrete medium is either the local console (stdin/stdout) or a
//! TLS session over TCP. Either way the daemon only sees a boxed
//! `AsyncRead` half, whose readiness drives the dispatcher, and a boxed
//! `AsyncWrite` half owned by the [`Outbox`](crate::outbox::Outbox).

use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{self, pki_types::ServerName, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Which medium a transport runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Console,
    Tls { host: String, port: u16 },
    /// In-process stream, e.g. `tokio::io::duplex`
    Stream,
}

impl TransportKind {
    /// Encrypted transports announce the device id before streaming.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, TransportKind::Tls { .. })
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Console => f.write_str("console"),
            TransportKind::Tls { host, port } => write!(f, "tls://{host}:{port}"),
            TransportKind::Stream => f.write_str("stream"),
        }
    }
}

/// An established duplex channel.
pub struct Transport {
    kind: TransportKind,
    reader: BoxedReader,
    writer: BoxedWriter,
}

impl Transport {
    /// The local console: commands on stdin, readings on stdout.
    pub fn console() -> Self {
        Self::from_parts(
            TransportKind::Console,
            Box::new(tokio::io::stdin()),
            Box::new(tokio::io::stdout()),
        )
    }

    pub fn from_parts(kind: TransportKind, reader: BoxedReader, writer: BoxedWriter) -> Self {
        Self {
            kind,
            reader,
            writer,
        }
    }

    /// Wraps a single bidirectional stream.
    pub fn from_stream<S>(kind: TransportKind, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_parts(kind, Box::new(reader), Box::new(writer))
    }

    /// Connects to `host:port` and completes a TLS 1.2+ handshake.
    ///
    /// The server certificate is verified against the Mozilla root set
    /// for `host`, which is also sent as SNI.
    pub async fn connect_tls(host: &str, port: u16) -> Result<Self, TransportError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| TransportError::InvalidHost(host.to_string()))?;

        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::Connect {
                host: host.to_string(),
                port,
                source: e,
            })?;
        tcp.set_nodelay(true).map_err(|e| TransportError::Connect {
            host: host.to_string(),
            port,
            source: e,
        })?;
        debug!(host = %host, port, "TCP connection established");

        let connector = TlsConnector::from(Arc::new(client_config()?));
        let stream = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| TransportError::Handshake {
                host: host.to_string(),
                source: e,
            })?;

        let kind = TransportKind::Tls {
            host: host.to_string(),
            port,
        };
        info!(transport = %kind, "TLS session established");

        Ok(Self::from_stream(kind, stream))
    }

    pub fn kind(&self) -> &TransportKind {
        &self.kind
    }

    pub fn into_split(self) -> (BoxedReader, BoxedWriter) {
        (self.reader, self.writer)
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").field("kind", &self.kind).finish()
    }
}

fn client_config() -> Result<ClientConfig, TransportError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(TransportError::Config)?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(config)
}

/// Errors establishing a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid TLS server name: {0}")]
    InvalidHost(String),

    #[error("Failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("TLS configuration rejected: {0}")]
    Config(#[source] rustls::Error),

    #[error("TLS handshake with {host} failed: {source}")]
    Handshake {
        host: String,
        #[source]
        source: io::Error,
    },
}

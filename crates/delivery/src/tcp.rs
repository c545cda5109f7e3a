//! TCP implementation of the transport seams.

use crate::config::DispatchConfig;
use crate::outcome::TransportError;
use crate::transport::{Ack, CallMode, CallOptions, Connection, Dialer};
use crate::wire::{self, Request, Response};
use async_trait::async_trait;
use corelib::{Host, Location, WireEnvelope};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::{timeout, timeout_at, Instant};

/// Dials plain TCP connections.
#[derive(Clone, Debug)]
pub struct TcpDialer {
    max_frame_len: usize,
    nodelay: bool,
}

impl TcpDialer {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            max_frame_len: config.max_frame_len,
            nodelay: config.nodelay,
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Connection = TcpConnection;

    async fn dial(
        &self,
        location: &Location,
        dial_timeout: Duration,
    ) -> Result<TcpConnection, TransportError> {
        let stream = open_stream(location, dial_timeout, self.nodelay).await?;
        tracing::debug!(%location, "tcp connection established");
        Ok(TcpConnection {
            stream: Some(stream),
            location: location.clone(),
            max_frame_len: self.max_frame_len,
            nodelay: self.nodelay,
        })
    }
}

/// One exclusively owned TCP connection.
///
/// The socket is closed by [`Connection::close`] or when the value drops.
/// After an I/O failure or an abandoned call the socket is closed as well,
/// since the stream position is no longer known.
#[derive(Debug)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
    location: Location,
    max_frame_len: usize,
    nodelay: bool,
}

impl TcpConnection {
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    async fn ensure_ready(&mut self, options: &CallOptions) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        match options.mode {
            CallMode::FailFast => Err(TransportError::NotReady),
            CallMode::WaitForReady => {
                let remaining = options.deadline.saturating_duration_since(Instant::now());
                tracing::debug!(location = %self.location, "re-establishing connection before call");
                let stream = match open_stream(&self.location, remaining, self.nodelay).await {
                    Err(TransportError::ConnectTimeout { .. }) => {
                        return Err(TransportError::DeadlineExceeded)
                    }
                    other => other?,
                };
                self.stream = Some(stream);
                Ok(())
            }
        }
    }

    async fn exchange(&mut self, frame: &[u8], deadline: Instant) -> Result<Response, TransportError> {
        let max_frame_len = self.max_frame_len;
        let stream = self.stream.as_mut().ok_or(TransportError::NotReady)?;

        let result = timeout_at(deadline, async {
            wire::write_frame(&mut *stream, frame).await?;
            let body = wire::read_frame(&mut *stream, max_frame_len).await?;
            wire::decode_body::<Response>(&body)
        })
        .await;

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                self.close();
                Err(err)
            }
            Err(_) => {
                self.close();
                Err(TransportError::DeadlineExceeded)
            }
        }
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn call(
        &mut self,
        envelope: &WireEnvelope,
        options: CallOptions,
    ) -> Result<Ack, TransportError> {
        let frame = wire::encode_frame(&Request::Deliver(envelope.clone()), self.max_frame_len)?;
        self.ensure_ready(&options).await?;

        match self.exchange(&frame, options.deadline).await? {
            Response::Ack => Ok(Ack),
            Response::Rejected { reason } => Err(TransportError::Rejected(reason)),
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::trace!(location = %self.location, "tcp connection closed");
        }
    }
}

async fn open_stream(
    location: &Location,
    dial_timeout: Duration,
    nodelay: bool,
) -> Result<TcpStream, TransportError> {
    let connect_err = |source: io::Error| TransportError::Connect {
        location: location.to_string(),
        source,
    };

    let stream = match timeout(dial_timeout, connect(location)).await {
        Ok(result) => result.map_err(connect_err)?,
        Err(_) => {
            return Err(TransportError::ConnectTimeout {
                location: location.to_string(),
            })
        }
    };
    stream.set_nodelay(nodelay).map_err(connect_err)?;
    Ok(stream)
}

async fn connect(location: &Location) -> io::Result<TcpStream> {
    let port = location.port();
    match location.host() {
        Host::Ip4(ip) => TcpStream::connect(SocketAddr::from((*ip, port))).await,
        Host::Ip6(ip) => TcpStream::connect(SocketAddr::from((*ip, port))).await,
        Host::Dns(name) => TcpStream::connect((name.as_str(), port)).await,
        Host::Dns4(name) => connect_resolved(name, port, SocketAddr::is_ipv4).await,
        Host::Dns6(name) => connect_resolved(name, port, SocketAddr::is_ipv6).await,
    }
}

/// Resolve `name` and try the addresses of one family in order.
async fn connect_resolved(
    name: &str,
    port: u16,
    family: fn(&SocketAddr) -> bool,
) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in lookup_host((name, port)).await?.filter(|a| family(a)) {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{name} has no address of the requested family"),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::codec::{encode_address, encode_identity};
    use corelib::{build_envelope, ExchangeDescriptor, NetworkAddress};
    use tokio::net::TcpListener;

    fn envelope() -> WireEnvelope {
        let to: NetworkAddress = "/ip4/127.0.0.1/tcp/18514/republic/0b".parse().unwrap();
        build_envelope(
            ExchangeDescriptor::new(vec![1, 2, 3]).serialize(),
            encode_identity(&to).unwrap(),
            encode_address(&to),
        )
    }

    fn location_of(addr: SocketAddr) -> Location {
        Location::new(Host::Ip4("127.0.0.1".parse().unwrap()), addr.port()).unwrap()
    }

    /// Accepts connections and answers every request with `response`.
    async fn serve(response: Response) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let response = response.clone();
                tokio::spawn(async move {
                    while let Ok(body) = wire::read_frame(&mut socket, 1024).await {
                        let _request: Request = wire::decode_body(&body).unwrap();
                        let frame = wire::encode_frame(&response, 1024).unwrap();
                        wire::write_frame(&mut socket, &frame).await.unwrap();
                    }
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_call_ack() {
        let addr = serve(Response::Ack).await;
        let dialer = TcpDialer::new(&DispatchConfig::default());
        let mut conn = dialer
            .dial(&location_of(addr), Duration::from_secs(1))
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(1);
        let ack = conn.call(&envelope(), CallOptions::fail_fast(deadline)).await.unwrap();
        assert_eq!(ack, Ack);
        assert!(conn.is_open());

        conn.close();
        conn.close();
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_call_rejected() {
        let addr = serve(Response::Rejected {
            reason: "unknown order".to_string(),
        })
        .await;
        let dialer = TcpDialer::new(&DispatchConfig::default());
        let mut conn = dialer
            .dial(&location_of(addr), Duration::from_secs(1))
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(1);
        let err = conn
            .call(&envelope(), CallOptions::fail_fast(deadline))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Rejected(reason) if reason == "unknown order"));
    }

    #[tokio::test]
    async fn test_fail_fast_does_not_redial() {
        let addr = serve(Response::Ack).await;
        let dialer = TcpDialer::new(&DispatchConfig::default());
        let mut conn = dialer
            .dial(&location_of(addr), Duration::from_secs(1))
            .await
            .unwrap();
        conn.close();

        let deadline = Instant::now() + Duration::from_secs(1);
        let err = conn
            .call(&envelope(), CallOptions::fail_fast(deadline))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotReady));
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_wait_for_ready_redials() {
        let addr = serve(Response::Ack).await;
        let dialer = TcpDialer::new(&DispatchConfig::default());
        let mut conn = dialer
            .dial(&location_of(addr), Duration::from_secs(1))
            .await
            .unwrap();
        conn.close();

        let options = CallOptions {
            deadline: Instant::now() + Duration::from_secs(1),
            mode: CallMode::WaitForReady,
        };
        assert_eq!(conn.call(&envelope(), options).await.unwrap(), Ack);
        assert!(conn.is_open());
    }

    #[tokio::test]
    async fn test_dial_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dialer = TcpDialer::new(&DispatchConfig::default());
        let err = dialer
            .dial(&location_of(addr), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_oversized_envelope_refused_before_send() {
        let addr = serve(Response::Ack).await;
        let dialer = TcpDialer::new(&DispatchConfig::default().with_max_frame_len(4));
        let mut conn = dialer
            .dial(&location_of(addr), Duration::from_secs(1))
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(1);
        let err = conn
            .call(&envelope(), CallOptions::fail_fast(deadline))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }
}

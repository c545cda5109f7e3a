//! End-to-end delivery tests over loopback TCP.
//!
//! # Test Strategy
//!
//! 1. **Acknowledged delivery**: envelope fields as seen by the recipient
//! 2. **Unreachable recipient**: fails fast, not by waiting out the deadline
//! 3. **Silent recipient**: times out near the deadline and closes the socket
//! 4. **Rejection**: remote error surfaces as a call failure

use corelib::codec::{decode_address, decode_identity};
use corelib::{ExchangeDescriptor, NetworkAddress, WireEnvelope};
use delivery::wire::{self, Request, Response, DEFAULT_MAX_FRAME_LEN};
use delivery::{DeliveryError, DispatchConfig, Dispatcher, ErrorKind, Phase};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

// ============================================================================
// Test endpoint
// ============================================================================

/// How the test endpoint answers the single request it accepts.
enum Reply {
    AckAfter(Duration),
    Reject(&'static str),
    Silent,
}

struct Endpoint {
    addr: SocketAddr,
    received: oneshot::Receiver<WireEnvelope>,
    /// Resolves once the sender has closed the connection.
    closed: oneshot::Receiver<()>,
}

async fn endpoint(reply: Reply) -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = oneshot::channel();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let body = wire::read_frame(&mut socket, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap();
        let Request::Deliver(envelope) = wire::decode_body(&body).unwrap();
        let _ = received_tx.send(envelope);

        let response = match reply {
            Reply::AckAfter(delay) => {
                tokio::time::sleep(delay).await;
                Some(Response::Ack)
            }
            Reply::Reject(reason) => Some(Response::Rejected {
                reason: reason.to_string(),
            }),
            Reply::Silent => None,
        };
        if let Some(response) = response {
            let frame = wire::encode_frame(&response, DEFAULT_MAX_FRAME_LEN).unwrap();
            wire::write_frame(&mut socket, &frame).await.unwrap();
        }

        wait_for_eof(&mut socket).await;
        let _ = closed_tx.send(());
    });

    Endpoint {
        addr,
        received,
        closed,
    }
}

async fn wait_for_eof(socket: &mut TcpStream) {
    let mut buf = [0u8; 64];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

fn address(addr: SocketAddr, identity: &str) -> NetworkAddress {
    format!("/ip4/127.0.0.1/tcp/{}/republic/{}", addr.port(), identity)
        .parse()
        .unwrap()
}

fn sender() -> NetworkAddress {
    "/ip4/127.0.0.1/tcp/18515/republic/0a".parse().unwrap()
}

fn dispatcher() -> Dispatcher {
    Dispatcher::tcp(DispatchConfig::default()).unwrap()
}

// ============================================================================
// Acknowledged delivery
// ============================================================================

#[tokio::test]
async fn test_acknowledged_delivery_stamps_identities() {
    let endpoint = endpoint(Reply::AckAfter(Duration::from_millis(100))).await;
    let recipient = address(endpoint.addr, "0b");
    let addr_a = sender();
    let descriptor = ExchangeDescriptor::new(b"0123456789".to_vec());

    dispatcher()
        .deliver(&recipient, &addr_a, &descriptor, Duration::from_secs(2))
        .await
        .expect("delivery should be acknowledged");

    let envelope = endpoint.received.await.unwrap();
    assert_eq!(decode_identity(envelope.to()).unwrap().to_hex(), "0b");
    assert_eq!(decode_address(envelope.from()).unwrap(), addr_a);
    assert_eq!(envelope.from().as_str(), "/ip4/127.0.0.1/tcp/18515/republic/0a");
    assert_eq!(envelope.descriptor(), b"0123456789");

    tokio::time::timeout(Duration::from_secs(1), endpoint.closed)
        .await
        .expect("connection should be closed after delivery")
        .unwrap();
}

#[tokio::test]
async fn test_empty_descriptor_is_delivered() {
    let endpoint = endpoint(Reply::AckAfter(Duration::ZERO)).await;
    let recipient = address(endpoint.addr, "0b");

    dispatcher()
        .deliver(
            &recipient,
            &sender(),
            &ExchangeDescriptor::new(Vec::new()),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert!(endpoint.received.await.unwrap().descriptor().is_empty());
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_unreachable_recipient_fails_fast() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let deadline = Duration::from_secs(2);
    let started = Instant::now();
    let err = dispatcher()
        .deliver(
            &address(addr, "0b"),
            &sender(),
            &ExchangeDescriptor::new(vec![1; 10]),
            deadline,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectFailed);
    assert!(started.elapsed() < deadline);
}

#[tokio::test]
async fn test_silent_recipient_times_out_and_is_disconnected() {
    let endpoint = endpoint(Reply::Silent).await;
    let deadline = Duration::from_millis(300);

    let started = Instant::now();
    let err = dispatcher()
        .deliver(
            &address(endpoint.addr, "0b"),
            &sender(),
            &ExchangeDescriptor::new(vec![1; 10]),
            deadline,
        )
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(
        err,
        DeliveryError::DeliveryTimeout {
            phase: Phase::Call,
            ..
        }
    ));
    assert!(elapsed >= deadline, "returned early: {elapsed:?}");
    assert!(elapsed < deadline + Duration::from_millis(250), "returned late: {elapsed:?}");

    tokio::time::timeout(Duration::from_secs(1), endpoint.closed)
        .await
        .expect("connection should be closed after timeout")
        .unwrap();
}

#[tokio::test]
async fn test_rejection_surfaces_reason() {
    let endpoint = endpoint(Reply::Reject("order expired")).await;

    let err = dispatcher()
        .deliver(
            &address(endpoint.addr, "0b"),
            &sender(),
            &ExchangeDescriptor::new(vec![1; 10]),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CallFailed);
    assert_eq!(err.rejection_reason(), Some("order expired"));

    tokio::time::timeout(Duration::from_secs(1), endpoint.closed)
        .await
        .expect("connection should be closed after rejection")
        .unwrap();
}

#[tokio::test]
async fn test_recipient_hanging_up_is_call_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        drop(socket);
    });

    let err = dispatcher()
        .deliver(
            &address(addr, "0b"),
            &sender(),
            &ExchangeDescriptor::new(vec![1; 10]),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CallFailed);
}

//! End-to-end behaviour of the proxy over real TCP sockets.

use std::time::{Duration, Instant};

use forward_proxy::config::ProxyConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK";

#[tokio::test]
async fn test_relays_response_and_closes() {
    let (origin, mut seen) = common::start_origin(OK_RESPONSE).await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let request = format!(
        "GET /index.html HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        origin
    );
    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    client.write_all(request.as_bytes()).await.unwrap();

    let received = common::read_until_close(&mut client).await;
    assert_eq!(received, OK_RESPONSE);
    assert_eq!(seen.recv().await.unwrap(), request.into_bytes());

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_keep_alive_serves_second_request() {
    let (origin, mut seen) = common::start_origin(OK_RESPONSE).await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    let first = format!("GET /a HTTP/1.1\r\nHost: {}\r\nConnection: keep-alive\r\n\r\n", origin);
    client.write_all(first.as_bytes()).await.unwrap();

    let mut response = vec![0u8; OK_RESPONSE.len()];
    tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut response))
        .await
        .expect("first response not delivered")
        .unwrap();
    assert_eq!(response, OK_RESPONSE);

    let second = format!("HEAD /b HTTP/1.0\r\nHost: {}\r\n\r\n", origin);
    client.write_all(second.as_bytes()).await.unwrap();
    assert_eq!(common::read_until_close(&mut client).await, OK_RESPONSE);

    assert_eq!(seen.recv().await.unwrap(), first.into_bytes());
    assert_eq!(seen.recv().await.unwrap(), second.into_bytes());

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_non_exact_keep_alive_closes_after_one_cycle() {
    let (origin, _seen) = common::start_origin(OK_RESPONSE).await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\nConnection: Keep-Alive\r\n\r\n", origin);
    client.write_all(request.as_bytes()).await.unwrap();

    assert_eq!(common::read_until_close(&mut client).await, OK_RESPONSE);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_rejected_request_never_reaches_origin() {
    let (origin, mut seen) = common::start_origin(OK_RESPONSE).await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    for request in [
        format!("GET / HTTP/2.0\r\nHost: {}\r\n\r\n", origin),
        format!("get / HTTP/1.1\r\nHost: {}\r\n\r\n", origin),
        format!("CONNECT {} HTTP/1.1\r\nHost: {}\r\n\r\n", origin, origin),
    ] {
        let mut client = TcpStream::connect(proxy.addr).await.unwrap();
        client.write_all(request.as_bytes()).await.unwrap();
        assert!(common::read_until_close(&mut client).await.is_empty(), "{request:?}");
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(seen.try_recv().is_err(), "origin must not be contacted");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_bad_requests_close_without_response() {
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    for request in [
        "GET /\r\nHost: example.com\r\n\r\n",
        "GET / HTTP/1.1\r\nHost example.com\r\n\r\n",
        "GET / HTTP/1.1\r\nAccept: */*\r\n\r\n",
        "GET / HTTP/1.1\r\nHost: example.com:notaport\r\n\r\n",
    ] {
        let mut client = TcpStream::connect(proxy.addr).await.unwrap();
        client.write_all(request.as_bytes()).await.unwrap();
        assert!(common::read_until_close(&mut client).await.is_empty(), "{request:?}");
    }

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_origin_only_ends_that_connection() {
    let dead_port = {
        let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    };
    let (origin, _seen) = common::start_origin(OK_RESPONSE).await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let mut doomed = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET / HTTP/1.1\r\nHost: 127.0.0.1:{}\r\n\r\n", dead_port);
    doomed.write_all(request.as_bytes()).await.unwrap();
    assert!(common::read_until_close(&mut doomed).await.is_empty());

    let mut healthy = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin);
    healthy.write_all(request.as_bytes()).await.unwrap();
    assert_eq!(common::read_until_close(&mut healthy).await, OK_RESPONSE);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_clients_are_isolated() {
    let (slow_origin, _) = common::start_programmable_origin(|| async {
        tokio::time::sleep(Duration::from_millis(800)).await;
        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nslow".to_vec()
    })
    .await;
    let (fast_origin, _) =
        common::start_origin(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nfast").await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let slow = async {
        let mut client = TcpStream::connect(proxy.addr).await.unwrap();
        let request = format!("GET /slow HTTP/1.1\r\nHost: {}\r\n\r\n", slow_origin);
        client.write_all(request.as_bytes()).await.unwrap();
        common::read_until_close(&mut client).await
    };
    let fast = async {
        // Let the slow request get going first.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        let mut client = TcpStream::connect(proxy.addr).await.unwrap();
        let request = format!("GET /fast HTTP/1.1\r\nHost: {}\r\n\r\n", fast_origin);
        client.write_all(request.as_bytes()).await.unwrap();
        let body = common::read_until_close(&mut client).await;
        (body, started.elapsed())
    };

    let (slow_body, (fast_body, fast_elapsed)) = tokio::join!(slow, fast);

    assert!(slow_body.ends_with(b"slow"));
    assert!(fast_body.ends_with(b"fast"));
    assert!(
        fast_elapsed < Duration::from_millis(500),
        "fast client waited {fast_elapsed:?} behind the slow one"
    );

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_connection_cap_holds_back_extra_clients() {
    let (origin, _seen) = common::start_origin(OK_RESPONSE).await;
    let mut config = ProxyConfig::default();
    config.listener.max_connections = Some(1);
    let proxy = common::start_proxy(config).await;

    // Occupies the only slot without sending anything.
    let idle = TcpStream::connect(proxy.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut waiting = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin);
    waiting.write_all(request.as_bytes()).await.unwrap();

    let mut buf = [0u8; 1];
    let early = tokio::time::timeout(Duration::from_millis(200), waiting.read(&mut buf)).await;
    assert!(early.is_err(), "second client served while the cap was reached");

    drop(idle);
    assert_eq!(common::read_until_close(&mut waiting).await, OK_RESPONSE);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_requests() {
    let (origin, _) = common::start_programmable_origin(|| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        OK_RESPONSE.to_vec()
    })
    .await;
    let proxy = common::start_proxy(ProxyConfig::default()).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin);
    client.write_all(request.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    proxy.shutdown.trigger();
    assert_eq!(common::read_until_close(&mut client).await, OK_RESPONSE);

    let result = tokio::time::timeout(Duration::from_secs(5), proxy.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());

    assert!(TcpStream::connect(proxy.addr).await.is_err());
}

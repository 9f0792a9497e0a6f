//! Integration tests for the retrying fetcher against a local HTTP server
//!
//! The server answers each request from a fixed script of responses and
//! records when every request arrived.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use coindash::cache::CacheManager;
use coindash::data::{Coin, MarketDataClient};
use coindash::fetch::{query_params, Fetcher, RetryPolicy};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One scripted reply: status code and body
#[derive(Clone)]
struct Reply {
    status: u16,
    body: &'static str,
}

const SERVER_ERROR: Reply = Reply {
    status: 500,
    body: "internal error",
};

const MALFORMED: Reply = Reply {
    status: 200,
    body: "{not json",
};

const PRICE_OK: Reply = Reply {
    status: 200,
    body: r#"{"ethereum":{"usd":2000.5,"usd_24h_change":1.5,"usd_market_cap":1000.0,"usd_24h_vol":10.0}}"#,
};

/// Local server answering requests from `script`; the last reply repeats
struct ScriptedServer {
    base_url: String,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedServer {
    async fn start(script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let arrivals = Arc::new(Mutex::new(Vec::new()));

        let recorded = arrivals.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let index = {
                    let mut arrivals = recorded.lock().unwrap();
                    arrivals.push(Instant::now());
                    arrivals.len() - 1
                };
                let reply = script
                    .get(index)
                    .or_else(|| script.last())
                    .cloned()
                    .unwrap_or(SERVER_ERROR);

                tokio::spawn(async move {
                    read_request_head(&mut socket).await;
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        reply.status,
                        if reply.status == 200 { "OK" } else { "Error" },
                        reply.body.len(),
                        reply.body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            arrivals,
        }
    }

    fn requests(&self) -> usize {
        self.arrivals.lock().unwrap().len()
    }

    fn gaps(&self) -> Vec<Duration> {
        let arrivals = self.arrivals.lock().unwrap();
        arrivals.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

fn fetcher(retries: u32, delay_ms: u64) -> Fetcher {
    Fetcher::new(RetryPolicy::new(retries, Duration::from_millis(delay_ms)))
}

#[tokio::test]
async fn test_every_attempt_failing_yields_absence_after_exact_attempts() {
    let server = ScriptedServer::start(vec![SERVER_ERROR]).await;
    let url = format!("{}/simple/price", server.base_url);

    let started = Instant::now();
    let result = fetcher(3, 100).fetch(&url, &query_params([("ids", "ethereum")])).await;
    let elapsed = started.elapsed();

    assert!(result.is_none());
    assert_eq!(server.requests(), 3);
    for gap in server.gaps() {
        assert!(gap >= Duration::from_millis(100), "gap too short: {:?}", gap);
    }
    // Two sleeps between three attempts, none after the last one
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(300 + 2000), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_single_attempt_does_not_sleep() {
    let server = ScriptedServer::start(vec![SERVER_ERROR]).await;
    let url = format!("{}/coins/ethereum", server.base_url);

    let started = Instant::now();
    let result = fetcher(1, 5_000).fetch(&url, &Default::default()).await;

    assert!(result.is_none());
    assert_eq!(server.requests(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_success_on_later_attempt_returns_payload() {
    let server = ScriptedServer::start(vec![SERVER_ERROR, SERVER_ERROR, PRICE_OK]).await;
    let url = format!("{}/simple/price", server.base_url);

    let result = fetcher(3, 20).fetch(&url, &Default::default()).await;

    let payload = result.expect("third attempt should succeed");
    assert_eq!(payload["ethereum"]["usd"], 2000.5);
    assert_eq!(server.requests(), 3);
}

#[tokio::test]
async fn test_malformed_json_counts_as_failed_attempt() {
    let server = ScriptedServer::start(vec![MALFORMED, PRICE_OK]).await;
    let url = format!("{}/simple/price", server.base_url);

    let result = fetcher(3, 20).fetch(&url, &Default::default()).await;

    assert!(result.is_some());
    assert_eq!(server.requests(), 2);
}

#[tokio::test]
async fn test_malformed_json_on_every_attempt_is_absence() {
    let server = ScriptedServer::start(vec![MALFORMED]).await;
    let url = format!("{}/coins/ethereum/ohlc", server.base_url);

    let result = fetcher(2, 10).fetch(&url, &Default::default()).await;

    assert!(result.is_none());
    assert_eq!(server.requests(), 2);
}

#[tokio::test]
async fn test_unreachable_host_yields_absence() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = fetcher(2, 10)
        .fetch(&format!("http://{}/ping", addr), &Default::default())
        .await;

    assert!(result.is_none());
}

#[tokio::test]
async fn test_market_client_caches_live_snapshot_across_page_loads() {
    let server = ScriptedServer::start(vec![PRICE_OK]).await;
    let client = MarketDataClient::new(fetcher(3, 10), CacheManager::new())
        .with_base_url(server.base_url.as_str())
        .with_coin(Coin::Ethereum);

    let first = client.live_market().await;
    let second = client.live_market().await;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_market_client_caches_absence() {
    let server = ScriptedServer::start(vec![SERVER_ERROR]).await;
    let client = MarketDataClient::new(fetcher(2, 10), CacheManager::new())
        .with_base_url(server.base_url.as_str());

    assert!(client.metadata().await.is_none());
    assert!(client.metadata().await.is_none());

    // Only the first page load reached the network
    assert_eq!(server.requests(), 2);
}

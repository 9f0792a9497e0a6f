//! Prediction service client
//!
//! The prediction service renders its own HTML page; the dashboard only links
//! to it. Because the service is hosted on a platform that sleeps idle
//! instances, every page load first fires a warm-up request so the page is
//! ready by the time the user opens the link.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;

use super::Coin;

/// Default host of the next-day-high prediction service
pub const PREDICTION_BASE_URL: &str = "https://fastapiethereum.onrender.com";

/// Upper bound for a warm-up request
const WARM_UP_TIMEOUT: Duration = Duration::from_secs(25);

/// Client for the prediction service of one coin
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
    coin: Coin,
}

impl Default for PredictionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionClient {
    /// Creates a client for the default service and coin
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: PREDICTION_BASE_URL.to_string(),
            coin: Coin::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_coin(mut self, coin: Coin) -> Self {
        self.coin = coin;
        self
    }

    /// URL of the prediction page for `date`
    pub fn prediction_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/predict/{}?date={}",
            self.base_url,
            self.coin.api_id(),
            date.format("%Y-%m-%d")
        )
    }

    /// Fires the warm-up request on a detached task and returns immediately.
    ///
    /// The task is never joined and its outcome is never observed.
    pub fn spawn_warm_up(&self, date: NaiveDate) {
        let client = self.client.clone();
        let url = self.prediction_url(date);
        tokio::spawn(async move {
            warm_up(&client, &url).await;
        });
    }
}

/// Sends one GET to `url`, discarding the response and any error
pub async fn warm_up(client: &Client, url: &str) {
    let _ = client.get(url).timeout(WARM_UP_TIMEOUT).send().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::{oneshot, Notify};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn test_prediction_url_uses_coin_and_date() {
        let client = PredictionClient::new();
        assert_eq!(
            client.prediction_url(date()),
            "https://fastapiethereum.onrender.com/predict/ethereum?date=2025-11-03"
        );
    }

    #[test]
    fn test_prediction_url_with_custom_base_and_coin() {
        let client = PredictionClient::new()
            .with_base_url("http://localhost:8000/")
            .with_coin(Coin::Bitcoin);
        assert_eq!(
            client.prediction_url(date()),
            "http://localhost:8000/predict/bitcoin?date=2025-11-03"
        );
    }

    #[tokio::test]
    async fn test_warm_up_swallows_network_errors() {
        // Completes without panicking even though nothing listens on port 1
        warm_up(&Client::new(), "http://127.0.0.1:1/predict/ethereum?date=2025-11-03").await;
    }

    #[tokio::test]
    async fn test_failed_warm_up_does_not_affect_prediction_url() {
        let client = PredictionClient::new().with_base_url("http://127.0.0.1:1");
        client.spawn_warm_up(date());

        assert_eq!(
            client.prediction_url(date()),
            "http://127.0.0.1:1/predict/ethereum?date=2025-11-03"
        );
    }

    #[tokio::test]
    async fn test_spawn_warm_up_sends_get_without_waiting_for_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (line_tx, line_rx) = oneshot::channel::<String>();
        let release = Arc::new(Notify::new());
        let replied = Arc::new(AtomicBool::new(false));

        let (server_release, server_replied) = (release.clone(), replied.clone());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let head = String::from_utf8_lossy(&buf[..n]).to_string();
            let _ = line_tx.send(head.lines().next().unwrap_or_default().to_string());

            // Hold the reply until the test has checked the caller moved on
            server_release.notified().await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
            server_replied.store(true, Ordering::SeqCst);
        });

        let client = PredictionClient::new().with_base_url(format!("http://{}", addr));
        client.spawn_warm_up(date());
        assert!(!replied.load(Ordering::SeqCst));

        let request_line = tokio::time::timeout(Duration::from_secs(5), line_rx)
            .await
            .expect("warm-up request should arrive")
            .unwrap();
        assert_eq!(request_line, "GET /predict/ethereum?date=2025-11-03 HTTP/1.1");
        assert!(!replied.load(Ordering::SeqCst));

        release.notify_one();
    }
}

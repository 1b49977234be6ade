//! Backend liveness monitoring.
//!
//! Fire-and-forget probe of `GET /healthz` on a fixed interval. Any HTTP
//! response below 500 counts as online; failures simply wait for the next
//! tick. The probe has its own fixed per-call timeout, independent of the
//! API client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BackendStatusMonitor {
    http: reqwest::Client,
    url: String,
    interval: Duration,
    online: Arc<AtomicBool>,
    checking: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BackendStatusMonitor {
    pub fn new(base_url: impl Into<String>, interval: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}/healthz", base_url.into()),
            interval,
            online: Arc::new(AtomicBool::new(false)),
            checking: Arc::new(AtomicBool::new(true)),
            task: Mutex::new(None),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// True until the first probe has resolved.
    pub fn is_checking(&self) -> bool {
        self.checking.load(Ordering::SeqCst)
    }

    /// Run one probe immediately and record the result.
    pub async fn probe_once(&self) -> bool {
        let online = Self::probe(&self.http, &self.url).await;
        self.online.store(online, Ordering::SeqCst);
        self.checking.store(false, Ordering::SeqCst);
        online
    }

    async fn probe(http: &reqwest::Client, url: &str) -> bool {
        match timeout(PROBE_TIMEOUT, http.get(url).send()).await {
            Ok(Ok(response)) => response.status().as_u16() < 500,
            Ok(Err(e)) => {
                tracing::debug!("Health probe failed: {}", e);
                false
            }
            Err(_) => {
                tracing::debug!("Health probe timed out");
                false
            }
        }
    }

    /// Start the periodic probe loop. Idempotent while a loop is running.
    pub fn start(&self) {
        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let http = self.http.clone();
        let url = self.url.clone();
        let interval = self.interval;
        let online = self.online.clone();
        let checking = self.checking.clone();

        *slot = Some(tokio::spawn(async move {
            loop {
                let result = Self::probe(&http, &url).await;
                online.store(result, Ordering::SeqCst);
                checking.store(false, Ordering::SeqCst);
                tokio::time::sleep(interval).await;
            }
        }));
    }

    /// Cancel the probe loop. The last observed status is kept.
    pub fn stop(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

impl Drop for BackendStatusMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_probe_online_on_success() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).json_body(serde_json::json!({ "status": "ok" }));
        });

        let monitor = BackendStatusMonitor::new(server.base_url(), Duration::from_secs(30));
        assert!(monitor.is_checking());

        assert!(monitor.probe_once().await);
        assert!(monitor.is_online());
        assert!(!monitor.is_checking());
    }

    #[tokio::test]
    async fn test_probe_offline_on_server_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(500);
        });

        let monitor = BackendStatusMonitor::new(server.base_url(), Duration::from_secs(30));
        assert!(!monitor.probe_once().await);
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_probe_offline_when_unreachable() {
        let monitor =
            BackendStatusMonitor::new("http://127.0.0.1:9", Duration::from_secs(30));
        assert!(!monitor.probe_once().await);
    }

    #[tokio::test]
    async fn test_non_server_error_statuses_count_as_online() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(404);
        });

        let monitor = BackendStatusMonitor::new(server.base_url(), Duration::from_secs(30));
        assert!(monitor.probe_once().await);
    }

    #[tokio::test]
    async fn test_periodic_loop_updates_and_stops() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200);
        });

        let monitor = BackendStatusMonitor::new(server.base_url(), Duration::from_millis(10));
        monitor.start();
        monitor.start(); // idempotent while running

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(monitor.is_online());
        assert!(mock.hits() >= 1);

        monitor.stop();
        let hits_after_stop = mock.hits();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(mock.hits() <= hits_after_stop + 1);
    }
}

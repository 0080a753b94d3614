use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::classify::ProbeOutcome;
use crate::config::Config;
use crate::model::Group;
use crate::{targets, Error};

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The two remote services the monitor depends on.
pub trait MonitorApi: Send + Sync {
    fn fetch_groups<'a>(&'a self) -> ApiFuture<'a, Result<Vec<Group>, Error>>;

    /// Pings one item. Failures are folded into the outcome, never raised.
    fn ping<'a>(&'a self, url: &'a str) -> ApiFuture<'a, ProbeOutcome>;
}

#[derive(Debug, Clone)]
pub struct HttpMonitorApi {
    client: reqwest::Client,
    base: String,
    probe_timeout: Option<Duration>,
}

impl HttpMonitorApi {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            probe_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base.as_str()).with_probe_timeout(config.probe_timeout())
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn servers_url(&self) -> String {
        format!("{}/servers", self.base)
    }

    pub fn ping_url(&self, url: &str) -> String {
        format!("{}/ping/{}", self.base, url)
    }

    pub async fn fetch_groups(&self) -> Result<Vec<Group>, Error> {
        let url = self.servers_url();
        debug!(target: targets::TOPOLOGY, url = %url, "GET group list");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| Error::Http {
                url: url.clone(),
                details: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|error| Error::Http {
            url: url.clone(),
            details: error.to_string(),
        })?;

        let groups: Vec<Group> = serde_json::from_slice(&body).map_err(|error| Error::Decode {
            url: url.clone(),
            details: error.to_string(),
        })?;

        debug!(target: targets::TOPOLOGY, url = %url, groups = groups.len(), "group list ok");
        Ok(groups)
    }

    pub async fn ping(&self, url: &str) -> ProbeOutcome {
        let target = self.ping_url(url);
        trace!(target: targets::PROBE, url = %target, "GET ping");

        let outcome = match self.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.request_ping(&target)).await {
                Ok(outcome) => outcome,
                Err(_) => ProbeOutcome::Failed(format!("timed out after {}ms", limit.as_millis())),
            },
            None => self.request_ping(&target).await,
        };

        match &outcome {
            ProbeOutcome::Reply(_) => {
                trace!(target: targets::PROBE, url = %target, "ping answered");
            }
            ProbeOutcome::Rejected { status } => {
                debug!(target: targets::PROBE, url = %target, status, "ping rejected");
            }
            ProbeOutcome::Failed(details) => {
                debug!(target: targets::PROBE, url = %target, details = %details, "ping failed");
            }
        }

        outcome
    }

    async fn request_ping(&self, target: &str) -> ProbeOutcome {
        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(error) => return ProbeOutcome::Failed(error.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeOutcome::Rejected {
                status: status.as_u16(),
            };
        }

        match response.bytes().await {
            Ok(body) => match serde_json::from_slice(&body) {
                Ok(value) => ProbeOutcome::Reply(value),
                Err(error) => ProbeOutcome::Failed(format!("invalid JSON: {error}")),
            },
            Err(error) => ProbeOutcome::Failed(error.to_string()),
        }
    }
}

impl MonitorApi for HttpMonitorApi {
    fn fetch_groups<'a>(&'a self) -> ApiFuture<'a, Result<Vec<Group>, Error>> {
        Box::pin(async move { HttpMonitorApi::fetch_groups(self).await })
    }

    fn ping<'a>(&'a self, url: &'a str) -> ApiFuture<'a, ProbeOutcome> {
        Box::pin(async move { HttpMonitorApi::ping(self, url).await })
    }
}

/// Scripted in-memory api used by tests and offline demos.
///
/// Group-list results are served from a FIFO queue. Pings are served per url:
/// first from that url's script queue, then from its standing reply.
#[derive(Debug, Clone, Default)]
pub struct MockMonitorApi {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    groups: VecDeque<Result<Vec<Group>, Error>>,
    scripted: HashMap<String, VecDeque<ScriptedPing>>,
    standing: HashMap<String, ProbeOutcome>,
    ping_calls: HashMap<String, usize>,
    fetch_calls: usize,
}

#[derive(Debug)]
enum ScriptedPing {
    Ready(ProbeOutcome),
    Held(oneshot::Receiver<ProbeOutcome>),
}

impl MockMonitorApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_groups(&self, groups: Vec<Group>) {
        self.with_state(|state| state.groups.push_back(Ok(groups)));
    }

    pub fn push_error(&self, error: Error) {
        self.with_state(|state| state.groups.push_back(Err(error)));
    }

    /// Reply used for every ping to `url` once its script queue is drained.
    pub fn set_ping(&self, url: &str, outcome: ProbeOutcome) {
        self.with_state(|state| {
            state.standing.insert(url.to_string(), outcome);
        });
    }

    pub fn push_ping(&self, url: &str, outcome: ProbeOutcome) {
        self.with_state(|state| {
            state
                .scripted
                .entry(url.to_string())
                .or_default()
                .push_back(ScriptedPing::Ready(outcome));
        });
    }

    /// Queues a ping that stays in flight until the returned sender fires.
    pub fn push_held_ping(&self, url: &str) -> oneshot::Sender<ProbeOutcome> {
        let (sender, receiver) = oneshot::channel();
        self.with_state(|state| {
            state
                .scripted
                .entry(url.to_string())
                .or_default()
                .push_back(ScriptedPing::Held(receiver));
        });
        sender
    }

    pub fn ping_calls(&self, url: &str) -> usize {
        self.with_state(|state| state.ping_calls.get(url).copied().unwrap_or(0))
    }

    pub fn fetch_calls(&self) -> usize {
        self.with_state(|state| state.fetch_calls)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    fn next_ping(&self, url: &str) -> ScriptedPing {
        self.with_state(|state| {
            *state.ping_calls.entry(url.to_string()).or_insert(0) += 1;
            if let Some(next) = state.scripted.get_mut(url).and_then(VecDeque::pop_front) {
                return next;
            }
            match state.standing.get(url) {
                Some(outcome) => ScriptedPing::Ready(outcome.clone()),
                None => ScriptedPing::Ready(ProbeOutcome::Failed(format!(
                    "MockMonitorApi has no reply for {url}"
                ))),
            }
        })
    }
}

impl MonitorApi for MockMonitorApi {
    fn fetch_groups<'a>(&'a self) -> ApiFuture<'a, Result<Vec<Group>, Error>> {
        Box::pin(async move {
            let next = self.with_state(|state| {
                state.fetch_calls += 1;
                state.groups.pop_front()
            });

            next.unwrap_or_else(|| {
                Err(Error::Http {
                    url: "mock://servers".to_string(),
                    details: "MockMonitorApi queue is empty".to_string(),
                })
            })
        })
    }

    fn ping<'a>(&'a self, url: &'a str) -> ApiFuture<'a, ProbeOutcome> {
        Box::pin(async move {
            match self.next_ping(url) {
                ScriptedPing::Ready(outcome) => outcome,
                ScriptedPing::Held(receiver) => receiver.await.unwrap_or_else(|_| {
                    warn!(target: targets::PROBE, url = %url, "held mock ping dropped");
                    ProbeOutcome::Failed("held ping dropped".to_string())
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::Server;

    fn run_future<T>(future: impl Future<Output = T>) -> T {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        runtime.block_on(future)
    }

    #[test]
    fn http_api_builds_service_urls() {
        let api = HttpMonitorApi::new("http://monitor.local:8080/api/");
        assert_eq!(api.servers_url(), "http://monitor.local:8080/api/servers");
        assert_eq!(
            api.ping_url("10.1.2.111:3000"),
            "http://monitor.local:8080/api/ping/10.1.2.111:3000"
        );
    }

    #[test]
    fn http_api_takes_timeout_from_config() {
        let mut config = Config::new("http://monitor.local");
        config.probe_timeout_ms = Some(1_500);
        let api = HttpMonitorApi::from_config(&config);
        assert_eq!(api.probe_timeout, Some(Duration::from_millis(1_500)));
    }

    #[test]
    fn unreachable_service_is_a_failed_probe() {
        let api = HttpMonitorApi::new("http://127.0.0.1:1")
            .with_probe_timeout(Some(Duration::from_secs(2)));
        let outcome = run_future(api.ping("h:1"));
        assert!(matches!(outcome, ProbeOutcome::Failed(_)));
    }

    #[test]
    fn unreachable_service_is_a_topology_error() {
        let api = HttpMonitorApi::new("http://127.0.0.1:1");
        let error = run_future(api.fetch_groups()).expect_err("expected error");
        assert!(matches!(error, Error::Http { .. }));
    }

    /// Local HTTP service answering every request with one canned response.
    /// Returns its base url and the request lines it received.
    async fn serve_canned(status: &'static str, body: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buffer = vec![0u8; 8192];
                let mut filled = 0;
                while filled < buffer.len() {
                    let read = socket.read(&mut buffer[filled..]).await.unwrap_or(0);
                    if read == 0 {
                        break;
                    }
                    filled += read;
                    if buffer[..filled].windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&buffer[..filled]);
                let line = head.lines().next().unwrap_or_default().to_string();
                seen.lock().expect("requests").push(line);

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{address}"), requests)
    }

    #[tokio::test]
    async fn ping_reply_is_decoded() {
        let (base, requests) = serve_canned("200 OK", r#"{"data":true}"#).await;
        let api = HttpMonitorApi::new(base);

        let outcome = api.ping("h:1").await;
        assert_eq!(outcome, ProbeOutcome::Reply(json!({"data": true})));
        assert_eq!(crate::classify::classify(&outcome), crate::model::ItemState::Online);
        assert_eq!(
            requests.lock().expect("requests").as_slice(),
            ["GET /ping/h:1 HTTP/1.1".to_string()]
        );
    }

    #[tokio::test]
    async fn ping_error_status_is_rejected() {
        let (base, _) = serve_canned("500 Internal Server Error", r#"{"data":true}"#).await;
        let outcome = HttpMonitorApi::new(base).ping("h:1").await;
        assert_eq!(outcome, ProbeOutcome::Rejected { status: 500 });
    }

    #[tokio::test]
    async fn ping_undecodable_body_is_failed() {
        let (base, _) = serve_canned("200 OK", "not json").await;
        let outcome = HttpMonitorApi::new(base).ping("h:1").await;
        assert!(matches!(outcome, ProbeOutcome::Failed(details) if details.starts_with("invalid JSON")));
    }

    #[tokio::test]
    async fn group_list_is_decoded() {
        let (base, requests) = serve_canned(
            "200 OK",
            r#"[{"id":1,"name":"G1","servers":[{"name":"S1","url":"h:1"}]}]"#,
        )
        .await;

        let groups = HttpMonitorApi::new(format!("{base}/")).fetch_groups().await.expect("groups");
        assert_eq!(groups, vec![Group::new(1, "G1", vec![Server::new("S1", "h:1")])]);
        assert_eq!(
            requests.lock().expect("requests").as_slice(),
            ["GET /servers HTTP/1.1".to_string()]
        );
    }

    #[tokio::test]
    async fn group_list_error_status_is_reported() {
        let (base, _) = serve_canned("500 Internal Server Error", "[]").await;
        let error = HttpMonitorApi::new(base).fetch_groups().await.expect_err("status error");
        assert!(matches!(error, Error::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn group_list_undecodable_body_is_reported() {
        let (base, _) = serve_canned("200 OK", "not json").await;
        let error = HttpMonitorApi::new(base).fetch_groups().await.expect_err("decode error");
        assert!(matches!(error, Error::Decode { .. }));
    }

    #[test]
    fn mock_serves_groups_in_order_then_errors() {
        let mock = MockMonitorApi::new();
        mock.push_groups(vec![Group::new(1, "G1", vec![Server::new("S1", "h:1")])]);

        let groups = run_future(MonitorApi::fetch_groups(&mock)).expect("groups");
        assert_eq!(groups[0].name, "G1");

        let error = run_future(MonitorApi::fetch_groups(&mock)).expect_err("empty queue");
        assert!(matches!(error, Error::Http { .. }));
        assert_eq!(mock.fetch_calls(), 2);
    }

    #[test]
    fn mock_prefers_script_over_standing_reply() {
        let mock = MockMonitorApi::new();
        mock.set_ping("h:1", ProbeOutcome::Reply(json!({"data": true})));
        mock.push_ping("h:1", ProbeOutcome::Rejected { status: 500 });

        let first = run_future(MonitorApi::ping(&mock, "h:1"));
        let second = run_future(MonitorApi::ping(&mock, "h:1"));

        assert_eq!(first, ProbeOutcome::Rejected { status: 500 });
        assert_eq!(second, ProbeOutcome::Reply(json!({"data": true})));
        assert_eq!(mock.ping_calls("h:1"), 2);
    }

    #[test]
    fn mock_held_ping_resolves_when_released() {
        let mock = MockMonitorApi::new();
        let release = mock.push_held_ping("h:1");

        let outcome = run_future(async {
            let pending = MonitorApi::ping(&mock, "h:1");
            let _ = release.send(ProbeOutcome::Reply(json!({"data": false})));
            pending.await
        });

        assert_eq!(outcome, ProbeOutcome::Reply(json!({"data": false})));
    }
}

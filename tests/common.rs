#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde_json::{json, Value};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use waldur_exporter::client::StatsSource;
use waldur_exporter::config::Config;
use waldur_exporter::error::ClientError;
use waldur_exporter::metrics::PollMetrics;
use waldur_exporter::poller::Poller;
use waldur_exporter::startup::build_exporter;
use waldur_exporter::state::AppState;
use waldur_exporter::stats::{catalogue, StatKind};

pub fn test_config(api_url: &str, stale_series: &str) -> Config {
    let yaml = format!(
        r#"
api_url: "{api_url}"
api_token: test-token
api_timeout_secs: 5
bind_address: 127.0.0.1:0
poll_interval_secs: 1
stale_series: {stale_series}
registration_methods: [default, saml2]
logging:
  level: debug
  format: console
"#
    );
    Figment::new()
        .merge(Yaml::string(&yaml))
        .extract()
        .expect("Failed to parse test config YAML")
}

/// An in-memory Waldur: counts keyed by endpoint and query, payloads by action.
#[derive(Default)]
pub struct FakeSource {
    counts: Mutex<HashMap<String, u64>>,
    stats: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    broken: Mutex<HashSet<String>>,
}

pub fn count_key(endpoint: &str, query: &[(String, String)]) -> String {
    let query: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", endpoint, query.join("&"))
}

impl FakeSource {
    /// Every statistic of the default catalogue answers with zero or an empty payload.
    pub fn with_defaults() -> Self {
        let source = FakeSource::default();
        let methods = vec!["default".to_string(), "saml2".to_string()];
        for stat in catalogue(&methods) {
            match stat.kind {
                StatKind::Count { endpoint, query } => {
                    source.set_count_raw(&count_key(&endpoint, &query), 0);
                }
                StatKind::CountBy { endpoint, variants } => {
                    for (_, query) in variants {
                        source.set_count_raw(&count_key(&endpoint, &query), 0);
                    }
                }
                StatKind::Rows { action, .. } => source.set_stats(&action, json!([])),
                StatKind::Nested { action } => source.set_stats(&action, json!({})),
                StatKind::Merged { actions, .. } => {
                    for action in actions {
                        source.set_stats(&action, json!([]));
                    }
                }
            }
        }
        source
    }

    fn set_count_raw(&self, key: &str, count: u64) {
        self.counts.lock().unwrap().insert(key.to_string(), count);
    }

    pub fn set_count(&self, endpoint: &str, query: &[(&str, &str)], count: u64) {
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.set_count_raw(&count_key(endpoint, &query), count);
    }

    pub fn set_stats(&self, action: &str, payload: Value) {
        self.stats
            .lock()
            .unwrap()
            .insert(action.to_string(), payload);
    }

    /// Make an endpoint or action answer with 401.
    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Make an endpoint or action panic.
    pub fn break_with_panic(&self, name: &str) {
        self.broken.lock().unwrap().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
        self.broken.lock().unwrap().remove(name);
    }

    fn check(&self, name: &str) -> Result<(), ClientError> {
        if self.broken.lock().unwrap().contains(name) {
            panic!("source exploded on {}", name);
        }
        if self.failing.lock().unwrap().contains(name) {
            return Err(ClientError::Unauthorized {
                url: format!("fake://{}", name),
                status: 401,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StatsSource for FakeSource {
    async fn count(&self, endpoint: &str, query: &[(String, String)]) -> Result<u64, ClientError> {
        self.check(endpoint)?;
        let key = count_key(endpoint, query);
        self.counts
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .ok_or(ClientError::Status {
                url: format!("fake://{}", key),
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn stats(&self, action: &str) -> Result<Value, ClientError> {
        self.check(action)?;
        self.stats
            .lock()
            .unwrap()
            .get(action)
            .cloned()
            .ok_or(ClientError::Status {
                url: format!("fake://{}", action),
                status: 404,
                body: "not found".to_string(),
            })
    }
}

pub fn build_with_fake(stale_series: &str) -> (Arc<FakeSource>, AppState, Poller<PollMetrics>) {
    let source = Arc::new(FakeSource::with_defaults());
    let config = test_config("http://127.0.0.1:1", stale_series);
    let (state, poller) =
        build_exporter(&config, source.clone()).expect("exporter should build");
    (source, state, poller)
}

/// The exposition text without the poller's own metrics.
pub fn published_lines(state: &AppState) -> Vec<String> {
    state
        .metrics
        .render()
        .expect("metrics should render")
        .lines()
        .filter(|line| !line.starts_with('#') && !line.starts_with("waldur_exporter_"))
        .map(str::to_string)
        .collect()
}

/// One event seen by [`LogCapture`]: level and rendered message.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

/// Records every tracing event into a shared list.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

impl LogCapture {
    /// Installs the capture as the subscriber of the current thread until
    /// the returned guard is dropped.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.level == level)
            .map(|event| event.message.clone())
            .collect()
    }
}

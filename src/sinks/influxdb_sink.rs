//! InfluxDB sink: events become line-protocol points written through the
//! 1.x HTTP API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::BatchTransport;
use crate::Event;
use crate::EventData;
use crate::InfluxdbSinkConfig;
use crate::Result;
use crate::SerializationError;
use crate::SinkError;

/// Measurement of the JSON `value` form
pub const EVENT_MEASUREMENT: &str = "k8s_events";
/// Measurement of the tag-rich form
pub const EVENT_WITH_FIELDS_MEASUREMENT: &str = "events";

const TAG_UID: &str = "uid";
const TAG_POD_ID: &str = "pod_id";
const TAG_POD_NAME: &str = "pod_name";
const TAG_NAMESPACE_NAME: &str = "namespace_name";
const TAG_HOSTNAME: &str = "hostname";
const TAG_CLUSTER_NAME: &str = "cluster_name";
const VALUE_FIELD: &str = "value";
const COUNT_FIELD: &str = "count";

/// Server reply of a write to a database that does not exist (anymore)
pub const DB_NOT_FOUND: &str = "database not found";

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
}

/// One line-protocol point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(
        measurement: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            measurement: measurement.to_string(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn add_tag(
        &mut self,
        key: &str,
        value: &str,
    ) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    pub fn add_field(
        &mut self,
        key: &str,
        value: FieldValue,
    ) {
        self.fields.insert(key.to_string(), value);
    }

    /// Renders `measurement,tag=v field=v timestamp_ns`.
    ///
    /// Tags with empty values are left out; the protocol has no way to
    /// express them.
    pub fn to_line(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);
        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    FieldValue::Str(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
                    FieldValue::Int(i) => format!("{i}i"),
                };
                format!("{}={}", escape(key, &[',', '=', ' ']), value)
            })
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));

        line.push(' ');
        line.push_str(&self.timestamp.timestamp_nanos_opt().unwrap_or_default().to_string());
        line
    }
}

fn escape(
    raw: &str,
    special: &[char],
) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

fn event_timestamp(event: &Event) -> DateTime<Utc> {
    event.last_timestamp.unwrap_or_else(Utc::now)
}

/// Indented JSON of the event, as stored in the `value` field
fn event_value(event: &Event) -> std::result::Result<String, SerializationError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    event.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn is_pod(event: &Event) -> bool {
    event.involved_object.kind == "Pod"
}

/// `k8s_events` point carrying the whole event as JSON
pub fn event_to_point(event: &Event) -> std::result::Result<Point, SerializationError> {
    let mut point = Point::new(EVENT_MEASUREMENT, event_timestamp(event));
    point.add_tag(TAG_UID, &event.metadata.uid);
    if is_pod(event) {
        point.add_tag(TAG_POD_ID, &event.involved_object.uid);
        point.add_tag(TAG_POD_NAME, &event.involved_object.name);
    }
    point.add_tag(TAG_HOSTNAME, &event.source.host);
    point.add_field(VALUE_FIELD, FieldValue::Str(event_value(event)?));
    Ok(point)
}

/// `events` point with the event's attributes as tags and its count as field
pub fn event_to_point_with_fields(event: &Event) -> Point {
    let mut point = Point::new(EVENT_WITH_FIELDS_MEASUREMENT, event_timestamp(event));
    point.add_tag(TAG_UID, &event.metadata.uid);
    point.add_tag("message", &event.message);
    point.add_tag("object_name", &event.involved_object.name);
    point.add_tag("type", &event.event_type);
    point.add_tag("kind", &event.involved_object.kind);
    point.add_tag("component", &event.source.component);
    point.add_tag("reason", &event.reason);
    point.add_tag(TAG_NAMESPACE_NAME, &event.metadata.namespace);
    point.add_tag(TAG_HOSTNAME, &event.source.host);
    if is_pod(event) {
        point.add_tag(TAG_POD_ID, &event.involved_object.uid);
    }
    point.add_field(COUNT_FIELD, FieldValue::Int(i64::from(event.count)));
    point
}

/// Database administration and writes of an InfluxDB server
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PointWriter: Send + Sync + 'static {
    async fn create_database(
        &self,
        db_name: &str,
        retention_policy: &str,
    ) -> Result<()>;

    async fn write_points(
        &self,
        db_name: &str,
        lines: Vec<String>,
    ) -> Result<()>;
}

/// [`PointWriter`] over the 1.x HTTP API (`/query`, `/write`)
pub struct HttpPointWriter {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpPointWriter {
    pub fn new(config: &InfluxdbSinkConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(config.insecure_ssl)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(
        client: Client,
        config: &InfluxdbSinkConfig,
    ) -> Self {
        let base_url = if config.host.contains("://") {
            config.host.trim_end_matches('/').to_string()
        } else {
            let scheme = if config.secure { "https" } else { "http" };
            format!("{scheme}://{}", config.host.trim_end_matches('/'))
        };

        Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SinkError::HttpStatus {
            sink: "influxdb".to_string(),
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

/// InfluxQL statement creating `db_name`; a `"0"` retention keeps the
/// server default policy
pub fn create_database_query(
    db_name: &str,
    retention_policy: &str,
) -> String {
    if retention_policy.is_empty() || retention_policy == "0" {
        format!("CREATE DATABASE \"{db_name}\"")
    } else {
        format!("CREATE DATABASE \"{db_name}\" WITH DURATION {retention_policy} NAME \"default\"")
    }
}

#[async_trait]
impl PointWriter for HttpPointWriter {
    async fn create_database(
        &self,
        db_name: &str,
        retention_policy: &str,
    ) -> Result<()> {
        let query = create_database_query(db_name, retention_policy);
        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .form(&[("q", query.as_str())])
            .send()
            .await?;
        Self::check(response).await
    }

    async fn write_points(
        &self,
        db_name: &str,
        lines: Vec<String>,
    ) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/write", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("db", db_name), ("precision", "ns")])
            .body(lines.join("\n"))
            .send()
            .await?;
        Self::check(response).await
    }
}

struct InfluxState {
    db_exists: bool,
}

/// Buffered InfluxDB transport.
///
/// The whole write path runs under one lock, so the database is created
/// at most once per loss and writes never interleave.
pub struct InfluxdbTransport {
    writer: Arc<dyn PointWriter>,
    db_name: String,
    retention_policy: String,
    cluster_name: String,
    with_fields: bool,
    state: Mutex<InfluxState>,
}

impl InfluxdbTransport {
    pub fn new(
        writer: Arc<dyn PointWriter>,
        config: &InfluxdbSinkConfig,
    ) -> Self {
        Self {
            writer,
            db_name: config.db_name.clone(),
            retention_policy: config.retention_policy.clone(),
            cluster_name: config.cluster_name.clone(),
            with_fields: config.with_fields,
            state: Mutex::new(InfluxState { db_exists: false }),
        }
    }

    pub fn to_point(
        &self,
        event: &Event,
    ) -> Result<Point> {
        let mut point = if self.with_fields {
            event_to_point_with_fields(event)
        } else {
            event_to_point(event)?
        };
        point.add_tag(TAG_CLUSTER_NAME, &self.cluster_name);
        Ok(point)
    }
}

#[async_trait]
impl BatchTransport for InfluxdbTransport {
    fn encode(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        Ok(self.to_point(&data.event)?.to_line().into_bytes())
    }

    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        if !state.db_exists {
            self.writer.create_database(&self.db_name, &self.retention_policy).await?;
            info!(db = %self.db_name, "created influxdb database");
            state.db_exists = true;
        }

        let lines: Vec<String> = batch
            .into_iter()
            .map(|line| String::from_utf8_lossy(&line).into_owned())
            .collect();
        debug!(db = %self.db_name, points = lines.len(), "writing points");

        if let Err(e) = self.writer.write_points(&self.db_name, lines).await {
            if e.to_string().contains(DB_NOT_FOUND) {
                warn!(db = %self.db_name, "database is gone, it will be recreated on the next write");
                state.db_exists = false;
            }
            return Err(e);
        }
        Ok(())
    }
}

use serde::Deserialize;
use serde::Serialize;

use super::DispatchConfig;
use crate::Error;
use crate::Result;

/// Maximum payload of one event hub batch
pub const EVENTHUB_MAX_BATCH_BYTES: usize = 1_046_528;

/// One downstream sink, selected by its `kind`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Records written to the process log
    Glog,
    Stdout(StdoutSinkConfig),
    Http(HttpSinkConfig),
    Kafka(KafkaSinkConfig),
    Influxdb(InfluxdbSinkConfig),
    S3(S3SinkConfig),
    Eventhub(EventHubSinkConfig),
    Rockset(RocksetSinkConfig),
}

impl SinkConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkConfig::Glog => "glog",
            SinkConfig::Stdout(_) => "stdout",
            SinkConfig::Http(_) => "http",
            SinkConfig::Kafka(_) => "kafka",
            SinkConfig::Influxdb(_) => "influxdb",
            SinkConfig::S3(_) => "s3",
            SinkConfig::Eventhub(_) => "eventhub",
            SinkConfig::Rockset(_) => "rockset",
        }
    }

    /// Queue settings of buffered kinds; `None` for direct sinks
    pub fn dispatch(&self) -> Option<&DispatchConfig> {
        match self {
            SinkConfig::Glog | SinkConfig::Stdout(_) => None,
            SinkConfig::Http(c) => Some(&c.dispatch),
            SinkConfig::Kafka(c) => Some(&c.dispatch),
            SinkConfig::Influxdb(c) => Some(&c.dispatch),
            SinkConfig::S3(c) => Some(&c.dispatch),
            SinkConfig::Eventhub(c) => Some(&c.dispatch),
            SinkConfig::Rockset(c) => Some(&c.dispatch),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            SinkConfig::Glog | SinkConfig::Stdout(_) => {}
            SinkConfig::Http(c) => {
                require(&c.url, "http sink specified but no url")?;
            }
            SinkConfig::Kafka(c) => {
                require(&c.topic, "kafka sink specified but no topic")?;
            }
            SinkConfig::Influxdb(c) => {
                require(&c.host, "influxdb sink specified but host not specified")?;
                require(&c.username, "influxdb sink specified but username not specified")?;
                require(&c.password, "influxdb sink specified but password not specified")?;
            }
            SinkConfig::S3(c) => {
                require(&c.bucket, "s3 sink specified but no bucket")?;
                if c.upload_interval_secs == 0 {
                    return Err(Error::InvalidConfig(
                        "s3 sink upload_interval_secs must be greater than 0".into(),
                    ));
                }
            }
            SinkConfig::Eventhub(c) => {
                require(&c.connection_string, "eventhub sink specified but no connection_string")?;
            }
            SinkConfig::Rockset(c) => {
                require(&c.workspace, "rockset sink specified but no workspace")?;
                require(&c.collection, "rockset sink specified but no collection")?;
            }
        }

        match self.dispatch() {
            Some(dispatch) => dispatch.validate(),
            None => Ok(()),
        }
    }
}

fn require(
    value: &str,
    message: &str,
) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidConfig(message.to_string()));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StdoutSinkConfig {
    /// When set, every record is wrapped as `{"<namespace>": record}`
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct HttpSinkConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KafkaSinkConfig {
    #[serde(default = "default_kafka_topic")]
    pub topic: String,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Default for KafkaSinkConfig {
    fn default() -> Self {
        Self {
            topic: default_kafka_topic(),
            dispatch: DispatchConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InfluxdbSinkConfig {
    /// `host[:port]` of the server
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_influxdb_name")]
    pub db_name: String,

    /// Talk https instead of http
    #[serde(default)]
    pub secure: bool,

    /// Write the tag-rich `events` measurement instead of `k8s_events`
    #[serde(default)]
    pub with_fields: bool,

    #[serde(default)]
    pub insecure_ssl: bool,

    /// Retention duration used when creating the database ("0" keeps the
    /// server default)
    #[serde(default = "default_influxdb_retention_policy")]
    pub retention_policy: String,

    #[serde(default = "default_influxdb_cluster_name")]
    pub cluster_name: String,

    #[serde(default = "default_influxdb_dispatch")]
    pub dispatch: DispatchConfig,
}

impl Default for InfluxdbSinkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            db_name: default_influxdb_name(),
            secure: false,
            with_fields: false,
            insecure_ssl: false,
            retention_policy: default_influxdb_retention_policy(),
            cluster_name: default_influxdb_cluster_name(),
            dispatch: default_influxdb_dispatch(),
        }
    }
}

/// Object layout of S3 uploads
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Rfc5424,
    Flatjson,
    Json,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct S3SinkConfig {
    #[serde(default)]
    pub bucket: String,

    /// Key prefix of uploaded objects
    #[serde(default)]
    pub bucket_dir: String,

    #[serde(default)]
    pub region: String,

    /// Minimum time between two uploads
    #[serde(default = "default_s3_upload_interval_secs")]
    pub upload_interval_secs: u64,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Default for S3SinkConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            bucket_dir: String::new(),
            region: String::new(),
            upload_interval_secs: default_s3_upload_interval_secs(),
            output_format: OutputFormat::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl S3SinkConfig {
    /// Dispatch settings with the upload interval applied as the batching
    /// window
    pub fn effective_dispatch(&self) -> DispatchConfig {
        let mut dispatch = self.dispatch.clone();
        if dispatch.flush_interval_ms == 0 {
            dispatch.flush_interval_ms = self.upload_interval_secs * 1000;
        }
        dispatch
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EventHubSinkConfig {
    #[serde(default)]
    pub connection_string: String,

    #[serde(default = "default_eventhub_dispatch")]
    pub dispatch: DispatchConfig,
}

impl Default for EventHubSinkConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            dispatch: default_eventhub_dispatch(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RocksetSinkConfig {
    #[serde(default)]
    pub workspace: String,

    #[serde(default)]
    pub collection: String,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

fn default_kafka_topic() -> String {
    "eventrouter".to_string()
}

fn default_influxdb_name() -> String {
    "k8s".to_string()
}

fn default_influxdb_retention_policy() -> String {
    "0".to_string()
}

fn default_influxdb_cluster_name() -> String {
    "default".to_string()
}

fn default_influxdb_dispatch() -> DispatchConfig {
    // One write in flight; the server-side database flag is shared state
    DispatchConfig {
        max_batch_items: 1,
        ..DispatchConfig::default()
    }
}

fn default_s3_upload_interval_secs() -> u64 {
    120
}

fn default_eventhub_dispatch() -> DispatchConfig {
    DispatchConfig {
        max_batch_bytes: EVENTHUB_MAX_BATCH_BYTES,
        ..DispatchConfig::default()
    }
}

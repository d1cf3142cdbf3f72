use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::clients::BrokerProducer;
use super::clients::DocumentStore;
use super::clients::EventHubClient;
use super::clients::ObjectUploader;
use super::EventHubTransport;
use super::EventSink;
use super::HttpPointWriter;
use super::HttpTransport;
use super::InfluxdbTransport;
use super::KafkaTransport;
use super::LogSink;
use super::PointWriter;
use super::RocksetTransport;
use super::S3Transport;
use super::StdoutSink;
use crate::BatchTransport;
use crate::BufferedDispatcher;
use crate::DispatchConfig;
use crate::DispatchStats;
use crate::DrainWorker;
use crate::Result;
use crate::SinkConfig;
use crate::SinkError;

/// Network clients supplied by the embedding process.
///
/// Kinds backed by a client the crate does not ship cannot be built
/// without it. `point_writer` replaces the built-in InfluxDB HTTP writer.
#[derive(Clone, Default)]
pub struct SinkClients {
    pub broker: Option<Arc<dyn BrokerProducer>>,
    pub uploader: Option<Arc<dyn ObjectUploader>>,
    pub event_hub: Option<Arc<dyn EventHubClient>>,
    pub document_store: Option<Arc<dyn DocumentStore>>,
    pub point_writer: Option<Arc<dyn PointWriter>>,
}

impl SinkClients {
    pub fn with_broker(
        mut self,
        broker: Arc<dyn BrokerProducer>,
    ) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn with_uploader(
        mut self,
        uploader: Arc<dyn ObjectUploader>,
    ) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_event_hub(
        mut self,
        event_hub: Arc<dyn EventHubClient>,
    ) -> Self {
        self.event_hub = Some(event_hub);
        self
    }

    pub fn with_document_store(
        mut self,
        document_store: Arc<dyn DocumentStore>,
    ) -> Self {
        self.document_store = Some(document_store);
        self
    }

    pub fn with_point_writer(
        mut self,
        point_writer: Arc<dyn PointWriter>,
    ) -> Self {
        self.point_writer = Some(point_writer);
        self
    }
}

/// A built sink. Buffered kinds come with the drain worker the router must
/// run and the counters of their dispatcher.
pub struct ManufacturedSink {
    pub name: String,
    pub sink: Arc<dyn EventSink>,
    pub worker: Option<DrainWorker>,
    pub stats: Option<Arc<DispatchStats>>,
}

impl std::fmt::Debug for ManufacturedSink {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ManufacturedSink")
            .field("name", &self.name)
            .field("buffered", &self.worker.is_some())
            .finish()
    }
}

fn buffered(
    name: String,
    transport: Arc<dyn BatchTransport>,
    dispatch: &DispatchConfig,
) -> ManufacturedSink {
    let (dispatcher, worker) = BufferedDispatcher::new(name.clone(), transport, dispatch);
    let stats = dispatcher.stats();
    ManufacturedSink {
        name,
        sink: Arc::new(dispatcher),
        worker: Some(worker),
        stats: Some(stats),
    }
}

fn direct(
    name: String,
    sink: Arc<dyn EventSink>,
) -> ManufacturedSink {
    ManufacturedSink {
        name,
        sink,
        worker: None,
        stats: None,
    }
}

fn require_client<T: ?Sized>(
    client: &Option<Arc<T>>,
    sink: &str,
    kind: &'static str,
) -> Result<Arc<T>> {
    client.clone().ok_or_else(|| {
        SinkError::MissingClient {
            sink: sink.to_string(),
            client: kind,
        }
        .into()
    })
}

/// Builds the sink described by `config` under `name`
pub fn manufacture_sink(
    name: impl Into<String>,
    config: &SinkConfig,
    clients: &SinkClients,
) -> Result<ManufacturedSink> {
    let name = name.into();
    info!(sink = %name, kind = config.kind(), "building sink");

    let sink = match config {
        SinkConfig::Glog => direct(name, Arc::new(LogSink::new())),
        SinkConfig::Stdout(c) => direct(name, Arc::new(StdoutSink::new(c.namespace.clone()))),
        SinkConfig::Http(c) => {
            let transport = HttpTransport::new(c.url.clone())?;
            buffered(name, Arc::new(transport), &c.dispatch)
        }
        SinkConfig::Kafka(c) => {
            let producer = require_client(&clients.broker, &name, "broker producer")?;
            buffered(name, Arc::new(KafkaTransport::new(producer, c.topic.clone())), &c.dispatch)
        }
        SinkConfig::Influxdb(c) => {
            let writer: Arc<dyn PointWriter> = match &clients.point_writer {
                Some(writer) => writer.clone(),
                None => Arc::new(HttpPointWriter::new(c)?),
            };
            buffered(name, Arc::new(InfluxdbTransport::new(writer, c)), &c.dispatch)
        }
        SinkConfig::S3(c) => {
            let uploader = require_client(&clients.uploader, &name, "object uploader")?;
            buffered(name, Arc::new(S3Transport::new(uploader, c)), &c.effective_dispatch())
        }
        SinkConfig::Eventhub(c) => {
            let client = require_client(&clients.event_hub, &name, "event hub")?;
            buffered(name, Arc::new(EventHubTransport::new(client)), &c.dispatch)
        }
        SinkConfig::Rockset(c) => {
            let store = require_client(&clients.document_store, &name, "document store")?;
            buffered(name, Arc::new(RocksetTransport::new(store, c)), &c.dispatch)
        }
    };
    Ok(sink)
}

/// Builds every configured sink.
///
/// Sinks are named after their kind; a kind listed more than once gets its
/// position appended (`http-0`, `http-2`).
pub fn manufacture_sinks(
    configs: &[SinkConfig],
    clients: &SinkClients,
) -> Result<Vec<ManufacturedSink>> {
    let mut kinds: HashMap<&str, usize> = HashMap::new();
    for config in configs {
        *kinds.entry(config.kind()).or_default() += 1;
    }

    configs
        .iter()
        .enumerate()
        .map(|(i, config)| {
            let name = if kinds.get(config.kind()).copied().unwrap_or(0) > 1 {
                format!("{}-{}", config.kind(), i)
            } else {
                config.kind().to_string()
            };
            manufacture_sink(name, config, clients)
        })
        .collect()
}

use std::io::Write;

use eventrouter::manufacture_sinks;
use eventrouter::Error;
use eventrouter::OutputFormat;
use eventrouter::OverflowPolicy;
use eventrouter::RouterConfig;
use eventrouter::SinkClients;
use eventrouter::SinkConfig;
use eventrouter::SinkError;
use eventrouter::SystemError;

use crate::commons::shared;
use crate::commons::CapturingBroker;
use crate::enable_logger;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_configured_sinks_are_manufactured() {
    enable_logger();
    let file = write_config(
        r#"
        enable_prometheus = false

        [[sinks]]
        kind = "stdout"
        namespace = "k8s"

        [[sinks]]
        kind = "kafka"
        topic = "events"
        dispatch = { buffer_size = 10, overflow = "block", block_timeout_ms = 50 }

        [[sinks]]
        kind = "kafka"
        topic = "audit"

        [[sinks]]
        kind = "s3"
        bucket = "archive"
        output_format = "flatjson"
        "#,
    );

    let config = RouterConfig::default()
        .with_override_config(file.path().to_str().unwrap())
        .unwrap()
        .validate()
        .unwrap();

    assert!(!config.enable_prometheus);
    assert_eq!(config.sinks.len(), 4);
    let SinkConfig::Kafka(kafka) = &config.sinks[1] else {
        panic!("expected a kafka sink, got {:?}", config.sinks[1]);
    };
    assert_eq!(kafka.dispatch.overflow, OverflowPolicy::Block);
    let SinkConfig::S3(s3) = &config.sinks[3] else {
        panic!("expected an s3 sink, got {:?}", config.sinks[3]);
    };
    assert_eq!(s3.output_format, OutputFormat::Flatjson);

    // The s3 sink has no uploader yet
    let broker = shared::<CapturingBroker>();
    let clients = SinkClients::default().with_broker(broker);
    match manufacture_sinks(&config.sinks, &clients) {
        Err(Error::System(SystemError::Sink(SinkError::MissingClient { sink, .. }))) => assert_eq!(sink, "s3"),
        other => panic!("expected a missing client error, got {:?}", other.map(|s| s.len())),
    }

    let without_s3: Vec<_> = config.sinks[..3].to_vec();
    let sinks = manufacture_sinks(&without_s3, &clients).unwrap();
    let names: Vec<_> = sinks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["stdout", "kafka-1", "kafka-2"]);
    assert!(sinks[0].worker.is_none());
    assert!(sinks[1].worker.is_some());
}

#[test]
fn test_empty_configuration_routes_to_the_log() {
    enable_logger();
    let config = RouterConfig::default().validate().unwrap();

    assert_eq!(config.sinks, vec![SinkConfig::Glog]);
    let sinks = manufacture_sinks(&config.sinks, &SinkClients::default()).unwrap();
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0].name, "glog");
}

#[test]
fn test_incomplete_sink_is_rejected() {
    enable_logger();
    let file = write_config(
        r#"
        [[sinks]]
        kind = "influxdb"
        host = "influx:8086"
        "#,
    );

    let result = RouterConfig::default()
        .with_override_config(file.path().to_str().unwrap())
        .unwrap()
        .validate();

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

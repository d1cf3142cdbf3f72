use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::rfc5424;
use crate::BatchTransport;
use crate::EventData;
use crate::Result;
use crate::SinkError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Posts batches of length-prefixed RFC5424 frames, one per line, to a
/// collector endpoint.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(
        client: Client,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Frames one record: the event's source host and component fill the
/// syslog header, its last timestamp (or now) the timestamp field.
pub fn frame_record(data: &EventData) -> Result<Vec<u8>> {
    let timestamp = data.event.last_timestamp.unwrap_or_else(Utc::now);
    let message = rfc5424::Message {
        timestamp: timestamp.fixed_offset(),
        hostname: data.event.source.host.clone(),
        app_name: data.event.source.component.clone(),
        message: serde_json::to_string(data)?,
    };
    Ok(message.to_bytes())
}

/// Joins encoded frames into one newline terminated body
pub(crate) fn join_lines(batch: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = Vec::with_capacity(batch.iter().map(|line| line.len() + 1).sum());
    for line in batch {
        body.extend_from_slice(&line);
        body.push(b'\n');
    }
    body
}

#[async_trait]
impl BatchTransport for HttpTransport {
    fn encode(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        frame_record(data)
    }

    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(join_lines(batch))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::HttpStatus {
                sink: "http".to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(())
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tracing::debug;

use super::clients::ObjectUploader;
use super::http_sink::join_lines;
use crate::BatchTransport;
use crate::EventData;
use crate::OutputFormat;
use crate::Result;
use crate::S3SinkConfig;

/// Uploads each batch as one object, one record per line.
///
/// The batching window of the owning dispatcher is the upload interval.
pub struct S3Transport {
    uploader: Arc<dyn ObjectUploader>,
    bucket: String,
    bucket_dir: String,
    output_format: OutputFormat,
}

impl S3Transport {
    pub fn new(
        uploader: Arc<dyn ObjectUploader>,
        config: &S3SinkConfig,
    ) -> Self {
        Self {
            uploader,
            bucket: config.bucket.clone(),
            bucket_dir: config.bucket_dir.clone(),
            output_format: config.output_format,
        }
    }
}

/// Object key of an upload: `<dir>/<YYYY>/<MM>/<DD>/<unix-nanos>.log`
pub fn object_key(
    bucket_dir: &str,
    now: DateTime<Utc>,
) -> String {
    let name = format!(
        "{}/{}.log",
        now.format("%Y/%m/%d"),
        now.timestamp_nanos_opt().unwrap_or_default()
    );
    let dir = bucket_dir.trim_matches('/');
    if dir.is_empty() {
        name
    } else {
        format!("{dir}/{name}")
    }
}

#[async_trait]
impl BatchTransport for S3Transport {
    fn encode(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        match self.output_format {
            OutputFormat::Rfc5424 => {
                data.write_rfc5424(&mut line)?;
            }
            OutputFormat::Flatjson => {
                data.write_flattened_json(&mut line)?;
            }
            OutputFormat::Json => line = data.to_json_vec()?,
        }
        Ok(line)
    }

    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        let key = object_key(&self.bucket_dir, Utc::now());
        let records = batch.len();
        let body = join_lines(batch);
        debug!(bucket = %self.bucket, %key, records, bytes = body.len(), "uploading events");
        self.uploader.upload(&self.bucket, &key, body).await
    }
}

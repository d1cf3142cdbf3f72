//! Length-prefixed RFC5424 syslog framing used by line-oriented sinks.
//!
//! Frame layout: `<len> <24>1 <timestamp> <host> <app> - - - <message>`, where
//! `len` counts exactly the bytes after the separating space.

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::SecondsFormat;

use crate::FramingError;

/// Priority and protocol version of every frame
const FRAME_HEADER: &str = "<24>1";

/// Value RFC5424 uses for absent header fields
pub const NIL_VALUE: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub timestamp: DateTime<FixedOffset>,
    pub hostname: String,
    pub app_name: String,
    pub message: String,
}

impl Message {
    /// Encodes the message as one length-prefixed frame
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = format!(
            "{} {} {} {} - - - {}",
            FRAME_HEADER,
            self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            or_nil(&self.hostname),
            or_nil(&self.app_name),
            self.message
        );
        format!("{} {}", payload.len(), payload).into_bytes()
    }

    /// Decodes one length-prefixed frame.
    ///
    /// The header is split into exactly seven space separated fields; the last
    /// one keeps the rest of the line, with the empty structured-data marker
    /// (`"- "`) trimmed.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, FramingError> {
        let text = std::str::from_utf8(data).map_err(|_| FramingError::InvalidSyslog)?;

        let (prefix, payload) = text.split_once(' ').ok_or(FramingError::MissingLengthPrefix)?;
        prefix
            .parse::<usize>()
            .map_err(|_| FramingError::InvalidLengthPrefix(prefix.to_string()))?;

        let fields: Vec<&str> = payload.splitn(7, ' ').collect();
        if fields.len() < 7 {
            return Err(FramingError::InvalidSyslog);
        }

        let timestamp = DateTime::parse_from_rfc3339(fields[1])
            .map_err(|e| FramingError::InvalidTimestamp(e.to_string()))?;

        Ok(Self {
            timestamp,
            hostname: fields[2].to_string(),
            app_name: fields[3].to_string(),
            message: fields[6].strip_prefix("- ").unwrap_or(fields[6]).to_string(),
        })
    }
}

pub(crate) fn or_nil(field: &str) -> &str {
    if field.is_empty() {
        NIL_VALUE
    } else {
        field
    }
}

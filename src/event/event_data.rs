use std::io::Write;
use std::sync::Arc;

use chrono::SecondsFormat;
use serde::Deserialize;
use serde::Serialize;

use super::flatten::flatten_json_str;
use super::flatten::DEFAULT_SEPARATOR;
use super::rfc5424::or_nil;
use super::Event;
use crate::Result;

/// Whether a record is the first observation of an event or supersedes an
/// earlier one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Added,
    Updated,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Added => "ADDED",
            Verb::Updated => "UPDATED",
        }
    }
}

/// Canonical record handed to every sink: the current event, the version
/// it supersedes (updates only) and the verb telling the two cases apart.
///
/// `old_event` is omitted from the wire form entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub verb: Verb,
    pub event: Arc<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_event: Option<Arc<Event>>,
}

impl EventData {
    pub fn new(
        event: Arc<Event>,
        old_event: Option<Arc<Event>>,
    ) -> Self {
        match old_event {
            None => Self {
                verb: Verb::Added,
                event,
                old_event: None,
            },
            Some(old) => Self {
                verb: Verb::Updated,
                event,
                old_event: Some(old),
            },
        }
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Writes the record as one unframed RFC5424 line:
    /// `<14>1 <lastTimestamp> <source host> <source component> - - - <json>`.
    pub fn write_rfc5424<W: Write>(
        &self,
        w: &mut W,
    ) -> Result<usize> {
        let json = serde_json::to_string(self)?;
        let timestamp = self
            .event
            .last_timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "-".to_string());

        let line = format!(
            "<14>1 {} {} {} - - - {}",
            timestamp,
            or_nil(&self.event.source.host),
            or_nil(&self.event.source.component),
            json
        );
        w.write_all(line.as_bytes())?;
        Ok(line.len())
    }

    /// Writes the flattened wire form, keys joined with `_`
    /// (e.g. `{"event_involvedObject_kind":"Pod","verb":"ADDED"}`).
    pub fn write_flattened_json<W: Write>(
        &self,
        w: &mut W,
    ) -> Result<usize> {
        let flat = self.to_flattened_json()?;
        w.write_all(flat.as_bytes())?;
        Ok(flat.len())
    }

    pub fn to_flattened_json(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(flatten_json_str(&json, DEFAULT_SEPARATOR)?)
    }
}

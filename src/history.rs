//! Records of completed operations for an external history store.
//!
//! The analyzer never persists anything itself. A caller that keeps a history builds
//! a [`HistoryRecord`] from a successful operation and hands it to its [`HistoryStore`].
//! Records never contain secrets; only a `withSecret` flag is kept.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    analyzer::{DecodeResponse, EncodeResponse, FullAnalysis, VerifyResponse},
    token::JsonObject,
};

/// Kind of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Token decoding.
    Decode,
    /// Token creation.
    Encode,
    /// Full analysis or signature verification.
    Analysis,
}

/// Immutable record of a successful operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Kind of the operation.
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Operation input, without secrets.
    pub request_data: Value,
    /// Operation output.
    pub response_data: Value,
    /// Time at which the record was created.
    pub timestamp: DateTime<Utc>,
}

fn to_value<T: Serialize>(response: &T) -> Value {
    // Responses consist of strings, numbers, maps with string keys etc., which
    // cannot fail to serialize.
    serde_json::to_value(response).unwrap_or(Value::Null)
}

impl HistoryRecord {
    /// Records decoding of `token`.
    pub fn decode(token: &str, response: &DecodeResponse, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: RecordKind::Decode,
            request_data: json!({ "token": token }),
            response_data: to_value(response),
            timestamp,
        }
    }

    /// Records full analysis of `token`.
    pub fn analysis(
        token: &str,
        with_secret: bool,
        response: &FullAnalysis,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: RecordKind::Analysis,
            request_data: json!({ "token": token, "withSecret": with_secret }),
            response_data: to_value(response),
            timestamp,
        }
    }

    /// Records creation of a token.
    pub fn encode(
        header: &JsonObject,
        payload: &JsonObject,
        with_secret: bool,
        response: &EncodeResponse,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: RecordKind::Encode,
            request_data: json!({
                "header": header,
                "payload": payload,
                "algorithm": response.algorithm,
                "withSecret": with_secret,
            }),
            response_data: to_value(response),
            timestamp,
        }
    }

    /// Records signature verification.
    pub fn verify(response: &VerifyResponse, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: RecordKind::Analysis,
            request_data: json!({ "verify": true, "withSecret": true }),
            response_data: to_value(response),
            timestamp,
        }
    }
}

/// Store of [`HistoryRecord`]s maintained outside the analyzer.
pub trait HistoryStore {
    /// Saves a record to the store.
    fn save(&mut self, record: HistoryRecord);

    /// Returns stored records, most recent first.
    fn recent(&self) -> Vec<&HistoryRecord>;
}

impl HistoryStore for Vec<HistoryRecord> {
    fn save(&mut self, record: HistoryRecord) {
        self.push(record);
    }

    fn recent(&self) -> Vec<&HistoryRecord> {
        let mut records: Vec<_> = self.iter().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }
}

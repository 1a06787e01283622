//! JSONL protocol between the worker and a plugin process.
//!
//! The worker writes one [`PluginRequest`] line to the plugin's stdin and
//! closes it. The plugin writes one [`PluginResponse`] line to stdout and
//! exits. Binary payloads travel as standard base64 strings. Plugin stderr
//! is captured for diagnostic logging but is not part of the protocol.

use serde::{Deserialize, Serialize};

/// Request sent to a plugin on stdin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginRequest {
    request_id: String,
    task_type: String,
    #[serde(default)]
    metadata: Vec<String>,
    #[serde(with = "base64_bytes")]
    input: Vec<u8>,
}

impl PluginRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        task_type: impl Into<String>,
        metadata: Vec<String>,
        input: Vec<u8>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            task_type: task_type.into(),
            metadata,
            input,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn request_id(&self) -> &str {
        self.request_id.as_str()
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> &str {
        self.task_type.as_str()
    }

    /// Returns the residual metadata tokens.
    #[must_use]
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    /// Returns the decoded input payload.
    #[must_use]
    pub fn input(&self) -> &[u8] {
        &self.input
    }
}

/// Response read from a plugin's stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PluginResponse {
    /// The task completed.
    Done {
        /// One-line summary reported after `DONE`.
        summary: String,
        /// Output payload, if any.
        #[serde(default, with = "optional_base64_bytes")]
        output: Option<Vec<u8>>,
    },
    /// The task failed.
    Error {
        /// Message reported after `ERROR`.
        message: String,
    },
}

impl PluginResponse {
    /// Creates a successful response.
    #[must_use]
    pub fn done(summary: impl Into<String>, output: Option<Vec<u8>>) -> Self {
        Self::Done {
            summary: summary.into(),
            output,
        }
    }

    /// Creates a failed response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns whether the plugin completed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

mod optional_base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    #[expect(
        clippy::ref_option,
        reason = "serde's `with` attribute passes the field by reference"
    )]
    pub(super) fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

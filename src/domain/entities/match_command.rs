use serde::Deserialize;

use crate::helper::error_chain_fmt;

fn default_top_k() -> usize {
    5
}

/// The closed set of operations the matching service accepts from its
/// callers (an assistant tool-call layer in the original deployment).
///
/// Commands arrive as free-form JSON; everything is validated here, at a
/// single boundary. An unknown operation name or malformed parameters is
/// rejected during parsing and never reaches the handlers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum MatchCommand {
    /// Top researcher matches for a natural-language query, optionally
    /// restricted to one institution
    GetTopMatches {
        query: String,
        #[serde(default = "default_top_k")]
        top_k: usize,
        #[serde(default)]
        institution: Option<String>,
    },
    /// All institutions present in the profile collection
    ListInstitutions,
}

impl MatchCommand {
    pub fn try_parsing(data: &[u8]) -> Result<Self, MatchCommandError> {
        let data = std::str::from_utf8(data)?;
        let command = serde_json::from_str(data)
            .map_err(|e| MatchCommandError::InvalidJsonData(e, data.to_string()))?;

        Ok(command)
    }
}

#[derive(thiserror::Error)]
pub enum MatchCommandError {
    #[error("Data could not be converted from utf8 u8 vector to string")]
    InvalidStringData(#[from] std::str::Utf8Error),

    #[error("Data did not represent a supported command: {0}. Data: {1}")]
    InvalidJsonData(serde_json::Error, String),
}

impl std::fmt::Debug for MatchCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

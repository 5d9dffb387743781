use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::message::MessageNode;

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A canned question offered in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannedQuestion {
    pub id: String,
    pub text: String,
}

/// Copy shown in the placeholder before the first question is asked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tutorial {
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

/// A keyword-triggered answer.
///
/// Keywords are matched case-insensitively against single question tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub messages: Vec<MessageNode>,
}

/// The externally supplied bundle of canned questions, tutorial copy and
/// keyword-triggered responses. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub questions: Vec<CannedQuestion>,
    #[serde(default)]
    pub tutorial: Tutorial,
    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
}

impl Persona {
    /// Parse a persona from a JSON string.
    pub fn parse_json(input: &str) -> Result<Persona, PersonaError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a persona from a JSON file.
    pub fn load_from_json(path: &Path) -> Result<Persona, PersonaError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_json(&contents)
    }

    /// Load the persona named `name` from `<dir>/<name>.json`.
    pub fn fetch(dir: &Path, name: &str) -> Result<Persona, PersonaError> {
        Self::load_from_json(&dir.join(format!("{name}.json")))
    }

    /// Like [`Persona::parse_json`], but a parse failure degrades to the
    /// empty persona, which answers every question with the fallback.
    pub fn parse_json_or_default(input: &str) -> Persona {
        or_default(Self::parse_json(input), "<inline>")
    }

    /// Like [`Persona::load_from_json`], degrading to the empty persona.
    pub fn load_or_default(path: &Path) -> Persona {
        or_default(Self::load_from_json(path), &path.display().to_string())
    }

    /// Like [`Persona::fetch`], degrading to the empty persona.
    pub fn fetch_or_default(dir: &Path, name: &str) -> Persona {
        or_default(Self::fetch(dir, name), name)
    }

    pub fn question(&self, id: &str) -> Option<&CannedQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }
}

fn or_default(result: Result<Persona, PersonaError>, source: &str) -> Persona {
    match result {
        Ok(persona) => persona,
        Err(e) => {
            tracing::warn!(persona = source, error = %e, "persona load failed, using empty persona");
            Persona::default()
        }
    }
}

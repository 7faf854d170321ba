//! Request and result types for substitution edits

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// A literal, case-sensitive text substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub search: String,
    pub replacement: String,
}

impl Substitution {
    /// An empty `search` is rejected: it would match between every character.
    /// Line breaks are rejected on either side since substitution is line-based.
    pub fn new(
        search: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, EditError> {
        let sub = Self {
            search: search.into(),
            replacement: replacement.into(),
        };
        sub.check()?;
        Ok(sub)
    }

    fn check(&self) -> Result<(), EditError> {
        if self.search.is_empty() {
            return Err(EditError::InvalidRequest(
                "Search text must not be empty".into(),
            ));
        }
        if has_line_break(&self.search) || has_line_break(&self.replacement) {
            return Err(EditError::InvalidRequest(format!(
                "Substitution '{}' must not contain line breaks",
                self.search.escape_debug()
            )));
        }
        Ok(())
    }
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\n', '\r'])
}

/// Ordered list of substitutions.
///
/// Pairs are applied in order, each one to the text produced by the previous
/// pair, so `[(A, B), (B, C)]` turns `A` into `C`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionRequest {
    substitutions: Vec<Substitution>,
}

impl SubstitutionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from raw form fields, dropping pairs where either side
    /// was left blank.
    pub fn from_fields<I, S, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, R)>,
        S: Into<String>,
        R: Into<String>,
    {
        let substitutions = pairs
            .into_iter()
            .map(|(s, r)| (s.into(), r.into()))
            .filter(|(s, r)| !s.is_empty() && !r.is_empty())
            .map(|(search, replacement)| Substitution {
                search,
                replacement,
            })
            .collect();
        Self { substitutions }
    }

    pub fn push(&mut self, substitution: Substitution) {
        self.substitutions.push(substitution);
    }

    /// Append a pair, validating it first
    pub fn with(
        mut self,
        search: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, EditError> {
        self.push(Substitution::new(search, replacement)?);
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Substitution> {
        self.substitutions.iter()
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    /// Re-check entries that bypassed `Substitution::new`, e.g. deserialized
    /// or built with `from_fields`.
    pub fn validate(&self) -> Result<(), EditError> {
        self.substitutions.iter().try_for_each(Substitution::check)
    }
}

impl FromIterator<Substitution> for SubstitutionRequest {
    fn from_iter<T: IntoIterator<Item = Substitution>>(iter: T) -> Self {
        Self {
            substitutions: iter.into_iter().collect(),
        }
    }
}

/// JSON edit request; binary payloads are base64-encoded
#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    pub pdf: String,
    #[serde(default)]
    pub substitutions: SubstitutionRequest,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub compress: Option<bool>,
}

impl EditRequest {
    pub fn pdf_bytes(&self) -> Result<Vec<u8>, EditError> {
        BASE64
            .decode(&self.pdf)
            .map_err(|e| EditError::InvalidRequest(format!("Invalid PDF base64: {}", e)))
    }

    pub fn image_bytes(&self) -> Result<Option<Vec<u8>>, EditError> {
        self.image
            .as_deref()
            .map(|data| {
                BASE64
                    .decode(data)
                    .map_err(|e| EditError::InvalidRequest(format!("Invalid image base64: {}", e)))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: String,
    pub metrics: ProcessMetrics,
}

impl EditResult {
    pub fn new(output: &[u8], metrics: ProcessMetrics) -> Self {
        Self {
            success: true,
            data: BASE64.encode(output),
            metrics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub replacements: usize,
    pub images_replaced: usize,
    pub skipped: Vec<String>,
    pub processing_time_ms: u64,
}

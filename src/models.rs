//! Request and response bodies of the Gemini `generateContent` REST call.

use crate::enums::{HarmBlockThreshold, HarmCategory};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Role of the user in a conversation turn.
pub const ROLE_USER: &str = "user";
/// Role of the model in a conversation turn.
pub const ROLE_MODEL: &str = "model";

/// One or more prompt strings, sent in order.
///
/// Built from a single `&str`/`String` or from any list of them, so call sites
/// can pass whichever shape they already hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contents(Vec<String>);

impl Contents {
    /// The prompts in order.
    pub fn prompts(&self) -> &[String] {
        &self.0
    }

    /// Converts the prompts to a single user turn, one part per prompt.
    pub fn into_user_content(self) -> Content {
        Content {
            role: Some(ROLE_USER.to_string()),
            parts: self.0.into_iter().map(Part::text).collect(),
        }
    }
}

impl From<&str> for Contents {
    fn from(prompt: &str) -> Self {
        Contents(vec![prompt.to_string()])
    }
}

impl From<String> for Contents {
    fn from(prompt: String) -> Self {
        Contents(vec![prompt])
    }
}

impl From<Vec<String>> for Contents {
    fn from(prompts: Vec<String>) -> Self {
        Contents(prompts)
    }
}

impl From<Vec<&str>> for Contents {
    fn from(prompts: Vec<&str>) -> Self {
        Contents(prompts.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Contents {
    fn from(prompts: &[&str]) -> Self {
        Contents(prompts.iter().map(|p| p.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some(ROLE_USER.to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// A role-less content block, as used for system instructions.
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenation of every text part, `None` when there is none.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// A content part. Non-text parts (function calls, inline data) deserialize
/// with `text: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Disables blocking for every moderation category.
    ///
    /// Collectors summarize arbitrary third-party text (news, forum threads);
    /// the pipeline decides what is appropriate, not the provider's defaults.
    pub fn block_none_all() -> Vec<SafetySetting> {
        HarmCategory::ALL
            .into_iter()
            .map(|category| SafetySetting {
                category,
                threshold: HarmBlockThreshold::BlockNone,
            })
            .collect()
    }
}

/// A tool the model may call while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    /// Grounding with live Google Search results.
    pub fn google_search() -> Self {
        Self {
            google_search: Some(GoogleSearch {}),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Builds a single-candidate text response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some(ROLE_MODEL.to_string()),
                    parts: vec![Part::text(text)],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
            usage_metadata: None,
        }
    }

    /// Content of the first candidate.
    pub fn first_content(&self) -> Result<&Content> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| Error::MalformedResponse("No candidates in response".to_string()))?;
        candidate
            .content
            .as_ref()
            .filter(|content| !content.parts.is_empty())
            .ok_or_else(|| {
                Error::MalformedResponse(format!(
                    "No content parts in response (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ))
            })
    }

    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Result<String> {
        self.first_content()?
            .parts
            .first()
            .and_then(|part| part.text.clone())
            .ok_or_else(|| Error::MalformedResponse("First part carries no text".to_string()))
    }
}

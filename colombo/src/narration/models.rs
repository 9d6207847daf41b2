//! Narration request/result types and backend wire format.

use serde::{Deserialize, Serialize};

use crate::discovery::Landmark;

/// A request to narrate a landmark.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    pub landmark: Landmark,
    /// Preferred narration language (e.g. `"en"`, `"fr"`).
    pub language_hint: Option<String>,
}

impl NarrationRequest {
    pub fn new(landmark: Landmark) -> Self {
        Self {
            landmark,
            language_hint: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language_hint = Some(language.into());
        self
    }
}

/// Narrative content returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationResult {
    pub place_name: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub story_text: String,
    pub audio_uri: String,
}

/// `POST /api/places/visit` body.
#[derive(Debug, Serialize)]
pub(crate) struct VisitRequest {
    pub place: VisitPlace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VisitPlace {
    #[serde(rename = "mapKitId", skip_serializing_if = "Option::is_none")]
    pub map_kit_id: Option<String>,
    pub text: String,
    /// `"lat,lon"`
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    pub properties: VisitProperties,
}

#[derive(Debug, Serialize)]
pub(crate) struct VisitProperties {
    pub landmark: bool,
}

impl From<&NarrationRequest> for VisitRequest {
    fn from(request: &NarrationRequest) -> Self {
        let candidate = &request.landmark.candidate;

        Self {
            place: VisitPlace {
                map_kit_id: Some(request.landmark.id.clone()),
                text: candidate.name.clone(),
                location: candidate.coordinate.to_comma_pair(),
                place_name: Some(candidate.name.clone()),
                properties: VisitProperties { landmark: true },
            },
            language: request.language_hint.clone(),
        }
    }
}

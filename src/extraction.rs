//! Validation of image-recognition model responses.
//!
//! The model is asked for a bare JSON object but is not trusted to return
//! one: replies are stripped of Markdown fences, parsed, and checked against
//! a fixed set of required keys before anything reaches the catalog.

use crate::planner::SearchParams;
use crate::planner::params::{BODY_TYPE, MAKE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the listing-prefill prompt asks for.
pub const LISTING_FIELDS: &[&str] = &[
    "make",
    "model",
    "year",
    "color",
    "bodyType",
    "price",
    "mileage",
    "fuelType",
    "transmission",
    "description",
    "confidence",
];

/// Keys the image-search prompt asks for.
pub const SEARCH_FIELDS: &[&str] = &["make", "bodyType", "color", "confidence"];

#[derive(Debug)]
pub enum ExtractionError {
    Malformed(serde_json::Error),
    NotAnObject,
    MissingFields(Vec<String>),
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "Failed to parse AI response: {e}"),
            Self::NotAnObject => write!(f, "AI response is not a JSON object"),
            Self::MissingFields(fields) => write!(
                f,
                "AI response missing the required fields: {}",
                fields.join(",")
            ),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e)
    }
}

/// Outcome of validating one model reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Extraction<T> {
    Fields { data: T },
    Failed { error: String },
}

impl<T> From<Result<T, ExtractionError>> for Extraction<T> {
    fn from(result: Result<T, ExtractionError>) -> Self {
        match result {
            Ok(data) => Self::Fields { data },
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Listing fields suggested from a photo, used to prefill the admin form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ListingSuggestion(Map<String, Value>);

impl ListingSuggestion {
    pub fn confidence(&self) -> f64 {
        self.0
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }
}

/// Facets recognised in a photo, used to turn an image into a catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchExtraction {
    pub make: String,
    pub body_type: String,
    pub color: String,
    pub confidence: f64,
}

impl SearchExtraction {
    /// Search parameters for the recognised make and body type. Color is not
    /// a catalog facet and is dropped.
    pub fn to_search_params(&self) -> SearchParams {
        let mut params = SearchParams::new();
        for (key, value) in [(MAKE, &self.make), (BODY_TYPE, &self.body_type)] {
            let value = value.trim();
            if !value.is_empty() {
                params.insert(key, value);
            }
        }
        params
    }
}

pub fn parse_listing_suggestion(reply: &str) -> Result<ListingSuggestion, ExtractionError> {
    parse_object(reply, LISTING_FIELDS).map(ListingSuggestion)
}

pub fn parse_search_extraction(reply: &str) -> Result<SearchExtraction, ExtractionError> {
    let object = parse_object(reply, SEARCH_FIELDS)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Parses `reply` as a JSON object holding every key in `required`.
pub fn parse_object(reply: &str, required: &[&str]) -> Result<Map<String, Value>, ExtractionError> {
    let cleaned = strip_code_fences(reply);
    let Value::Object(object) = serde_json::from_str(&cleaned)? else {
        return Err(ExtractionError::NotAnObject);
    };

    let missing: Vec<String> = required
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(ToString::to_string)
        .collect();

    if missing.is_empty() {
        Ok(object)
    } else {
        Err(ExtractionError::MissingFields(missing))
    }
}

/// Removes Markdown code fences (```` ``` ```` and ```` ```json ````).
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        rest = rest.strip_prefix("json").unwrap_or(rest);
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    out.push_str(rest);

    out.trim().to_string()
}

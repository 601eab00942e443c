//! Classification of pack entries and routing to REST endpoints.
//!
//! Entries are parsed only far enough to learn `resourceType` and `id`; the
//! bytes sent to the server are always the original ones.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Conformance resource types an IG pack is expected to carry.
pub const CONFORMANCE_RESOURCE_TYPES: &[&str] = &[
    "CodeSystem",
    "ValueSet",
    "ConceptMap",
    "SearchParameter",
    "OperationDefinition",
    "StructureDefinition",
    "CapabilityStatement",
    "ImplementationGuide",
];

pub fn is_conformance_type(resource_type: &str) -> bool {
    CONFORMANCE_RESOURCE_TYPES.contains(&resource_type)
}

/// Where a resource goes on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRoute {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// HTTP interaction used for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadMethod {
    /// `POST [base]/[type]`, server assigns the id
    #[serde(rename = "POST")]
    Create,
    /// `PUT [base]/[type]/[id]`
    #[serde(rename = "PUT")]
    Update,
}

impl UploadMethod {
    pub fn as_http(self) -> reqwest::Method {
        match self {
            Self::Create => reqwest::Method::POST,
            Self::Update => reqwest::Method::PUT,
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "POST"),
            Self::Update => write!(f, "PUT"),
        }
    }
}

/// The two members routing needs. Everything else in the document is
/// skipped without being materialized, so numbers of any size or precision
/// elsewhere in the resource do not affect classification.
#[derive(Deserialize)]
struct ResourceHead {
    #[serde(rename = "resourceType", default)]
    resource_type: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

impl ResourceRoute {
    /// Inspect raw entry bytes. Returns `None` for anything that is not a
    /// JSON object with a non-empty string `resourceType`.
    pub fn classify(data: &[u8]) -> Option<Self> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

        // A struct also deserializes from a JSON array; only objects count.
        if data.iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'{') {
            return None;
        }
        let head: ResourceHead = serde_json::from_slice(data).ok()?;

        let resource_type = non_empty_string(head.resource_type)?;
        // A non-string or empty id cannot address a resource; treat it as absent.
        let id = non_empty_string(head.id);

        Some(Self { resource_type, id })
    }

    pub fn method(&self) -> UploadMethod {
        if self.id.is_some() {
            UploadMethod::Update
        } else {
            UploadMethod::Create
        }
    }

    /// Build `{base}/{type}` or `{base}/{type}/{id}`, percent-encoding the
    /// segments. `base` must be a URL that can carry path segments.
    pub fn endpoint(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.resource_type);
            if let Some(id) = &self.id {
                segments.push(id);
            }
        }
        url
    }

    /// `Type/id` or `Type` for log lines.
    pub fn reference(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{}", self.resource_type, id),
            None => self.resource_type.clone(),
        }
    }
}

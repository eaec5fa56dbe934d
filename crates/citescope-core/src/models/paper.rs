use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider that produced a metadata record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceTag {
    OpenAlex,
    SemanticScholar,
    /// More than one distinct provider contributed to a merged record.
    Combined,
    #[default]
    Unknown,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::OpenAlex => "openalex",
            SourceTag::SemanticScholar => "semantic_scholar",
            SourceTag::Combined => "openalex+semantic_scholar",
            SourceTag::Unknown => "unknown",
        }
    }

    fn from_tag(tag: &str) -> SourceTag {
        match tag {
            "openalex" => SourceTag::OpenAlex,
            "semantic_scholar" => SourceTag::SemanticScholar,
            "openalex+semantic_scholar" => SourceTag::Combined,
            _ => SourceTag::Unknown,
        }
    }

    /// Tag for a record that merges `self` with a record tagged `other`.
    pub fn combine(self, other: SourceTag) -> SourceTag {
        if self == other { self } else { SourceTag::Combined }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for SourceTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(SourceTag::from_tag(&tag))
    }
}

/// One metadata record for a paper, as emitted by a single provider (or by
/// merging several, see [`crate::merge`]).
///
/// Every field is optional. An empty or wrong-typed value deserializes to
/// absent instead of failing the document, and absence is always `None` or
/// an empty list, never a sentinel value. A record with nothing set cannot
/// be resolved to a key and is ignored by every index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub openalex_id: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub s2_id: Option<String>,

    #[serde(default, deserialize_with = "de::string_list", skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, deserialize_with = "de::opt_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "de::opt_string", skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,

    #[serde(default, deserialize_with = "de::opt_count", skip_serializing_if = "Option::is_none")]
    pub cited_by_count: Option<u64>,

    #[serde(default, deserialize_with = "de::opt_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceTag>,
}

impl PaperRecord {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.doi.is_none()
            && self.arxiv_id.is_none()
            && self.openalex_id.is_none()
            && self.s2_id.is_none()
            && self.authors.is_empty()
            && self.year.is_none()
            && self.venue.is_none()
            && self.work_type.is_none()
            && self.cited_by_count.is_none()
            && self.source.is_none()
    }
}

/// Lenient field deserializers: a provider field of the wrong shape is
/// treated as absent, never as a document failure.
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::SourceTag;

    pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn opt_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok()))
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(Value::as_u64))
    }

    pub fn opt_source<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SourceTag>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(Value::as_str).map(SourceTag::from_tag))
    }
}

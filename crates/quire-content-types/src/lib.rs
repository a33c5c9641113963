//! Wire types for the subset of the Notion REST API that quire consumes.
//!
//! Every field a page or block may omit is optional or defaulted, so a sparse
//! record still deserializes. Interpretation of the values (which property is
//! the title, how tags are normalised) lives in the main crate.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page row of a database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    pub icon: Option<FileOrEmoji>,
    pub cover: Option<FileOrEmoji>,
    #[serde(deserialize_with = "null_as_default")]
    pub properties: HashMap<String, PropertyValue>,
    pub archived: bool,
}

impl PageRecord {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// Icon or cover reference. Exactly one of the payload fields is normally set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrEmoji {
    pub emoji: Option<String>,
    pub file: Option<FileRef>,
    pub external: Option<FileRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRef {
    pub url: Option<String>,
}

/// A property value. Only the payload matching the property type is
/// populated by the API; the others stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyValue {
    #[serde(deserialize_with = "null_as_default")]
    pub title: Vec<RichTextRun>,
    #[serde(deserialize_with = "null_as_default")]
    pub rich_text: Vec<RichTextRun>,
    #[serde(deserialize_with = "null_as_default")]
    pub people: Vec<Person>,
    pub number: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub multi_select: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextRun {
    #[serde(deserialize_with = "null_as_default")]
    pub plain_text: String,
    pub text: Option<TextContent>,
}

impl RichTextRun {
    /// Text content, preferring the raw `text.content` over `plain_text`.
    pub fn content(&self) -> &str {
        self.text
            .as_ref()
            .map(|text| text.content.as_str())
            .filter(|content| !content.is_empty())
            .unwrap_or(self.plain_text.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextContent {
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub person: Option<PersonDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonDetail {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// One content block. The type-specific payload sits under a key named after
/// the block type (`"heading_1": { "rich_text": [...] }`), so it is captured
/// loosely and read through [`BlockRecord::rich_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl BlockRecord {
    fn typed_payload(&self) -> Option<&Map<String, Value>> {
        self.payload.get(&self.kind).and_then(Value::as_object)
    }

    /// Plain text of every rich-text run in the block payload, in order.
    pub fn rich_text(&self) -> Vec<String> {
        self.typed_payload()
            .and_then(|payload| payload.get("rich_text"))
            .and_then(Value::as_array)
            .map(|runs| {
                runs.iter()
                    .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Language tag of a code block.
    pub fn language(&self) -> Option<String> {
        self.typed_payload()
            .and_then(|payload| payload.get("language"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Cursor-paginated list envelope shared by database queries and block listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Request body for `POST /v1/databases/{id}/query`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

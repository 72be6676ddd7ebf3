//! The final, ready-to-submit ticket request

use serde::Serialize;
use serde_json::{Map, Value};

use crate::value::{PropertyMap, PropertyValue};
use crate::{Error, Result};

/// Keys describing where to send the ticket rather than what it contains
pub const CONNECTION_KEYS: [&str; 1] = ["jira_url"];

/// Shorthand for the project key, sent as `project.key`
pub const PROJECT_KEY: &str = "project_key";

/// Payload path of the project key
const PROJECT_FIELD: &str = "project.key";

/// Title, connection settings and ticket fields. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRequest {
    title: String,
    settings: PropertyMap,
    fields: PropertyMap,
}

impl IssueRequest {
    /// Assemble a request. The title is kept verbatim but must not be blank.
    ///
    /// Connection keys such as `jira_url` move out of the fields into
    /// [`settings`](Self::settings). `project_key` becomes `project.key`
    /// unless `project.key` is already set.
    pub fn build(title: impl Into<String>, mut fields: PropertyMap) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::MissingTitle);
        }

        let mut settings = PropertyMap::new();
        for key in CONNECTION_KEYS {
            if let Some(value) = fields.remove(key) {
                settings.insert(key.to_string(), value);
            }
        }
        if let Some(project) = fields.remove(PROJECT_KEY) {
            fields.entry(PROJECT_FIELD.to_string()).or_insert(project);
        }

        Ok(Self {
            title,
            settings,
            fields,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Connection settings, never part of the payload
    pub fn settings(&self) -> &PropertyMap {
        &self.settings
    }

    pub fn jira_url(&self) -> Option<&str> {
        self.settings.get("jira_url").and_then(PropertyValue::as_str)
    }

    pub fn fields(&self) -> &PropertyMap {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&PropertyValue> {
        self.fields.get(key)
    }

    pub fn into_fields(self) -> PropertyMap {
        self.fields
    }

    /// Render the issue-creation body: `{"fields": {..., "summary": title}}`.
    ///
    /// Dotted keys become nested objects, so `issuetype.id` is sent as
    /// `{"issuetype": {"id": ...}}`. Lists are sent as JSON arrays. The
    /// title always wins over a `summary` property.
    pub fn to_payload(&self) -> Result<Value> {
        let mut fields = Map::new();
        for (key, value) in &self.fields {
            if !value.is_finite() {
                return Err(Error::invalid_document(format!(
                    "field '{}' is not a finite number",
                    key
                )));
            }
            insert_nested(&mut fields, key, value.to_json())?;
        }
        fields.insert("summary".to_string(), Value::String(self.title.clone()));

        let mut payload = Map::new();
        payload.insert("fields".to_string(), Value::Object(fields));
        Ok(Value::Object(payload))
    }
}

fn insert_nested(target: &mut Map<String, Value>, key: &str, value: Value) -> Result<()> {
    let conflict = || Error::PayloadConflict {
        key: key.to_string(),
    };

    let mut segments = key.split('.').peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if current.contains_key(segment) {
                return Err(conflict());
            }
            current.insert(segment.to_string(), value);
            return Ok(());
        }
        current = match current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            _ => return Err(conflict()),
        };
    }
    Ok(())
}

//! Record inputs and fetched record views.
//!
//! Two shapes of input are accepted for writes:
//! - objects that know their own type name (implement [`Record`] directly,
//!   or wrap fields in an [`Entity`]),
//! - plain [`Attributes`] mappings, whose type name must be passed in by
//!   the caller.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{RecordCacheError, Result};

/// A plain field-name to value mapping.
pub type Attributes = serde_json::Map<String, Value>;

/// Field names that carry the identifier and are never written as hash fields.
pub const ID_FIELDS: [&str; 2] = ["id", "_id"];

/// Capability of anything that can be cached as a hash.
pub trait Record {
    /// Own type name. Plain mappings have none.
    fn record_class(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Identifier, coerced to a string. `None` when missing.
    fn record_id(&self) -> Option<String>;

    /// All attributes. Identifier fields are stripped by the writer.
    fn attributes(&self) -> Attributes;
}

/// Anything usable as a record identifier. `None` means the id is missing.
pub trait RecordId {
    fn to_record_id(&self) -> Option<String>;
}

macro_rules! impl_record_id_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RecordId for $ty {
                fn to_record_id(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

impl_record_id_display!(str, String, i16, i32, i64, i128, u16, u32, u64, u128, isize, usize);

impl<T: RecordId + ?Sized> RecordId for &T {
    fn to_record_id(&self) -> Option<String> {
        (**self).to_record_id()
    }
}

impl<T: RecordId> RecordId for Option<T> {
    fn to_record_id(&self) -> Option<String> {
        self.as_ref().and_then(RecordId::to_record_id)
    }
}

impl RecordId for Value {
    fn to_record_id(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl Record for Attributes {
    fn record_id(&self) -> Option<String> {
        ID_FIELDS
            .iter()
            .find_map(|name| self.get(*name).and_then(RecordId::to_record_id))
    }

    fn attributes(&self) -> Attributes {
        self.clone()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn record_class(&self) -> Option<Cow<'_, str>> {
        (**self).record_class()
    }

    fn record_id(&self) -> Option<String> {
        (**self).record_id()
    }

    fn attributes(&self) -> Attributes {
        (**self).attributes()
    }
}

/// An object record: a type name plus its attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    class: String,
    fields: Attributes,
}

impl Entity {
    /// Create an entity from its type name and attributes.
    pub fn new(class: impl Into<String>, fields: Attributes) -> Self {
        Self {
            class: class.into(),
            fields,
        }
    }

    /// Build an entity from any serializable value.
    ///
    /// # Errors
    /// Fails if the value does not serialize to a JSON object.
    pub fn from_serialize<T: Serialize>(class: impl Into<String>, value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self::new(class, fields)),
            other => Err(RecordCacheError::Serialize(serde::ser::Error::custom(
                format!("expected an object, got {}", json_kind(&other)),
            ))),
        }
    }

    /// Type name of this entity.
    pub fn class(&self) -> &str {
        &self.class
    }
}

impl Record for Entity {
    fn record_class(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.class.as_str()))
    }

    fn record_id(&self) -> Option<String> {
        self.fields.record_id()
    }

    fn attributes(&self) -> Attributes {
        self.fields.clone()
    }
}

/// Flatten a record's attributes into hash fields, dropping identifier
/// fields and `null` values.
pub(crate) fn flatten_attributes(attributes: Attributes) -> HashMap<String, String> {
    attributes
        .into_iter()
        .filter(|(name, _)| !ID_FIELDS.contains(&name.as_str()))
        .filter_map(|(name, value)| field_to_string(value).map(|value| (name, value)))
        .collect()
}

/// String form of a value as stored in a hash field.
/// `null` has none, nested values become compact JSON.
fn field_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read-only view of a cached record with its identifier re-attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRecord {
    id: String,
    fields: HashMap<String, String>,
}

impl FetchedRecord {
    /// Combine stored fields with the identifier. A stored `id` field never
    /// shadows the identifier the record was fetched by.
    pub fn new(id: impl Into<String>, mut fields: HashMap<String, String>) -> Self {
        fields.remove("id");
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up an attribute. `"id"` answers the identifier.
    pub fn get(&self, field: &str) -> Option<&str> {
        if field == "id" {
            return Some(&self.id);
        }
        self.fields.get(field).map(String::as_str)
    }

    /// Stored fields, without the identifier.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Number of stored fields (the identifier is not counted).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_parts(self) -> (String, HashMap<String, String>) {
        (self.id, self.fields)
    }

    /// Deserialize the view (fields plus `id`, all as strings) into `T`.
    ///
    /// # Errors
    /// Fails if `T` does not accept string-valued fields.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::to_value(self).and_then(serde_json::from_value)?)
    }
}

impl Serialize for FetchedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixtures are objects"),
        }
    }

    #[test]
    fn test_mapping_id_falls_back_to_underscore_id() {
        assert_eq!(attrs(json!({"id": 1})).record_id().as_deref(), Some("1"));
        assert_eq!(attrs(json!({"_id": "abc"})).record_id().as_deref(), Some("abc"));
        assert_eq!(
            attrs(json!({"id": null, "_id": 7})).record_id().as_deref(),
            Some("7")
        );
        assert_eq!(attrs(json!({"name": "one"})).record_id(), None);
        assert!(attrs(json!({"id": 1})).record_class().is_none());
    }

    #[test]
    fn test_record_id_coercion() {
        assert_eq!(42u64.to_record_id().as_deref(), Some("42"));
        assert_eq!("abc".to_record_id().as_deref(), Some("abc"));
        assert_eq!(None::<i32>.to_record_id(), None);
        assert_eq!(Some(-3i64).to_record_id().as_deref(), Some("-3"));
        assert_eq!(json!(null).to_record_id(), None);
        assert_eq!(json!(7).to_record_id().as_deref(), Some("7"));
    }

    #[test]
    fn test_flatten_strips_ids_and_stringifies() {
        let flat = flatten_attributes(attrs(json!({
            "id": 1,
            "_id": "x",
            "name": "one",
            "age": 42,
            "score": 1.5,
            "active": true,
            "nickname": null,
            "tags": ["a", "b"],
        })));

        assert_eq!(flat.len(), 5);
        assert_eq!(flat["name"], "one");
        assert_eq!(flat["age"], "42");
        assert_eq!(flat["score"], "1.5");
        assert_eq!(flat["active"], "true");
        assert!(!flat.contains_key("nickname"));
        assert_eq!(flat["tags"], r#"["a","b"]"#);
        assert!(!flat.contains_key("id"));
        assert!(!flat.contains_key("_id"));
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: String,
        name: String,
    }

    #[test]
    fn test_entity_from_serialize() {
        let user = User {
            id: "5".into(),
            name: "Fred".into(),
        };
        let entity = Entity::from_serialize("User", &user).unwrap();
        assert_eq!(entity.record_class().as_deref(), Some("User"));
        assert_eq!(entity.record_id().as_deref(), Some("5"));

        let err = Entity::from_serialize("User", &42).unwrap_err();
        assert!(matches!(err, RecordCacheError::Serialize(_)));
    }

    #[test]
    fn test_fetched_record_view() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "Fred".to_string());
        fields.insert("id".to_string(), "stale".to_string());

        let record = FetchedRecord::new("5", fields);
        assert_eq!(record.id(), "5");
        assert_eq!(record.get("id"), Some("5"));
        assert_eq!(record.get("name"), Some("Fred"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 1);

        let user: User = record.deserialize_into().unwrap();
        assert_eq!(
            user,
            User {
                id: "5".into(),
                name: "Fred".into()
            }
        );
    }
}

//! Composite cache keys: `"<RecordClass>:<RecordID>"`.
//!
//! Every write and read goes through [`derive_key`] or
//! [`derive_key_from_id`], so the key format cannot drift between them.

use std::fmt;

use super::record::{Record, RecordId};
use crate::error::{RecordCacheError, Result};

/// Type labels of a generic mapping. A record class equal to one of these
/// means the caller never named a real type.
pub const GENERIC_MAPPING_LABELS: [&str; 2] = ["Hash", "Map"];

const SEPARATOR: char = ':';

/// A validated `"<class>:<id>"` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    key: String,
    class_len: usize,
}

impl CacheKey {
    /// Build a key from an explicit class and id.
    ///
    /// # Errors
    /// `MissingRecordClass` for an empty or generic class name, then
    /// `MissingRecordId` for an empty id.
    pub fn new(class: &str, id: &str) -> Result<Self> {
        let class = validate_class(Some(class))?;
        if id.is_empty() {
            return Err(RecordCacheError::MissingRecordId);
        }
        Ok(Self {
            key: format!("{class}{SEPARATOR}{id}"),
            class_len: class.len(),
        })
    }

    /// Split a stored key back into class and id.
    ///
    /// The id is everything after the last `:`, so namespaced classes
    /// such as `Admin::User` survive.
    pub fn parse(key: &str) -> Result<Self> {
        let (class, id) = key
            .rsplit_once(SEPARATOR)
            .ok_or(RecordCacheError::MissingRecordId)?;
        Self::new(class, id)
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn class(&self) -> &str {
        &self.key[..self.class_len]
    }

    pub fn id(&self) -> &str {
        &self.key[self.class_len + SEPARATOR.len_utf8()..]
    }

    pub fn into_string(self) -> String {
        self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.key
    }
}

/// Derive the key for a record.
///
/// The explicit class wins over the record's own type name. Plain mappings
/// have no type name, so for them the explicit class is required.
///
/// # Errors
/// `MissingRecordClass` when no usable class resolves, then
/// `MissingRecordId` when the record has no identifier.
pub fn derive_key<R: Record + ?Sized>(record: &R, explicit_class: Option<&str>) -> Result<CacheKey> {
    let own_class = record.record_class();
    let class = validate_class(explicit_class.or(own_class.as_deref()))?;
    let id = record.record_id().ok_or(RecordCacheError::MissingRecordId)?;
    CacheKey::new(class, &id)
}

/// Derive the key from an id/class pair supplied by a reader.
///
/// # Errors
/// Same rules as [`derive_key`].
pub fn derive_key_from_id<I: RecordId + ?Sized>(id: &I, class: Option<&str>) -> Result<CacheKey> {
    let class = validate_class(class)?;
    let id = id.to_record_id().ok_or(RecordCacheError::MissingRecordId)?;
    CacheKey::new(class, &id)
}

fn validate_class(class: Option<&str>) -> Result<&str> {
    match class {
        Some(class) if !class.is_empty() && !GENERIC_MAPPING_LABELS.contains(&class) => Ok(class),
        _ => Err(RecordCacheError::MissingRecordClass),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::record::{Attributes, Entity};
    use serde_json::json;

    fn mapping(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_mapping_needs_explicit_class() {
        let record = mapping(json!({"id": 1, "name": "one"}));

        assert_eq!(derive_key(&record, Some("User")).unwrap().as_str(), "User:1");
        assert!(matches!(
            derive_key(&record, None),
            Err(RecordCacheError::MissingRecordClass)
        ));
    }

    #[test]
    fn test_mapping_uses_underscore_id() {
        let record = mapping(json!({"_id": "507f1f77", "name": "one"}));
        assert_eq!(
            derive_key(&record, Some("User")).unwrap().as_str(),
            "User:507f1f77"
        );
    }

    #[test]
    fn test_missing_id() {
        let record = mapping(json!({"name": "one"}));
        assert!(matches!(
            derive_key(&record, Some("User")),
            Err(RecordCacheError::MissingRecordId)
        ));
    }

    #[test]
    fn test_generic_labels_are_not_classes() {
        let record = mapping(json!({"id": 1}));
        for label in ["Hash", "Map", ""] {
            assert!(matches!(
                derive_key(&record, Some(label)),
                Err(RecordCacheError::MissingRecordClass)
            ));
        }
    }

    #[test]
    fn test_object_defaults_to_own_class() {
        let entity = Entity::new("Article", mapping(json!({"id": 9, "title": "t"})));

        assert_eq!(derive_key(&entity, None).unwrap().as_str(), "Article:9");
        assert_eq!(
            derive_key(&entity, Some("Post")).unwrap().as_str(),
            "Post:9"
        );
    }

    #[test]
    fn test_derive_key_from_id() {
        assert_eq!(
            derive_key_from_id(&42, Some("User")).unwrap().as_str(),
            "User:42"
        );
        assert!(matches!(
            derive_key_from_id(&None::<u64>, Some("User")),
            Err(RecordCacheError::MissingRecordId)
        ));
        assert!(matches!(
            derive_key_from_id(&json!(null), Some("User")),
            Err(RecordCacheError::MissingRecordId)
        ));
        assert!(matches!(
            derive_key_from_id("1", None),
            Err(RecordCacheError::MissingRecordClass)
        ));
    }

    #[test]
    fn test_key_parts_and_parse() {
        let key = CacheKey::new("Admin::User", "7").unwrap();
        assert_eq!(key.as_str(), "Admin::User:7");
        assert_eq!(key.class(), "Admin::User");
        assert_eq!(key.id(), "7");

        let parsed = CacheKey::parse("Admin::User:7").unwrap();
        assert_eq!(parsed, key);
        assert_eq!(key.to_string(), "Admin::User:7");

        assert!(CacheKey::parse("nocolon").is_err());
    }

    #[test]
    fn test_empty_id_is_missing() {
        assert!(matches!(
            derive_key_from_id("", Some("User")),
            Err(RecordCacheError::MissingRecordId)
        ));
        assert!(matches!(
            derive_key(&mapping(json!({"id": ""})), Some("User")),
            Err(RecordCacheError::MissingRecordId)
        ));
        assert!(matches!(
            CacheKey::new("User", ""),
            Err(RecordCacheError::MissingRecordId)
        ));
        assert!(matches!(
            CacheKey::parse("User:"),
            Err(RecordCacheError::MissingRecordId)
        ));
    }
}

//! Declarative per-field input validation, run synchronously before any
//! persistence attempt. Errors mirror the per-field constraint shape that
//! API clients already consume.

use serde::Serialize;
use std::collections::BTreeMap;

/// One rejected field with its violated constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub property: String,
    pub constraints: BTreeMap<String, String>,
}

impl FieldError {
    fn single(property: &str, rule: &str, message: String) -> Self {
        let mut constraints = BTreeMap::new();
        constraints.insert(rule.to_string(), message);
        Self { property: property.to_string(), constraints }
    }

    pub fn required(property: &str, label: &str) -> Self {
        Self::single(property, "isNotEmpty", format!("{} is required", label))
    }

    pub fn duplicate(property: &str) -> Self {
        Self::single(property, "isUnique", format!("{} already exists", property))
    }

    pub fn invalid_enum(property: &str, message: &str) -> Self {
        Self::single(property, "isEnum", message.to_string())
    }
}

pub const CORE_TYPE_MESSAGE: &str = "Core Type should only contain music, sermon or music-sermon";
pub const OFFICE_MESSAGE: &str =
    "Office should only contain apostle, prophet, evangelist, pastor, teacher";

/// Classification shared by media tags and ministers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreType {
    Music,
    Sermon,
    MusicSermon,
}

impl CoreType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "music" => Some(CoreType::Music),
            "sermon" => Some(CoreType::Sermon),
            "music-sermon" => Some(CoreType::MusicSermon),
            _ => None,
        }
    }
}

/// Fivefold office classification for ministers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Office {
    Apostle,
    Prophet,
    Evangelist,
    Pastor,
    Teacher,
}

impl Office {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "apostle" => Some(Office::Apostle),
            "prophet" => Some(Office::Prophet),
            "evangelist" => Some(Office::Evangelist),
            "pastor" => Some(Office::Pastor),
            "teacher" => Some(Office::Teacher),
            _ => None,
        }
    }
}

/// Push a required-field error when the value is missing or blank.
pub fn require(errors: &mut Vec<FieldError>, property: &str, label: &str, value: Option<&str>) {
    match value {
        Some(v) if !v.trim().is_empty() => {}
        _ => errors.push(FieldError::required(property, label)),
    }
}

/// Validate an optional enum-domain field against its parser.
pub fn check_enum<T>(
    errors: &mut Vec<FieldError>,
    property: &str,
    message: &str,
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) {
    if let Some(v) = value {
        if parse(v).is_none() {
            errors.push(FieldError::invalid_enum(property, message));
        }
    }
}

pub fn has_errors(errors: &[FieldError]) -> bool {
    !errors.is_empty()
}

/// Serialize collected field errors into the FAILED_VALIDATION payload.
pub fn failure_payload(errors: &[FieldError]) -> serde_json::Value {
    serde_json::to_value(errors).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_missing_and_blank() {
        let mut errors = Vec::new();
        require(&mut errors, "name", "Name", None);
        require(&mut errors, "name", "Name", Some("   "));
        require(&mut errors, "name", "Name", Some("Grace FM"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].constraints["isNotEmpty"], "Name is required");
    }

    #[test]
    fn core_type_domain() {
        assert!(CoreType::parse("music").is_some());
        assert!(CoreType::parse("sermon").is_some());
        assert!(CoreType::parse("music-sermon").is_some());
        assert!(CoreType::parse("podcast").is_none());
    }

    #[test]
    fn office_domain() {
        for office in ["apostle", "prophet", "evangelist", "pastor", "teacher"] {
            assert!(Office::parse(office).is_some(), "{} should parse", office);
        }
        assert!(Office::parse("bishop").is_none());
    }

    #[test]
    fn check_enum_only_rejects_present_invalid_values() {
        let mut errors = Vec::new();
        check_enum(&mut errors, "coreType", CORE_TYPE_MESSAGE, None, CoreType::parse);
        assert!(errors.is_empty());

        check_enum(&mut errors, "coreType", CORE_TYPE_MESSAGE, Some("podcast"), CoreType::parse);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].constraints["isEnum"], CORE_TYPE_MESSAGE);
    }

    #[test]
    fn field_error_serializes_like_class_validator_output() {
        let err = FieldError::invalid_enum("coreType", CORE_TYPE_MESSAGE);
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["property"], "coreType");
        assert_eq!(value["constraints"]["isEnum"], CORE_TYPE_MESSAGE);
    }
}

//! Entity services. Each composes validation, document construction and the
//! aspect wrappers into its create/read/update/delete flows, plus whatever
//! bespoke operations the entity carries.

pub mod channel;
pub mod channel_link;
pub mod media;
pub mod media_tag;
pub mod minister;

use serde::Deserialize;
use serde_json::Value;

/// Input fields that accept a scalar or a list and are stored as arrays.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        value.into_vec()
    }
}

/// Explicit update operation for multi-valued reference fields:
/// `{"append": <id | [ids]>}` pushes onto the stored set,
/// `{"replace": [ids]}` swaps it wholesale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssocPatch<T> {
    Append(OneOrMany<T>),
    Replace(Vec<T>),
}

impl<T> AssocPatch<T> {
    pub fn apply(self, existing: Vec<T>) -> Vec<T> {
        match self {
            AssocPatch::Append(values) => {
                let mut merged = existing;
                merged.extend(values.into_vec());
                merged
            }
            AssocPatch::Replace(values) => values,
        }
    }
}

/// Apply an optional association patch against the stored value of `field`
/// inside a fetched document.
fn patch_field<T>(patch: Option<AssocPatch<T>>, doc: &Value, field: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    let existing = doc
        .get(field)
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<T>>(v).ok())
        .unwrap_or_default();

    match patch {
        Some(patch) => patch.apply(existing),
        None => existing,
    }
}

fn value_string(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Patchy {
        tags: Option<AssocPatch<String>>,
    }

    #[test]
    fn one_or_many_accepts_both_shapes() {
        let one: OneOrMany<String> = serde_json::from_value(json!("solo")).unwrap();
        assert_eq!(one.into_vec(), vec!["solo"]);

        let many: OneOrMany<String> = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(many.into_vec(), vec!["a", "b"]);
    }

    #[test]
    fn append_patch_extends_existing_values() {
        let input: Patchy = serde_json::from_value(json!({"tags": {"append": "worship"}})).unwrap();
        let merged = input.tags.unwrap().apply(vec!["praise".to_string()]);
        assert_eq!(merged, vec!["praise", "worship"]);
    }

    #[test]
    fn replace_patch_discards_existing_values() {
        let input: Patchy =
            serde_json::from_value(json!({"tags": {"replace": ["worship"]}})).unwrap();
        let merged = input.tags.unwrap().apply(vec!["praise".to_string(), "hymns".to_string()]);
        assert_eq!(merged, vec!["worship"]);
    }

    #[test]
    fn patch_field_reads_stored_arrays() {
        let id = Uuid::new_v4();
        let doc = json!({ "mediaTag": [id.to_string()] });

        let untouched: Vec<Uuid> = patch_field(None, &doc, "mediaTag");
        assert_eq!(untouched, vec![id]);

        let extra = Uuid::new_v4();
        let patched: Vec<Uuid> = patch_field(
            Some(AssocPatch::Append(OneOrMany::One(extra))),
            &doc,
            "mediaTag",
        );
        assert_eq!(patched, vec![id, extra]);
    }
}

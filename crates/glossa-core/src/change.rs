//! Field-level change descriptions produced by term updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One changed field. `old_value` is absent for additions, `new_value` for
/// deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// Diff between the original and updated version of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescription {
    pub fields_added: Vec<FieldChange>,
    pub fields_updated: Vec<FieldChange>,
    pub fields_deleted: Vec<FieldChange>,
}

impl ChangeDescription {
    pub fn is_empty(&self) -> bool {
        self.fields_added.is_empty()
            && self.fields_updated.is_empty()
            && self.fields_deleted.is_empty()
    }

    /// Record a scalar change. Nothing is recorded when the values are equal.
    pub fn record_change<T: Serialize + PartialEq>(
        &mut self,
        field: &str,
        original: &Option<T>,
        updated: &Option<T>,
    ) {
        if original == updated {
            return;
        }
        let old_value = original.as_ref().and_then(|v| serde_json::to_value(v).ok());
        let new_value = updated.as_ref().and_then(|v| serde_json::to_value(v).ok());
        let change = FieldChange {
            name: field.to_string(),
            old_value,
            new_value,
        };
        match (original.is_some(), updated.is_some()) {
            (false, true) => self.fields_added.push(change),
            (true, false) => self.fields_deleted.push(change),
            _ => self.fields_updated.push(change),
        }
    }

    /// Record a set-style change between two lists, comparing with `same`.
    ///
    /// Returns `(added, deleted)` so the caller can act on them (e.g. add and
    /// remove edges).
    pub fn record_list_change<T, F>(
        &mut self,
        field: &str,
        original: &[T],
        updated: &[T],
        same: F,
    ) -> (Vec<T>, Vec<T>)
    where
        T: Serialize + Clone,
        F: Fn(&T, &T) -> bool,
    {
        let added: Vec<T> = updated
            .iter()
            .filter(|u| !original.iter().any(|o| same(o, u)))
            .cloned()
            .collect();
        let deleted: Vec<T> = original
            .iter()
            .filter(|o| !updated.iter().any(|u| same(o, u)))
            .cloned()
            .collect();

        if !added.is_empty() {
            self.fields_added.push(FieldChange {
                name: field.to_string(),
                old_value: None,
                new_value: serde_json::to_value(&added).ok(),
            });
        }
        if !deleted.is_empty() {
            self.fields_deleted.push(FieldChange {
                name: field.to_string(),
                old_value: serde_json::to_value(&deleted).ok(),
                new_value: None,
            });
        }
        (added, deleted)
    }

    /// Names of every field touched, in recording order per bucket.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.fields_added
            .iter()
            .chain(&self.fields_updated)
            .chain(&self.fields_deleted)
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_change_buckets() {
        let mut change = ChangeDescription::default();
        change.record_change("description", &None, &Some("a".to_string()));
        change.record_change("displayName", &Some("x".to_string()), &None);
        change.record_change("name", &Some("Fruit"), &Some("Produce"));
        change.record_change("status", &Some("Draft"), &Some("Draft"));

        assert_eq!(change.fields_added.len(), 1);
        assert_eq!(change.fields_deleted.len(), 1);
        assert_eq!(change.fields_updated.len(), 1);
        assert_eq!(change.fields_updated[0].new_value, Some(Value::from("Produce")));
        assert!(!change.changed_fields().contains(&"status"));
    }

    #[test]
    fn test_record_list_change() {
        let mut change = ChangeDescription::default();
        let original = vec!["a".to_string(), "b".to_string()];
        let updated = vec!["b".to_string(), "c".to_string()];
        let (added, deleted) = change.record_list_change("synonyms", &original, &updated, |x, y| x == y);

        assert_eq!(added, vec!["c".to_string()]);
        assert_eq!(deleted, vec!["a".to_string()]);
        assert_eq!(change.changed_fields(), vec!["synonyms", "synonyms"]);
    }

    #[test]
    fn test_unchanged_list_records_nothing() {
        let mut change = ChangeDescription::default();
        let list = vec![1, 2, 3];
        let (added, deleted) = change.record_list_change("refs", &list, &list, |x, y| x == y);
        assert!(added.is_empty() && deleted.is_empty());
        assert!(change.is_empty());
    }
}

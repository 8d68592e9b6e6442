//! Search documents for glossary terms.

use serde::Serialize;
use serde_json::{Map, Value};

use glossa_core::{EntityType, GlossaryTerm, Result};

/// Weight given to both name and FQN completion suggestions.
const SUGGEST_WEIGHT: u32 = 5;

/// Fields never indexed.
const EXCLUDED_FIELDS: &[&str] = &["usageCount"];

/// A completion suggester input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSuggest {
    pub input: String,
    pub weight: u32,
}

/// Build the index document for `term`.
///
/// The document is the serialized term plus `suggest` entries for its name
/// and FQN and an `entityType` discriminator. An owner without a display
/// name is shown by its name.
pub fn term_document(term: &GlossaryTerm) -> Result<Value> {
    let mut term = term.clone();
    if let Some(owner) = term.owner.as_mut() {
        if owner.display_name.as_deref().map_or(true, str::is_empty) {
            owner.display_name = Some(owner.name.clone());
        }
    }

    let mut doc: Map<String, Value> = match serde_json::to_value(&term)? {
        Value::Object(map) => map,
        other => {
            return Err(glossa_core::Error::Serialization(format!(
                "term serialized to a non-object: {}",
                other
            )))
        }
    };
    for field in EXCLUDED_FIELDS {
        doc.remove(*field);
    }

    let suggest = vec![
        SearchSuggest {
            input: term.name.clone(),
            weight: SUGGEST_WEIGHT,
        },
        SearchSuggest {
            input: term.fully_qualified_name.clone(),
            weight: SUGGEST_WEIGHT,
        },
    ];
    doc.insert("suggest".to_string(), serde_json::to_value(suggest)?);
    doc.insert(
        "entityType".to_string(),
        Value::String(EntityType::GlossaryTerm.to_string()),
    );
    Ok(Value::Object(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::EntityReference;
    use uuid::Uuid;

    #[test]
    fn test_term_document_fields() {
        let mut term = GlossaryTerm::new(Uuid::new_v4(), "Apple", "G.Fruit.Apple");
        term.usage_count = Some(3);
        term.owner = Some(EntityReference::new(
            Uuid::new_v4(),
            EntityType::User,
            "alice",
            "alice",
        ));

        let doc = term_document(&term).unwrap();
        assert_eq!(doc["entityType"], "glossaryTerm");
        assert_eq!(doc["fullyQualifiedName"], "G.Fruit.Apple");
        assert_eq!(doc["suggest"][0]["input"], "Apple");
        assert_eq!(doc["suggest"][1]["input"], "G.Fruit.Apple");
        assert_eq!(doc["owner"]["displayName"], "alice");
        assert!(doc.get("usageCount").is_none());
    }
}

//! Tag labels and the tag-usage reverse index.

use serde::{Deserialize, Serialize};

use crate::models::EntityType;

/// Origin of a label: a classification tag or a glossary term.
///
/// Each source knows which entity type holds its labels (`node_type`) and
/// which entity type groups them (`container_type`). Scope resolution for
/// mutual exclusivity goes through this table instead of branching on the
/// source at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagSource {
    Classification,
    Glossary,
}

impl TagSource {
    /// Entity type of the top-level container (`Classification` or `Glossary`).
    pub fn container_type(self) -> EntityType {
        match self {
            TagSource::Classification => EntityType::Classification,
            TagSource::Glossary => EntityType::Glossary,
        }
    }

    /// Entity type of an individual label (`Tag` or `GlossaryTerm`).
    pub fn node_type(self) -> EntityType {
        match self {
            TagSource::Classification => EntityType::Tag,
            TagSource::Glossary => EntityType::GlossaryTerm,
        }
    }

    /// Entity type of the scope that directly owns the label at `fqn_depth`
    /// parts: the container for top-level labels, otherwise the parent node.
    pub fn scope_type(self, fqn_depth: usize) -> EntityType {
        if fqn_depth <= 2 {
            self.container_type()
        } else {
            self.node_type()
        }
    }

    /// Stable integer used by the persistence layer.
    pub fn ordinal(self) -> i16 {
        match self {
            TagSource::Classification => 0,
            TagSource::Glossary => 1,
        }
    }

    pub fn from_ordinal(ordinal: i16) -> Option<Self> {
        match ordinal {
            0 => Some(TagSource::Classification),
            1 => Some(TagSource::Glossary),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classification => write!(f, "Classification"),
            Self::Glossary => write!(f, "Glossary"),
        }
    }
}

/// How a label came to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LabelType {
    #[default]
    Manual,
    Propagated,
    Automated,
    /// Applied because the entity is tagged with a term that carries the label.
    Derived,
}

impl LabelType {
    pub fn ordinal(self) -> i16 {
        match self {
            LabelType::Manual => 0,
            LabelType::Propagated => 1,
            LabelType::Automated => 2,
            LabelType::Derived => 3,
        }
    }

    pub fn from_ordinal(ordinal: i16) -> Option<Self> {
        match ordinal {
            0 => Some(LabelType::Manual),
            1 => Some(LabelType::Propagated),
            2 => Some(LabelType::Automated),
            3 => Some(LabelType::Derived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LabelState {
    Suggested,
    #[default]
    Confirmed,
}

impl LabelState {
    pub fn ordinal(self) -> i16 {
        match self {
            LabelState::Suggested => 0,
            LabelState::Confirmed => 1,
        }
    }

    pub fn from_ordinal(ordinal: i16) -> Option<Self> {
        match ordinal {
            0 => Some(LabelState::Suggested),
            1 => Some(LabelState::Confirmed),
            _ => None,
        }
    }
}

/// A label applied to an entity, pointing at a tag or glossary term by FQN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagLabel {
    #[serde(rename = "tagFQN")]
    pub tag_fqn: String,
    pub source: TagSource,
    #[serde(default)]
    pub label_type: LabelType,
    #[serde(default)]
    pub state: LabelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TagLabel {
    /// A confirmed manual label for a glossary term.
    pub fn glossary_term(tag_fqn: impl Into<String>) -> Self {
        Self::new(tag_fqn, TagSource::Glossary)
    }

    /// A confirmed manual label for a classification tag.
    pub fn classification_tag(tag_fqn: impl Into<String>) -> Self {
        Self::new(tag_fqn, TagSource::Classification)
    }

    pub fn new(tag_fqn: impl Into<String>, source: TagSource) -> Self {
        Self {
            tag_fqn: tag_fqn.into(),
            source,
            label_type: LabelType::default(),
            state: LabelState::default(),
            name: None,
            display_name: None,
            description: None,
        }
    }

    pub fn with_label_type(mut self, label_type: LabelType) -> Self {
        self.label_type = label_type;
        self
    }

    /// Labels are identified by source and FQN; descriptive fields and the
    /// label type do not affect identity.
    pub fn same_tag(&self, other: &TagLabel) -> bool {
        self.source == other.source && self.tag_fqn == other.tag_fqn
    }
}

/// One row of the tag-usage reverse index: `tag_fqn` is applied to `target_fqn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUsage {
    pub source: TagSource,
    #[serde(rename = "tagFQN")]
    pub tag_fqn: String,
    pub target_fqn: String,
    pub label_type: LabelType,
    pub state: LabelState,
    pub count: i64,
}

impl TagUsage {
    pub fn from_label(label: &TagLabel, target_fqn: impl Into<String>) -> Self {
        Self {
            source: label.source,
            tag_fqn: label.tag_fqn.clone(),
            target_fqn: target_fqn.into(),
            label_type: label.label_type,
            state: label.state,
            count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_source_behaviour_table() {
        assert_eq!(TagSource::Glossary.container_type(), EntityType::Glossary);
        assert_eq!(TagSource::Glossary.node_type(), EntityType::GlossaryTerm);
        assert_eq!(
            TagSource::Classification.container_type(),
            EntityType::Classification
        );
        assert_eq!(TagSource::Classification.node_type(), EntityType::Tag);
    }

    #[test]
    fn test_scope_type_by_depth() {
        // "G.Apple" is owned by glossary G, "G.Fruit.Apple" by term G.Fruit
        assert_eq!(TagSource::Glossary.scope_type(2), EntityType::Glossary);
        assert_eq!(TagSource::Glossary.scope_type(3), EntityType::GlossaryTerm);
        assert_eq!(TagSource::Classification.scope_type(2), EntityType::Classification);
    }

    #[test]
    fn test_ordinals_round_trip() {
        for s in [TagSource::Classification, TagSource::Glossary] {
            assert_eq!(TagSource::from_ordinal(s.ordinal()), Some(s));
        }
        for t in [
            LabelType::Manual,
            LabelType::Propagated,
            LabelType::Automated,
            LabelType::Derived,
        ] {
            assert_eq!(LabelType::from_ordinal(t.ordinal()), Some(t));
        }
        assert_eq!(LabelState::from_ordinal(7), None);
    }

    #[test]
    fn test_tag_label_wire_names() {
        let label = TagLabel::glossary_term("G.Fruit");
        let json = serde_json::to_value(&label).unwrap();
        assert_eq!(json["tagFQN"], "G.Fruit");
        assert_eq!(json["source"], "Glossary");
        assert_eq!(json["labelType"], "Manual");
        assert_eq!(json["state"], "Confirmed");
    }

    #[test]
    fn test_same_tag_ignores_label_type() {
        let a = TagLabel::glossary_term("G.Fruit");
        let b = TagLabel::glossary_term("G.Fruit").with_label_type(LabelType::Derived);
        let c = TagLabel::classification_tag("G.Fruit");
        assert!(a.same_tag(&b));
        assert!(!a.same_tag(&c));
    }

    #[test]
    fn test_usage_from_label() {
        let usage = TagUsage::from_label(&TagLabel::glossary_term("G.Fruit"), "db.orders");
        assert_eq!(usage.tag_fqn, "G.Fruit");
        assert_eq!(usage.target_fqn, "db.orders");
        assert_eq!(usage.count, 1);
    }
}

//! Hierarchy validation.
//!
//! Every check here runs while a mutation is being prepared, before the
//! first write, so a rejected mutation leaves no trace.

use glossa_core::{fqn, Error, Glossary, GlossaryTerm, Result};

/// Reject names that cannot be part of an FQN.
pub fn validate_name(name: &str) -> Result<()> {
    fqn::quote_name(name).map(|_| ())
}

/// The parent term must live inside the declared glossary.
pub fn validate_new_parent(glossary: &Glossary, parent: &GlossaryTerm) -> Result<()> {
    if !fqn::is_descendant(&glossary.fully_qualified_name, &parent.fully_qualified_name) {
        return Err(Error::InvalidHierarchy(format!(
            "parent term [{}] does not belong to glossary [{}]",
            parent.fully_qualified_name, glossary.fully_qualified_name
        )));
    }
    Ok(())
}

/// A term cannot be moved under itself or any of its descendants.
pub fn validate_move(original_fqn: &str, new_parent_fqn: &str) -> Result<()> {
    if fqn::is_ancestor(original_fqn, new_parent_fqn) {
        return Err(Error::InvalidMove(format!(
            "cannot move term [{}] under [{}], which is the term itself or one of its descendants",
            original_fqn, new_parent_fqn
        )));
    }
    Ok(())
}

/// System-provided terms keep their name.
pub fn validate_rename(original: &GlossaryTerm, new_name: &str) -> Result<()> {
    if original.is_system() && original.name != new_name {
        return Err(Error::PermissionDenied(format!(
            "system term [{}] cannot be renamed",
            original.fully_qualified_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::ProviderType;
    use uuid::Uuid;

    fn glossary(name: &str) -> Glossary {
        Glossary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            fully_qualified_name: name.to_string(),
            display_name: None,
            description: None,
            mutually_exclusive: false,
            owner: None,
            reviewers: vec![],
            domain: None,
            deleted: false,
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Fruit").is_ok());
        assert!(validate_name("Q1.2026").is_ok());
        assert!(matches!(validate_name(""), Err(Error::InvalidInput(_))));
        assert!(matches!(validate_name("a\"b"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_parent_must_be_inside_glossary() {
        let g = glossary("G");
        let inside = GlossaryTerm::new(Uuid::new_v4(), "Fruit", "G.Fruit");
        let outside = GlossaryTerm::new(Uuid::new_v4(), "Fruit", "H.Fruit");
        let lookalike = GlossaryTerm::new(Uuid::new_v4(), "Fruit", "GX.Fruit");

        assert!(validate_new_parent(&g, &inside).is_ok());
        assert!(matches!(
            validate_new_parent(&g, &outside),
            Err(Error::InvalidHierarchy(_))
        ));
        assert!(matches!(
            validate_new_parent(&g, &lookalike),
            Err(Error::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn test_move_under_descendant_rejected() {
        assert!(matches!(
            validate_move("G.Fruit", "G.Fruit.Apple"),
            Err(Error::InvalidMove(_))
        ));
        assert!(matches!(
            validate_move("G.Fruit", "G.Fruit"),
            Err(Error::InvalidMove(_))
        ));
        assert!(validate_move("G.Fruit", "G.FruitBowl").is_ok());
        assert!(validate_move("G.Fruit.Apple", "G.Fruit").is_ok());
    }

    #[test]
    fn test_system_term_rename_denied() {
        let mut term = GlossaryTerm::new(Uuid::new_v4(), "PII", "G.PII");
        assert!(validate_rename(&term, "Personal").is_ok());

        term.provider = ProviderType::System;
        assert!(matches!(
            validate_rename(&term, "Personal"),
            Err(Error::PermissionDenied(_))
        ));
        assert!(validate_rename(&term, "PII").is_ok());
    }
}

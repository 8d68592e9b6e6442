//! Fully qualified names.
//!
//! A fully qualified name (FQN) is the delimiter-joined path from a glossary
//! through every ancestor term to an entity's local name, e.g.
//! `Business.Finance.Revenue`. Parts containing the delimiter are wrapped in
//! double quotes (`Business."Q1.2026"`), so the delimiter stays unambiguous.
//!
//! Everything here is pure: no lookups, no I/O. The only failure mode is
//! malformed input, reported as [`Error::InvalidInput`].

use crate::error::{Error, Result};

/// Separator between FQN parts.
pub const SEPARATOR: char = '.';

const QUOTE: char = '"';

/// Quote a local name for inclusion in an FQN.
///
/// Empty names and names containing a double quote are rejected.
pub fn quote_name(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    if name.contains(QUOTE) {
        return Err(Error::InvalidInput(format!(
            "name [{}] must not contain a double quote",
            name
        )));
    }
    if name.contains(SEPARATOR) {
        Ok(format!("{QUOTE}{name}{QUOTE}"))
    } else {
        Ok(name.to_string())
    }
}

/// Strip the surrounding quotes added by [`quote_name`], if any.
pub fn unquote_name(part: &str) -> String {
    if part.len() >= 2 && part.starts_with(QUOTE) && part.ends_with(QUOTE) {
        part[1..part.len() - 1].to_string()
    } else {
        part.to_string()
    }
}

/// Build an FQN from local names, root first.
pub fn build<S: AsRef<str>>(parts: &[S]) -> Result<String> {
    if parts.is_empty() {
        return Err(Error::InvalidInput(
            "an FQN needs at least one part".to_string(),
        ));
    }
    let quoted = parts
        .iter()
        .map(|p| quote_name(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(&SEPARATOR.to_string()))
}

/// Append a local name to an existing FQN.
pub fn add(parent_fqn: &str, name: &str) -> Result<String> {
    if parent_fqn.is_empty() {
        return Err(Error::InvalidInput(
            "parent FQN must not be empty".to_string(),
        ));
    }
    Ok(format!("{}{}{}", parent_fqn, SEPARATOR, quote_name(name)?))
}

/// Split an FQN into its unquoted local names.
pub fn split(fqn: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in fqn.chars() {
        match c {
            QUOTE => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            SEPARATOR if !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(Error::InvalidInput(format!(
            "unbalanced quotes in FQN [{}]",
            fqn
        )));
    }
    parts.push(current);

    if parts.iter().any(|p| p.is_empty() || p == "\"\"") {
        return Err(Error::InvalidInput(format!("empty part in FQN [{}]", fqn)));
    }
    Ok(parts.iter().map(|p| unquote_name(p)).collect())
}

/// FQN of the parent scope, or `None` for a single-part (root) FQN.
pub fn parent_of(fqn: &str) -> Result<Option<String>> {
    let parts = split(fqn)?;
    if parts.len() <= 1 {
        return Ok(None);
    }
    build(&parts[..parts.len() - 1]).map(Some)
}

/// Local (last) name of an FQN, unquoted.
pub fn local_name(fqn: &str) -> Result<String> {
    let mut parts = split(fqn)?;
    parts
        .pop()
        .ok_or_else(|| Error::InvalidInput(format!("empty FQN [{}]", fqn)))
}

/// True iff `fqn` is `ancestor` itself or lies beneath it.
pub fn is_ancestor(ancestor: &str, fqn: &str) -> bool {
    if ancestor.is_empty() {
        return false;
    }
    fqn == ancestor || is_descendant(ancestor, fqn)
}

/// True iff `fqn` lies strictly beneath `ancestor`.
pub fn is_descendant(ancestor: &str, fqn: &str) -> bool {
    !ancestor.is_empty()
        && fqn.len() > ancestor.len()
        && fqn.starts_with(ancestor)
        && fqn[ancestor.len()..].starts_with(SEPARATOR)
}

/// Rewrite the `old_prefix` of `fqn` to `new_prefix`.
///
/// Returns `None` when `fqn` is not `old_prefix` or one of its descendants,
/// which makes repeated rewrites with the same pair a no-op.
pub fn replace_prefix(fqn: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if is_ancestor(old_prefix, fqn) {
        Some(format!("{}{}", new_prefix, &fqn[old_prefix.len()..]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_add() {
        assert_eq!(build(&["G", "Fruit"]).unwrap(), "G.Fruit");
        assert_eq!(add("G.Fruit", "Apple").unwrap(), "G.Fruit.Apple");
        assert_eq!(build(&["G"]).unwrap(), "G");
    }

    #[test]
    fn test_names_with_separator_are_quoted() {
        let fqn = add("Finance", "Q1.2026").unwrap();
        assert_eq!(fqn, "Finance.\"Q1.2026\"");
        assert_eq!(split(&fqn).unwrap(), vec!["Finance", "Q1.2026"]);
        assert_eq!(local_name(&fqn).unwrap(), "Q1.2026");
    }

    #[test]
    fn test_empty_and_quoted_names_rejected() {
        assert!(matches!(add("G", ""), Err(Error::InvalidInput(_))));
        assert!(matches!(add("G", "   "), Err(Error::InvalidInput(_))));
        assert!(matches!(build(&["G", "say \"hi\""]), Err(Error::InvalidInput(_))));
        assert!(matches!(add("", "x"), Err(Error::InvalidInput(_))));
        let empty: [&str; 0] = [];
        assert!(build(&empty).is_err());
    }

    #[test]
    fn test_split_rejects_malformed() {
        assert!(split("G..a").is_err());
        assert!(split("G.\"a.b").is_err());
        assert!(split(".G").is_err());
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("G.Fruit.Apple").unwrap(), Some("G.Fruit".to_string()));
        assert_eq!(parent_of("G.Fruit").unwrap(), Some("G".to_string()));
        assert_eq!(parent_of("G").unwrap(), None);
        assert_eq!(
            parent_of("G.\"a.b\".c").unwrap(),
            Some("G.\"a.b\"".to_string())
        );
    }

    #[test]
    fn test_is_ancestor() {
        assert!(is_ancestor("G.Fruit", "G.Fruit"));
        assert!(is_ancestor("G.Fruit", "G.Fruit.Apple"));
        assert!(is_ancestor("G", "G.Fruit.Apple.RedDelicious"));
        // A shared string prefix is not enough
        assert!(!is_ancestor("G.Fruit", "G.FruitBowl"));
        assert!(!is_ancestor("G.Fruit.Apple", "G.Fruit"));
        assert!(!is_ancestor("", "G"));
    }

    #[test]
    fn test_is_descendant_is_strict() {
        assert!(!is_descendant("G.Fruit", "G.Fruit"));
        assert!(is_descendant("G.Fruit", "G.Fruit.Apple"));
    }

    #[test]
    fn test_replace_prefix() {
        assert_eq!(
            replace_prefix("G.Fruit.Apple", "G.Fruit", "G.Produce"),
            Some("G.Produce.Apple".to_string())
        );
        assert_eq!(
            replace_prefix("G.Fruit", "G.Fruit", "H.Fruit"),
            Some("H.Fruit".to_string())
        );
        assert_eq!(replace_prefix("G.FruitBowl", "G.Fruit", "G.Produce"), None);
        // Second application over rewritten data changes nothing
        assert_eq!(replace_prefix("G.Produce.Apple", "G.Fruit", "G.Produce"), None);
    }
}

use serde::Serialize;
use std::fmt;

/// Words that must be quoted when rendered as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "ALL",
    "AND",
    "ANY",
    "AS",
    "ASC",
    "BETWEEN",
    "BY",
    "CROSS",
    "DESC",
    "DISTINCT",
    "EXCEPT",
    "EXISTS",
    "FALSE",
    "FROM",
    "FULL",
    "GROUP",
    "HAVING",
    "IN",
    "INNER",
    "INTERSECT",
    "IS",
    "JOIN",
    "LEFT",
    "LIKE",
    "LIMIT",
    "MINUS",
    "NOT",
    "NULL",
    "OFFSET",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "RIGHT",
    "SELECT",
    "SOME",
    "TRUE",
    "UNION",
    "WHERE",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

/// Writes an identifier, double-quoting it when it would not survive a
/// re-parse as a bare word.
pub fn write_ident(f: &mut impl fmt::Write, ident: &str) -> fmt::Result {
    let mut chars = ident.chars();
    let bare = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };

    if bare && !is_reserved(ident) {
        f.write_str(ident)
    } else {
        write!(f, "\"{}\"", ident.replace('"', "\"\""))
    }
}

/// A possibly qualified object name such as `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectName(pub Vec<String>);

impl ObjectName {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectName(vec![name.into()])
    }

    /// The last segment, which is the name a table is exposed under.
    pub fn base(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn matches(&self, other: &str) -> bool {
        self.base().eq_ignore_ascii_case(other) || self.to_string().eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write_ident(f, part)?;
        }
        Ok(())
    }
}

/// A column reference, optionally qualified by a relation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnRef {
    pub qualifier: Option<ObjectName>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnRef {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(relation: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnRef {
            qualifier: Some(ObjectName::new(relation)),
            name: name.into(),
        }
    }

    /// The relation name the column is qualified with, if any.
    pub fn relation(&self) -> Option<&str> {
        self.qualifier.as_ref().map(ObjectName::base)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{}.", qualifier)?;
        }
        write_ident(f, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifiers_are_not_quoted() {
        assert_eq!(ColumnRef::qualified("m", "year").to_string(), "m.year");
        assert_eq!(ColumnRef::new("_id$2").to_string(), "_id$2");
    }

    #[test]
    fn test_reserved_and_odd_identifiers_are_quoted() {
        assert_eq!(ColumnRef::new("order").to_string(), "\"order\"");
        assert_eq!(ColumnRef::new("first name").to_string(), "\"first name\"");
        assert_eq!(ColumnRef::new("say \"hi\"").to_string(), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_object_name_matching_is_case_insensitive() {
        let name = ObjectName(vec!["public".into(), "Movies".into()]);
        assert!(name.matches("movies"));
        assert!(name.matches("PUBLIC.MOVIES"));
        assert!(!name.matches("public"));
    }
}

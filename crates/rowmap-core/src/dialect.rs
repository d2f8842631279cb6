//! SQL dialect tags.
//!
//! The dialect is an explicit value carried by every `TableSchema`; all
//! dialect-specific text rendering keys off it. Only the two supported
//! rendering targets exist, so exhaustive matches keep DDL and upsert
//! composition honest at compile time.

use std::fmt;

/// A supported SQL text-rendering target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL-family rendering.
    MySql,
    /// SQLite-family rendering.
    Sqlite,
}

impl Dialect {
    /// Returns the canonical driver name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the identity-column keyword.
    #[must_use]
    pub const fn auto_increment_keyword(self) -> &'static str {
        match self {
            Self::MySql => "AUTO_INCREMENT",
            Self::Sqlite => "AUTOINCREMENT",
        }
    }

    /// Returns the inline unique-constraint keyword.
    #[must_use]
    pub const fn unique_keyword(self) -> &'static str {
        match self {
            Self::MySql => "UNIQUE KEY",
            Self::Sqlite => "UNIQUE",
        }
    }

    /// Whether column DDL may carry an `ON UPDATE` expression.
    #[must_use]
    pub const fn supports_on_update(self) -> bool {
        matches!(self, Self::MySql)
    }

    /// Whether an identity column may coexist with explicit primary key
    /// columns.
    #[must_use]
    pub const fn allows_identity_with_primary(self) -> bool {
        matches!(self, Self::MySql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(Dialect::MySql.auto_increment_keyword(), "AUTO_INCREMENT");
        assert_eq!(Dialect::Sqlite.auto_increment_keyword(), "AUTOINCREMENT");
        assert_eq!(Dialect::MySql.unique_keyword(), "UNIQUE KEY");
        assert_eq!(Dialect::Sqlite.unique_keyword(), "UNIQUE");
    }

    #[test]
    fn test_capabilities() {
        assert!(Dialect::MySql.supports_on_update());
        assert!(!Dialect::Sqlite.supports_on_update());
        assert!(Dialect::MySql.allows_identity_with_primary());
        assert!(!Dialect::Sqlite.allows_identity_with_primary());
    }

    #[test]
    fn test_display() {
        assert_eq!(Dialect::MySql.to_string(), "mysql");
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
    }
}

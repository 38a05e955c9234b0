/// Schema lookups used by the semantic checker and the optimizer
///
/// The catalog itself lives outside the compiler; callers pass a
/// [`SchemaHandle`] and the compiler only ever reads from it.

/// Read-only view of a schema catalog.
///
/// Implementations must fail closed: an unknown table reports `false` from
/// [`exists`](SchemaHandle::exists), an empty column list and `None` types.
/// The trait is not bounded by `Sync`; sharing one handle between threads is
/// up to the implementation.
pub trait SchemaHandle {
    /// Returns `true` if the table exists.
    fn exists(&self, table: &str) -> bool;

    /// Column names of `table` in catalog order. Empty when unknown.
    fn columns_of(&self, table: &str) -> Vec<String>;

    /// Declared type of `table.column`, e.g. `int(11)` or `varchar(255)`.
    fn type_of(&self, table: &str, column: &str) -> Option<String>;

    /// Returns `true` if `table` has a column called `column` (case-insensitive).
    fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns_of(table)
            .iter()
            .any(|c| c.eq_ignore_ascii_case(column))
    }
}

impl<S: SchemaHandle + ?Sized> SchemaHandle for &S {
    fn exists(&self, table: &str) -> bool {
        (**self).exists(table)
    }

    fn columns_of(&self, table: &str) -> Vec<String> {
        (**self).columns_of(table)
    }

    fn type_of(&self, table: &str, column: &str) -> Option<String> {
        (**self).type_of(table, column)
    }
}

/// Coarse classification of declared column types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Numeric,
    Character,
    Other,
}

impl TypeFamily {
    /// Classifies a declared type by its base name, ignoring case, any
    /// length or precision suffix and trailing modifiers such as `unsigned`.
    pub fn of(type_name: &str) -> Self {
        let lower = type_name.trim().to_ascii_lowercase();
        let base = lower
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default();
        const NUMERIC: &[&str] = &[
            "int", "tinyint", "smallint", "mediumint", "bigint", "integer", "decimal", "numeric",
            "float", "double", "real",
        ];
        const CHARACTER: &[&str] = &[
            "char", "character", "varchar", "text", "tinytext", "mediumtext", "longtext",
        ];

        if NUMERIC.contains(&base) {
            TypeFamily::Numeric
        } else if CHARACTER.contains(&base) {
            TypeFamily::Character
        } else {
            TypeFamily::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_family() {
        assert_eq!(TypeFamily::of("int(11)"), TypeFamily::Numeric);
        assert_eq!(TypeFamily::of("DECIMAL(10,2)"), TypeFamily::Numeric);
        assert_eq!(TypeFamily::of("bigint unsigned"), TypeFamily::Numeric);
        assert_eq!(TypeFamily::of("varchar(255)"), TypeFamily::Character);
        assert_eq!(TypeFamily::of("TEXT"), TypeFamily::Character);
        assert_eq!(TypeFamily::of("date"), TypeFamily::Other);
        assert_eq!(TypeFamily::of(""), TypeFamily::Other);
    }

    #[test]
    fn test_type_family_matches_whole_base_name() {
        assert_eq!(TypeFamily::of("interval"), TypeFamily::Other);
        assert_eq!(TypeFamily::of("integer"), TypeFamily::Numeric);
        assert_eq!(TypeFamily::of("double precision"), TypeFamily::Numeric);
        assert_eq!(TypeFamily::of(" Varchar (100)"), TypeFamily::Character);
        assert_eq!(TypeFamily::of("character varying(20)"), TypeFamily::Character);
        assert_eq!(TypeFamily::of("charset"), TypeFamily::Other);
        assert_eq!(TypeFamily::of("textual"), TypeFamily::Other);
        assert_eq!(TypeFamily::of("realm"), TypeFamily::Other);
    }
}

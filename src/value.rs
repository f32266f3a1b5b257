// ABOUTME: Portable value types exchanged between source, coercer and sink
// ABOUTME: RawValue is what the source produces, CoercedValue what the sink binds

/// A single column value as produced by a source.
///
/// The source converter decides the variant, so downstream code matches a
/// closed set instead of inspecting driver types at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
}

/// A value ready to be bound as a sink statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl CoercedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CoercedValue::Null => "null",
            CoercedValue::Integer(_) => "integer",
            CoercedValue::Float(_) => "float",
            CoercedValue::Text(_) => "text",
            CoercedValue::Bytes(_) => "bytes",
        }
    }
}

/// Column affinity of a sink column, derived from its declared type.
///
/// Follows SQLite's rules in order: `INT` → integer; `CHAR`, `CLOB` or
/// `TEXT` → text; `BLOB` or no declared type → blob; `REAL`, `FLOA` or
/// `DOUB` → real; anything else → numeric.
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_migrator::value::Affinity;
/// assert_eq!(Affinity::from_declared_type("BIGINT UNSIGNED"), Affinity::Integer);
/// assert_eq!(Affinity::from_declared_type("varchar(255)"), Affinity::Text);
/// assert_eq!(Affinity::from_declared_type(""), Affinity::Blob);
/// assert_eq!(Affinity::from_declared_type("DECIMAL(10,2)"), Affinity::Numeric);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();

        if upper.contains("INT") {
            Affinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Affinity::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            Affinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }

    /// Whether byte values bound to this column should be decoded as text
    pub fn expects_text(self) -> bool {
        !matches!(self, Affinity::Blob)
    }
}

// ABOUTME: Type coercion from source values into sink-bindable values
// ABOUTME: Total mapping; byte strings become text unless the sink column is a BLOB

use crate::value::{Affinity, CoercedValue, RawValue};

/// Coerce a source value into a value the sink can bind.
///
/// Never fails: every `RawValue` maps to exactly one `CoercedValue`. The
/// value is taken by value so nulls, numbers and text move straight through
/// without copying.
///
/// Byte strings are decoded as UTF-8 text unless the target column has BLOB
/// affinity. Bytes that are not valid UTF-8 stay bytes.
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_migrator::coerce::coerce;
/// # use mysql_sqlite_migrator::value::{Affinity, CoercedValue, RawValue};
/// let text = coerce(RawValue::Bytes(b"hello".to_vec()), Affinity::Text);
/// assert_eq!(text, CoercedValue::Text("hello".to_string()));
///
/// let blob = coerce(RawValue::Bytes(vec![0xFF, 0x00]), Affinity::Blob);
/// assert_eq!(blob, CoercedValue::Bytes(vec![0xFF, 0x00]));
/// ```
pub fn coerce(raw: RawValue, target: Affinity) -> CoercedValue {
    match raw {
        RawValue::Null => CoercedValue::Null,
        RawValue::Integer(i) => CoercedValue::Integer(i),
        RawValue::Float(f) => CoercedValue::Float(f),
        RawValue::Text(s) => CoercedValue::Text(s),
        RawValue::Bytes(b) if target.expects_text() => match String::from_utf8(b) {
            Ok(s) => CoercedValue::Text(s),
            Err(e) => {
                tracing::debug!(
                    "Keeping {} byte value as BLOB: not valid UTF-8 ({})",
                    e.as_bytes().len(),
                    e.utf8_error()
                );
                CoercedValue::Bytes(e.into_bytes())
            }
        },
        RawValue::Bytes(b) => CoercedValue::Bytes(b),
    }
}

/// Coerce a whole row, pairing each value with its column's affinity.
///
/// Columns without a known affinity (more values than affinities) are
/// treated as text columns.
pub fn coerce_row(row: Vec<RawValue>, affinities: &[Affinity]) -> Vec<CoercedValue> {
    row.into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let target = affinities.get(idx).copied().unwrap_or(Affinity::Text);
            coerce(raw, target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_null() {
        for target in [Affinity::Text, Affinity::Blob, Affinity::Integer] {
            assert_eq!(coerce(RawValue::Null, target), CoercedValue::Null);
        }
    }

    #[test]
    fn test_coerce_integers_keep_full_width() {
        assert_eq!(
            coerce(RawValue::Integer(7), Affinity::Integer),
            CoercedValue::Integer(7)
        );
        assert_eq!(
            coerce(RawValue::Integer(i64::MAX), Affinity::Text),
            CoercedValue::Integer(i64::MAX)
        );
        assert_eq!(
            coerce(RawValue::Integer(i64::MIN), Affinity::Numeric),
            CoercedValue::Integer(i64::MIN)
        );
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(
            coerce(RawValue::Float(1.5), Affinity::Real),
            CoercedValue::Float(1.5)
        );
        match coerce(RawValue::Float(f64::NAN), Affinity::Real) {
            CoercedValue::Float(f) => assert!(f.is_nan()),
            other => panic!("NaN should stay a float, got {:?}", other),
        }
    }

    #[test]
    fn test_coerce_bytes_for_text_columns() {
        assert_eq!(
            coerce(RawValue::Bytes(b"123.45".to_vec()), Affinity::Numeric),
            CoercedValue::Text("123.45".to_string())
        );
        assert_eq!(
            coerce(RawValue::Bytes(Vec::new()), Affinity::Text),
            CoercedValue::Text(String::new())
        );
    }

    #[test]
    fn test_coerce_long_bytes() {
        let long = "x".repeat(1 << 20);
        assert_eq!(
            coerce(RawValue::Bytes(long.clone().into_bytes()), Affinity::Text),
            CoercedValue::Text(long)
        );
    }

    #[test]
    fn test_coerce_invalid_utf8_stays_bytes() {
        let bytes = vec![0xC3, 0x28, 0xFF];
        assert_eq!(
            coerce(RawValue::Bytes(bytes.clone()), Affinity::Text),
            CoercedValue::Bytes(bytes)
        );
    }

    #[test]
    fn test_coerce_blob_columns_keep_bytes() {
        assert_eq!(
            coerce(RawValue::Bytes(b"hello".to_vec()), Affinity::Blob),
            CoercedValue::Bytes(b"hello".to_vec())
        );
    }

    #[test]
    fn test_coerce_text_passes_through() {
        assert_eq!(
            coerce(RawValue::Text("héllo".to_string()), Affinity::Blob),
            CoercedValue::Text("héllo".to_string())
        );
    }

    #[test]
    fn test_coerce_is_total() {
        let samples = vec![
            RawValue::Null,
            RawValue::Integer(0),
            RawValue::Integer(-1),
            RawValue::Integer(i64::MAX),
            RawValue::Float(0.0),
            RawValue::Float(f64::INFINITY),
            RawValue::Bytes(vec![]),
            RawValue::Bytes(vec![0xFF; 4096]),
            RawValue::Bytes(b"short".to_vec()),
            RawValue::Text("already text".to_string()),
        ];
        let targets = [
            Affinity::Integer,
            Affinity::Text,
            Affinity::Blob,
            Affinity::Real,
            Affinity::Numeric,
        ];

        for raw in &samples {
            for target in targets {
                let kind = coerce(raw.clone(), target).kind();
                assert!(
                    ["null", "integer", "float", "text", "bytes"].contains(&kind),
                    "{:?} -> {}",
                    raw,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_coerce_row_uses_column_affinity() {
        let row = vec![
            RawValue::Integer(1),
            RawValue::Bytes(b"Alice".to_vec()),
            RawValue::Bytes(b"\x89PNG".to_vec()),
            RawValue::Bytes(b"extra".to_vec()),
        ];
        let affinities = [Affinity::Integer, Affinity::Text, Affinity::Blob];

        let coerced = coerce_row(row, &affinities);

        assert_eq!(
            coerced,
            vec![
                CoercedValue::Integer(1),
                CoercedValue::Text("Alice".to_string()),
                CoercedValue::Bytes(b"\x89PNG".to_vec()),
                CoercedValue::Text("extra".to_string()),
            ]
        );
    }
}

// ABOUTME: MySQL value conversion into the closed RawValue set
// ABOUTME: Dates, times and oversized unsigned integers are rendered as text

use crate::source::Row;
use crate::value::RawValue;
use mysql_async::Value;

/// Convert a MySQL Value to a RawValue
///
/// - NULL → Null
/// - Int, and UInt up to `i64::MAX` → Integer
/// - UInt above `i64::MAX` → Text (decimal digits, nothing is lost)
/// - Float/Double → Float
/// - Bytes (strings, decimals, blobs) → Bytes
/// - Date → Text, `YYYY-MM-DD HH:MM:SS[.ffffff]`
/// - Time → Text, `[-]HHH:MM:SS[.ffffff]`
///
/// # Examples
///
/// ```
/// # use mysql_async::Value;
/// # use mysql_sqlite_migrator::mysql::converter::mysql_value_to_raw;
/// # use mysql_sqlite_migrator::value::RawValue;
/// assert_eq!(mysql_value_to_raw(Value::Int(42)), RawValue::Integer(42));
/// assert_eq!(
///     mysql_value_to_raw(Value::Date(2024, 1, 15, 0, 0, 0, 0)),
///     RawValue::Text("2024-01-15 00:00:00".to_string())
/// );
/// ```
pub fn mysql_value_to_raw(value: Value) -> RawValue {
    match value {
        Value::NULL => RawValue::Null,

        Value::Int(i) => RawValue::Integer(i),
        Value::UInt(u) => match i64::try_from(u) {
            Ok(i) => RawValue::Integer(i),
            Err(_) => {
                tracing::debug!("Unsigned value {} exceeds 64-bit signed range, storing as text", u);
                RawValue::Text(u.to_string())
            }
        },

        Value::Float(f) => RawValue::Float(f as f64),
        Value::Double(d) => RawValue::Float(d),

        Value::Bytes(b) => RawValue::Bytes(b),

        Value::Date(year, month, day, hour, minute, second, micro) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if micro > 0 {
                text.push_str(&format!(".{:06}", micro));
            }
            RawValue::Text(text)
        }

        Value::Time(is_negative, days, hours, minutes, seconds, micro) => {
            let sign = if is_negative { "-" } else { "" };
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            let mut text = format!("{}{:02}:{:02}:{:02}", sign, total_hours, minutes, seconds);
            if micro > 0 {
                text.push_str(&format!(".{:06}", micro));
            }
            RawValue::Text(text)
        }
    }
}

/// Convert a MySQL Row into a RawValue row of `width` columns
///
/// Columns missing from the row (never expected from a well-formed result
/// set) are read as NULL.
pub fn mysql_row_to_raw(row: mysql_async::Row, width: usize) -> Row {
    raw_values(row.unwrap_raw(), width)
}

fn raw_values(values: Vec<Option<Value>>, width: usize) -> Row {
    let mut raw: Row = values
        .into_iter()
        .map(|value| mysql_value_to_raw(value.unwrap_or(Value::NULL)))
        .collect();
    raw.resize(width, RawValue::Null);
    raw
}

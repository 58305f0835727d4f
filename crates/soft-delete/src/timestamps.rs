//! Timestamp column policy
//!
//! Column semantics are decided by naming convention, not by inspecting the
//! schema: any column whose name contains [`EPOCH_MARKER`] stores Unix-epoch
//! seconds, every other timestamp column is a nullable datetime.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::model::{Attributes, Model, TimestampColumns};

/// Substring marking a column as epoch-integer
pub const EPOCH_MARKER: &str = "time";

/// Format used when writing datetime columns
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How a timestamp column stores its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSemantics {
    /// Integer seconds since the epoch, `0` meaning "not deleted"
    EpochInteger,
    /// Datetime string, `NULL` meaning "not deleted"
    NullableDatetime,
}

/// Substring match against the epoch marker.
///
/// `"delete_time"`, `"timestamp"` and `"time_deleted"` all qualify.
pub fn is_epoch_column(column: &str) -> bool {
    column.contains(EPOCH_MARKER)
}

impl ColumnSemantics {
    pub fn of(column: &str) -> Self {
        if is_epoch_column(column) {
            ColumnSemantics::EpochInteger
        } else {
            ColumnSemantics::NullableDatetime
        }
    }

    /// Value stored in the deleted-at column of a live row
    pub fn not_deleted_sentinel(self) -> Value {
        match self {
            ColumnSemantics::EpochInteger => Value::from(0),
            ColumnSemantics::NullableDatetime => Value::Null,
        }
    }

    /// Value stored in the deleted-at column of a row deleted at `now`
    pub fn deleted_sentinel(self, now: DateTime<Utc>) -> Value {
        self.timestamp(now)
    }

    /// `now` in this column's representation
    pub fn timestamp(self, now: DateTime<Utc>) -> Value {
        match self {
            ColumnSemantics::EpochInteger => Value::from(now.timestamp()),
            ColumnSemantics::NullableDatetime => {
                Value::String(now.format(DATETIME_FORMAT).to_string())
            }
        }
    }

    /// Whether a stored deleted-at value marks the row as trashed
    pub fn is_deleted(self, value: Option<&Value>) -> bool {
        match self {
            ColumnSemantics::EpochInteger => match value {
                Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v > 0.0),
                Some(Value::String(s)) => s.trim().parse::<i64>().map_or(false, |v| v > 0),
                _ => false,
            },
            ColumnSemantics::NullableDatetime => !matches!(value, None | Some(Value::Null)),
        }
    }
}

/// Convert a timestamp value into epoch seconds.
///
/// Accepts integers, numeric strings, RFC 3339, `YYYY-MM-DD HH:MM:SS` and
/// bare dates (midnight UTC). Naive values are read as UTC.
pub fn parse_timestamp(value: &Value) -> ModelResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| ModelError::Validation(format!("Timestamp {} is not an integer", n))),
        Value::String(s) => parse_timestamp_str(s),
        other => Err(ModelError::Validation(format!(
            "Cannot convert {} to a timestamp",
            other
        ))),
    }
}

fn parse_timestamp_str(raw: &str) -> ModelResult<i64> {
    let s = raw.trim();

    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive).timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight).timestamp());
        }
    }

    Err(ModelError::Validation(format!(
        "Unrecognized timestamp '{}'",
        raw
    )))
}

/// Rewrite string values of epoch timestamp columns as epoch integers.
///
/// Keys may be plain or table-qualified. Datetime columns and non-string
/// values are left alone.
pub fn normalize_timestamp_attributes(
    attributes: &mut Attributes,
    columns: &TimestampColumns,
) -> ModelResult<()> {
    for (column, value) in attributes.iter_mut() {
        let local = column.rsplit('.').next().unwrap_or(column);
        if !columns.contains(local) || !is_epoch_column(local) {
            continue;
        }
        if let Value::String(_) = value {
            *value = Value::from(parse_timestamp(value)?);
        }
    }
    Ok(())
}

/// Fill timestamp and deleted-at defaults for an insert
pub(crate) fn stamp_insert<M: Model>(attributes: &mut Attributes, now: DateTime<Utc>) {
    let columns = M::timestamp_columns();

    if M::uses_timestamps() {
        for column in [&columns.created_at, &columns.updated_at] {
            attributes
                .entry(column.to_string())
                .or_insert_with(|| ColumnSemantics::of(column).timestamp(now));
        }
    }

    if M::uses_soft_deletes() {
        attributes
            .entry(columns.deleted_at.to_string())
            .or_insert_with(|| ColumnSemantics::of(&columns.deleted_at).not_deleted_sentinel());
    }
}

/// Stamp the qualified updated-at column of an update payload
pub(crate) fn stamp_update<M: Model>(values: &mut Attributes, now: DateTime<Utc>) {
    if !M::uses_timestamps() {
        return;
    }

    let column = M::timestamp_columns().updated_at.into_owned();
    let qualified = M::qualify_column(&column);
    if values.contains_key(&column) || values.contains_key(&qualified) {
        return;
    }
    values.insert(qualified, ColumnSemantics::of(&column).timestamp(now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_epoch_column_classification() {
        assert!(is_epoch_column("delete_time"));
        assert!(is_epoch_column("articles.delete_time"));
        assert!(is_epoch_column("timestamp"));
        assert!(is_epoch_column("time_removed"));
        assert!(!is_epoch_column("deleted_at"));
        assert!(!is_epoch_column("removed_on"));
    }

    #[test]
    fn test_sentinels() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let epoch = ColumnSemantics::of("delete_time");
        assert_eq!(epoch, ColumnSemantics::EpochInteger);
        assert_eq!(epoch.not_deleted_sentinel(), json!(0));
        assert_eq!(epoch.deleted_sentinel(now), json!(1704164645));

        let datetime = ColumnSemantics::of("deleted_at");
        assert_eq!(datetime, ColumnSemantics::NullableDatetime);
        assert_eq!(datetime.not_deleted_sentinel(), Value::Null);
        assert_eq!(datetime.deleted_sentinel(now), json!("2024-01-02 03:04:05"));
    }

    #[test]
    fn test_is_deleted() {
        let epoch = ColumnSemantics::EpochInteger;
        assert!(!epoch.is_deleted(Some(&json!(0))));
        assert!(!epoch.is_deleted(None));
        assert!(epoch.is_deleted(Some(&json!(1704164645))));

        let datetime = ColumnSemantics::NullableDatetime;
        assert!(!datetime.is_deleted(Some(&Value::Null)));
        assert!(datetime.is_deleted(Some(&json!("2024-01-02 03:04:05"))));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp(&json!("2024-01-02 03:04:05")).unwrap(), 1704164645);
        assert_eq!(parse_timestamp(&json!("2024-01-02T03:04:05Z")).unwrap(), 1704164645);
        assert_eq!(parse_timestamp(&json!("2024-01-02T04:04:05+01:00")).unwrap(), 1704164645);
        assert_eq!(parse_timestamp(&json!("2024-01-02")).unwrap(), 1704153600);
        assert_eq!(parse_timestamp(&json!("1704164645")).unwrap(), 1704164645);
        assert_eq!(parse_timestamp(&json!(42)).unwrap(), 42);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp(&json!("next tuesday")),
            Err(ModelError::Validation(_))
        ));
        assert!(matches!(
            parse_timestamp(&json!(true)),
            Err(ModelError::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_only_touches_epoch_timestamp_columns() {
        let mut attributes = Attributes::new();
        attributes.insert("create_time".to_string(), json!("2024-01-02 03:04:05"));
        attributes.insert("articles.update_time".to_string(), json!("2024-01-02"));
        attributes.insert("delete_time".to_string(), json!(0));
        attributes.insert("title".to_string(), json!("2024-01-02"));

        normalize_timestamp_attributes(&mut attributes, &TimestampColumns::BASIC).unwrap();

        assert_eq!(attributes["create_time"], json!(1704164645));
        assert_eq!(attributes["articles.update_time"], json!(1704153600));
        assert_eq!(attributes["delete_time"], json!(0));
        assert_eq!(attributes["title"], json!("2024-01-02"));

        let mut datetime = Attributes::new();
        datetime.insert("created_at".to_string(), json!("2024-01-02 03:04:05"));
        normalize_timestamp_attributes(&mut datetime, &TimestampColumns::default()).unwrap();
        assert_eq!(datetime["created_at"], json!("2024-01-02 03:04:05"));
    }

    #[test]
    fn test_normalize_ignores_the_table_part_of_a_key() {
        let mut attributes = Attributes::new();
        attributes.insert("timelines.deleted_at".to_string(), json!("2024-01-02 03:04:05"));

        normalize_timestamp_attributes(&mut attributes, &TimestampColumns::default()).unwrap();

        assert_eq!(attributes["timelines.deleted_at"], json!("2024-01-02 03:04:05"));
    }
}

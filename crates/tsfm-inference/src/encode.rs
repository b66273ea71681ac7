use serde_json::{Map, Value};

use crate::frame::{ColumnData, TimeSeriesFrame, isoformat};

/// Column name to the ordered values of that column, in source column order.
pub type EncodedResult = Map<String, Value>;

/// Encodes a frame into its column-oriented, serialization-ready form.
///
/// When `timestamp_column` names a datetime column, that column is rewritten in place to its
/// ISO-8601 string form first, so encoding the same frame again yields the same mapping.
pub fn encode(frame: &mut TimeSeriesFrame, timestamp_column: Option<&str>) -> EncodedResult {
    if let Some(column) = timestamp_column.and_then(|name| frame.column_mut(name)) {
        if let ColumnData::Datetime(values) = column.data() {
            let rewritten = values
                .iter()
                .map(|ts| ts.as_ref().map(isoformat))
                .collect();
            column.set_data(ColumnData::Str(rewritten));
        }
    }

    frame
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), Value::Array(c.data().to_values())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Column, parse_timestamp};
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::json;

    fn timestamps() -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(0, 0, 0, 125_000)
            .unwrap();
        (0..3).map(|h| start + chrono::Duration::hours(h)).collect()
    }

    fn frame() -> TimeSeriesFrame {
        TimeSeriesFrame::new(vec![
            Column::datetime("ts", timestamps()),
            Column::string("id", vec!["a", "a", "a"]),
            Column::float("y", vec![1.0, f64::NAN, 3.5]),
        ])
        .unwrap()
    }

    #[test]
    fn rewrites_timestamp_column_to_iso_strings() {
        let mut frame = frame();
        let encoded = encode(&mut frame, Some("ts"));

        assert_eq!(encoded.keys().collect::<Vec<_>>(), vec!["ts", "id", "y"]);
        assert_eq!(encoded["y"], json!([1.0, null, 3.5]));
        for value in encoded["ts"].as_array().unwrap() {
            let raw = value.as_str().unwrap();
            assert!(parse_timestamp(raw).is_some(), "not ISO-8601: {raw}");
        }
        assert!(!frame.column("ts").unwrap().data().is_datetime());
    }

    #[test]
    fn timestamp_round_trip_recovers_instants() {
        let mut frame = frame();
        let encoded = encode(&mut frame, Some("ts"));

        let decoded: Vec<NaiveDateTime> = encoded["ts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| parse_timestamp(v.as_str().unwrap()).unwrap())
            .collect();
        assert_eq!(decoded, timestamps());
    }

    #[test]
    fn encoding_twice_is_stable() {
        let mut frame = frame();
        let first = encode(&mut frame, Some("ts"));
        let second = encode(&mut frame, Some("ts"));
        assert_eq!(first, second);
    }

    #[test]
    fn non_datetime_timestamp_column_passes_through() {
        let mut frame = TimeSeriesFrame::new(vec![
            Column::int("ts", vec![1, 2]),
            Column::float("y", vec![0.5, 1.5]),
        ])
        .unwrap();
        let before = frame.clone();

        let encoded = encode(&mut frame, Some("ts"));
        assert_eq!(encoded["ts"], json!([1, 2]));
        assert_eq!(frame, before);
    }

    #[test]
    fn missing_timestamp_column_is_ignored() {
        let mut frame = frame();
        let encoded = encode(&mut frame, Some("not_there"));
        assert_eq!(encoded.len(), 3);
        assert!(frame.column("ts").unwrap().data().is_datetime());
    }

    #[test]
    fn zero_row_frame_encodes_empty_sequences() {
        let mut frame = TimeSeriesFrame::new(vec![
            Column::datetime("ts", vec![]),
            Column::float("y", vec![]),
        ])
        .unwrap();

        let encoded = encode(&mut frame, Some("ts"));
        assert_eq!(Value::Object(encoded), json!({ "ts": [], "y": [] }));
        assert!(encode(&mut TimeSeriesFrame::default(), None).is_empty());
    }
}

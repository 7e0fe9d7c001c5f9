use failure::Fail;
use itertools::{Either, Itertools};

use crate::model;
use crate::schema;

/// Timestamp layout used by the feed, both in records and in the pagination cursor.
pub const FEED_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// 24-hour variant that the ingest side also accepts.
const FALLBACK_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

#[derive(Debug, Fail)]
#[fail(display = "unparseable record timestamp {:?}: {}", raw, cause)]
pub struct DecodeError {
    pub raw: String,
    #[cause]
    pub cause: chrono::ParseError,
}

pub fn parse_timestamp(raw: &str) -> Result<chrono::NaiveDateTime, DecodeError> {
    let raw = raw.trim();
    chrono::NaiveDateTime::parse_from_str(raw, FEED_TIMESTAMP_FORMAT)
        .or_else(|e| {
            chrono::NaiveDateTime::parse_from_str(raw, FALLBACK_TIMESTAMP_FORMAT).map_err(|_| e)
        })
        .map_err(|cause| DecodeError {
            raw: raw.to_owned(),
            cause,
        })
}

pub fn format_cursor(timestamp: &chrono::NaiveDateTime) -> String {
    timestamp.format(FEED_TIMESTAMP_FORMAT).to_string()
}

pub fn decode_record(record: &schema::RawRecord) -> Result<model::Sample, DecodeError> {
    Ok(model::Sample {
        timestamp: parse_timestamp(&record.timestamp)?,
        volume: record.gas_meter_volume_instant,
        valve_percent: record.gas_valve_percent_open,
        hydration: model::HydrationMarker::from_feed(record.is_hydration.as_deref()),
    })
}

/// Decodes a page of records, keeping input order; undecodable records are returned separately.
pub fn decode_batch(records: &[schema::RawRecord]) -> (Vec<model::Sample>, Vec<DecodeError>) {
    records
        .iter()
        .map(decode_record)
        .partition_map(|result| match result {
            Ok(sample) => Either::Left(sample),
            Err(e) => Either::Right(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: &str, marker: Option<&str>) -> schema::RawRecord {
        schema::RawRecord {
            timestamp: timestamp.to_owned(),
            gas_meter_volume_instant: Some(120.0),
            gas_valve_percent_open: Some(35.5),
            is_hydration: marker.map(str::to_owned),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 10, 4)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn decodes_twelve_hour_timestamps() {
        let sample = decode_record(&record("10/04/2024 01:05:09 PM", None)).unwrap();
        assert_eq!(sample.timestamp, at(13, 5, 9));
        assert_eq!(sample.volume, Some(120.0));
        assert_eq!(sample.valve_percent, Some(35.5));
        assert_eq!(sample.hydration, model::HydrationMarker::None);

        let midnight = decode_record(&record("10/04/2024 12:00:01 AM", None)).unwrap();
        assert_eq!(midnight.timestamp, at(0, 0, 1));
    }

    #[test]
    fn accepts_twenty_four_hour_variant() {
        let sample = decode_record(&record("10/04/2024 17:30:00", None)).unwrap();
        assert_eq!(sample.timestamp, at(17, 30, 0));
    }

    #[test]
    fn maps_markers_and_normalizes_unknown_values() {
        let start = decode_record(&record("10/04/2024 01:00:00 PM", Some("start"))).unwrap();
        let end = decode_record(&record("10/04/2024 01:00:01 PM", Some("end"))).unwrap();
        let odd = decode_record(&record("10/04/2024 01:00:02 PM", Some("STARTED"))).unwrap();
        assert_eq!(start.hydration, model::HydrationMarker::Start);
        assert_eq!(end.hydration, model::HydrationMarker::End);
        assert_eq!(odd.hydration, model::HydrationMarker::None);
    }

    #[test]
    fn null_channels_are_kept_as_gaps() {
        let mut raw = record("10/04/2024 01:00:00 PM", None);
        raw.gas_meter_volume_instant = None;
        let sample = decode_record(&raw).unwrap();
        assert_eq!(sample.volume, None);
        assert_eq!(sample.valve_percent, Some(35.5));
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let err = decode_record(&record("yesterday-ish", None)).unwrap_err();
        assert_eq!(err.raw, "yesterday-ish");
        assert!(err.to_string().contains("yesterday-ish"));
    }

    #[test]
    fn batch_skips_bad_records_and_keeps_order() {
        let records = vec![
            record("10/04/2024 01:00:00 PM", None),
            record("not a time", None),
            record("10/04/2024 01:00:02 PM", Some("start")),
        ];
        let (samples, errors) = decode_batch(&records);
        assert_eq!(
            samples.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
            vec![at(13, 0, 0), at(13, 0, 2)]
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].raw, "not a time");
    }

    #[test]
    fn cursor_uses_feed_layout() {
        assert_eq!(format_cursor(&at(13, 5, 9)), "10/04/2024 01:05:09 PM");
        assert_eq!(format_cursor(&at(9, 0, 0)), "10/04/2024 09:00:00 AM");
    }
}

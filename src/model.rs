use std::fmt;

/// Opaque key identifying one monitored device.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub device_id: DeviceId,
}

/// Hydration-period boundary carried by a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HydrationMarker {
    Start,
    End,
    None,
}

impl HydrationMarker {
    /// Unknown values are treated as no marker at all.
    pub fn from_feed(raw: Option<&str>) -> Self {
        match raw {
            Some("start") => HydrationMarker::Start,
            Some("end") => HydrationMarker::End,
            _ => HydrationMarker::None,
        }
    }
}

/// One decoded feed record.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: chrono::NaiveDateTime,
    pub volume: Option<f64>,
    pub valve_percent: Option<f64>,
    pub hydration: HydrationMarker,
}

/// One entry of a numeric series; a missing value is a gap in the line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub timestamp: chrono::NaiveDateTime,
    pub value: Option<f64>,
}

/// A hydration period.  `from <= to` always holds; `active` means no `END` has been seen yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HydrationInterval {
    pub from: chrono::NaiveDateTime,
    pub to: chrono::NaiveDateTime,
    pub active: bool,
}

impl HydrationInterval {
    pub fn opened_at(timestamp: chrono::NaiveDateTime) -> Self {
        HydrationInterval {
            from: timestamp,
            to: timestamp,
            active: true,
        }
    }
}

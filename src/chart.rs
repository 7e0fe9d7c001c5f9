//! Renderer-agnostic chart description of a device's series.
//!
//! Field names follow the Highcharts option layout so the JSON can be handed to a browser
//! chart as-is, but nothing here depends on how it is drawn.

use crate::model;
use crate::series;

pub const VOLUME_SERIES_NAME: &str = "Gas Injection Volume";
pub const VALVE_SERIES_NAME: &str = "Valve Opening Percentage";

const TICK_PIXEL_INTERVAL: u32 = 150;
const CLOSED_BAND_COLOR: &str = "rgba(68, 170, 213, 0.2)";
const OPEN_BAND_COLOR: &str = "rgba(255, 99, 71, 0.25)";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub device_id: String,
    pub x_axis: TimeAxis,
    pub y_axis: Vec<ValueAxis>,
    pub series: Vec<LineSeries>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAxis {
    pub title: Title,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick_pixel_interval: u32,
    pub plot_bands: Vec<PlotBand>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValueAxis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Title {
    pub text: &'static str,
}

/// Shaded time range marking one hydration period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotBand {
    pub from: i64,
    pub to: i64,
    pub active: bool,
    pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries {
    pub name: &'static str,
    pub y_axis: usize,
    /// `[epoch millis, value]` pairs; a `null` value is a gap.
    pub data: Vec<(i64, Option<f64>)>,
}

pub fn project(state: &series::DeviceSeriesState) -> Chart {
    Chart {
        device_id: state.device_id.to_string(),
        x_axis: TimeAxis {
            title: Title { text: "Time" },
            kind: "datetime",
            tick_pixel_interval: TICK_PIXEL_INTERVAL,
            plot_bands: state.intervals.iter().map(plot_band).collect(),
        },
        y_axis: vec![
            ValueAxis {
                title: Title {
                    text: VOLUME_SERIES_NAME,
                },
                min: None,
                max: None,
            },
            ValueAxis {
                title: Title {
                    text: VALVE_SERIES_NAME,
                },
                min: Some(0.0),
                max: Some(100.0),
            },
        ],
        series: vec![
            LineSeries {
                name: VOLUME_SERIES_NAME,
                y_axis: 0,
                data: line_data(&state.volume),
            },
            LineSeries {
                name: VALVE_SERIES_NAME,
                y_axis: 1,
                data: line_data(&state.valve),
            },
        ],
    }
}

pub fn epoch_millis(timestamp: &chrono::NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp_millis()
}

fn plot_band(interval: &model::HydrationInterval) -> PlotBand {
    PlotBand {
        from: epoch_millis(&interval.from),
        to: epoch_millis(&interval.to),
        active: interval.active,
        color: if interval.active {
            OPEN_BAND_COLOR
        } else {
            CLOSED_BAND_COLOR
        },
    }
}

fn line_data(points: &[model::Point]) -> Vec<(i64, Option<f64>)> {
    points
        .iter()
        .map(|point| (epoch_millis(&point.timestamp), point.value))
        .collect()
}

use failure::Fail;

use crate::model;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum StoreError {
    #[fail(display = "no device selected")]
    NoDeviceSelected,
}

/// All series data held for the currently selected device.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSeriesState {
    pub device_id: model::DeviceId,
    pub volume: Vec<model::Point>,
    pub valve: Vec<model::Point>,
    pub intervals: Vec<model::HydrationInterval>,
}

impl DeviceSeriesState {
    pub fn empty(device_id: model::DeviceId) -> Self {
        DeviceSeriesState {
            device_id,
            volume: Vec::new(),
            valve: Vec::new(),
            intervals: Vec::new(),
        }
    }
}

/// Everything decoded from one fetch, applied to the store in a single step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    pub volume: Vec<model::Point>,
    pub valve: Vec<model::Point>,
    pub intervals: Vec<model::HydrationInterval>,
}

impl Batch {
    pub fn from_samples(
        samples: &[model::Sample],
        intervals: Vec<model::HydrationInterval>,
    ) -> Self {
        Batch {
            volume: samples
                .iter()
                .map(|s| model::Point {
                    timestamp: s.timestamp,
                    value: s.volume,
                })
                .collect(),
            valve: samples
                .iter()
                .map(|s| model::Point {
                    timestamp: s.timestamp,
                    value: s.valve_percent,
                })
                .collect(),
            intervals,
        }
    }
}

/// Device-scoped, append-only series storage.
///
/// Selecting a device is the only way data is ever cleared.  Appends never sort or deduplicate:
/// callers hand in points that postdate the current tail.
#[derive(Debug, Default)]
pub struct SeriesStore {
    current: Option<DeviceSeriesState>,
    selection: u64,
}

impl SeriesStore {
    pub fn new() -> Self {
        SeriesStore::default()
    }

    pub fn select_device(&mut self, device_id: model::DeviceId) {
        self.current = Some(DeviceSeriesState::empty(device_id));
        self.selection += 1;
    }

    /// Bumped on every selection, including re-selecting the same device.
    pub fn selection(&self) -> u64 {
        self.selection
    }

    pub fn current(&self) -> Option<&DeviceSeriesState> {
        self.current.as_ref()
    }

    pub fn device_id(&self) -> Option<&model::DeviceId> {
        self.current.as_ref().map(|state| &state.device_id)
    }

    pub fn append_volume(&mut self, points: Vec<model::Point>) -> Result<(), StoreError> {
        self.state_mut()?.volume.extend(points);
        Ok(())
    }

    pub fn append_valve(&mut self, points: Vec<model::Point>) -> Result<(), StoreError> {
        self.state_mut()?.valve.extend(points);
        Ok(())
    }

    /// Installs the reconstructor's updated list in place of the current one.
    pub fn replace_intervals(
        &mut self,
        intervals: Vec<model::HydrationInterval>,
    ) -> Result<(), StoreError> {
        self.state_mut()?.intervals = intervals;
        Ok(())
    }

    pub fn append_batch(&mut self, batch: Batch) -> Result<(), StoreError> {
        let state = self.state_mut()?;
        state.volume.extend(batch.volume);
        state.valve.extend(batch.valve);
        state.intervals = batch.intervals;
        Ok(())
    }

    /// The pagination cursor: the timestamp of the last volume point.
    pub fn tail_timestamp(&self) -> Option<chrono::NaiveDateTime> {
        self.current
            .as_ref()
            .and_then(|state| state.volume.last())
            .map(|point| point.timestamp)
    }

    fn state_mut(&mut self) -> Result<&mut DeviceSeriesState, StoreError> {
        self.current.as_mut().ok_or(StoreError::NoDeviceSelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(seconds: i64) -> chrono::NaiveDateTime {
        chrono::DateTime::from_timestamp(seconds, 0)
            .unwrap()
            .naive_utc()
    }

    fn point(seconds: i64, value: f64) -> model::Point {
        model::Point {
            timestamp: ts(seconds),
            value: Some(value),
        }
    }

    #[test]
    fn appends_require_a_selected_device() {
        let mut store = SeriesStore::new();
        assert_eq!(
            store.append_volume(vec![point(1, 1.0)]),
            Err(StoreError::NoDeviceSelected)
        );
        assert_eq!(
            store.append_batch(Batch::default()),
            Err(StoreError::NoDeviceSelected)
        );
        assert_eq!(store.tail_timestamp(), None);
    }

    #[test]
    fn tail_follows_last_volume_point() {
        let mut store = SeriesStore::new();
        store.select_device(model::DeviceId::new("abcd1234"));
        assert_eq!(store.tail_timestamp(), None);

        store.append_volume(vec![point(1, 1.0), point(2, 2.0)]).unwrap();
        store.append_valve(vec![point(1, 10.0), point(2, 20.0), point(3, 30.0)]).unwrap();
        assert_eq!(store.tail_timestamp(), Some(ts(2)));
    }

    #[test]
    fn selecting_a_device_clears_everything() {
        let mut store = SeriesStore::new();
        store.select_device(model::DeviceId::new("a"));
        store
            .append_batch(Batch {
                volume: vec![point(1, 1.0)],
                valve: vec![point(1, 5.0)],
                intervals: vec![model::HydrationInterval::opened_at(ts(1))],
            })
            .unwrap();

        store.select_device(model::DeviceId::new("b"));
        let state = store.current().unwrap();
        assert_eq!(state, &DeviceSeriesState::empty(model::DeviceId::new("b")));

        let before = store.selection();
        store.select_device(model::DeviceId::new("b"));
        assert!(store.current().unwrap().volume.is_empty());
        assert_eq!(store.selection(), before + 1);
    }

    #[test]
    fn batch_replaces_intervals_and_extends_points() {
        let mut store = SeriesStore::new();
        store.select_device(model::DeviceId::new("a"));
        store.replace_intervals(vec![model::HydrationInterval::opened_at(ts(1))]).unwrap();

        let closed = model::HydrationInterval {
            from: ts(1),
            to: ts(4),
            active: false,
        };
        store
            .append_batch(Batch {
                volume: vec![point(3, 1.0), point(4, 2.0)],
                valve: vec![point(3, 1.0), point(4, 2.0)],
                intervals: vec![closed],
            })
            .unwrap();

        let state = store.current().unwrap();
        assert_eq!(state.intervals, vec![closed]);
        assert_eq!(state.volume.len(), 2);
        assert_eq!(store.tail_timestamp(), Some(ts(4)));
    }

    proptest! {
        #[test]
        fn series_stay_ordered_when_chunks_follow_the_cursor(
            gaps in prop::collection::vec(prop::collection::vec(0i64..5, 0..10), 1..8)
        ) {
            let mut store = SeriesStore::new();
            store.select_device(model::DeviceId::new("dev"));
            for chunk in gaps {
                let mut clock = store.tail_timestamp().map_or(0, |t| t.and_utc().timestamp());
                let samples = chunk
                    .into_iter()
                    .map(|gap| {
                        clock += gap + 1;
                        model::Sample {
                            timestamp: ts(clock),
                            volume: Some(clock as f64),
                            valve_percent: None,
                            hydration: model::HydrationMarker::None,
                        }
                    })
                    .collect::<Vec<_>>();
                store.append_batch(Batch::from_samples(&samples, Vec::new())).unwrap();
            }

            let state = store.current().unwrap();
            prop_assert_eq!(state.volume.len(), state.valve.len());
            for series in &[&state.volume, &state.valve] {
                for pair in series.windows(2) {
                    prop_assert!(pair[0].timestamp <= pair[1].timestamp);
                }
            }
        }
    }
}

/// Body of `GET /historical-data`.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoricalDataResponse {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub query_timestamp: Option<String>,
    #[serde(default)]
    pub total_records: Option<u64>,
    pub data: Vec<RawRecord>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawRecord {
    pub timestamp: String,
    #[serde(default)]
    pub gas_meter_volume_instant: Option<f64>,
    #[serde(default)]
    pub gas_valve_percent_open: Option<f64>,
    #[serde(default)]
    pub is_hydration: Option<String>,
}

/// Body of `GET /user/devices`.
#[derive(Clone, Debug, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_devices: Option<u64>,
    pub devices: Vec<DeviceRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

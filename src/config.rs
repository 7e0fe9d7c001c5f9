use std::path;
use std::time;

const DEFAULT_CONFIG_NAME: &str = "hydrawatch";
const ENV_PREFIX: &str = "HYDRAWATCH";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub feed: Feed,
    #[serde(default)]
    pub poll: Poll,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Deserialize)]
pub struct Feed {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_period")]
    pub timeout: Option<time::Duration>,
}

#[derive(Debug, Deserialize)]
pub struct Poll {
    #[serde(default = "default_period", deserialize_with = "deserialize_period")]
    pub period: time::Duration,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub chart_path: Option<path::PathBuf>,
}

impl Default for Poll {
    fn default() -> Self {
        Poll {
            period: default_period(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Layers an optional TOML file and `HYDRAWATCH_*` environment variables.
    ///
    /// An explicitly given path must exist; otherwise `hydrawatch.toml` in the working directory
    /// is read when present.
    pub fn load(path: Option<&path::Path>) -> Result<Config, failure::Error> {
        let file = match path {
            Some(path) => config_rs::File::from(path).required(true),
            None => config_rs::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config = config_rs::Config::builder()
            .add_source(file)
            .add_source(
                config_rs::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

fn default_period() -> time::Duration {
    time::Duration::from_secs(1)
}

fn default_page_size() -> u32 {
    1000
}

/// Parses durations like `"250ms"`, `"1s"`, `"5m"` or `"1h"`.
pub fn parse_period(raw: &str) -> Result<time::Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or_else(|| raw.len());
    let (amount, unit) = raw.split_at(split);

    let amount = amount
        .parse::<u64>()
        .map_err(|e| format!("a leading integer amount: {}", e))?;

    let seconds = |per_unit: u64| {
        amount
            .checked_mul(per_unit)
            .map(time::Duration::from_secs)
            .ok_or_else(|| format!("an amount of at most {} seconds", u64::MAX))
    };

    match unit.trim() {
        "ms" => Ok(time::Duration::from_millis(amount)),
        "s" => Ok(time::Duration::from_secs(amount)),
        "m" => seconds(60),
        "h" => seconds(60 * 60),
        _ => Err(
            "an amount followed by one of \"ms\", \"s\", \"m\" or \"h\", like \"1s\"".to_owned(),
        ),
    }
}

fn deserialize_period<'de, D>(deserializer: D) -> Result<time::Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
    let period = parse_period(&raw).map_err(|expected| {
        serde::de::Error::invalid_value(serde::de::Unexpected::Str(&raw), &expected.as_str())
    })?;

    if period == time::Duration::from_secs(0) {
        Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Str(&raw),
            &"a non-zero duration",
        ))
    } else {
        Ok(period)
    }
}

fn deserialize_optional_period<'de, D>(deserializer: D) -> Result<Option<time::Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_period(deserializer).map(Some)
}

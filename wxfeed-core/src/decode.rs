//! JSON payload decoding for both request kinds.
//!
//! Decoding is best-effort: a missing, `null` or wrongly typed value leaves
//! its field at zero or empty text instead of failing. Only a payload that is
//! not JSON at all (or does not fit the parse buffer) is rejected.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    model::{CurrentConditions, ForecastPeriod, MAX_READINGS},
};

/// Largest response body the decoder accepts.
pub const PARSE_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    #[serde(deserialize_with = "text")]
    main: String,
    #[serde(deserialize_with = "text")]
    description: String,
    #[serde(deserialize_with = "text")]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    #[serde(deserialize_with = "number")]
    temp: f64,
    #[serde(deserialize_with = "number")]
    pressure: f64,
    #[serde(deserialize_with = "number")]
    humidity: f64,
    #[serde(deserialize_with = "number")]
    temp_min: f64,
    #[serde(deserialize_with = "number")]
    temp_max: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    #[serde(deserialize_with = "number")]
    speed: f64,
    #[serde(deserialize_with = "number")]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwClouds {
    #[serde(deserialize_with = "integer")]
    all: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwPrecipitation {
    #[serde(rename = "1h", deserialize_with = "number")]
    one_hour: f64,
    #[serde(rename = "3h", deserialize_with = "number")]
    three_hours: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    #[serde(deserialize_with = "integer")]
    sunrise: i64,
    #[serde(deserialize_with = "integer")]
    sunset: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    #[serde(deserialize_with = "list")]
    weather: Vec<OwWeather>,
    #[serde(deserialize_with = "object")]
    main: OwMain,
    #[serde(deserialize_with = "object")]
    wind: OwWind,
    #[serde(deserialize_with = "object")]
    clouds: OwClouds,
    #[serde(deserialize_with = "integer")]
    visibility: i64,
    #[serde(deserialize_with = "object")]
    rain: OwPrecipitation,
    #[serde(deserialize_with = "object")]
    snow: OwPrecipitation,
    #[serde(deserialize_with = "object")]
    sys: OwSys,
    #[serde(deserialize_with = "integer")]
    timezone: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastEntry {
    #[serde(deserialize_with = "integer")]
    dt: i64,
    #[serde(deserialize_with = "text")]
    dt_txt: String,
    #[serde(deserialize_with = "object")]
    main: OwMain,
    #[serde(deserialize_with = "list")]
    weather: Vec<OwWeather>,
    #[serde(deserialize_with = "object")]
    rain: OwPrecipitation,
    #[serde(deserialize_with = "object")]
    snow: OwPrecipitation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastResponse {
    #[serde(deserialize_with = "list")]
    list: Vec<OwForecastEntry>,
}

/// Decode a `weather` payload into a fresh record.
///
/// The returned record carries the default trend; the trend belongs to the
/// forecast step and is restored by the caller.
pub fn decode_weather(body: &[u8]) -> Result<CurrentConditions> {
    let parsed: OwCurrentResponse = parse(body)?;
    let first = parsed.weather.into_iter().next().unwrap_or_default();

    let conditions = CurrentConditions {
        main: first.main,
        description: first.description,
        icon: first.icon,
        temperature: parsed.main.temp,
        pressure: parsed.main.pressure,
        humidity: parsed.main.humidity,
        low: parsed.main.temp_min,
        high: parsed.main.temp_max,
        wind_speed: parsed.wind.speed,
        wind_direction: parsed.wind.deg,
        cloud_cover: parsed.clouds.all,
        visibility: parsed.visibility,
        rainfall: parsed.rain.one_hour,
        snowfall: parsed.snow.one_hour,
        sunrise: parsed.sys.sunrise,
        sunset: parsed.sys.sunset,
        timezone: parsed.timezone,
        ..CurrentConditions::default()
    };

    debug!(?conditions, "Decoded weather");
    Ok(conditions)
}

/// Decode a `forecast` payload into `out`, overwriting every slot.
///
/// Returns how many periods the payload actually supplied (at most
/// [`MAX_READINGS`]). Slots past that count are reset to their defaults.
pub fn decode_forecast(body: &[u8], out: &mut [ForecastPeriod; MAX_READINGS]) -> Result<usize> {
    let parsed: OwForecastResponse = parse(body)?;
    let available = parsed.list.len().min(MAX_READINGS);

    let mut entries = parsed.list.into_iter();
    for (r, slot) in out.iter_mut().enumerate() {
        *slot = entries.next().map(to_period).unwrap_or_default();
        debug!(period = r, dt = slot.dt, pressure = slot.pressure, "Decoded forecast period");
    }

    if available < MAX_READINGS {
        warn!(available, expected = MAX_READINGS, "Forecast list shorter than requested");
    }

    Ok(available)
}

fn to_period(entry: OwForecastEntry) -> ForecastPeriod {
    let icon = entry.weather.into_iter().next().map(|w| w.icon).unwrap_or_default();

    ForecastPeriod {
        dt: entry.dt,
        period: entry.dt_txt,
        temperature: entry.main.temp,
        low: entry.main.temp_min,
        high: entry.main.temp_max,
        pressure: entry.main.pressure,
        humidity: entry.main.humidity,
        icon,
        rainfall: entry.rain.three_hours,
        snowfall: entry.snow.three_hours,
    }
}

fn parse<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.len() > PARSE_BUFFER_BYTES {
        return Err(Error::PayloadTooLarge { len: body.len(), limit: PARSE_BUFFER_BYTES });
    }
    let root: Value = serde_json::from_slice(body)?;
    Ok(T::deserialize(root).unwrap_or_default())
}

/// Any value that does not fit `T` (wrong type, `null`) becomes `T::default()`.
fn object<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(T::deserialize(Value::deserialize(d)?).unwrap_or_default())
}

/// Like [`object`], element by element, so one bad entry keeps its index.
fn list<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| T::deserialize(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        _ => 0.0,
    })
}

fn integer<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or_default(),
        _ => 0,
    })
}

fn text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

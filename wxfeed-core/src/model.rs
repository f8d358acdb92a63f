use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Number of forecast periods requested (`cnt=`) and kept per refresh.
pub const MAX_READINGS: usize = 24;

/// Spacing between consecutive forecast periods, in hours.
pub const STEP_HOURS: usize = 3;

/// The two remote calls that make up a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Weather,
    Forecast,
}

impl RequestKind {
    /// Path segment used in `/data/2.5/{kind}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Weather => "weather",
            RequestKind::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short-term barometric pressure direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Trend {
    #[serde(rename = "+")]
    Rising,
    #[serde(rename = "-")]
    Falling,
    #[serde(rename = "0")]
    Steady,
    #[default]
    #[serde(rename = "=")]
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "+",
            Trend::Falling => "-",
            Trend::Steady => "0",
            Trend::Unknown => "=",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions as reported by the `weather` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub main: String,
    pub description: String,
    pub icon: String,
    pub temperature: f64,
    /// hPa, or inHg once converted to imperial.
    pub pressure: f64,
    pub humidity: f64,
    pub low: f64,
    pub high: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    /// Percent.
    pub cloud_cover: i64,
    /// Metres.
    pub visibility: i64,
    pub rainfall: f64,
    pub snowfall: f64,
    pub sunrise: i64,
    pub sunset: i64,
    /// Seconds east of UTC.
    pub timezone: i64,
    pub trend: Trend,
}

impl CurrentConditions {
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        i32::try_from(self.timezone)
            .ok()
            .and_then(FixedOffset::east_opt)
    }

    pub fn sunrise_time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunrise)
    }

    pub fn sunset_time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunset)
    }
}

/// One 3-hour step of the `forecast` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastPeriod {
    pub dt: i64,
    /// Server-formatted `dt_txt`, e.g. `2024-03-01 12:00:00`.
    pub period: String,
    pub temperature: f64,
    pub low: f64,
    pub high: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub icon: String,
    pub rainfall: f64,
    pub snowfall: f64,
}

impl ForecastPeriod {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.dt)
    }
}

/// Output of one refresh cycle, overwritten in place by the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecords {
    pub conditions: CurrentConditions,
    pub forecast: [ForecastPeriod; MAX_READINGS],
}

impl Default for WeatherRecords {
    fn default() -> Self {
        Self {
            conditions: CurrentConditions::default(),
            forecast: std::array::from_fn(|_| ForecastPeriod::default()),
        }
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

use crate::model::{ForecastPeriod, STEP_HOURS, Trend, WeatherRecords};

/// How far ahead the pressure trend looks.
pub const TREND_HORIZON_HOURS: usize = 6;

/// Forecast index compared against index 0 for the trend.
pub const TREND_LOOKAHEAD: usize = TREND_HORIZON_HOURS / STEP_HOURS;

pub fn mm_to_inches(value_mm: f64) -> f64 {
    0.0393701 * value_mm
}

pub fn hpa_to_inhg(value_hpa: f64) -> f64 {
    0.02953 * value_hpa
}

/// Convert the fields surfaced to the display to imperial units, in place.
///
/// Only current pressure and the first forecast period's rainfall and
/// snowfall are touched. Not idempotent: a second call scales them again.
pub fn convert_to_imperial(records: &mut WeatherRecords) {
    records.conditions.pressure = hpa_to_inhg(records.conditions.pressure);
    records.forecast[0].rainfall = mm_to_inches(records.forecast[0].rainfall);
    records.forecast[0].snowfall = mm_to_inches(records.forecast[0].snowfall);
}

/// Pressure direction between now and [`TREND_HORIZON_HOURS`] ahead.
///
/// Differences below 0.1 are truncated away. Returns `Unknown` when the
/// lookahead period is absent or the difference is not a number.
pub fn pressure_trend(forecast: &[ForecastPeriod]) -> Trend {
    let (Some(now), Some(later)) = (forecast.first(), forecast.get(TREND_LOOKAHEAD)) else {
        return Trend::Unknown;
    };

    let delta = now.pressure - later.pressure;
    let delta = (delta * 10.0).trunc() / 10.0;

    if delta > 0.0 {
        Trend::Rising
    } else if delta < 0.0 {
        Trend::Falling
    } else if delta == 0.0 {
        Trend::Steady
    } else {
        Trend::Unknown
    }
}

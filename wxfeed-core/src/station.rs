use tracing::{info, warn};

use crate::{
    config::{Config, Units},
    decode::{decode_forecast, decode_weather},
    error::Result,
    fetch::{Fetcher, Transport},
    model::{CurrentConditions, ForecastPeriod, MAX_READINGS, RequestKind, WeatherRecords},
    normalize::{TREND_LOOKAHEAD, convert_to_imperial, pressure_trend},
};

/// Tries allowed per request kind in one refresh cycle.
pub const MAX_ATTEMPTS: u8 = 2;

/// Owns the fetcher and the records it fills.
///
/// Records are only consistent after [`Station::refresh`] returns `true`;
/// a failed cycle may leave them partially updated.
#[derive(Debug)]
pub struct Station {
    fetcher: Fetcher,
    records: WeatherRecords,
}

impl Station {
    pub fn new(config: &Config, transport: Box<dyn Transport>) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config, transport)?,
            records: WeatherRecords::default(),
        })
    }

    pub fn records(&self) -> &WeatherRecords {
        &self.records
    }

    pub fn conditions(&self) -> &CurrentConditions {
        &self.records.conditions
    }

    pub fn forecast(&self) -> &[ForecastPeriod; MAX_READINGS] {
        &self.records.forecast
    }

    /// Run one refresh cycle. Succeeds only if both kinds were received.
    pub async fn refresh(&mut self) -> bool {
        let mut need_weather = true;
        let mut need_forecast = true;
        let mut attempt = 1;

        while (need_weather || need_forecast) && attempt <= MAX_ATTEMPTS {
            if need_weather {
                need_weather = !self.obtain(RequestKind::Weather, attempt).await;
            }
            if need_forecast {
                need_forecast = !self.obtain(RequestKind::Forecast, attempt).await;
            }
            attempt += 1;
        }

        if need_weather || need_forecast {
            warn!(need_weather, need_forecast, "Refresh failed");
            return false;
        }

        if self.fetcher.units() == Units::Imperial {
            convert_to_imperial(&mut self.records);
        }

        info!("Received all weather data");
        true
    }

    async fn obtain(&mut self, kind: RequestKind, attempt: u8) -> bool {
        match self.fetch_and_decode(kind).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%kind, attempt, transport = e.is_transport(), "Attempt failed: {e}");
                false
            }
        }
    }

    async fn fetch_and_decode(&mut self, kind: RequestKind) -> Result<()> {
        let body = self.fetcher.fetch(kind).await?;

        match kind {
            RequestKind::Weather => {
                let trend = self.records.conditions.trend;
                self.records.conditions = CurrentConditions { trend, ..decode_weather(&body)? };
            }
            RequestKind::Forecast => {
                let available = decode_forecast(&body, &mut self.records.forecast)?;
                self.records.conditions.trend = if available > TREND_LOOKAHEAD {
                    pressure_trend(&self.records.forecast)
                } else {
                    Default::default()
                };
            }
        }

        Ok(())
    }
}

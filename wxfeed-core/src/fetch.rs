use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{
    config::{Config, Units},
    decode::PARSE_BUFFER_BYTES,
    error::{Error, Result},
    model::{MAX_READINGS, RequestKind},
};

/// Status code of one GET, and its body when the status is 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// HTTP collaborator used by the [`Fetcher`].
///
/// Implementations must not retry; that is left to the station.
#[async_trait]
pub trait Transport: Send + Debug {
    /// Issue a GET. Fails only when no response was received at all.
    async fn get(&mut self, url: &Url) -> Result<HttpResponse>;

    /// Close any connection that is still open.
    fn stop(&mut self);
}

/// [`Transport`] backed by `reqwest`.
///
/// Only 200 bodies are read, and never past [`PARSE_BUFFER_BYTES`].
/// The client (and with it the pooled connection) is dropped on every
/// `stop()`, so no more than one connection is open at a time.
#[derive(Debug)]
pub struct HttpTransport {
    timeout: Duration,
    client: Option<Client>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, client: None }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(1)
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&mut self, url: &Url) -> Result<HttpResponse> {
        let client = self.client()?;
        let mut res = client.get(url.clone()).send().await?;

        let status = res.status();
        if status != StatusCode::OK {
            return Ok(HttpResponse { status: status.as_u16(), body: Vec::new() });
        }

        let limit = PARSE_BUFFER_BYTES;
        if let Some(len) = res.content_length() {
            let len = usize::try_from(len).unwrap_or(usize::MAX);
            if len > limit {
                return Err(Error::PayloadTooLarge { len, limit });
            }
        }

        // Content-Length may be absent or wrong; stop reading at the limit.
        let mut body = Vec::new();
        while let Some(chunk) = res.chunk().await? {
            let len = body.len() + chunk.len();
            if len > limit {
                return Err(Error::PayloadTooLarge { len, limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse { status: status.as_u16(), body })
    }

    fn stop(&mut self) {
        self.client = None;
    }
}

/// Builds request URLs from configuration and performs single GETs.
#[derive(Debug)]
pub struct Fetcher {
    transport: Box<dyn Transport>,
    server: Url,
    api_key: String,
    city: String,
    country: String,
    units: Units,
    language: String,
}

impl Fetcher {
    pub fn new(config: &Config, transport: Box<dyn Transport>) -> Result<Self> {
        let server = Url::parse(&config.server)
            .map_err(|e| Error::InvalidConfig(format!("server URL '{}': {e}", config.server)))?;
        if server.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "server URL '{}' cannot carry a path",
                config.server
            )));
        }

        Ok(Self {
            transport,
            server,
            api_key: config.api_key.clone(),
            city: config.city.clone(),
            country: config.country.clone(),
            units: config.units,
            language: config.language.clone(),
        })
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// `/data/2.5/{kind}?q=..&APPID=..&mode=json&units=..&lang=..[&cnt=N]`
    pub fn request_url(&self, kind: RequestKind) -> Url {
        let mut url = self.server.clone();
        url.set_path(&format!("/data/2.5/{kind}"));
        url.set_query(None);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &format!("{},{}", self.city, self.country))
                .append_pair("APPID", &self.api_key)
                .append_pair("mode", "json")
                .append_pair("units", self.units.as_query())
                .append_pair("lang", &self.language);
            if kind == RequestKind::Forecast {
                query.append_pair("cnt", &MAX_READINGS.to_string());
            }
        }

        url
    }

    /// Perform one GET for `kind` and return the response body.
    pub async fn fetch(&mut self, kind: RequestKind) -> Result<Vec<u8>> {
        let url = self.request_url(kind);
        debug!(%kind, url = %redact(&url), "Requesting");

        self.transport.stop();
        let response = self.transport.get(&url).await;
        self.transport.stop();

        let response = response?;
        if response.status != StatusCode::OK.as_u16() {
            return Err(Error::Status(response.status));
        }

        debug!(%kind, bytes = response.body.len(), "Received response body");
        Ok(response.body)
    }
}

fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "APPID" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Stop,
        Get(String),
    }

    #[derive(Debug)]
    struct RecordingTransport {
        status: u16,
        events: Arc<Mutex<Vec<Event>>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(&mut self, url: &Url) -> Result<HttpResponse> {
            self.events.lock().unwrap().push(Event::Get(url.path().to_string()));
            Ok(HttpResponse { status: self.status, body: b"{}".to_vec() })
        }

        fn stop(&mut self) {
            self.events.lock().unwrap().push(Event::Stop);
        }
    }

    fn config() -> Config {
        Config {
            api_key: "SECRET".into(),
            city: "Melksham".into(),
            country: "UK".into(),
            units: Units::Imperial,
            language: "en".into(),
            ..Config::default()
        }
    }

    fn fetcher(status: u16) -> (Fetcher, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let transport = RecordingTransport { status, events: events.clone() };
        (Fetcher::new(&config(), Box::new(transport)).unwrap(), events)
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[test]
    fn weather_url_has_no_count() {
        let (fetcher, _) = fetcher(200);
        let url = fetcher.request_url(RequestKind::Weather);

        assert_eq!(url.path(), "/data/2.5/weather");
        assert_eq!(
            query(&url),
            vec![
                ("q".to_string(), "Melksham,UK".to_string()),
                ("APPID".to_string(), "SECRET".to_string()),
                ("mode".to_string(), "json".to_string()),
                ("units".to_string(), "imperial".to_string()),
                ("lang".to_string(), "en".to_string()),
            ]
        );
    }

    #[test]
    fn forecast_url_requests_fixed_count() {
        let (fetcher, _) = fetcher(200);
        let url = fetcher.request_url(RequestKind::Forecast);

        assert_eq!(url.path(), "/data/2.5/forecast");
        let pairs = query(&url);
        assert_eq!(pairs.last(), Some(&("cnt".to_string(), MAX_READINGS.to_string())));
    }

    #[test]
    fn redact_hides_api_key() {
        let (fetcher, _) = fetcher(200);
        let shown = redact(&fetcher.request_url(RequestKind::Weather));
        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("Melksham"));
    }

    #[test]
    fn rejects_unparseable_server() {
        let cfg = Config { server: "::nope".into(), ..config() };
        let transport = RecordingTransport { status: 200, events: Arc::default() };
        let err = Fetcher::new(&cfg, Box::new(transport)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn closes_connection_around_each_request() {
        let (mut fetcher, events) = fetcher(200);
        let body = fetcher.fetch(RequestKind::Weather).await.unwrap();
        assert_eq!(body, b"{}");

        assert_eq!(
            *events.lock().unwrap(),
            vec![Event::Stop, Event::Get("/data/2.5/weather".into()), Event::Stop]
        );
    }

    #[tokio::test]
    async fn non_ok_status_is_transport_error() {
        let (mut fetcher, events) = fetcher(401);
        let err = fetcher.fetch(RequestKind::Forecast).await.unwrap_err();

        assert!(matches!(err, Error::Status(401)));
        assert!(err.is_transport());
        assert_eq!(events.lock().unwrap().last(), Some(&Event::Stop));
    }
}

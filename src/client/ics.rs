// File: ./src/client/ics.rs
//! Published `.ics` feeds (`ics_url`), fetched with the same HTTP stack as
//! the CalDAV client.
use crate::client::core::{HttpsClient, build_http_client};
use crate::config::{CalendarAlias, Config};
use crate::error::AgendaError;
use crate::model::RawRecord;
use crate::source::{CalendarSource, FetchWindow, IcsFileSource, records_in_window};

use http::{Request, Uri};
use libdav::dav::WebDavClient;

/// Reads calendars from their `ics_url`, or from their `file` when no URL
/// is set.
#[derive(Debug, Clone)]
pub struct IcsFeedSource {
    http: HttpsClient,
    files: IcsFileSource,
}

impl IcsFeedSource {
    pub fn new(user: &str, pass: &str, insecure: bool) -> Self {
        Self::with_client(build_http_client(user, pass, insecure))
    }

    pub(crate) fn with_client(http: HttpsClient) -> Self {
        Self {
            http,
            files: IcsFileSource::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.username,
            &config.password,
            config.allow_insecure_certs,
        )
    }

    /// GETs the feed and returns its body as text.
    pub async fn download(&self, url: &str) -> Result<String, String> {
        let uri: Uri = url
            .parse()
            .map_err(|e| format!("Invalid feed URL: {}", e))?;
        let webdav = WebDavClient::new(uri.clone(), self.http.clone());

        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header(http::header::ACCEPT, "text/calendar")
            .body(String::new())
            .map_err(|e| e.to_string())?;

        let (parts, body) = webdav
            .request_raw(req)
            .await
            .map_err(|e| format!("{:?}", e))?;
        if !parts.status.is_success() {
            return Err(format!("GET failed: {}", parts.status));
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl CalendarSource for IcsFeedSource {
    async fn fetch(
        &self,
        calendar: &CalendarAlias,
        window: &FetchWindow,
    ) -> Result<Vec<RawRecord>, AgendaError> {
        let Some(url) = &calendar.ics_url else {
            return self.files.fetch(calendar, window).await;
        };

        log::debug!("Downloading <{}> from {}", calendar.name, url);
        let contents = self
            .download(url)
            .await
            .map_err(|e| AgendaError::fetch(&calendar.name, e))?;
        Ok(records_in_window(calendar, &contents, window))
    }
}

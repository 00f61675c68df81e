// File: src/client/core.rs
use crate::client::auth::{AuthLayer, AuthService};
use crate::client::cert::NoVerifier;
use crate::client::ics::IcsFeedSource;
use crate::client::middleware::{UserAgentLayer, UserAgentService};
use crate::config::{CalendarAlias, Config};
use crate::error::AgendaError;
use crate::model::RawRecord;
use crate::source::{CalendarSource, FetchWindow, split_events};

use libdav::caldav::{FindCalendarHomeSet, FindCalendars};
use libdav::dav::{GetProperty, WebDavClient};
use libdav::{CalDavClient, names};

use http::{Request, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower::ServiceBuilder;

const DAV_NS: &str = "DAV:";
const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";
const QUERY_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub(crate) type HttpsClient =
    UserAgentService<AuthService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>>;

fn strip_host(href: &str) -> String {
    if let Ok(uri) = href.parse::<Uri>()
        && (uri.scheme().is_some() || uri.authority().is_some())
    {
        return uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
    }
    href.to_string()
}

/// HTTP(S) client with orgcal's User-Agent and Basic/Digest auth.
pub(crate) fn build_http_client(user: &str, pass: &str, insecure: bool) -> HttpsClient {
    let tls_config_builder = rustls::ClientConfig::builder();
    let tls_config = if insecure {
        tls_config_builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth()
    } else {
        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            log::warn!("No system certificates found, https connections will fail");
        }
        tls_config_builder
            .with_root_certificates(root_store)
            .with_no_client_auth()
    };

    let https_connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
    ServiceBuilder::new()
        .layer(UserAgentLayer::default())
        .layer(AuthLayer::new(user, pass))
        .service(http_client)
}

/// A calendar collection found on the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarCollection {
    pub name: String,
    pub href: String,
}

/// Reads events from a CalDAV server with server-side recurrence expansion.
#[derive(Debug)]
pub struct CalDavSource {
    client: CalDavClient<HttpsClient>,
    collections: OnceCell<Vec<CalendarCollection>>,
    /// Calendars configured with `ics_url` or `file` bypass the server.
    feeds: IcsFeedSource,
}

impl CalDavSource {
    pub fn new(url: &str, user: &str, pass: &str, insecure: bool) -> Result<Self, AgendaError> {
        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| AgendaError::Config(format!("url: {}", e)))?;

        if insecure {
            log::warn!("Certificate verification is disabled for {}", url);
        }
        let http_client = build_http_client(user, pass, insecure);
        let webdav = WebDavClient::new(uri, http_client.clone());
        Ok(Self {
            client: CalDavClient::new(webdav),
            collections: OnceCell::new(),
            feeds: IcsFeedSource::with_client(http_client),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AgendaError> {
        if config.url.is_empty() {
            return Err(AgendaError::Config("no server url configured".to_string()));
        }
        Self::new(
            &config.url,
            &config.username,
            &config.password,
            config.allow_insecure_certs,
        )
    }

    // --- DISCOVERY ---

    /// Lists the calendars of the current user with their display names.
    pub async fn discover_calendars(&self) -> Result<Vec<CalendarCollection>, String> {
        let client = &self.client;
        let principal = client
            .find_current_user_principal()
            .await
            .map_err(|e| format!("{:?}", e))?
            .ok_or("No principal")?;

        let home_set_resp = client
            .request(FindCalendarHomeSet::new(principal.path()))
            .await
            .map_err(|e| format!("{:?}", e))?;

        let home_url = home_set_resp.home_sets.first().ok_or("No home set")?;

        let cals_resp = client
            .request(FindCalendars::new(home_url.path()))
            .await
            .map_err(|e| format!("{:?}", e))?;

        let mut calendars = Vec::new();
        for col in cals_resp.calendars {
            let name = client
                .request(GetProperty::new(&col.href, &names::DISPLAY_NAME))
                .await
                .ok()
                .and_then(|r| r.value)
                .unwrap_or_else(|| col.href.clone());
            log::debug!("Found calendar <{}> at {}", name, col.href);
            calendars.push(CalendarCollection {
                name,
                href: col.href,
            });
        }
        Ok(calendars)
    }

    async fn resolve_href(&self, calendar: &CalendarAlias) -> Result<String, AgendaError> {
        if let Some(href) = &calendar.href {
            return Ok(strip_host(href));
        }

        let collections = self
            .collections
            .get_or_try_init(|| self.discover_calendars())
            .await
            .map_err(|e| AgendaError::fetch(&calendar.name, format!("discovery: {}", e)))?;

        collections
            .iter()
            .find(|c| c.name == calendar.name)
            .map(|c| strip_host(&c.href))
            .ok_or_else(|| AgendaError::fetch(&calendar.name, "no such calendar on the server"))
    }

    // --- EVENT FETCHING ---

    /// Runs a `calendar-query` REPORT for the window and returns the raw
    /// `calendar-data` of every matching resource.
    pub async fn query_events(&self, href: &str, window: &FetchWindow) -> Result<Vec<String>, String> {
        let webdav = &self.client.webdav_client;
        let uri = webdav
            .relative_uri(href)
            .map_err(|e| format!("Invalid calendar URI: {}", e))?;

        let req = Request::builder()
            .method("REPORT")
            .uri(uri)
            .header("Depth", "1")
            .header(http::header::CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(calendar_query_body(window))
            .map_err(|e| e.to_string())?;

        let (parts, body) = webdav
            .request_raw(req)
            .await
            .map_err(|e| format!("{:?}", e))?;
        if !parts.status.is_success() {
            return Err(format!("REPORT failed: {}", parts.status));
        }

        parse_calendar_data(&String::from_utf8_lossy(&body))
    }
}

impl CalendarSource for CalDavSource {
    async fn fetch(
        &self,
        calendar: &CalendarAlias,
        window: &FetchWindow,
    ) -> Result<Vec<RawRecord>, AgendaError> {
        if calendar.ics_url.is_some() || calendar.file.is_some() {
            return self.feeds.fetch(calendar, window).await;
        }

        let href = self.resolve_href(calendar).await?;
        let resources = self
            .query_events(&href, window)
            .await
            .map_err(|e| AgendaError::fetch(&calendar.name, e))?;

        // An expanded recurring event comes back as one resource holding
        // every instance.
        Ok(resources
            .iter()
            .flat_map(|data| split_events(data))
            .map(|event| RawRecord::new(&calendar.name, event))
            .collect())
    }
}

pub fn calendar_query_body(window: &FetchWindow) -> String {
    let start = window.start.format(QUERY_TIME_FORMAT);
    let end = window.end.format(QUERY_TIME_FORMAT);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<C:calendar-query xmlns:D="{dav}" xmlns:C="{caldav}">
  <D:prop>
    <D:getetag/>
    <C:calendar-data>
      <C:expand start="{start}" end="{end}"/>
    </C:calendar-data>
  </D:prop>
  <C:filter>
    <C:comp-filter name="VCALENDAR">
      <C:comp-filter name="VEVENT">
        <C:time-range start="{start}" end="{end}"/>
      </C:comp-filter>
    </C:comp-filter>
  </C:filter>
</C:calendar-query>
"#,
        dav = DAV_NS,
        caldav = CALDAV_NS,
        start = start,
        end = end,
    )
}

/// Extracts the `calendar-data` texts from a multistatus response.
pub fn parse_calendar_data(xml: &str) -> Result<Vec<String>, String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| format!("Bad multistatus: {}", e))?;
    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name((CALDAV_NS, "calendar-data")))
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

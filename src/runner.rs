// File: ./src/runner.rs
//! One complete run: fetch every calendar, build the agenda, write it out.
use crate::agenda::{Agenda, build_agenda};
use crate::client::{CalDavSource, IcsFeedSource};
use crate::config::Config;
use crate::context::AppContext;
use crate::output::OrgFile;
use crate::source::{CalendarSource, FetchWindow, collect_records};
use anyhow::Result;
use std::path::PathBuf;

/// Where the rendered agenda goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The configured output file (or the context default).
    Configured,
    File(PathBuf),
    Stdout,
}

pub async fn fetch_agenda<S: CalendarSource>(
    source: &S,
    config: &Config,
    window: &FetchWindow,
) -> Result<Agenda> {
    let records = collect_records(source, config, window).await;
    Ok(build_agenda(&records, config)?)
}

/// Fetches from the server when a url is configured. Calendars with an
/// `ics_url` or `file` are read from there in either case.
pub async fn run(config: &Config, ctx: &dyn AppContext, destination: &Destination) -> Result<Agenda> {
    let window = FetchWindow::from_now(config.days)?;

    let agenda = if config.url.is_empty() {
        log::info!("No server url configured, reading ics feeds and files");
        fetch_agenda(&IcsFeedSource::from_config(config), config, &window).await?
    } else {
        log::info!("Init CalDAV client for {} ...", config.url);
        let source = CalDavSource::from_config(config)?;
        fetch_agenda(&source, config, &window).await?
    };

    let text = agenda.render();
    match destination {
        Destination::Stdout => print!("{}", text),
        Destination::File(path) => OrgFile::write(path, &text)?,
        Destination::Configured => OrgFile::write(&config.output_path(ctx)?, &text)?,
    }
    Ok(agenda)
}

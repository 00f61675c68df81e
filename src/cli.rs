// File: ./src/cli.rs
//! Command-line argument handling and help text.
use crate::context::AppContext;
use crate::runner::Destination;
use log::LevelFilter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub destination: Destination,
    pub log_level: LevelFilter,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            root: None,
            config: None,
            destination: Destination::Configured,
            log_level: LevelFilter::Info,
            help: false,
        }
    }
}

impl CliArgs {
    /// The config file this run reads: `--config`, else the context default.
    pub fn config_path(&self, ctx: &dyn AppContext) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => ctx.get_config_file_path(),
        }
    }
}

/// What to tell the user when `path` does not exist.
pub fn missing_config_hint(path: &Path) -> String {
    format!(
        "Create {} (see 'orgcal --help' for the format)",
        path.display()
    )
}

/// Parses the arguments after the binary name.
pub fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => parsed.help = true,
            "-r" | "--root" => parsed.root = Some(value_for(&arg, args.next())?),
            "-c" | "--config" => parsed.config = Some(value_for(&arg, args.next())?),
            "-o" | "--output" => {
                parsed.destination = Destination::File(value_for(&arg, args.next())?)
            }
            "--stdout" => parsed.destination = Destination::Stdout,
            "-v" | "--verbose" => parsed.log_level = LevelFilter::Debug,
            "-q" | "--quiet" => parsed.log_level = LevelFilter::Warn,
            other => return Err(format!("Unknown argument '{}'", other)),
        }
    }
    Ok(parsed)
}

fn value_for(flag: &str, value: Option<String>) -> Result<PathBuf, String> {
    match value {
        Some(v) if !v.starts_with('-') => Ok(PathBuf::from(v)),
        _ => Err(format!("{} needs a path", flag)),
    }
}

pub fn print_help(binary_name: &str) {
    println!(
        "orgcal v{} - CalDAV meetings as an org-mode agenda",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS]", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -c, --config <file>   Read this config file instead of <config dir>/config.toml.");
    println!("    -o, --output <file>   Write the agenda here instead of the configured file.");
    println!("        --stdout          Print the agenda instead of writing a file.");
    println!("    -v, --verbose         Log every accepted meeting.");
    println!("    -q, --quiet           Only log warnings and errors.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("CONFIG (config.toml):");
    println!("    url = \"https://dav.example.com/remote.php/dav/calendars/me\"");
    println!("    username = \"me\"");
    println!("    password = \"secret\"");
    println!("    timezone = \"Europe/Berlin\"");
    println!("    days = 14                  # at most 3660");
    println!("    output = \"~/org/cal.org\"");
    println!("    keywords = [\"Journal Club\", \"PhD workshop\"]");
    println!();
    println!("    [[calendars]]");
    println!("    name = \"Team (Jane Doe)\"     # display name on the server");
    println!("    label = \"Team\"               # heading used in the agenda");
    println!("    # href = \"/dav/calendars/me/team/\"   skip discovery");
    println!("    # ics_url = \"https://example.com/team.ics\"   subscribe to a published feed");
    println!("    # file = \"~/exports/team.ics\"        read a local export");
}

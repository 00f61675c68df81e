use anyhow::Result;
use orgcal::cli::{missing_config_hint, parse_args, print_help};
use orgcal::config::Config;
use orgcal::context::{AppContext, StandardContext};
use orgcal::runner;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::process::ExitCode;

fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .add_filter_allow_str("orgcal")
        .build();
    // A logger may already be installed; keep going without ours.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn load_config(args: &orgcal::cli::CliArgs, ctx: &dyn AppContext) -> Result<Config> {
    let path = args.config_path(ctx)?;

    Config::load_from(&path).map_err(|e| {
        if Config::is_missing_config_error(&e) {
            log::error!("{}", missing_config_hint(&path));
        }
        e
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut argv = env::args();
    let binary_name = argv.next().unwrap_or_else(|| "orgcal".to_string());

    let args = match parse_args(argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Try '{} --help'", binary_name);
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help(&binary_name);
        return ExitCode::SUCCESS;
    }

    init_logging(args.log_level);
    log::info!("Start");

    let ctx = StandardContext::new(args.root.clone());
    let config = match load_config(&args, &ctx) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Can't load the config file: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match runner::run(&config, &ctx, &args.destination).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

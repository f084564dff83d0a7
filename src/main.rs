//! winter-peaks entry point: CLI wiring and config-driven handler construction.

use std::path::Path;
use std::process;

use chrono::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use winter_peaks::config::EngineConfig;
use winter_peaks::io::export::{export_peaks_csv, export_timeline_csv};
use winter_peaks::io::import::read_events_file;
use winter_peaks::opendata::{
    DatasetProcessor, PeakEventsProcessor, SectorFilter, offers_fetch_params, offers_in_response,
};
use winter_peaks::peak::time::parse_peak_datetime;
use winter_peaks::peak::{Clock, FixedClock, PeakHandler, PeakRecord, Sector, SystemClock};
use winter_peaks::reporting::print_state_report;

/// Length of the exported timeline.
const TIMELINE_HOURS: i64 = 48;
/// Sampling step of the exported timeline.
const TIMELINE_STEP_MINUTES: i64 = 15;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    events_path: Option<String>,
    at: Option<String>,
    preheat_override: Option<u32>,
    schedule: bool,
    timeline_out: Option<String>,
    peaks_out: Option<String>,
    list_rates: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("winter-peaks - Winter peak event state engine");
    eprintln!();
    eprintln!("Usage: winter-peaks [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        EngineConfig::PRESETS.join(", ")
    );
    eprintln!("  --events <path>          Peak events JSON (records response or array)");
    eprintln!("  --at <datetime>          Evaluate at a fixed instant instead of now");
    eprintln!("  --preheat <minutes>      Override pre-heat duration");
    eprintln!("  --schedule               Add regular winter peaks behind announcements");
    eprintln!("  --timeline-out <path>    Export a {TIMELINE_HOURS} h state timeline to CSV");
    eprintln!("  --peaks-out <path>       Export loaded peaks with their windows to CSV");
    eprintln!("  --list-rates             List rate options offered by --events, then exit");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after evaluation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the flex_d preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following flag `name`, or exits.
fn flag_value(args: &[String], i: &mut usize, name: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {name} requires {what} argument");
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        events_path: None,
        at: None,
        preheat_override: None,
        schedule: false,
        timeline_out: None,
        peaks_out: None,
        list_rates: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => cli.config_path = Some(flag_value(&args, &mut i, "--config", "a path")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "--preset", "a name")),
            "--events" => cli.events_path = Some(flag_value(&args, &mut i, "--events", "a path")),
            "--at" => cli.at = Some(flag_value(&args, &mut i, "--at", "a datetime")),
            "--preheat" => {
                let value = flag_value(&args, &mut i, "--preheat", "a u32");
                if let Ok(m) = value.parse::<u32>() {
                    cli.preheat_override = Some(m);
                } else {
                    eprintln!("error: --preheat value \"{value}\" is not a valid u32");
                    process::exit(1);
                }
            }
            "--schedule" => cli.schedule = true,
            "--timeline-out" => {
                cli.timeline_out = Some(flag_value(&args, &mut i, "--timeline-out", "a path"));
            }
            "--peaks-out" => cli.peaks_out = Some(flag_value(&args, &mut i, "--peaks-out", "a path")),
            "--list-rates" => cli.list_rates = true,
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                let value = flag_value(&args, &mut i, "--port", "a u16");
                if let Ok(p) = value.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{value}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Schedule placeholders covering `days_ahead` days from the handler's today.
fn schedule_records<C: Clock>(cfg: &EngineConfig, handler: &PeakHandler<C>) -> Vec<PeakRecord> {
    let Some(offer) = handler.primary_offer() else {
        return Vec::new();
    };
    let sector = match cfg.sector_filter() {
        SectorFilter::Residential => Sector::Residential,
        SectorFilter::Commercial => Sector::Commercial,
        SectorFilter::Any => Sector::Unknown,
    };
    let today = handler.clock().now().date_naive();
    cfg.schedule()
        .records(offer, sector, today, cfg.schedule.days_ahead)
}

/// Reads the events file, or an empty response when none was given.
fn read_response(path: Option<&str>) -> serde_json::Value {
    let Some(path) = path else {
        return empty_response();
    };
    match read_events_file(Path::new(path)) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("error: failed to read events \"{path}\": {e}");
            process::exit(1);
        }
    }
}

fn empty_response() -> serde_json::Value {
    serde_json::json!({ "results": [] })
}

/// Prints the rate options offered by the events file, or the whole offer
/// table when the file is missing or names no known offer.
fn list_rates(cli: &CliArgs, cfg: &EngineConfig) {
    let map = cfg.rate_map();
    let query = offers_fetch_params(cfg.sector_filter());
    info!(query = ?query.query_pairs(), "open data offers query");

    let offers = match cli.events_path {
        Some(ref path) => offers_in_response(&read_response(Some(path.as_str()))),
        None => Vec::new(),
    };
    let mut options = map.rate_options(offers.iter().map(String::as_str));
    if options.is_empty() {
        warn!("no known offer in feed, listing the full offer table");
        options = map.fallback_rate_options();
    }

    for option in &options {
        println!("{}\t{}", option.value, option.label);
    }
}

/// Loads events, prints the report, then exports and serves as requested.
fn run<C>(cli: &CliArgs, cfg: &EngineConfig, mut handler: PeakHandler<C>)
where
    C: Clock + Send + Sync + 'static,
{
    // The events file stands in for the fetch: the refined offer is
    // applied locally, and a rate without offers loads nothing from it.
    let processor = PeakEventsProcessor::for_handler(&handler)
        .with_sector(cfg.sector_filter())
        .with_limit(cfg.fetch.limit)
        .with_offer_filter();

    let fetch = processor.build_fetch_params(handler.clock().now());
    let (response, extra) = match fetch {
        Some(params) => {
            info!(query = ?params.query_pairs(), "open data query for this rate");
            let extra = if cli.schedule || cfg.schedule.enabled {
                schedule_records(cfg, &handler)
            } else {
                Vec::new()
            };
            (read_response(cli.events_path.as_deref()), extra)
        }
        None => (empty_response(), Vec::new()),
    };

    let summary = processor.load_into(&response, extra, &mut handler);
    if !summary.is_clean() {
        eprintln!("warning: {} malformed peak record(s) skipped", summary.skipped());
    }

    print_state_report(&handler.snapshot());

    if let Some(ref path) = cli.timeline_out {
        let from = handler.clock().now();
        let samples = handler.state_timeline(
            from,
            from + Duration::hours(TIMELINE_HOURS),
            Duration::minutes(TIMELINE_STEP_MINUTES),
        );
        if let Err(e) = export_timeline_csv(&samples, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Timeline written to {path}");
    }

    if let Some(ref path) = cli.peaks_out {
        if let Err(e) = export_peaks_csv(handler.events(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Peaks written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(winter_peaks::api::AppState { handler });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(winter_peaks::api::serve(state, addr)) {
            eprintln!("error: API server failed on {addr}: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // --config takes priority, then --preset, then flex_d
    let mut cfg = if let Some(ref path) = cli.config_path {
        match EngineConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match EngineConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        EngineConfig::flex_d()
    };

    if let Some(minutes) = cli.preheat_override {
        cfg.preheat.duration_minutes = minutes;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if cli.list_rates {
        list_rates(&cli, &cfg);
        return;
    }

    match cli.at {
        Some(ref at) => match parse_peak_datetime(at) {
            Ok(now) => run(&cli, &cfg, cfg.build_handler_with_clock(FixedClock::new(now))),
            Err(e) => {
                eprintln!("error: --at: {e}");
                process::exit(1);
            }
        },
        None => run(&cli, &cfg, cfg.build_handler_with_clock(SystemClock)),
    }
}

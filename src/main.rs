use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Parser;
use masjid_locator::config::AppConfig;
use masjid_locator::geo::{format_coords, format_distance, Coordinate};
use masjid_locator::location::{
    FixedLocationProvider, IpLocationProvider, LocationProvider, UnavailableProvider,
};
use masjid_locator::places::{EmptyRemotePolicy, NearbyPlacesResolver};
use masjid_locator::prayer::{check_date, AsrJuristic, CalculationMethod, SolarCalculator};
use masjid_locator::server::{self, AppState};
use masjid_locator::session::{Session, SessionSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Masjid Locator: nearby mosques and today's prayer schedule.
///
/// Queries the configured places backend and falls back to a built-in list
/// (sorted by distance) when the backend is missing, failing, or empty.
///
/// Examples:
///   masjid --lat 24.4672 --lon 39.6112 --tz Asia/Riyadh
///   masjid --auto --method umm-al-qura
///   masjid --offline --json
///   masjid --serve --port 8080
#[derive(Parser)]
#[command(name = "masjid", version, about, long_about = None)]
struct Cli {
    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Locate via IP geolocation.
    #[arg(long, short = 'a', conflicts_with = "lat")]
    auto: bool,

    /// Date (YYYY-MM-DD). Defaults to today in the display timezone.
    #[arg(long, short = 'd')]
    date: Option<String>,

    /// IANA timezone for displayed times (e.g. Asia/Riyadh).
    #[arg(long)]
    tz: Option<String>,

    /// Calculation method: mwl, umm-al-qura, egyptian, isna, karachi.
    #[arg(long, value_parser = parse_method)]
    method: Option<CalculationMethod>,

    /// Asr convention: standard or hanafi.
    #[arg(long, value_parser = parse_asr)]
    asr: Option<AsrJuristic>,

    /// Show an empty backend answer as-is instead of the built-in list.
    #[arg(long)]
    accept_empty: bool,

    /// Skip the backend and location lookup; built-in data only.
    #[arg(long)]
    offline: bool,

    /// Print the session as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Run the HTTP API instead of printing once.
    #[arg(long)]
    serve: bool,

    /// Bind address for --serve.
    #[arg(long)]
    host: Option<String>,

    /// Port for --serve.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Config file (default ~/.masjid/config.json).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_method(s: &str) -> Result<CalculationMethod, String> {
    s.parse()
}

fn parse_asr(s: &str) -> Result<AsrJuristic, String> {
    s.parse()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Fold CLI flags over the loaded config.
fn apply_cli(cli: &Cli, config: &mut AppConfig) {
    if let Some(tz) = &cli.tz {
        config.timezone = Some(tz.clone());
    }
    if let Some(method) = cli.method {
        config.method = method;
    }
    if let Some(asr) = cli.asr {
        config.asr = asr;
    }
    if cli.accept_empty {
        config.empty_remote_policy = EmptyRemotePolicy::Accept;
    }
    if cli.offline {
        config.remote = None;
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
}

fn choose_provider(cli: &Cli) -> Result<Arc<dyn LocationProvider>> {
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        let coordinate = Coordinate::new(lat, lon).context("invalid --lat/--lon")?;
        return Ok(Arc::new(FixedLocationProvider::new(coordinate)));
    }
    if cli.auto && !cli.offline {
        return Ok(Arc::new(IpLocationProvider::new()));
    }
    Ok(Arc::new(UnavailableProvider))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_cli(&cli, &mut config);
    config.validate()?;
    let tz = config.tz()?;

    let resolver = Arc::new(
        NearbyPlacesResolver::new(config.remote.clone())
            .with_empty_policy(config.empty_remote_policy),
    );
    let calculator = SolarCalculator::new(config.method, config.asr);
    let session = Session::with_provider(
        choose_provider(&cli)?,
        config.default_location,
        resolver.clone(),
        Arc::new(calculator),
        tz,
    );

    if cli.serve {
        let state = Arc::new(AppState { resolver, calculator, tz, session });
        server::start(&config.host, config.port, state)
            .await
            .with_context(|| format!("server on {}:{} failed", config.host, config.port))?;
        return Ok(());
    }

    let now = Utc::now();
    let date = match &cli.date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}'", d))?,
        None => now.with_timezone(&tz).date_naive(),
    };
    let date = check_date(date)?;

    let snapshot = session.start(date, now).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot, tz, date, &calculator);
    }
    Ok(())
}

fn print_snapshot(snap: &SessionSnapshot, tz: Tz, date: NaiveDate, calculator: &SolarCalculator) {
    eprintln!("  \u{1F4CD} {}", snap.location.display_line());
    if snap.degraded {
        match &snap.nearby.fallback_reason {
            Some(reason) => {
                eprintln!("  \u{26A0}\u{FE0F}  Demo mode: showing built-in places ({})", reason)
            }
            None => eprintln!("  \u{26A0}\u{FE0F}  Demo mode: showing built-in places"),
        }
    }

    println!();
    println!(
        "  Prayer times for {} ({}, {}, Asr {})",
        date,
        tz.name(),
        calculator.method,
        calculator.asr
    );
    for (prayer, time) in snap.prayer_times.iter() {
        let marker = match &snap.current {
            Some(c) if c.current == Some(prayer) => "  \u{25C0} now",
            Some(c) if c.next == prayer => "  \u{2190} next",
            _ => "",
        };
        println!("    {:<8} {}{}", prayer.to_string(), time, marker);
    }
    if let Some(c) = &snap.current {
        let (h, m) = (c.remaining_minutes / 60, c.remaining_minutes % 60);
        println!("    {} in {}h {:02}m", c.next, h, m);
    }

    println!();
    if snap.nearby.places.is_empty() {
        println!("  No places nearby.");
        return;
    }
    println!("  Nearby ({}):", snap.nearby.provenance);
    for place in &snap.nearby.places {
        let distance = place.distance_meters.map(format_distance).unwrap_or_else(|| "?".into());
        println!("    {:>8}  {}", distance, place.name);
        println!("              {}", format_coords(place.coordinate));
        if let Some(address) = &place.address {
            println!("              {}", address);
        }
    }
}

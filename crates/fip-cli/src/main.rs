mod args;
mod prompt;

use anyhow::Context;
use clap::Parser;
use fip_core::acquire::cover::HttpImageFetcher;
use fip_core::acquire::download::YtDlpExtractor;
use fip_core::acquire::metadata::ConfiguredTagger;
use fip_core::acquire::AcquisitionPipeline;
use fip_core::config::Config;
use fip_core::fetcher::MetadataFetcher;
use fip_core::timeline::{Resolution, ScheduleTimeline};

use args::Args;
use prompt::{query_yes_no, Answer};

fn init_logging() -> anyhow::Result<()> {
    let data_dir = fip_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("fipdl.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("fipdl log: {}", log_path.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;
    tracing::info!("fipdl starting…");

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("could not load config, using defaults: {:#}", e);
        Config::default()
    });
    args.apply(&mut config);

    // ── Fetch and resolve ────────────────────────────────────────────────────
    let fetcher = MetadataFetcher::from_config(&config.schedule, &config.network);
    let doc = fetcher
        .get_schedule()
        .await
        .context("could not fetch the live schedule")?;
    let timeline = ScheduleTimeline::build_from_document(&doc)
        .context("could not read the live schedule")?;

    let now = chrono::Local::now();
    for line in timeline.render(now) {
        println!("{line}");
    }
    if let Some(official) = timeline.official_current() {
        tracing::debug!("[schedule] station marks as current: {}", official);
    }
    if args.list {
        return Ok(());
    }

    let resolved = timeline.resolve(now).context("nothing to download")?;
    if resolved.how == Resolution::Fallback {
        println!(" ** No song airs right now, picking the closest entry.");
    }
    let song = resolved.song;

    // ── Confirm ──────────────────────────────────────────────────────────────
    let music_dir = config.paths.music_dir();
    if !args.yes {
        let question = format!(
            " ** Do you want to download current song {} in {} ?",
            song.display_title(),
            music_dir.display()
        );
        let stdin = std::io::stdin();
        let confirmed = query_yes_no(&question, Answer::Yes, &mut stdin.lock(), &mut std::io::stdout())?;
        if !confirmed {
            tracing::info!("download declined");
            return Ok(());
        }
    }

    // first confirmed run leaves an editable config behind
    match Config::write_default_if_missing() {
        Ok(true) => tracing::info!("wrote default config to {}", Config::config_path().display()),
        Ok(false) => {}
        Err(e) => tracing::warn!("could not write default config: {:#}", e),
    }

    // ── Acquire ──────────────────────────────────────────────────────────────
    let pipeline = AcquisitionPipeline::new(
        YtDlpExtractor::from_config(&config.tools),
        ConfiguredTagger::from_config(&config.tools),
        HttpImageFetcher::from_config(&config.network)?,
    );
    println!(" ** Downloading {} ...", song.display_title());
    let result = pipeline.acquire(song, &music_dir).await;
    println!("{}", result.summary());

    if let Some(report) = result.report() {
        if report.has_failures() {
            tracing::warn!("acquisition finished with failures");
        }
    }

    Ok(())
}

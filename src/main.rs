mod cli;
mod config;
mod controller;
mod engine;
mod error;
mod poller;
mod quota;
mod session;
mod submit;
mod view;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Command, StyleArg};
use config::TerjemahConfig;
use controller::LifecycleController;
use engine::{EngineClient, FilePart};
use error::{TerjemahError, ValidationError};
use poller::{JobCache, JobPoller};
use quota::{HttpQuotaSource, QuotaTracker};
use session::{ConfigSession, Identity, SessionGate};
use submit::{JobSubmitter, SubmissionRequest};
use view::{JobListView, SubmitProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = TerjemahConfig::load()?;
    let api = Arc::new(EngineClient::new(config.api_base.clone()));
    let provider = ConfigSession::new(&config.user_id, &config.email);
    let gate = SessionGate::new();

    match cli.command {
        Command::Submit {
            file,
            font,
            style,
            own_key,
            api_key,
        } => {
            let identity = gate.restore(&provider).await;
            run_submit(&config, api, identity, &file, font.as_deref(), style, own_key, api_key)
                .await?;
        }
        Command::Jobs => {
            let identity = gate.restore(&provider).await;
            run_jobs(api, identity).await?;
        }
        Command::Watch => {
            gate.restore(&provider).await;
            run_watch(&config, api, &gate).await?;
        }
        Command::Quota => {
            let identity = gate.restore(&provider).await;
            run_quota(&config, identity).await?;
        }
        Command::Status => {
            let identity = gate.restore(&provider).await;
            run_status(api, identity).await?;
        }
        Command::Login { provider: oauth } => match gate.login(&provider, &oauth).await {
            Ok(Some(identity)) => println!("Logged in as {}", identity.email),
            Ok(None) => println!("Login did not produce a session; remaining logged out."),
            Err(e) => println!("{e}"),
        },
        Command::Logout => {
            gate.restore(&provider).await;
            gate.logout(&provider).await;
            println!("Logged out; local session state cleared.");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "terjemah=debug"
    } else {
        "terjemah=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_part(path: &Path) -> Result<FilePart, TerjemahError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.epub")
        .to_string();
    Ok(FilePart { filename, bytes })
}

#[allow(clippy::too_many_arguments)]
async fn run_submit(
    config: &TerjemahConfig,
    api: Arc<EngineClient>,
    identity: Option<Identity>,
    file: &Path,
    font: Option<&Path>,
    style: StyleArg,
    own_key: bool,
    api_key: Option<String>,
) -> Result<()> {
    let quota = QuotaTracker::new();
    let source = HttpQuotaSource::new(config.quota_url.clone());
    if let Some(identity) = &identity {
        quota.refresh(&source, &identity.id).await;
    }
    let cache = JobCache::new();
    cache.bind(identity.as_ref().map(|i| i.id.clone()));

    let document = read_part(file)?;
    let font = font.map(read_part).transpose()?;
    let filename = document.filename.clone();

    // --api-key implies the own-key path; a bare --own-key falls back to
    // the configured credential.
    let use_own_key = own_key || api_key.is_some();
    let key = api_key
        .or_else(|| (use_own_key && !config.api_key.is_empty()).then(|| config.api_key.clone()));
    let request = SubmissionRequest {
        document: Some(document),
        font,
        style: style.into(),
        use_own_key,
        api_key: key,
    };

    let mut submitter = JobSubmitter::new(
        api.clone(),
        quota,
        cache.clone(),
        config.target_lang.clone(),
    );
    let progress = SubmitProgress::start(&filename);
    match submitter.submit(identity.as_ref(), request).await {
        Ok(ack) => {
            progress.accepted(&ack.job_id);
            let view = JobListView::new(api.base_url());
            print!("{}", view.render(&cache.jobs()));
            Ok(())
        }
        Err(e) => {
            progress.rejected(&e.user_message());
            std::process::exit(1);
        }
    }
}

/// One-shot snapshot; this is also the manual refresh affordance and shares
/// the poller's fetch path without touching any timer.
async fn run_jobs(api: Arc<EngineClient>, identity: Option<Identity>) -> Result<()> {
    let identity = identity.ok_or(TerjemahError::Validation(ValidationError::MissingSession))?;
    let cache = JobCache::new();
    cache.bind(Some(identity.id.clone()));
    JobPoller::refresh_once(api.as_ref(), &cache, &identity.id).await;

    let view = JobListView::new(api.base_url());
    print!("{}", view.render(&cache.jobs()));
    Ok(())
}

async fn run_watch(
    config: &TerjemahConfig,
    api: Arc<EngineClient>,
    gate: &SessionGate,
) -> Result<()> {
    let source = HttpQuotaSource::new(config.quota_url.clone());
    let mut controller = LifecycleController::new(api.clone(), source, config.poll_interval());
    let quota = controller.quota();
    let cache = controller.cache();
    let shutdown = CancellationToken::new();

    let sessions = gate.subscribe();
    let stop = shutdown.clone();
    let runner = tokio::spawn(async move {
        controller.run(sessions, stop).await;
    });

    let view = JobListView::new(api.base_url());
    let term = console::Term::stdout();
    let mut ticker = tokio::time::interval(config.poll_interval());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                term.clear_screen()?;
                match gate.current() {
                    Some(identity) => {
                        println!(
                            "[{}] {}   server quota {}\n",
                            identity.display_initial(),
                            identity.email,
                            view.quota_badge(quota.used()),
                        );
                        print!("{}", view.render(&cache.jobs()));
                    }
                    None => println!("Not logged in."),
                }
            }
        }
    }

    shutdown.cancel();
    let _ = runner.await;
    Ok(())
}

async fn run_quota(config: &TerjemahConfig, identity: Option<Identity>) -> Result<()> {
    let identity = identity.ok_or(TerjemahError::Validation(ValidationError::MissingSession))?;
    let quota = QuotaTracker::new();
    let source = HttpQuotaSource::new(config.quota_url.clone());
    quota.refresh(&source, &identity.id).await;

    let view = JobListView::new(&config.api_base);
    println!("Server quota: {}", view.quota_badge(quota.used()));
    Ok(())
}

async fn run_status(api: Arc<EngineClient>, identity: Option<Identity>) -> Result<()> {
    match &identity {
        Some(identity) => println!("Session: {}", identity.email),
        None => println!("Session: not logged in"),
    }
    match api.health().await {
        Ok(()) => println!("Engine:  {} reachable", api.base_url()),
        Err(e) => println!("Engine:  {} unreachable ({})", api.base_url(), e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_part_carries_file_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, b"epub bytes").unwrap();

        let part = read_part(&path).unwrap();
        assert_eq!(part.filename, "book.epub");
        assert_eq!(part.bytes, b"epub bytes");
    }

    #[test]
    fn read_part_missing_file_is_an_io_error() {
        let err = read_part(Path::new("/nonexistent/book.epub")).unwrap_err();
        assert!(matches!(err, TerjemahError::Io(_)));
    }
}

mod config;
mod logging;
mod render;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use modeldl_client::{ClientSettings, DownloadSession};
use modeldl_core::{Phase, SessionState};
use modeldl_logging::{dl_error, dl_info, dl_warn};

use config::{AppConfig, CONFIG_FILENAME, SERVER_URL_ENV};

const EXIT_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            dl_error!("modeldl failed: {:#}", err);
            eprintln!("modeldl: {err:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let Some(url) = std::env::args().nth(1) else {
        eprintln!("usage: modeldl <model-url>");
        return Ok(ExitCode::from(EXIT_USAGE));
    };

    let config = AppConfig::load(Path::new(CONFIG_FILENAME))?
        .with_server_override(std::env::var(SERVER_URL_ENV).ok());
    logging::initialize(config.log_destination, config.level()?);
    let settings = config.client_settings()?;
    dl_info!("modeldl starting server={}", settings.server_url);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(watch_download(settings, &url)))
}

enum Step {
    Update(Option<SessionState>),
    Interrupted,
}

async fn watch_download(settings: ClientSettings, url: &str) -> ExitCode {
    let mut session = DownloadSession::new(settings);

    if let Err(err) = session.submit(url).await {
        eprintln!("{err}");
        return ExitCode::from(EXIT_USAGE);
    }
    println!("{}", render::render_line(&session.view()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let step = tokio::select! {
            result = &mut ctrl_c => {
                if let Err(err) = result {
                    dl_warn!("Ctrl-C handler failed: {}", err);
                }
                Step::Interrupted
            }
            update = session.next_update() => Step::Update(update),
        };

        match step {
            Step::Update(Some(_)) => println!("{}", render::render_line(&session.view())),
            Step::Update(None) => break,
            Step::Interrupted => {
                session.cancel();
                session.shutdown().await;
                println!("{}", render::summary(&session.view()));
                return ExitCode::from(EXIT_INTERRUPTED);
            }
        }
    }

    session.shutdown().await;
    let view = session.view();
    println!("{}", render::summary(&view));
    match view.phase {
        Phase::Completed => ExitCode::SUCCESS,
        _ => ExitCode::from(EXIT_FAILED),
    }
}

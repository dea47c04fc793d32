use std::io::Write;
use std::time::Duration;

use bookscroll::{LoadError, PagerOptions, Span};
use clap::Parser;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::client::CatalogClient;
use crate::config::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_SUBJECT};
use crate::controller::Controller;
use crate::error::FetchError;
use crate::source::PageSource;

#[derive(Debug, Parser)]
#[command(
    name = "bookscroll",
    about = "Scroll through an Open Library subject, one page at a time",
    version
)]
pub struct Cli {
    /// Catalog subject to list.
    #[arg(long, default_value = DEFAULT_SUBJECT)]
    pub subject: String,

    /// Catalog root URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// How many times to scroll to the bottom after the first page.
    #[arg(long, default_value_t = 2)]
    pub pages: usize,

    /// Viewport height in lines.
    #[arg(long, default_value_t = 20)]
    pub viewport: u32,

    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Retries per failed page before giving up.
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,
}

impl Cli {
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig::new(self.subject.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("giving up on offset {offset} after {attempts} attempts: {source}")]
    GaveUp {
        offset: u64,
        attempts: u32,
        #[source]
        source: LoadError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Fetch(_) => 2,
            Self::GaveUp { .. } => 3,
            Self::Io(_) => 1,
        }
    }
}

/// Installs the stderr log subscriber (`RUST_LOG`, default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

pub async fn run(cli: Cli) -> Result<()> {
    let client = CatalogClient::new(&cli.config())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(&cli, client, &mut out).await
}

/// Mounts the list on `source`, prints it, then scrolls to the bottom `cli.pages` times.
///
/// A scroll only fetches when the last row comes into view; scrolling stops once it doesn't.
///
/// Only newly appended rows are printed after the first frame.
pub async fn run_with<S: PageSource>(cli: &Cli, source: S, out: &mut impl Write) -> Result<()> {
    let mut controller = Controller::new(source, PagerOptions::new(cli.subject.clone()));
    controller.mount();
    settle(&mut controller, cli.max_retries).await?;

    let mut printed = 0usize;
    print_new_rows(&controller, &mut printed, out)?;

    for _ in 0..cli.pages {
        if controller.pager().is_exhausted() {
            info!(offset = controller.pager().offset(), "end of results");
            break;
        }
        // Scroll so the bottom of the list sits at the bottom of the viewport.
        let bottom = controller.view().content_height();
        let viewport = Span::new(bottom.saturating_sub(cli.viewport as u64), cli.viewport);
        let started = if controller.pager().items().is_empty() {
            // Nothing is rendered to observe.
            controller.load_next()
        } else {
            controller.on_viewport(viewport)
        };
        if !started {
            debug!(offset = controller.pager().offset(), "last row not visible");
            break;
        }
        settle(&mut controller, cli.max_retries).await?;
        print_new_rows(&controller, &mut printed, out)?;
    }

    let mut status = String::new();
    if controller.pager().is_exhausted() {
        status.push_str("(end of results)\n");
    }
    controller.view().write_status(&mut status).ok();
    out.write_all(status.as_bytes())?;
    out.flush()?;
    Ok(())
}

async fn settle<S: PageSource>(controller: &mut Controller<S>, max_retries: u32) -> Result<()> {
    let mut attempts = 1u32;
    loop {
        controller.settle().await;
        let Some(err) = controller.pager().error().cloned() else {
            return Ok(());
        };
        if attempts > max_retries {
            return Err(CliError::GaveUp {
                offset: controller.pager().offset(),
                attempts,
                source: err,
            });
        }
        warn!(error = %err, attempts, "page load failed, retrying");
        attempts += 1;
        controller.retry();
    }
}

fn print_new_rows<S: PageSource>(
    controller: &Controller<S>,
    printed: &mut usize,
    out: &mut impl Write,
) -> Result<()> {
    let view = controller.view();
    let mut text = String::new();
    view.write_rows(&mut text, *printed).ok();
    *printed = view.rows.len();
    out.write_all(text.as_bytes())?;
    Ok(())
}

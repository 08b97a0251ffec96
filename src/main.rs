use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use access_help::core::{
    information_page, load_access_denied_page, load_debug_page_with_reloads, AccessDeniedOptions,
};
use access_help::logger::{init_logger, LogSettings};
use access_help::platform::HttpPortalSession;
use access_help::render;
use access_help::utils::{PortalError, TokioDelay};
use access_help::PortalConfig;

#[derive(Parser)]
#[command(name = "access-help", version, about = "Zero Trust access-denied help portal")]
struct Cli {
    /// Portal backend origin (overrides ACCESS_HELP_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print the page as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    page: Page,
}

#[derive(Subcommand)]
enum Page {
    /// Identity, device, posture, history and group panels
    AccessDenied {
        /// URL of the request that was blocked
        #[arg(long)]
        original_url: Option<String>,
        /// Only list groups containing this term
        #[arg(long, default_value = "")]
        search: String,
        /// Show every group instead of the first few
        #[arg(long)]
        expand_groups: bool,
    },
    /// Frequently asked questions
    Information,
    /// Raw identity dump and posture rule details
    Debug,
}

fn print_page<T: Serialize>(
    as_json: bool,
    page: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<(), PortalError> {
    if as_json {
        let out =
            serde_json::to_string_pretty(page).map_err(|e| PortalError::Parse(e.to_string()))?;
        println!("{}", out);
    } else {
        print!("{}", text(page));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), PortalError> {
    let mut config = PortalConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    tracing::debug!(base_url = %config.base_url, "configuration loaded");

    match cli.page {
        Page::Information => {
            let faq = information_page();
            print_page(cli.json, &faq, |faq| render::render_information(faq))
        }
        Page::AccessDenied {
            original_url,
            search,
            expand_groups,
        } => {
            let session = HttpPortalSession::new(&config)?;
            let options = AccessDeniedOptions {
                original_url,
                group_search: search,
                expand_groups,
            };
            let page = load_access_denied_page(&session, &config, &options).await;
            print_page(cli.json, &page, render::render_access_denied)
        }
        Page::Debug => {
            let session = HttpPortalSession::new(&config)?;
            let view = load_debug_page_with_reloads(&session, &config, &TokioDelay, |message| {
                eprintln!("{}", message)
            })
            .await?;
            print_page(cli.json, &view, render::render_debug)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(&LogSettings::from_env());
    tracing::info!("access-help {} starting", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "page load failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

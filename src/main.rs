use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod actions;
mod app;
mod config;
mod error;
mod exec;
mod menu;
mod naming;
mod process;
mod status;
mod tmux;

use actions::Action;
use app::App;
use config::Config;

/// Env var for the log filter; `RUST_LOG` is used when it is unset
const LOG_ENV: &str = "TMUX_SMART_NAME_LOG";

/// Name tmux windows after what runs in them, and track AI agent status.
#[derive(Parser, Debug)]
#[command(name = "tmux-smart-name", version, about)]
struct Cli {
    /// Print the most urgent agent status and the agent count
    #[arg(long, group = "mode")]
    status: bool,

    /// Show the agent management menu
    #[arg(long, group = "mode")]
    menu: bool,

    /// Print a display-menu command for use in key bindings
    #[arg(long = "menu-cmd", group = "mode")]
    menu_cmd: bool,

    /// Ring the bell when more agents need attention than last time
    #[arg(long = "check-attention", group = "mode")]
    check_attention: bool,

    /// Rename windows, then check attention
    #[arg(long, group = "mode")]
    tick: bool,

    /// Config file (default: $TMUX_SMART_NAME_CONFIG, then the user config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries --status and --menu-cmd output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let action = Action::from_flags(
        cli.status,
        cli.menu,
        cli.menu_cmd,
        cli.check_attention,
        cli.tick,
    );
    let config = Config::load(cli.config.as_deref());

    let mut app = App::new(config);
    if let Err(e) = app.run(action).await {
        warn!("{:?} failed: {:#}", action, e);
    }
    Ok(())
}

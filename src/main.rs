use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod commands;
mod config;
mod models;
mod services;
mod utils;
mod view;

use api::proxy::ProxyClient;
use app::App;
use commands::Command;
use config::Config;
use utils::scheduler::Scheduler;
use view::{TerminalView, View};

/// How long to wait for in-flight requests once input is closed
const DRAIN_GRACE: Duration = Duration::from_secs(25);

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["coinboard=debug", "reqwest=warn", "hyper=warn"] {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive '{}': {}", directive, e),
        }
    }
    filter
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();

    // Logs go to stderr, the table goes to stdout
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    info!("🪙 Starting coinboard...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    info!("Proxy: {} (vs {}, {} per page)", config.proxy_url, config.vs, config.per_page);

    let client = match ProxyClient::new(&config.proxy_url) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create proxy client: {}", e);
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(config, client, TerminalView, Scheduler::new(tx));
    app.bootstrap();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_closed = false;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        input_closed = true;
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        input_closed = true;
                        break;
                    }
                };
                match commands::parse_command(&line) {
                    Ok(Command::Empty) => {}
                    Ok(Command::Quit) => break,
                    Ok(Command::Run(action)) => app.handle(action),
                    Err(usage) => TerminalView.show_text(&usage),
                }
            }
            Some(action) = rx.recv() => app.handle(action),
        }
    }

    // Piped input ends before its requests answer; let them render
    if input_closed && app.pending_requests() > 0 {
        debug!("Input closed, waiting for {} request(s)", app.pending_requests());
        let grace = tokio::time::sleep(DRAIN_GRACE);
        tokio::pin!(grace);
        while app.pending_requests() > 0 {
            tokio::select! {
                Some(action) = rx.recv() => app.handle(action),
                _ = &mut grace => {
                    warn!("Gave up on {} pending request(s)", app.pending_requests());
                    break;
                }
            }
        }
    }

    info!("👋 Bye");
}

mod commands;
mod render;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triage_core::{
    load_config, validate_config, Dashboard, HttpTicketApi, LocationBar, Navigation,
    NotificationCenter, SanitizedConfig, TicketApi, TicketDetailView,
};

use commands::Command;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Query string kept in memory; the console has no address bar of its own.
struct TerminalLocation {
    query: Mutex<String>,
}

impl LocationBar for TerminalLocation {
    fn query(&self) -> String {
        self.query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_query(&self, query: &str) {
        debug!(query, "Location updated");
        *self.query.lock().unwrap_or_else(PoisonError::into_inner) = query.to_string();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("triage console v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("TRIAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("triage.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!(config = %sanitized, "Configuration loaded successfully");

    let api: Arc<dyn TicketApi> = Arc::new(
        HttpTicketApi::new(config.api.clone()).context("Failed to create ticket API client")?,
    );
    let center = Arc::new(NotificationCenter::new());
    let location = Arc::new(TerminalLocation {
        query: Mutex::new(std::env::args().nth(1).unwrap_or_default()),
    });

    let dashboard = Dashboard::new(config, api, center.clone(), location);
    dashboard.mount().await;
    print!("{}", show_dashboard(&dashboard));

    let mut open: Option<Arc<TicketDetailView>> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match commands::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = execute(&dashboard, &center, &mut open, command).await {
                            println!("error: {:#}", e);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    if let Some(view) = open.take() {
        view.close();
    }
    dashboard.unmount();
    info!("Console stopped");
    Ok(())
}

fn show_dashboard(dashboard: &Dashboard) -> String {
    dashboard
        .tab()
        .kinds()
        .iter()
        .map(|kind| render::queue(*kind, &dashboard.snapshot(*kind)))
        .collect()
}

fn show_ticket(view: &TicketDetailView) -> String {
    match view.detail() {
        Some(detail) => render::detail(&detail, view.has_new_activity()),
        None => "ticket not loaded\n".to_string(),
    }
}

fn current(open: &Option<Arc<TicketDetailView>>) -> Result<Arc<TicketDetailView>> {
    open.clone().ok_or_else(|| anyhow!("no ticket is open"))
}

fn changed(changed: bool) {
    if !changed {
        println!("no change");
    }
}

async fn execute(
    dashboard: &Arc<Dashboard>,
    center: &NotificationCenter,
    open: &mut Option<Arc<TicketDetailView>>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => {}
        Command::Show => match open.as_ref() {
            Some(view) => print!("{}", show_ticket(view)),
            None => print!("{}", show_dashboard(dashboard)),
        },
        Command::Refresh => match open.as_ref() {
            Some(view) => {
                view.reload().await?;
                print!("{}", show_ticket(view));
            }
            None => {
                dashboard.refresh_now().await;
                print!("{}", show_dashboard(dashboard));
            }
        },
        Command::Tab(tab) => {
            dashboard.set_tab(tab).await;
            print!("{}", show_dashboard(dashboard));
        }
        Command::Search(kind, text) => {
            dashboard.input_search(kind, text);
            println!("searching {} ...", kind);
        }
        Command::Sort(kind, sort) => changed(dashboard.set_sort(kind, sort).await),
        Command::StatusFilter(kind, status) => {
            changed(dashboard.set_status_filter(kind, status).await)
        }
        Command::Range(range) => changed(dashboard.set_date_range(range).await),
        Command::Page(kind, page) => changed(dashboard.set_page(kind, page).await),
        Command::Limit(kind, limit) => changed(dashboard.set_page_size(kind, limit).await),
        Command::Claim(ticket_id) => {
            let transfer = dashboard.assign_to_me(&ticket_id).await?;
            println!("ticket {} {:?}", transfer.ticket_id, transfer.state);
        }
        Command::Move {
            ticket_id,
            source,
            target,
        } => {
            let transfer = dashboard
                .request_transfer(&ticket_id, source, target)
                .await?;
            println!("ticket {} {:?}", transfer.ticket_id, transfer.state);
        }
        Command::Open(ticket_id) => {
            if let Some(previous) = open.take() {
                previous.close();
            }
            let view = dashboard.open_ticket(&ticket_id);
            match view.open().await? {
                Navigation::Stay => {
                    print!("{}", show_ticket(&view));
                    *open = Some(view);
                }
                Navigation::BackToList => {
                    dashboard.resume().await;
                    print!("{}", show_dashboard(dashboard));
                }
            }
        }
        Command::Back => {
            if let Some(view) = open.take() {
                view.close();
            }
            dashboard.resume().await;
            print!("{}", show_dashboard(dashboard));
        }
        Command::Comment(text) => {
            let view = current(open)?;
            view.edit_comment(text);
            view.submit_comment().await?;
            print!("{}", show_ticket(&view));
        }
        Command::Resolve(text) => {
            let view = current(open)?;
            view.edit_comment(text);
            view.set_resolution(true);
            view.submit_comment().await?;
            print!("{}", show_ticket(&view));
        }
        Command::SetStatus(status, reason) => {
            let view = current(open)?;
            view.select_status(status);
            if let Some(reason) = reason {
                view.set_status_reason(reason);
            }
            view.submit_status().await?;
            print!("{}", show_ticket(&view));
        }
        Command::SetPriority(priority) => {
            let view = current(open)?;
            view.update_priority(priority).await?;
            print!("{}", show_ticket(&view));
        }
        Command::Dismiss => {
            let view = current(open)?;
            view.dismiss_activity().await?;
            print!("{}", show_ticket(&view));
        }
        Command::Notifications => print!("{}", render::notifications(&center.active())),
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

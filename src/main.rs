//! WalletCare - an offline-capable personal expense tracking client.
//!
//! Thin client over the WalletCare REST API: the state controller owns
//! the in-memory state and mediates every server call, while the cache
//! agent precaches the application shell and answers GETs from its
//! generation-versioned disk cache when the network is away. A small
//! line-oriented frontend drives the controller.

mod api;
mod cache;
mod config;
mod controller;
mod identity;
mod models;
mod view;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::{ApiClient, ExpenseApi};
use cache::{CacheAgent, FetchPolicy, HttpFetcher};
use config::Settings;
use controller::{AppController, Tab};
use identity::IdentityStore;
use models::{Category, ConfigPatch, ExpenseDraft};
use view::{ConsoleView, SpeechUnavailable, ViewSink};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("WalletCare client starting");

    // Settings file is optional; fall back to defaults when absent
    let mut settings = Settings::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load settings, using defaults");
        Settings::default()
    });
    if let Ok(url) = std::env::var("WALLETCARE_API_URL") {
        settings.api_base_url = url;
    }

    let identity = IdentityStore::new(settings.data_dir()?);
    let device_id = identity.ensure();
    info!(device_id = %device_id, "Device identity ready");

    // Bring the offline cache up and put it in front of the API client's
    // GETs. Failure is not fatal: the client keeps running network-only.
    // Network-first: live API reads stay fresh online and fall back to
    // the last good response offline.
    let mut cache_agent = CacheAgent::new(
        HttpFetcher::new()?,
        &settings.api_base_url,
        settings.cache_dir()?,
    )
    .with_policy(FetchPolicy::NetworkFirst);
    let client = match cache_agent.install().await {
        Ok(()) => {
            cache_agent.activate().await?;
            ApiClient::new(&settings.api_base_url)?.with_cache(cache_agent)
        }
        Err(e) => {
            warn!(error = %e, "Cache install failed, running without offline cache");
            ApiClient::new(&settings.api_base_url)?
        }
    };

    let mut app = AppController::new(
        client,
        ConsoleView,
        Box::new(SpeechUnavailable),
        device_id,
    );

    app.load_configuration().await;
    app.switch_tab(Tab::Dashboard).await;

    run_loop(&mut app).await?;

    info!("WalletCare client shutting down");
    Ok(())
}

/// Minimal line-oriented frontend over the state controller.
async fn run_loop<A: ExpenseApi, V: ViewSink>(app: &mut AppController<A, V>) -> Result<()> {
    print_help();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        if run_command(app, line.trim()).await {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("Comandos:");
    println!("  aba <dashboard|relatorios|investimentos|config>");
    println!("  gasto <valor> <categoria> <descricao>");
    println!("  impulso <valor> <categoria> <descricao>");
    println!("  chat <mensagem>");
    println!("  renda <valor> | tema | voz");
    println!("  simular <principal> <meses> <taxa>");
    println!("  relatorio | resetar <frase> | sair");
}

/// Dispatch one command line. Returns true when the user asked to quit.
async fn run_command<A: ExpenseApi, V: ViewSink>(
    app: &mut AppController<A, V>,
    input: &str,
) -> bool {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    match command {
        "" => {}
        "sair" => return true,
        "aba" => match rest {
            "dashboard" => app.switch_tab(Tab::Dashboard).await,
            "relatorios" => app.switch_tab(Tab::Reports).await,
            "investimentos" => app.switch_tab(Tab::Investments).await,
            "config" => app.switch_tab(Tab::Settings).await,
            _ => println!("Abas: dashboard, relatorios, investimentos, config"),
        },
        "gasto" | "impulso" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let amount = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0.0);
            let category = parts.next().and_then(Category::from_wire);
            let description = parts.next().unwrap_or("").trim().to_string();
            app.save_expense(ExpenseDraft {
                amount,
                category,
                description,
                is_impulsive: command == "impulso",
            })
            .await;
        }
        "chat" => app.send_chat_message(rest).await,
        "renda" => match rest.parse() {
            Ok(value) => {
                app.save_configuration(ConfigPatch::income(value)).await;
            }
            Err(_) => println!("Uso: renda <valor>"),
        },
        "tema" => {
            app.toggle_theme().await;
        }
        "voz" => app.toggle_recording(),
        "simular" => {
            let mut parts = rest.split_whitespace();
            let mut arg = || parts.next().and_then(|v| v.parse().ok()).unwrap_or(f64::NAN);
            let (principal, periods, rate) = (arg(), arg(), arg());
            app.run_simulation(principal, periods, rate);
        }
        "relatorio" => {
            app.download_report().await;
        }
        "resetar" => {
            app.reset_all_expenses(rest).await;
        }
        _ => print_help(),
    }
    false
}

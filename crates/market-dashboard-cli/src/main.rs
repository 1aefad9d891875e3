mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use market_dashboard_client::dashboard::Dashboard;
use market_dashboard_client::gateway::GatewayClient;
use market_dashboard_client::source::DashboardSource;
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;
use tracing::{info, warn};

use crate::render::render_panel;

#[derive(Parser)]
#[command(
    name = "market-dashboard",
    about = "Per-symbol trend panels from the markets gateway"
)]
struct Cli {
    /// Gateway base URL (default: $DASHBOARD_API_URL or http://localhost:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Time-frame shared by every panel: 1d, 4h, 1h
    #[arg(short, long, default_value = "1d")]
    timeframe: TimeFrame,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh every panel once and print it
    Show {
        /// Symbols to show (comma-separated, defaults to the watchlist)
        #[arg(short, long, value_delimiter = ',')]
        symbols: Option<Vec<Symbol>>,

        /// Also print the sparkline as SVG path data
        #[arg(long)]
        svg: bool,
    },

    /// Keep panels refreshed until interrupted
    Watch {
        /// Symbols to watch (comma-separated, defaults to the watchlist)
        #[arg(short, long, value_delimiter = ',')]
        symbols: Option<Vec<Symbol>>,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },

    /// Inspect or edit the gateway watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },

    /// Ask the analysis service to recompute indicators now
    RunAnalysis,

    /// Ask the gateway to send a Telegram test message
    TelegramTest,

    /// Check that the gateway is reachable
    Health,
}

#[derive(Subcommand)]
enum WatchlistAction {
    /// List watched symbols
    List,
    /// Add a symbol
    Add { symbol: Symbol },
    /// Remove a symbol
    Remove { symbol: Symbol },
}

fn create_client(api_url: Option<&str>) -> Result<GatewayClient> {
    let client = match api_url {
        Some(url) => GatewayClient::new(url),
        None => GatewayClient::from_env(),
    };
    client.context("failed to create gateway client")
}

async fn resolve_symbols(
    client: &GatewayClient,
    symbols: Option<&[Symbol]>,
) -> Result<Vec<Symbol>> {
    match symbols {
        Some(list) => Ok(list.to_vec()),
        None => client.watchlist().await.context("failed to load watchlist"),
    }
}

fn print_dashboard<S: DashboardSource + ?Sized + 'static>(dashboard: &Dashboard<S>, svg: bool) {
    let displays = dashboard.displays();
    if displays.is_empty() {
        println!("Watchlist is empty. Add symbols with `market-dashboard watchlist add SYMBOL`.");
        return;
    }
    for display in &displays {
        println!("{}", render_panel(display, svg));
    }
}

fn warn_if_unsupported(timeframe: TimeFrame) {
    if !timeframe.is_backend_supported() {
        warn!("time-frame {timeframe} may not be computed by the analysis service yet");
    }
}

async fn cmd_show(
    client: Arc<GatewayClient>,
    symbols: Option<&[Symbol]>,
    timeframe: TimeFrame,
    svg: bool,
) -> Result<()> {
    warn_if_unsupported(timeframe);
    let symbols = resolve_symbols(&client, symbols).await?;

    let mut dashboard = Dashboard::new(client, timeframe);
    dashboard.sync_symbols(symbols);
    dashboard.settle().await;

    print_dashboard(&dashboard, svg);
    Ok(())
}

async fn cmd_watch(
    client: Arc<GatewayClient>,
    symbols: Option<&[Symbol]>,
    timeframe: TimeFrame,
    interval: u64,
) -> Result<()> {
    warn_if_unsupported(timeframe);
    let mut dashboard = Dashboard::new(Arc::clone(&client), timeframe);
    let gateway: &GatewayClient = &client;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
        }
    };

    watch_loop(
        &mut dashboard,
        move || resolve_symbols(gateway, symbols),
        Duration::from_secs(interval.max(1)),
        shutdown,
    )
    .await;

    info!("interrupted, exiting");
    Ok(())
}

/// Tick, resync the panel set, refresh and print until `shutdown` resolves.
/// Every await in the body is raced against `shutdown`.
async fn watch_loop<S, L, Fut>(
    dashboard: &mut Dashboard<S>,
    mut load_symbols: L,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) where
    S: DashboardSource + ?Sized + 'static,
    L: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<Symbol>>>,
{
    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        let symbols = tokio::select! {
            result = load_symbols() => result,
            _ = &mut shutdown => break,
        };
        match symbols {
            Ok(symbols) => dashboard.sync_symbols(symbols),
            Err(e) => warn!("{e:#}; keeping current panels"),
        }

        tokio::select! {
            _ = dashboard.refresh_all() => {}
            _ = &mut shutdown => break,
        }
        print_dashboard(dashboard, false);
    }
}

async fn cmd_watchlist(client: &GatewayClient, action: &WatchlistAction) -> Result<()> {
    let symbols = match action {
        WatchlistAction::List => client.watchlist().await.context("failed to load watchlist")?,
        WatchlistAction::Add { symbol } => client
            .add_symbol(symbol)
            .await
            .with_context(|| format!("failed to add {symbol}"))?,
        WatchlistAction::Remove { symbol } => client
            .remove_symbol(symbol)
            .await
            .with_context(|| format!("failed to remove {symbol}"))?,
    };

    if symbols.is_empty() {
        println!("Watchlist is empty.");
    } else {
        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        println!("{}", names.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let client = Arc::new(create_client(cli.api_url.as_deref())?);
    info!("Using gateway: {}", client.base_url());

    match &cli.command {
        Commands::Show { symbols, svg } => {
            cmd_show(client, symbols.as_deref(), cli.timeframe, *svg).await?;
        }
        Commands::Watch { symbols, interval } => {
            cmd_watch(client, symbols.as_deref(), cli.timeframe, *interval).await?;
        }
        Commands::Watchlist { action } => {
            cmd_watchlist(&client, action).await?;
        }
        Commands::RunAnalysis => {
            client
                .run_analysis()
                .await
                .context("failed to trigger analysis run")?;
            println!("Analysis run requested. Wait a few seconds, then refresh.");
        }
        Commands::TelegramTest => {
            let sent = client
                .telegram_test()
                .await
                .context("failed to reach gateway")?;
            if sent {
                println!("Telegram test message sent.");
            } else {
                println!(
                    "No message sent. Check TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID on the gateway."
                );
            }
        }
        Commands::Health => {
            let ok = client.health().await.context("failed to reach gateway")?;
            println!("{}", if ok { "Gateway OK" } else { "Gateway reported not ok" });
        }
    }

    Ok(())
}

// src/main.rs
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{debug, LevelFilter};
use std::sync::Arc;
use trading_client::advice::{AdviceResponse, Severity};
use trading_client::config::Config;
use trading_client::models::{Portfolio, Quote, SearchResult, Session};
use trading_client::portfolio::PortfolioSummary;
use trading_client::presenter::{AuthIntent, AuthPresenter, DashboardIntent, View};
use trading_client::transactions::NormalizedTransactions;
use trading_client::{App, ClientError, Result};

#[derive(Parser)]
#[command(name = "trading-client", about = "Command-line client for the trading backend")]
struct Cli {
    /// Backend base URL (overrides TRADING_API_URL)
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long, env = "TRADING_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "TRADING_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Identity-provider token; used instead of email/password when set
    #[arg(long, env = "TRADING_ID_TOKEN", hide_env_values = true)]
    id_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
    },
    /// Check credentials and show the signed-in user
    Login,
    /// Show live quotes
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Search for a symbol or company
    Search { query: String },
    Buy { symbol: String, quantity: f64 },
    Sell { symbol: String, quantity: f64 },
    /// Portfolio value and recent transactions
    Dashboard,
    /// Market advice for the signed-in user
    Advice,
}

struct Credentials {
    email: Option<String>,
    password: Option<String>,
    id_token: Option<String>,
}

struct TerminalView;

impl View for TerminalView {
    fn show_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }

    fn show_status(&self, message: &str) {
        println!("{}", message);
    }

    fn show_session(&self, session: &Session) {
        let name = session.user.name.as_deref().unwrap_or(&session.user.email);
        println!("Signed in as {} ({})", name, session.user.email);
    }

    fn show_signed_out(&self) {
        println!("Signed out");
    }

    fn show_search_results(&self, results: &[SearchResult]) {
        if results.is_empty() {
            println!("No matches");
        }
        for result in results {
            println!("{:<8} {}", result.symbol, result.name.as_deref().unwrap_or(""));
        }
    }

    fn show_quotes(&self, quotes: &[Quote]) {
        for quote in quotes {
            println!(
                "{:<8} {:>12.2} {:>+8.2}%  {}",
                quote.symbol,
                quote.current_price,
                quote.change_percent,
                quote.name.as_deref().unwrap_or("")
            );
        }
    }

    fn show_summary(&self, portfolio: &Portfolio, summary: &PortfolioSummary) {
        println!("Cash          {:>14.2}", portfolio.cash_balance);
        println!("Market value  {:>14.2}", summary.current_value);
        println!("Cost basis    {:>14.2}", summary.cost_basis);
        println!(
            "Return        {:>14.2} ({:+.2}%)",
            summary.gain(),
            summary.change_percent
        );
        println!();
        println!(
            "{:<8} {:>10} {:>12} {:>12} {:>14} {:>9}",
            "Symbol", "Qty", "Avg cost", "Price", "Value", "Gain %"
        );
        for position in &summary.positions {
            let price = position
                .current_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "{:<8} {:>10.4} {:>12.2} {:>12} {:>14.2} {:>+8.2}%",
                position.symbol,
                position.quantity,
                position.average_cost,
                price,
                position.current_value,
                position.gain_percent
            );
        }
    }

    fn show_transactions(&self, transactions: &NormalizedTransactions) {
        println!();
        println!("Recent transactions");
        for row in transactions.rows_newest_first() {
            println!(
                "{:<20} {:<4} {:<8} {:>10.4} @ {:>10.2} = {:>12.2}",
                row.display_date, row.kind, row.symbol, row.quantity, row.price, row.total
            );
        }
    }

    fn show_advice(&self, advice: &AdviceResponse) {
        println!("{}", advice.title);
        println!();
        println!("{}", advice.content);
        println!();
        for point in &advice.points {
            let tag = match point.severity {
                Severity::Info => "info",
                Severity::Success => " ok ",
                Severity::Warning => "warn",
            };
            println!("[{}] {}", tag, point.text);
        }
    }
}

/// Errors raised outside the presenters are shown here; presenter failures
/// reach the view through `handle`.
fn shown(view: &dyn View, err: ClientError) -> ClientError {
    view.show_error(&err.to_string());
    err
}

async fn sign_in(auth: &AuthPresenter, view: &dyn View, credentials: &Credentials) -> Result<()> {
    if let Some(id_token) = &credentials.id_token {
        return auth
            .handle(AuthIntent::OAuth {
                id_token: id_token.clone(),
            })
            .await;
    }
    match (&credentials.email, &credentials.password) {
        (Some(email), Some(password)) => {
            auth.handle(AuthIntent::Login {
                email: email.clone(),
                password: password.clone(),
            })
            .await
        }
        _ => Err(shown(
            view,
            ClientError::validation("--email and --password (or --id-token) are required"),
        )),
    }
}

async fn run(cli: Cli, view: Arc<dyn View>) -> Result<()> {
    let Cli {
        api_url,
        email,
        password,
        id_token,
        command,
    } = cli;
    let credentials = Credentials {
        email,
        password,
        id_token,
    };

    let mut config = Config::from_env().map_err(|e| shown(view.as_ref(), e))?;
    if let Some(url) = api_url {
        config = config.with_api_url(&url);
    }
    let app = App::new(config).map_err(|e| shown(view.as_ref(), e))?;
    let auth = app.auth_presenter(view.clone());
    let dashboard = app.dashboard_presenter(view.clone());

    // Every command runs as the signed-in user; registration creates that user.
    if let Command::Register { name } = command {
        let (Some(email), Some(password)) = (credentials.email, credentials.password) else {
            return Err(shown(
                view.as_ref(),
                ClientError::validation("--email and --password are required"),
            ));
        };
        return auth
            .handle(AuthIntent::Register {
                name,
                email,
                password,
            })
            .await;
    }
    sign_in(&auth, view.as_ref(), &credentials).await?;

    match command {
        Command::Register { .. } | Command::Login => Ok(()),
        Command::Quote { symbols } => dashboard.handle(DashboardIntent::Quotes { symbols }).await,
        Command::Search { query } => dashboard.handle(DashboardIntent::Search { query }).await,
        Command::Buy { symbol, quantity } => {
            dashboard
                .handle(DashboardIntent::Buy { symbol, quantity })
                .await?;
            dashboard.handle(DashboardIntent::Refresh).await
        }
        Command::Sell { symbol, quantity } => {
            dashboard
                .handle(DashboardIntent::Sell { symbol, quantity })
                .await?;
            dashboard.handle(DashboardIntent::Refresh).await
        }
        Command::Dashboard => dashboard.handle(DashboardIntent::Refresh).await,
        Command::Advice => dashboard.handle(DashboardIntent::Advice).await,
    }
}

#[tokio::main]
async fn main() {
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let view: Arc<dyn View> = Arc::new(TerminalView);
    if let Err(e) = run(Cli::parse(), view).await {
        debug!("trading-client failed: {}", e);
        std::process::exit(1);
    }
}

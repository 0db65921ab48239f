// src/presenter.rs
//! Presenters connect panel intents to the backend and push results into a
//! [`View`]. Panels never talk to the backend directly: they hold an intent
//! handle (`LoginIntents`, `DashboardIntents`) and call its `*_requested`
//! methods, which queue an intent for the presenter's loop.

use crate::advice::AdviceResponse;
use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::events::{AppEvent, EventBus};
use crate::models::{Portfolio, Quote, SearchResult, Session, TransactionType};
use crate::portfolio::{aggregate, PortfolioSummary};
use crate::transactions::{normalize, NormalizedTransactions};
use crate::validation::{
    validate_email, validate_name, validate_password, validate_quantity, validate_search_query,
    validate_symbol,
};
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

pub const INTENT_QUEUE: usize = 32;

/// Setters a UI surface exposes to presenters.
pub trait View: Send + Sync {
    fn show_error(&self, message: &str);
    fn show_status(&self, message: &str);
    fn show_session(&self, session: &Session);
    fn show_signed_out(&self);
    fn show_search_results(&self, results: &[SearchResult]);
    fn show_quotes(&self, quotes: &[Quote]);
    fn show_summary(&self, portfolio: &Portfolio, summary: &PortfolioSummary);
    fn show_transactions(&self, transactions: &NormalizedTransactions);
    fn show_advice(&self, advice: &AdviceResponse);
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthIntent {
    Login {
        email: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
    },
    OAuth {
        id_token: String,
    },
    Logout,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DashboardIntent {
    Search { query: String },
    Quotes { symbols: Vec<String> },
    Buy { symbol: String, quantity: f64 },
    Sell { symbol: String, quantity: f64 },
    Refresh,
    Advice,
}

/// Intent callbacks for the login panel.
#[derive(Clone)]
pub struct LoginIntents {
    sender: mpsc::Sender<AuthIntent>,
}

impl LoginIntents {
    pub fn channel() -> (Self, mpsc::Receiver<AuthIntent>) {
        let (sender, receiver) = mpsc::channel(INTENT_QUEUE);
        (Self { sender }, receiver)
    }

    pub fn login_requested(&self, email: &str, password: &str) -> bool {
        self.queue(AuthIntent::Login {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn register_requested(&self, name: &str, email: &str, password: &str) -> bool {
        self.queue(AuthIntent::Register {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn oauth_requested(&self, id_token: &str) -> bool {
        self.queue(AuthIntent::OAuth {
            id_token: id_token.to_string(),
        })
    }

    pub fn logout_requested(&self) -> bool {
        self.queue(AuthIntent::Logout)
    }

    fn queue(&self, intent: AuthIntent) -> bool {
        match self.sender.try_send(intent) {
            Ok(()) => true,
            Err(e) => {
                warn!("Login intent not queued: {}", e);
                false
            }
        }
    }
}

/// Intent callbacks for the dashboard panel.
#[derive(Clone)]
pub struct DashboardIntents {
    sender: mpsc::Sender<DashboardIntent>,
}

impl DashboardIntents {
    pub fn channel() -> (Self, mpsc::Receiver<DashboardIntent>) {
        let (sender, receiver) = mpsc::channel(INTENT_QUEUE);
        (Self { sender }, receiver)
    }

    pub fn search_requested(&self, text: &str) -> bool {
        self.queue(DashboardIntent::Search {
            query: text.to_string(),
        })
    }

    pub fn quotes_requested(&self, symbols: &[String]) -> bool {
        self.queue(DashboardIntent::Quotes {
            symbols: symbols.to_vec(),
        })
    }

    pub fn buy_requested(&self, symbol: &str, quantity: f64) -> bool {
        self.queue(DashboardIntent::Buy {
            symbol: symbol.to_string(),
            quantity,
        })
    }

    pub fn sell_requested(&self, symbol: &str, quantity: f64) -> bool {
        self.queue(DashboardIntent::Sell {
            symbol: symbol.to_string(),
            quantity,
        })
    }

    pub fn refresh_requested(&self) -> bool {
        self.queue(DashboardIntent::Refresh)
    }

    pub fn advice_requested(&self) -> bool {
        self.queue(DashboardIntent::Advice)
    }

    fn queue(&self, intent: DashboardIntent) -> bool {
        match self.sender.try_send(intent) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dashboard intent not queued: {}", e);
                false
            }
        }
    }
}

pub struct AuthPresenter {
    api: ApiClient,
    bus: EventBus,
    view: Arc<dyn View>,
}

impl AuthPresenter {
    pub fn new(api: ApiClient, bus: &EventBus, view: Arc<dyn View>) -> Self {
        Self {
            api,
            bus: bus.clone(),
            view,
        }
    }

    pub async fn run(self, mut intents: mpsc::Receiver<AuthIntent>) {
        while let Some(intent) = intents.recv().await {
            if let Err(e) = self.handle(intent).await {
                warn!("Auth intent failed: {}", e);
            }
        }
    }

    /// Handles one intent. Failures are shown on the view and returned.
    pub async fn handle(&self, intent: AuthIntent) -> Result<()> {
        let outcome = match intent {
            AuthIntent::Login { email, password } => self.login(&email, &password).await,
            AuthIntent::Register {
                name,
                email,
                password,
            } => self.register(&name, &email, &password).await,
            AuthIntent::OAuth { id_token } => self.oauth(&id_token).await,
            AuthIntent::Logout => {
                self.api.logout().await;
                self.view.show_signed_out();
                self.bus.publish(AppEvent::SessionEnded);
                Ok(())
            }
        };
        if let Err(e) = &outcome {
            self.view.show_error(&e.to_string());
        }
        outcome
    }

    async fn login(&self, email: &str, password: &str) -> Result<()> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(ClientError::validation("Password cannot be empty"));
        }
        let session = self.api.login(&email, password).await?;
        self.started(session);
        Ok(())
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        validate_password(password)?;
        let session = self.api.register(&name, &email, password).await?;
        self.started(session);
        Ok(())
    }

    async fn oauth(&self, id_token: &str) -> Result<()> {
        if id_token.trim().is_empty() {
            return Err(ClientError::validation("Identity provider returned no token"));
        }
        let session = self.api.exchange_oauth(id_token.trim()).await?;
        self.started(session);
        Ok(())
    }

    fn started(&self, session: Session) {
        self.view.show_session(&session);
        self.bus.publish(AppEvent::SessionStarted(session));
    }
}

pub struct DashboardPresenter {
    api: ApiClient,
    bus: EventBus,
    view: Arc<dyn View>,
    recent_transactions: usize,
    events: Option<broadcast::Receiver<AppEvent>>,
}

impl DashboardPresenter {
    /// Subscribes to the bus right away so events published before `run`
    /// starts are not missed.
    pub fn new(
        api: ApiClient,
        bus: &EventBus,
        view: Arc<dyn View>,
        recent_transactions: usize,
    ) -> Self {
        Self {
            api,
            bus: bus.clone(),
            view,
            recent_transactions,
            events: Some(bus.subscribe()),
        }
    }

    /// Processes intents and refreshes on `SessionStarted` and
    /// `PortfolioUpdated` events until the intent channel closes.
    pub async fn run(mut self, mut intents: mpsc::Receiver<DashboardIntent>) {
        let mut events = match self.events.take() {
            Some(events) => events,
            None => self.bus.subscribe(),
        };

        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => {
                        if let Err(e) = self.handle(intent).await {
                            warn!("Dashboard intent failed: {}", e);
                        }
                    }
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(AppEvent::SessionStarted(_)) | Ok(AppEvent::PortfolioUpdated { .. }) => {
                        if let Err(e) = self.handle(DashboardIntent::Refresh).await {
                            warn!("Dashboard refresh failed: {}", e);
                        }
                    }
                    Ok(AppEvent::SessionEnded) => self.view.show_status("Signed out"),
                    Ok(AppEvent::TradeExecuted(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Dashboard missed {} events.", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    /// Handles one intent. A trade publishes `TradeExecuted` and
    /// `PortfolioUpdated`; the refresh that follows happens in `run`.
    pub async fn handle(&self, intent: DashboardIntent) -> Result<()> {
        let outcome = match intent {
            DashboardIntent::Search { query } => self.search(&query).await,
            DashboardIntent::Quotes { symbols } => self.quotes(&symbols).await,
            DashboardIntent::Buy { symbol, quantity } => {
                self.trade(TransactionType::Buy, &symbol, quantity).await
            }
            DashboardIntent::Sell { symbol, quantity } => {
                self.trade(TransactionType::Sell, &symbol, quantity).await
            }
            DashboardIntent::Refresh => self.refresh().await,
            DashboardIntent::Advice => self.advice().await,
        };
        if let Err(e) = &outcome {
            self.view.show_error(&e.to_string());
        }
        outcome
    }

    async fn search(&self, query: &str) -> Result<()> {
        let query = validate_search_query(query)?;
        let results = self.api.search(&query).await?;
        self.view.show_search_results(&results);
        Ok(())
    }

    async fn quotes(&self, symbols: &[String]) -> Result<()> {
        let symbols = symbols
            .iter()
            .map(|s| validate_symbol(s))
            .collect::<Result<BTreeSet<String>>>()?;
        if symbols.is_empty() {
            return Err(ClientError::validation("Enter at least one symbol"));
        }
        let symbols: Vec<String> = symbols.into_iter().collect();
        let quotes = self.api.quotes(&symbols).await?;

        let mut found: Vec<Quote> = quotes.into_values().collect();
        found.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        if found.len() < symbols.len() {
            self.view.show_status(&format!(
                "{} of {} symbols had no quote",
                symbols.len() - found.len(),
                symbols.len()
            ));
        }
        self.view.show_quotes(&found);
        Ok(())
    }

    async fn trade(&self, kind: TransactionType, symbol: &str, quantity: f64) -> Result<()> {
        let symbol = validate_symbol(symbol)?;
        let quantity = validate_quantity(quantity)?;
        let receipt = match kind {
            TransactionType::Buy => self.api.buy(&symbol, quantity).await?,
            TransactionType::Sell => self.api.sell(&symbol, quantity).await?,
        };

        self.view.show_status(&format!(
            "{} {} {} at {:.2}",
            receipt.kind, receipt.quantity, receipt.symbol, receipt.price
        ));
        self.bus.publish(AppEvent::TradeExecuted(receipt));
        if let Some(session) = self.api.session().await {
            self.bus.publish(AppEvent::PortfolioUpdated {
                user_id: session.user.id,
            });
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        let portfolio = self.api.portfolio().await?;
        let symbols: Vec<String> = portfolio
            .holdings
            .iter()
            .map(|h| h.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let quotes = match self.api.quotes(&symbols).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("Quotes unavailable, valuing holdings at zero: {}", e);
                self.view.show_status("Live quotes unavailable");
                HashMap::new()
            }
        };

        let summary = aggregate(&portfolio.holdings, &quotes);
        for warning in &summary.warnings {
            warn!("{}", warning);
        }
        self.view.show_summary(&portfolio, &summary);

        let raw = self.api.transactions().await?;
        let transactions = normalize(&raw, Some(self.recent_transactions));
        for warning in &transactions.warnings {
            warn!("{}", warning);
        }
        if transactions.dropped > 0 {
            self.view.show_status(&format!(
                "{} transactions could not be displayed",
                transactions.dropped
            ));
        }
        self.view.show_transactions(&transactions);
        info!(
            "Dashboard refreshed: value {:.2}, {} transactions.",
            summary.current_value,
            transactions.rows.len()
        );
        Ok(())
    }

    async fn advice(&self) -> Result<()> {
        match self.api.advice().await {
            Ok(advice) => {
                if advice.is_fallback() {
                    info!("Advice response had no usable sections.");
                }
                self.view.show_advice(&advice);
                Ok(())
            }
            Err(e) => {
                self.view.show_advice(&AdviceResponse::default());
                Err(e)
            }
        }
    }
}

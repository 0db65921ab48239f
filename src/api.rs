// src/api.rs
use crate::advice::{parse_advice_value, AdviceResponse};
use crate::auth::run_with_timeout;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{
    Portfolio, Quote, RawTransaction, SearchResult, Session, TradeReceipt, TradeRequest,
    TransactionType,
};
use log::{debug, error, info, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Deserialize)]
#[serde(untagged)]
enum TransactionsResponse {
    List(Vec<RawTransaction>),
    Wrapped { transactions: Vec<RawTransaction> },
}

/// Thin client over the trading backend. Cloning shares the HTTP connection
/// pool and the current session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    oauth_timeout: Duration,
    session: Arc<RwLock<Option<Session>>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            oauth_timeout: config.oauth_timeout,
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    pub async fn logout(&self) {
        if let Some(session) = self.session.write().await.take() {
            info!("Logged out {}.", session.user.email);
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let session: Session = self.send(request).await?;
        info!("Logged in as {}.", session.user.email);
        self.set_session(session.clone()).await;
        Ok(session)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        let session: Session = self.send(request).await?;
        info!("Registered {}.", session.user.email);
        self.set_session(session.clone()).await;
        Ok(session)
    }

    /// Exchanges an identity-provider token for a backend session. The call
    /// runs on a worker and is abandoned once the OAuth timeout passes.
    pub async fn exchange_oauth(&self, id_token: &str) -> Result<Session> {
        let worker = self.clone();
        let body = json!({ "id_token": id_token });
        let session: Session = run_with_timeout(self.oauth_timeout, async move {
            let request = worker.client.post(worker.url("/auth/oauth")).json(&body);
            worker.send(request).await
        })
        .await?;
        info!("Signed in with identity provider as {}.", session.user.email);
        self.set_session(session.clone()).await;
        Ok(session)
    }

    pub async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let request = self
            .client
            .get(self.url("/stocks/quotes"))
            .query(&[("symbols", symbols.join(","))]);
        let mut quotes: HashMap<String, Quote> = self.send(self.authorized(request).await).await?;
        for (symbol, quote) in quotes.iter_mut() {
            if quote.symbol.is_empty() {
                quote.symbol = symbol.clone();
            }
        }
        debug!("Fetched {} of {} quotes.", quotes.len(), symbols.len());
        Ok(quotes)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let request = self
            .client
            .get(self.url("/stocks/search"))
            .query(&[("q", query)]);
        self.send(self.authorized(request).await).await
    }

    pub async fn portfolio(&self) -> Result<Portfolio> {
        let user_id = self.current_user_id().await?;
        let request = self.client.get(self.url(&format!("/portfolio/{}", user_id)));
        let portfolio: Portfolio = self.send(self.authorized(request).await).await?;
        info!(
            "Portfolio retrieved: {} lots for {}.",
            portfolio.holdings.len(),
            user_id
        );
        Ok(portfolio)
    }

    pub async fn buy(&self, symbol: &str, quantity: f64) -> Result<TradeReceipt> {
        self.trade(TransactionType::Buy, symbol, quantity).await
    }

    pub async fn sell(&self, symbol: &str, quantity: f64) -> Result<TradeReceipt> {
        self.trade(TransactionType::Sell, symbol, quantity).await
    }

    async fn trade(
        &self,
        kind: TransactionType,
        symbol: &str,
        quantity: f64,
    ) -> Result<TradeReceipt> {
        let user_id = self.current_user_id().await?;
        let action = match kind {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
        };
        let request = self
            .client
            .post(self.url(&format!("/portfolio/{}/{}", user_id, action)))
            .json(&TradeRequest {
                symbol: symbol.to_string(),
                quantity,
            });
        let receipt: TradeReceipt = self.send(self.authorized(request).await).await?;
        info!(
            "{} {} {} at {:.2}.",
            receipt.kind, receipt.quantity, receipt.symbol, receipt.price
        );
        Ok(receipt)
    }

    pub async fn transactions(&self) -> Result<Vec<RawTransaction>> {
        let user_id = self.current_user_id().await?;
        let request = self
            .client
            .get(self.url(&format!("/transactions/{}", user_id)));
        let response: TransactionsResponse = self.send(self.authorized(request).await).await?;
        Ok(match response {
            TransactionsResponse::List(list) => list,
            TransactionsResponse::Wrapped { transactions } => transactions,
        })
    }

    pub async fn advice(&self) -> Result<AdviceResponse> {
        let user_id = self.current_user_id().await?;
        let request = self.client.get(self.url(&format!("/advice/{}", user_id)));
        let body: Value = self.send(self.authorized(request).await).await?;
        Ok(parse_advice_value(&body))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The stored session, dropped once its token has expired.
    async fn active_session(&self) -> Option<Session> {
        let mut guard = self.session.write().await;
        if guard.as_ref().is_some_and(Session::is_expired) {
            if let Some(expired) = guard.take() {
                warn!("Session for {} expired; signing out.", expired.user.email);
            }
        }
        guard.clone()
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.active_session().await {
            Some(session) => request.bearer_auth(&session.token),
            None => {
                debug!("Sending request without a session.");
                request
            }
        }
    }

    async fn current_user_id(&self) -> Result<String> {
        self.active_session()
            .await
            .map(|session| session.user.id)
            .ok_or(ClientError::NotAuthenticated)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            error!("HTTP request failed: {}", e);
            ClientError::Request(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            error!("Backend rejected request: {}", err);
            return Err(err);
        }
        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse backend response: {}", e);
            ClientError::Decode(e)
        })
    }
}

fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    if status == StatusCode::UNAUTHORIZED {
        return ClientError::Unauthorized;
    }
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn error_message_prefers_detail_field() {
        let body = br#"{"detail": "Insufficient funds"}"#;
        let err = error_from_response(StatusCode::BAD_REQUEST, body);
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Insufficient funds");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn plain_text_and_empty_bodies() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(matches!(err, ClientError::Http { ref message, .. } if message == "upstream down"));
        let err = error_from_response(StatusCode::NOT_FOUND, b"");
        assert!(matches!(err, ClientError::Http { ref message, .. } if message == "Not Found"));
    }

    #[test]
    fn unauthorized_status_maps_to_unauthorized() {
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, b"{}"),
            ClientError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn user_calls_need_a_session() {
        let client = ApiClient::new(&Config::default()).unwrap();
        assert!(matches!(
            client.portfolio().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(client.quotes(&[]).await.unwrap().is_empty());
    }

    fn session_expiring_at(exp: u64) -> Session {
        let token = encode(
            &Header::default(),
            &json!({ "sub": "u1", "exp": exp }),
            &EncodingKey::from_secret(b"backend_secret"),
        )
        .unwrap();
        Session {
            token,
            user: UserProfile {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
                name: None,
            },
        }
    }

    #[tokio::test]
    async fn expired_session_is_dropped_before_sending() {
        let client = ApiClient::new(&Config::default()).unwrap();
        client.set_session(session_expiring_at(1)).await;

        assert!(matches!(
            client.portfolio().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(client.session().await.is_none());
    }

    #[tokio::test]
    async fn live_session_is_kept() {
        let client = ApiClient::new(&Config::default()).unwrap();
        client.set_session(session_expiring_at(10_000_000_000)).await;

        assert_eq!(client.current_user_id().await.unwrap(), "u1");
        assert!(client.session().await.is_some());
    }

    #[test]
    fn transactions_accept_a_bare_list() {
        let body = json!([
            {"symbol": "AAPL", "type": "buy", "quantity": 1.0, "price": 10.0, "date": "2025-01-01"}
        ]);
        match serde_json::from_value::<TransactionsResponse>(body).unwrap() {
            TransactionsResponse::List(rows) => assert_eq!(rows[0].symbol, "AAPL"),
            TransactionsResponse::Wrapped { .. } => panic!("bare list decoded as wrapped"),
        }
    }
}

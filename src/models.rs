// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One purchased lot of a ticker. Several lots may share a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    #[serde(alias = "purchase_price", alias = "buy_price")]
    pub purchase_price: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub symbol: String,
    #[serde(alias = "current_price")]
    pub current_price: f64,
    #[serde(default, alias = "change_percent")]
    pub change_percent: f64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(default, alias = "cash_balance", alias = "cash")]
    pub cash_balance: f64,
    #[serde(default, alias = "stocks")]
    pub holdings: Vec<Holding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            TransactionType::Buy => "Buy",
            TransactionType::Sell => "Sell",
        })
    }
}

/// A transaction record as the backend sends it. The date is kept as text
/// because its precision and zone suffix vary between records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub symbol: String,
    #[serde(rename = "type", alias = "transaction_type")]
    pub kind: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(alias = "timestamp")]
    pub date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: UserProfile,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: f64,
    pub price: f64,
    #[serde(default, alias = "cash_balance")]
    pub cash_balance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn holding_accepts_snake_case_price() {
        let holding: Holding =
            serde_json::from_value(json!({"symbol": "AAPL", "quantity": 3.0, "buy_price": 120.5}))
                .unwrap();
        assert_eq!(holding.purchase_price, 120.5);
    }

    #[test]
    fn quote_needs_only_current_price() {
        let quote: Quote = serde_json::from_value(json!({"currentPrice": 150.0})).unwrap();
        assert_eq!(quote.current_price, 150.0);
        assert_eq!(quote.change_percent, 0.0);
        assert!(quote.name.is_none());
    }

    #[test]
    fn transaction_type_parses_case_insensitively() {
        assert_eq!("BUY".parse::<TransactionType>(), Ok(TransactionType::Buy));
        assert_eq!(" sell ".parse::<TransactionType>(), Ok(TransactionType::Sell));
        assert!("dividend".parse::<TransactionType>().is_err());
    }

    #[test]
    fn raw_transaction_reads_type_field() {
        let raw: RawTransaction = serde_json::from_value(json!({
            "symbol": "MSFT",
            "type": "buy",
            "quantity": 2.0,
            "price": 300.0,
            "timestamp": "2025-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(raw.kind, "buy");
        assert_eq!(raw.date, "2025-03-01T10:00:00Z");
    }
}

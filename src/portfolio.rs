// src/portfolio.rs
use crate::models::{Holding, Quote};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Aggregated view of one symbol across all of its lots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub cost_basis: f64,
    pub average_cost: f64,
    pub current_price: Option<f64>,
    pub current_value: f64,
    pub gain: f64,
    pub gain_percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub current_value: f64,
    pub cost_basis: f64,
    pub change_percent: f64,
    pub per_symbol_quantity: BTreeMap<String, f64>,
    pub positions: Vec<Position>,
    /// Symbols held without a quote; they count toward cost basis only.
    pub unquoted: Vec<String>,
    /// Lots skipped for bad data.
    pub warnings: Vec<String>,
}

impl PortfolioSummary {
    pub fn gain(&self) -> f64 {
        self.current_value - self.cost_basis
    }
}

#[derive(Default)]
struct Lots {
    quantity: f64,
    cost: f64,
}

pub fn aggregate(holdings: &[Holding], quotes: &HashMap<String, Quote>) -> PortfolioSummary {
    let mut warnings = Vec::new();
    let mut by_symbol: BTreeMap<&str, Lots> = BTreeMap::new();

    for (index, lot) in holdings.iter().enumerate() {
        if !lot.quantity.is_finite() || lot.quantity < 0.0 {
            warnings.push(format!(
                "lot {} ({}) ignored: invalid quantity {}",
                index, lot.symbol, lot.quantity
            ));
            continue;
        }
        if !lot.purchase_price.is_finite() {
            warnings.push(format!(
                "lot {} ({}) ignored: invalid purchase price {}",
                index, lot.symbol, lot.purchase_price
            ));
            continue;
        }
        let entry = by_symbol.entry(lot.symbol.as_str()).or_default();
        entry.quantity += lot.quantity;
        entry.cost += lot.quantity * lot.purchase_price;
    }

    let mut summary = PortfolioSummary {
        warnings,
        ..PortfolioSummary::default()
    };

    for (symbol, lots) in by_symbol {
        let current_price = quotes.get(symbol).map(|quote| quote.current_price);
        if current_price.is_none() {
            summary.unquoted.push(symbol.to_string());
        }
        let current_value = current_price.map_or(0.0, |price| lots.quantity * price);
        let gain = current_value - lots.cost;

        summary.current_value += current_value;
        summary.cost_basis += lots.cost;
        summary
            .per_symbol_quantity
            .insert(symbol.to_string(), lots.quantity);
        summary.positions.push(Position {
            symbol: symbol.to_string(),
            quantity: lots.quantity,
            cost_basis: lots.cost,
            average_cost: if lots.quantity > 0.0 {
                lots.cost / lots.quantity
            } else {
                0.0
            },
            current_price,
            current_value,
            gain,
            gain_percent: percent_change(current_value, lots.cost),
        });
    }

    summary.change_percent = percent_change(summary.current_value, summary.cost_basis);
    summary
}

/// Percentage change of `value` over `basis`, 0 when there is no basis.
pub fn percent_change(value: f64, basis: f64) -> f64 {
    if basis == 0.0 {
        0.0
    } else {
        (value - basis) / basis * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(symbol: &str, quantity: f64, purchase_price: f64) -> Holding {
        Holding {
            symbol: symbol.to_string(),
            quantity,
            purchase_price,
        }
    }

    fn quotes(pairs: &[(&str, f64)]) -> HashMap<String, Quote> {
        pairs
            .iter()
            .map(|(symbol, price)| {
                (
                    symbol.to_string(),
                    Quote {
                        symbol: symbol.to_string(),
                        current_price: *price,
                        ..Quote::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn single_lot_gain() {
        let summary = aggregate(&[lot("AAPL", 10.0, 100.0)], &quotes(&[("AAPL", 150.0)]));
        assert_eq!(summary.current_value, 1500.0);
        assert_eq!(summary.cost_basis, 1000.0);
        assert_eq!(summary.change_percent, 50.0);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn empty_portfolio_has_zero_change() {
        let summary = aggregate(&[], &HashMap::new());
        assert_eq!(summary.current_value, 0.0);
        assert_eq!(summary.cost_basis, 0.0);
        assert_eq!(summary.change_percent, 0.0);
        assert!(summary.positions.is_empty());
    }

    #[test]
    fn lots_of_same_symbol_are_summed() {
        let summary = aggregate(
            &[lot("AAPL", 5.0, 100.0), lot("AAPL", 5.0, 200.0)],
            &quotes(&[("AAPL", 180.0)]),
        );
        assert_eq!(summary.per_symbol_quantity["AAPL"], 10.0);
        assert_eq!(summary.cost_basis, 1500.0);
        assert_eq!(summary.current_value, 1800.0);
        assert_eq!(summary.positions.len(), 1);
        assert_eq!(summary.positions[0].average_cost, 150.0);
        assert_eq!(summary.change_percent, 20.0);
    }

    #[test]
    fn missing_quote_counts_toward_basis_only() {
        let summary = aggregate(
            &[lot("AAPL", 1.0, 100.0), lot("NEWCO", 2.0, 50.0)],
            &quotes(&[("AAPL", 110.0)]),
        );
        assert_eq!(summary.current_value, 110.0);
        assert_eq!(summary.cost_basis, 200.0);
        assert_eq!(summary.unquoted, vec!["NEWCO".to_string()]);
        let newco = summary.positions.iter().find(|p| p.symbol == "NEWCO").unwrap();
        assert_eq!(newco.current_price, None);
        assert_eq!(newco.current_value, 0.0);
    }

    #[test]
    fn negative_quantity_is_reported_not_fatal() {
        let holdings = vec![lot("AAPL", -3.0, 100.0), lot("MSFT", 1.0, 300.0)];
        let summary = aggregate(&holdings, &quotes(&[("MSFT", 330.0)]));
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("AAPL"));
        assert!(!summary.per_symbol_quantity.contains_key("AAPL"));
        assert_eq!(summary.current_value, 330.0);
        assert_eq!(holdings[0].quantity, -3.0);
    }

    #[test]
    fn zero_basis_position_has_zero_gain_percent() {
        let summary = aggregate(&[lot("GIFT", 4.0, 0.0)], &quotes(&[("GIFT", 10.0)]));
        assert_eq!(summary.current_value, 40.0);
        assert_eq!(summary.change_percent, 0.0);
        assert_eq!(summary.positions[0].gain_percent, 0.0);
    }
}

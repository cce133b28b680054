use crate::engine::types::Symbol;
use anyhow::{bail, Result};

const DEFAULT_SYMBOLS: &[&str] = &["BTC_USD", "LTC_USD", "ETH_USD"];
const DEFAULT_API_BASE: &str = "https://api.binance.com";

/// Immutable feed table: the ordered symbol list shown in the menu and the
/// ticker endpoint each symbol polls. Menu selection keys are `1..=len`.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    feeds: Vec<(Symbol, String)>,
}

impl FeedConfig {
    pub fn new(feeds: Vec<(Symbol, String)>) -> Result<Self> {
        if feeds.is_empty() {
            bail!("feed config needs at least one symbol");
        }
        if feeds.len() > 9 {
            bail!(
                "menu selection supports at most 9 feeds, got {}",
                feeds.len()
            );
        }
        Ok(Self { feeds })
    }

    /// Built from `CHART_SYMBOLS` (comma-separated) and `CHART_API_BASE`,
    /// falling back to the Binance spot defaults.
    pub fn from_env() -> Result<Self> {
        let base =
            std::env::var("CHART_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let base = base.trim_end_matches('/').to_string();

        let symbols: Vec<String> = match std::env::var("CHART_SYMBOLS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let feeds = symbols
            .into_iter()
            .map(|name| {
                let endpoint = ticker_endpoint(&base, &name);
                (Symbol::new(name), endpoint)
            })
            .collect();
        Self::new(feeds)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.feeds.iter().map(|(symbol, _)| symbol)
    }

    pub fn symbol_at(&self, index: usize) -> Option<&Symbol> {
        self.feeds.get(index).map(|(symbol, _)| symbol)
    }

    pub fn endpoint_for(&self, symbol: &Symbol) -> Option<&str> {
        self.feeds
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, endpoint)| endpoint.as_str())
    }
}

// `BTC_USD` polls the `BTCUSDT` spot ticker.
fn ticker_endpoint(base: &str, name: &str) -> String {
    let compact: String = name.chars().filter(|c| *c != '_').collect();
    let api_symbol = if compact.ends_with("USD") {
        format!("{compact}T")
    } else {
        compact
    };
    format!("{base}/api/v3/ticker/price?symbol={api_symbol}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pairs_to_spot_ticker_endpoints() {
        assert_eq!(
            ticker_endpoint("https://api.binance.com", "BTC_USD"),
            "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT"
        );
        assert_eq!(
            ticker_endpoint("https://api.binance.com", "ETHUSDT"),
            "https://api.binance.com/api/v3/ticker/price?symbol=ETHUSDT"
        );
    }

    #[test]
    fn defaults_carry_three_feeds_in_menu_order() {
        let config = FeedConfig::from_env().unwrap();
        let symbols: Vec<&str> = config.symbols().map(|s| s.as_str()).collect();
        assert_eq!(symbols, ["BTC_USD", "LTC_USD", "ETH_USD"]);
        assert_eq!(
            config.endpoint_for(config.symbol_at(1).unwrap()),
            Some("https://api.binance.com/api/v3/ticker/price?symbol=LTCUSDT")
        );
    }

    #[test]
    fn rejects_empty_and_oversized_feed_lists() {
        assert!(FeedConfig::new(Vec::new()).is_err());

        let too_many: Vec<_> = (0..10)
            .map(|i| (Symbol::new(format!("S{i}_USD")), format!("http://feed/{i}")))
            .collect();
        assert!(FeedConfig::new(too_many).is_err());
    }
}

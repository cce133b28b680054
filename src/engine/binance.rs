use crate::engine::config::FeedConfig;
use crate::engine::sampler::PriceSource;
use crate::engine::types::Symbol;
use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

// One request may not hang past this; a stuck fetch would otherwise delay
// session teardown indefinitely.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Spot ticker client. The endpoint per symbol comes from the feed config;
/// the response carries the price as a decimal string.
#[derive(Debug, Clone)]
pub struct TickerClient {
    http: reqwest::Client,
    endpoints: HashMap<Symbol, Url>,
}

impl TickerClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("build http client")?;

        let mut endpoints = HashMap::new();
        for symbol in config.symbols() {
            let raw = config
                .endpoint_for(symbol)
                .with_context(|| format!("no endpoint configured for {symbol}"))?;
            let url = Url::parse(raw)
                .with_context(|| format!("invalid ticker url for {symbol}: {raw}"))?;
            endpoints.insert(symbol.clone(), url);
        }
        Ok(Self { http, endpoints })
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

impl PriceSource for TickerClient {
    async fn fetch(&self, symbol: &Symbol) -> Result<f64> {
        let url = self
            .endpoints
            .get(symbol)
            .with_context(|| format!("unknown symbol {symbol}"))?;

        let raw: TickerResponse = self
            .http
            .get(url.clone())
            .send()
            .await
            .context("ticker request failed")?
            .error_for_status()
            .context("ticker non-200")?
            .json()
            .await
            .context("ticker json decode failed")?;

        raw.price
            .parse::<f64>()
            .with_context(|| format!("unparseable price for {symbol}: {}", raw.price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ticker_response() {
        let raw = r#"{"symbol":"BTCUSDT","price":"97201.45000000"}"#;
        let resp: TickerResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.price.parse::<f64>().unwrap(), 97201.45);
    }

    #[tokio::test]
    async fn rejects_symbols_outside_the_config() {
        let config = FeedConfig::new(vec![(
            Symbol::new("BTC_USD"),
            "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT".to_string(),
        )])
        .unwrap();
        let client = TickerClient::new(&config).unwrap();

        let err = client.fetch(&Symbol::new("DOGE_USD")).await.unwrap_err();
        assert!(err.to_string().contains("unknown symbol"));
    }
}

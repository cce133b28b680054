use crate::engine::buffer::SampleBuffer;
use crate::engine::types::Symbol;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Target delay between a completed fetch and the next one.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Where samples come from. `fetch` resolves one symbol to its latest price.
pub trait PriceSource: Send + Sync {
    fn fetch(&self, symbol: &Symbol) -> impl Future<Output = Result<f64>> + Send;
}

/// Poll `source` for `symbol` until `cancel` reads true.
///
/// The delay follows the completed fetch, so a slow response stretches the
/// cadence instead of overlapping requests. Fetch errors are logged and the
/// loop moves straight to the next attempt. A fetch already in flight when
/// cancellation arrives finishes (and its sample lands) before the task exits.
pub async fn run<S: PriceSource>(
    source: S,
    symbol: Symbol,
    buffer: SampleBuffer,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        if *cancel.borrow() {
            break;
        }
        match source.fetch(&symbol).await {
            Ok(price) => buffer.append(price).await,
            Err(err) => {
                warn!(symbol = %symbol, err = %err, "price fetch failed");
                continue;
            }
        }
        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod testsupport {
    use super::PriceSource;
    use crate::engine::types::Symbol;
    use anyhow::{anyhow, Result};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Plays back a fixed script of fetch outcomes, then repeats the last
    /// successful price forever. Tracks how many fetches run concurrently so
    /// tests can assert the single-writer invariant.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedSource {
        script: Arc<Mutex<VecDeque<Result<f64, &'static str>>>>,
        last_price: Arc<Mutex<Option<f64>>>,
        in_flight: Arc<AtomicUsize>,
        pub(crate) max_in_flight: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        pub(crate) fn new(
            script: impl IntoIterator<Item = Result<f64, &'static str>>,
        ) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into_iter().collect())),
                ..Default::default()
            }
        }

        pub(crate) fn prices(prices: impl IntoIterator<Item = f64>) -> Self {
            Self::new(prices.into_iter().map(Ok))
        }
    }

    impl PriceSource for ScriptedSource {
        async fn fetch(&self, _symbol: &Symbol) -> Result<f64> {
            let live = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(live, Ordering::SeqCst);
            // Hold the gauge across an await so overlapping fetches would show.
            tokio::time::sleep(Duration::from_millis(1)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(price)) => {
                    *self.last_price.lock().unwrap() = Some(price);
                    Ok(price)
                }
                Some(Err(msg)) => Err(anyhow!(msg)),
                None => self
                    .last_price
                    .lock()
                    .unwrap()
                    .ok_or_else(|| anyhow!("script exhausted")),
            }
        }
    }
}

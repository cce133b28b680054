use crate::engine::buffer::SampleBuffer;
use crate::engine::term::Screen;
use crate::engine::types::Symbol;
use chrono::{DateTime, Local};
use rasciigraph::{plot, Config};
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Target delay between chart redraws.
pub const RENDER_INTERVAL: Duration = Duration::from_secs(1);

const CHART_WIDTH: u32 = 50;
const CHART_HEIGHT: u32 = 10;

/// Redraw `buffer` onto `screen` until `cancel` reads true.
///
/// An empty buffer produces no output for that tick; the previous frame, if
/// any, stays on screen.
pub async fn run<W: Screen>(
    mut screen: W,
    symbol: Symbol,
    buffer: SampleBuffer,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        if *cancel.borrow() {
            break;
        }
        let series = buffer.snapshot().await;
        if let Some(frame) = build_frame(&symbol, &series, Local::now()) {
            if let Err(err) = screen.present(&frame) {
                warn!(symbol = %symbol, err = %err, "chart present failed");
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

/// One full frame: chart, latest price, wall-clock time and date. `None` for
/// an empty series; there is nothing worth drawing yet.
pub fn build_frame(symbol: &Symbol, series: &[f64], now: DateTime<Local>) -> Option<String> {
    let last = *series.last()?;
    let chart = plot(
        series.to_vec(),
        Config::default()
            .with_width(CHART_WIDTH)
            .with_height(CHART_HEIGHT)
            .with_caption(symbol.to_string()),
    );
    Some(format!(
        "\n{chart}\n{symbol} price: {last:.2}\n\nTime: {}\nDate: {}\n",
        now.format("%H:%M:%S"),
        now.format("%Y-%m-%d"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::term::testsupport::CaptureScreen;
    use chrono::TimeZone;
    use tokio::time::timeout;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap()
    }

    #[test]
    fn empty_series_builds_no_frame() {
        assert!(build_frame(&Symbol::new("BTC_USD"), &[], fixed_now()).is_none());
    }

    #[test]
    fn frame_shows_caption_latest_price_and_clock() {
        let frame =
            build_frame(&Symbol::new("BTC_USD"), &[100.0, 101.0, 102.0], fixed_now()).unwrap();
        assert!(frame.contains("BTC_USD"));
        assert!(frame.contains("102.00"));
        assert!(frame.contains("14:30:05"));
        assert!(frame.contains("2024-03-09"));
    }

    #[tokio::test]
    async fn empty_buffer_presents_nothing() {
        let screen = CaptureScreen::default();
        let buffer = SampleBuffer::new(100);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(run(
            screen.clone(),
            Symbol::new("BTC_USD"),
            buffer.clone(),
            Duration::from_millis(5),
            cancel_rx,
        ));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(screen.frame_count(), 0);

        buffer.append(1.5).await;
        timeout(Duration::from_secs(5), async {
            while screen.frame_count() == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("renderer never drew after first sample");
        assert!(screen.frames()[0].contains("1.50"));

        cancel_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), task)
            .await
            .expect("renderer did not stop promptly")
            .unwrap();
    }
}

// ── Input debouncing ──
//
// Coalesces bursts of input (keystrokes in a search box) into settled
// values. A value settles once input has been quiet for `window`, or
// once `max_wait` has passed since the first unsettled input, whichever
// comes first.

use std::pin::pin;
use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::time::{Instant, sleep_until};

/// Quiet period before a value settles.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);
/// Longest a burst may postpone a settled value.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    pub window: Duration,
    pub max_wait: Duration,
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

enum Step<T> {
    Input(Option<T>),
    Elapsed,
}

impl Debounce {
    pub fn new(window: Duration, max_wait: Duration) -> Self {
        Self { window, max_wait }
    }

    /// Yield the last value of each burst of `input`.
    ///
    /// A pending value is flushed when `input` ends.
    pub fn apply<S>(self, input: S) -> impl Stream<Item = S::Item>
    where
        S: Stream,
    {
        async_stream::stream! {
            let mut input = pin!(input);
            let mut pending = None;
            let mut first_at = Instant::now();
            let mut last_at = first_at;

            loop {
                if pending.is_none() {
                    match input.next().await {
                        Some(value) => {
                            pending = Some(value);
                            first_at = Instant::now();
                            last_at = first_at;
                        }
                        None => break,
                    }
                    continue;
                }

                let deadline = (last_at + self.window).min(first_at + self.max_wait);
                let step = tokio::select! {
                    item = input.next() => Step::Input(item),
                    () = sleep_until(deadline) => Step::Elapsed,
                };

                match step {
                    Step::Input(Some(value)) => {
                        pending = Some(value);
                        last_at = Instant::now();
                    }
                    Step::Input(None) => {
                        if let Some(value) = pending.take() {
                            yield value;
                        }
                        break;
                    }
                    Step::Elapsed => {
                        if let Some(value) = pending.take() {
                            yield value;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::{Instant, sleep};
    use tokio_stream::wrappers::ReceiverStream;

    use super::*;

    /// Send `values` `gap` apart, then hold the channel open for `linger`.
    fn typed(values: Vec<&'static str>, gap: Duration, linger: Duration) -> ReceiverStream<&'static str> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for value in values {
                if tx.send(value).await.is_err() {
                    return;
                }
                sleep(gap).await;
            }
            sleep(linger).await;
        });
        ReceiverStream::new(rx)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_settles_on_last_value_after_window() {
        let start = Instant::now();
        let input = typed(
            vec!["b", "ba", "ban", "bank"],
            Duration::from_millis(100),
            Duration::from_secs(2),
        );

        let settled: Vec<(&str, Duration)> = Debounce::default()
            .apply(input)
            .map(|v| (v, start.elapsed()))
            .collect()
            .await;

        assert_eq!(settled.len(), 1);
        let (value, at) = settled[0];
        assert_eq!(value, "bank");
        // Last keystroke at 300 ms, quiet window of 500 ms.
        assert!(at >= Duration::from_millis(800) && at < Duration::from_millis(900), "{at:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn steady_typing_is_forced_out_by_max_wait() {
        let values: Vec<&'static str> = vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
        let input = typed(values, Duration::from_millis(300), Duration::from_secs(2));

        let settled: Vec<&str> = Debounce::default().apply(input).collect().await;

        // Inputs every 300 ms never leave a 500 ms gap; the 1 s ceiling
        // forces a value out at 1000 ms and 2200 ms, the tail settles last.
        assert_eq!(settled, vec!["3", "7", "9"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_value_flushes_when_input_ends() {
        let input = typed(vec!["a", "ab"], Duration::from_millis(10), Duration::ZERO);
        let settled: Vec<&str> = Debounce::default().apply(input).collect().await;
        assert_eq!(settled, vec!["ab"]);
    }
}

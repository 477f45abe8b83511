//! Trailing-edge debouncing of query input.
//!
//! [`Debouncer`] is the clock-injected state machine; [`spawn_debouncer`]
//! drives one on a tokio task and forwards settled values over a channel.
//!
//! ## Example
//!
//! ```ignore
//! let (input, mut settled) = spawn_debouncer::<String>(Duration::from_millis(400));
//! input.send("c".into());
//! input.send("ca".into());
//! input.send("can".into());
//! assert_eq!(settled.recv().await.as_deref(), Some("can"));
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Collapses a burst of values into the last one after a quiet interval.
///
/// Every `push` replaces the pending value and restarts the interval. A
/// settled value equal to the previously emitted one is swallowed.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
    last_emitted: Option<T>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_emitted: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Record a new input observed at `now`, discarding any pending one.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// When the pending value settles, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet interval has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(at) if at <= now => self.flush(),
            _ => None,
        }
    }

    /// Take the pending value immediately, ignoring the interval.
    pub fn flush(&mut self) -> Option<T> {
        let (value, _) = self.pending.take()?;
        if self.last_emitted.as_ref() == Some(&value) {
            return None;
        }
        self.last_emitted = Some(value.clone());
        Some(value)
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Record `value` as emitted by some other path, so that the next
    /// settled value is compared against it.
    pub fn mark_emitted(&mut self, value: T) {
        self.last_emitted = Some(value);
    }
}

#[derive(Debug)]
enum Input<T> {
    Value(T),
    Emitted(T),
}

/// Sending half of a spawned debouncer. Dropping it stops the task and
/// discards any value still pending.
#[derive(Debug, Clone)]
pub struct DebounceInput<T> {
    tx: mpsc::UnboundedSender<Input<T>>,
}

impl<T> DebounceInput<T> {
    /// Feed a new raw value. Returns `false` once the task has stopped.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(Input::Value(value)).is_ok()
    }

    /// Tell the task that `value` took effect without going through it.
    pub fn mark_emitted(&self, value: T) -> bool {
        self.tx.send(Input::Emitted(value)).is_ok()
    }
}

/// Spawn a debouncing task on the current tokio runtime.
pub fn spawn_debouncer<T>(quiet: Duration) -> (DebounceInput<T>, mpsc::UnboundedReceiver<T>)
where
    T: Clone + PartialEq + Send + 'static,
{
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<Input<T>>();
    let (output_tx, output_rx) = mpsc::unbounded_channel::<T>();

    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(quiet);
        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                received = input_rx.recv() => match received {
                    Some(Input::Value(value)) => debouncer.push(value, Instant::now()),
                    Some(Input::Emitted(value)) => debouncer.mark_emitted(value),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(value) = debouncer.poll(Instant::now()) {
                        if output_tx.send(value).is_err() {
                            break;
                        }
                    }
                }
            }
        }
        tracing::trace!("debouncer input closed");
    });

    (DebounceInput { tx: input_tx }, output_rx)
}

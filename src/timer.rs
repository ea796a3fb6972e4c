//! Per-question stopwatch with a once-a-second tick for the live display.
//!
//! Elapsed time is measured from the start instant (tokio clock), so it is exact
//! whether or not ticks have been processed yet. The ticking task only tells the
//! event loop to redraw. Every timer carries a generation so ticks from a replaced
//! timer can be told apart and dropped.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::session::Event;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct QuestionTimer {
  generation: u64,
  started: Instant,
  /// Set once stopped; elapsed stays frozen at this value.
  frozen: Option<u64>,
  ticker: Option<JoinHandle<()>>,
}

impl QuestionTimer {
  /// Start counting from zero and emit `Event::Tick` every second.
  pub fn start(generation: u64, events: UnboundedSender<Event>) -> Self {
    let started = Instant::now();
    let ticker = tokio::spawn(async move {
      let mut every = interval_at(started + TICK, TICK);
      loop {
        every.tick().await;
        if events.send(Event::Tick { generation }).is_err() {
          break;
        }
      }
    });
    Self { generation, started, frozen: None, ticker: Some(ticker) }
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Whole seconds since `start`, or the value at `stop`.
  pub fn elapsed(&self) -> u64 {
    self.frozen.unwrap_or_else(|| self.started.elapsed().as_secs())
  }

  pub fn is_running(&self) -> bool {
    self.ticker.is_some()
  }

  /// Cancel the ticking task and freeze the counter. Idempotent.
  pub fn stop(&mut self) {
    if let Some(handle) = self.ticker.take() {
      self.frozen = Some(self.started.elapsed().as_secs());
      handle.abort();
    }
  }
}

impl Drop for QuestionTimer {
  fn drop(&mut self) {
    self.stop();
  }
}

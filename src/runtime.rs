use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Events consumed by the session loop
#[derive(Clone, Debug)]
pub enum TapEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<TapEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                // Some platforms also report releases; a tap is one press
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => TapEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => TapEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed event source for headless runs and tests
pub struct TestEventSource {
    rx: Receiver<TapEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TapEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// One step of the loop: the event plus wall time since the previous step
#[derive(Debug)]
pub struct Step {
    pub event: TapEvent,
    pub elapsed: Duration,
}

/// Advances the session one event at a time, waiting at most `tick` for input
pub struct Runner<E: EventSource> {
    event_source: E,
    tick: Duration,
    last: Cell<Instant>,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, tick: Duration) -> Self {
        Self {
            event_source,
            tick,
            last: Cell::new(Instant::now()),
        }
    }

    /// Blocks up to one tick and returns the next event, or Tick on timeout.
    /// Countdowns are driven by `elapsed`, not by counting ticks, so a burst of
    /// key events does not slow the clock down.
    pub fn step(&self) -> Step {
        let event = match self.event_source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => TapEvent::Tick,
        };
        let now = Instant::now();
        let elapsed = now.duration_since(self.last.replace(now));
        Step { event, elapsed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));

        let step = runner.step();
        assert!(matches!(step.event, TapEvent::Tick));
        assert!(step.elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(TapEvent::Key(KeyEvent::new(KeyCode::Char('3'), KeyModifiers::NONE)))
            .unwrap();
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(50));

        match runner.step().event {
            TapEvent::Key(key) => assert_eq!(key.code, KeyCode::Char('3')),
            other => panic!("expected key event, got {other:?}"),
        }
    }

    #[test]
    fn disconnected_source_keeps_ticking() {
        let (tx, rx) = mpsc::channel::<TapEvent>();
        drop(tx);
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(1));
        assert!(matches!(runner.step().event, TapEvent::Tick));
        assert!(matches!(runner.step().event, TapEvent::Tick));
    }
}

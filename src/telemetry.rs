//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "warn,quizgate=debug,quiz=debug,reqwest=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Two targets are used: `quizgate` for startup, gate, store and service
//! plumbing, `quiz` for the question walk itself.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,quizgate=info,quiz=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // stdout carries the quiz screen; redirect stderr (`2>quiz.log`) to keep it clean at debug levels.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::DefaultGuard;

    /// Log lines written while the guard is alive, shared with the test.
    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Thread-local subscriber at TRACE; pair with a current-thread `#[tokio::test]`.
    pub fn capture() -> (Captured, DefaultGuard) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_target(true)
            .with_writer(move || writer.clone())
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }

    #[test]
    fn capture_sees_targeted_events() {
        let (logs, _guard) = capture();
        tracing::warn!(target: "quizgate", answer_len = 4, "Something happened");
        let text = logs.text();
        assert!(text.contains("WARN"));
        assert!(text.contains("quizgate: Something happened"));
        assert!(text.contains("answer_len=4"));
    }
}

//! The request loop.
//!
//! [`RequestLoop`] owns the [`Greeter`] (and with it the only connection) and
//! the attempt counter. Each attempt sends one `SayHello`, bounded by the
//! per-attempt timeout, and produces exactly one log event:
//!
//! - `INFO Request <n> - Greeting: <message>` on success
//! - `WARN Request <n> failed: <error>` on failure
//!
//! Failures never stop the loop. Attempts are separated by a fixed pacing
//! delay regardless of their outcome; a bounded run skips the delay after its
//! final attempt and logs a completion line instead.

use crate::client::{
    config::ClientConfig,
    greeter::Greeter,
    telemetry::{increment_attempt_failures, increment_attempts, record_attempt_latency},
};
use core::time::Duration;
use greeter_core::{Error, Result};
use tokio::time::Instant;
use tracing::Instrument;

/// How many attempts a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Keep going until the process is stopped.
    Unbounded,
    /// Stop after this many attempts. Never zero.
    Bounded(u64),
}

impl LoopPolicy {
    fn is_exhausted(self, attempts: u64) -> bool {
        match self {
            LoopPolicy::Unbounded => false,
            LoopPolicy::Bounded(max) => attempts >= max,
        }
    }
}

/// The outcome of one numbered attempt.
#[derive(Debug)]
pub struct Attempt {
    /// 1-based, strictly increasing by one per attempt.
    pub number: u64,
    pub outcome: Result<String>,
}

/// Running totals of a request loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
}

pub struct RequestLoop<G> {
    greeter: G,
    name: String,
    timeout: Duration,
    pacing: Duration,
    policy: LoopPolicy,
    next_attempt: u64,
    summary: RunSummary,
}

impl<G: Greeter> RequestLoop<G> {
    pub fn new(
        greeter: G,
        name: impl Into<String>,
        timeout: Duration,
        pacing: Duration,
        policy: LoopPolicy,
    ) -> Self {
        Self {
            greeter,
            name: name.into(),
            timeout,
            pacing,
            policy,
            next_attempt: 1,
            summary: RunSummary::default(),
        }
    }

    pub fn from_config(greeter: G, config: &ClientConfig) -> Self {
        Self::new(
            greeter,
            config.name.clone(),
            config.request_timeout,
            config.pacing,
            config.policy,
        )
    }

    #[cfg(test)]
    pub fn greeter(&self) -> &G {
        &self.greeter
    }

    /// Totals over every attempt completed so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Performs a single attempt and logs its outcome.
    ///
    /// The counter advances even when the attempt fails, so numbering has no
    /// gaps. The call is abandoned once `timeout` elapses, whatever the
    /// greeter does with the deadline it is handed.
    pub async fn attempt(&mut self) -> Attempt {
        let number = self.next_attempt;
        self.next_attempt += 1;

        let span = tracing::info_span!("attempt", number);
        let started = Instant::now();

        let outcome = tokio::time::timeout(
            self.timeout,
            self.greeter.say_hello(&self.name, self.timeout),
        )
        .instrument(span.clone())
        .await
        .unwrap_or(Err(Error::Timeout(self.timeout)));

        record_attempt_latency(started.elapsed().as_secs_f64() * 1000.0);

        let attempt = Attempt { number, outcome };
        span.in_scope(|| self.record(&attempt));
        attempt
    }

    /// Counts the attempt and emits its one log line.
    fn record(&mut self, attempt: &Attempt) {
        let number = attempt.number;
        increment_attempts();
        self.summary.attempts += 1;

        match &attempt.outcome {
            Ok(message) => {
                self.summary.successes += 1;
                tracing::info!("Request {number} - Greeting: {message}");
            }
            Err(err) => {
                self.summary.failures += 1;
                increment_attempt_failures();
                tracing::warn!("Request {number} failed: {err}");
            }
        }
    }

    /// Runs attempts according to the loop policy.
    ///
    /// Returns only for [`LoopPolicy::Bounded`], after the last attempt.
    pub async fn run(&mut self) -> RunSummary {
        loop {
            self.attempt().await;

            let summary = self.summary();
            if self.policy.is_exhausted(summary.attempts) {
                let RunSummary {
                    attempts,
                    successes,
                    failures,
                } = summary;
                tracing::info!(
                    "Completed {attempts} requests ({successes} succeeded, {failures} failed)"
                );
                return summary;
            }

            tokio::time::sleep(self.pacing).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tonic::Status;
    use tracing_subscriber::fmt::MakeWriter;

    enum Reply {
        Message(&'static str),
        Fail(Status),
        Hang,
    }

    /// In-memory remote following a per-call script (calls are 1-based).
    struct ScriptedGreeter {
        calls: u64,
        names: Vec<String>,
        script: Box<dyn FnMut(u64) -> Reply + Send>,
    }

    impl ScriptedGreeter {
        fn new(script: impl FnMut(u64) -> Reply + Send + 'static) -> Self {
            Self {
                calls: 0,
                names: Vec::new(),
                script: Box::new(script),
            }
        }
    }

    impl Greeter for ScriptedGreeter {
        async fn say_hello(&mut self, name: &str, _timeout: Duration) -> Result<String> {
            self.calls += 1;
            self.names.push(name.to_owned());
            match (self.script)(self.calls) {
                Reply::Message(message) => Ok(message.to_owned()),
                Reply::Fail(status) => Err(Error::Call(status)),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    /// Captures formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .compact()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    fn attempt_lines(lines: &[String]) -> Vec<&String> {
        lines.iter().filter(|l| l.contains("Request ")).collect()
    }

    const ONE_SEC: Duration = Duration::from_secs(1);
    const TEN_SECS: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn bounded_run_logs_every_attempt_then_completes() {
        let (logs, _guard) = capture_logs();
        let greeter = ScriptedGreeter::new(|_| Reply::Message("Hello World"));
        let mut request_loop =
            RequestLoop::new(greeter, "World", ONE_SEC, ONE_SEC, LoopPolicy::Bounded(10));

        let started = Instant::now();
        let summary = request_loop.run().await;
        let elapsed = started.elapsed();

        assert_eq!(
            summary,
            RunSummary {
                attempts: 10,
                successes: 10,
                failures: 0
            }
        );
        // Nine pacing delays: none after the final attempt.
        assert!(elapsed >= Duration::from_secs(9) && elapsed < TEN_SECS, "{elapsed:?}");

        let lines = logs.lines();
        assert_eq!(lines.len(), 11, "{lines:#?}");
        for (i, line) in lines[..10].iter().enumerate() {
            let expected = format!("Request {} - Greeting: Hello World", i + 1);
            assert!(line.contains(&expected), "{line}");
            assert!(line.contains("INFO"), "{line}");
        }
        assert!(lines[10].contains("Completed 10 requests (10 succeeded, 0 failed)"));

        let greeter = request_loop.greeter();
        assert_eq!(greeter.calls, 10);
        assert!(greeter.names.iter().all(|n| n == "World"));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_numbers_increase_by_one_across_outcomes() {
        let greeter = ScriptedGreeter::new(|call| match call % 3 {
            0 => Reply::Hang,
            1 => Reply::Message("hi"),
            _ => Reply::Fail(Status::unavailable("down")),
        });
        let mut request_loop =
            RequestLoop::new(greeter, "World", ONE_SEC, TEN_SECS, LoopPolicy::Unbounded);

        let mut numbers = Vec::new();
        for _ in 0..6 {
            numbers.push(request_loop.attempt().await.number);
        }
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            request_loop.summary(),
            RunSummary {
                attempts: 6,
                successes: 2,
                failures: 4
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_remote_times_out_every_attempt() {
        let (logs, _guard) = capture_logs();
        let greeter = ScriptedGreeter::new(|_| Reply::Hang);
        let mut request_loop =
            RequestLoop::new(greeter, "World", ONE_SEC, TEN_SECS, LoopPolicy::Bounded(3));

        let started = Instant::now();
        let summary = request_loop.run().await;

        assert_eq!(summary.attempts, 3);
        assert_eq!(summary.failures, 3);
        // Three one-second timeouts and two pacing delays.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(23) && elapsed < Duration::from_secs(24), "{elapsed:?}");

        let lines = logs.lines();
        let attempts = attempt_lines(&lines);
        assert_eq!(attempts.len(), 3);
        for (i, line) in attempts.iter().enumerate() {
            let expected = format!("Request {} failed: Request timed out after 1s", i + 1);
            assert!(line.contains(&expected), "{line}");
            assert!(line.contains("WARN"), "{line}");
        }
        assert!(lines.last().unwrap().contains("Completed 3 requests (0 succeeded, 3 failed)"));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_reports_timeout_error() {
        let greeter = ScriptedGreeter::new(|_| Reply::Hang);
        let mut request_loop =
            RequestLoop::new(greeter, "World", ONE_SEC, TEN_SECS, LoopPolicy::Unbounded);

        let attempt = request_loop.attempt().await;
        assert_eq!(attempt.number, 1);
        let err = attempt.outcome.unwrap_err();
        assert!(err.is_timeout());
        assert!(!err.is_fatal());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_still_paced() {
        let greeter = ScriptedGreeter::new(|_| Reply::Fail(Status::internal("boom")));
        let pacing = Duration::from_secs(2);
        let mut request_loop =
            RequestLoop::new(greeter, "World", ONE_SEC, pacing, LoopPolicy::Bounded(3));

        let started = Instant::now();
        let summary = request_loop.run().await;

        assert_eq!(summary.failures, 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_run_alternates_and_never_returns() {
        let (logs, _guard) = capture_logs();
        let greeter = ScriptedGreeter::new(|call| {
            if call % 2 == 1 {
                Reply::Message("Hello World")
            } else {
                Reply::Hang
            }
        });
        let mut request_loop =
            RequestLoop::new(greeter, "World", ONE_SEC, TEN_SECS, LoopPolicy::Unbounded);

        // Attempts start at t = 0, 10, 21, 31, 42; the sixth would start at 52.
        let cut = tokio::time::timeout(Duration::from_secs(45), request_loop.run()).await;
        assert!(cut.is_err(), "unbounded run returned on its own");

        assert_eq!(
            request_loop.summary(),
            RunSummary {
                attempts: 5,
                successes: 3,
                failures: 2
            }
        );

        let lines = logs.lines();
        let attempts = attempt_lines(&lines);
        assert_eq!(attempts.len(), 5, "{lines:#?}");
        for (i, line) in attempts.iter().enumerate() {
            let number = i + 1;
            if number % 2 == 1 {
                assert!(line.contains(&format!("Request {number} - Greeting: Hello World")), "{line}");
            } else {
                assert!(line.contains(&format!("Request {number} failed: Request timed out")), "{line}");
            }
        }
        assert!(!lines.iter().any(|l| l.contains("Completed")));
    }

    #[test]
    fn policy_exhaustion() {
        assert!(!LoopPolicy::Unbounded.is_exhausted(u64::MAX));
        assert!(!LoopPolicy::Bounded(10).is_exhausted(9));
        assert!(LoopPolicy::Bounded(10).is_exhausted(10));
    }
}

//! Output pump — background task draining one process's output into
//! sanitized, batched `output` messages.
//!
//! One pump per live process, started when CONNECT succeeds. Lines are
//! accumulated and flushed as a single newline-joined message no later
//! than one tick after the first of them arrived, so bursts collapse into
//! few messages while every line still reaches the client promptly. FIFO
//! order is preserved throughout.

use crate::remote::ProcessOutput;
use crate::sanitize::sanitize_line;
use sshrelay_protocol::Outbound;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Batching cadence — how long accumulated lines may wait before flushing.
const FLUSH_TICK: Duration = Duration::from_millis(100);
/// Flush eagerly once a burst reaches this many lines.
const MAX_BATCH_LINES: usize = 256;

/// Spawn the pump task. The task ends on end-of-stream, on a read error
/// (after emitting one `error` message), or when aborted during teardown.
pub fn spawn(output: Box<dyn ProcessOutput>, sink: mpsc::Sender<Outbound>) -> JoinHandle<()> {
    tokio::spawn(run(output, sink))
}

async fn run(mut output: Box<dyn ProcessOutput>, sink: mpsc::Sender<Outbound>) {
    let mut batch: Vec<String> = Vec::new();
    // Anchored when the first line enters an empty batch and cleared on every
    // flush, so a steady stream of lines cannot keep postponing the flush.
    let mut deadline: Option<Instant> = None;

    loop {
        let flush_at = deadline.unwrap_or_else(Instant::now);
        tokio::select! {
            result = output.next_line() => match result {
                Ok(Some(raw)) => {
                    let clean = sanitize_line(&raw);
                    if !clean.is_empty() {
                        if batch.is_empty() {
                            deadline = Some(Instant::now() + FLUSH_TICK);
                        }
                        batch.push(clean);
                    }
                    if batch.len() >= MAX_BATCH_LINES {
                        flush(&mut batch, &sink).await;
                        deadline = None;
                    }
                }
                Ok(None) => {
                    flush(&mut batch, &sink).await;
                    debug!("process reached end of output");
                    break;
                }
                Err(e) => {
                    flush(&mut batch, &sink).await;
                    // One error message, then exit. The session's own loop
                    // decides whether this ends the channel.
                    let _ = sink.send(Outbound::error(e.to_string())).await;
                    break;
                }
            },
            _ = tokio::time::sleep_until(flush_at), if deadline.is_some() => {
                flush(&mut batch, &sink).await;
                deadline = None;
            }
        }
    }
}

async fn flush(batch: &mut Vec<String>, sink: &mpsc::Sender<Outbound>) {
    if batch.is_empty() {
        return;
    }
    let joined = batch.join("\n");
    batch.clear();
    // A closed sink means the channel is tearing down — nothing to report.
    let _ = sink.send(Outbound::Output(joined)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ShellError};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Scripted output: yields each event in order, then hangs forever.
    struct Scripted {
        events: VecDeque<Result<Option<String>>>,
    }

    impl Scripted {
        fn new(events: Vec<Result<Option<String>>>) -> Box<Self> {
            Box::new(Self {
                events: events.into(),
            })
        }
    }

    #[async_trait]
    impl ProcessOutput for Scripted {
        async fn next_line(&mut self) -> Result<Option<String>> {
            match self.events.pop_front() {
                Some(event) => event,
                None => std::future::pending().await,
            }
        }
    }

    async fn collect(mut rx: mpsc::Receiver<Outbound>) -> Vec<Outbound> {
        let mut messages = Vec::new();
        while let Some(msg) = rx.recv().await {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn lines_arrive_in_order_and_concatenate() {
        let (tx, rx) = mpsc::channel(8);
        let output = Scripted::new(vec![
            Ok(Some("L1".to_string())),
            Ok(Some("L2".to_string())),
            Ok(Some("L3".to_string())),
            Ok(None),
        ]);

        spawn(output, tx).await.unwrap();

        let messages = collect(rx).await;
        let combined: Vec<&str> = messages
            .iter()
            .map(|m| match m {
                Outbound::Output(text) => text.as_str(),
                other => panic!("unexpected message: {other:?}"),
            })
            .collect();
        assert_eq!(combined.join("\n"), "L1\nL2\nL3");
    }

    #[tokio::test]
    async fn empty_sanitized_lines_are_dropped() {
        let (tx, rx) = mpsc::channel(8);
        let output = Scripted::new(vec![
            Ok(Some("   ".to_string())),
            Ok(Some("\u{1b}[2J".to_string())),
            Ok(Some("hi".to_string())),
            Ok(None),
        ]);

        spawn(output, tx).await.unwrap();

        assert_eq!(collect(rx).await, vec![Outbound::Output("hi".to_string())]);
    }

    #[tokio::test]
    async fn read_error_emits_one_error_then_exits() {
        let (tx, rx) = mpsc::channel(8);
        let output = Scripted::new(vec![
            Ok(Some("partial".to_string())),
            Err(ShellError::Read("connection reset".to_string())),
        ]);

        spawn(output, tx).await.unwrap();

        let messages = collect(rx).await;
        assert_eq!(
            messages,
            vec![
                Outbound::Output("partial".to_string()),
                Outbound::Error("read error: connection reset".to_string()),
            ]
        );
    }

    /// Emits a numbered line at a fixed interval, forever.
    struct Steady {
        interval: Duration,
        n: usize,
    }

    #[async_trait]
    impl ProcessOutput for Steady {
        async fn next_line(&mut self) -> Result<Option<String>> {
            tokio::time::sleep(self.interval).await;
            self.n += 1;
            Ok(Some(format!("line {}", self.n)))
        }
    }

    #[tokio::test]
    async fn steady_stream_still_flushes_every_tick() {
        let (tx, mut rx) = mpsc::channel(8);
        // Lines every 50ms — faster than the flush cadence. The first flush
        // must land one tick after the first line, not after 256 lines.
        let pump = spawn(
            Box::new(Steady {
                interval: Duration::from_millis(50),
                n: 0,
            }),
            tx,
        );

        let first = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("first flush overdue under steady output");
        match first {
            Some(Outbound::Output(text)) => assert!(text.starts_with("line 1")),
            other => panic!("unexpected message: {other:?}"),
        }

        pump.abort();
        let _ = pump.await;
    }

    #[tokio::test]
    async fn abort_stops_pump_without_panic() {
        let (tx, mut rx) = mpsc::channel(8);
        // No EOF scripted — the pump would run forever.
        let output = Scripted::new(vec![Ok(Some("alive".to_string()))]);

        let pump = spawn(output, tx);
        assert_eq!(rx.recv().await, Some(Outbound::Output("alive".to_string())));

        pump.abort();
        let join = pump.await;
        assert!(join.unwrap_err().is_cancelled());
    }
}

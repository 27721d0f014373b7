//! Ordered asynchronous playback queue.
//!
//! Text units are submitted in reading order and synthesized concurrently;
//! synthesis may complete out of order and may fail per unit. A single
//! consumer task walks the queue strictly in submission order, awaiting
//! only the *head* entry's completion signal before playing it, so a
//! fast-finishing later unit can never jump ahead of a slow earlier one.
//!
//! Each entry's completion signal is a oneshot channel written exactly once
//! by its synthesis task; the FIFO of pending signals is an unbounded mpsc
//! channel, which keeps submission non-blocking.

use crate::error::{AssistantError, Result};
use crate::speech::{AudioClip, AudioPlayer, SpeechSynthesizer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// One queued unit: its sequence number and the signal its synthesis task
/// resolves. Destroyed after playback (or skip-on-failure) completes.
struct QueueEntry {
    seq: u64,
    result_rx: oneshot::Receiver<Result<AudioClip>>,
}

/// Playback queue that preserves submission order across unordered,
/// concurrent synthesis.
///
/// [`submit`](Self::submit) is non-blocking; [`wait_idle`](Self::wait_idle)
/// blocks until every submitted unit has either played or been skipped.
/// Dropping the queue stops the consumer task.
pub struct PlaybackQueue {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    entry_tx: mpsc::UnboundedSender<QueueEntry>,
    /// Next sequence number to assign. Sequence numbers start at 1 and are
    /// contiguous; they are the sole ordering key for playback.
    next_seq: AtomicU64,
    /// Highest sequence number played or skipped so far.
    resolved_rx: watch::Receiver<u64>,
    interrupt: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl PlaybackQueue {
    /// Create a queue and spawn its consumer task.
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, player: Arc<dyn AudioPlayer>) -> Self {
        let (entry_tx, entry_rx) = mpsc::unbounded_channel();
        let (resolved_tx, resolved_rx) = watch::channel(0u64);
        let interrupt = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        tokio::spawn(run_consumer(
            entry_rx,
            player,
            resolved_tx,
            Arc::clone(&interrupt),
            cancel.clone(),
        ));

        Self {
            synthesizer,
            entry_tx,
            next_seq: AtomicU64::new(1),
            resolved_rx,
            interrupt,
            cancel,
        }
    }

    /// Submit one unit of text for synthesis and ordered playback.
    ///
    /// Returns the unit's sequence number. Synthesis starts immediately on
    /// its own task; playback happens when every earlier unit has resolved.
    pub fn submit(&self, text: &str) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let (result_tx, result_rx) = oneshot::channel();

        let synthesizer = Arc::clone(&self.synthesizer);
        let text = text.to_owned();
        tokio::spawn(async move {
            let result = synthesizer.synthesize(&text).await;
            // The consumer treats a dropped sender as a skip, so a lost
            // receiver here is harmless.
            let _ = result_tx.send(result);
        });

        if self.entry_tx.send(QueueEntry { seq, result_rx }).is_err() {
            error!(seq, "playback consumer is gone, unit will never play");
        }
        debug!(seq, "speak unit submitted");
        seq
    }

    /// Block until every unit submitted so far has played or been skipped.
    ///
    /// # Errors
    ///
    /// Returns a channel error if the consumer task has stopped.
    pub async fn wait_idle(&self) -> Result<()> {
        let target = self.next_seq.load(Ordering::SeqCst) - 1;
        if target == 0 {
            return Ok(());
        }
        let mut resolved = self.resolved_rx.clone();
        resolved
            .wait_for(|&done| done >= target)
            .await
            .map_err(|_| AssistantError::Channel("playback consumer stopped".to_owned()))?;
        Ok(())
    }

    /// Abandon the current turn: pending and in-flight units are resolved
    /// without playing. `wait_idle` still completes normally.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Re-arm playback after an interrupt, before the next turn submits.
    pub fn clear_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Consumer loop: strictly in submission order, await the head entry's
/// completion signal, play the clip if synthesis succeeded, then advance.
async fn run_consumer(
    mut entry_rx: mpsc::UnboundedReceiver<QueueEntry>,
    player: Arc<dyn AudioPlayer>,
    resolved_tx: watch::Sender<u64>,
    interrupt: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    loop {
        let entry = tokio::select! {
            () = cancel.cancelled() => break,
            entry = entry_rx.recv() => match entry {
                Some(entry) => entry,
                None => break,
            },
        };

        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = entry.result_rx => result,
        };

        match result {
            Ok(Ok(clip)) => {
                if interrupt.load(Ordering::Relaxed) {
                    debug!(seq = entry.seq, "interrupted, discarding synthesized audio");
                } else if let Err(e) = player.play(clip).await {
                    // Degraded but non-fatal: the unit is lost, the turn
                    // continues.
                    error!(seq = entry.seq, "playback failed: {e}");
                }
            }
            Ok(Err(e)) => {
                warn!(seq = entry.seq, "synthesis failed, skipping unit: {e}");
            }
            Err(_) => {
                warn!(seq = entry.seq, "synthesis task vanished, skipping unit");
            }
        }

        if resolved_tx.send(entry.seq).is_err() {
            // Queue handle dropped; nobody is waiting anymore.
            break;
        }
    }
    debug!("playback consumer stopped");
}

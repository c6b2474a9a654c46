use crossbeam::channel::{self, Receiver, TryRecvError};
use std::thread;
use tumbler_assets::{ModelBundle, ModelSource};

/// Terminal result of a model fetch.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(ModelBundle),
    Failed(String),
}

/// A fetch running on a worker thread.
///
/// The frame thread polls with [`PendingLoad::poll`]; it never blocks.
#[derive(Debug)]
pub struct PendingLoad {
    rx: Receiver<LoadOutcome>,
    origin: String,
}

impl PendingLoad {
    /// Start fetching `source` on a background thread.
    pub fn spawn(source: impl ModelSource) -> Self {
        let origin = source.describe();
        let (tx, rx) = channel::bounded::<LoadOutcome>(1);

        let thread_origin = origin.clone();
        let spawned = thread::Builder::new()
            .name("model-load".into())
            .spawn(move || {
                tracing::debug!(origin = %thread_origin, "fetching model");
                let outcome = match source.fetch() {
                    Ok(bundle) => LoadOutcome::Loaded(bundle),
                    Err(e) => LoadOutcome::Failed(e.to_string()),
                };
                // Receiver gone means the rig was dropped; nothing to report to.
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            // Dropping the closure drops the sender, so the next poll reports
            // a disconnect and the rig falls back.
            tracing::error!("failed to spawn model loader thread: {e}");
        }

        Self { rx, origin }
    }

    /// A load that has already resolved, delivered on the next poll.
    pub fn ready(outcome: LoadOutcome, origin: impl Into<String>) -> Self {
        let (tx, rx) = channel::bounded(1);
        let _ = tx.send(outcome);
        Self {
            rx,
            origin: origin.into(),
        }
    }

    /// Non-blocking check for the outcome.
    ///
    /// A worker that exits without reporting counts as a failure.
    pub fn poll(&self) -> Option<LoadOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(LoadOutcome::Failed(format!(
                "loader for {} exited without a result",
                self.origin
            ))),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

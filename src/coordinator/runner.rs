//! Recognition coordinator: drives block edits → debounce → concurrent
//! recognition → aggregate text.
//!
//! [`RecognitionCoordinator::start`] spawns a single task that owns the
//! [`BlockTable`] and serializes every state change.  Callers talk to it
//! through the returned [`CoordinatorHandle`].
//!
//! # Flow
//!
//! ```text
//! add_block / delete_block / load_blocks / recognize_now
//!   └─▶ cancel debounce, start pass                        [immediate]
//!
//! update_block
//!   └─▶ mark dirty, (re)start debounce window
//!         └─▶ window elapses → start pass                  [debounced]
//!
//! start pass
//!   └─▶ cancel previous pass token
//!   └─▶ tokio::spawn per selected block
//!         └─▶ recognize_with_retry (gateway → session → spawn_blocking)
//!               └─▶ Completion back to the coordinator task
//!                     ├─ pass superseded   → discard
//!                     ├─ block deleted     → discard
//!                     ├─ block re-edited   → discard (stale)
//!                     └─ otherwise         → commit, store, publish
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::RecognitionConfig;
use crate::document::{BlockId, BlockKind, ContentBlock, DocumentSink};
use crate::engine::{BlockRecognizer, RecognitionError};
use crate::ink::Stroke;

use super::debounce::Debouncer;
use super::retry::{recognize_with_retry, RetryPolicy};
use super::state::{Applied, BlockTable, DocumentSnapshot, StatePublisher, WorkItem};

// ---------------------------------------------------------------------------
// CoordinatorSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSettings {
    /// Idle window between the last edit and the recognition pass.
    pub debounce: Duration,
    pub retry: RetryPolicy,
    /// Shown for a block that failed and has no earlier result.
    pub error_placeholder: String,
}

impl From<&RecognitionConfig> for CoordinatorSettings {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            debounce: config.debounce(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
            },
            error_placeholder: config.error_placeholder.clone(),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&RecognitionConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Command {
    AddBlock { id: BlockId, kind: BlockKind },
    UpdateBlock { id: BlockId, strokes: Vec<Stroke> },
    DeleteBlock { id: BlockId },
    LoadBlocks(Vec<ContentBlock>),
    RecognizeNow,
    Shutdown,
}

/// Result of one block's recognition, tagged with the pass that produced it.
#[derive(Debug)]
struct Completion {
    pass: u64,
    id: BlockId,
    revision: u64,
    outcome: Result<String, RecognitionError>,
}

struct Pass {
    id: u64,
    token: CancellationToken,
    pending: usize,
}

// ---------------------------------------------------------------------------
// RecognitionCoordinator
// ---------------------------------------------------------------------------

/// Owns the block list and schedules recognition for it.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ink_to_text::coordinator::{CoordinatorSettings, RecognitionCoordinator};
/// use ink_to_text::document::{BlockKind, NullSink};
/// use ink_to_text::engine::BlockRecognizer;
/// use ink_to_text::ink::Stroke;
///
/// # async fn example(recognizer: Arc<dyn BlockRecognizer>) {
/// let handle = RecognitionCoordinator::new(
///     recognizer,
///     Arc::new(NullSink),
///     CoordinatorSettings::default(),
/// )
/// .start();
///
/// let mut updates = handle.subscribe();
/// let block = handle.add_block(BlockKind::Text);
/// handle.update_block(block, vec![Stroke::from_xy(&[(0.0, 0.0), (10.0, 4.0)], 1.0)]);
///
/// while updates.changed().await.is_ok() {
///     println!("{}", updates.borrow().aggregate_text);
/// }
/// # }
/// ```
pub struct RecognitionCoordinator {
    recognizer: Arc<dyn BlockRecognizer>,
    sink: Arc<dyn DocumentSink>,
    settings: CoordinatorSettings,
}

impl RecognitionCoordinator {
    pub fn new(
        recognizer: Arc<dyn BlockRecognizer>,
        sink: Arc<dyn DocumentSink>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            recognizer,
            sink,
            settings,
        }
    }

    /// Spawn the coordinator task.  Must be called inside a tokio runtime.
    pub fn start(self) -> CoordinatorHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let publisher = Arc::new(StatePublisher::new(DocumentSnapshot::default()));
        let worker = Worker::new(self, Arc::clone(&publisher));
        let task = tokio::spawn(worker.run(commands_rx));

        CoordinatorHandle {
            commands: commands_tx,
            publisher,
            task,
        }
    }
}

// ---------------------------------------------------------------------------
// CoordinatorHandle
// ---------------------------------------------------------------------------

/// Inbound edits and outbound snapshots for a running coordinator.
///
/// Dropping the handle stops the coordinator; [`shutdown`](Self::shutdown)
/// additionally waits for it.
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    publisher: Arc<StatePublisher<DocumentSnapshot>>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Append a new empty block and return its id.
    pub fn add_block(&self, kind: BlockKind) -> BlockId {
        let id = Uuid::new_v4();
        self.send(Command::AddBlock { id, kind });
        id
    }

    /// Replace a block's strokes.  Recognition follows after the debounce
    /// window.
    pub fn update_block(&self, id: BlockId, strokes: Vec<Stroke>) {
        self.send(Command::UpdateBlock { id, strokes });
    }

    pub fn delete_block(&self, id: BlockId) {
        self.send(Command::DeleteBlock { id });
    }

    /// Replace the document, then recognize whatever needs it.
    pub fn load_blocks(&self, blocks: Vec<ContentBlock>) {
        self.send(Command::LoadBlocks(blocks));
    }

    /// Start a pass now, superseding any pending debounce.
    pub fn recognize_now(&self) {
        self.send(Command::RecognizeNow);
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.publisher.subscribe()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.publisher.current()
    }

    /// Cancel in-flight work and wait for the coordinator task to exit.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            log::error!("coordinator: task ended abnormally: {e}");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::warn!("coordinator: not running, command dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct Worker {
    recognizer: Arc<dyn BlockRecognizer>,
    sink: Arc<dyn DocumentSink>,
    retry: RetryPolicy,
    table: BlockTable,
    publisher: Arc<StatePublisher<DocumentSnapshot>>,
    debouncer: Debouncer,
    pass: Option<Pass>,
    last_pass_id: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Worker {
    fn new(coordinator: RecognitionCoordinator, publisher: Arc<StatePublisher<DocumentSnapshot>>) -> Self {
        let RecognitionCoordinator {
            recognizer,
            sink,
            settings,
        } = coordinator;
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            recognizer,
            sink,
            retry: settings.retry,
            table: BlockTable::new(settings.error_placeholder),
            publisher,
            debouncer: Debouncer::new(settings.debounce),
            pass: None,
            last_pass_id: 0,
            completions_tx,
            completions_rx,
        }
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        log::info!(
            "coordinator: started (debounce {:?}, max_retries {})",
            self.debouncer.delay(),
            self.retry.max_retries
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(done) = self.completions_rx.recv() => self.handle_completion(done),
                () = self.debouncer.expired() => {
                    log::debug!("coordinator: edits settled, starting pass");
                    self.start_pass();
                    self.publish();
                }
            }
        }

        self.debouncer.cancel();
        self.cancel_pass();
        self.publish();
        log::info!("coordinator: shut down");
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddBlock { id, kind } => {
                if self.table.add(id, kind) {
                    log::debug!("coordinator: block {id} added ({kind:?})");
                    self.store();
                    self.trigger_now();
                }
            }
            Command::UpdateBlock { id, strokes } => {
                if self.table.update_strokes(id, strokes) {
                    self.store();
                    self.debouncer.schedule();
                } else {
                    log::warn!("coordinator: update for unknown block {id}");
                }
            }
            Command::DeleteBlock { id } => {
                if self.table.remove(id) {
                    log::debug!("coordinator: block {id} deleted");
                    self.store();
                    self.trigger_now();
                } else {
                    log::warn!("coordinator: delete for unknown block {id}");
                }
            }
            Command::LoadBlocks(blocks) => {
                log::info!("coordinator: document loaded ({} blocks)", blocks.len());
                self.table.load(blocks);
                self.trigger_now();
            }
            Command::RecognizeNow => self.trigger_now(),
            Command::Shutdown => {}
        }
        self.publish();
    }

    fn handle_completion(&mut self, done: Completion) {
        let Some(pass) = self.pass.as_mut().filter(|p| p.id == done.pass) else {
            log::debug!("coordinator: discarding result from superseded pass {}", done.pass);
            return;
        };
        pass.pending = pass.pending.saturating_sub(1);
        let finished = pass.pending == 0;
        let pass_id = pass.id;
        if finished {
            self.pass = None;
        }

        match self.table.apply(done.id, done.revision, done.outcome) {
            Applied::Committed => self.store(),
            Applied::Deleted => log::debug!("coordinator: block {} gone, result discarded", done.id),
            Applied::Stale => log::debug!("coordinator: block {} edited in flight, result discarded", done.id),
        }
        if finished {
            log::debug!("coordinator: pass {pass_id} complete");
        }
        self.publish();
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    fn trigger_now(&mut self) {
        self.debouncer.cancel();
        self.start_pass();
    }

    fn start_pass(&mut self) {
        self.cancel_pass();

        let work = self.table.select_for_pass();
        if work.is_empty() {
            return;
        }

        self.last_pass_id += 1;
        let pass_id = self.last_pass_id;
        let token = CancellationToken::new();
        log::debug!("coordinator: pass {pass_id} recognizing {} block(s)", work.len());

        let pending = work.len();
        for item in work {
            self.spawn_recognition(pass_id, token.clone(), item);
        }
        self.pass = Some(Pass {
            id: pass_id,
            token,
            pending,
        });
    }

    fn spawn_recognition(&self, pass: u64, token: CancellationToken, item: WorkItem) {
        let recognizer = Arc::clone(&self.recognizer);
        let completions = self.completions_tx.clone();
        let retry = self.retry;

        tokio::spawn(async move {
            let mode = item.kind.mode();
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return,
                outcome = recognize_with_retry(recognizer.as_ref(), mode, Arc::clone(&item.strokes), retry) => outcome,
            };
            let _ = completions.send(Completion {
                pass,
                id: item.id,
                revision: item.revision,
                outcome,
            });
        });
    }

    fn cancel_pass(&mut self) {
        if let Some(pass) = self.pass.take() {
            pass.token.cancel();
            log::debug!("coordinator: pass {} cancelled with {} in flight", pass.id, pass.pending);
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    fn store(&self) {
        self.sink.store(&self.table.blocks());
    }

    fn publish(&self) {
        self.publisher.publish(self.table.snapshot(self.pass.is_some()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

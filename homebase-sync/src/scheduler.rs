//! Background task that runs sync cycles on a timer and on request.

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Commands accepted by the scheduler task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run a cycle now.
    SyncNow,
    /// Stop the task.
    Shutdown,
}

/// Starts the background sync task.
pub struct SyncScheduler;

impl SyncScheduler {
    /// Spawns the scheduler. The first cycle runs immediately, then one
    /// every `interval`.
    pub fn start(engine: Arc<SyncEngine>, interval: Duration) -> SchedulerHandle {
        let (tx, rx) = mpsc::channel(8);
        let interval = interval.max(Duration::from_millis(1));
        let task = tokio::spawn(Self::run(engine, interval, rx));
        info!("Sync scheduler started, interval {:?}", interval);
        SchedulerHandle { commands: tx, task }
    }

    /// Spawns the scheduler using the engine's configured poll interval.
    pub fn start_with_settings(engine: Arc<SyncEngine>) -> SchedulerHandle {
        let interval = engine.settings().poll_interval();
        Self::start(engine, interval)
    }

    async fn run(
        engine: Arc<SyncEngine>,
        interval: Duration,
        mut commands: mpsc::Receiver<SchedulerCommand>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Scheduled sync tick");
                    engine.synchronize().await;
                }
                command = commands.recv() => match command {
                    Some(SchedulerCommand::SyncNow) => {
                        debug!("Sync requested");
                        engine.synchronize().await;
                    }
                    Some(SchedulerCommand::Shutdown) | None => break,
                }
            }
        }
        info!("Sync scheduler stopped");
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    commands: mpsc::Sender<SchedulerCommand>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests an immediate cycle. A request already queued absorbs this one.
    pub fn sync_now(&self) -> SyncResult<()> {
        match self.commands.try_send(SchedulerCommand::SyncNow) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(SyncError::ChannelClosed),
        }
    }

    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task after any running cycle completes.
    pub async fn shutdown(self) -> SyncResult<()> {
        // The task may already be gone; joining below covers both cases.
        let _ = self.commands.send(SchedulerCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}

/// Single-threaded cooperative scheduler for render tasks.
///
/// The scheduler owns the document. Every tick resumes each in-flight task
/// once, in spawn order, so independent turns interleave word by word while
/// each stays strictly ordered within its own tree. Nothing is cancelled: a
/// task leaves the scheduler only when it has rendered everything.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::document::Document;
use crate::core::render::{RenderTask, TaskPoll};

/// Handle to a spawned render task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

#[derive(Debug)]
pub struct Scheduler {
    document: Document,
    tasks: Vec<(TaskId, RenderTask)>,
    next_id: u64,
    tick_interval: Duration,
    ticks: u64,
}

impl Scheduler {
    pub fn new(document: Document, tick_interval: Duration) -> Self {
        Self {
            document,
            tasks: Vec::new(),
            next_id: 0,
            tick_interval,
            ticks: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for synchronous, non-animated mutations between ticks.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Queue a task. It makes its first step on the next tick.
    pub fn spawn(&mut self, task: RenderTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        tracing::debug!(task = id.0, "spawned render task");
        self.tasks.push((id, task));
        id
    }

    /// Resume every in-flight task once. Returns how many are still running.
    pub fn tick(&mut self) -> usize {
        self.ticks += 1;
        let document = &mut self.document;
        self.tasks.retain_mut(|(id, task)| match task.resume(document) {
            TaskPoll::Pending => true,
            TaskPoll::Ready => {
                tracing::debug!(task = id.0, words = task.words_shown(), "render task finished");
                false
            }
        });
        self.tasks.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_running(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|(task_id, _)| *task_id == id)
    }

    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Ticks performed since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick until idle without waiting between ticks.
    pub fn drain(&mut self) {
        while !self.is_idle() {
            self.tick();
        }
    }

    /// Tick on the configured interval until every task has finished.
    /// The first tick fires immediately.
    #[cfg(feature = "async-driver")]
    pub async fn run_until_idle(&mut self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        while !self.is_idle() {
            interval.tick().await;
            self.tick();
        }
    }
}

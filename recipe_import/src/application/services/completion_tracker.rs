// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Completion Tracker
//!
//! Per-note fan-in accounting: when the notes pipeline fans a note out into
//! N image, M ingredient, and K instruction jobs, this tracker counts the
//! completions back down and fires a terminal event exactly once per
//! category - and once for the note as a whole - no matter how the
//! downstream jobs interleave, retry, or duplicate their marks.
//!
//! ## Idempotency
//!
//! `mark_complete` deduplicates on `(note, category, job)`: a job that
//! defensively reports completion twice (the image pipeline does, by
//! design) decrements its counter once. Duplicate and late marks are
//! logged at debug and otherwise ignored.
//!
//! ## Failure Isolation
//!
//! `mark_complete` never raises. Broadcast failures and follow-up enqueue
//! failures are logged and swallowed: a pipeline whose primary work has
//! succeeded must not fail because progress accounting hiccupped.
//!
//! ## Locking
//!
//! State is striped per note: the process-wide map is locked only to look
//! up or insert a note's entry, and every read-modify-write on the
//! counters happens under that note's own mutex. Terminal side effects
//! (broadcast, follow-up enqueue) run after the locks are released.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use recipe_import_domain::jobs::CategorizationJobData;
use recipe_import_domain::services::{JobQueue, StatusBroadcaster};
use recipe_import_domain::{
    EventContext, ImportId, ImportStatus, JobId, NoteId, PushOptions, StatusEvent,
};

/// Downstream fan-out categories tracked per note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionCategory {
    Image,
    Ingredient,
    Instruction,
}

impl CompletionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionCategory::Image => "image",
            CompletionCategory::Ingredient => "ingredient",
            CompletionCategory::Instruction => "instruction",
        }
    }

    fn event_context(&self) -> EventContext {
        match self {
            CompletionCategory::Image => EventContext::ImageProcessing,
            CompletionCategory::Ingredient => EventContext::IngredientProcessing,
            CompletionCategory::Instruction => EventContext::InstructionProcessing,
        }
    }
}

impl fmt::Display for CompletionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct NoteProgress {
    import_id: ImportId,
    outstanding: HashMap<CompletionCategory, usize>,
    seen: HashSet<(CompletionCategory, JobId)>,
    category_emitted: HashSet<CompletionCategory>,
    note_emitted: bool,
}

impl NoteProgress {
    fn all_done(&self) -> bool {
        self.outstanding.values().all(|&count| count == 0)
    }
}

/// Terminal side effects computed under the note lock, performed after it
/// is released.
enum TerminalEffect {
    CategoryDone(CompletionCategory),
    NoteDone,
}

/// Process-wide completion accounting, shared by all workers.
pub struct CompletionTracker {
    notes: Mutex<HashMap<NoteId, Arc<Mutex<NoteProgress>>>>,
    broadcaster: RwLock<Option<Arc<dyn StatusBroadcaster>>>,
    followup_queue: RwLock<Option<Arc<dyn JobQueue<CategorizationJobData>>>>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(HashMap::new()),
            broadcaster: RwLock::new(None),
            followup_queue: RwLock::new(None),
        }
    }

    /// Late-binds the broadcaster used for terminal events.
    pub fn bind_broadcaster(&self, broadcaster: Arc<dyn StatusBroadcaster>) {
        *self.broadcaster.write() = Some(broadcaster);
    }

    /// Late-binds the queue that receives the categorization follow-up
    /// enqueued when a note's ingredients complete.
    pub fn bind_followup_queue(&self, queue: Arc<dyn JobQueue<CategorizationJobData>>) {
        *self.followup_queue.write() = Some(queue);
    }

    /// Sets the expected completion count for a category of a note.
    ///
    /// Called by the fan-out action before the downstream jobs are pushed,
    /// so no completion can arrive ahead of its registration.
    pub fn register(
        &self,
        note_id: &NoteId,
        import_id: &ImportId,
        category: CompletionCategory,
        expected: usize,
    ) {
        let entry = self.entry(note_id, import_id);
        let mut progress = entry.lock();
        progress.outstanding.insert(category, expected);
        if expected == 0 {
            // Nothing to wait for; the category is born complete but its
            // terminal event still fires exactly once.
            progress.category_emitted.insert(category);
        }
        debug!(
            note_id = %note_id,
            category = %category,
            expected,
            "completion counter registered"
        );
    }

    /// Records one downstream job completion; never raises.
    ///
    /// Idempotent per `(note, category, job)`. Fires the category terminal
    /// event when its counter reaches zero and the overall note-complete
    /// event when every registered category is drained, each at most once.
    pub async fn mark_complete(&self, note_id: &NoteId, category: CompletionCategory, job_id: JobId) {
        let entry = {
            let notes = self.notes.lock();
            match notes.get(note_id) {
                Some(entry) => Arc::clone(entry),
                None => {
                    debug!(
                        note_id = %note_id,
                        category = %category,
                        job_id = %job_id,
                        "completion mark for unknown or already-finished note ignored"
                    );
                    return;
                }
            }
        };

        let (import_id, effects) = {
            let mut progress = entry.lock();

            if !progress.seen.insert((category, job_id)) {
                debug!(
                    note_id = %note_id,
                    category = %category,
                    job_id = %job_id,
                    "duplicate completion mark ignored"
                );
                return;
            }

            let mut effects = Vec::new();
            match progress.outstanding.get_mut(&category) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    if *count == 0 && progress.category_emitted.insert(category) {
                        effects.push(TerminalEffect::CategoryDone(category));
                    }
                }
                Some(_) => {
                    warn!(
                        note_id = %note_id,
                        category = %category,
                        job_id = %job_id,
                        "completion mark exceeds registered count; ignored"
                    );
                }
                None => {
                    warn!(
                        note_id = %note_id,
                        category = %category,
                        "completion mark for unregistered category ignored"
                    );
                }
            }

            if progress.all_done() && !progress.note_emitted {
                progress.note_emitted = true;
                effects.push(TerminalEffect::NoteDone);
            }

            (progress.import_id.clone(), effects)
        };

        let note_finished = effects
            .iter()
            .any(|e| matches!(e, TerminalEffect::NoteDone));

        for effect in effects {
            match effect {
                TerminalEffect::CategoryDone(category) => {
                    self.emit_category_done(note_id, &import_id, category).await;
                    if category == CompletionCategory::Ingredient {
                        self.enqueue_categorization(note_id, &import_id).await;
                    }
                }
                TerminalEffect::NoteDone => {
                    self.emit_note_done(note_id, &import_id).await;
                }
            }
        }

        if note_finished {
            // Counter lifecycle ends with the note-complete event.
            self.notes.lock().remove(note_id);
        }
    }

    /// Whether every registered category for the note has drained.
    ///
    /// A note whose counters were destroyed by its terminal event - or
    /// that was never registered - reports complete.
    pub fn is_complete(&self, note_id: &NoteId) -> bool {
        let notes = self.notes.lock();
        match notes.get(note_id) {
            Some(entry) => entry.lock().all_done(),
            None => true,
        }
    }

    /// Notes currently being tracked.
    pub fn tracked_notes(&self) -> usize {
        self.notes.lock().len()
    }

    fn entry(&self, note_id: &NoteId, import_id: &ImportId) -> Arc<Mutex<NoteProgress>> {
        let mut notes = self.notes.lock();
        Arc::clone(notes.entry(note_id.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(NoteProgress {
                import_id: import_id.clone(),
                outstanding: HashMap::new(),
                seen: HashSet::new(),
                category_emitted: HashSet::new(),
                note_emitted: false,
            }))
        }))
    }

    async fn emit_category_done(
        &self,
        note_id: &NoteId,
        import_id: &ImportId,
        category: CompletionCategory,
    ) {
        info!(note_id = %note_id, category = %category, "fan-out category completed");
        let Some(broadcaster) = self.broadcaster.read().clone() else {
            return;
        };
        let event = StatusEvent::new(
            import_id.clone(),
            Some(note_id.clone()),
            ImportStatus::Completed,
            category.event_context(),
            format!("all {category} jobs completed"),
        )
        .with_indent(1);
        if let Err(e) = broadcaster.emit(event).await {
            warn!(note_id = %note_id, category = %category, error = %e, "failed to broadcast category completion");
        }
    }

    async fn emit_note_done(&self, note_id: &NoteId, import_id: &ImportId) {
        info!(note_id = %note_id, "note fan-out fully completed");
        let Some(broadcaster) = self.broadcaster.read().clone() else {
            return;
        };
        let event = StatusEvent::new(
            import_id.clone(),
            Some(note_id.clone()),
            ImportStatus::Completed,
            EventContext::Import,
            "note processing completed",
        );
        if let Err(e) = broadcaster.emit(event).await {
            warn!(note_id = %note_id, error = %e, "failed to broadcast note completion");
        }
    }

    async fn enqueue_categorization(&self, note_id: &NoteId, import_id: &ImportId) {
        let Some(queue) = self.followup_queue.read().clone() else {
            debug!(note_id = %note_id, "no follow-up queue bound; skipping categorization enqueue");
            return;
        };
        let payload = CategorizationJobData {
            note_id: note_id.clone(),
            import_id: import_id.clone(),
        };
        match queue.push(payload, PushOptions::default()).await {
            Ok(job_id) => {
                info!(note_id = %note_id, job_id = %job_id, "categorization follow-up enqueued")
            }
            Err(e) => {
                warn!(note_id = %note_id, error = %e, "failed to enqueue categorization follow-up")
            }
        }
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::RecordingBroadcaster;

    fn ids() -> (NoteId, ImportId) {
        (NoteId::new("n1").unwrap(), ImportId::new("i1").unwrap())
    }

    #[tokio::test]
    async fn test_duplicate_marks_do_not_double_decrement() {
        let (note, import) = ids();
        let tracker = CompletionTracker::new();
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        tracker.bind_broadcaster(broadcaster.clone());

        tracker.register(&note, &import, CompletionCategory::Image, 3);

        let job_a = JobId::generate();
        let job_b = JobId::generate();
        let job_c = JobId::generate();

        tracker.mark_complete(&note, CompletionCategory::Image, job_a).await;
        tracker.mark_complete(&note, CompletionCategory::Image, job_a).await;
        assert!(!tracker.is_complete(&note));

        tracker.mark_complete(&note, CompletionCategory::Image, job_b).await;
        tracker.mark_complete(&note, CompletionCategory::Image, job_c).await;
        assert!(tracker.is_complete(&note));

        let events = broadcaster.events();
        let image_done = events
            .iter()
            .filter(|e| {
                e.context == EventContext::ImageProcessing && e.status == ImportStatus::Completed
            })
            .count();
        assert_eq!(image_done, 1);
    }

    #[tokio::test]
    async fn test_note_complete_fires_once_after_all_categories() {
        let (note, import) = ids();
        let tracker = CompletionTracker::new();
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        tracker.bind_broadcaster(broadcaster.clone());

        tracker.register(&note, &import, CompletionCategory::Image, 1);
        tracker.register(&note, &import, CompletionCategory::Ingredient, 2);
        tracker.register(&note, &import, CompletionCategory::Instruction, 0);

        tracker.mark_complete(&note, CompletionCategory::Image, JobId::generate()).await;
        assert!(!tracker.is_complete(&note));
        tracker.mark_complete(&note, CompletionCategory::Ingredient, JobId::generate()).await;
        tracker.mark_complete(&note, CompletionCategory::Ingredient, JobId::generate()).await;
        assert!(tracker.is_complete(&note));

        let note_done = broadcaster
            .events()
            .iter()
            .filter(|e| e.context == EventContext::Import && e.status == ImportStatus::Completed)
            .count();
        assert_eq!(note_done, 1);
        // Counter destroyed after the terminal event.
        assert_eq!(tracker.tracked_notes(), 0);
    }

    #[tokio::test]
    async fn test_late_marks_after_destruction_are_ignored() {
        let (note, import) = ids();
        let tracker = CompletionTracker::new();
        tracker.register(&note, &import, CompletionCategory::Image, 1);
        tracker.mark_complete(&note, CompletionCategory::Image, JobId::generate()).await;
        assert_eq!(tracker.tracked_notes(), 0);
        // Never raises, silently ignored.
        tracker.mark_complete(&note, CompletionCategory::Image, JobId::generate()).await;
        assert!(tracker.is_complete(&note));
    }

    #[tokio::test]
    async fn test_unregistered_category_mark_is_swallowed() {
        let (note, import) = ids();
        let tracker = CompletionTracker::new();
        tracker.register(&note, &import, CompletionCategory::Image, 1);
        tracker
            .mark_complete(&note, CompletionCategory::Instruction, JobId::generate())
            .await;
        assert!(!tracker.is_complete(&note));
    }

    #[tokio::test]
    async fn test_works_without_broadcaster_bound() {
        let (note, import) = ids();
        let tracker = CompletionTracker::new();
        tracker.register(&note, &import, CompletionCategory::Image, 1);
        tracker.mark_complete(&note, CompletionCategory::Image, JobId::generate()).await;
        assert!(tracker.is_complete(&note));
    }
}

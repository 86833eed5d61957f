//! Presentation session: the last loaded snapshot, the form editors and the notice line.

use crate::models::{RunId, Snapshot};
use crate::storage::{Store, StoreError, load_snapshot};
use tracing::{error, warn};

/// Form mode for one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editor<K> {
    Idle,
    Creating,
    Editing(K),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorIntent<K> {
    Open,
    Toggle,
    Edit(K),
    Cancel,
    Saved,
}

/// What a form submission should do given the editor it was submitted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<K> {
    Create,
    Update(K),
}

pub type RunEditor = Editor<RunId>;
/// Keyed by plan date.
pub type PlanEditor = Editor<String>;

impl<K> Default for Editor<K> {
    fn default() -> Self {
        Editor::Idle
    }
}

impl<K: Clone> Editor<K> {
    pub fn apply(self, intent: EditorIntent<K>) -> Self {
        match intent {
            EditorIntent::Open => Editor::Creating,
            EditorIntent::Toggle => match self {
                Editor::Idle => Editor::Creating,
                Editor::Creating | Editor::Editing(_) => Editor::Idle,
            },
            EditorIntent::Edit(key) => Editor::Editing(key),
            EditorIntent::Cancel | EditorIntent::Saved => Editor::Idle,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Editor::Idle)
    }

    pub fn editing(&self) -> Option<&K> {
        match self {
            Editor::Editing(key) => Some(key),
            _ => None,
        }
    }

    pub fn submission(&self) -> Option<Submission<K>> {
        match self {
            Editor::Idle => None,
            Editor::Creating => Some(Submission::Create),
            Editor::Editing(key) => Some(Submission::Update(key.clone())),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub snapshot: Snapshot,
    pub run_editor: RunEditor,
    pub plan_editor: PlanEditor,
    pub notice: Option<String>,
}

impl Session {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Replaces the snapshot with fresh data. On failure the previous snapshot stays.
    pub async fn reload(&mut self, store: &dyn Store) -> Result<(), StoreError> {
        let snapshot = load_snapshot(store).await?;
        self.snapshot = snapshot;
        Ok(())
    }

    /// Reload for display; a failure becomes the notice instead of an error.
    pub async fn refresh(&mut self, store: &dyn Store) {
        if let Err(err) = self.reload(store).await {
            warn!(backend = store.backend_name(), "reload failed: {err}");
            self.notice = Some(format!("Showing last loaded data: {err}"));
        }
    }

    /// Finishes a write: reloads either way so the snapshot reflects what the store holds.
    pub async fn settle<T>(
        &mut self,
        store: &dyn Store,
        action: &str,
        result: Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.notice = None;
                if let Err(err) = self.reload(store).await {
                    warn!(backend = store.backend_name(), action, "reload after write failed: {err}");
                    self.notice = Some(format!("{action} saved, but reloading failed: {err}"));
                }
                Ok(value)
            }
            Err(err) => {
                error!(backend = store.backend_name(), action, "write failed: {err}");
                self.notice = Some(format!("{action} failed: {err}"));
                if let Err(reload_err) = self.reload(store).await {
                    warn!(backend = store.backend_name(), "reload after failed write: {reload_err}");
                }
                Err(err)
            }
        }
    }
}

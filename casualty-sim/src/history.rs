//! Snapshot undo/redo layered over a [`Session`]. The engine never calls it.
use crate::session::Session;

pub const DEFAULT_HISTORY_DEPTH: usize = 100;

#[derive(Debug, Clone)]
struct Snapshot {
    label: String,
    session: Session,
}

#[derive(Debug, Clone)]
pub struct SessionHistory {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    depth: usize,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }
}

impl SessionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `depth` undo steps. Zero keeps one.
    #[must_use]
    pub fn with_depth(depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Snapshot `session`, then run `f` on it. Clears the redo stack.
    pub fn run<R>(
        &mut self,
        session: &mut Session,
        label: impl Into<String>,
        f: impl FnOnce(&mut Session) -> R,
    ) -> R {
        self.undo.push(Snapshot {
            label: label.into(),
            session: session.clone(),
        });
        if self.undo.len() > self.depth {
            self.undo.remove(0);
        }
        self.redo.clear();
        f(session)
    }

    /// Restore the state before the last recorded action. Returns its label.
    pub fn undo(&mut self, session: &mut Session) -> Option<String> {
        let snapshot = self.undo.pop()?;
        let label = snapshot.label.clone();
        let current = std::mem::replace(session, snapshot.session);
        self.redo.push(Snapshot {
            label: snapshot.label,
            session: current,
        });
        Some(label)
    }

    /// Re-apply the last undone action. Returns its label.
    pub fn redo(&mut self, session: &mut Session) -> Option<String> {
        let snapshot = self.redo.pop()?;
        let label = snapshot.label.clone();
        let current = std::mem::replace(session, snapshot.session);
        self.undo.push(Snapshot {
            label: snapshot.label,
            session: current,
        });
        Some(label)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo.iter().map(|snap| snap.label.as_str()).collect()
    }
}

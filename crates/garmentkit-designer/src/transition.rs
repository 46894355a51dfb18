//! Transition tokens and the restoring gate.
//!
//! Every canvas rebuild takes a token. Only the holder of the latest token
//! may touch the canvas, the variant store or history once it has awaited
//! anything; older rebuilds notice after each await and walk away. Requests
//! are never queued.

use crate::serialization::SceneDocument;
use garmentkit_core::Variant;
use std::cell::Cell;
use std::fmt;

/// Monotonic rebuild token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionToken(pub u64);

impl fmt::Display for TransitionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a rebuild ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This rebuild owns the canvas.
    Completed {
        token: TransitionToken,
        /// A stored or override scene with artwork was installed.
        restored_content: bool,
    },
    /// A newer rebuild was issued while this one was waiting.
    Superseded { token: TransitionToken },
}

impl TransitionOutcome {
    pub fn token(&self) -> TransitionToken {
        match self {
            Self::Completed { token, .. } | Self::Superseded { token } => *token,
        }
    }

    /// Whether the transition ran to the end.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Direction of a history replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Undo,
    Redo,
}

/// What to rebuild the canvas into.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub target: Variant,
    /// Scene to show instead of the stored one. It is written to the store
    /// only once the rebuild has completed.
    pub override_doc: Option<SceneDocument>,
    /// Commit the outgoing scene before clearing the canvas.
    pub commit_outgoing: bool,
    /// History move applied together with `override_doc` on completion.
    pub history_step: Option<HistoryStep>,
}

impl TransitionRequest {
    /// Plain navigation to `target`.
    pub fn navigate(target: Variant) -> Self {
        Self {
            target,
            override_doc: None,
            commit_outgoing: true,
            history_step: None,
        }
    }

    /// Rebuild from the store, discarding whatever the canvas shows.
    pub fn reload(target: Variant) -> Self {
        Self {
            target,
            override_doc: None,
            commit_outgoing: false,
            history_step: None,
        }
    }

    /// Show `doc`, the scene one `step` away in history, without recording
    /// the outgoing scene. History moves only if the replay completes.
    pub fn replay(target: Variant, doc: SceneDocument, step: HistoryStep) -> Self {
        Self {
            target,
            override_doc: Some(doc),
            commit_outgoing: false,
            history_step: Some(step),
        }
    }
}

/// Issues tokens and tracks whether a rebuild is in flight.
#[derive(Debug, Default)]
pub struct TransitionController {
    latest: Cell<u64>,
    restoring: Cell<bool>,
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token and raise the restoring gate. The gate drops when
    /// the returned guard is dropped, unless a newer rebuild has taken over.
    pub fn begin(&self) -> (TransitionToken, RestoringGuard<'_>) {
        let token = TransitionToken(self.latest.get() + 1);
        self.latest.set(token.0);
        self.restoring.set(true);
        (
            token,
            RestoringGuard {
                controller: self,
                token,
            },
        )
    }

    /// Token of the most recently issued transition.
    pub fn latest(&self) -> TransitionToken {
        TransitionToken(self.latest.get())
    }

    /// Whether `token` has not been superseded.
    pub fn is_current(&self, token: TransitionToken) -> bool {
        self.latest.get() == token.0
    }

    /// Whether history commits are suspended.
    pub fn is_restoring(&self) -> bool {
        self.restoring.get()
    }
}

/// Clears the restoring gate on every exit path of the current rebuild.
pub struct RestoringGuard<'a> {
    controller: &'a TransitionController,
    token: TransitionToken,
}

impl Drop for RestoringGuard<'_> {
    fn drop(&mut self) {
        if self.controller.is_current(self.token) {
            self.controller.restoring.set(false);
        }
    }
}

//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so they can be logged or replayed.

use serde::{Deserialize, Serialize};

use crate::data::{Side, Variant, VariantKey};

/// Root event enum for designer events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignerEvent {
    /// Canvas rebuild events
    Transition(TransitionEvent),
    /// Undo/redo availability changes
    History(HistoryEvent),
    /// Save, export and reset of designs
    Design(DesignEvent),
}

impl DesignerEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            DesignerEvent::Transition(_) => EventCategory::Transition,
            DesignerEvent::History(_) => EventCategory::History,
            DesignerEvent::Design(_) => EventCategory::Design,
        }
    }

    /// Garment type the event concerns, if any.
    pub fn garment(&self) -> Option<&str> {
        match self {
            DesignerEvent::Transition(TransitionEvent::Started { target, .. })
            | DesignerEvent::Transition(TransitionEvent::Completed { target, .. }) => {
                Some(&target.garment)
            }
            DesignerEvent::Transition(TransitionEvent::Superseded { .. }) => None,
            DesignerEvent::History(HistoryEvent::Changed { key, .. }) => Some(&key.garment),
            DesignerEvent::Design(DesignEvent::Saved { garment, .. })
            | DesignerEvent::Design(DesignEvent::Reset { garment }) => Some(garment),
            DesignerEvent::Design(DesignEvent::Exported { .. }) => None,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            DesignerEvent::Transition(e) => e.description(),
            DesignerEvent::History(e) => e.description(),
            DesignerEvent::Design(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Variant switch events.
    Transition,
    /// History events.
    History,
    /// Design lifecycle events.
    Design,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Transition => write!(f, "Transition"),
            EventCategory::History => write!(f, "History"),
            EventCategory::Design => write!(f, "Design"),
        }
    }
}

/// Canvas rebuild lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionEvent {
    /// A rebuild towards `target` was issued with `token`
    Started {
        /// Transition token.
        token: u64,
        /// Variant being rebuilt.
        target: Variant,
    },
    /// The rebuild holding `token` finished and owns the canvas
    Completed {
        /// Transition token.
        token: u64,
        /// Variant now shown.
        target: Variant,
        /// Whether a stored scene was restored.
        restored_content: bool,
    },
    /// The rebuild holding `token` was overtaken by a newer one
    Superseded {
        /// Transition token that lost.
        token: u64,
    },
}

impl TransitionEvent {
    fn description(&self) -> String {
        match self {
            TransitionEvent::Started { token, target } => {
                format!("transition #{} started -> {}", token, target.key())
            }
            TransitionEvent::Completed { token, target, .. } => {
                format!("transition #{} completed at {}", token, target.key())
            }
            TransitionEvent::Superseded { token } => {
                format!("transition #{} superseded", token)
            }
        }
    }
}

/// History availability for one scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// Undo/redo availability for `key` changed or was re-evaluated
    Changed {
        /// Scene the history belongs to.
        key: VariantKey,
        /// Whether undo is possible.
        can_undo: bool,
        /// Whether redo is possible.
        can_redo: bool,
    },
}

impl HistoryEvent {
    fn description(&self) -> String {
        match self {
            HistoryEvent::Changed {
                key,
                can_undo,
                can_redo,
            } => format!("history {} undo={} redo={}", key, can_undo, can_redo),
        }
    }
}

/// Design lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignEvent {
    /// Images were captured for the listed sides
    Saved {
        /// Garment type saved.
        garment: String,
        /// Sides that produced images.
        sides: Vec<Side>,
        /// Quoted subtotal in minor currency units, if any side had content.
        subtotal: Option<u32>,
    },
    /// An archive was exported
    Exported {
        /// Number of files in the archive.
        files: usize,
    },
    /// Both sides of a garment type were cleared
    Reset {
        /// Garment type cleared.
        garment: String,
    },
}

impl DesignEvent {
    fn description(&self) -> String {
        match self {
            DesignEvent::Saved { garment, sides, .. } => {
                format!("design saved for {} ({} sides)", garment, sides.len())
            }
            DesignEvent::Exported { files } => format!("archive exported ({} files)", files),
            DesignEvent::Reset { garment } => format!("design reset for {}", garment),
        }
    }
}

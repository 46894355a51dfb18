//! Stored scene per garment type and side.
//!
//! Entries appear on first commit for a variant and are only cleared by an
//! explicit garment reset; navigating between variants never drops them.
//! Documents are shared behind `Rc` and replaced wholesale on write, so a
//! document handed out by `get` never changes underneath its reader.

use crate::history::HistoryManager;
use crate::serialization::SceneDocument;
use garmentkit_core::{Side, VariantKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Both sides of one garment type.
#[derive(Debug, Clone, Default)]
pub struct GarmentScenes {
    pub front: Option<Rc<SceneDocument>>,
    pub back: Option<Rc<SceneDocument>>,
}

impl GarmentScenes {
    fn slot(&self, side: Side) -> &Option<Rc<SceneDocument>> {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<Rc<SceneDocument>> {
        match side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }
}

/// Plain-data form of the store, used by session snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredScenes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<SceneDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<SceneDocument>,
}

/// Last saved scene of every garment side, keyed by garment then side.
#[derive(Debug, Clone, Default)]
pub struct VariantStateStore {
    garments: BTreeMap<String, GarmentScenes>,
}

impl VariantStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored scene for one side, shared.
    pub fn get(&self, garment: &str, side: Side) -> Option<Rc<SceneDocument>> {
        self.garments
            .get(garment)
            .and_then(|scenes| scenes.slot(side).clone())
    }

    pub fn get_key(&self, key: &VariantKey) -> Option<Rc<SceneDocument>> {
        self.get(&key.garment, key.side)
    }

    pub fn set(&mut self, garment: &str, side: Side, doc: SceneDocument) {
        *self
            .garments
            .entry(garment.to_string())
            .or_default()
            .slot_mut(side) = Some(Rc::new(doc));
    }

    /// Clear both sides of a garment type along with their history.
    pub fn reset_garment(&mut self, garment: &str, history: &mut HistoryManager) {
        if let Some(scenes) = self.garments.get_mut(garment) {
            scenes.front = None;
            scenes.back = None;
        }
        history.clear_garment(garment);
        tracing::info!("Reset stored scenes for '{}'", garment);
    }

    /// Whether the stored scene for a variant holds any artwork.
    pub fn has_content(&self, garment: &str, side: Side) -> bool {
        self.get(garment, side).is_some_and(|doc| doc.has_content())
    }

    /// Garment types with at least one stored side.
    pub fn garments(&self) -> impl Iterator<Item = &str> {
        self.garments.keys().map(String::as_str)
    }

    pub fn to_stored(&self) -> BTreeMap<String, StoredScenes> {
        self.garments
            .iter()
            .map(|(garment, scenes)| {
                (
                    garment.clone(),
                    StoredScenes {
                        front: scenes.front.as_deref().cloned(),
                        back: scenes.back.as_deref().cloned(),
                    },
                )
            })
            .collect()
    }

    pub fn from_stored(stored: BTreeMap<String, StoredScenes>) -> Self {
        let garments = stored
            .into_iter()
            .map(|(garment, scenes)| {
                (
                    garment,
                    GarmentScenes {
                        front: scenes.front.map(Rc::new),
                        back: scenes.back.map(Rc::new),
                    },
                )
            })
            .collect();
        Self { garments }
    }
}

//! Variant switching and history replay.

use super::{DesignerSession, FALLBACK_COLOR};
use crate::canvas::{Background, SceneObject};
use crate::serialization::{SceneCodec, SceneDocument};
use crate::transition::{HistoryStep, TransitionOutcome, TransitionRequest, TransitionToken};
use garmentkit_core::{DesignerEvent, Side, TransitionEvent, Variant};
use garmentkit_settings::ConfigResult;
use std::rc::Rc;

impl DesignerSession {
    /// Load the initially selected variant onto the canvas.
    pub async fn initialize(&self) -> TransitionOutcome {
        let variant = self.variant();
        tracing::info!("Initializing designer on {}", variant.key());
        self.run_transition(TransitionRequest::navigate(variant)).await
    }

    /// Switch the printed side of the selected garment.
    pub async fn on_side_changed(&self, side: Side) -> TransitionOutcome {
        let target = self.variant().with_side(side);
        self.run_transition(TransitionRequest::navigate(target)).await
    }

    /// Switch garment type. The color is kept when the new garment offers
    /// it, otherwise the garment's first color is used.
    pub async fn on_garment_changed(&self, garment: &str) -> ConfigResult<TransitionOutcome> {
        let spec = self.config.garment(garment)?;
        let current = self.variant();
        let color = if spec.colors.iter().any(|c| c == &current.color) {
            current.color.clone()
        } else {
            spec.default_color().unwrap_or(FALLBACK_COLOR).to_string()
        };
        let target = Variant::new(garment, color, current.side);
        Ok(self.run_transition(TransitionRequest::navigate(target)).await)
    }

    /// Switch garment color. The scene is the same; only the background
    /// changes, but the whole rebuild runs so that ordering stays uniform.
    pub async fn on_color_changed(&self, color: &str) -> TransitionOutcome {
        let current = self.variant();
        let target = Variant::new(current.garment, color, current.side);
        self.run_transition(TransitionRequest::navigate(target)).await
    }

    /// Step back one committed state of the selected variant.
    ///
    /// Returns `None` when there is nothing to undo.
    /// History is left as it was if a newer variant change supersedes the
    /// replay. Returns `None` when there is nothing to undo.
    pub async fn undo(&self) -> Option<TransitionOutcome> {
        self.replay(HistoryStep::Undo).await
    }

    /// Re-apply one undone state of the selected variant.
    pub async fn redo(&self) -> Option<TransitionOutcome> {
        self.replay(HistoryStep::Redo).await
    }

    async fn replay(&self, step: HistoryStep) -> Option<TransitionOutcome> {
        self.commit_now();
        let variant = self.variant();
        let key = variant.key();
        let doc = {
            let history = self.history.borrow();
            match step {
                HistoryStep::Undo => history.peek_undo(&key),
                HistoryStep::Redo => history.peek_redo(&key),
            }
            .cloned()
        }?;
        tracing::debug!("{:?} on {}", step, key);
        Some(
            self.run_transition(TransitionRequest::replay(variant, doc, step))
                .await,
        )
    }

    /// Rebuild the canvas for `request.target`.
    ///
    /// Ordering: commit the outgoing scene, clear, load the background,
    /// decode the scene, install it, re-assert the background, rebuild the
    /// clip, request a render and seed history. After every await the
    /// rebuild checks that it still holds the latest token; a newer request
    /// makes it return [`TransitionOutcome::Superseded`] without touching
    /// anything further.
    pub async fn run_transition(&self, request: TransitionRequest) -> TransitionOutcome {
        let TransitionRequest {
            target,
            override_doc,
            commit_outgoing,
            history_step,
        } = request;
        let key = target.key();

        let (token, guard) = self.transitions.begin();
        self.debouncer.cancel();
        let outgoing = {
            let mut state = self.state.borrow_mut();
            state.variant = target.clone();
            let outgoing = match &state.canvas_key {
                Some(previous) if commit_outgoing && !state.degraded => Some(previous.clone()),
                _ => None,
            };
            state.canvas_key = None;
            state.degraded = false;
            outgoing
        };
        tracing::debug!("Transition {} to {} ({})", token, key, target.color);
        self.events
            .publish(DesignerEvent::Transition(TransitionEvent::Started {
                token: token.0,
                target: target.clone(),
            }));

        if let Some(previous) = outgoing {
            self.commit_canvas(&previous);
        }

        let url = self
            .config
            .backgrounds
            .url_for(&target.garment, &target.color, target.side);
        self.canvas.borrow_mut().clear();

        let background = match self.assets.image(&url).await {
            Ok(image) => Background::from_image(url.clone(), image),
            Err(e) => {
                tracing::warn!("Garment background unavailable: {}", e);
                Background::default()
            }
        };
        if !self.transitions.is_current(token) {
            return self.superseded(token);
        }
        self.canvas.borrow_mut().set_background(background.clone());

        let doc: Option<Rc<SceneDocument>> = match &override_doc {
            Some(doc) => Some(Rc::new(doc.clone())),
            None => self.store.borrow().get_key(&key),
        };

        let mut restored_content = false;
        let mut degraded = false;
        let loaded = match &doc {
            Some(doc) => match self.codec.deserialize(doc).await {
                Ok(scene) => {
                    restored_content = doc.has_content();
                    Some(scene)
                }
                Err(e) => {
                    tracing::warn!("Stored scene for {} could not be restored: {}", key, e);
                    degraded = true;
                    None
                }
            },
            None => None,
        };
        if !self.transitions.is_current(token) {
            return self.superseded(token);
        }

        if let Some(doc) = override_doc {
            self.store
                .borrow_mut()
                .set(&target.garment, target.side, doc);
        }
        if let Some(step) = history_step {
            let mut history = self.history.borrow_mut();
            let moved = match step {
                HistoryStep::Undo => history.undo(&key),
                HistoryStep::Redo => history.redo(&key),
            };
            if moved.is_none() {
                tracing::warn!("{:?} on {} found nothing to move", step, key);
            }
        }

        {
            let mut canvas = self.canvas.borrow_mut();
            if let Some(scene) = loaded {
                scene.apply_to(&mut canvas);
            }
            canvas.set_background(background);
            canvas.remove_where(SceneObject::is_clip_border);
            self.clip
                .borrow_mut()
                .rebuild(&mut canvas, &target.garment, target.side);
            canvas.request_render();
        }

        if !degraded {
            let present = SceneCodec::serialize(&self.canvas.borrow());
            if self.history.borrow_mut().seed(&key, present) {
                tracing::trace!("Seeded history for {}", key);
            }
        }

        {
            let mut state = self.state.borrow_mut();
            state.canvas_key = Some(key.clone());
            state.degraded = degraded;
        }
        drop(guard);

        self.publish_history(&key);
        self.events
            .publish(DesignerEvent::Transition(TransitionEvent::Completed {
                token: token.0,
                target,
                restored_content,
            }));
        TransitionOutcome::Completed {
            token,
            restored_content,
        }
    }

    fn superseded(&self, token: TransitionToken) -> TransitionOutcome {
        tracing::debug!(
            "Transition {} superseded by {}",
            token,
            self.transitions.latest()
        );
        self.events
            .publish(DesignerEvent::Transition(TransitionEvent::Superseded {
                token: token.0,
            }));
        TransitionOutcome::Superseded { token }
    }
}

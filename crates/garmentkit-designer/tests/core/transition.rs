use crate::support::{drain, garment_photos, test_config, GatedLoader};
use garmentkit_core::{
    CaptureError, DesignerEvent, Side, TransitionEvent, Variant, VariantKey,
};
use garmentkit_designer::{DesignerSession, TextObject, TransitionOutcome};
use std::rc::Rc;
use tokio::sync::Notify;

async fn gated_session(gated_url: &str) -> (DesignerSession, Rc<Notify>) {
    let config = test_config();
    let gate = Rc::new(Notify::new());
    let loader = GatedLoader {
        inner: garment_photos(&config),
        gated_url: gated_url.to_string(),
        gate: Rc::clone(&gate),
    };
    let session = DesignerSession::new(config, Rc::new(loader)).unwrap();
    assert!(session.initialize().await.is_completed());
    (session, gate)
}

/// Yield until the session has started rebuilding towards `color`.
async fn wait_for_color(session: &DesignerSession, color: &str) {
    while session.variant().color != color {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_stale_transition_is_discarded() {
    let (session, gate) = gated_session("garments/men/black/front.png").await;
    session
        .add_text(TextObject::new("Keep me", "Sans", 24.0))
        .unwrap();
    let mut rx = session.events().receiver();

    let (slow, fast) = tokio::join!(session.on_color_changed("black"), async {
        wait_for_color(&session, "black").await;
        assert!(session.is_restoring());
        let outcome = session.on_side_changed(Side::Back).await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(slow, TransitionOutcome::Superseded { .. }));
    assert!(fast.is_completed());
    assert!(fast.token() > slow.token());

    assert_eq!(session.variant(), Variant::new("men", "black", Side::Back));
    assert_eq!(
        session.canvas_variant(),
        Some(VariantKey::new("men", Side::Back))
    );
    assert_eq!(
        session.canvas().background().url.as_deref(),
        Some("garments/men/black/back.png")
    );
    assert!(!session.canvas().has_content());
    assert!(!session.is_restoring());

    // The front scene was committed once, on the way out.
    let front = session.stored_scene("men", Side::Front).unwrap();
    assert_eq!(front.content_count(), 1);
    assert!(session.stored_scene("men", Side::Back).is_none());

    let events = drain(&mut rx);
    assert!(events.contains(&DesignerEvent::Transition(TransitionEvent::Superseded {
        token: slow.token().0
    })));
    let completed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, DesignerEvent::Transition(TransitionEvent::Completed { .. })))
        .collect();
    assert_eq!(completed.len(), 1);
}

#[tokio::test]
async fn test_edits_are_rejected_mid_rebuild() {
    let (session, gate) = gated_session("garments/men/white/back.png").await;

    let (outcome, edited) = tokio::join!(session.on_side_changed(Side::Back), async {
        while session.variant().side != Side::Back {
            tokio::task::yield_now().await;
        }
        let edited = session.add_text(TextObject::new("Too early", "Sans", 24.0));
        session.commit_now();
        gate.notify_one();
        edited
    });

    assert!(outcome.is_completed());
    assert!(edited.is_none());
    assert!(!session.canvas().has_content());
    assert!(!session.side_has_content("men", Side::Back));
}

#[tokio::test]
async fn test_save_stops_when_user_switches_variant() {
    let (session, gate) = gated_session("garments/men/white/back.png").await;
    session
        .add_text(TextObject::new("Front", "Sans", 24.0))
        .unwrap();
    // Dress the back in black so that the white back photo is first
    // requested by the save itself.
    session.on_color_changed("black").await;
    session.on_side_changed(Side::Back).await;
    session
        .add_text(TextObject::new("Back", "Sans", 24.0))
        .unwrap();
    session.on_side_changed(Side::Front).await;
    session.on_color_changed("white").await;

    // The save moves to the back side, whose photo is gated, and the user
    // picks another color while it waits.
    let (saved, chosen) = tokio::join!(session.save_design(), async {
        while session.variant().side != Side::Back {
            tokio::task::yield_now().await;
        }
        let outcome = session.on_color_changed("navy").await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(saved, Err(CaptureError::Interrupted)));
    assert!(chosen.is_completed());
    assert_eq!(session.variant(), Variant::new("men", "navy", Side::Back));
}

#[tokio::test]
async fn test_superseded_undo_leaves_history_alone() {
    let (session, gate) = gated_session("garments/men/black/front.png").await;
    session.add_text(TextObject::new("A", "Sans", 24.0)).unwrap();
    session.add_text(TextObject::new("B", "Sans", 24.0)).unwrap();
    let mut rx = session.events().receiver();

    let (recolor, undo, flip) = tokio::join!(
        session.on_color_changed("black"),
        async {
            wait_for_color(&session, "black").await;
            session.undo().await
        },
        async {
            // Both the recolor and the undo replay are parked on the photo.
            let mut started = 0;
            while started < 2 {
                match rx.try_recv() {
                    Ok(DesignerEvent::Transition(TransitionEvent::Started { .. })) => started += 1,
                    Ok(_) => {}
                    Err(_) => tokio::task::yield_now().await,
                }
            }
            let outcome = session.on_side_changed(Side::Back).await;
            gate.notify_waiters();
            outcome
        }
    );

    assert!(matches!(recolor, TransitionOutcome::Superseded { .. }));
    assert!(matches!(undo, Some(TransitionOutcome::Superseded { .. })));
    assert!(flip.is_completed());

    let front = VariantKey::new("men", Side::Front);
    let stored = session.stored_scene("men", Side::Front).unwrap();
    assert_eq!(stored.content_count(), 2);

    let history = session.history();
    let bucket = history.bucket(&front).unwrap();
    assert_eq!(bucket.present().unwrap().content_count(), 2);
    assert_eq!(bucket.undo_len(), 2);
    assert_eq!(bucket.redo_len(), 0);
}

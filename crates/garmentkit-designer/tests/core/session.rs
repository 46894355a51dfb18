use crate::support::{drain, garment_photos, ready_session, test_config};
use garmentkit_core::{DesignEvent, DesignerEvent, HistoryEvent, Side, VariantKey};
use garmentkit_designer::{
    ClipShape, Content, DesignerSession, ObjectKind, PricedSides, Quote, SceneDocument,
    SceneObject, TextObject, TransitionOutcome,
};
use std::rc::Rc;

fn text(body: &str) -> TextObject {
    TextObject::new(body, "Sans", 24.0)
}

fn border_count(session: &DesignerSession) -> usize {
    session
        .canvas()
        .objects()
        .iter()
        .filter(|o| o.is_clip_border())
        .count()
}

fn undo_len(session: &DesignerSession, side: Side) -> usize {
    session
        .history()
        .bucket(&VariantKey::new("men", side))
        .map(|b| b.undo_len())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_initialize_installs_background_and_clip() {
    let session = ready_session().await;

    assert_eq!(
        session.canvas_variant(),
        Some(VariantKey::new("men", Side::Front))
    );
    let canvas = session.canvas();
    assert_eq!(
        canvas.background().url.as_deref(),
        Some("garments/men/white/front.png")
    );
    assert!(canvas.active_clip().is_some());
    assert!(!canvas.has_content());
    assert!(canvas.render_requests() >= 1);
    drop(canvas);

    assert_eq!(border_count(&session), 1);
    assert!(!session.can_undo());
    assert!(!session.is_restoring());
}

#[tokio::test]
async fn test_missing_background_still_completes() {
    let config = test_config();
    let session = DesignerSession::new(
        config,
        Rc::new(garmentkit_designer::MemoryAssetLoader::new()),
    )
    .unwrap();

    assert!(session.initialize().await.is_completed());
    assert!(session.canvas().background().is_empty());
    assert_eq!(border_count(&session), 1);
}

#[tokio::test]
async fn test_add_text_then_undo_and_redo() {
    let session = ready_session().await;
    session.add_text(text("Hello")).unwrap();

    assert!(session.can_undo());
    let stored = session.stored_scene("men", Side::Front).unwrap();
    assert_eq!(stored.content_count(), 1);

    let outcome = session.undo().await.unwrap();
    assert!(outcome.is_completed());
    assert!(!session.canvas().has_content());
    assert!(session.can_redo());
    assert_eq!(
        session.stored_scene("men", Side::Front).unwrap().content_count(),
        0
    );

    session.redo().await.unwrap();
    assert_eq!(session.canvas().content().count(), 1);
    assert!(!session.can_redo());
    assert_eq!(border_count(&session), 1);
}

#[tokio::test]
async fn test_undo_with_empty_history_does_nothing() {
    let session = ready_session().await;
    assert!(session.undo().await.is_none());
    assert!(session.redo().await.is_none());
}

#[tokio::test]
async fn test_sides_keep_separate_scenes() {
    let session = ready_session().await;
    session.add_text(text("Front")).unwrap();

    let outcome = session.on_side_changed(Side::Back).await;
    assert_eq!(
        outcome,
        TransitionOutcome::Completed {
            token: outcome.token(),
            restored_content: false
        }
    );
    assert!(!session.canvas().has_content());
    assert_eq!(
        session.canvas().background().url.as_deref(),
        Some("garments/men/white/back.png")
    );

    let id = session.add_image("art/logo.png").await.unwrap();
    assert!(id.is_some());

    let outcome = session.on_side_changed(Side::Front).await;
    assert!(matches!(
        outcome,
        TransitionOutcome::Completed {
            restored_content: true,
            ..
        }
    ));
    let canvas = session.canvas();
    let content: Vec<&SceneObject> = canvas.content().collect();
    assert_eq!(content.len(), 1);
    assert!(matches!(content[0].kind, ObjectKind::Content(Content::Text(_))));
    drop(canvas);

    let back = session.stored_scene("men", Side::Back).unwrap();
    assert_eq!(back.objects[0].src.as_deref(), Some("art/logo.png"));
}

#[tokio::test]
async fn test_history_is_per_side() {
    let session = ready_session().await;
    session.add_text(text("Front")).unwrap();
    session.on_side_changed(Side::Back).await;

    assert!(!session.can_undo());
    assert_eq!(undo_len(&session, Side::Front), 1);
}

#[tokio::test]
async fn test_quote_follows_printed_sides() {
    let session = ready_session().await;
    assert_eq!(session.quote(), None);

    session.add_text(text("Front")).unwrap();
    assert_eq!(
        session.quote(),
        Some(Quote {
            subtotal: 2500,
            sides: PricedSides::One
        })
    );

    session.on_side_changed(Side::Back).await;
    session.add_text(text("Back")).unwrap();
    assert!(session.side_has_content("men", Side::Front));
    assert!(session.side_has_content("men", Side::Back));
    assert_eq!(
        session.quote(),
        Some(Quote {
            subtotal: 3500,
            sides: PricedSides::Both
        })
    );
    assert_eq!(session.quote_for("women"), None);
}

#[tokio::test]
async fn test_garment_change_keeps_color_when_offered() {
    let session = ready_session().await;
    session.on_color_changed("black").await;
    assert_eq!(
        session.canvas().background().url.as_deref(),
        Some("garments/men/black/front.png")
    );

    session.on_garment_changed("women").await.unwrap();
    assert_eq!(session.variant().color, "black");

    session.on_garment_changed("kids").await.unwrap();
    assert_eq!(session.variant().color, "white");
    assert_eq!(session.variant().side, Side::Front);

    assert!(session.on_garment_changed("poncho").await.is_err());
    assert_eq!(session.variant().garment, "kids");
}

#[tokio::test]
async fn test_color_change_keeps_scene() {
    let session = ready_session().await;
    session.add_text(text("Hello")).unwrap();
    session.on_color_changed("navy").await;
    assert_eq!(session.canvas().content().count(), 1);
}

#[tokio::test]
async fn test_gesture_collapses_into_one_commit() {
    let session = ready_session().await;
    let id = session.add_text(text("Drag me")).unwrap();
    let before = undo_len(&session, Side::Front);

    session.edit(|canvas| canvas.translate(id, 5.0, 0.0)).unwrap();
    let (a, b) = tokio::join!(session.note_edit(), session.note_edit());

    assert!(a ^ b);
    assert_eq!(undo_len(&session, Side::Front), before + 1);
}

#[tokio::test]
async fn test_unchanged_commit_is_ignored() {
    let session = ready_session().await;
    session.add_text(text("Once")).unwrap();
    let before = undo_len(&session, Side::Front);

    session.commit_now();
    session.commit_now();
    assert_eq!(undo_len(&session, Side::Front), before);
}

#[tokio::test]
async fn test_undecodable_scene_is_not_overwritten() {
    let session = ready_session().await;
    let mut doc = SceneDocument::empty(300.0, 200.0);
    doc.objects.push(garmentkit_designer::ObjectRecord {
        object_type: "image".to_string(),
        left: 150.0,
        top: 100.0,
        width: 20.0,
        height: 20.0,
        scale_x: 1.0,
        scale_y: 1.0,
        angle: 0.0,
        opacity: 1.0,
        visible: true,
        fill: None,
        text: None,
        font_family: None,
        font_size: None,
        src: Some("art/missing.png".to_string()),
        is_mask_image: false,
        is_clip_border: false,
        absolute_positioned: false,
    });

    let outcome = session
        .restore_design("men", Some(doc.clone()), None)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        TransitionOutcome::Completed {
            restored_content: false,
            ..
        }
    ));
    assert!(!session.canvas().has_content());
    assert_eq!(border_count(&session), 1);

    session.on_side_changed(Side::Back).await;
    assert_eq!(
        session.stored_scene("men", Side::Front).as_deref(),
        Some(&doc)
    );
}

#[tokio::test]
async fn test_confirmed_mask_survives_round_trip() {
    let session = ready_session().await;
    let id = session.add_image("art/mask.png").await.unwrap().unwrap();
    assert!(session.confirm_mask(id));
    assert_eq!(session.clip_engine().mask_count(), 1);
    assert!(matches!(
        session.canvas().active_clip().map(|c| &c.shape),
        Some(ClipShape::Mask(_))
    ));

    let art = session.add_text(text("Clipped")).unwrap();
    {
        let canvas = session.canvas();
        let clip_id = canvas.active_clip().map(|c| c.id);
        assert_eq!(canvas.get(art).unwrap().clip, clip_id);
        assert!(canvas.objects().last().unwrap().is_clip_border());
    }

    session.on_side_changed(Side::Back).await;
    session.on_side_changed(Side::Front).await;
    assert_eq!(session.clip_engine().mask_count(), 1);
    assert_eq!(
        session
            .canvas()
            .objects()
            .iter()
            .filter(|o| o.is_mask())
            .count(),
        1
    );

    assert_eq!(session.clear_masks(), 1);
    assert_eq!(session.clip_engine().mask_count(), 0);
    assert!(matches!(
        session.canvas().active_clip().map(|c| &c.shape),
        Some(ClipShape::Rect(_))
    ));
}

#[tokio::test]
async fn test_clip_follows_moved_and_deleted_mask() {
    let session = ready_session().await;
    let id = session.add_image("art/mask.png").await.unwrap().unwrap();
    assert!(session.confirm_mask(id));
    let art = session.add_text(text("Clipped")).unwrap();
    let before = session.canvas().active_clip().cloned().unwrap();

    session.edit(|canvas| canvas.translate(id, 25.0, 10.0));
    {
        let canvas = session.canvas();
        let moved = canvas.active_clip().unwrap();
        assert_ne!(moved.id, before.id);
        match &moved.shape {
            ClipShape::Mask(mask) => {
                assert_eq!(Some(&**mask), canvas.get(id));
            }
            other => panic!("expected mask clip, got {:?}", other),
        }
        assert_eq!(canvas.get(art).unwrap().clip, Some(moved.id));
    }

    assert!(session.remove_object(id));
    assert_eq!(session.clip_engine().mask_count(), 0);
    let canvas = session.canvas();
    let clip = canvas.active_clip().unwrap();
    assert!(matches!(clip.shape, ClipShape::Rect(_)));
    assert_eq!(canvas.get(art).unwrap().clip, Some(clip.id));
    assert!(canvas.objects().last().unwrap().is_clip_border());
}

#[tokio::test]
async fn test_confirm_mask_rejects_text() {
    let session = ready_session().await;
    let id = session.add_text(text("Not a mask")).unwrap();
    assert!(!session.confirm_mask(id));
    assert!(!session.confirm_mask(9999));
    assert_eq!(session.clip_engine().mask_count(), 0);
}

#[tokio::test]
async fn test_reset_garment_clears_both_sides() {
    let session = ready_session().await;
    session.add_text(text("Front")).unwrap();
    session.on_side_changed(Side::Back).await;
    session.add_text(text("Back")).unwrap();

    let mut rx = session.events().receiver();
    let outcome = session.reset_garment("men").await.unwrap();
    assert!(outcome.is_completed());

    assert!(!session.canvas().has_content());
    assert!(session.stored_scene("men", Side::Front).is_none());
    assert!(!session.can_undo());
    assert_eq!(session.quote(), None);
    assert!(drain(&mut rx).contains(&DesignerEvent::Design(DesignEvent::Reset {
        garment: "men".to_string()
    })));
}

#[tokio::test]
async fn test_reset_other_garment_leaves_canvas() {
    let session = ready_session().await;
    session.add_text(text("Front")).unwrap();
    assert!(session.reset_garment("women").await.is_none());
    assert!(session.canvas().has_content());
}

#[tokio::test]
async fn test_history_events_track_availability() {
    let session = ready_session().await;
    let mut rx = session.events().receiver();
    session.add_text(text("Hello")).unwrap();

    let events = drain(&mut rx);
    assert!(events.contains(&DesignerEvent::History(HistoryEvent::Changed {
        key: VariantKey::new("men", Side::Front),
        can_undo: true,
        can_redo: false,
    })));
}

#[tokio::test]
async fn test_custom_font_from_loader() {
    let config = test_config();
    let loader = garment_photos(&config);
    loader.insert_bytes("fonts/broken.ttf", vec![1, 2, 3]);
    let session = DesignerSession::new(config, Rc::new(loader)).unwrap();
    session.initialize().await;

    assert!(
        !session
            .register_font("Broken", garmentkit_designer::FontSource::Url("fonts/broken.ttf".into()))
            .await
    );
    assert!(
        !session
            .register_font("Nowhere", garmentkit_designer::FontSource::Url("fonts/none.ttf".into()))
            .await
    );
    assert!(!session.fonts().is_registered("Broken"));
}

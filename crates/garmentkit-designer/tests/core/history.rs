use garmentkit_core::{Side, VariantKey};
use garmentkit_designer::{CommitOutcome, HistoryManager, ObjectRecord, SceneDocument};
use proptest::prelude::*;

fn key() -> VariantKey {
    VariantKey::new("men", Side::Front)
}

fn text_record(text: &str, left: f64) -> ObjectRecord {
    ObjectRecord {
        object_type: "text".to_string(),
        left,
        top: 40.0,
        width: 50.0,
        height: 20.0,
        scale_x: 1.0,
        scale_y: 1.0,
        angle: 0.0,
        opacity: 1.0,
        visible: true,
        fill: Some([0, 0, 0, 255]),
        text: Some(text.to_string()),
        font_family: Some("Sans".to_string()),
        font_size: Some(16.0),
        src: None,
        is_mask_image: false,
        is_clip_border: false,
        absolute_positioned: false,
    }
}

/// Scene whose content differs for every `step`.
fn scene(step: usize) -> SceneDocument {
    let mut doc = SceneDocument::empty(300.0, 200.0);
    doc.objects.push(text_record(&format!("step {}", step), step as f64));
    doc
}

#[test]
fn test_undo_stack_is_capped() {
    let mut history = HistoryManager::new(50);
    history.seed(&key(), SceneDocument::empty(300.0, 200.0));
    for step in 0..60 {
        assert_eq!(history.commit(&key(), scene(step)), CommitOutcome::Recorded);
    }

    let bucket = history.bucket(&key()).unwrap();
    assert_eq!(bucket.undo_len(), 50);
    assert_eq!(bucket.present(), Some(&scene(59)));
    // The oldest entries were dropped first.
    assert_eq!(bucket.undo_entries().next(), Some(&scene(9)));
}

#[test]
fn test_identical_commit_is_ignored() {
    let mut history = HistoryManager::default();
    history.seed(&key(), scene(0));
    assert_eq!(history.commit(&key(), scene(1)), CommitOutcome::Recorded);
    assert_eq!(history.commit(&key(), scene(1)), CommitOutcome::Unchanged);
    assert_eq!(history.bucket(&key()).unwrap().undo_len(), 1);
}

#[test]
fn test_commit_after_undo_drops_redo() {
    let mut history = HistoryManager::default();
    history.seed(&key(), scene(0));
    history.commit(&key(), scene(1));
    history.commit(&key(), scene(2));

    assert_eq!(history.undo(&key()), Some(scene(1)));
    assert!(history.can_redo(&key()));
    history.commit(&key(), scene(3));
    assert!(!history.can_redo(&key()));
    assert_eq!(history.undo(&key()), Some(scene(1)));
}

#[test]
fn test_buckets_are_independent() {
    let mut history = HistoryManager::default();
    let back = VariantKey::new("men", Side::Back);
    history.seed(&key(), scene(0));
    history.commit(&key(), scene(1));

    assert!(history.can_undo(&key()));
    assert!(!history.can_undo(&back));
    assert!(history.undo(&back).is_none());

    history.clear_garment("men");
    assert!(history.bucket(&key()).is_none());
}

proptest! {
    #[test]
    fn prop_undo_then_redo_restores_present(commits in 1usize..30, undos in 0usize..40) {
        let mut history = HistoryManager::new(50);
        history.seed(&key(), scene(0));
        for step in 1..=commits {
            history.commit(&key(), scene(step));
        }
        let before = history.bucket(&key()).unwrap().present().cloned();

        let mut undone = 0;
        for _ in 0..undos {
            if history.undo(&key()).is_some() {
                undone += 1;
            }
        }
        prop_assert_eq!(undone, undos.min(commits));
        if undos >= commits {
            let present = history.bucket(&key()).unwrap().present().cloned();
            prop_assert_eq!(present, Some(scene(0)));
        }
        for _ in 0..undone {
            prop_assert!(history.redo(&key()).is_some());
        }

        prop_assert!(!history.can_redo(&key()));
        prop_assert_eq!(history.bucket(&key()).unwrap().present().cloned(), before);
    }
}

use crate::support::solid;
use garmentkit_core::DeserializationError;
use garmentkit_designer::{
    AssetCache, Canvas, MemoryAssetLoader, ObjectTransform, SceneCodec, SceneDocument,
    SceneObject, TextObject, SCENE_FORMAT_VERSION,
};
use proptest::prelude::*;
use std::rc::Rc;

fn codec() -> SceneCodec {
    let loader = MemoryAssetLoader::new();
    loader.insert_image("art/logo.png", solid(20, 10, [255, 0, 0, 255]));
    SceneCodec::new(Rc::new(AssetCache::new(Rc::new(loader))))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum Art {
    Text { body: String, size: u8 },
    Logo,
}

fn art() -> impl Strategy<Value = Art> {
    prop_oneof![
        ("[a-zA-Z0-9 ]{1,12}", 8u8..72).prop_map(|(body, size)| Art::Text { body, size }),
        Just(Art::Logo),
    ]
}

fn placement() -> impl Strategy<Value = ObjectTransform> {
    (0i32..300, 0i32..200, 1u32..32, 1u32..32, -180i32..180).prop_map(
        |(left, top, sx, sy, angle)| ObjectTransform {
            left: left as f64,
            top: top as f64,
            scale_x: sx as f64 / 8.0,
            scale_y: sy as f64 / 8.0,
            angle: angle as f64,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_scene_survives_save_and_load(objects in prop::collection::vec((art(), placement()), 0..50)) {
        let codec = codec();
        let logo = Rc::new(solid(20, 10, [255, 0, 0, 255]));

        let mut canvas = Canvas::new(300.0, 200.0);
        for (art, transform) in &objects {
            let id = match art {
                Art::Text { body, size } => {
                    canvas.add_text(TextObject::new(body.clone(), "Sans", *size as f64), 0.0, 0.0)
                }
                Art::Logo => canvas.add_image("art/logo.png", Rc::clone(&logo), 0.0, 0.0),
            };
            canvas.set_transform(id, *transform);
        }

        let saved = SceneCodec::serialize(&canvas);
        let parsed = SceneDocument::from_json(&saved.to_json()).unwrap();
        prop_assert_eq!(&parsed, &saved);

        let mut restored = Canvas::new(300.0, 200.0);
        runtime().block_on(codec.load_into(&mut restored, &parsed)).unwrap();
        prop_assert_eq!(restored.len(), objects.len());
        prop_assert_eq!(SceneCodec::serialize(&restored), saved);
    }
}

#[tokio::test]
async fn test_clip_border_is_not_saved() {
    let mut canvas = Canvas::new(300.0, 200.0);
    let area = garmentkit_designer::PrintArea {
        left: 150.0,
        top: 100.0,
        width: 100.0,
        height: 120.0,
    };
    canvas.add(SceneObject::clip_border(&area, Default::default()));
    canvas.add_text(TextObject::new("Hi", "Sans", 20.0), 150.0, 100.0);

    let doc = SceneCodec::serialize(&canvas);
    assert_eq!(doc.objects.len(), 1);
    assert_eq!(doc.objects[0].object_type, "text");
}

#[tokio::test]
async fn test_unknown_type_fails_without_touching_canvas() {
    let json = r#"{
        "version": 1, "width": 300, "height": 200,
        "objects": [
            {"type": "text", "left": 10, "top": 10, "width": 20, "height": 10, "text": "ok"},
            {"type": "triangle", "left": 0, "top": 0, "width": 5, "height": 5}
        ]
    }"#;
    let doc = SceneDocument::from_json(json).unwrap();

    let mut canvas = Canvas::new(300.0, 200.0);
    canvas.add_text(TextObject::new("Existing", "Sans", 20.0), 50.0, 50.0);
    let err = codec().load_into(&mut canvas, &doc).await.unwrap_err();

    assert_eq!(
        err,
        DeserializationError::UnknownObjectType {
            index: 1,
            object_type: "triangle".to_string()
        }
    );
    assert_eq!(canvas.len(), 1);
}

#[tokio::test]
async fn test_missing_image_reports_source() {
    let json = r#"{"version": 1, "width": 300, "height": 200, "objects": [
        {"type": "image", "left": 10, "top": 10, "width": 20, "height": 10, "src": "art/gone.png"}
    ]}"#;
    let doc = SceneDocument::from_json(json).unwrap();
    let err = codec().deserialize(&doc).await.unwrap_err();
    assert!(matches!(err, DeserializationError::AssetUnavailable { ref src, .. } if src == "art/gone.png"));
}

#[tokio::test]
async fn test_text_without_body_is_malformed() {
    let json = r#"{"version": 1, "width": 300, "height": 200, "objects": [
        {"type": "text", "left": 10, "top": 10, "width": 20, "height": 10}
    ]}"#;
    let doc = SceneDocument::from_json(json).unwrap();
    let err = codec().deserialize(&doc).await.unwrap_err();
    assert!(matches!(err, DeserializationError::MalformedRecord { index: 0, .. }));
}

#[test]
fn test_newer_version_is_rejected() {
    let json = format!(
        r#"{{"version": {}, "width": 300, "height": 200, "objects": []}}"#,
        SCENE_FORMAT_VERSION + 1
    );
    assert_eq!(
        SceneDocument::from_json(&json).unwrap_err(),
        DeserializationError::UnsupportedVersion {
            found: SCENE_FORMAT_VERSION + 1,
            supported: SCENE_FORMAT_VERSION
        }
    );
    assert!(matches!(
        SceneDocument::from_json("{not json"),
        Err(DeserializationError::Json(_))
    ));
}

#[tokio::test]
async fn test_scene_from_larger_canvas_is_rescaled() {
    let mut large = Canvas::new(600.0, 400.0);
    large.add_text(TextObject::new("Big", "Sans", 40.0), 300.0, 100.0);
    let doc = SceneCodec::serialize(&large);

    let mut small = Canvas::new(300.0, 200.0);
    codec().load_into(&mut small, &doc).await.unwrap();

    let object = &small.objects()[0];
    assert_eq!(object.transform.left, 150.0);
    assert_eq!(object.transform.top, 50.0);
    assert_eq!(object.transform.scale_x, 0.5);
    assert_eq!(object.transform.scale_y, 0.5);
}

use crate::support::{garment_photos, ready_session, solid, test_config};
use garmentkit_core::{CaptureError, Side, VariantKey};
use garmentkit_designer::{CaptureService, DesignerSession, PricedSides};
use garmentkit_settings::CaptureSettings;
use image::{Rgba, RgbaImage};
use std::rc::Rc;

fn near(pixel: &Rgba<u8>, expected: [u8; 4]) -> bool {
    pixel
        .0
        .iter()
        .zip(expected.iter())
        .all(|(a, b)| (*a as i32 - *b as i32).abs() <= 3)
}

#[tokio::test]
async fn test_save_captures_mockup_and_design_layer() {
    let session = ready_session().await;
    session.add_image("art/logo.png").await.unwrap().unwrap();
    let center = {
        let canvas = session.canvas();
        let area = canvas.active_clip().unwrap().area;
        (area.left.round() as u32, area.top.round() as u32)
    };

    let saved = session.save_design().await.unwrap();
    assert_eq!(saved.garment, "men");
    assert_eq!(saved.sides(), vec![Side::Front]);
    assert_eq!(saved.price.map(|q| q.sides), Some(PricedSides::One));
    assert!(saved.images.back.is_none());
    assert!(saved.images.back_mask.is_none());

    let full = saved.images.front.as_ref().unwrap();
    assert_eq!(full.dimensions(), (300, 200));
    assert!(near(full.get_pixel(0, 0), [200, 200, 200, 255]));
    assert!(near(full.get_pixel(center.0, center.1), [255, 0, 0, 255]));

    let design = saved.images.front_mask.as_ref().unwrap();
    assert_eq!(design.dimensions(), (300, 200));
    assert_eq!(design.get_pixel(0, 0).0[3], 0);
    assert!(near(design.get_pixel(center.0, center.1), [255, 0, 0, 255]));

    // Capturing leaves the stage as it was.
    let canvas = session.canvas();
    assert!(canvas.background().image.is_some());
    assert!(canvas.objects().iter().any(|o| o.is_clip_border()));
}

#[tokio::test]
async fn test_failed_capture_still_returns_to_starting_side() {
    let session = ready_session().await;
    session.on_side_changed(Side::Back).await;
    session.add_image("art/logo.png").await.unwrap();
    session.on_side_changed(Side::Front).await;

    // Only the back has artwork, so the save has to switch sides before a
    // zero-sized stage makes the capture fail.
    let err = session.save_design_at(0.0).await.unwrap_err();
    assert!(!matches!(err, CaptureError::Interrupted));

    assert_eq!(session.variant().side, Side::Front);
    assert_eq!(
        session.canvas_variant(),
        Some(VariantKey::new("men", Side::Front))
    );
    assert!(!session.is_restoring());
    assert!(session.side_has_content("men", Side::Back));
}

#[tokio::test]
async fn test_save_returns_to_starting_side() {
    let session = ready_session().await;
    session.on_side_changed(Side::Back).await;
    session.add_image("art/logo.png").await.unwrap();
    session.on_side_changed(Side::Front).await;
    session.add_image("art/logo.png").await.unwrap();

    let saved = session.save_design().await.unwrap();
    assert_eq!(saved.sides(), vec![Side::Front, Side::Back]);
    assert_eq!(saved.price.map(|q| q.subtotal), Some(3500));
    assert_eq!(session.variant().side, Side::Front);
    assert_eq!(session.canvas().content().count(), 1);
}

#[tokio::test]
async fn test_empty_design_has_no_price() {
    let session = ready_session().await;
    let saved = session.save_design().await.unwrap();
    assert!(saved.sides().is_empty());
    assert!(saved.price.is_none());
}

#[tokio::test]
async fn test_export_scale_enlarges_captures() {
    let mut config = test_config();
    config.capture.export_scale = 2.0;
    let loader = Rc::new(garment_photos(&config));
    let session = DesignerSession::new(config, loader).unwrap();
    session.initialize().await;
    session.add_image("art/logo.png").await.unwrap();

    let saved = session.save_design().await.unwrap();
    assert_eq!(saved.images.front.unwrap().dimensions(), (600, 400));
}

#[test]
fn test_auto_crop_isolates_artwork() {
    let mut image = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 0]));
    for y in 40..60 {
        for x in 90..110 {
            image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
        }
    }

    let service = CaptureService::new(CaptureSettings::default());
    let cropped = service.auto_crop_for_display(&image);

    // 20x20 artwork plus one pixel of padding per side, then padded to the
    // maximum aspect with transparent rows.
    assert_eq!(cropped.dimensions(), (22, 25));
    assert_eq!(cropped.get_pixel(0, 0).0[3], 0);
    assert_eq!(cropped.get_pixel(11, 12).0, [255, 0, 0, 255]);
}

#[test]
fn test_auto_crop_keeps_full_bleed_images() {
    let mut image = solid(100, 100, [255, 255, 255, 255]);
    for i in 0..100 {
        image.put_pixel(i, 50, Rgba([0, 0, 0, 255]));
        image.put_pixel(50, i, Rgba([0, 0, 0, 255]));
    }
    let service = CaptureService::new(CaptureSettings::default());
    assert_eq!(service.auto_crop_for_display(&image), image);

    let plain = solid(80, 120, [10, 120, 30, 255]);
    assert_eq!(service.auto_crop_for_display(&plain), plain);
}

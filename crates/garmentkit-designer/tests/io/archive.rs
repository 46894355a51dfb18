use crate::support::{drain, ready_session};
use garmentkit_core::{DesignEvent, DesignerEvent, Side};
use garmentkit_designer::TextObject;
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_archive_holds_both_layers_per_printed_side() {
    let session = ready_session().await;
    session.add_image("art/logo.png").await.unwrap();
    session.on_side_changed(Side::Back).await;
    session.add_text(TextObject::new("Back", "Sans", 24.0)).unwrap();

    let mut rx = session.events().receiver();
    let bytes = session.export_archive().await.unwrap();

    assert_eq!(
        entry_names(&bytes),
        vec![
            "back/designOnly.png",
            "back/fullMockup.png",
            "front/designOnly.png",
            "front/fullMockup.png",
        ]
    );

    let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut png = Vec::new();
    archive
        .by_name("front/fullMockup.png")
        .unwrap()
        .read_to_end(&mut png)
        .unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 200));

    let events = drain(&mut rx);
    assert!(events.contains(&DesignerEvent::Design(DesignEvent::Exported { files: 4 })));
    assert!(events.contains(&DesignerEvent::Design(DesignEvent::Saved {
        garment: "men".to_string(),
        sides: vec![Side::Front, Side::Back],
        subtotal: Some(3500),
    })));
}

#[tokio::test]
async fn test_archive_skips_blank_sides() {
    let session = ready_session().await;
    session.add_image("art/logo.png").await.unwrap();

    let bytes = session.export_archive().await.unwrap();
    assert_eq!(
        entry_names(&bytes),
        vec!["front/designOnly.png", "front/fullMockup.png"]
    );
}

#[tokio::test]
async fn test_empty_design_exports_empty_archive() {
    let session = ready_session().await;
    let bytes = session.export_archive().await.unwrap();
    assert!(entry_names(&bytes).is_empty());
}

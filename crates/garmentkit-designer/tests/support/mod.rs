//! Shared fixtures for designer integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use garmentkit_core::{DesignerEvent, ImageLoadError};
use garmentkit_designer::{AssetLoader, DesignerSession, MemoryAssetLoader};
use garmentkit_settings::Config;
use image::{Rgba, RgbaImage};
use std::rc::Rc;
use tokio::sync::{broadcast, Notify};

/// Small canvas and a short quiet period keep session tests fast.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.designer.canvas_width = 300.0;
    config.designer.canvas_height = 200.0;
    config.designer.debounce_ms = 10;
    config
}

pub fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// Loader with a photo for every garment, color and side of `config`.
pub fn garment_photos(config: &Config) -> MemoryAssetLoader {
    let loader = MemoryAssetLoader::new();
    for (garment, spec) in &config.garments {
        for color in &spec.colors {
            for side in garmentkit_core::Side::ALL {
                loader.insert_image(
                    config.backgrounds.url_for(garment, color, side),
                    solid(60, 40, [200, 200, 200, 255]),
                );
            }
        }
    }
    loader.insert_image("art/logo.png", solid(20, 10, [255, 0, 0, 255]));
    loader.insert_image("art/mask.png", solid(40, 40, [0, 0, 0, 255]));
    loader
}

pub async fn ready_session() -> DesignerSession {
    let config = test_config();
    let loader = Rc::new(garment_photos(&config));
    let session = DesignerSession::new(config, loader).expect("valid config");
    assert!(session.initialize().await.is_completed());
    session
}

/// Everything published since the receiver was created.
pub fn drain(rx: &mut broadcast::Receiver<DesignerEvent>) -> Vec<DesignerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Holds back one URL until the gate is opened.
pub struct GatedLoader {
    pub inner: MemoryAssetLoader,
    pub gated_url: String,
    pub gate: Rc<Notify>,
}

#[async_trait(?Send)]
impl AssetLoader for GatedLoader {
    async fn load_bytes(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        if url == self.gated_url {
            self.gate.notified().await;
        }
        self.inner.load_bytes(url).await
    }

    async fn load_image(&self, url: &str) -> Result<RgbaImage, ImageLoadError> {
        if url == self.gated_url {
            self.gate.notified().await;
        }
        self.inner.load_image(url).await
    }
}

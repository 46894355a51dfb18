//! Asset loading for garment photos, uploaded artwork and fonts.
//!
//! Loads are the suspension points of a variant transition. Nothing here can
//! be aborted: callers decide whether a result is still wanted once it
//! resolves.

use async_trait::async_trait;
use garmentkit_core::ImageLoadError;
use image::RgbaImage;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Source of image and font bytes.
#[async_trait(?Send)]
pub trait AssetLoader {
    /// Fetch the raw bytes behind `url`.
    async fn load_bytes(&self, url: &str) -> Result<Vec<u8>, ImageLoadError>;

    /// Fetch and decode an image.
    async fn load_image(&self, url: &str) -> Result<RgbaImage, ImageLoadError> {
        let bytes = self.load_bytes(url).await?;
        decode_image(url, &bytes)
    }
}

/// Decode PNG/JPEG bytes to straight RGBA.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<RgbaImage, ImageLoadError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| ImageLoadError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Loads assets from a directory. URLs are relative paths, optionally
/// prefixed with `file://`.
#[derive(Debug, Clone)]
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory relative URLs are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, ImageLoadError> {
        let relative = url.strip_prefix("file://").unwrap_or(url);
        if relative.contains("://") {
            return Err(ImageLoadError::Unsupported {
                url: url.to_string(),
            });
        }

        let relative = Path::new(relative.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(ImageLoadError::Unsupported {
                url: url.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait(?Send)]
impl AssetLoader for FileAssetLoader {
    async fn load_bytes(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        let path = self.resolve(url)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ImageLoadError::NotFound {
                url: url.to_string(),
            },
            _ => ImageLoadError::Io {
                url: url.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

/// In-memory assets keyed by URL.
#[derive(Default)]
pub struct MemoryAssetLoader {
    images: RefCell<HashMap<String, RgbaImage>>,
    bytes: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `image` for `url`.
    pub fn insert_image(&self, url: impl Into<String>, image: RgbaImage) {
        self.images.borrow_mut().insert(url.into(), image);
    }

    /// Serve raw `bytes` (fonts, undecoded files) for `url`.
    pub fn insert_bytes(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.bytes.borrow_mut().insert(url.into(), bytes);
    }
}

#[async_trait(?Send)]
impl AssetLoader for MemoryAssetLoader {
    async fn load_bytes(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        self.bytes
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| ImageLoadError::NotFound {
                url: url.to_string(),
            })
    }

    async fn load_image(&self, url: &str) -> Result<RgbaImage, ImageLoadError> {
        if let Some(image) = self.images.borrow().get(url) {
            return Ok(image.clone());
        }
        let bytes = self.load_bytes(url).await?;
        decode_image(url, &bytes)
    }
}

/// Decoded-image cache shared by transitions and scene decoding.
pub struct AssetCache {
    loader: Rc<dyn AssetLoader>,
    images: RefCell<HashMap<String, Rc<RgbaImage>>>,
}

impl AssetCache {
    pub fn new(loader: Rc<dyn AssetLoader>) -> Self {
        Self {
            loader,
            images: RefCell::new(HashMap::new()),
        }
    }

    /// The loader behind the cache, for uncached byte loads.
    pub fn loader(&self) -> &Rc<dyn AssetLoader> {
        &self.loader
    }

    /// Load an image, reusing a previous successful decode. Failures are not cached.
    pub async fn image(&self, url: &str) -> Result<Rc<RgbaImage>, ImageLoadError> {
        if let Some(hit) = self.images.borrow().get(url) {
            return Ok(Rc::clone(hit));
        }

        let loaded = Rc::new(self.loader.load_image(url).await?);
        self.images
            .borrow_mut()
            .insert(url.to_string(), Rc::clone(&loaded));
        Ok(loaded)
    }

    /// Seed the cache, e.g. with an image the user just uploaded.
    pub fn insert(&self, url: impl Into<String>, image: Rc<RgbaImage>) {
        self.images.borrow_mut().insert(url.into(), image);
    }

    /// Number of decoded images held.
    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }

    /// Forget every cached image. Later loads go back to the loader.
    pub fn clear(&self) {
        self.images.borrow_mut().clear();
    }
}

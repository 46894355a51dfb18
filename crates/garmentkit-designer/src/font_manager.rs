use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::Font;
use std::{cell::RefCell, collections::HashMap, fs, rc::Rc, sync::OnceLock};

/// Where a custom font comes from.
#[derive(Debug, Clone)]
pub enum FontSource {
    Bytes(Vec<u8>),
    Url(String),
}

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        db
    })
}

/// Font families installed on the host.
pub fn list_system_families() -> Vec<String> {
    let mut out: Vec<String> = db()
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect();
    out.sort();
    out.dedup();
    out
}

fn load_font_from_system(family: &str) -> Option<Font<'static>> {
    let families: Vec<Family<'_>> = match family.trim() {
        "" | "Sans" => vec![Family::SansSerif],
        "Serif" => vec![Family::Serif],
        "Monospace" => vec![Family::Monospace],
        other => vec![Family::Name(other)],
    };

    let query = Query {
        families: &families,
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };

    let id = db().query(&query)?;
    let face = db().face(id)?;

    match &face.source {
        fontdb::Source::File(path) | fontdb::Source::SharedFile(path, _) => {
            let bytes = fs::read(path).ok()?;
            Font::try_from_vec(bytes)
        }
        fontdb::Source::Binary(bytes) => Font::try_from_vec(bytes.as_ref().as_ref().to_vec()),
    }
}

/// Fonts available to text rendering.
///
/// Registered families win, then the host's fonts, then the default family.
/// When nothing resolves, text is laid out but no glyphs are drawn.
pub struct FontRegistry {
    registered: HashMap<String, Rc<Font<'static>>>,
    default_family: String,
    system: RefCell<HashMap<String, Option<Rc<Font<'static>>>>>,
}

impl FontRegistry {
    pub fn new(default_family: impl Into<String>) -> Self {
        Self {
            registered: HashMap::new(),
            default_family: default_family.into(),
            system: RefCell::new(HashMap::new()),
        }
    }

    /// Family used for new text and as the fallback.
    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Register a family from font file bytes. Returns `false` if the bytes
    /// are not a usable font.
    pub fn register_bytes(&mut self, family: impl Into<String>, bytes: Vec<u8>) -> bool {
        let family = family.into();
        match Font::try_from_vec(bytes) {
            Some(font) => {
                tracing::debug!("Registered font family '{}'", family);
                self.registered.insert(family, Rc::new(font));
                true
            }
            None => {
                tracing::warn!("Font data for '{}' could not be parsed", family);
                false
            }
        }
    }

    pub fn is_registered(&self, family: &str) -> bool {
        self.registered.contains_key(family)
    }

    /// Registered family names, sorted.
    pub fn registered_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.registered.keys().cloned().collect();
        families.sort();
        families
    }

    fn system_font(&self, family: &str) -> Option<Rc<Font<'static>>> {
        if let Some(cached) = self.system.borrow().get(family) {
            return cached.clone();
        }
        let loaded = load_font_from_system(family).map(Rc::new);
        self.system
            .borrow_mut()
            .insert(family.to_string(), loaded.clone());
        loaded
    }

    /// Font to draw `family` with.
    pub fn resolve(&self, family: &str) -> Option<Rc<Font<'static>>> {
        if let Some(font) = self.registered.get(family) {
            return Some(Rc::clone(font));
        }
        if let Some(font) = self.system_font(family) {
            return Some(font);
        }
        if family != self.default_family {
            if let Some(font) = self.registered.get(&self.default_family) {
                return Some(Rc::clone(font));
            }
            if let Some(font) = self.system_font(&self.default_family) {
                return Some(font);
            }
        }
        tracing::debug!("No font available for '{}'", family);
        None
    }
}

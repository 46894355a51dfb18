//! # GarmentKit Core
//!
//! Core types, traits, and utilities for GarmentKit.
//! Provides the variant identity types, the error taxonomy, the event bus
//! and unit conversion shared by the settings and designer crates.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod units;

pub use data::{Side, Variant, VariantKey};

pub use error::{
    CaptureError, DeserializationError, Error, GeometryError, ImageLoadError, Result,
};

pub use event_bus::{
    DesignEvent, DesignerEvent, EventBus, EventBusConfig, EventCategory, EventFilter, JournalEntry,
    HistoryEvent, SubscriptionId, TransitionEvent,
};


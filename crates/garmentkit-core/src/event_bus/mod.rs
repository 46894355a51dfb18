//! # Event Bus Module
//!
//! Decoupled notifications from a designer session to whatever hosts it
//! (toolbar state, autosave, analytics).
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by category and receive events of interest
//! - Supports both sync handlers and async `broadcast` receivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use garmentkit_core::event_bus::{DesignerEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::History]),
//!     |event| tracing::info!("{}", event.description()),
//! );
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;

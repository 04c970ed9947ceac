//! Domain types shared across Cadenza crates

mod item;

pub use item::{ContentLocator, ItemId, PlayableItem};

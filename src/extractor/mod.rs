// src/extractor/mod.rs

pub mod fields;
pub mod flight;
pub mod listing;
pub mod timezone;
pub mod variant;

pub use flight::FlightRecordBuilder;
pub use timezone::UtcConversion;
pub use variant::{FieldSlot, VariantConfig};

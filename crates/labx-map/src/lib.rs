//! Customer mapping configuration for the lab exchange engine.
//!
//! A [`CustomerProfile`] bundles the two read-only tables every exchange call
//! consults: the [`FieldMap`] (internal fields to external nodes, per record
//! level) and the [`ComponentMap`] (customer alias pairs to internal
//! analysis/component, with priority tiers and value translations).

#![deny(unsafe_code)]

pub mod component_map;
pub mod error;
pub mod field_map;
pub mod profile;
pub mod repository;

pub use component_map::{ComponentMap, ComponentMapEntry, PRIMARY_ORDER, ValueMapping};
pub use error::MappingError;
pub use field_map::{FieldMap, FieldMapEntry, is_valid_node_name};
pub use profile::{CustomerProfile, ProfileCatalog};
pub use repository::{ProfileMetadata, ProfileRepository, StoredProfile};

// crates/suitebase-db/src/lib.rs
// ============================================================================
// Module: Suitebase Database
// Description: Database contract, suite expansion, and composite databases.
// Purpose: Resolve test, resource, and suite ids against pluggable stores.
// Dependencies: serde, serde_json, suitebase-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate turns stored items into answers:
//! - [`Database`] is the lookup contract; its default methods implement
//!   presence checks, generic retrieval, and suite expansion.
//! - [`StoreDatabase`] adapts a raw [`StorageBackend`];
//!   [`MemoryDatabase`] is the in-process reference store.
//! - [`MountDatabase`] federates stores under mount points.
//! - [`ParameterDatabase`] expands tests into parametrized variants.
//!
//! Invariants:
//! - Databases are `Send + Sync` and safe to share between threads.
//! - Not-found errors always name ids relative to the answering database.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod database;
pub mod error;
pub mod item;
pub mod memory;
pub mod mount;
pub mod observer;
pub mod parameter;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use database::Database;
pub use database::ExpandedIds;
pub use database::collect_suite_members;
pub use error::DatabaseError;
pub use item::Item;
pub use item::ItemDescriptor;
pub use item::ItemKind;
pub use item::Prerequisite;
pub use item::ResourceDescriptor;
pub use item::Suite;
pub use item::TestDescriptor;
pub use memory::Manifest;
pub use memory::MemoryDatabase;
pub use memory::MemoryStore;
pub use mount::MountDatabase;
pub use observer::DatabaseObserver;
pub use observer::LookupEvent;
pub use observer::LookupOutcome;
pub use observer::NoopObserver;
pub use parameter::ParameterDatabase;
pub use parameter::ParameterSet;
pub use parameter::ParameterSource;
pub use parameter::StaticParameters;
pub use store::StorageBackend;
pub use store::StoreDatabase;
pub use store::StoredItem;
pub use store::SuiteElement;

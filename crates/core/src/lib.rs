//! # PMS Core
//!
//! Core business logic for the patient management system.
//!
//! This crate contains pure data operations over a flat-file patient store:
//! - Patient record model with derived health metrics (BMI, verdict)
//! - Partial-edit overlay with explicit per-field presence tracking
//! - Whole-collection store access behind the [`PatientStore`] seam
//! - Registry operations (list, get, sort, create, update, delete)
//!
//! **No API concerns**: HTTP servers, wire formats, or CLI interfaces belong
//! in `api-rest` and `pms-cli`.

pub mod config;
pub mod error;
pub mod patient;
pub mod registry;
pub mod store;

pub use config::CoreConfig;
pub use error::{RegistryError, RegistryResult};
pub use patient::{Gender, Patch, Patient, PatientPatch, StoredRecord, Verdict};
pub use registry::{RegistryService, SortKey, SortOrder};
pub use store::{InMemoryStore, JsonFileStore, PatientStore, Store};

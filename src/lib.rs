//! Modelbase SDK: model-driven persistence and schema metadata over SQLite.
//!
//! One `Registry` per named entity turns a declarative `ModelDescriptor`
//! into a relational table, keeps that table additively in sync, runs a
//! reversible modifier pipeline on reads and writes, and exposes generic
//! CRUD plus the typedef/query/mutation fragments an external schema
//! builder consumes.

pub mod error;
pub mod mapper;
pub mod model;
pub mod modifier;
pub mod registry;
pub mod router;
pub mod schema;
pub mod sql;
pub mod sync;
pub mod validation;

pub use error::{ModelError, ModifierError, RegistryError};
pub use model::{
    validate, ApiType, FieldKind, FieldSpec, FieldTable, HistoryMode, ModelDescriptor, ModelSet,
    ModifierSpec, PhysicalType, ScalarType, StorageField, ValidationRule,
};
pub use modifier::{Encrypt, JsonCodec, Modifier};
pub use registry::{Ref, Registry};
pub use router::{Method, Router};
pub use schema::build_document;
pub use sync::SchemaOp;

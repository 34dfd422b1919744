//! Configuration compilation engine and validation pipeline
//!
//! Turns a user's declarative visual-encoding intent (field-to-channel
//! assignments, aggregations, filters, custom settings) into a validated,
//! backend-specific [`FactoryConfig`]. Compilation and validation are
//! independent: [`validate`] accepts hand-built configs too.

pub mod assignment;
pub mod compiler;
pub mod validate;

pub use assignment::{
    AggregateOp, AggregationSettings, FieldAssignment, FieldRef, FilterOp, FilterRule,
    SemanticType,
};
pub use compiler::{compile, FactoryConfig};
pub use validate::{
    validate, ValidationError, ValidationResult, ValidationWarning, WarningSeverity,
};

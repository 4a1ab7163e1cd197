//! `academy-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, write acknowledgements and the lenient
//! numeric coercion used for client-supplied documents.

pub mod ack;
pub mod entity;
pub mod error;
pub mod id;
pub mod numeric;

pub use ack::{DeleteAck, InsertAck, UpdateAck};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ClassId, EnrollmentId, InstructorId, SelectionId, UserId};

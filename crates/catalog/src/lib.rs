//! Class catalog domain module.
//!
//! Business rules for class offerings and the instructor directory, implemented
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod class;
pub mod instructor;

pub use class::{ClassChange, ClassDraft, ClassOffering, ClassPatch, ClassStatus};
pub use instructor::{InstructorProfile, rank_by_popularity};

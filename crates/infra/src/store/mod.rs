//! Document store abstractions.
//!
//! One trait per logical collection. [`Stores`] bundles typed handles to all
//! of them and is created once at process start, then handed to every request
//! handler.
//!
//! ## Backends
//!
//! - [`InMemoryStore`]: a single process-local state behind one lock (dev/test).
//! - [`PostgresStore`]: SQLx connection pool; the pool is shared by all handlers.
//!
//! Both implement the enrollment move as a single atomic step: either the
//! enrollment is inserted, the selection deleted and the seat taken, or none
//! of it happens.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use academy_auth::{Role, User};
use academy_catalog::{ClassChange, ClassOffering, InstructorProfile};
use academy_core::{ClassId, DeleteAck, InsertAck, SelectionId, UpdateAck, UserId};
use academy_enrollment::{Enrollment, EnrollmentReceipt, EnrollmentRejection, SelectedCourse};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Persistence-layer failure.
///
/// These are **infrastructure errors** as opposed to domain errors; the HTTP
/// layer reports all of them as a server error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the enrollment move.
#[derive(Debug, Error)]
pub enum EnrollError {
    #[error(transparent)]
    Rejected(#[from] EnrollmentRejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert unless a user with the same email exists. `None` means it did.
    async fn insert_if_absent(&self, user: User) -> StoreResult<Option<InsertAck>>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn list_by_role(&self, role: &Role) -> StoreResult<Vec<User>>;

    async fn promote(&self, id: UserId, role: Role) -> StoreResult<UpdateAck>;
}

#[async_trait]
pub trait ClassStore: Send + Sync {
    async fn insert(&self, class: ClassOffering) -> StoreResult<InsertAck>;

    async fn get(&self, id: ClassId) -> StoreResult<Option<ClassOffering>>;

    async fn list(&self) -> StoreResult<Vec<ClassOffering>>;

    async fn list_by_instructor(&self, email: &str) -> StoreResult<Vec<ClassOffering>>;

    /// Apply a (validated) change. A missing class yields an unmatched ack.
    async fn update(&self, id: ClassId, change: &ClassChange) -> StoreResult<UpdateAck>;
}

#[async_trait]
pub trait InstructorStore: Send + Sync {
    async fn insert(&self, profile: InstructorProfile) -> StoreResult<InsertAck>;

    async fn list(&self) -> StoreResult<Vec<InstructorProfile>>;
}

#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn insert(&self, selection: SelectedCourse) -> StoreResult<InsertAck>;

    async fn get(&self, id: SelectionId) -> StoreResult<Option<SelectedCourse>>;

    async fn list_by_email(&self, email: &str) -> StoreResult<Vec<SelectedCourse>>;

    async fn delete(&self, id: SelectionId) -> StoreResult<DeleteAck>;
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Enrollments of one student, newest first.
    async fn list_by_email(&self, email: &str) -> StoreResult<Vec<Enrollment>>;

    /// Atomically insert `enrollment`, delete its selection and take one seat
    /// of its class.
    async fn enroll(&self, enrollment: Enrollment) -> Result<EnrollmentReceipt, EnrollError>;
}

/// Typed handles to every collection.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub classes: Arc<dyn ClassStore>,
    pub instructors: Arc<dyn InstructorStore>,
    pub selections: Arc<dyn SelectionStore>,
    pub enrollments: Arc<dyn EnrollmentStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::new()))
    }

    /// Connect to Postgres and make sure the schema exists.
    pub async fn postgres(database_url: &str) -> StoreResult<Self> {
        let store = PostgresStore::connect(database_url).await?;
        store.ensure_schema().await?;
        Ok(Self::from_backend(Arc::new(store)))
    }

    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + ClassStore + InstructorStore + SelectionStore + EnrollmentStore + 'static,
    {
        Self {
            users: backend.clone(),
            classes: backend.clone(),
            instructors: backend.clone(),
            selections: backend.clone(),
            enrollments: backend,
        }
    }
}

impl core::fmt::Debug for Stores {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

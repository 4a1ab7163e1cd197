//! Infrastructure layer: document stores, payment processor, configuration.

pub mod bootstrap;
pub mod config;
pub mod payments;
pub mod store;

pub use bootstrap::{BootstrapError, ensure_admin};
pub use config::{AppConfig, ConfigError};
pub use payments::{DisabledGateway, PaymentError, PaymentGateway, PaymentIntent, StripeGateway};
pub use store::{
    ClassStore, EnrollError, EnrollmentStore, InMemoryStore, InstructorStore, PostgresStore, SelectionStore,
    StoreError, StoreResult, Stores, UserStore,
};

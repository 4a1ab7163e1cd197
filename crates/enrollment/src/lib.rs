//! Enrollment domain module.
//!
//! A student's path from cart to seat: a [`SelectedCourse`] is paid for,
//! becomes an immutable [`Enrollment`], and consumes one seat of its class.
//! The store adapters execute that move atomically; the rules for when it is
//! allowed live here.

pub mod enrollment;
pub mod payment;
pub mod selection;

pub use enrollment::{Enrollment, EnrollmentReceipt, EnrollmentRejection, PaymentRecord, check_enrollment};
pub use payment::{PaymentIntentRequest, CURRENCY, amount_in_cents};
pub use selection::{NewSelection, SelectedCourse};

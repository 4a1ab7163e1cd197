use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use academy_catalog::ClassOffering;
use academy_core::numeric::lenient;
use academy_core::{ClassId, DeleteAck, DomainError, DomainResult, EnrollmentId, Entity, InsertAck, SelectionId, UpdateAck};

use crate::SelectedCourse;

/// Field names owned by [`Enrollment`]; never copied from payment details.
const RESERVED_FIELDS: [&str; 7] = [
    "_id",
    "email",
    "classId",
    "selectionId",
    "transactionId",
    "price",
    "date",
];

/// Payment confirmation posted by the client after a successful charge.
///
/// `_id` is the id of the cart entry that was paid for. Any other fields
/// (class name, picture, processor metadata) are kept as free-form details.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "_id")]
    pub selection_id: SelectionId,
    pub email: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Append-only record of a completed purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: EnrollmentId,
    pub email: String,
    pub class_id: ClassId,
    pub selection_id: SelectionId,
    pub transaction_id: Option<String>,
    pub price: Option<f64>,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Enrollment {
    /// Build the enrollment for a payment against `class_id`.
    ///
    /// The payment date defaults to `now` when the client did not send one.
    pub fn record(
        id: EnrollmentId,
        class_id: ClassId,
        payment: PaymentRecord,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if payment.email.trim().is_empty() {
            return Err(DomainError::validation("payment email cannot be empty"));
        }

        let mut details = payment.details;
        for key in RESERVED_FIELDS {
            details.remove(key);
        }

        Ok(Self {
            id,
            email: payment.email,
            class_id,
            selection_id: payment.selection_id,
            transaction_id: payment.transaction_id,
            price: payment.price,
            date: payment.date.unwrap_or(now),
            details,
        })
    }
}

impl Entity for Enrollment {
    type Id = EnrollmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Why an enrollment was refused. Nothing is written in any of these cases.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnrollmentRejection {
    #[error("selection {0} not found")]
    SelectionNotFound(SelectionId),

    #[error("class {0} not found")]
    ClassNotFound(ClassId),

    #[error("selection does not match this enrollment: {0}")]
    SelectionMismatch(&'static str),
}

/// Preconditions for moving a selection into an enrollment.
///
/// Store adapters call this with the selection and class they loaded inside
/// the same transaction that performs the writes.
pub fn check_enrollment(
    enrollment: &Enrollment,
    selection: Option<&SelectedCourse>,
    class: Option<&ClassOffering>,
) -> Result<(), EnrollmentRejection> {
    let selection = selection.ok_or(EnrollmentRejection::SelectionNotFound(enrollment.selection_id))?;
    if selection.email != enrollment.email {
        return Err(EnrollmentRejection::SelectionMismatch("selection belongs to another user"));
    }
    if selection.class_id != enrollment.class_id {
        return Err(EnrollmentRejection::SelectionMismatch("selection is for a different class"));
    }
    if class.is_none() {
        return Err(EnrollmentRejection::ClassNotFound(enrollment.class_id));
    }
    Ok(())
}

/// Composite acknowledgement of a committed enrollment, one entry per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentReceipt {
    pub insert_result: InsertAck,
    pub delete_result: DeleteAck,
    pub update_result: UpdateAck,
}

impl EnrollmentReceipt {
    pub fn committed(enrollment_id: EnrollmentId) -> Self {
        Self {
            insert_result: InsertAck::new(enrollment_id),
            delete_result: DeleteAck::new(true),
            update_result: UpdateAck::matched(true),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use academy_core::numeric::lenient;
use academy_core::{ClassId, DomainError, DomainResult, Entity};

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Review status of a class offering.
///
/// New and instructor-revised classes are always `Pending`. Approvers may set
/// any text; unknown values are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClassStatus {
    Pending,
    Approved,
    Denied,
    Other(String),
}

impl ClassStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClassStatus::Pending => "pending",
            ClassStatus::Approved => "approved",
            ClassStatus::Denied => "denied",
            ClassStatus::Other(s) => s,
        }
    }
}

impl From<String> for ClassStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => ClassStatus::Pending,
            "approved" => ClassStatus::Approved,
            "denied" => ClassStatus::Denied,
            _ => ClassStatus::Other(value),
        }
    }
}

impl From<ClassStatus> for String {
    fn from(value: ClassStatus) -> Self {
        match value {
            ClassStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl core::fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Class offering
// ─────────────────────────────────────────────────────────────────────────────

/// A class that students can select and pay for.
///
/// # Invariants
/// - `instructor_email` is the owner and never changes after creation.
/// - `available_seats` has no floor; concurrent purchases may drive it negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOffering {
    #[serde(rename = "_id")]
    pub id: ClassId,
    pub name: String,
    pub class_picture: Option<String>,
    pub instructor_name: String,
    pub instructor_email: String,
    pub price: f64,
    pub available_seats: i64,
    pub status: ClassStatus,
    pub created_at: DateTime<Utc>,
    pub feedback: Option<String>,
}

/// Body of a class creation request.
///
/// `price` and `availableSeats` accept numbers or decimal strings. Any status
/// or owner supplied by the client is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    pub name: String,
    #[serde(default)]
    pub class_picture: Option<String>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(deserialize_with = "lenient::price")]
    pub price: f64,
    #[serde(deserialize_with = "lenient::seats")]
    pub available_seats: i64,
}

/// Partial update of a class. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class_picture: Option<String>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_seats")]
    pub available_seats: Option<i64>,
    #[serde(default)]
    pub status: Option<ClassStatus>,
}

/// A change applied to a stored class by one of the update routes.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassChange {
    /// Approver edit: any field, status taken as given.
    Review(ClassPatch),
    /// Owner edit: content fields only, status goes back to pending.
    Revise(ClassPatch),
    /// Approver feedback text.
    Feedback(String),
}

impl ClassOffering {
    pub fn create(
        id: ClassId,
        draft: ClassDraft,
        instructor_email: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_name(&draft.name)?;
        ensure_price(draft.price)?;

        Ok(Self {
            id,
            name: draft.name,
            class_picture: draft.class_picture,
            instructor_name: draft.instructor_name.unwrap_or_default(),
            instructor_email: instructor_email.into(),
            price: draft.price,
            available_seats: draft.available_seats,
            status: ClassStatus::Pending,
            created_at: now,
            feedback: None,
        })
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.instructor_email == email
    }

    /// Consume one seat for a completed purchase.
    pub fn take_seat(&mut self) {
        self.available_seats -= 1;
    }

    /// Apply a change. Returns whether any field actually changed.
    ///
    /// Call [`ClassChange::validate`] first; invalid values are applied as-is.
    pub fn apply(&mut self, change: &ClassChange) -> bool {
        let before = self.clone();
        match change {
            ClassChange::Review(patch) => {
                self.apply_content(patch);
                if let Some(status) = &patch.status {
                    self.status = status.clone();
                }
            }
            ClassChange::Revise(patch) => {
                self.apply_content(patch);
                self.status = ClassStatus::Pending;
            }
            ClassChange::Feedback(text) => {
                self.feedback = Some(text.clone());
            }
        }
        *self != before
    }

    fn apply_content(&mut self, patch: &ClassPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(picture) = &patch.class_picture {
            self.class_picture = Some(picture.clone());
        }
        if let Some(instructor_name) = &patch.instructor_name {
            self.instructor_name = instructor_name.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(seats) = patch.available_seats {
            self.available_seats = seats;
        }
    }
}

impl ClassChange {
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            ClassChange::Review(patch) | ClassChange::Revise(patch) => {
                if let Some(name) = &patch.name {
                    ensure_name(name)?;
                }
                if let Some(price) = patch.price {
                    ensure_price(price)?;
                }
                Ok(())
            }
            ClassChange::Feedback(_) => Ok(()),
        }
    }
}

fn ensure_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("class name cannot be empty"));
    }
    Ok(())
}

fn ensure_price(price: f64) -> DomainResult<()> {
    if price < 0.0 {
        return Err(DomainError::validation("price cannot be negative"));
    }
    Ok(())
}

impl Entity for ClassOffering {
    type Id = ClassId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

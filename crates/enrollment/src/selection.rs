use serde::{Deserialize, Serialize};

use academy_catalog::ClassOffering;
use academy_core::{ClassId, Entity, SelectionId};

/// A pending cart entry linking a student to a class.
///
/// Class fields are copied at selection time so the cart renders without a
/// second lookup. Lifecycle: `selected → (enrolled | removed)`, both terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCourse {
    #[serde(rename = "_id")]
    pub id: SelectionId,
    pub email: String,
    pub class_id: ClassId,
    pub name: String,
    pub class_picture: Option<String>,
    pub instructor_name: String,
    pub instructor_email: String,
    pub price: f64,
}

/// Body of a selection request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSelection {
    pub email: String,
    pub class_id: ClassId,
}

impl SelectedCourse {
    pub fn select(id: SelectionId, email: impl Into<String>, class: &ClassOffering) -> Self {
        Self {
            id,
            email: email.into(),
            class_id: class.id,
            name: class.name.clone(),
            class_picture: class.class_picture.clone(),
            instructor_name: class.instructor_name.clone(),
            instructor_email: class.instructor_email.clone(),
            price: class.price,
        }
    }
}

impl Entity for SelectedCourse {
    type Id = SelectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use serde::{Deserialize, Serialize};

use academy_core::{Entity, InstructorId};

/// Entry of the public instructor directory ("popular instructors").
///
/// The directory is curated outside the API; the server only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorProfile {
    #[serde(rename = "_id")]
    pub id: InstructorId,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub number_of_students: i64,
}

impl Entity for InstructorProfile {
    type Id = InstructorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Most students first; ties keep their original order.
pub fn rank_by_popularity(mut profiles: Vec<InstructorProfile>) -> Vec<InstructorProfile> {
    profiles.sort_by(|a, b| b.number_of_students.cmp(&a.number_of_students));
    profiles
}

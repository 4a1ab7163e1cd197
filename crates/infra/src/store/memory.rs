use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use academy_auth::{Role, User};
use academy_catalog::{ClassChange, ClassOffering, InstructorProfile};
use academy_core::{
    ClassId, DeleteAck, EnrollmentId, Entity, InsertAck, InstructorId, SelectionId, UpdateAck, UserId,
};
use academy_enrollment::{Enrollment, EnrollmentReceipt, SelectedCourse, check_enrollment};

use super::{
    ClassStore, EnrollError, EnrollmentStore, InstructorStore, SelectionStore, StoreError, StoreResult,
    UserStore,
};

/// All collections of the in-memory backend.
///
/// Ids are UUIDv7, so `BTreeMap` iteration order is creation order.
#[derive(Debug, Default)]
struct Collections {
    users: BTreeMap<UserId, User>,
    classes: BTreeMap<ClassId, ClassOffering>,
    instructors: BTreeMap<InstructorId, InstructorProfile>,
    selections: BTreeMap<SelectionId, SelectedCourse>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
}

/// In-memory document store for tests/dev.
///
/// Every collection sits behind the same lock, which is what makes the
/// enrollment move atomic here.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

fn insert_entity<E>(collection: &mut BTreeMap<E::Id, E>, entity: E) -> StoreResult<InsertAck>
where
    E: Entity,
    E::Id: core::fmt::Display,
{
    let id = *entity.id();
    if collection.contains_key(&id) {
        return Err(StoreError::Conflict(format!("id {id} already exists")));
    }
    collection.insert(id, entity);
    Ok(InsertAck::new(id))
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_if_absent(&self, user: User) -> StoreResult<Option<InsertAck>> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Ok(None);
        }
        insert_entity(&mut state.users, user).map(Some)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn list_by_role(&self, role: &Role) -> StoreResult<Vec<User>> {
        let state = self.read()?;
        Ok(state.users.values().filter(|u| u.has_role(role)).cloned().collect())
    }

    async fn promote(&self, id: UserId, role: Role) -> StoreResult<UpdateAck> {
        let mut state = self.write()?;
        Ok(match state.users.get_mut(&id) {
            Some(user) => UpdateAck::matched(user.promote(role)),
            None => UpdateAck::unmatched(),
        })
    }
}

#[async_trait]
impl ClassStore for InMemoryStore {
    async fn insert(&self, class: ClassOffering) -> StoreResult<InsertAck> {
        insert_entity(&mut self.write()?.classes, class)
    }

    async fn get(&self, id: ClassId) -> StoreResult<Option<ClassOffering>> {
        Ok(self.read()?.classes.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<ClassOffering>> {
        Ok(self.read()?.classes.values().cloned().collect())
    }

    async fn list_by_instructor(&self, email: &str) -> StoreResult<Vec<ClassOffering>> {
        let state = self.read()?;
        Ok(state
            .classes
            .values()
            .filter(|c| c.is_owned_by(email))
            .cloned()
            .collect())
    }

    async fn update(&self, id: ClassId, change: &ClassChange) -> StoreResult<UpdateAck> {
        let mut state = self.write()?;
        Ok(match state.classes.get_mut(&id) {
            Some(class) => UpdateAck::matched(class.apply(change)),
            None => UpdateAck::unmatched(),
        })
    }
}

#[async_trait]
impl InstructorStore for InMemoryStore {
    async fn insert(&self, profile: InstructorProfile) -> StoreResult<InsertAck> {
        insert_entity(&mut self.write()?.instructors, profile)
    }

    async fn list(&self) -> StoreResult<Vec<InstructorProfile>> {
        Ok(self.read()?.instructors.values().cloned().collect())
    }
}

#[async_trait]
impl SelectionStore for InMemoryStore {
    async fn insert(&self, selection: SelectedCourse) -> StoreResult<InsertAck> {
        insert_entity(&mut self.write()?.selections, selection)
    }

    async fn get(&self, id: SelectionId) -> StoreResult<Option<SelectedCourse>> {
        Ok(self.read()?.selections.get(&id).cloned())
    }

    async fn list_by_email(&self, email: &str) -> StoreResult<Vec<SelectedCourse>> {
        let state = self.read()?;
        Ok(state
            .selections
            .values()
            .filter(|s| s.email == email)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: SelectionId) -> StoreResult<DeleteAck> {
        let removed = self.write()?.selections.remove(&id);
        Ok(DeleteAck::new(removed.is_some()))
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    async fn list_by_email(&self, email: &str) -> StoreResult<Vec<Enrollment>> {
        let state = self.read()?;
        let mut found: Vec<Enrollment> = state
            .enrollments
            .values()
            .filter(|e| e.email == email)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(found)
    }

    async fn enroll(&self, enrollment: Enrollment) -> Result<EnrollmentReceipt, EnrollError> {
        let mut state = self.write()?;

        check_enrollment(
            &enrollment,
            state.selections.get(&enrollment.selection_id),
            state.classes.get(&enrollment.class_id),
        )?;

        let id = enrollment.id;
        let selection_id = enrollment.selection_id;
        let class_id = enrollment.class_id;

        insert_entity(&mut state.enrollments, enrollment)?;
        state.selections.remove(&selection_id);
        if let Some(class) = state.classes.get_mut(&class_id) {
            class.take_seat();
        }

        Ok(EnrollmentReceipt::committed(id))
    }
}

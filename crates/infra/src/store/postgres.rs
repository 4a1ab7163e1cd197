//! Postgres-backed document store.
//!
//! One table per collection (see `schema.sql`). Enrollment payment metadata
//! that has no column of its own is kept in a `jsonb` column.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | ColumnDecode / Decode | N/A | `Corrupt` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use academy_auth::{Role, User};
use academy_catalog::{ClassChange, ClassOffering, ClassStatus, InstructorProfile};
use academy_core::{
    ClassId, DeleteAck, EnrollmentId, InsertAck, InstructorId, SelectionId, UpdateAck, UserId,
};
use academy_enrollment::{Enrollment, EnrollmentReceipt, SelectedCourse, check_enrollment};

use super::{
    ClassStore, EnrollError, EnrollmentStore, InstructorStore, SelectionStore, StoreError, StoreResult,
    UserStore,
};

const SCHEMA: &str = include_str!("schema.sql");

const MAX_CONNECTIONS: u32 = 10;

const USER_COLUMNS: &str = "id, email, name, photo_url, role";
const CLASS_COLUMNS: &str = "id, name, class_picture, instructor_name, instructor_email, price, \
                             available_seats, status, created_at, feedback";
const INSTRUCTOR_COLUMNS: &str = "id, name, email, image, number_of_students";
const SELECTION_COLUMNS: &str =
    "id, email, class_id, name, class_picture, instructor_name, instructor_email, price";
const ENROLLMENT_COLUMNS: &str =
    "id, email, class_id, selection_id, transaction_id, price, date, details";

/// Postgres-backed store for every collection.
///
/// Uses a SQLx connection pool, so one instance is shared by all handlers.
/// Multi-row writes run inside a single transaction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    #[instrument(skip_all, err)]
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(email = %user.email, inserted = tracing::field::Empty), err)]
    async fn insert_if_absent(&self, user: User) -> StoreResult<Option<InsertAck>> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, photo_url, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(user.name.as_deref())
        .bind(user.photo_url.as_deref())
        .bind(user.role.as_ref().map(Role::as_str))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        let inserted = result.rows_affected() > 0;
        Span::current().record("inserted", inserted);
        Ok(inserted.then(|| InsertAck::new(user.id)))
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(role = %role), err)]
    async fn list_by_role(&self, role: &Role) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id"
        ))
        .bind(role.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users_by_role", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %id, role = %role), err)]
    async fn promote(&self, id: UserId, role: Role) -> StoreResult<UpdateAck> {
        let row = sqlx::query(
            r#"
            WITH target AS (
                SELECT id, role FROM users WHERE id = $1 FOR UPDATE
            ),
            updated AS (
                UPDATE users u SET role = $2
                FROM target t
                WHERE u.id = t.id AND t.role IS DISTINCT FROM $2
                RETURNING u.id
            )
            SELECT
                (SELECT COUNT(*) FROM target) AS matched,
                (SELECT COUNT(*) FROM updated) AS modified
            "#,
        )
        .bind(id.as_uuid())
        .bind(role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("promote_user", e))?;

        let matched: i64 = row.try_get("matched").map_err(corrupt)?;
        let modified: i64 = row.try_get("modified").map_err(corrupt)?;
        Ok(if matched == 0 {
            UpdateAck::unmatched()
        } else {
            UpdateAck::matched(modified > 0)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ClassStore for PostgresStore {
    #[instrument(skip(self, class), fields(class_id = %class.id), err)]
    async fn insert(&self, class: ClassOffering) -> StoreResult<InsertAck> {
        sqlx::query(&format!(
            "INSERT INTO classes ({CLASS_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(class.id.as_uuid())
        .bind(&class.name)
        .bind(class.class_picture.as_deref())
        .bind(&class.instructor_name)
        .bind(&class.instructor_email)
        .bind(class.price)
        .bind(class.available_seats)
        .bind(class.status.as_str())
        .bind(class.created_at)
        .bind(class.feedback.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_class", e))?;

        Ok(InsertAck::new(class.id))
    }

    #[instrument(skip(self), fields(class_id = %id), err)]
    async fn get(&self, id: ClassId) -> StoreResult<Option<ClassOffering>> {
        let row = sqlx::query(&format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_class", e))?;

        row.as_ref().map(class_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<ClassOffering>> {
        let rows = sqlx::query(&format!("SELECT {CLASS_COLUMNS} FROM classes ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_classes", e))?;

        rows.iter().map(class_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_by_instructor(&self, email: &str) -> StoreResult<Vec<ClassOffering>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE instructor_email = $1 ORDER BY id"
        ))
        .bind(email)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_classes_by_instructor", e))?;

        rows.iter().map(class_from_row).collect()
    }

    /// Read-modify-write under a row lock, so the domain rules in
    /// [`ClassOffering::apply`] decide what changes.
    #[instrument(skip(self, change), fields(class_id = %id), err)]
    async fn update(&self, id: ClassId, change: &ClassChange) -> StoreResult<UpdateAck> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_class", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(UpdateAck::unmatched());
        };

        let mut class = class_from_row(&row)?;
        if !class.apply(change) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(UpdateAck::matched(false));
        }

        sqlx::query(
            r#"
            UPDATE classes SET
                name = $2,
                class_picture = $3,
                instructor_name = $4,
                price = $5,
                available_seats = $6,
                status = $7,
                feedback = $8
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&class.name)
        .bind(class.class_picture.as_deref())
        .bind(&class.instructor_name)
        .bind(class.price)
        .bind(class.available_seats)
        .bind(class.status.as_str())
        .bind(class.feedback.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_class", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(UpdateAck::matched(true))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instructor directory
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl InstructorStore for PostgresStore {
    #[instrument(skip(self, profile), fields(instructor_id = %profile.id), err)]
    async fn insert(&self, profile: InstructorProfile) -> StoreResult<InsertAck> {
        sqlx::query(&format!(
            "INSERT INTO instructors ({INSTRUCTOR_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
        ))
        .bind(profile.id.as_uuid())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(profile.image.as_deref())
        .bind(profile.number_of_students)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_instructor", e))?;

        Ok(InsertAck::new(profile.id))
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<InstructorProfile>> {
        let rows = sqlx::query(&format!("SELECT {INSTRUCTOR_COLUMNS} FROM instructors ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_instructors", e))?;

        rows.iter().map(instructor_from_row).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selections
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl SelectionStore for PostgresStore {
    #[instrument(skip(self, selection), fields(selection_id = %selection.id), err)]
    async fn insert(&self, selection: SelectedCourse) -> StoreResult<InsertAck> {
        sqlx::query(&format!(
            "INSERT INTO selected_courses ({SELECTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(selection.id.as_uuid())
        .bind(&selection.email)
        .bind(selection.class_id.as_uuid())
        .bind(&selection.name)
        .bind(selection.class_picture.as_deref())
        .bind(&selection.instructor_name)
        .bind(&selection.instructor_email)
        .bind(selection.price)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_selection", e))?;

        Ok(InsertAck::new(selection.id))
    }

    #[instrument(skip(self), fields(selection_id = %id), err)]
    async fn get(&self, id: SelectionId) -> StoreResult<Option<SelectedCourse>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECTION_COLUMNS} FROM selected_courses WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_selection", e))?;

        row.as_ref().map(selection_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_by_email(&self, email: &str) -> StoreResult<Vec<SelectedCourse>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECTION_COLUMNS} FROM selected_courses WHERE email = $1 ORDER BY id"
        ))
        .bind(email)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_selections", e))?;

        rows.iter().map(selection_from_row).collect()
    }

    #[instrument(skip(self), fields(selection_id = %id), err)]
    async fn delete(&self, id: SelectionId) -> StoreResult<DeleteAck> {
        let result = sqlx::query("DELETE FROM selected_courses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_selection", e))?;

        Ok(DeleteAck::new(result.rows_affected() > 0))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enrollments
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl EnrollmentStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_by_email(&self, email: &str) -> StoreResult<Vec<Enrollment>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE email = $1 ORDER BY date DESC"
        ))
        .bind(email)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_enrollments", e))?;

        rows.iter().map(enrollment_from_row).collect()
    }

    /// The selection and then the class are locked `FOR UPDATE` before the
    /// preconditions are checked. Lock order is fixed, so concurrent
    /// enrollments serialize instead of deadlocking.
    #[instrument(
        skip(self, enrollment),
        fields(
            enrollment_id = %enrollment.id,
            selection_id = %enrollment.selection_id,
            class_id = %enrollment.class_id
        ),
        err
    )]
    async fn enroll(&self, enrollment: Enrollment) -> Result<EnrollmentReceipt, EnrollError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let selection = sqlx::query(&format!(
            "SELECT {SELECTION_COLUMNS} FROM selected_courses WHERE id = $1 FOR UPDATE"
        ))
        .bind(enrollment.selection_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_selection", e))?
        .as_ref()
        .map(selection_from_row)
        .transpose()?;

        let class = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1 FOR UPDATE"
        ))
        .bind(enrollment.class_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_class", e))?
        .as_ref()
        .map(class_from_row)
        .transpose()?;

        if let Err(rejection) = check_enrollment(&enrollment, selection.as_ref(), class.as_ref()) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(rejection.into());
        }

        sqlx::query(&format!(
            "INSERT INTO enrollments ({ENROLLMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(enrollment.id.as_uuid())
        .bind(&enrollment.email)
        .bind(enrollment.class_id.as_uuid())
        .bind(enrollment.selection_id.as_uuid())
        .bind(enrollment.transaction_id.as_deref())
        .bind(enrollment.price)
        .bind(enrollment.date)
        .bind(Value::Object(enrollment.details.clone()))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_enrollment", e))?;

        sqlx::query("DELETE FROM selected_courses WHERE id = $1")
            .bind(enrollment.selection_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_selection", e))?;

        sqlx::query("UPDATE classes SET available_seats = available_seats - 1 WHERE id = $1")
            .bind(enrollment.class_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("take_seat", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(EnrollmentReceipt::committed(enrollment.id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: Option<String> = row.try_get("role").map_err(corrupt)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(corrupt)?),
        email: row.try_get("email").map_err(corrupt)?,
        name: row.try_get("name").map_err(corrupt)?,
        photo_url: row.try_get("photo_url").map_err(corrupt)?,
        role: role.map(Role::new),
    })
}

fn class_from_row(row: &PgRow) -> StoreResult<ClassOffering> {
    let status: String = row.try_get("status").map_err(corrupt)?;
    Ok(ClassOffering {
        id: ClassId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        class_picture: row.try_get("class_picture").map_err(corrupt)?,
        instructor_name: row.try_get("instructor_name").map_err(corrupt)?,
        instructor_email: row.try_get("instructor_email").map_err(corrupt)?,
        price: row.try_get("price").map_err(corrupt)?,
        available_seats: row.try_get("available_seats").map_err(corrupt)?,
        status: ClassStatus::from(status),
        created_at: row.try_get("created_at").map_err(corrupt)?,
        feedback: row.try_get("feedback").map_err(corrupt)?,
    })
}

fn instructor_from_row(row: &PgRow) -> StoreResult<InstructorProfile> {
    Ok(InstructorProfile {
        id: InstructorId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        email: row.try_get("email").map_err(corrupt)?,
        image: row.try_get("image").map_err(corrupt)?,
        number_of_students: row.try_get("number_of_students").map_err(corrupt)?,
    })
}

fn selection_from_row(row: &PgRow) -> StoreResult<SelectedCourse> {
    Ok(SelectedCourse {
        id: SelectionId::from_uuid(row.try_get("id").map_err(corrupt)?),
        email: row.try_get("email").map_err(corrupt)?,
        class_id: ClassId::from_uuid(row.try_get("class_id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        class_picture: row.try_get("class_picture").map_err(corrupt)?,
        instructor_name: row.try_get("instructor_name").map_err(corrupt)?,
        instructor_email: row.try_get("instructor_email").map_err(corrupt)?,
        price: row.try_get("price").map_err(corrupt)?,
    })
}

fn enrollment_from_row(row: &PgRow) -> StoreResult<Enrollment> {
    let details = match row.try_get::<Value, _>("details").map_err(corrupt)? {
        Value::Object(map) => map,
        other => {
            return Err(StoreError::Corrupt(format!(
                "enrollment details must be an object, found {other}"
            )));
        }
    };
    Ok(Enrollment {
        id: EnrollmentId::from_uuid(row.try_get("id").map_err(corrupt)?),
        email: row.try_get("email").map_err(corrupt)?,
        class_id: ClassId::from_uuid(row.try_get("class_id").map_err(corrupt)?),
        selection_id: SelectionId::from_uuid(row.try_get("selection_id").map_err(corrupt)?),
        transaction_id: row.try_get("transaction_id").map_err(corrupt)?,
        price: row.try_get("price").map_err(corrupt)?,
        date: row.try_get("date").map_err(corrupt)?,
        details,
    })
}

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if is_unique_violation_code(db_err.code().as_deref()) {
                StoreError::Conflict(format!("{operation}: {}", db_err.message()))
            } else {
                StoreError::Backend {
                    operation,
                    message: db_err.message().to_string(),
                }
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Corrupt(err.to_string()),
        other => StoreError::Backend {
            operation,
            message: other.to_string(),
        },
    }
}

fn is_unique_violation_code(code: Option<&str>) -> bool {
    code == Some("23505")
}

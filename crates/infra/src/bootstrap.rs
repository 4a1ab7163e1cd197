use academy_auth::{NewUser, Role, User};
use academy_core::{DomainError, UserId};
use thiserror::Error;

use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Make sure `email` exists and holds the admin role.
///
/// Role promotion is itself admin-gated, so without this a fresh deployment
/// could never get its first admin.
pub async fn ensure_admin(users: &dyn UserStore, email: &str) -> Result<User, BootstrapError> {
    let user = match users.find_by_email(email).await? {
        Some(user) => user,
        None => {
            let user = User::register(
                UserId::new(),
                NewUser {
                    email: email.to_string(),
                    name: None,
                    photo_url: None,
                },
            )?;
            users.insert_if_absent(user.clone()).await?;
            // A concurrent registration may have won the insert.
            users
                .find_by_email(email)
                .await?
                .ok_or_else(|| StoreError::Corrupt(format!("user {email} vanished after insert")))?
        }
    };

    if !user.has_role(&Role::ADMIN) {
        users.promote(user.id, Role::ADMIN).await?;
        tracing::info!(email, "bootstrap admin promoted");
    }

    users
        .find_by_email(email)
        .await?
        .ok_or_else(|| StoreError::Corrupt(format!("user {email} vanished after promotion")).into())
}

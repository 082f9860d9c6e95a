use crate::domain::model::{Role, User};
use crate::domain::ports::UserStore;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Accept/reject/feature products and review reports.
    ModerateProducts,
    /// Change user roles, list users, view site statistics.
    ManageUsers,
    ManageCoupons,
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Moderator => capability == Capability::ModerateProducts,
            Role::User => false,
        }
    }
}

/// Re-reads the caller's user document and checks its role.
///
/// The token only proves identity; the role is looked up every time so a
/// demotion takes effect on the next request.
pub async fn ensure_capability(
    users: &dyn UserStore,
    email: &str,
    capability: Capability,
) -> Result<User> {
    let user = users
        .get_user(email)
        .await?
        .ok_or_else(|| AppError::Forbidden(format!("unknown user {}", email)))?;

    if !user.role.allows(capability) {
        tracing::warn!(
            "🚫 {} ({:?}) attempted {:?}",
            email,
            user.role,
            capability
        );
        return Err(AppError::Forbidden(format!(
            "{:?} role lacks {:?}",
            user.role, capability
        )));
    }

    Ok(user)
}

use serde::{Deserialize, Serialize};
use tracing::info;

use super::actor::{UniversityRole, UniversityUserId};
use super::repository::RepositoryError;

/// Registration request for a university staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUniversityUser {
    pub name: String,
    pub email: String,
    pub role: UniversityRole,
}

/// Stored university staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityUser {
    pub id: UniversityUserId,
    pub name: String,
    pub email: String,
    pub role: UniversityRole,
}

/// Staff directory consulted by the one-time bootstrap.
pub trait UniversityDirectory: Send + Sync {
    fn university_user_count(&self) -> Result<usize, RepositoryError>;
    fn register_university_user(
        &self,
        user: NewUniversityUser,
    ) -> Result<UniversityUser, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(UniversityUser),
    AlreadyBootstrapped,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("the first university user must be an administrator, got {0}")]
    FirstUserMustBeAdministrator(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Registers `admin` only while the directory holds no university users.
/// Running it again once anyone exists is a no-op.
pub fn ensure_first_admin<D>(
    directory: &D,
    admin: NewUniversityUser,
) -> Result<BootstrapOutcome, BootstrapError>
where
    D: UniversityDirectory + ?Sized,
{
    if directory.university_user_count()? > 0 {
        return Ok(BootstrapOutcome::AlreadyBootstrapped);
    }

    if admin.role != UniversityRole::Administrator {
        return Err(BootstrapError::FirstUserMustBeAdministrator(
            admin.role.label(),
        ));
    }

    let user = directory.register_university_user(admin)?;
    info!(user_id = %user.id.0, email = %user.email, "bootstrapped first university administrator");
    Ok(BootstrapOutcome::Created(user))
}

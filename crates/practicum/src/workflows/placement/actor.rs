use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a university staff account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniversityUserId(pub String);

/// Identifier of a registered company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Identifier of an enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Staff roles inside the university.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniversityRole {
    Administrator,
    Coordinator,
    Assistant,
}

impl UniversityRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Coordinator => "coordinator",
            Self::Assistant => "assistant",
        }
    }

    /// Whether the role may review vacancies and sign off placements.
    pub const fn can_review(self) -> bool {
        matches!(self, Self::Administrator | Self::Coordinator)
    }
}

/// The authenticated party behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorRef {
    University {
        id: UniversityUserId,
        role: UniversityRole,
    },
    Company {
        id: CompanyId,
    },
    Student {
        id: StudentId,
    },
}

impl ActorRef {
    pub fn university(id: impl Into<String>, role: UniversityRole) -> Self {
        Self::University {
            id: UniversityUserId(id.into()),
            role,
        }
    }

    pub fn company(id: impl Into<String>) -> Self {
        Self::Company {
            id: CompanyId(id.into()),
        }
    }

    pub fn student(id: impl Into<String>) -> Self {
        Self::Student {
            id: StudentId(id.into()),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::University { .. } => "university",
            Self::Company { .. } => "company",
            Self::Student { .. } => "student",
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::University { id, role } => write!(f, "university:{} ({})", id.0, role.label()),
            Self::Company { id } => write!(f, "company:{}", id.0),
            Self::Student { id } => write!(f, "student:{}", id.0),
        }
    }
}

/// Opaque caller credential, e.g. a bearer token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(pub String);

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Maps credentials to actors. Token issuance and password checks live behind it.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &Credential) -> Result<ActorRef, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredential,
    #[error("credentials could not be validated")]
    InvalidCredential,
}

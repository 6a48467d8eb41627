use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::OwnerId;

/// Role of the caller within the owning organisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Scorer,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Owner => "owner",
            Self::Scorer => "scorer",
            Self::Viewer => "viewer",
        };
        f.write_str(s)
    }
}

/// Caller context, already authorized upstream.
///
/// The engine trusts this value. It is recorded on ledger entries and in
/// log fields but never used to allow or deny an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeContext {
    pub owner: OwnerId,
    pub role: Role,
    pub subscription_active: bool,
}

impl ScopeContext {
    pub fn new(owner: OwnerId, role: Role) -> Self {
        Self {
            owner,
            role,
            subscription_active: true,
        }
    }

    /// A scorer context for a fresh owner, used by offline tools.
    pub fn local() -> Self {
        Self::new(OwnerId::new(), Role::Scorer)
    }
}

impl fmt::Display for ScopeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.owner.short_id())
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Namespace for name-derived identifiers (UUID v5).
const NAME_NAMESPACE: Uuid = Uuid::from_u128(0x5c0e_eb00_c000_4e1d_9a3f_00c1_1c3e_7001);

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))
            }
        }
    };
}

define_id!(
    /// Identifier of a match.
    MatchId,
    "MatchId"
);
define_id!(
    /// Identifier of an innings within a match.
    InningsId,
    "InningsId"
);
define_id!(
    /// Identifier of a team.
    TeamId,
    "TeamId"
);
define_id!(
    /// Identifier of a player.
    PlayerId,
    "PlayerId"
);
define_id!(
    /// Identifier of a recorded delivery.
    BallId,
    "BallId"
);
define_id!(
    /// Identifier of an awarded penalty.
    PenaltyId,
    "PenaltyId"
);
define_id!(
    /// Identity of the scorer or organisation on whose behalf an
    /// operation runs. Supplied by the caller, never checked here.
    OwnerId,
    "OwnerId"
);

impl TeamId {
    /// Derive a stable team id from a name.
    ///
    /// The same name always produces the same id, which lets offline
    /// scripts refer to teams by name.
    pub fn named(name: &str) -> Self {
        Self(derive_named(b"team:", name))
    }
}

impl PlayerId {
    /// Derive a stable player id from a name.
    pub fn named(name: &str) -> Self {
        Self(derive_named(b"player:", name))
    }
}

fn derive_named(domain: &[u8], name: &str) -> Uuid {
    let mut material = Vec::with_capacity(domain.len() + name.len());
    material.extend_from_slice(domain);
    material.extend_from_slice(name.trim().as_bytes());
    Uuid::new_v5(&NAME_NAMESPACE, &material)
}

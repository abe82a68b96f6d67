use log::warn;

use crate::error::ElectionError;
use crate::model::{Identity, Role};

use super::{Election, Result};

impl Election {
    /// The one authorization check. Every privileged operation calls this before
    /// doing anything else.
    pub(super) fn require_admin(&self, caller: Identity) -> Result<()> {
        if caller == self.admin {
            Ok(())
        } else {
            warn!("Rejected privileged operation from {caller}");
            Err(ElectionError::Unauthorized { caller })
        }
    }

    /// Work out where a connected identity belongs. The admin takes precedence
    /// over any voter record with the same identity.
    pub fn role_of(&self, identity: Identity) -> Option<Role> {
        if identity == self.admin {
            Some(Role::Admin)
        } else if self
            .registry
            .voter(identity)
            .map_or(false, |voter| voter.is_registered)
        {
            Some(Role::Voter)
        } else {
            None
        }
    }
}

//! Caller identity, resolved per request by the transport layer.
//!
//! Passed explicitly into every mutating store operation rather than read
//! from ambient state. The store records `user_id` as `created_by`
//! provenance on subjects and their versions.

use serde::{Deserialize, Serialize};

/// A resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: String,
}

impl Identity {
  pub fn new(user_id: impl Into<String>) -> Self {
    Self {
      user_id: user_id.into(),
    }
  }
}

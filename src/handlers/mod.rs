pub mod admin;
pub mod auth;
pub mod design;
pub mod logistics;
pub mod modules;
pub mod production;
pub mod sales;
pub mod system;

use serde::Deserialize;

/// `?force=true` on the catalog endpoints bypasses the TTL check.
#[derive(Debug, Deserialize)]
pub struct ForceQuery {
    pub force: Option<String>,
}

impl ForceQuery {
    pub fn is_forced(&self) -> bool {
        self.force.as_deref() == Some("true")
    }
}

use serde_derive::Deserialize;
use std::fmt;

use crate::signing::sha1_hex;

/// Account data needed to talk to the ShineMonitor portal.
/// Missing fields deserialize empty; `is_valid` decides once every source
/// of configuration has been applied.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub company_id: String,
    pub plant_id: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str, company_id: &str, plant_id: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            company_id: company_id.to_owned(),
            plant_id: plant_id.to_owned(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.username.is_empty()
            && !self.password.is_empty()
            && !self.company_id.is_empty()
            && !self.plant_id.is_empty()
    }

    /// The portal never sees the clear-text password, only its SHA-1.
    pub fn password_hash(&self) -> String {
        sha1_hex(&self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("company_id", &self.company_id)
            .field("plant_id", &self.plant_id)
            .finish()
    }
}

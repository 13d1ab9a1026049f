use sha1::{Digest, Sha1};

/// Lowercase hex SHA-1 of `input`, as the portal expects it.
pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parameters of the `auth` action. They are signed and sent verbatim.
pub fn auth_params(username: &str, company_id: &str) -> String {
    format!("&action=auth&usr={username}&company-key={company_id}")
}

pub fn login_sign(salt: &str, password_hash: &str, auth_params: &str) -> String {
    sha1_hex(&format!("{salt}{password_hash}{auth_params}"))
}

pub fn query_sign(salt: &str, secret: &str, token: &str, action_params: &str) -> String {
    sha1_hex(&format!("{salt}{secret}{token}{action_params}"))
}

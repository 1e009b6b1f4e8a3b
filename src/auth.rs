use sha2::{Digest, Sha256};

/// Session tokens are stored as SHA-256 hex; the plain token never hits the DB.
pub fn hash_access_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let out = hasher.finalize();
    hex::encode(out)
}

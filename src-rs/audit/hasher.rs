use serde::Serialize;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn digest_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Digest of the compact JSON encoding of `value`. Struct field order is
/// fixed by declaration, so the encoding is stable.
pub fn digest_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(digest_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn json_digest_changes_with_content() {
        let a = digest_json(&serde_json::json!({"step": 1})).unwrap();
        let b = digest_json(&serde_json::json!({"step": 2})).unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}

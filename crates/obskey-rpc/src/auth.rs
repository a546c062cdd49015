//! obs-websocket challenge/response authentication.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::protocol::AuthChallenge;

/// Compute the `authentication` string for `Identify`.
///
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
#[must_use]
pub fn authentication_string(password: &str, challenge: &AuthChallenge) -> String {
    let secret = STANDARD.encode(Sha256::digest(
        format!("{password}{}", challenge.salt).as_bytes(),
    ));
    STANDARD.encode(Sha256::digest(
        format!("{secret}{}", challenge.challenge).as_bytes(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(challenge: &str, salt: &str) -> AuthChallenge {
        AuthChallenge {
            challenge: challenge.to_string(),
            salt: salt.to_string(),
        }
    }

    #[test]
    fn test_authentication_is_deterministic() {
        let c = challenge(
            "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=",
            "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=",
        );
        assert_eq!(
            authentication_string("supersecretpassword", &c),
            authentication_string("supersecretpassword", &c)
        );
    }

    #[test]
    fn test_authentication_matches_manual_derivation() {
        let c = challenge("challenge", "salt");
        let secret = STANDARD.encode(Sha256::digest(b"passwordsalt"));
        let expected = STANDARD.encode(Sha256::digest(format!("{secret}challenge").as_bytes()));
        assert_eq!(authentication_string("password", &c), expected);
    }

    #[test]
    fn test_authentication_depends_on_every_input() {
        let base = authentication_string("password", &challenge("c", "s"));
        assert_ne!(base, authentication_string("other", &challenge("c", "s")));
        assert_ne!(base, authentication_string("password", &challenge("x", "s")));
        assert_ne!(base, authentication_string("password", &challenge("c", "x")));
    }

    #[test]
    fn test_authentication_is_padded_base64_of_a_digest() {
        let auth = authentication_string("", &challenge("c", "s"));
        // 32-byte digest encodes to 44 characters with one padding byte
        assert_eq!(auth.len(), 44);
        assert!(auth.ends_with('='));
        assert_eq!(STANDARD.decode(&auth).unwrap().len(), 32);
    }
}

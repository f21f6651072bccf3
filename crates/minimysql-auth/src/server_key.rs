//! RSA password encryption for full auth on a plain channel.

use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use sha1::Sha1;

use crate::error::AuthError;
use crate::scramble::xor_password_with_seed;

/// Encrypt the password with the server's RSA public key for full auth.
///
/// The NUL-terminated password is XOR masked with the cyclically repeated
/// seed, then encrypted with OAEP/SHA-1 padding (MySQL 8.0.5+ behavior for
/// `caching_sha2_password`).
///
/// The key arrives as PEM; both SubjectPublicKeyInfo and PKCS#1 encodings
/// are accepted.
pub fn encrypt_password_with_server_key(
    password: &str,
    seed: &[u8],
    public_key_pem: &[u8],
) -> Result<Vec<u8>, AuthError> {
    if seed.is_empty() {
        return Err(AuthError::EmptySeed);
    }

    let masked = xor_password_with_seed(password, seed);

    let pem = std::str::from_utf8(public_key_pem)
        .map_err(|e| AuthError::InvalidServerKey(format!("key is not UTF-8 PEM: {e}")))?;

    let public_key = RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| AuthError::InvalidServerKey(e.to_string()))?;

    let padding = rsa::Oaep::new::<Sha1>();
    public_key
        .encrypt(&mut OsRng, padding, &masked)
        .map_err(|e| AuthError::Encryption(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rsa::pkcs8::EncodePublicKey;
    use rsa::{Oaep, RsaPrivateKey};

    use super::*;

    fn test_key() -> (RsaPrivateKey, String) {
        let private = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let pem = private
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        (private, pem)
    }

    #[test]
    fn test_empty_seed_rejected() {
        let err = encrypt_password_with_server_key("pw", &[], b"irrelevant").unwrap_err();
        assert!(matches!(err, AuthError::EmptySeed));
    }

    #[test]
    fn test_garbage_key_rejected() {
        let err =
            encrypt_password_with_server_key("pw", &[1, 2, 3], b"not a pem key").unwrap_err();
        assert!(matches!(err, AuthError::InvalidServerKey(_)));
    }

    #[test]
    fn test_server_can_recover_password() {
        let (private, pem) = test_key();
        let seed = b"01234567890123456789";

        let ciphertext =
            encrypt_password_with_server_key("hunter2", seed, pem.as_bytes()).unwrap();

        let masked = private
            .decrypt(Oaep::new::<Sha1>(), &ciphertext)
            .unwrap();
        let recovered: Vec<u8> = masked
            .iter()
            .enumerate()
            .map(|(i, b)| b ^ seed[i % seed.len()])
            .collect();
        assert_eq!(&recovered, b"hunter2\0");
    }
}

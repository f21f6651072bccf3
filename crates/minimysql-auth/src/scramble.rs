//! Challenge/response scramble computations.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute the `mysql_native_password` challenge response.
///
/// Algorithm: `SHA1(password) XOR SHA1(seed + SHA1(SHA1(password)))`
///
/// Returns the 20-byte response, or an empty vec for an empty password
/// (the wire format for a passwordless account).
#[must_use]
pub fn native_password_scramble(password: &str, seed: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let stage1: [u8; 20] = Sha1::digest(password.as_bytes()).into();
    let stage2: [u8; 20] = Sha1::digest(stage1).into();

    let mut hasher = Sha1::new();
    hasher.update(seed);
    hasher.update(stage2);
    let mask: [u8; 20] = hasher.finalize().into();

    stage1.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect()
}

/// Compute the `caching_sha2_password` fast-auth challenge response.
///
/// Algorithm: `SHA256(password) XOR SHA256(SHA256(SHA256(password)) + seed)`
///
/// Returns the 32-byte response, or an empty vec for an empty password.
#[must_use]
pub fn caching_sha2_scramble(password: &str, seed: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let hash1: [u8; 32] = Sha256::digest(password.as_bytes()).into();
    let hash2: [u8; 32] = Sha256::digest(hash1).into();

    let mut hasher = Sha256::new();
    hasher.update(hash2);
    hasher.update(seed);
    let mask: [u8; 32] = hasher.finalize().into();

    hash1.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect()
}

/// XOR the NUL-terminated password with the cyclically repeated seed.
///
/// This masking is applied before RSA encrypting the password during
/// full auth on a plain channel.
#[must_use]
pub fn xor_password_with_seed(password: &str, seed: &[u8]) -> Vec<u8> {
    let mut masked = password.as_bytes().to_vec();
    masked.push(0);

    if !seed.is_empty() {
        for (i, byte) in masked.iter_mut().enumerate() {
            *byte ^= seed[i % seed.len()];
        }
    }

    masked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_native_empty_password() {
        assert!(native_password_scramble("", &[0x41; 20]).is_empty());
    }

    #[test]
    fn test_native_response_length() {
        let out = native_password_scramble("secret", &[0x41; 20]);
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn test_native_unmasks_to_stage1() {
        // XORing the response with the mask must recover SHA1(password).
        let seed = b"01234567890123456789";
        let out = native_password_scramble("secret", seed);

        let stage1: [u8; 20] = Sha1::digest(b"secret").into();
        let stage2: [u8; 20] = Sha1::digest(stage1).into();
        let mut hasher = Sha1::new();
        hasher.update(seed);
        hasher.update(stage2);
        let mask: [u8; 20] = hasher.finalize().into();

        let recovered: Vec<u8> = out.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect();
        assert_eq!(recovered, stage1.to_vec());
    }

    #[test]
    fn test_native_seed_sensitivity() {
        let a = native_password_scramble("secret", &[0x01; 20]);
        let b = native_password_scramble("secret", &[0x02; 20]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sha2_empty_password() {
        assert!(caching_sha2_scramble("", &[0x41; 20]).is_empty());
    }

    #[test]
    fn test_sha2_response_length() {
        let out = caching_sha2_scramble("secret", &[0x41; 20]);
        assert_eq!(out.len(), 32);
    }

    #[test]
    fn test_sha2_unmasks_to_password_hash() {
        let seed = b"01234567890123456789";
        let out = caching_sha2_scramble("secret", seed);

        let hash1: [u8; 32] = Sha256::digest(b"secret").into();
        let hash2: [u8; 32] = Sha256::digest(hash1).into();
        let mut hasher = Sha256::new();
        hasher.update(hash2);
        hasher.update(seed);
        let mask: [u8; 32] = hasher.finalize().into();

        let recovered: Vec<u8> = out.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect();
        assert_eq!(recovered, hash1.to_vec());
    }

    #[test]
    fn test_xor_mask_roundtrip() {
        let seed = b"abcdefgh";
        let masked = xor_password_with_seed("hunter2", seed);
        assert_eq!(masked.len(), "hunter2".len() + 1);

        // Applying the mask again recovers password + NUL.
        let recovered: Vec<u8> = masked
            .iter()
            .enumerate()
            .map(|(i, b)| b ^ seed[i % seed.len()])
            .collect();
        assert_eq!(&recovered, b"hunter2\0");
    }

    #[test]
    fn test_xor_seed_longer_than_password() {
        let seed = b"01234567890123456789";
        let masked = xor_password_with_seed("pw", seed);
        assert_eq!(masked.len(), 3);
        assert_eq!(masked[0], b'p' ^ b'0');
        assert_eq!(masked[2], seed[2]);
    }

    #[test]
    fn test_xor_empty_password_keeps_terminator() {
        let masked = xor_password_with_seed("", b"xyz");
        assert_eq!(masked, vec![b'x']);
    }
}

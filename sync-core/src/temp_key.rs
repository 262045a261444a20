//! Temporary keys for records created offline.
//!
//! A temporary key is the current Unix time in milliseconds followed by four
//! random digits. It is a plain decimal string, unique enough for one local
//! store; the store still re-rolls on the rare collision.

use std::time::{SystemTime, UNIX_EPOCH};

/// Mint a fresh temporary key.
pub fn temp_key() -> String {
    temp_key_at(now_millis(), random_suffix())
}

/// Build a temporary key from its parts.
pub fn temp_key_at(millis: u64, suffix: u16) -> String {
    format!("{}{:04}", millis, suffix % 10_000)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn random_suffix() -> u16 {
    let mut bytes = [0u8; 2];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u16::from_le_bytes(bytes),
        Err(_) => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u16)
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_is_numeric_and_non_empty() {
        let key = temp_key();
        assert!(!key.is_empty());
        assert!(key.chars().all(|c| c.is_ascii_digit()), "got {}", key);
    }

    #[test]
    fn suffix_is_zero_padded() {
        assert_eq!(temp_key_at(1_700_000_000_000, 7), "17000000000000007");
        assert_eq!(temp_key_at(5, 12_345), "52345");
    }

    #[test]
    fn keys_rarely_collide() {
        let keys: HashSet<String> = (0..50).map(|_| temp_key()).collect();
        // 50 draws from 10_000 suffixes within the same few milliseconds
        assert!(keys.len() >= 45, "too many collisions: {}", keys.len());
    }
}

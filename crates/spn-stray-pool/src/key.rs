//! Per-Hand signing key derivation.
//!
//! Each Hand submits transactions under a distinct sub-key derived from the
//! operator's private key so that `N` Hands can broadcast concurrently
//! without contending over the same account's sequence number. This is part
//! of the external contract between the pool and the signing collaborator,
//! not an internal implementation detail: the signer must derive keys the
//! same way.

/// Derives Hand `index`'s signing key from the operator's private key bytes
/// by wrapping-adding `index` to the last byte of the key tail.
pub fn derive_hand_key(key_bytes: &[u8], index: u8) -> Vec<u8> {
    let mut derived = key_bytes.to_vec();
    if let Some(last) = derived.last_mut() {
        *last = last.wrapping_add(index);
    }
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_identity() {
        let key = vec![1, 2, 3, 255];
        assert_eq!(derive_hand_key(&key, 0), key);
    }

    #[test]
    fn derivation_wraps_on_overflow() {
        let key = vec![1, 2, 3, 255];
        assert_eq!(derive_hand_key(&key, 2), vec![1, 2, 3, 1]);
    }

    #[test]
    fn distinct_indices_yield_distinct_keys() {
        let key = vec![9, 9, 9, 0];
        assert_ne!(derive_hand_key(&key, 1), derive_hand_key(&key, 2));
    }
}

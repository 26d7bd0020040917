//! Generation of keys for spans that the caller did not name.

use uuid::Uuid;

use crate::Key;

/// Generates a key that will not collide with any other generated key.
///
/// The keys are time-ordered (UUID version 7) so that anonymous siblings sort in
/// creation order, rendered as 32 lowercase hex digits.
pub(crate) fn generate_key() -> Key {
    Key::Str(Uuid::now_v7().simple().to_string())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_keys_are_unique() {
        let keys: HashSet<Key> = (0..1000).map(|_| generate_key()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn generated_keys_are_hex_strings() {
        let Key::Str(key) = generate_key() else {
            panic!("generated key must be a string");
        };

        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

use rand::Rng;

// Excludes 0/O and 1/I so references survive being read over the phone.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a human-readable booking reference, e.g. `VLR-8KQ2KK`.
/// Uniqueness is best effort here; the store enforces it with a unique
/// constraint on the column.
pub fn booking_reference() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("VLR-{}", suffix)
}

//! Dedup key derivation
//!
//! A dedup key identifies one logical comment. Comments that carry a
//! platform-native id are keyed on `(platform, id)`; anonymous text is keyed
//! on a fingerprint of its normalized content. A fingerprint collision only
//! means two near-identical comments share one classification.

/// Derive the dedup key for a comment.
///
/// Returns `platform + "_" + platform_id`, or `platform + "_" + fingerprint`
/// when no (non-blank) platform id is available.
pub fn dedup_key(platform: &str, platform_id: Option<&str>, text: &str) -> String {
    match platform_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{}_{}", platform, id),
        None => format!("{}_{:016x}", platform, text_fingerprint(text)),
    }
}

/// 64-bit fingerprint of the normalized text.
///
/// Normalization trims, lowercases and collapses runs of whitespace so that
/// re-rendered copies of the same comment land on the same key. The
/// normalized bytes are streamed into blake3 and the first eight bytes of the
/// digest are kept.
pub fn text_fingerprint(text: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    let mut first = true;

    for word in text.split_whitespace() {
        if !first {
            hasher.update(b" ");
        }
        first = false;

        for ch in word.chars().flat_map(char::to_lowercase) {
            let mut buf = [0u8; 4];
            hasher.update(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

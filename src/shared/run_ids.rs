use getrandom::getrandom;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RUN_SUFFIX_SPACE: u32 = 36 * 36 * 36 * 36;

fn base36_encode_u64(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut chars = Vec::new();
    while value > 0 {
        chars.push(BASE36_ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    chars.into_iter().rev().collect()
}

fn base36_encode_fixed_u32(mut value: u32, width: usize) -> String {
    let mut chars = vec!['0'; width];
    for idx in (0..width).rev() {
        chars[idx] = BASE36_ALPHABET[(value % 36) as usize] as char;
        value /= 36;
    }
    chars.into_iter().collect()
}

/// Compact `run-<ts>-<suffix>` identifier used to correlate the log lines of
/// one onboarding run.
pub fn new_run_id(now: i64) -> Result<String, String> {
    let timestamp = u64::try_from(now)
        .map_err(|_| "run id generation requires a non-negative timestamp".to_string())?;
    let mut bytes = [0_u8; 4];
    getrandom(&mut bytes)
        .map_err(|err| format!("failed to generate run id randomness: {err}"))?;
    let sample = u32::from_le_bytes(bytes) % RUN_SUFFIX_SPACE;
    let ts = base36_encode_u64(timestamp);
    let suffix = base36_encode_fixed_u32(sample, 4);
    Ok(format!("run-{ts}-{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_carry_timestamp_and_fixed_width_suffix() {
        let id = new_run_id(1_700_000_000).expect("run id");
        let mut parts = id.splitn(3, '-');
        assert_eq!(parts.next(), Some("run"));
        let ts = parts.next().expect("timestamp part");
        let suffix = parts.next().expect("suffix part");
        assert!(!ts.is_empty());
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn run_ids_reject_negative_timestamps() {
        assert!(new_run_id(-1).is_err());
    }

    #[test]
    fn base36_zero_encodes_to_single_digit() {
        assert_eq!(base36_encode_u64(0), "0");
        assert_eq!(base36_encode_fixed_u32(0, 4), "0000");
    }
}

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a human-facing order number.
///
/// Format: `OM{unix_seconds}{4-digit random suffix}`, e.g.
/// `OM17561234560042`. The coarse timestamp plus a random suffix is
/// not proven globally unique; the storage layer enforces a UNIQUE
/// index on `order_no` and regenerates on collision.
pub fn order_no() -> String {
    use rand::Rng;
    let timestamp = chrono::Utc::now().timestamp();
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("OM{}{:04}", timestamp, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_no_format() {
        let no = order_no();
        assert!(no.starts_with("OM"));
        // "OM" + 10-digit unix seconds + 4-digit suffix
        assert_eq!(no.len(), 16);
        assert!(no[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_now_millis_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }
}

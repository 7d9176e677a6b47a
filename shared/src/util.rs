/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: sequence within the millisecond
///
/// Ids are strictly increasing within the process; a burst of more than
/// 4096 ids in one millisecond borrows from the next one.
pub fn snowflake_id() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    static LAST: AtomicI64 = AtomicI64::new(0);

    let ts = ((now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF) << 12; // 41 bits
    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        let next = ts.max(last + 1);
        match LAST.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Day prefix of order numbers, `YYYYMMDD` in UTC
pub fn order_day(created_at: i64) -> String {
    chrono::DateTime::from_timestamp_millis(created_at)
        .unwrap_or_default()
        .format("%Y%m%d")
        .to_string()
}

/// Human-facing order number: `YYYYMMDD-NNNN`, `seq` counting from 1 each day
pub fn order_number(created_at: i64, seq: i64) -> String {
    format!("{}-{seq:04}", order_day(created_at))
}

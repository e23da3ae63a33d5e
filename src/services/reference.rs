//! Ledger reference generation.

use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::TransactionType;

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Wall-clock milliseconds, bumped so that no two calls in this process
/// ever return the same value.
pub fn monotonic_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_MILLIS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// `{type}_{millis}`, e.g. `airtime_purchase_1700000000000`.
pub fn purchase_reference(transaction_type: TransactionType) -> String {
    format!("{}_{}", transaction_type.as_str(), monotonic_millis())
}

/// `BN-{millis}-{random}` as expected by the payment gateway.
pub fn funding_reference() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("BN-{}-{}", monotonic_millis(), suffix)
}

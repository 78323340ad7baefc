//! Trailing security universe per manager.
//!
//! The window runs over the manager's own reported quarters, not calendar
//! quarters: a gap in filings does not shrink the window. A per-security
//! reference count is updated incrementally as quarters enter and leave, so
//! each quarter's holdings are touched twice in total.

use std::collections::HashMap;
use std::hash::Hash;

/// Distinct securities held across each entry and up to `window - 1`
/// preceding entries.
///
/// `holdings` must be in ascending quarter order, one entry per quarter, and
/// each entry must list a security at most once.
pub fn trailing_counts<S>(holdings: &[Vec<S>], window: usize) -> Vec<usize>
where
    S: Hash + Eq,
{
    let window = window.max(1);
    let mut counts: HashMap<&S, usize> = HashMap::new();
    let mut out = Vec::with_capacity(holdings.len());

    for (i, entering) in holdings.iter().enumerate() {
        for security in entering {
            *counts.entry(security).or_insert(0) += 1;
        }
        if i >= window {
            for security in &holdings[i - window] {
                if let Some(n) = counts.get_mut(security) {
                    *n -= 1;
                    if *n == 0 {
                        counts.remove(security);
                    }
                }
            }
        }
        out.push(counts.len());
    }
    out
}

//! Domain-specific assertion macros for sift harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! filter invariant was violated.

// ---------------------------------------------------------------------------
// Matcher assertions
// ---------------------------------------------------------------------------

/// Assert that `input` resolves to `status` with full confidence.
///
/// ```rust
/// assert_resolves!(matcher, "failed image pull", "FAILED_IMAGE_PULL");
/// ```
#[macro_export]
macro_rules! assert_resolves {
    ($matcher:expr, $input:expr, $status:expr) => {{
        let input: &str = $input;
        let result = $matcher.match_status(input);
        if result.status.as_deref() != Some($status) || result.confidence != 1.0 {
            panic!(
                "assert_resolves! failed for {:?}:\n  expected: {} @ 1.0\n  actual:   {:?}",
                input, $status, result
            );
        }
    }};
}

/// Assert that `input` does not resolve, optionally checking the candidates.
#[macro_export]
macro_rules! assert_unresolved {
    ($matcher:expr, $input:expr) => {{
        let input: &str = $input;
        let result = $matcher.match_status(input);
        if result.status.is_some() {
            panic!("assert_unresolved! failed: {:?} resolved to {:?}", input, result.status);
        }
    }};
    ($matcher:expr, $input:expr, [$($candidate:expr),* $(,)?]) => {{
        let input: &str = $input;
        let result = $matcher.match_status(input);
        let expected: Vec<String> = vec![$($candidate.to_string()),*];
        if result.status.is_some() {
            panic!("assert_unresolved! failed: {:?} resolved to {:?}", input, result.status);
        }
        pretty_assertions::assert_eq!(result.candidates, expected, "candidates for {:?}", input);
    }};
}

// ---------------------------------------------------------------------------
// Chip assertions
// ---------------------------------------------------------------------------

/// Assert a chip list's `(field, value)` pairs, in order.
///
/// ```rust
/// assert_chips!(list, [("status", "FAILED"), ("user", "alice")]);
/// ```
#[macro_export]
macro_rules! assert_chips {
    ($list:expr, [$(($field:expr, $value:expr)),* $(,)?]) => {{
        let list: &sift_core::ChipList = &$list;
        let actual: Vec<(String, String)> = list.to_pairs();
        let expected: Vec<(String, String)> = vec![$(($field.to_string(), $value.to_string())),*];
        pretty_assertions::assert_eq!(actual, expected, "chip list mismatch");
    }};
}

// ---------------------------------------------------------------------------
// Page assertions
// ---------------------------------------------------------------------------

/// Assert a page's item count, `has_more` and `next_offset`.
#[macro_export]
macro_rules! assert_page {
    ($page:expr, items = $n:expr, has_more = $more:expr, next = $next:expr) => {{
        let page = &$page;
        let next = $next;
        if page.items.len() != $n || page.has_more != $more || page.next_offset != next {
            panic!(
                "assert_page! failed:\n  expected: items={} has_more={} next_offset={:?}\n  actual:   items={} has_more={} next_offset={:?} error={:?}",
                $n, $more, next, page.items.len(), page.has_more, page.next_offset, page.error
            );
        }
    }};
}

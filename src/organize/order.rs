use std::cmp::Ordering;

/// Case-insensitive comparison with a case-sensitive tie-break, so
/// `{b, A, a, B}` orders as `A, a, B, b`.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort by name; equal names keep their source order.
pub fn sort_by_name<T, F>(items: &mut [T], name: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare_names(name(a), name(b)));
}

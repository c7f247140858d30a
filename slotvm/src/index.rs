/// Resolves a host index into a position in a sequence of `count` items.
///
/// Negative indices count back from the end, so `-1` is the last item.
/// Returns `None` if the index does not land inside `0..count`.
pub fn validate_index(count: usize, index: i64) -> Option<usize> {
    let count = i64::try_from(count).ok()?;
    let resolved = if index < 0 { index + count } else { index };
    if (0..count).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

/// Trim, collapse internal whitespace runs to a single space and cap at
/// `max_chars` characters. Returns `None` when nothing is left.
pub fn normalize_text(input: &str, max_chars: usize) -> Option<String> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_chars).collect();

    if truncated.is_empty() {
        None
    } else {
        Some(truncated)
    }
}

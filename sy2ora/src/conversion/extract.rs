//! Pull the SQL payload out of a model's free-text response.
//!
//! The model is asked to answer with a single ```` ```sql ```` fenced block. The scanner takes the
//! first opening marker that is followed by whitespace and ends the block at the first closing
//! fence after it; nested or unbalanced fences are not interpreted any further. A response with no
//! complete block is used whole.

/// Opening marker of a fenced SQL block. Case-sensitive.
pub const OPEN_FENCE: &str = "```sql";

/// Closing marker of any fenced block.
pub const CLOSE_FENCE: &str = "```";

/// Extract the trimmed SQL from `response`, falling back to the whole trimmed response.
pub fn extract_sql(response: &str) -> String {
    fenced_block(response).unwrap_or(response).trim().to_string()
}

/// Interior of the first complete ```` ```sql ```` block, untrimmed.
pub fn fenced_block(text: &str) -> Option<&str> {
    for (start, _) in text.match_indices(OPEN_FENCE) {
        let body = &text[start + OPEN_FENCE.len()..];

        // ```sqlite, ```sql```, etc. are not openers
        if !body.starts_with(char::is_whitespace) {
            continue;
        }

        // No close after the first opener means no close after any later one either
        return body.find(CLOSE_FENCE).map(|end| &body[..end]);
    }

    None
}

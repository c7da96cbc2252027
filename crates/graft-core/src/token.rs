//! Graft tokens: the `>>sha<<` marker written into every graft commit.
//!
//! The token is the only state carried between runs. A later run reads it
//! back from destination history to learn which source commits were already
//! replayed, which makes an interrupted run safe to repeat.

const OPEN: &str = ">>";
const CLOSE: &str = "<<";

/// Format the token line for a source commit id.
#[must_use]
pub fn format_token(source_id: &str) -> String {
    format!("{OPEN}{source_id}{CLOSE}")
}

/// Find every graft token in a commit message, in order of appearance.
///
/// A squash of several graft commits carries one token per squashed commit,
/// so all of them are returned. Only full object ids (40 hex digits for
/// SHA-1, 64 for SHA-256) are recognized; unrelated `>>` text such as shell
/// redirections does not match. Ids are lower-cased and deduplicated.
#[must_use]
pub fn find_tokens(message: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut rest = message;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        let candidate = &after[..end];
        if is_object_id(candidate) {
            let id = candidate.to_ascii_lowercase();
            if !tokens.contains(&id) {
                tokens.push(id);
            }
            rest = &after[end + CLOSE.len()..];
        } else {
            rest = after;
        }
    }
    tokens
}

fn is_object_id(s: &str) -> bool {
    matches!(s.len(), 40 | 64) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Block extraction — locating balanced parenthesised regions in free-form
/// planning text.
///
/// Nothing in here panics on malformed input: a missing marker or a block
/// that never closes comes back as a [`BlockError`].

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("marker not found")]
    NotFound,
    #[error("block opened at byte {0} is never closed")]
    Unterminated(usize),
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Remove `;` line comments.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Return the block starting at the `(` found at byte `open`, up to and
/// including its matching `)`.
pub fn balanced_at(text: &str, open: usize) -> Result<&str, BlockError> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return Err(BlockError::NotFound);
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    Err(BlockError::Unterminated(open))
}

/// Byte offsets of `marker` occurrences that stand as whole tokens.
fn token_positions<'a>(text: &'a str, marker: &'a str) -> impl Iterator<Item = usize> + 'a {
    let bytes = text.as_bytes();
    text.match_indices(marker).filter_map(move |(idx, _)| {
        let before_ok = idx == 0 || {
            let b = bytes[idx - 1];
            !is_ident_byte(b) && b != b':' && b != b'?'
        };
        let end = idx + marker.len();
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        (before_ok && after_ok).then_some(idx)
    })
}

/// Opening parenthesis directly preceding `idx` (whitespace allowed).
fn opening_paren_before(text: &str, idx: usize) -> Option<usize> {
    let prefix = text[..idx].trim_end();
    prefix.ends_with('(').then(|| prefix.len() - 1)
}

/// Find the first `(marker ...)` block, e.g. `(:init ...)` for `":init"`.
pub fn extract_section<'a>(text: &'a str, marker: &str) -> Result<&'a str, BlockError> {
    for idx in token_positions(text, marker) {
        if let Some(open) = opening_paren_before(text, idx) {
            return balanced_at(text, open);
        }
    }
    Err(BlockError::NotFound)
}

/// Find every `(marker ...)` block in order. Scanning stops at the first
/// unterminated block, which is reported as the last element.
pub fn extract_sections<'a>(text: &'a str, marker: &str) -> Vec<Result<&'a str, BlockError>> {
    let mut blocks = Vec::new();
    let mut resume = 0;
    for idx in token_positions(text, marker) {
        if idx < resume {
            continue;
        }
        let Some(open) = opening_paren_before(text, idx) else {
            continue;
        };
        match balanced_at(text, open) {
            Ok(block) => {
                resume = open + block.len();
                blocks.push(Ok(block));
            }
            Err(err) => {
                blocks.push(Err(err));
                break;
            }
        }
    }
    blocks
}

/// Find `marker` and return the parenthesised group that follows it, as in
/// `:precondition (and ...)`.
pub fn extract_after<'a>(text: &'a str, marker: &str) -> Result<&'a str, BlockError> {
    let idx = token_positions(text, marker)
        .next()
        .ok_or(BlockError::NotFound)?;
    let rest = &text[idx + marker.len()..];
    let skipped = rest.len() - rest.trim_start().len();
    balanced_at(text, idx + marker.len() + skipped)
}

/// Strip the outer parentheses of a block returned by the extractors.
pub fn inner(block: &str) -> &str {
    let trimmed = block.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed)
}

/// Inner text of a section block with its leading keyword removed:
/// `(:init (a) (b))` → `(a) (b)`.
pub fn section_body<'a>(block: &'a str, marker: &str) -> &'a str {
    let body = inner(block).trim_start();
    body.strip_prefix(marker).unwrap_or(body).trim()
}

/// Contents of every parenthesised group at depth one, parentheses
/// removed. Deeper nesting is kept verbatim inside its group; a trailing
/// group that never closes is dropped.
pub fn depth_one_groups(text: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let group = text[start..i].trim();
                    if !group.is_empty() {
                        groups.push(group);
                    }
                }
            }
            _ => {}
        }
    }
    groups
}

/// First whitespace-delimited token of `text`.
pub fn first_token(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "(define (domain d)
      (:action move
        :parameters (?a ?b)
        :precondition (and (at ?a) (not (blocked ?a ?b)))
        :effect (and (at ?b) (not (at ?a)))))";

    #[test]
    fn nested_block_is_matched_to_its_own_close() {
        let block = extract_section(DOMAIN, ":action").unwrap();
        assert!(block.starts_with("(:action move"));
        assert!(block.ends_with("(not (at ?a))))"));
    }

    #[test]
    fn extract_after_finds_following_group() {
        let action = extract_section(DOMAIN, ":action").unwrap();
        assert_eq!(extract_after(action, ":parameters").unwrap(), "(?a ?b)");
        assert_eq!(
            extract_after(action, ":precondition").unwrap(),
            "(and (at ?a) (not (blocked ?a ?b)))"
        );
    }

    #[test]
    fn missing_and_unterminated_are_distinct() {
        assert_eq!(extract_section(DOMAIN, ":goal"), Err(BlockError::NotFound));
        let broken = "(:init (at cell) (door cell";
        assert_eq!(extract_section(broken, ":init"), Err(BlockError::Unterminated(0)));
    }

    #[test]
    fn marker_must_be_a_whole_token() {
        let text = "(:initial (x)) (:init (y))";
        assert_eq!(extract_section(text, ":init").unwrap(), "(:init (y))");
        let text = "(define (problem p) (:domain d))";
        assert_eq!(extract_section(text, "domain"), Err(BlockError::NotFound));
        assert_eq!(extract_section(text, ":domain").unwrap(), "(:domain d)");
    }

    #[test]
    fn prose_around_blocks_is_tolerated() {
        let text = "Here is your problem:\n```\n(:goal (and (escaped)))\n```\nEnjoy!";
        let block = extract_section(text, ":goal").unwrap();
        assert_eq!(section_body(block, ":goal"), "(and (escaped))");
    }

    #[test]
    fn extract_sections_returns_all_and_stops_at_unterminated() {
        let text = "(:action a) (:action b (x)) (:action c (";
        let blocks = extract_sections(text, ":action");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Ok("(:action a)"));
        assert_eq!(blocks[1], Ok("(:action b (x))"));
        assert!(matches!(blocks[2], Err(BlockError::Unterminated(_))));
    }

    #[test]
    fn comments_are_stripped() {
        let text = "(:init ; the player (starts here\n (at cell))";
        let cleaned = strip_comments(text);
        assert_eq!(
            depth_one_groups(section_body(extract_section(&cleaned, ":init").unwrap(), ":init")),
            vec!["at cell"]
        );
    }

    #[test]
    fn depth_one_groups_keep_nesting_verbatim() {
        let groups = depth_one_groups("(at ?a) (not (at ?b)) () (or (x) (y))");
        assert_eq!(groups, vec!["at ?a", "not (at ?b)", "or (x) (y)"]);
    }
}

//! Selection Parsing

use crate::error::AbortReason;

const ALL: &str = "all";

/// Parse an operator selection against `count` listed events
///
/// Accepts `all` or whitespace-separated 1-based indices. Returns the indices
/// deduplicated and ascending. Any index outside `1..=count` rejects the whole
/// selection.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, AbortReason> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AbortReason::EmptySelection);
    }
    if input == ALL {
        return Ok((1..=count).collect());
    }

    let tokens: Vec<&str> = input.split_whitespace().collect();
    if let Some(bad) = tokens
        .iter()
        .find(|token| !token.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(AbortReason::InvalidSelection(bad.to_string()));
    }

    let mut selected = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token.parse::<usize>() {
            Ok(index) if index >= 1 && index <= count => selected.push(index),
            _ => {
                return Err(AbortReason::IndexOutOfRange {
                    index: token.to_string(),
                    max: count,
                })
            }
        }
    }

    selected.sort_unstable();
    selected.dedup();
    Ok(selected)
}

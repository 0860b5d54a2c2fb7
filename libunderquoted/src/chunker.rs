//! Splitting quotations into post-sized fragments
//!
//! A message that does not fit in one post is split on whitespace and packed
//! greedily into fragments. Every fragment but the last ends with `" ..."`,
//! every fragment but the first starts with `"..."`, and when the message is
//! a reply the addressee is repeated at the front of every fragment so each
//! one lands in the addressee's notifications.
//!
//! Lengths are counted in characters, not bytes.
//!
//! Tokens are never split. A token longer than the room a continuation
//! fragment leaves between its `"... "` and `" ..."` markers (and any
//! addressee) gets a fragment of its own that runs past the budget; at one
//! character over that room the fragment is `budget + 1` long.

/// Marker joining consecutive fragments
const CONTINUATION: &str = "...";

/// Room for the trailing `" ..."`
const TRAILER_LEN: usize = 4;

/// Room for the leading `"..."`
const LEADER_LEN: usize = 3;

/// Split `text` into fragments no longer than `budget` characters
///
/// Returns a single fragment (`"{addressee} {text}"` for replies) when the
/// whole message is shorter than `budget`. The returned vector is never empty.
///
/// # Examples
///
/// ```
/// use libunderquoted::chunker::chunk;
///
/// let fragments = chunk("Here I stay. - Henrietta", 140, Some("@jessamyn"));
/// assert_eq!(fragments, vec!["@jessamyn Here I stay. - Henrietta"]);
///
/// let fragments = chunk("one two three four five six", 16, None);
/// assert_eq!(fragments, vec!["one two ...", "... three ...", "... four ...", "... five six"]);
/// ```
pub fn chunk(text: &str, budget: usize, addressee: Option<&str>) -> Vec<String> {
    let message = match addressee {
        Some(addressee) => format!("{} {}", addressee, text),
        None => text.to_string(),
    };

    if char_len(&message) < budget {
        return vec![message];
    }

    // Replies carry "@addressee " on every fragment
    let addressee_len = addressee.map(|a| char_len(a) + 1).unwrap_or(0);
    let max_length = budget.saturating_sub(TRAILER_LEN + addressee_len);

    let tokens: Vec<&str> = message.split_whitespace().collect();
    if tokens.is_empty() {
        return vec![message];
    }

    // Index of the first token of every fragment after the first
    let mut breaks = Vec::new();
    let mut length = char_len(tokens[0]);
    for (index, token) in tokens.iter().enumerate().skip(1) {
        let token_len = char_len(token);
        if length + 1 + token_len >= max_length {
            breaks.push(index);
            length = LEADER_LEN + addressee_len + token_len;
        } else {
            length += 1 + token_len;
        }
    }
    breaks.push(tokens.len());

    let mut fragments = Vec::with_capacity(breaks.len());
    let mut start = 0;
    for end in breaks {
        let mut parts: Vec<&str> = Vec::with_capacity(end - start + 2);
        if start > 0 {
            if let Some(addressee) = addressee {
                parts.push(addressee);
            }
            parts.push(CONTINUATION);
        }
        parts.extend_from_slice(&tokens[start..end]);
        fragments.push(parts.join(" "));
        start = end;
    }

    let last = fragments.len() - 1;
    for fragment in &mut fragments[..last] {
        fragment.push(' ');
        fragment.push_str(CONTINUATION);
    }

    fragments
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str =
        "You don't manage people, you manage things. You lead people. - Grace Hopper";
    const LONG_MESSAGE: &str = "I have loved men and women in my life; I've been labeled \
        'the bisexual defector' in print. Want to know another secret? I'm even ambidextrous. \
        I don't like labels. Just call me Martina. - Martina Navratilova";

    /// Recover the input tokens from a fragment sequence
    fn reassemble(fragments: &[String], addressee: Option<&str>) -> Vec<String> {
        let last = fragments.len() - 1;
        let mut tokens = Vec::new();
        for (i, fragment) in fragments.iter().enumerate() {
            let mut words: Vec<&str> = fragment.split_whitespace().collect();
            if i > 0 {
                if addressee.is_some() {
                    words.remove(0);
                }
                assert_eq!(words.remove(0), "...");
            }
            if i < last {
                assert_eq!(words.pop(), Some("..."));
            }
            if i == 0 && addressee.is_some() {
                words.remove(0);
            }
            tokens.extend(words.into_iter().map(str::to_string));
        }
        tokens
    }

    #[test]
    fn test_chunk_short() {
        let fragments = chunk(MESSAGE, 80, None);

        assert_eq!(fragments, vec![MESSAGE.to_string()]);
    }

    #[test]
    fn test_chunk_too_long() {
        let fragments = chunk(MESSAGE, 50, None);

        assert_eq!(fragments.len(), 2);
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 50);
        }
        assert_eq!(fragments[0], "You don't manage people, you manage things. ...");
        assert_eq!(fragments[1], "... You lead people. - Grace Hopper");
    }

    #[test]
    fn test_chunk_much_too_long() {
        let fragments = chunk(MESSAGE, 30, None);

        assert_eq!(
            fragments,
            vec![
                "You don't manage people, ...",
                "... you manage things. You ...",
                "... lead people. - Grace ...",
                "... Hopper",
            ]
        );
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 30);
        }
    }

    #[test]
    fn test_chunk_short_with_addressee() {
        let fragments = chunk(MESSAGE, 80, Some("@js"));

        assert_eq!(fragments, vec![format!("@js {}", MESSAGE)]);
    }

    #[test]
    fn test_chunk_much_too_long_with_addressee() {
        let fragments = chunk(MESSAGE, 40, Some("@js"));

        assert_eq!(
            fragments,
            vec![
                "@js You don't manage people, ...",
                "@js ... you manage things. You ...",
                "@js ... lead people. - Grace ...",
                "@js ... Hopper",
            ]
        );
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 35);
        }
    }

    #[test]
    fn test_chunk_long_reply_at_140() {
        let fragments = chunk(LONG_MESSAGE, 140, Some("@jessamyn"));

        assert_eq!(
            fragments,
            vec![
                "@jessamyn I have loved men and women in my life; I've been labeled \
                 'the bisexual defector' in print. Want to know another ...",
                "@jessamyn ... secret? I'm even ambidextrous. I don't like labels. \
                 Just call me Martina. - Martina Navratilova",
            ]
        );
    }

    #[test]
    fn test_chunk_exact_budget_splits() {
        // A message exactly at the budget is not a single fragment
        let text = "a".repeat(9) + " " + &"b".repeat(10);
        let fragments = chunk(&text, 20, None);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], format!("{} ...", "a".repeat(9)));
        assert_eq!(fragments[1], format!("... {}", "b".repeat(10)));
    }

    #[test]
    fn test_chunk_boundary_token_starts_new_fragment() {
        // Lines must stay under 12 - 4 = 8: "aaa bbb" is 7, "aaa bbb cc" would be 10
        let fragments = chunk("aaa bbb cc dd", 12, None);

        assert_eq!(fragments[0], "aaa bbb ...");
        for fragment in &fragments {
            assert!(fragment.chars().count() <= 12, "{:?}", fragment);
        }
    }

    #[test]
    fn test_chunk_budget_and_completeness_hold() {
        let addressees = [None, Some("@js"), Some("@martina_n")];
        let texts = [MESSAGE, LONG_MESSAGE, "Brevity is the soul of wit. - Shakespeare"];

        for text in texts {
            for addressee in addressees {
                for budget in (40..=160).step_by(7) {
                    let fragments = chunk(text, budget, addressee);
                    assert!(!fragments.is_empty());

                    for fragment in &fragments {
                        assert!(
                            fragment.chars().count() <= budget,
                            "{:?} exceeds {} for {:?}",
                            fragment,
                            budget,
                            addressee
                        );
                    }

                    let expected: Vec<String> =
                        text.split_whitespace().map(str::to_string).collect();
                    assert_eq!(reassemble(&fragments, addressee), expected);
                }
            }
        }
    }

    #[test]
    fn test_chunk_counts_characters_not_bytes() {
        let text = "Ça ne fait rien. - Édith Piaf";
        let fragments = chunk(text, 30, None);

        assert_eq!(fragments, vec![text.to_string()]);
    }

    #[test]
    fn test_chunk_oversized_token_is_not_split() {
        let token = "x".repeat(40);
        let fragments = chunk(&format!("short {}", token), 20, None);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1], format!("... {}", token));
    }

    #[test]
    fn test_chunk_token_past_continuation_room_overflows_by_one() {
        // Budget 20 leaves 12 characters between "... " and " ..."
        let token = "x".repeat(13);
        let fragments = chunk(&format!("alpha bravo {} end", token), 20, None);

        assert_eq!(
            fragments,
            vec![
                "alpha bravo ...".to_string(),
                format!("... {} ...", token),
                "... end".to_string(),
            ]
        );
        assert_eq!(fragments[1].chars().count(), 21);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert_eq!(chunk("", 140, None), vec![String::new()]);
        assert_eq!(chunk("", 140, Some("@js")), vec!["@js ".to_string()]);
    }
}

//! Reply text sanitization.
//!
//! Assistant replies arrive decorated with pictographic characters that read
//! poorly in a terminal feed. [`sanitize`] strips them and normalizes the
//! whitespace left behind.

/// Emoji-class code points stripped from replies.
///
/// Rust has no host Unicode property engine, so classification is an explicit
/// range table over the common emoji blocks: the zero-width joiner, variation
/// selectors, regional-indicator flags, the pictograph planes, and the legacy
/// symbol/dingbat block.
fn is_pictographic(ch: char) -> bool {
    matches!(ch,
        '\u{200D}'                  // zero-width joiner
        | '\u{FE00}'..='\u{FE0F}'   // variation selectors
        | '\u{1F1E6}'..='\u{1F1FF}' // regional indicators (flags)
        | '\u{1F300}'..='\u{1FAFF}' // pictographs, emoji presentation, modifiers
        | '\u{2600}'..='\u{27BF}'   // misc symbols and dingbats
    )
}

/// Strip pictographic code points, collapse whitespace runs, and trim.
///
/// Runs of two or more whitespace characters (including any created by the
/// stripping itself) collapse to a single space; a lone whitespace character
/// is kept as-is. Total and idempotent: empty input yields empty output.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_ws: Option<char> = None;
    let mut ws_run = 0usize;

    for ch in raw.chars().filter(|&ch| !is_pictographic(ch)) {
        if ch.is_whitespace() {
            if ws_run == 0 {
                pending_ws = Some(ch);
            }
            ws_run += 1;
            continue;
        }
        if ws_run > 0 && !out.is_empty() {
            // Leading whitespace is dropped outright; interior runs collapse.
            out.push(if ws_run == 1 {
                pending_ws.unwrap_or(' ')
            } else {
                ' '
            });
        }
        pending_ws = None;
        ws_run = 0;
        out.push(ch);
    }

    out
}

//! Size-bounded line splitter (spec §4.2 "Size-bounded splitter").

use context_tokenizer::Tokenizer;

/// A window of 0-based, inclusive line indices into the slice the splitter
/// was called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub start: usize,
    pub end: usize,
}

/// Split `lines` into token-bounded windows with a sliding overlap.
///
/// Guarantees (spec §4.2): a window is only emitted once adding the next
/// line would exceed `max_tokens`; the next window starts with however many
/// trailing lines of the previous window sum to at least `overlap_tokens`
/// (computed greedily from the end); a single line that alone exceeds
/// `max_tokens` is still emitted on its own rather than dropped.
pub(crate) fn split_by_size(
    lines: &[&str],
    max_tokens: usize,
    overlap_tokens: usize,
    tokenizer: &Tokenizer,
) -> Vec<Window> {
    if lines.is_empty() {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut window_start = 0usize;

    for (i, &line) in lines.iter().enumerate() {
        let candidate_tokens = if window.is_empty() {
            tokenizer.count(line)
        } else {
            tokenizer.count(&joined(&window, line))
        };

        if candidate_tokens > max_tokens && !window.is_empty() {
            let window_len = window.len();
            windows.push(Window {
                start: window_start,
                end: window_start + window_len - 1,
            });

            let tail = tail_by_tokens(&window, overlap_tokens, tokenizer);
            window_start += window_len - tail.len();
            window = tail;
            window.push(line);
        } else {
            window.push(line);
            if window.len() == 1 {
                window_start = i;
            }
        }
    }

    if !window.is_empty() {
        windows.push(Window {
            start: window_start,
            end: window_start + window.len() - 1,
        });
    }

    windows
}

/// Force-split any window whose token count still exceeds `absolute_max`,
/// using the same algorithm with `absolute_max` as the new ceiling. Applied
/// recursively so no output window ever exceeds the hard cap.
pub(crate) fn enforce_absolute_max(
    lines: &[&str],
    windows: Vec<Window>,
    absolute_max: usize,
    overlap_tokens: usize,
    tokenizer: &Tokenizer,
) -> Vec<Window> {
    let mut out = Vec::with_capacity(windows.len());
    for w in windows {
        let slice = &lines[w.start..=w.end];
        let tokens = tokenizer.count(&slice.join("\n"));
        if tokens <= absolute_max {
            out.push(w);
            continue;
        }
        let sub = split_by_size(slice, absolute_max, overlap_tokens, tokenizer);
        for s in sub {
            out.push(Window {
                start: w.start + s.start,
                end: w.start + s.end,
            });
        }
    }
    out
}

fn joined(window: &[&str], next: &str) -> String {
    let mut s = window.join("\n");
    s.push('\n');
    s.push_str(next);
    s
}

/// Greedily take trailing lines from `window` until their combined token
/// count reaches `overlap_tokens` (or the whole window is consumed).
fn tail_by_tokens<'a>(window: &[&'a str], overlap_tokens: usize, tokenizer: &Tokenizer) -> Vec<&'a str> {
    if overlap_tokens == 0 {
        return Vec::new();
    }
    let mut tail = Vec::new();
    let mut total = 0usize;
    for &line in window.iter().rev() {
        tail.insert(0, line);
        total += tokenizer.count(line);
        if total >= overlap_tokens {
            break;
        }
    }
    tail
}

//! Splitting long comment bodies to fit GitHub's size limit.

/// GitHub rejects comment bodies above 65 536 characters; stay well below.
pub const DEFAULT_COMMENT_LIMIT: usize = 60_000;

/// Split `body` into comments of at most `limit` characters each.
///
/// Splits happen at line boundaries. A single line longer than the budget
/// is cut at character boundaries. When more than one part is needed,
/// parts 2 and later start with a `**Part N/M**` header.
///
/// `limit` must leave room for that header; configuration enforces at least
/// [`MIN_COMMENT_CHAR_LIMIT`](docscout_core::MIN_COMMENT_CHAR_LIMIT). Below
/// the header length, continuation parts can exceed `limit`.
///
/// # Examples
///
/// ```
/// use docscout_report::split::split_comment;
///
/// assert_eq!(split_comment("short", 100), vec!["short".to_string()]);
///
/// let parts = split_comment("first line of text\nsecond line of text", 34);
/// assert_eq!(parts.len(), 2);
/// assert!(parts[1].starts_with("**Part 2/2**"));
/// ```
pub fn split_comment(body: &str, limit: usize) -> Vec<String> {
    if body.chars().count() <= limit {
        return vec![body.to_string()];
    }

    let mut digits = 1;
    loop {
        let budget = limit.saturating_sub(header_len(digits, digits)).max(1);
        let chunks = pack_lines(body, budget);
        let total = chunks.len();
        if digit_count(total) > digits {
            digits = digit_count(total);
            continue;
        }
        return chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                if i == 0 {
                    chunk
                } else {
                    format!("{}{chunk}", header(i + 1, total))
                }
            })
            .collect();
    }
}

fn header(part: usize, total: usize) -> String {
    format!("**Part {part}/{total}**\n\n")
}

fn header_len(part_digits: usize, total_digits: usize) -> usize {
    "**Part /**\n\n".len() + part_digits + total_digits
}

fn digit_count(n: usize) -> usize {
    n.to_string().len()
}

fn pack_lines(body: &str, budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for line in body.split('\n') {
        let line_len = line.chars().count();

        if line_len > budget {
            chunks.extend(current.take().map(|(chunk, _)| chunk));
            let chars: Vec<char> = line.chars().collect();
            let mut pieces: Vec<String> = chars.chunks(budget).map(|c| c.iter().collect()).collect();
            let last = pieces.pop().unwrap_or_default();
            chunks.extend(pieces);
            let last_len = last.chars().count();
            current = Some((last, last_len));
            continue;
        }

        current = match current.take() {
            None => Some((line.to_string(), line_len)),
            Some((mut chunk, len)) if len + 1 + line_len <= budget => {
                chunk.push('\n');
                chunk.push_str(line);
                Some((chunk, len + 1 + line_len))
            }
            Some((chunk, _)) => {
                chunks.push(chunk);
                Some((line.to_string(), line_len))
            }
        };
    }
    chunks.extend(current.map(|(chunk, _)| chunk));
    chunks
}

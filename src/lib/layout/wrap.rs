//! Greedy word wrapping.

/// Wraps `text` into lines no wider than `width_for_line(i)` for line `i`.
///
/// Words are separated by whitespace and joined with single spaces. A word wider than its
/// line is broken between characters; a line always receives at least one character, so
/// wrapping terminates for any positive or non-positive width.
pub fn wrap_lines<W, M>(text: &str, width_for_line: W, measure: M) -> Vec<String>
where
    W: Fn(usize) -> f32,
    M: Fn(&str) -> f32,
{
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let limit = width_for_line(lines.len());
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure(&candidate) <= limit {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        let limit = width_for_line(lines.len());
        if measure(word) <= limit {
            current = word.to_string();
            continue;
        }

        // Hard break an over-long word.
        let mut piece = String::new();
        for c in word.chars() {
            let limit = width_for_line(lines.len());
            piece.push(c);
            if measure(&piece) > limit && piece.chars().count() > 1 {
                piece.pop();
                lines.push(std::mem::take(&mut piece));
                piece.push(c);
            }
        }
        current = piece;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wraps every line to the same width.
pub fn wrap_uniform<M>(text: &str, width: f32, measure: M) -> Vec<String>
where
    M: Fn(&str) -> f32,
{
    wrap_lines(text, |_| width, measure)
}

/// Line-based chunker bounded by a soft character budget
///
/// Lines are never split. A group is closed before a line that would push it
/// past the budget and again as soon as it reaches the budget, so a chunk only
/// exceeds `max_size` when it is a single over-long line.
pub struct TextChunker {
    max_size: usize,
}

impl TextChunker {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Split `text` into ordered chunks; empty input yields no chunks
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut group: Vec<&str> = Vec::new();
        let mut size = 0usize;

        for line in split_lines(text) {
            let line_len = line.chars().count();

            if !group.is_empty() && size + 1 + line_len > self.max_size {
                chunks.push(group.join("\n"));
                group.clear();
                size = 0;
            }

            size = if group.is_empty() {
                line_len
            } else {
                size + 1 + line_len
            };
            group.push(line);

            if size >= self.max_size {
                chunks.push(group.join("\n"));
                group.clear();
                size = 0;
            }
        }

        if !group.is_empty() {
            chunks.push(group.join("\n"));
        }

        chunks
    }
}

/// Convenience wrapper around [`TextChunker::chunk`]
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    TextChunker::new(max_size).chunk(text)
}

fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Split on line terminators (`\r\n` counts as one), discarding them.
/// A trailing terminator does not produce an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_terminator(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r'
            && let Some(&(_, '\n')) = chars.peek()
        {
            chars.next();
            end += 1;
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

use crate::parser::span::Span;

/// Offset → line/column lookup table for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Offset of the start of each line.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (i, &b) in source.iter().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Returns (line, column) for a given byte offset.
    /// Both line and column are 0-based.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        if offset > self.len {
            let last_line = self.line_starts.len() - 1;
            let last_start = self.line_starts[last_line];
            return (last_line, self.len.saturating_sub(last_start));
        }

        match self.line_starts.binary_search(&offset) {
            Ok(line) => (line, 0),
            Err(insert_idx) => {
                let line = insert_idx - 1;
                (line, offset - self.line_starts[line])
            }
        }
    }

    /// 1-based line number of `offset`, as reported by reflection.
    pub fn line(&self, offset: usize) -> usize {
        self.line_col(offset).0 + 1
    }

    /// 1-based column of `offset`, as reported by reflection.
    pub fn column(&self, offset: usize) -> usize {
        self.line_col(offset).1 + 1
    }

    /// 1-based (start_line, end_line) of a span. The end offset is exclusive.
    pub fn line_range(&self, span: Span) -> (usize, usize) {
        let end = if span.end > span.start { span.end - 1 } else { span.end };
        (self.line(span.start), self.line(end))
    }

    /// 1-based (start_column, end_column) of a span. The end column points at the last byte.
    pub fn column_range(&self, span: Span) -> (usize, usize) {
        let end = if span.end > span.start { span.end - 1 } else { span.end };
        (self.column(span.start), self.column(end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

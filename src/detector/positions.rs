/// Byte offsets of line starts, used to turn match offsets into 1-based
/// line/column pairs.
#[derive(Debug)]
pub struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { text, starts }
    }

    /// Column counts characters, not bytes.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.starts[line_idx];
        let column = self.text[line_start..offset].chars().count() + 1;
        (line_idx + 1, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_offsets_across_lines() {
        let text = "first line\nsecond\n\nfourth";
        let index = LineIndex::new(text);
        assert_eq!(index.locate(0), (1, 1));
        assert_eq!(index.locate(6), (1, 7));
        assert_eq!(index.locate(11), (2, 1));
        assert_eq!(index.locate(18), (3, 1));
        assert_eq!(index.locate(19), (4, 1));
        assert_eq!(index.locate(22), (4, 4));
    }

    #[test]
    fn columns_count_characters() {
        let text = "café delve";
        let index = LineIndex::new(text);
        let offset = text.find("delve").unwrap();
        assert_eq!(index.locate(offset), (1, 6));
    }
}

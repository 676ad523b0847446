//! Cursor over template text.

/// A forward-only cursor over the template source.
///
/// `*_padded` methods treat whitespace in front of the literal as part of the
/// match, so tag values come out without trailing whitespace.
pub(crate) struct Scanner<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self { source, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn eos(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn tail(&self) -> &'s str {
        &self.source[self.pos..]
    }

    /// Consume `literal` if the tail starts with it.
    pub(crate) fn scan(&mut self, literal: &str) -> bool {
        if self.tail().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume one character if it is in `set`.
    pub(crate) fn scan_char(&mut self, set: &[char]) -> Option<char> {
        let ch = self.tail().chars().next()?;
        if set.contains(&ch) {
            self.pos += ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    pub(crate) fn skip_whitespace(&mut self) {
        let tail = self.tail();
        self.pos += tail.len() - tail.trim_start().len();
    }

    /// Consume whitespace followed by `literal`, or nothing.
    pub(crate) fn scan_padded(&mut self, literal: &str) -> bool {
        let saved = self.pos;
        self.skip_whitespace();
        if self.scan(literal) {
            true
        } else {
            self.pos = saved;
            false
        }
    }

    /// Skip text up to the next `literal`. Returns the skipped text, which is
    /// the entire tail when `literal` never occurs.
    pub(crate) fn scan_until(&mut self, literal: &str) -> &'s str {
        let tail = self.tail();
        let skipped = match tail.find(literal) {
            Some(idx) => &tail[..idx],
            None => tail,
        };
        self.pos += skipped.len();
        skipped
    }

    /// Like [`Scanner::scan_until`], but stops in front of the whitespace
    /// preceding `literal`.
    pub(crate) fn scan_until_padded(&mut self, literal: &str) -> &'s str {
        let tail = self.tail();
        let skipped = match tail.find(literal) {
            Some(idx) => tail[..idx].trim_end(),
            None => tail,
        };
        self.pos += skipped.len();
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_until_returns_whole_tail_without_match() {
        let mut scanner = Scanner::new("plain text");
        assert_eq!(scanner.scan_until("{{"), "plain text");
        assert!(scanner.eos());
    }

    #[test]
    fn padded_scans_leave_value_trimmed() {
        let mut scanner = Scanner::new(" name  }}rest");
        scanner.skip_whitespace();
        assert_eq!(scanner.scan_until_padded("}}"), "name");
        assert!(scanner.scan_padded("}}"));
        assert_eq!(scanner.scan_until("x"), "rest");
    }

    #[test]
    fn scan_padded_restores_on_miss() {
        let mut scanner = Scanner::new("   x");
        assert!(!scanner.scan_padded("}}"));
        assert_eq!(scanner.pos(), 0);
        assert_eq!(scanner.scan_char(&['#', '^']), None);
    }
}

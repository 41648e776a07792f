#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Pending,
    Matched,
    Mismatched,
    Ignored,
}

/// One-shot prefix match over the first `expected.len()` bytes of a stream.
///
/// The buffer never holds more than the greeting length. Once a verdict has
/// been reached every further `feed` is ignored.
#[derive(Debug)]
pub struct GreetingMatcher {
    expected: Vec<u8>,
    buf: Vec<u8>,
    verdict: Option<Feed>,
}

impl GreetingMatcher {
    pub fn new(expected: impl Into<Vec<u8>>) -> Self {
        let expected = expected.into();
        Self {
            buf: Vec::with_capacity(expected.len()),
            expected,
            verdict: None,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Feed {
        if self.buf.len() >= self.expected.len() {
            return Feed::Ignored;
        }

        let missing = self.expected.len() - self.buf.len();
        let take = chunk.len().min(missing);
        self.buf.extend_from_slice(&chunk[..take]);

        if self.buf.len() < self.expected.len() {
            return Feed::Pending;
        }

        let verdict = if self.buf == self.expected {
            Feed::Matched
        } else {
            Feed::Mismatched
        };
        self.verdict = Some(verdict);
        verdict
    }

    pub fn verdict(&self) -> Option<Feed> {
        self.verdict
    }

    pub fn received(&self) -> &[u8] {
        &self.buf
    }
}

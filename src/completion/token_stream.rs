//! Word stream with cursor awareness for completion
//!
//! This module splits a raw command line into shell words and tracks which
//! word the cursor is in. Quotes and backslash escapes are removed from word
//! text but kept in the spans, so a front-end can replace the raw slice.

use std::ops::Range;

/// One shell word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Text with quotes and escapes removed
    pub text: String,
    /// Byte range of the raw word in the line
    pub span: Range<usize>,
}

/// Word stream with cursor position tracking
#[derive(Debug, Clone)]
pub struct TokenStream {
    /// All words of the line, including any after the cursor
    pub words: Vec<Word>,
    /// Cursor position (byte index in the original input)
    pub cursor: usize,
    /// Index of the word under the cursor; equals the number of words before
    /// the cursor when the cursor sits in blank space
    pub word_index: usize,
    /// Text of the cursor word up to the cursor
    prefix: String,
    /// Byte just past the first `=` of the cursor word's text, in the line
    value_start: Option<usize>,
}

impl TokenStream {
    /// Split `line` and locate the word at `cursor`
    pub fn parse(line: &str, cursor: usize) -> Self {
        let cursor = clamp_to_boundary(line, cursor);
        let words = split_words(line);

        let (word_index, prefix, value_start) = match Self::find_word_at_cursor(&words, cursor) {
            Some(i) => {
                let start = words[i].span.start;
                let raw = &line[start..cursor];
                (i, unquote(raw), raw_value_start(raw).map(|at| start + at))
            }
            None => (
                words.iter().filter(|w| w.span.end < cursor).count(),
                String::new(),
                None,
            ),
        };

        Self {
            words,
            cursor,
            word_index,
            prefix,
            value_start,
        }
    }

    /// Find the word containing the cursor (its end included)
    fn find_word_at_cursor(words: &[Word], cursor: usize) -> Option<usize> {
        words
            .iter()
            .position(|w| cursor >= w.span.start && cursor <= w.span.end)
    }

    /// Words before the cursor word
    pub fn words_before_cursor(&self) -> &[Word] {
        &self.words[..self.word_index.min(self.words.len())]
    }

    /// The text being completed
    pub fn current_prefix(&self) -> &str {
        &self.prefix
    }

    /// Where a completion replaces the line (start of the cursor word)
    pub fn completion_start(&self) -> usize {
        match self.words.get(self.word_index) {
            Some(word) if self.cursor >= word.span.start && self.cursor <= word.span.end => {
                word.span.start
            }
            _ => self.cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Where the value of a `--flag=value` cursor word begins in the line
    ///
    /// Quotes and escapes before the cursor are accounted for, so this is a
    /// raw byte offset, not one into [`current_prefix`](Self::current_prefix).
    pub fn value_start(&self) -> Option<usize> {
        self.value_start
    }
}

fn clamp_to_boundary(line: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

/// Split on unquoted whitespace
fn split_words(line: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => {
                escaped = true;
                start.get_or_insert(i);
            }
            (Some('"'), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => {
                quote = Some(c);
                start.get_or_insert(i);
            }
            (None, c) if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    words.push(Word {
                        text: unquote(&line[s..i]),
                        span: s..i,
                    });
                }
            }
            (None, _) => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        words.push(Word {
            text: unquote(&line[s..]),
            span: s..line.len(),
        });
    }
    words
}

/// Remove quotes and backslash escapes; an unterminated quote runs to the end
fn unquote(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), c) => text.push(c),
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    text.push(next);
                }
            }
            (Some('"'), '"') => quote = None,
            (Some(_), c) => text.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, c) => text.push(c),
        }
    }
    text
}

/// Offset in `raw` just past the character that unquotes to the first `=`
fn raw_value_start(raw: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut chars = raw.char_indices();

    while let Some((i, c)) = chars.next() {
        let literal = match (quote, c) {
            (Some('\''), '\'') => {
                quote = None;
                None
            }
            (Some('\''), c) => Some((i, c)),
            (_, '\\') => chars.next(),
            (Some('"'), '"') => {
                quote = None;
                None
            }
            (Some(_), c) => Some((i, c)),
            (None, '\'' | '"') => {
                quote = Some(c);
                None
            }
            (None, c) => Some((i, c)),
        };
        if let Some((at, '=')) = literal {
            return Some(at + 1);
        }
    }
    None
}

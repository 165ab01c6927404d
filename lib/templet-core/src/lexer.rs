//! Splitting template source into tokens.

use std::sync::OnceLock;

use regex::Regex;

/// Classification of a [`Token`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// Literal text between tags.
    Text,

    /// A `{{ ... }}` expression.
    Variable,

    /// A `{% ... %}` tag.
    Block,

    /// A `{# ... #}` comment. Carries no content.
    Comment,
}

/// A classified fragment of template source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// What the fragment is.
    pub kind: TokenKind,

    /// Text for `Text` tokens; trimmed inner content for `Variable` and `Block` tokens; empty for comments.
    pub content: String,

    /// One-based line on which the fragment starts.
    pub line: usize,
}

impl Token {
    /// Creates a token.
    pub fn new<S: Into<String>>(kind: TokenKind, content: S, line: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            line,
        }
    }

    /// Returns the first whitespace-separated word of the content, which is the command of a block tag.
    pub fn command(&self) -> &str {
        self.content.split_whitespace().next().unwrap_or("")
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"(?s)\{%.*?%\}|\{\{.*?\}\}|\{#.*?#\}").expect("tag pattern should be valid"))
}

/// Splits template source into tokens.
///
/// Never fails: malformed tags are left for the parser to reject. A text token is emitted before every tag, even when
/// empty, and once more for whatever follows the last tag.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut last_end = 0;

    for m in tag_regex().find_iter(source) {
        let text = &source[last_end..m.start()];
        tokens.push(Token::new(TokenKind::Text, text, line));
        line += count_newlines(text);

        tokens.push(classify(m.as_str(), line));
        line += count_newlines(m.as_str());
        last_end = m.end();
    }

    tokens.push(Token::new(TokenKind::Text, &source[last_end..], line));
    tokens
}

/// Splits template source into tokens, removing the whitespace around tags that sit alone on their line.
///
/// A line holding nothing but one block or comment tag and surrounding spaces or tabs disappears entirely, newline
/// included. Variable tags are never trimmed since they produce output.
pub fn tokenize_smart_trim(source: &str) -> Vec<Token> {
    let mut tokens = tokenize(source);

    // Cut points are computed against the untrimmed tokens, then applied in one pass.
    let mut cuts = tokens.iter().map(|t| (0, t.content.len())).collect::<Vec<_>>();
    let last = tokens.len() - 1;

    for i in (1..last).step_by(2) {
        if !matches!(tokens[i].kind, TokenKind::Block | TokenKind::Comment) {
            continue;
        }

        let prev = &tokens[i - 1].content;
        let line_start = match prev.rfind('\n') {
            Some(pos) => pos + 1,
            None if i - 1 == 0 => 0,
            None => continue,
        };
        if !is_blank(&prev[line_start..]) {
            continue;
        }

        let next = &tokens[i + 1].content;
        let line_end = match next.find('\n') {
            Some(pos) => pos + 1,
            None if i + 1 == last => next.len(),
            None => continue,
        };
        if !is_blank(next[..line_end].trim_end_matches('\n')) {
            continue;
        }

        cuts[i - 1].1 = line_start;
        cuts[i + 1].0 = line_end;
    }

    for (token, (start, end)) in tokens.iter_mut().zip(cuts) {
        if token.kind == TokenKind::Text && (start, end) != (0, token.content.len()) {
            let start = start.min(end);
            token.content = token.content[start..end].to_string();
        }
    }
    tokens
}

fn classify(raw: &str, line: usize) -> Token {
    // Every delimiter is two ASCII bytes long.
    let inner = raw[2..raw.len() - 2].trim();
    match &raw[..2] {
        "{{" => Token::new(TokenKind::Variable, inner, line),
        "{%" => Token::new(TokenKind::Block, inner, line),
        _ => Token::new(TokenKind::Comment, "", line),
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t' || c == '\r')
}

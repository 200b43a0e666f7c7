//! Shared tokenization, identifier canonicalization, shingling and MinHash
//! primitives, grounded in the teacher's `UniversalFeatureExtractor` and
//! `MinHashGenerator` — reused here by the duplicate engine.

use crate::model::MinHashSignature;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use xxhash_rust::xxh64::xxh64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Literal,
    Keyword,
    Operator,
    Delimiter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

const KEYWORDS: &[&str] = &[
    // Rust
    "fn", "let", "mut", "if", "else", "match", "for", "while", "loop", "return", "break",
    "continue", "struct", "enum", "impl", "trait", "mod", "use", "pub", "crate", "super", "self",
    "Self", "where", "async", "await", "const", "static", "extern", "unsafe",
    // C-family / Java / C#
    "def", "function", "fun", "class", "interface", "namespace", "template", "typename",
    "virtual", "override", "private", "protected", "public", "new", "delete", "try", "catch",
    "throw", "finally", "using", "friend", "constexpr", "explicit", "mutable", "operator",
    "this", "nullptr", "null", "None", "True", "False", "true", "false", "void", "int", "long",
    "short", "float", "double", "char", "bool", "string", "var", "val", "do", "switch", "case",
    "default", "import", "export", "from", "as", "in", "is", "not", "and", "or", "lambda",
    "yield", "with", "elif", "end", "then", "begin", "module", "require", "include",
];

fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

/// Hand-rolled char-by-char tokenizer shared across all generic-backend
/// languages; the native Rust parser still routes through this for clone
/// detection since clone fragments are compared as raw token text, not AST.
pub fn tokenize(source: &str, ignore_comments: bool) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {}
            '/' if ignore_comments && matches!(chars.peek(), Some((_, '/'))) => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '#' if ignore_comments => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                let mut ident = String::new();
                ident.push(ch);
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        ident.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = if is_keyword(&ident) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                tokens.push(Token { kind, text: ident });
            }
            ch if ch.is_ascii_digit() => {
                let mut number = String::new();
                number.push(ch);
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '.' {
                        number.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Literal,
                    text: number,
                });
            }
            '"' | '\'' => {
                let quote = ch;
                let mut literal = String::new();
                literal.push(ch);
                for (_, c) in chars.by_ref() {
                    literal.push(c);
                    if c == quote {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Literal,
                    text: literal,
                });
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';' | '.' => {
                tokens.push(Token {
                    kind: TokenKind::Delimiter,
                    text: ch.to_string(),
                });
            }
            _ => {
                tokens.push(Token {
                    kind: TokenKind::Operator,
                    text: ch.to_string(),
                });
            }
        }
    }

    tokens
}

/// Per-analyzer identifier canonicalization table: maps each distinct
/// identifier to `VAR_n` in first-occurrence order. Must be shared by all
/// fragments compared within the same analysis for signature equality to be
/// meaningful across files.
#[derive(Default)]
pub struct IdentifierTable {
    counter: AtomicU32,
    map: DashMap<String, String>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonicalize(&self, name: &str) -> String {
        if let Some(existing) = self.map.get(name) {
            return existing.clone();
        }
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let canonical = format!("VAR_{id}");
        self.map
            .entry(name.to_string())
            .or_insert(canonical)
            .clone()
    }
}

/// Applies identifier/literal normalization per the duplicate config.
pub fn normalize(
    tokens: &[Token],
    identifiers: &IdentifierTable,
    normalize_identifiers: bool,
    normalize_literals: bool,
) -> Vec<Token> {
    tokens
        .iter()
        .map(|t| match t.kind {
            TokenKind::Identifier if normalize_identifiers => Token {
                kind: TokenKind::Identifier,
                text: identifiers.canonicalize(&t.text),
            },
            TokenKind::Literal if normalize_literals => Token {
                kind: TokenKind::Literal,
                text: "LITERAL".to_string(),
            },
            _ => t.clone(),
        })
        .collect()
}

/// Hashes sliding windows of `k` tokens into shingles with a seeded 64-bit
/// hash (blake3), stable across runs. Streams shorter than `k` degenerate to
/// a single shingle over the whole sequence (spec §9 open question: this
/// yields signatures comparable only within that degenerate class).
pub fn shingle(tokens: &[Token], k: usize) -> Vec<u64> {
    if tokens.is_empty() {
        return Vec::new();
    }
    if tokens.len() < k {
        return vec![hash_window(tokens)];
    }
    tokens.windows(k).map(hash_window).collect()
}

fn hash_window(window: &[Token]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for token in window {
        hasher.update(token.text.as_bytes());
        hasher.update(&[0u8]);
    }
    let digest = hasher.finalize();
    u64::from_le_bytes(digest.as_bytes()[0..8].try_into().unwrap())
}

/// Builds a length-`num_hashes` MinHash signature over a shingle multiset,
/// one independent seed per slot.
pub fn minhash_signature(shingles: &[u64], num_hashes: usize) -> MinHashSignature {
    let mut signature = vec![u64::MAX; num_hashes];
    for &shingle in shingles {
        for (i, slot) in signature.iter_mut().enumerate() {
            let h = xxh64(&shingle.to_le_bytes(), i as u64);
            if h < *slot {
                *slot = h;
            }
        }
    }
    MinHashSignature(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_function() {
        let tokens = tokenize("fn main() { return 42 }", true);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Keyword && t.text == "fn"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Literal && t.text == "42"));
    }

    #[test]
    fn identifier_table_is_stable_and_ordered() {
        let table = IdentifierTable::new();
        assert_eq!(table.canonicalize("foo"), "VAR_0");
        assert_eq!(table.canonicalize("bar"), "VAR_1");
        assert_eq!(table.canonicalize("foo"), "VAR_0");
    }

    #[test]
    fn minhash_is_deterministic() {
        let tokens = tokenize("fn main() { return 42 }", true);
        let shingles = shingle(&tokens, 5);
        let sig1 = minhash_signature(&shingles, 200);
        let sig2 = minhash_signature(&shingles, 200);
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 200);
    }

    #[test]
    fn short_stream_degenerates_to_one_shingle() {
        let tokens = tokenize("x", true);
        let shingles = shingle(&tokens, 5);
        assert_eq!(shingles.len(), 1);
    }
}

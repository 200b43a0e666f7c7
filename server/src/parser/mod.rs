//! Parser facade (spec §6). Maps a file path to a language tag and a parse
//! result exposing functions and classes, the way the duplicate, complexity
//! and cohesion engines need them.

pub mod generic;
pub mod rust_ast;

use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    CSharp,
    Cpp,
    C,
    Ruby,
    Php,
    Java,
    Go,
    Other,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" => Language::Python,
            "js" | "jsx" | "mjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "cs" => Language::CSharp,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "c" | "h" => Language::C,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "java" => Language::Java,
            "go" => Language::Go,
            _ => Language::Other,
        }
    }

    /// OO languages the cohesion engine extracts classes from (spec §4.6).
    pub fn is_oo(self) -> bool {
        matches!(
            self,
            Language::Java
                | Language::Python
                | Language::JavaScript
                | Language::TypeScript
                | Language::CSharp
                | Language::Cpp
                | Language::Ruby
                | Language::Php
        )
    }
}

#[derive(Debug, Clone)]
pub struct ParsedFunction {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ParsedMethod {
    pub name: String,
    pub used_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedClass {
    pub name: String,
    pub parents: Vec<String>,
    pub fields: Vec<String>,
    pub methods: Vec<ParsedMethod>,
}

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub language: Language,
    pub source: String,
    pub functions: Vec<ParsedFunction>,
    pub classes: Vec<ParsedClass>,
}

pub trait ParserFacade {
    fn parse(&self, path: &Path) -> Result<ParseResult>;
}

/// Picks the native `syn` backend for Rust and falls back to the generic
/// heuristic backend for everything else.
pub struct AutoParser;

impl ParserFacade for AutoParser {
    fn parse(&self, path: &Path) -> Result<ParseResult> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match Language::from_extension(ext) {
            Language::Rust => rust_ast::parse(path),
            _ => generic::parse(path),
        }
    }
}

pub fn get_functions(result: &ParseResult) -> &[ParsedFunction] {
    &result.functions
}

pub fn get_classes(result: &ParseResult) -> &[ParsedClass] {
    &result.classes
}

//! Complexity kernel (spec §4.3): counts decision points (cyclomatic) and
//! weighted nested branches (cognitive) over a function body.
//!
//! Operates on the function body text handed back by the parser facade
//! rather than a language-specific AST, so the same kernel serves every
//! backend (native Rust included — clone/complexity comparisons need the
//! same textual notion of "decision point" the generic backend uses).
//! Grounded in the teacher's `ComplexityVisitor` nesting-tracking idiom
//! (`enter_nesting`/`exit_nesting`), reimplemented over lines+braces instead
//! of `syn` visitation.

use crate::error::Result;
use crate::model::{FileComplexity, FunctionComplexity};
use crate::parser::{AutoParser, ParserFacade};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::path::Path;

static DECISION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(if|elif|else\s+if|for|while|do|case|when|catch|except|rescue)\b",
    )
    .unwrap()
});

static LOGICAL_OP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(&&|\|\||\band\b|\bor\b)").unwrap());

static TERNARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?[^:?]*:").unwrap());

pub fn cyclomatic_complexity(body: &str) -> u32 {
    let mut count: u32 = 1;
    for line in body.lines() {
        count += DECISION.find_iter(line).count() as u32;
        count += LOGICAL_OP.find_iter(line).count() as u32;
        count += TERNARY.find_iter(line).count() as u32;
    }
    count
}

pub fn cognitive_complexity(body: &str) -> u32 {
    let mut cognitive: u32 = 0;
    let mut brace_depth: i64 = 0;

    for line in body.lines() {
        let nesting = (brace_depth - 1).max(0) as u32;

        if DECISION.is_match(line) {
            cognitive += 1 + nesting;
        }
        // A run of logical operators on one line counts once, unweighted by
        // nesting, per spec §4.3.
        if LOGICAL_OP.is_match(line) {
            cognitive += 1;
        }
        if TERNARY.is_match(line) {
            cognitive += 1 + nesting;
        }

        for ch in line.chars() {
            match ch {
                '{' => brace_depth += 1,
                '}' => brace_depth -= 1,
                _ => {}
            }
        }
    }

    cognitive
}

pub fn complexity_of(body: &str) -> FunctionComplexity {
    FunctionComplexity {
        cyclomatic: cyclomatic_complexity(body),
        cognitive: cognitive_complexity(body),
    }
}

/// Parses every file and averages per-function complexity, per spec §4.3:
/// an empty-function file averages to 0 and contributes 0 to aggregates.
///
/// Each file is independent, so this is a parallel map over the file list
/// (spec §5's worker-pool facade): every worker owns its own `AutoParser`
/// handle and results are folded back serially by the caller.
pub fn analyze_files(paths: &[std::path::PathBuf]) -> Result<Vec<FileComplexity>> {
    let results = paths
        .par_iter()
        .filter_map(|path| {
            let parser = AutoParser;
            match parser.parse(path) {
                Ok(parsed) => Some(analyze_parsed(path, &parsed)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparseable file");
                    None
                }
            }
        })
        .collect();
    Ok(results)
}

fn analyze_parsed(path: &Path, parsed: &crate::parser::ParseResult) -> FileComplexity {
    if parsed.functions.is_empty() {
        return FileComplexity {
            path: path.display().to_string(),
            avg_cyclomatic: 0.0,
            avg_cognitive: 0.0,
            function_count: 0,
        };
    }
    let n = parsed.functions.len() as f64;
    let total_cyc: u32 = parsed
        .functions
        .iter()
        .map(|f| cyclomatic_complexity(&f.body))
        .sum();
    let total_cog: u32 = parsed
        .functions
        .iter()
        .map(|f| cognitive_complexity(&f.body))
        .sum();

    FileComplexity {
        path: path.display().to_string(),
        avg_cyclomatic: total_cyc as f64 / n,
        avg_cognitive: total_cog as f64 / n,
        function_count: parsed.functions.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_function_has_complexity_one() {
        let body = "fn f() {\n    let x = 1;\n    return x;\n}";
        assert_eq!(cyclomatic_complexity(body), 1);
        assert_eq!(cognitive_complexity(body), 0);
    }

    #[test]
    fn nested_if_adds_nesting_weight() {
        let body = "fn f(x: i32) {\n    if x > 0 {\n        if x > 10 {\n            return 1;\n        }\n    }\n}";
        // outer if at nesting 0 (+1), inner if at nesting 1 (+1+1=2) => 3
        assert_eq!(cognitive_complexity(body), 3);
        assert_eq!(cyclomatic_complexity(body), 3);
    }

    #[test]
    fn logical_operator_run_counts_once() {
        let body = "fn f(a: bool, b: bool, c: bool) {\n    if a && b && c {\n        return;\n    }\n}";
        // one decision (+1) and one logical-operator line (+1) = 2
        assert_eq!(cognitive_complexity(body), 2);
    }

    #[test]
    fn empty_function_file_averages_to_zero() {
        let fc = FileComplexity {
            path: "empty.rs".into(),
            avg_cyclomatic: 0.0,
            avg_cognitive: 0.0,
            function_count: 0,
        };
        assert_eq!(fc.avg_cognitive, 0.0);
    }
}

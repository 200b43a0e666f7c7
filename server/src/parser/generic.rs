//! Generic line/regex-heuristic backend for every language besides Rust,
//! grounded in the teacher's own simplified tokenizer in
//! `duplicate_detector.rs`: good enough to find function and class
//! boundaries across the OO language set without vendoring a parser per
//! language.

use super::{Language, ParseResult, ParsedClass, ParsedFunction, ParsedMethod};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static FUNCTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(pub\s+|private\s+|public\s+|protected\s+|static\s+|async\s+)*(fn|def|function|fun)\s+(\w+)|^\s*\w[\w<>,\s\[\]]*\s+(\w+)\s*\(.*\)\s*\{?\s*$",
    )
    .unwrap()
});

static CLASS_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(pub\s+|public\s+)?(class|interface|struct|trait)\s+(\w+)(?:\s*[:(]?\s*(?:extends|implements|inherits)?\s*([\w,\s<>]*))?").unwrap());

static FIELD_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(private|public|protected)?\s*(?:readonly\s+)?(?:static\s+)?[\w<>\[\],\s]+\s+(\w+)\s*[;=]").unwrap());

pub fn parse(path: &Path) -> Result<ParseResult> {
    let source = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let language = Language::from_extension(ext);

    let lines: Vec<&str> = source.lines().collect();
    let functions = extract_functions(&lines);
    let classes = if language.is_oo() {
        extract_classes(&lines)
    } else {
        Vec::new()
    };

    Ok(ParseResult {
        language,
        source,
        functions,
        classes,
    })
}

fn extract_functions(lines: &[&str]) -> Vec<ParsedFunction> {
    let mut functions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(caps) = FUNCTION_START.captures(lines[i]) {
            let name = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| format!("fn_{i}"));
            let end = find_block_end(lines, i);
            let body = lines[i..=end].join("\n");
            functions.push(ParsedFunction {
                name,
                start_line: i + 1,
                end_line: end + 1,
                body,
            });
            i = end + 1;
        } else {
            i += 1;
        }
    }
    functions
}

fn extract_classes(lines: &[&str]) -> Vec<ParsedClass> {
    let mut classes = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(caps) = CLASS_START.captures(lines[i]) {
            let name = caps
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| format!("class_{i}"));
            let parents = caps
                .get(4)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(|s| clean_type(s.trim()))
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            let end = find_block_end(lines, i);
            let body = &lines[i..=end];

            let fields = body
                .iter()
                .filter_map(|l| FIELD_DECL.captures(l))
                .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
                .collect();

            let methods = extract_functions(body)
                .into_iter()
                .map(|f| ParsedMethod {
                    used_fields: infer_used_fields(&f.body, &fields_of(body)),
                    name: f.name,
                })
                .collect();

            classes.push(ParsedClass {
                name,
                parents,
                fields,
                methods,
            });
            i = end + 1;
        } else {
            i += 1;
        }
    }
    classes
}

fn fields_of(body: &[&str]) -> Vec<String> {
    body.iter()
        .filter_map(|l| FIELD_DECL.captures(l))
        .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

/// A method "uses" a field if `this.<field>` / `self.<field>` appears in its
/// body text — a coarse but adequate signal for LCOM4 across the generic
/// backend's languages.
fn infer_used_fields(method_body: &str, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| {
            method_body.contains(&format!("this.{f}")) || method_body.contains(&format!("self.{f}"))
        })
        .cloned()
        .collect()
}

/// Strips parametric suffixes (`<...>`, `[...]`) and drops known
/// primitive/builtin names before a type name enters the inheritance tree.
pub fn clean_type(raw: &str) -> String {
    let without_generics = raw.split(['<', '[']).next().unwrap_or(raw).trim();
    const BUILTINS: &[&str] = &[
        "int", "string", "bool", "void", "None", "object", "float", "double", "char", "long",
        "short", "byte", "Object", "Any",
    ];
    if BUILTINS.contains(&without_generics) {
        String::new()
    } else {
        without_generics.to_string()
    }
}

/// Finds the end of a brace-delimited block starting at `start`, or falls
/// back to indentation for brace-less languages (Python).
fn find_block_end(lines: &[&str], start: usize) -> usize {
    let first = lines[start];
    if first.trim_end().ends_with(':') || looks_like_python(lines, start) {
        let base_indent = indent_of(first);
        let mut end = start;
        for (offset, line) in lines.iter().enumerate().skip(start + 1) {
            if line.trim().is_empty() {
                end = start + offset - start;
                continue;
            }
            if indent_of(line) <= base_indent {
                break;
            }
            end = offset;
        }
        return end;
    }

    let mut depth: i64 = 0;
    let mut seen_open = false;
    for (offset, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    seen_open = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if seen_open && depth <= 0 {
            return offset;
        }
    }
    lines.len() - 1
}

fn looks_like_python(lines: &[&str], start: usize) -> bool {
    lines[start].trim_start().starts_with("def ")
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_generic_and_builtin_types() {
        assert_eq!(clean_type("List<Base>"), "List");
        assert_eq!(clean_type("int"), "");
        assert_eq!(clean_type("Animal"), "Animal");
    }

    #[test]
    fn extracts_python_function_by_indentation() {
        let src = "def foo():\n    x = 1\n    return x\n\nprint('done')";
        let lines: Vec<&str> = src.lines().collect();
        let fns = extract_functions(&lines);
        assert_eq!(fns.len(), 1);
        assert_eq!(fns[0].name, "foo");
    }

    #[test]
    fn extracts_class_with_parent() {
        let src = "class Dog extends Animal {\n  private String name;\n  public bark() { return this.name; }\n}";
        let lines: Vec<&str> = src.lines().collect();
        let classes = extract_classes(&lines);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].parents, vec!["Animal".to_string()]);
    }
}

//! Native Rust backend of the parser facade, grounded in the teacher's
//! `syn::visit::Visit`-based AST walk. Structs + their `impl` blocks stand in
//! for "classes": fields come from the struct, methods from inherent and
//! trait impls, and trait bounds/`impl Trait for Struct` stand in for
//! parents.

use super::{Language, ParseResult, ParsedClass, ParsedFunction, ParsedMethod};
use crate::error::{AnalysisError, Result};
use std::collections::HashMap;
use std::path::Path;
use syn::visit::{self, Visit};
use syn::{Expr, ItemFn, ItemImpl, ItemStruct, Type};

pub fn parse(path: &Path) -> Result<ParseResult> {
    let source = std::fs::read_to_string(path)?;
    let file = syn::parse_file(&source)
        .map_err(|e| AnalysisError::InvariantViolation(format!("rust parse error: {e}")))?;

    let mut visitor = RustVisitor::new(&source);
    visitor.visit_file(&file);

    let functions = std::mem::take(&mut visitor.functions);
    let classes = visitor.finish_classes();

    Ok(ParseResult {
        language: Language::Rust,
        source,
        functions,
        classes,
    })
}

struct StructShape {
    fields: Vec<String>,
    parents: Vec<String>,
}

struct RustVisitor<'s> {
    source: &'s str,
    functions: Vec<ParsedFunction>,
    structs: HashMap<String, StructShape>,
    methods: HashMap<String, Vec<ParsedMethod>>,
}

impl<'s> RustVisitor<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            functions: Vec::new(),
            structs: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    fn span_lines(&self, spanned: &impl syn::spanned::Spanned) -> (usize, usize) {
        let span = spanned.span();
        (span.start().line, span.end().line)
    }

    fn finish_classes(self) -> Vec<ParsedClass> {
        self.structs
            .into_iter()
            .map(|(name, shape)| ParsedClass {
                methods: self.methods.get(&name).cloned().unwrap_or_default(),
                name,
                parents: shape.parents,
                fields: shape.fields,
            })
            .collect()
    }
}

impl<'ast, 's> Visit<'ast> for RustVisitor<'s> {
    fn visit_item_fn(&mut self, node: &'ast ItemFn) {
        let (start, end) = self.span_lines(node);
        let name = node.sig.ident.to_string();
        let body = extract_lines(self.source, start, end);
        self.functions.push(ParsedFunction {
            name,
            start_line: start,
            end_line: end,
            body,
        });
        visit::visit_item_fn(self, node);
    }

    fn visit_item_struct(&mut self, node: &'ast ItemStruct) {
        let name = node.ident.to_string();
        let fields = match &node.fields {
            syn::Fields::Named(named) => named
                .named
                .iter()
                .filter_map(|f| f.ident.as_ref().map(|i| i.to_string()))
                .collect(),
            syn::Fields::Unnamed(unnamed) => (0..unnamed.unnamed.len())
                .map(|i| i.to_string())
                .collect(),
            syn::Fields::Unit => Vec::new(),
        };
        self.structs.insert(
            name,
            StructShape {
                fields,
                parents: Vec::new(),
            },
        );
        visit::visit_item_struct(self, node);
    }

    fn visit_item_impl(&mut self, node: &'ast ItemImpl) {
        if let Type::Path(type_path) = node.self_ty.as_ref() {
            if let Some(segment) = type_path.path.segments.last() {
                let struct_name = segment.ident.to_string();

                if let Some((_, trait_path, _)) = &node.trait_ {
                    if let Some(trait_name) = trait_path.segments.last() {
                        if let Some(shape) = self.structs.get_mut(&struct_name) {
                            shape.parents.push(trait_name.ident.to_string());
                        }
                    }
                }

                let mut impl_methods = Vec::new();
                for item in &node.items {
                    if let syn::ImplItem::Fn(method) = item {
                        let mut field_collector = FieldUseCollector::default();
                        field_collector.visit_impl_item_fn(method);
                        impl_methods.push(ParsedMethod {
                            name: method.sig.ident.to_string(),
                            used_fields: field_collector.fields.into_iter().collect(),
                        });
                    }
                }
                self.methods
                    .entry(struct_name)
                    .or_default()
                    .extend(impl_methods);
            }
        }
        visit::visit_item_impl(self, node);
    }
}

fn extract_lines(source: &str, start: usize, end: usize) -> String {
    source
        .lines()
        .skip(start.saturating_sub(1))
        .take(end.saturating_sub(start) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collects `self.field` accesses inside a method body, used for LCOM4.
#[derive(Default)]
struct FieldUseCollector {
    fields: std::collections::BTreeSet<String>,
}

impl<'ast> Visit<'ast> for FieldUseCollector {
    fn visit_expr_field(&mut self, node: &'ast syn::ExprField) {
        if is_self_receiver(&node.base) {
            if let syn::Member::Named(ident) = &node.member {
                self.fields.insert(ident.to_string());
            }
        }
        visit::visit_expr_field(self, node);
    }
}

fn is_self_receiver(expr: &Expr) -> bool {
    matches!(expr, Expr::Path(p) if p.path.is_ident("self"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extracts_functions_and_struct_fields() {
        let mut file = tempfile::NamedTempFile::with_suffix(".rs").unwrap();
        writeln!(
            file,
            "struct Point {{ x: i32, y: i32 }}\nimpl Point {{ fn sum(&self) -> i32 {{ self.x + self.y }} }}\nfn standalone() {{}}"
        )
        .unwrap();
        let result = parse(file.path()).unwrap();
        assert_eq!(result.functions.len(), 2);
        assert_eq!(result.classes.len(), 1);
        let point = &result.classes[0];
        assert_eq!(point.fields, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(point.methods[0].used_fields, vec!["x".to_string(), "y".to_string()]);
    }
}

//! Cohesion/coupling engine (spec §4.6): LCOM4 via connected components over
//! the method–shared-field graph, DIT/NOC over a cross-file, possibly cyclic
//! inheritance tree. Grounded in the teacher's DAG-as-name-keyed-maps design
//! note (§9) rather than pointer-chasing class objects.

use crate::error::Result;
use crate::model::ClassRecord;
use crate::parser::generic::clean_type;
use crate::parser::{AutoParser, ParserFacade};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohesionReport {
    pub classes: Vec<ClassRecord>,
    pub languages_covered: usize,
}

fn is_test_file(path: &PathBuf) -> bool {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    if stem.ends_with("_test") || stem.ends_with("_spec") || stem.starts_with("test_") {
        return true;
    }
    path.components()
        .any(|c| c.as_os_str() == "tests" || c.as_os_str() == "test")
}

pub fn analyze(paths: &[PathBuf]) -> Result<CohesionReport> {
    // Parallel map over files (spec §5): each worker owns its own parser
    // handle; per-file class lists are folded back into one vector serially.
    let per_file: Vec<(crate::parser::Language, Vec<(PathBuf, crate::parser::ParsedClass)>)> = paths
        .par_iter()
        .filter_map(|path| {
            if is_test_file(path) {
                return None;
            }
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let language = crate::parser::Language::from_extension(ext);
            if !language.is_oo() {
                return None;
            }

            let parser = AutoParser;
            let parsed = match parser.parse(path) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparseable file in cohesion analysis");
                    return None;
                }
            };
            let classes = parsed.classes.into_iter().map(|c| (path.clone(), c)).collect::<Vec<_>>();
            Some((language, classes))
        })
        .collect();

    let mut raw_classes: Vec<(crate::parser::Language, PathBuf, crate::parser::ParsedClass)> = Vec::new();
    let mut languages_seen: HashSet<crate::parser::Language> = HashSet::new();
    for (language, classes) in per_file {
        if !classes.is_empty() {
            languages_seen.insert(language);
        }
        raw_classes.extend(classes.into_iter().map(|(path, c)| (language, path, c)));
    }

    let parents_of: HashMap<String, Vec<String>> = raw_classes
        .iter()
        .map(|(_, _, c)| {
            let parents = c
                .parents
                .iter()
                .map(|p| clean_type(p))
                .filter(|p| !p.is_empty())
                .collect();
            (c.name.clone(), parents)
        })
        .collect();

    let mut children_of: HashMap<String, HashSet<String>> = HashMap::new();
    for (child, parents) in &parents_of {
        for parent in parents {
            children_of.entry(parent.clone()).or_default().insert(child.clone());
        }
    }

    let classes: Vec<ClassRecord> = raw_classes
        .into_iter()
        .map(|(language, path, c)| {
            let lcom4 = compute_lcom4(&c);
            let dit = compute_dit(&c.name, &parents_of, &mut HashSet::new());
            let noc = children_of.get(&c.name).map(|s| s.len()).unwrap_or(0);
            ClassRecord {
                language: format!("{language:?}"),
                name: c.name,
                path: path.display().to_string(),
                fields: c.fields,
                methods: c
                    .methods
                    .into_iter()
                    .map(|m| crate::model::MethodInfo {
                        name: m.name,
                        used_fields: m.used_fields,
                    })
                    .collect(),
                parents: c.parents,
                lcom4,
                dit,
                noc,
            }
        })
        .collect();

    Ok(CohesionReport {
        classes,
        languages_covered: languages_seen.len(),
    })
}

/// LCOM4: number of connected components over the graph whose vertices are
/// methods and whose edges connect methods sharing an instance field.
fn compute_lcom4(class: &crate::parser::ParsedClass) -> usize {
    if class.methods.is_empty() {
        return 0;
    }

    let n = class.methods.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let shares_field = class.methods[i]
                .used_fields
                .iter()
                .any(|f| class.methods[j].used_fields.contains(f));
            if shares_field {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri] = rj;
                }
            }
        }
    }

    let roots: HashSet<usize> = (0..n).map(|i| find(&mut parent, i)).collect();
    roots.len()
}

/// Longest path from `class` to any root in `classToParents`; a visited set
/// bounds traversal of cyclic hierarchies.
fn compute_dit(
    class: &str,
    parents_of: &HashMap<String, Vec<String>>,
    visiting: &mut HashSet<String>,
) -> usize {
    let parents = match parents_of.get(class) {
        Some(p) if !p.is_empty() => p,
        _ => return 0,
    };
    if !visiting.insert(class.to_string()) {
        return 0;
    }
    let max_parent_dit = parents
        .iter()
        .map(|p| compute_dit(p, parents_of, visiting))
        .max()
        .unwrap_or(0);
    visiting.remove(class);
    1 + max_parent_dit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParsedClass, ParsedMethod};

    fn class_with(methods: Vec<(&str, Vec<&str>)>) -> ParsedClass {
        ParsedClass {
            name: "C".into(),
            parents: vec![],
            fields: vec![],
            methods: methods
                .into_iter()
                .map(|(name, fields)| ParsedMethod {
                    name: name.into(),
                    used_fields: fields.into_iter().map(String::from).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn lcom4_example_from_spec() {
        let c = class_with(vec![
            ("m1", vec!["f1"]),
            ("m2", vec!["f1", "f2"]),
            ("m3", vec!["f2"]),
        ]);
        assert_eq!(compute_lcom4(&c), 1);

        let c2 = class_with(vec![("m1", vec!["f1"]), ("m2", vec!["f3"]), ("m3", vec!["f2"])]);
        assert_eq!(compute_lcom4(&c2), 2);
    }

    #[test]
    fn empty_class_has_zero_lcom4() {
        let c = class_with(vec![]);
        assert_eq!(compute_lcom4(&c), 0);
    }

    #[test]
    fn dit_of_root_is_zero() {
        let mut parents = HashMap::new();
        parents.insert("Root".to_string(), vec![]);
        parents.insert("Child".to_string(), vec!["Root".to_string()]);
        assert_eq!(compute_dit("Root", &parents, &mut HashSet::new()), 0);
        assert_eq!(compute_dit("Child", &parents, &mut HashSet::new()), 1);
    }

    #[test]
    fn dit_tolerates_cycles() {
        let mut parents = HashMap::new();
        parents.insert("A".to_string(), vec!["B".to_string()]);
        parents.insert("B".to_string(), vec!["A".to_string()]);
        // must terminate, not stack-overflow
        let _ = compute_dit("A", &parents, &mut HashSet::new());
    }

    #[test]
    fn noc_counts_distinct_children_once() {
        let mut parents_of = HashMap::new();
        parents_of.insert("Base".to_string(), vec![]);
        parents_of.insert("ChildA".to_string(), vec!["Base".to_string()]);
        parents_of.insert("ChildB".to_string(), vec!["Base".to_string(), "Other".to_string()]);

        let mut children_of: HashMap<String, HashSet<String>> = HashMap::new();
        for (child, parents) in &parents_of {
            for parent in parents {
                children_of.entry(parent.clone()).or_default().insert(child.clone());
            }
        }
        assert_eq!(children_of.get("Base").unwrap().len(), 2);
    }
}

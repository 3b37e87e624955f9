use crate::models::ImportSet;
use tree_sitter::{Node, Parser, Tree};

use super::{ImportParser, ParserError};

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ParserError::InitError(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Walk the whole tree; import statements may be nested in any block
    fn extract_imports(&self, source: &str, tree: &Tree) -> ImportSet {
        let mut imports = ImportSet::new();
        let mut cursor = tree.walk();

        loop {
            let node = cursor.node();
            let descend = match node.kind() {
                "import_statement" => {
                    self.parse_import_statement(&node, source, &mut imports);
                    false
                }
                "import_from_statement" => {
                    self.parse_import_from_statement(&node, source, &mut imports);
                    false
                }
                "future_import_statement" => {
                    imports.insert("__future__".to_string());
                    false
                }
                _ => true,
            };

            if descend && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return imports;
                }
            }
        }
    }

    /// Parse `import x, y.z` or `import x as alias`
    fn parse_import_statement(&self, node: &Node, source: &str, imports: &mut ImportSet) {
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            let dotted = match child.kind() {
                "dotted_name" => Some(child),
                "aliased_import" => child.child_by_field_name("name"),
                _ => None,
            };
            if let Some(dotted) = dotted {
                self.insert_top_level(&dotted, source, imports);
            }
        }
    }

    /// Parse `from x.y import z`; relative forms (`from . import x`,
    /// `from ..x import y`) never name a distribution and are dropped.
    fn parse_import_from_statement(&self, node: &Node, source: &str, imports: &mut ImportSet) {
        if let Some(module) = node.child_by_field_name("module_name") {
            if module.kind() == "dotted_name" {
                self.insert_top_level(&module, source, imports);
            }
        }
    }

    fn insert_top_level(&self, dotted: &Node, source: &str, imports: &mut ImportSet) {
        let text = self.get_node_text(dotted, source);
        if let Some(first) = text.split('.').next().map(str::trim) {
            if !first.is_empty() {
                imports.insert(first.to_string());
            }
        }
    }

    fn get_node_text<'s>(&self, node: &Node, source: &'s str) -> &'s str {
        &source[node.byte_range()]
    }
}

impl ImportParser for PythonParser {
    fn parse(&mut self, source: &str) -> Result<ImportSet, ParserError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParserError::ParseError("parser returned no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ParserError::ParseError(format!(
                "syntax error near line {}",
                first_error_line(&root)
            )));
        }
        if let Some(statement) = find_python2_statement(&root) {
            return Err(ParserError::ParseError(format!(
                "Python 2 {} on line {}",
                statement.kind(),
                statement.start_position().row + 1
            )));
        }

        Ok(self.extract_imports(source, &tree))
    }
}

/// Statement forms the grammar still accepts but Python 3 rejects
const PYTHON2_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

fn find_python2_statement<'t>(root: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if PYTHON2_STATEMENTS.contains(&node.kind()) {
            return Some(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn first_error_line(node: &Node) -> usize {
    if node.is_error() || node.is_missing() {
        return node.start_position().row + 1;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error_line(&child);
        }
    }
    node.start_position().row + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<String> {
        let mut parser = PythonParser::new().unwrap();
        parser.parse(source).unwrap().into_iter().collect()
    }

    #[test]
    fn test_simple_import() {
        assert_eq!(parse("import os\nimport sys"), vec!["os", "sys"]);
    }

    #[test]
    fn test_dotted_and_aliased_imports() {
        assert_eq!(
            parse("import numpy as np, a.b.c\nimport xml.etree.ElementTree as ET"),
            vec!["a", "numpy", "xml"]
        );
    }

    #[test]
    fn test_from_import_keeps_first_segment() {
        assert_eq!(
            parse("from typing import List, Dict\nfrom google.cloud.storage import Client"),
            vec!["google", "typing"]
        );
    }

    #[test]
    fn test_relative_imports_excluded() {
        let source = "from . import utils\nfrom ..config import Settings\nfrom ...deep.pkg import x\n";
        assert!(parse(source).is_empty());
    }

    #[test]
    fn test_future_import() {
        assert_eq!(
            parse("from __future__ import annotations\nimport attr"),
            vec!["__future__", "attr"]
        );
    }

    #[test]
    fn test_nested_imports() {
        let source = r#"
try:
    import ujson as json
except ImportError:
    import json

def load():
    from yaml import safe_load
    return safe_load

class Plugin:
    if True:
        import importlib.metadata
"#;
        assert_eq!(parse(source), vec!["importlib", "json", "ujson", "yaml"]);
    }

    #[test]
    fn test_import_text_in_strings_ignored() {
        assert_eq!(
            parse("doc = \"import fake\"\n# import other\nimport real\n"),
            vec!["real"]
        );
    }

    #[test]
    fn test_syntax_error() {
        let mut parser = PythonParser::new().unwrap();
        let err = parser.parse("import os\ndef broken(:\n    pass\n").unwrap_err();
        assert!(matches!(err, ParserError::ParseError(_)));
    }

    #[test]
    fn test_python2_statements_rejected() {
        let mut parser = PythonParser::new().unwrap();
        for source in [
            "print \"hi\"\nimport requests\n",
            "import requests\nexec \"x = 1\"\n",
            "def legacy():\n    print \"oops\", 1\nimport requests\n",
        ] {
            assert!(
                matches!(parser.parse(source), Err(ParserError::ParseError(_))),
                "accepted: {source}"
            );
        }
    }

    #[test]
    fn test_python3_print_and_exec_calls_accepted() {
        assert_eq!(
            parse("print(\"hi\")\nexec(\"x = 1\")\nimport requests\n"),
            vec!["requests"]
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(parse("").is_empty());
    }
}

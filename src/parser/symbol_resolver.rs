//! Symbol extraction and scope reconstruction.
//!
//! Tree-sitter nodes are visited in document order and every
//! declaration-like node becomes a flat `Symbol`. Nesting is then recovered
//! from byte ranges alone with a containment stack, so the result never
//! holds references back into the tree.

use super::language::LanguageSupport;
use super::languages::node_text;
use super::{ParsedTree, SourceUnit, Symbol};
use tree_sitter::Node;

/// Walk the tree and return every declaration, ordered by `start_byte`,
/// with parents resolved. Partial trees yield whatever could be matched.
pub fn extract_symbols(
    parsed: &ParsedTree,
    unit: &SourceUnit,
    support: &dyn LanguageSupport,
) -> Vec<Symbol> {
    let source = unit.bytes();
    let mut symbols = Vec::new();
    let mut scopes = Vec::new();
    let mut cursor = parsed.tree.root_node().walk();

    'walk: loop {
        let node = cursor.node();
        if let Some(symbol) = describe(node, source, support) {
            if support.is_scope_only(node) {
                scopes.push((symbol.start_byte, symbol.end_byte));
            }
            symbols.push(symbol);
        }

        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    resolve_parents(&mut symbols);
    if !scopes.is_empty() {
        symbols.retain(|s| !scopes.contains(&(s.start_byte, s.end_byte)));
    }
    symbols
}

fn describe(node: Node, source: &[u8], support: &dyn LanguageSupport) -> Option<Symbol> {
    let kind = support.declaration_kind(node, source)?;
    let name = support.name(node, source)?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let extent = support.extent(node);
    Some(Symbol {
        name,
        kind,
        start_byte: extent.start_byte(),
        end_byte: extent.end_byte(),
        start_line: extent.start_position().row + 1,
        end_line: extent.end_position().row + 1,
        parent: None,
        parameters: support.parameters(node, source),
        return_type: support.return_type(node, source).filter(|t| !t.is_empty()),
        is_async: support.is_async(node, source),
        docstring: support.docstring(node, source),
        decorators: support.decorators(node, source),
        modifiers: support.modifiers(node, source),
        signature: signature(node, support.body(node), source),
    })
}

/// Header text up to the body, or the first line for body-less declarations
fn signature(node: Node, body: Option<Node>, source: &[u8]) -> String {
    let text = node_text(node, source);
    match body {
        Some(body) if body.start_byte() > node.start_byte() => {
            let header = &source[node.start_byte()..body.start_byte()];
            String::from_utf8_lossy(header).trim_end().to_string()
        }
        _ => text.lines().next().unwrap_or("").trim_end().to_string(),
    }
}

/// Assign each symbol its tightest enclosing scope-opening symbol.
///
/// Symbols are sorted by start (outer first on ties). A stack holds the
/// scopes still open at the current position; anything that ended before
/// the candidate starts is popped, so well-nested input is linear.
/// Functions whose scope is class-like become methods.
pub fn resolve_parents(symbols: &mut Vec<Symbol>) {
    symbols.sort_by(|a, b| {
        a.start_byte
            .cmp(&b.start_byte)
            .then(b.end_byte.cmp(&a.end_byte))
    });

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(symbols.len());
    let mut stack: Vec<usize> = Vec::new();

    for (i, candidate) in symbols.iter().enumerate() {
        while let Some(&top) = stack.last() {
            if symbols[top].end_byte <= candidate.start_byte {
                stack.pop();
            } else {
                break;
            }
        }
        let parent = stack
            .iter()
            .rev()
            .copied()
            .find(|&open| symbols[open].contains(candidate));
        parents.push(parent);

        if candidate.kind.can_enclose() {
            stack.push(i);
        }
    }

    for (i, parent) in parents.into_iter().enumerate() {
        let Some(p) = parent else {
            symbols[i].parent = None;
            continue;
        };
        let (parent_name, parent_kind) = (symbols[p].name.clone(), symbols[p].kind);
        let symbol = &mut symbols[i];
        symbol.parent = Some(parent_name);
        if symbol.kind == super::SymbolKind::Function && parent_kind.is_class_like() {
            symbol.kind = super::SymbolKind::Method;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tree_provider::TreeProvider;
    use crate::parser::{LanguageId, LanguageRegistry, Parameter, SymbolKind};
    use std::sync::Arc;

    fn symbols(language: LanguageId, source: &str) -> Vec<Symbol> {
        let registry = Arc::new(LanguageRegistry::with_builtin());
        let trees = TreeProvider::new(registry.clone(), 4);
        let unit = SourceUnit::new(language, source);
        let parsed = trees.parse("test", &unit).unwrap();
        extract_symbols(&parsed, &unit, registry.get(language).unwrap())
    }

    fn find<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
        symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing symbol {}", name))
    }

    fn synthetic(name: &str, kind: SymbolKind, start: usize, end: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            start_byte: start,
            end_byte: end,
            start_line: 1,
            end_line: 1,
            parent: None,
            parameters: Vec::new(),
            return_type: None,
            is_async: false,
            docstring: None,
            decorators: Vec::new(),
            modifiers: Vec::new(),
            signature: String::new(),
        }
    }

    #[test]
    fn test_calculator_hierarchy() {
        let source = "class Calculator: \n def __init__(self): pass\n def add(self, x, y): return x + y";
        let found = symbols(LanguageId::Python, source);

        assert_eq!(found.len(), 3);
        let class = find(&found, "Calculator");
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.parent, None);

        for method in ["__init__", "add"] {
            let symbol = find(&found, method);
            assert_eq!(symbol.kind, SymbolKind::Method);
            assert_eq!(symbol.parent.as_deref(), Some("Calculator"));
            assert!(class.contains(symbol));
        }
        assert_eq!(
            find(&found, "add").parameters,
            vec![
                Parameter::named("self"),
                Parameter::named("x"),
                Parameter::named("y")
            ]
        );
    }

    #[test]
    fn test_python_signature_details() {
        let source = r#"import asyncio

MAX_RETRIES = 3

class Client:
    """HTTP client."""
    timeout = 30

    def __init__(self, base_url: str, retries: int = 3, *args, **kwargs):
        self.base_url = base_url

    @property
    def url(self) -> str:
        return self.base_url

    async def fetch(self, path):
        result = await asyncio.sleep(0)
        def helper():
            pass
        return result
"#;
        let found = symbols(LanguageId::Python, source);

        let max = find(&found, "MAX_RETRIES");
        assert_eq!(max.kind, SymbolKind::Variable);
        assert_eq!(max.parent, None);
        assert_eq!(max.start_line, 3);

        let client = find(&found, "Client");
        assert_eq!(client.docstring.as_deref(), Some("HTTP client."));
        assert_eq!(client.signature, "class Client:");

        let timeout = find(&found, "timeout");
        assert_eq!(timeout.kind, SymbolKind::Variable);
        assert_eq!(timeout.parent.as_deref(), Some("Client"));

        let init = find(&found, "__init__");
        let rendered: Vec<String> = init.parameters.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["self", "base_url: str", "retries: int = 3", "*args", "**kwargs"]
        );

        let url = find(&found, "url");
        assert_eq!(url.decorators, vec!["@property".to_string()]);
        assert_eq!((url.start_line, url.end_line), (12, 14));
        assert_eq!(url.signature, "def url(self) -> str:");
        assert_eq!(url.return_type.as_deref(), Some("str"));
        assert_eq!(url.kind, SymbolKind::Method);

        let fetch = find(&found, "fetch");
        assert!(fetch.is_async);
        assert!(!url.is_async);

        let result = find(&found, "result");
        assert_eq!(result.parent.as_deref(), Some("fetch"));

        let helper = find(&found, "helper");
        assert_eq!(helper.kind, SymbolKind::Function);
        assert_eq!(helper.parent.as_deref(), Some("fetch"));
    }

    #[test]
    fn test_javascript_declarations() {
        let source = r#"
function fetchData(url) {
    return fetch(url);
}

class DataProcessor {
    constructor(options) {
        this.options = options;
    }

    process(data) {
        return data.map(item => item.value);
    }
}

const API_URL = 'https://api.example.com';
let cache = new Map();
const load = async (key, fallback = null) => cache.get(key) ?? fallback;
"#;
        let found = symbols(LanguageId::JavaScript, source);

        assert_eq!(find(&found, "fetchData").kind, SymbolKind::Function);
        assert_eq!(find(&found, "DataProcessor").kind, SymbolKind::Class);
        for method in ["constructor", "process"] {
            let symbol = find(&found, method);
            assert_eq!(symbol.kind, SymbolKind::Method);
            assert_eq!(symbol.parent.as_deref(), Some("DataProcessor"));
        }

        let api = find(&found, "API_URL");
        assert_eq!(api.kind, SymbolKind::Variable);
        assert_eq!(api.parent, None);
        assert!(api.modifiers.contains(&"const".to_string()));

        let load = find(&found, "load");
        assert_eq!(load.kind, SymbolKind::Function);
        assert!(load.is_async);
        assert_eq!(load.parameters.len(), 2);
        assert_eq!(load.parameters[1].default_value.as_deref(), Some("null"));
    }

    #[test]
    fn test_typescript_declarations() {
        let source = r#"
interface User {
    id: number;
    name: string;
}

type UserResponse = {
    user: User;
    status: string;
};

/** Loads users. */
export class UserService {
    private apiUrl: string;

    constructor(apiUrl: string) {
        this.apiUrl = apiUrl;
    }

    async getUser(id: number): Promise<User> {
        const response = await fetch(`${this.apiUrl}/users/${id}`);
        return response.json();
    }
}
"#;
        let found = symbols(LanguageId::TypeScript, source);

        assert_eq!(find(&found, "User").kind, SymbolKind::Interface);
        assert_eq!(find(&found, "UserResponse").kind, SymbolKind::TypeAlias);

        let service = find(&found, "UserService");
        assert_eq!(service.kind, SymbolKind::Class);
        assert_eq!(service.docstring.as_deref(), Some("Loads users."));
        assert!(service.modifiers.contains(&"export".to_string()));

        let field = find(&found, "apiUrl");
        assert_eq!(field.kind, SymbolKind::Variable);
        assert_eq!(field.parent.as_deref(), Some("UserService"));

        let get_user = find(&found, "getUser");
        assert_eq!(get_user.kind, SymbolKind::Method);
        assert!(get_user.is_async);
        assert_eq!(get_user.return_type.as_deref(), Some("Promise<User>"));
        assert_eq!(get_user.parameters[0].name, "id");
        assert_eq!(get_user.parameters[0].type_annotation.as_deref(), Some("number"));

        let response = find(&found, "response");
        assert_eq!(response.parent.as_deref(), Some("getUser"));
    }

    #[test]
    fn test_rust_declarations() {
        let source = r#"
/// A running total.
#[derive(Debug)]
pub struct Calculator {
    total: i64,
}

impl Calculator {
    /// Adds a value.
    pub fn add(&mut self, value: i64) -> i64 {
        self.total += value;
        self.total
    }

    pub async fn sync_remote(&self) {}
}

fn main() {
    let calc = Calculator { total: 0 };
}
"#;
        let found = symbols(LanguageId::Rust, source);

        let structure = found
            .iter()
            .find(|s| s.name == "Calculator" && s.kind == SymbolKind::Struct)
            .unwrap();
        assert_eq!(structure.docstring.as_deref(), Some("A running total."));
        assert_eq!(structure.decorators, vec!["#[derive(Debug)]".to_string()]);
        assert!(structure.modifiers.contains(&"pub".to_string()));

        let add = find(&found, "add");
        assert_eq!(add.kind, SymbolKind::Method);
        assert_eq!(add.parent.as_deref(), Some("Calculator"));
        assert_eq!(add.docstring.as_deref(), Some("Adds a value."));
        assert_eq!(add.return_type.as_deref(), Some("i64"));
        assert_eq!(add.parameters[0].name, "&mut self");
        assert_eq!(add.parameters[1].type_annotation.as_deref(), Some("i64"));

        assert!(find(&found, "sync_remote").is_async);

        let calc = find(&found, "calc");
        assert_eq!(calc.kind, SymbolKind::Variable);
        assert_eq!(calc.parent.as_deref(), Some("main"));
    }

    #[test]
    fn test_rust_impl_blocks_only_scope_methods() {
        let source = r#"use std::fmt;

struct A;

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "A")
    }
}

impl A {
    fn new() -> Self {
        A
    }
}
"#;
        let found = symbols(LanguageId::Rust, source);

        let kinds: Vec<SymbolKind> = found.iter().filter(|s| s.name == "A").map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SymbolKind::Struct]);

        let fmt = find(&found, "fmt");
        assert_eq!(fmt.kind, SymbolKind::Method);
        assert_eq!(fmt.parent.as_deref(), Some("A"));
        assert_eq!(fmt.modifiers, vec!["impl fmt::Display".to_string()]);

        let new = find(&found, "new");
        assert_eq!(new.kind, SymbolKind::Method);
        assert_eq!(new.parent.as_deref(), Some("A"));
        assert!(new.modifiers.is_empty());
    }

    #[test]
    fn test_go_declarations() {
        let source = "package main\n\n// Calculator keeps a total.\ntype Calculator struct {\n\ttotal int\n}\n\n// Add adds values.\nfunc (c *Calculator) Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n}\n";
        let found = symbols(LanguageId::Go, source);

        let calculator = find(&found, "Calculator");
        assert_eq!(calculator.kind, SymbolKind::Struct);
        assert_eq!(calculator.docstring.as_deref(), Some("Calculator keeps a total."));

        let add = find(&found, "Add");
        assert_eq!(add.kind, SymbolKind::Method);
        assert_eq!(add.return_type.as_deref(), Some("int"));
        assert_eq!(add.modifiers, vec!["(c *Calculator)".to_string()]);
        let names: Vec<&str> = add.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(add.docstring.as_deref(), Some("Add adds values."));

        assert_eq!(find(&found, "main").kind, SymbolKind::Function);
    }

    #[test]
    fn test_java_declarations() {
        let source = r#"
public class Greeter {
    private static final String PREFIX = "Hello";

    @Override
    public String greet(String name) {
        return PREFIX + name;
    }
}
"#;
        let found = symbols(LanguageId::Java, source);

        assert_eq!(find(&found, "Greeter").kind, SymbolKind::Class);

        let prefix = find(&found, "PREFIX");
        assert_eq!(prefix.kind, SymbolKind::Variable);
        assert_eq!(prefix.parent.as_deref(), Some("Greeter"));

        let greet = find(&found, "greet");
        assert_eq!(greet.kind, SymbolKind::Method);
        assert_eq!(greet.parent.as_deref(), Some("Greeter"));
        assert_eq!(greet.return_type.as_deref(), Some("String"));
        assert_eq!(greet.decorators, vec!["@Override".to_string()]);
        assert!(greet.modifiers.contains(&"public".to_string()));
    }

    #[test]
    fn test_cpp_declarations() {
        let source = r#"#include <string>

static int counter = 0;

namespace geometry {

/// Base shape.
class Shape {
public:
    virtual double area() const = 0;
    std::string name;
};

class Circle : public Shape {
public:
    double area() const override {
        return 3.14159 * radius_ * radius_;
    }

private:
    double radius_;
};

int scale(const std::string& label, int factor = 2) {
    int* total = nullptr;
    return factor;
}

}
"#;
        let found = symbols(LanguageId::Cpp, source);

        let counter = find(&found, "counter");
        assert_eq!(counter.kind, SymbolKind::Variable);
        assert_eq!(counter.parent, None);
        assert_eq!(counter.modifiers, vec!["static".to_string()]);

        assert_eq!(find(&found, "geometry").kind, SymbolKind::Module);

        let shape = find(&found, "Shape");
        assert_eq!(shape.kind, SymbolKind::Class);
        assert_eq!(shape.parent.as_deref(), Some("geometry"));
        assert_eq!(shape.docstring.as_deref(), Some("Base shape."));

        let pure = found
            .iter()
            .find(|s| s.name == "area" && s.parent.as_deref() == Some("Shape"))
            .unwrap();
        assert_eq!(pure.kind, SymbolKind::Method);
        assert!(pure.modifiers.contains(&"virtual".to_string()));

        let member = find(&found, "name");
        assert_eq!(member.kind, SymbolKind::Variable);
        assert_eq!(member.parent.as_deref(), Some("Shape"));

        let area = found
            .iter()
            .find(|s| s.name == "area" && s.parent.as_deref() == Some("Circle"))
            .unwrap();
        assert_eq!(area.kind, SymbolKind::Method);
        assert_eq!(area.return_type.as_deref(), Some("double"));
        assert!(area.parameters.is_empty());

        assert_eq!(find(&found, "radius_").parent.as_deref(), Some("Circle"));

        let scale = find(&found, "scale");
        assert_eq!(scale.kind, SymbolKind::Function);
        assert_eq!(scale.parent.as_deref(), Some("geometry"));
        assert_eq!(scale.return_type.as_deref(), Some("int"));
        let rendered: Vec<String> = scale.parameters.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["label: std::string", "factor: int = 2"]);

        let total = find(&found, "total");
        assert_eq!(total.kind, SymbolKind::Variable);
        assert_eq!(total.parent.as_deref(), Some("scale"));
    }

    #[test]
    fn test_csharp_declarations() {
        let source = r#"using System;

namespace Shop
{
    /// Order totals.
    public class OrderService
    {
        private readonly int limit = 10;

        [Obsolete]
        public async Task<decimal> Total(int count, string currency = "EUR")
        {
            var sum = Compute(count);
            return sum;
        }

        public int Sum(params int[] values)
        {
            return values.Length;
        }
    }

    public interface IOrders
    {
        void Place(int id);
    }
}
"#;
        let found = symbols(LanguageId::CSharp, source);

        assert_eq!(find(&found, "Shop").kind, SymbolKind::Module);

        let service = find(&found, "OrderService");
        assert_eq!(service.kind, SymbolKind::Class);
        assert_eq!(service.parent.as_deref(), Some("Shop"));
        assert_eq!(service.modifiers, vec!["public".to_string()]);
        assert_eq!(service.docstring.as_deref(), Some("Order totals."));

        let limit = find(&found, "limit");
        assert_eq!(limit.kind, SymbolKind::Variable);
        assert_eq!(limit.parent.as_deref(), Some("OrderService"));
        assert_eq!(limit.modifiers, vec!["private".to_string(), "readonly".to_string()]);

        let total = find(&found, "Total");
        assert_eq!(total.kind, SymbolKind::Method);
        assert_eq!(total.parent.as_deref(), Some("OrderService"));
        assert!(total.is_async);
        assert_eq!(total.return_type.as_deref(), Some("Task<decimal>"));
        assert_eq!(total.decorators, vec!["[Obsolete]".to_string()]);
        assert_eq!(
            total.parameters,
            vec![
                Parameter {
                    name: "count".to_string(),
                    type_annotation: Some("int".to_string()),
                    default_value: None,
                },
                Parameter {
                    name: "currency".to_string(),
                    type_annotation: Some("string".to_string()),
                    default_value: Some("\"EUR\"".to_string()),
                },
            ]
        );

        assert_eq!(find(&found, "sum").parent.as_deref(), Some("Total"));

        let sum = find(&found, "Sum");
        let rendered: Vec<String> = sum.parameters.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["values: int[]"]);

        assert_eq!(find(&found, "IOrders").kind, SymbolKind::Interface);
        let place = find(&found, "Place");
        assert_eq!(place.kind, SymbolKind::Method);
        assert_eq!(place.parent.as_deref(), Some("IOrders"));
        assert_eq!(place.return_type.as_deref(), Some("void"));
        assert_eq!(place.signature, "void Place(int id);");
    }

    #[test]
    fn test_tsx_declarations() {
        let source = r#"import React from 'react';

interface ButtonProps {
    label: string;
}

/** Primary action. */
export const Button = ({ label }: ButtonProps) => {
    return <button onClick={() => track('click')}>{label}</button>;
};

export default class Counter extends React.Component<ButtonProps> {
    count: number = 0;

    render(): JSX.Element {
        return <div>{this.count}</div>;
    }
}
"#;
        let found = symbols(LanguageId::Tsx, source);

        assert_eq!(find(&found, "ButtonProps").kind, SymbolKind::Interface);

        let button = find(&found, "Button");
        assert_eq!(button.kind, SymbolKind::Function);
        assert_eq!(button.parent, None);
        assert_eq!(button.docstring.as_deref(), Some("Primary action."));
        assert!(button.modifiers.contains(&"export".to_string()));
        assert!(button.modifiers.contains(&"const".to_string()));
        assert_eq!(button.parameters.len(), 1);
        assert_eq!(button.parameters[0].type_annotation.as_deref(), Some("ButtonProps"));

        let counter = find(&found, "Counter");
        assert_eq!(counter.kind, SymbolKind::Class);
        assert!(counter.modifiers.contains(&"default".to_string()));

        let count = find(&found, "count");
        assert_eq!(count.kind, SymbolKind::Variable);
        assert_eq!(count.parent.as_deref(), Some("Counter"));

        let render = find(&found, "render");
        assert_eq!(render.kind, SymbolKind::Method);
        assert_eq!(render.parent.as_deref(), Some("Counter"));
        assert_eq!(render.return_type.as_deref(), Some("JSX.Element"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let source = "class A:\n    def f(self):\n        x = 1\n\ndef g():\n    pass\n";
        let first = symbols(LanguageId::Python, source);
        let second = symbols(LanguageId::Python, source);
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_parse_keeps_good_symbols() {
        let source = "def ok():\n    pass\n\ndef broken(:\n";
        let found = symbols(LanguageId::Python, source);
        assert!(found.iter().any(|s| s.name == "ok"));
    }

    #[test]
    fn test_parent_is_tightest_scope() {
        let mut set = vec![
            synthetic("inner", SymbolKind::Function, 20, 40),
            synthetic("outer", SymbolKind::Class, 0, 100),
            synthetic("middle", SymbolKind::Function, 10, 60),
            synthetic("sibling", SymbolKind::Function, 60, 90),
            synthetic("top", SymbolKind::Function, 100, 120),
        ];
        resolve_parents(&mut set);

        let parent_of = |name: &str| set.iter().find(|s| s.name == name).unwrap().parent.clone();
        assert_eq!(parent_of("outer"), None);
        assert_eq!(parent_of("middle").as_deref(), Some("outer"));
        assert_eq!(parent_of("inner").as_deref(), Some("middle"));
        assert_eq!(parent_of("sibling").as_deref(), Some("outer"));
        assert_eq!(parent_of("top"), None);

        // Every recorded parent strictly contains its child and nothing tighter does
        for symbol in &set {
            if let Some(parent) = &symbol.parent {
                let p = set.iter().find(|s| &s.name == parent).unwrap();
                assert!(p.contains(symbol));
                assert!(!set.iter().any(|s| p.contains(s)
                    && s.contains(symbol)
                    && s.kind.can_enclose()));
            }
        }
    }

    #[test]
    fn test_variables_never_become_parents() {
        let mut set = vec![
            synthetic("config", SymbolKind::Variable, 0, 50),
            synthetic("build", SymbolKind::Function, 10, 40),
        ];
        resolve_parents(&mut set);
        assert_eq!(set[1].name, "build");
        assert_eq!(set[1].parent, None);
    }
}

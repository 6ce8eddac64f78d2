//! Tree-sitter based outline extraction

use super::{Language, Symbol, SymbolKind};
use std::cell::RefCell;
use tree_sitter::{Node, Parser};

// ═══════════════════════════════════════════════════════════════════════════
//  THREAD-LOCAL PARSER POOL
// ═══════════════════════════════════════════════════════════════════════════
//
// Parsers are reused across calls on the same thread; each one is configured
// for its language once.

thread_local! {
    static RUST_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // Ignore error here - will be caught at parse time if language fails
        let _ = p.set_language(&tree_sitter_rust::LANGUAGE.into());
        p
    });

    static JS_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        let _ = p.set_language(&tree_sitter_javascript::LANGUAGE.into());
        p
    });

    static TS_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        let _ = p.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into());
        p
    });

    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });

    static GO_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        let _ = p.set_language(&tree_sitter_go::LANGUAGE.into());
        p
    });
}

fn parse_with_pooled_parser(
    content: &str,
    language: Language,
) -> anyhow::Result<tree_sitter::Tree> {
    let parse_result = match language {
        Language::Rust => RUST_PARSER.with(|p| p.borrow_mut().parse(content, None)),
        Language::JavaScript => JS_PARSER.with(|p| p.borrow_mut().parse(content, None)),
        // The TSX grammar is a superset, so plain .ts files parse with it too.
        Language::TypeScript => TS_PARSER.with(|p| p.borrow_mut().parse(content, None)),
        Language::Python => PYTHON_PARSER.with(|p| p.borrow_mut().parse(content, None)),
        Language::Go => GO_PARSER.with(|p| p.borrow_mut().parse(content, None)),
        Language::Unknown => return Err(anyhow::anyhow!("Unknown language")),
    };

    parse_result.ok_or_else(|| anyhow::anyhow!("Failed to parse file"))
}

/// List the symbols of a document in source order.
pub fn outline(language: Language, content: &str) -> anyhow::Result<Vec<Symbol>> {
    if language == Language::Unknown {
        return Ok(Vec::new());
    }

    let tree = parse_with_pooled_parser(content, language)?;
    let mut symbols = Vec::new();
    collect_symbols(tree.root_node(), content, language, false, &mut symbols);
    Ok(symbols)
}

fn collect_symbols(
    node: Node,
    content: &str,
    language: Language,
    inside_type: bool,
    symbols: &mut Vec<Symbol>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = classify(language, child.kind(), inside_type);
        if let Some(kind) = kind {
            if let Some(name) = child
                .child_by_field_name("name")
                .map(|n| node_text(&n, content))
            {
                symbols.push(Symbol {
                    name,
                    kind,
                    line: child.start_position().row,
                    end_line: child.end_position().row,
                });
            }
        }

        let child_inside_type = match kind {
            Some(kind) => kind.is_type(),
            None => inside_type || is_impl_block(language, child.kind()),
        };
        collect_symbols(child, content, language, child_inside_type, symbols);
    }
}

fn classify(language: Language, kind: &str, inside_type: bool) -> Option<SymbolKind> {
    let function = if inside_type {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };
    match language {
        Language::Rust => match kind {
            "function_item" | "function_signature_item" => Some(function),
            "struct_item" | "union_item" => Some(SymbolKind::Struct),
            "enum_item" => Some(SymbolKind::Enum),
            "trait_item" => Some(SymbolKind::Trait),
            "mod_item" => Some(SymbolKind::Module),
            "const_item" | "static_item" => Some(SymbolKind::Constant),
            _ => None,
        },
        Language::JavaScript | Language::TypeScript => match kind {
            "function_declaration" | "generator_function_declaration" => Some(function),
            "method_definition" | "method_signature" => Some(SymbolKind::Method),
            "class_declaration" | "abstract_class_declaration" => Some(SymbolKind::Class),
            "interface_declaration" => Some(SymbolKind::Interface),
            "enum_declaration" => Some(SymbolKind::Enum),
            _ => None,
        },
        Language::Python => match kind {
            "function_definition" => Some(function),
            "class_definition" => Some(SymbolKind::Class),
            _ => None,
        },
        Language::Go => match kind {
            "function_declaration" => Some(SymbolKind::Function),
            "method_declaration" => Some(SymbolKind::Method),
            "type_spec" => Some(SymbolKind::Struct),
            _ => None,
        },
        Language::Unknown => None,
    }
}

/// Rust `impl` blocks carry no name of their own but make their functions methods.
fn is_impl_block(language: Language, kind: &str) -> bool {
    language == Language::Rust && kind == "impl_item"
}

fn node_text(node: &Node, content: &str) -> String {
    content[node.byte_range()].to_string()
}

use std::fmt::Write as _;

/// A node of the syntax tree.
///
/// The parser builds the tree once and the generator only reads it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Vec<Node>),
    Integer(i64),
    Floating(f64),
    String(String),
    List(Vec<Node>),
    Quoted(Box<Node>),
    Keyword(String),
    Identifier(String),
}

impl Node {
    pub fn is_keyword(&self, name: &str) -> bool {
        matches!(self, Node::Keyword(keyword) if keyword == name)
    }

    /// Short label used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Node::Program(_) => "program".to_string(),
            Node::Integer(value) => format!("integer {value}"),
            Node::Floating(value) => format!("float {value:?}"),
            Node::String(value) => format!("string {value:?}"),
            Node::List(items) => format!("list of {} elements", items.len()),
            Node::Quoted(inner) => format!("quoted {}", inner.describe()),
            Node::Keyword(name) => format!("keyword '{name}'"),
            Node::Identifier(name) => format!("identifier '{name}'"),
        }
    }
}

/// Render the tree one node per line, children indented by four spaces.
pub fn render_tree(node: &Node) -> String {
    let mut out = String::new();
    render_into(node, 0, &mut out);
    out
}

fn render_into(node: &Node, indent: usize, out: &mut String) {
    out.push_str(&" ".repeat(indent));
    // Writing into a String cannot fail.
    let _ = match node {
        Node::Program(expressions) => {
            out.push_str("Program\n");
            for expression in expressions {
                render_into(expression, indent + 4, out);
            }
            Ok(())
        }
        Node::Integer(value) => writeln!(out, "Integer: {value}"),
        Node::Floating(value) => writeln!(out, "Floating: {value:?}"),
        Node::String(value) => writeln!(out, "String: {value}"),
        Node::List(items) => {
            out.push_str("List\n");
            for item in items {
                render_into(item, indent + 4, out);
            }
            Ok(())
        }
        Node::Quoted(inner) => {
            out.push_str("Quoted\n");
            render_into(inner, indent + 4, out);
            Ok(())
        }
        Node::Keyword(name) => writeln!(out, "Keyword: {name}"),
        Node::Identifier(name) => writeln!(out, "Identifier: {name}"),
    };
}

use crate::node::{is_raw_text, Node};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Serializer converts a canvas tree back to markup.
///
/// Output is canonical: one element per line, children indented one level,
/// attributes in a fixed order (`id`, `class`, other attributes, `style`).
/// Editor markers never reach the output. Serializing, parsing and
/// serializing again yields the same text.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "  ".to_string(), // 2 spaces
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize the canvas content (the root's text and children, not the
    /// root element itself)
    pub fn serialize(&mut self, root: &Node) -> String {
        let mut output = String::new();

        let text = root.text.trim();
        if !text.is_empty() {
            self.write_indent(&mut output);
            output.push_str(&encode_text(text));
            output.push('\n');
        }

        for child in &root.children {
            self.serialize_node(child, &mut output);
        }

        output
    }

    /// Serialize the canvas as a complete standalone page
    pub fn serialize_page(&mut self, root: &Node, title: &str) -> String {
        let mut output = String::new();
        output.push_str("<!DOCTYPE html>\n");
        output.push_str("<html>\n");

        self.indent_level += 1;
        self.write_indent(&mut output);
        output.push_str("<head>\n");

        self.indent_level += 1;
        self.write_indent(&mut output);
        output.push_str("<meta charset=\"utf-8\">\n");
        self.write_indent(&mut output);
        output.push_str("<title>");
        output.push_str(&encode_text(title));
        output.push_str("</title>\n");
        self.indent_level -= 1;

        self.write_indent(&mut output);
        output.push_str("</head>\n");
        self.write_indent(&mut output);
        output.push_str("<body>\n");

        self.indent_level += 1;
        let content = self.serialize(root);
        output.push_str(&content);
        self.indent_level -= 1;

        self.write_indent(&mut output);
        output.push_str("</body>\n");
        self.indent_level -= 1;

        output.push_str("</html>\n");
        output
    }

    fn serialize_node(&mut self, node: &Node, output: &mut String) {
        self.write_indent(output);
        self.serialize_open_tag(node, output);

        if node.is_void() {
            output.push('\n');
            return;
        }

        if node.children.is_empty() {
            self.serialize_text(node, output);
            output.push_str("</");
            output.push_str(&node.tag);
            output.push_str(">\n");
            return;
        }

        output.push('\n');
        self.indent_level += 1;

        let text = node.text.trim();
        if !text.is_empty() {
            self.write_indent(output);
            output.push_str(&encode_text(text));
            output.push('\n');
        }

        for child in &node.children {
            self.serialize_node(child, output);
        }

        self.indent_level -= 1;
        self.write_indent(output);
        output.push_str("</");
        output.push_str(&node.tag);
        output.push_str(">\n");
    }

    fn serialize_open_tag(&self, node: &Node, output: &mut String) {
        output.push('<');
        output.push_str(&node.tag);

        if !node.id.is_empty() {
            write_attribute(output, "id", &node.id);
        }

        let classes = node.user_classes().collect::<Vec<_>>().join(" ");
        if !classes.is_empty() {
            write_attribute(output, "class", &classes);
        }

        for (name, value) in &node.attributes {
            if value.is_empty() {
                output.push(' ');
                output.push_str(name);
            } else {
                write_attribute(output, name, value);
            }
        }

        if !node.style.is_empty() {
            write_attribute(output, "style", &node.style_declarations());
        }

        output.push('>');
    }

    fn serialize_text(&self, node: &Node, output: &mut String) {
        if is_raw_text(&node.tag) {
            output.push_str(&node.text);
        } else {
            output.push_str(&encode_text(&node.text));
        }
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_attribute(output: &mut String, name: &str, value: &str) {
    output.push(' ');
    output.push_str(name);
    output.push_str("=\"");
    output.push_str(&encode_double_quoted_attribute(value));
    output.push('"');
}

/// Serialize canvas content with the default indentation
pub fn serialize(root: &Node) -> String {
    Serializer::new().serialize(root)
}

/// Serialize the canvas as a complete page
pub fn serialize_page(root: &Node, title: &str) -> String {
    Serializer::new().serialize_page(root, title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SELECTED_CLASS;

    #[test]
    fn test_serialize_leaf_on_one_line() {
        let root = Node::root().with_child(Node::new("p", "p-1").with_text("Hello"));
        assert_eq!(serialize(&root), "<p id=\"p-1\">Hello</p>\n");
    }

    #[test]
    fn test_serialize_nested_with_indent() {
        let root = Node::root().with_child(
            Node::new("div", "d")
                .with_text("Intro")
                .with_child(Node::new("img", "i").with_attribute("src", "a.png")),
        );

        assert_eq!(
            serialize(&root),
            "<div id=\"d\">\n  Intro\n  <img id=\"i\" src=\"a.png\">\n</div>\n"
        );
    }

    #[test]
    fn test_attribute_order_and_markers() {
        let mut button = Node::new("button", "b")
            .with_style("color", "white")
            .with_attribute("type", "button")
            .with_attribute("disabled", "")
            .with_class("btn")
            .with_text("Go");
        button.classes.insert(SELECTED_CLASS.to_string());

        let root = Node::root().with_child(button);
        assert_eq!(
            serialize(&root),
            "<button id=\"b\" class=\"btn\" type=\"button\" disabled style=\"color: white\">Go</button>\n"
        );
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let root = Node::root().with_child(
            Node::new("p", "p")
                .with_attribute("title", "say \"hi\"")
                .with_text("a < b & c"),
        );
        assert_eq!(
            serialize(&root),
            "<p id=\"p\" title=\"say &quot;hi&quot;\">a &lt; b &amp; c</p>\n"
        );
    }

    #[test]
    fn test_raw_text_is_not_escaped() {
        let root = Node::root().with_child(Node::new("style", "s").with_text(".a > .b {}"));
        assert_eq!(serialize(&root), "<style id=\"s\">.a > .b {}</style>\n");
    }

    #[test]
    fn test_custom_indent() {
        let root = Node::root()
            .with_child(Node::new("div", "a").with_child(Node::new("span", "b").with_text("x")));
        let output = Serializer::with_indent("\t").serialize(&root);
        assert_eq!(output, "<div id=\"a\">\n\t<span id=\"b\">x</span>\n</div>\n");
    }

    #[test]
    fn test_serialize_page() {
        let root = Node::root().with_child(Node::new("h1", "h").with_text("Hi"));
        let page = serialize_page(&root, "Home");

        assert!(page.starts_with("<!DOCTYPE html>\n<html>\n"));
        assert!(page.contains("    <title>Home</title>\n"));
        assert!(page.contains("  <body>\n    <h1 id=\"h\">Hi</h1>\n  </body>\n"));
        assert!(page.ends_with("</html>\n"));
    }
}

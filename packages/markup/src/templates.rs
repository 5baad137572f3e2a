//! Element templates: the palette of creatable elements.
//!
//! A template names a tag plus the baseline content, styles and attributes a
//! freshly created element starts with. The editor looks templates up by key
//! through [`TemplateCatalog`]; [`BuiltinCatalog`] ships the default palette
//! and accepts extra or overriding templates from configuration.

use crate::node::{ContentModel, Node};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTemplate {
    pub key: String,
    pub tag: String,
    #[serde(default)]
    pub label: String,
    /// Declared void; always true when the tag itself is void
    #[serde(default)]
    pub void: bool,
    #[serde(default)]
    pub default_content: String,
    #[serde(default)]
    pub default_styles: IndexMap<String, String>,
    /// Initial attributes; a `class` entry is split into the class set
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Initial children (e.g. the options of a select)
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementTemplate {
    pub fn new(key: &str, tag: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            tag: tag.to_ascii_lowercase(),
            label: label.to_string(),
            void: ContentModel::of(tag) == ContentModel::Void,
            default_content: String::new(),
            default_styles: IndexMap::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    fn content(mut self, text: &str) -> Self {
        self.default_content = text.to_string();
        self
    }

    fn styles(mut self, styles: &[(&str, &str)]) -> Self {
        for (property, value) in styles {
            self.default_styles
                .insert(property.to_string(), value.to_string());
        }
        self
    }

    fn attrs(mut self, attributes: &[(&str, &str)]) -> Self {
        for (name, value) in attributes {
            self.attributes.insert(name.to_string(), value.to_string());
        }
        self
    }

    fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// True if nodes built from this template can never own children
    pub fn is_void(&self) -> bool {
        self.void || ContentModel::of(&self.tag) == ContentModel::Void
    }

    /// Build a managed node from this template. Every node in the result,
    /// including template children, receives an id from `fresh_id`.
    pub fn instantiate(&self, fresh_id: &mut dyn FnMut(&str) -> String) -> Node {
        let mut node = Node::new(&self.tag, fresh_id(&self.tag));

        for (name, value) in &self.attributes {
            match name.as_str() {
                "class" => {
                    for class in value.split_ascii_whitespace() {
                        node.classes.insert(class.to_string());
                    }
                }
                "id" | "style" => {}
                _ => {
                    node.attributes.insert(name.clone(), value.clone());
                }
            }
        }

        node.style = self.default_styles.clone();

        if !self.is_void() {
            node.text = self.default_content.clone();
            for child in &self.children {
                let mut child = child.deep_clone(fresh_id);
                child.walk_mut(&mut |n| n.mark_managed());
                node.children.push(child);
            }
        }

        node
    }
}

/// Lookup of element templates by key
pub trait TemplateCatalog {
    fn template(&self, key: &str) -> Option<&ElementTemplate>;

    /// All template keys in palette order
    fn keys(&self) -> Vec<&str>;
}

/// The default palette, optionally extended from configuration
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    templates: IndexMap<String, ElementTemplate>,
}

const FIELD_STYLES: &[(&str, &str)] = &[
    ("padding", "8px 12px"),
    ("border", "1px solid #ccc"),
    ("border-radius", "4px"),
    ("font-size", "14px"),
    ("margin", "5px"),
    ("width", "100%"),
    ("max-width", "300px"),
];

impl BuiltinCatalog {
    pub fn new() -> Self {
        let palette = vec![
            // Layout and containers
            ElementTemplate::new("div", "div", "Div Block").styles(&[
                ("padding", "20px"),
                ("border", "1px dashed #ccc"),
                ("min-height", "50px"),
                ("background-color", "#ffffff"),
                ("margin-bottom", "10px"),
            ]),
            ElementTemplate::new("section", "section", "Section").styles(&[
                ("padding", "40px 20px"),
                ("background-color", "#f8f9fa"),
                ("min-height", "100px"),
                ("margin-bottom", "10px"),
            ]),
            ElementTemplate::new("container", "div", "Container")
                .styles(&[
                    ("max-width", "1200px"),
                    ("margin", "0 auto"),
                    ("padding", "0 15px"),
                    ("min-height", "50px"),
                    ("border", "1px dotted #999"),
                ])
                .attrs(&[("class", "container")]),
            ElementTemplate::new("header", "header", "Header")
                .styles(&[
                    ("padding", "20px"),
                    ("background-color", "#333"),
                    ("color", "white"),
                    ("min-height", "60px"),
                ])
                .attrs(&[("class", "site-header")]),
            ElementTemplate::new("footer", "footer", "Footer")
                .styles(&[
                    ("padding", "30px"),
                    ("background-color", "#222"),
                    ("color", "#ccc"),
                    ("min-height", "100px"),
                    ("margin-top", "auto"),
                ])
                .attrs(&[("class", "site-footer")]),
            ElementTemplate::new("nav", "nav", "Navigation")
                .styles(&[("display", "flex"), ("gap", "20px"), ("padding", "10px")])
                .attrs(&[("class", "navbar")]),
            ElementTemplate::new("article", "article", "Article").styles(&[
                ("padding", "20px"),
                ("border", "1px solid #eee"),
                ("margin-bottom", "20px"),
            ]),
            ElementTemplate::new("aside", "aside", "Sidebar/Aside").styles(&[
                ("width", "250px"),
                ("padding", "15px"),
                ("background-color", "#f4f4f4"),
                ("border-left", "1px solid #ddd"),
            ]),
            ElementTemplate::new("main", "main", "Main Content")
                .styles(&[("flex", "1"), ("padding", "20px")])
                .attrs(&[("role", "main")]),
            // Typography
            ElementTemplate::new("h1", "h1", "Heading 1")
                .content("Heading 1")
                .styles(&[("margin-bottom", "15px"), ("font-size", "2.5rem")]),
            ElementTemplate::new("h2", "h2", "Heading 2")
                .content("Heading 2")
                .styles(&[("margin-bottom", "12px"), ("font-size", "2rem")]),
            ElementTemplate::new("h3", "h3", "Heading 3")
                .content("Heading 3")
                .styles(&[("margin-bottom", "10px"), ("font-size", "1.75rem")]),
            ElementTemplate::new("p", "p", "Paragraph")
                .content("Lorem ipsum dolor sit amet, consectetur adipiscing elit.")
                .styles(&[("margin-bottom", "1rem"), ("line-height", "1.5")]),
            ElementTemplate::new("span", "span", "Text Span").content("text span"),
            ElementTemplate::new("link", "a", "Link")
                .content("Link Text")
                .styles(&[
                    ("color", "#007acc"),
                    ("text-decoration", "underline"),
                    ("cursor", "pointer"),
                ])
                .attrs(&[("href", "#")]),
            // Forms
            ElementTemplate::new("form", "form", "Form Wrapper")
                .styles(&[
                    ("padding", "20px"),
                    ("border", "1px solid #ddd"),
                    ("border-radius", "4px"),
                ])
                .attrs(&[("method", "post")]),
            ElementTemplate::new("label", "label", "Label")
                .content("Label Text")
                .styles(&[
                    ("display", "block"),
                    ("margin-bottom", "5px"),
                    ("font-weight", "bold"),
                ]),
            ElementTemplate::new("button", "button", "Button")
                .content("Click Me")
                .styles(&[
                    ("padding", "10px 20px"),
                    ("background-color", "#007acc"),
                    ("color", "white"),
                    ("border", "none"),
                    ("border-radius", "4px"),
                    ("cursor", "pointer"),
                    ("font-size", "16px"),
                    ("margin", "5px"),
                ])
                .attrs(&[("type", "button"), ("class", "btn")]),
            ElementTemplate::new("input", "input", "Text Input")
                .styles(FIELD_STYLES)
                .attrs(&[
                    ("type", "text"),
                    ("placeholder", "Enter text..."),
                    ("class", "form-control"),
                ]),
            ElementTemplate::new("input_email", "input", "Email Input")
                .styles(FIELD_STYLES)
                .attrs(&[
                    ("type", "email"),
                    ("placeholder", "name@example.com"),
                    ("class", "form-control"),
                ]),
            ElementTemplate::new("input_password", "input", "Password Input")
                .styles(FIELD_STYLES)
                .attrs(&[
                    ("type", "password"),
                    ("placeholder", "Password"),
                    ("class", "form-control"),
                ]),
            ElementTemplate::new("textarea", "textarea", "Text Area")
                .styles(&[
                    ("padding", "8px 12px"),
                    ("border", "1px solid #ccc"),
                    ("border-radius", "4px"),
                    ("font-size", "14px"),
                    ("margin", "5px"),
                    ("width", "100%"),
                    ("max-width", "400px"),
                    ("height", "100px"),
                ])
                .attrs(&[
                    ("placeholder", "Enter long text..."),
                    ("class", "form-control"),
                ]),
            ElementTemplate::new("checkbox", "input", "Checkbox")
                .styles(&[("margin-right", "5px")])
                .attrs(&[("type", "checkbox"), ("class", "form-check-input")]),
            ElementTemplate::new("radio", "input", "Radio Button")
                .styles(&[("margin-right", "5px")])
                .attrs(&[("type", "radio"), ("class", "form-check-input")]),
            ElementTemplate::new("select", "select", "Select Dropdown")
                .styles(&[
                    ("padding", "8px"),
                    ("border-radius", "4px"),
                    ("border", "1px solid #ccc"),
                ])
                .attrs(&[("class", "form-select")])
                .child(Node::unmanaged("option").with_text("Option 1"))
                .child(Node::unmanaged("option").with_text("Option 2")),
            // Media
            ElementTemplate::new("image", "img", "Image")
                .styles(&[
                    ("max-width", "100%"),
                    ("height", "auto"),
                    ("display", "block"),
                    ("margin", "10px 0"),
                ])
                .attrs(&[
                    ("src", "https://via.placeholder.com/300x200"),
                    ("alt", "Placeholder Image"),
                    ("class", "img-fluid"),
                ]),
            ElementTemplate::new("video", "video", "Video")
                .styles(&[
                    ("max-width", "100%"),
                    ("height", "auto"),
                    ("background-color", "#000"),
                ])
                .attrs(&[("controls", "")]),
            ElementTemplate::new("audio", "audio", "Audio Player")
                .styles(&[("width", "300px")])
                .attrs(&[("controls", "")]),
            ElementTemplate::new("iframe", "iframe", "Iframe/Embed")
                .styles(&[("width", "100%"), ("height", "300px"), ("border", "none")])
                .attrs(&[("src", "about:blank")]),
        ];

        Self {
            templates: palette
                .into_iter()
                .map(|template| (template.key.clone(), template))
                .collect(),
        }
    }

    /// Add templates, replacing built-ins that share a key
    pub fn extend(&mut self, templates: impl IntoIterator<Item = ElementTemplate>) {
        for template in templates {
            self.templates.insert(template.key.clone(), template);
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCatalog for BuiltinCatalog {
    fn template(&self, key: &str) -> Option<&ElementTemplate> {
        self.templates.get(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> impl FnMut(&str) -> String {
        let mut count = 0;
        move |tag| {
            count += 1;
            format!("{}-{}", tag, count)
        }
    }

    #[test]
    fn test_builtin_palette_keys() {
        let catalog = BuiltinCatalog::new();
        let keys = catalog.keys();

        assert_eq!(catalog.len(), 29);
        assert_eq!(keys[0], "div");
        assert!(keys.contains(&"input_password"));
        assert!(keys.contains(&"iframe"));
        assert!(catalog.template("marquee").is_none());
    }

    #[test]
    fn test_instantiate_button() {
        let catalog = BuiltinCatalog::new();
        let mut fresh = ids();
        let button = catalog.template("button").unwrap().instantiate(&mut fresh);

        assert_eq!(button.tag, "button");
        assert_eq!(button.id, "button-1");
        assert_eq!(button.text, "Click Me");
        assert!(button.is_managed());
        assert_eq!(button.user_classes().collect::<Vec<_>>(), vec!["btn"]);
        assert_eq!(button.attributes["type"], "button");
        assert!(!button.attributes.contains_key("class"));
        assert_eq!(button.style["background-color"], "#007acc");
    }

    #[test]
    fn test_void_templates() {
        let catalog = BuiltinCatalog::new();
        let image = catalog.template("image").unwrap();
        assert!(image.is_void());

        let node = image.instantiate(&mut ids());
        assert!(node.is_void());
        assert!(node.text.is_empty());
        assert_eq!(node.attributes["alt"], "Placeholder Image");
    }

    #[test]
    fn test_template_children_get_fresh_ids() {
        let catalog = BuiltinCatalog::new();
        let select = catalog.template("select").unwrap().instantiate(&mut ids());

        assert_eq!(select.children.len(), 2);
        assert_eq!(select.children[0].id, "option-2");
        assert_eq!(select.children[1].text, "Option 2");
        assert!(select.children.iter().all(Node::is_managed));
    }

    #[test]
    fn test_extend_overrides_builtin() {
        let mut catalog = BuiltinCatalog::new();
        catalog.extend(vec![
            ElementTemplate::new("button", "button", "Primary").content("Submit"),
            ElementTemplate::new("card", "div", "Card"),
        ]);

        assert_eq!(catalog.len(), 30);
        assert_eq!(catalog.template("button").unwrap().default_content, "Submit");
        assert!(catalog.template("card").is_some());
    }

    #[test]
    fn test_template_deserializes_from_camel_case() {
        let json = r#"{
            "key": "hero",
            "tag": "section",
            "defaultContent": "Welcome",
            "defaultStyles": { "padding": "60px" },
            "attributes": { "class": "hero dark" }
        }"#;
        let template: ElementTemplate = serde_json::from_str(json).unwrap();
        let node = template.instantiate(&mut ids());

        assert_eq!(node.text, "Welcome");
        assert_eq!(node.style["padding"], "60px");
        assert_eq!(node.user_classes().collect::<Vec<_>>(), vec!["hero", "dark"]);
    }
}

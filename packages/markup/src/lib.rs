pub mod document;
pub mod error;
pub mod id_generator;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod rehydrate;
pub mod serializer;
pub mod templates;

pub use document::Document;
pub use error::{ParseError, ParseResult};
pub use id_generator::{seed_for_path, IdGenerator};
pub use lexer::{lex, Token, TokenSpan};
pub use node::{
    is_raw_text, is_valid_attribute_name, is_valid_tag_name, normalize_style_declaration,
    parse_style_declarations, ContentModel, Node, MANAGED_CLASS, ROOT_ID, ROOT_TAG,
    SELECTED_CLASS,
};
pub use parser::{parse_fragment, Parser};
pub use rehydrate::rehydrate;
pub use serializer::{serialize, serialize_page, Serializer};
pub use templates::{BuiltinCatalog, ElementTemplate, TemplateCatalog};

#[cfg(feature = "pretty-errors")]
pub use error::pretty::format_error;

/// Parse markup into an editable tree: every node managed, every id unique
pub fn parse(source: &str, ids: &mut IdGenerator) -> ParseResult<Node> {
    let mut root = parse_fragment(source)?;
    rehydrate(&mut root, ids);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_then_serialize() {
        let mut ids = IdGenerator::new();
        let root = parse("<section><h1>Title</h1></section>", &mut ids).unwrap();

        assert_eq!(
            serialize(&root),
            "<section id=\"section-1\">\n  <h1 id=\"h1-2\">Title</h1>\n</section>\n"
        );
    }
}

use crate::error::{ParseError, ParseResult};
use crate::lexer::{AttrToken, Token, TokenSpan};
use crate::node::{is_raw_text, parse_style_declarations, Node, SELECTED_CLASS};
use html_escape::decode_html_entities;
use logos::{Lexer, Logos};

/// An element whose closing tag has not been seen yet
struct OpenElement {
    node: Node,
    span: TokenSpan,
    segments: Vec<String>,
}

impl OpenElement {
    fn new(node: Node, span: TokenSpan) -> Self {
        Self {
            node,
            span,
            segments: Vec::new(),
        }
    }

    /// Fold collected text segments into the node's text payload.
    ///
    /// Leaf elements keep their text verbatim (whitespace-only text is
    /// dropped). Elements that also own children get their segments trimmed
    /// and joined by a single space, since the model keeps one text payload.
    fn finish(mut self) -> Node {
        let text = if self.node.children.is_empty() {
            let joined = self.segments.concat();
            if joined.trim().is_empty() {
                String::new()
            } else {
                joined
            }
        } else {
            self.segments
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        };

        if !text.is_empty() {
            self.node.text = text;
        }
        self.node
    }
}

/// Parser for canvas markup.
///
/// Produces an unmanaged tree under a canvas root: nodes carry whatever
/// ids and classes the markup had, nothing more. Use [`crate::rehydrate`]
/// (or [`crate::parse`]) to turn it into an editable tree.
///
/// The parser is lenient where browsers are: unclosed elements are closed
/// at end of input or when an ancestor closes, and closing tags for void
/// elements are ignored. A closing tag with no matching open element, an
/// unterminated tag or comment, and malformed attributes are errors.
pub struct Parser<'src> {
    source: &'src str,
    lexer: Lexer<'src, Token<'src>>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            lexer: Token::lexer(source),
        }
    }

    /// Parse the whole input into a canvas root
    pub fn parse_fragment(&mut self) -> ParseResult<Node> {
        let mut stack = vec![OpenElement::new(Node::root(), TokenSpan::default())];

        while let Some(result) = self.lexer.next() {
            let span: TokenSpan = self.lexer.span().into();

            let token = match result {
                Ok(token) => token,
                Err(()) => return Err(self.lex_error(span)),
            };

            match token {
                Token::Comment | Token::Doctype => {}

                Token::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.segments.push(decode_html_entities(text).into_owned());
                    }
                }

                Token::StartTag(slice) => {
                    let (node, self_closing) = parse_start_tag(slice, span)?;

                    if node.is_void() || self_closing {
                        attach(&mut stack, node);
                    } else if is_raw_text(&node.tag) {
                        let element = self.read_raw_text(node, span)?;
                        attach(&mut stack, element);
                    } else {
                        stack.push(OpenElement::new(node, span));
                    }
                }

                Token::EndTag(slice) => {
                    let tag = end_tag_name(slice);

                    if crate::node::ContentModel::of(&tag) == crate::node::ContentModel::Void {
                        continue;
                    }

                    let Some(depth) = stack.iter().skip(1).rposition(|open| open.node.tag == tag)
                    else {
                        return Err(ParseError::unmatched_close(span, tag));
                    };

                    // rposition on the skipped iterator is relative to index 1
                    close_to(&mut stack, depth + 1);
                }
            }
        }

        if stack.len() > 1 {
            tracing::debug!(
                open = stack.len() - 1,
                "closing unclosed elements at end of input"
            );
            close_to(&mut stack, 1);
        }

        let mut root = match stack.pop() {
            Some(root) => root.finish(),
            None => Node::root(),
        };
        root.text = root.text.trim().to_string();
        Ok(root)
    }

    /// Consume everything up to `</tag` as the element's raw text
    fn read_raw_text(&mut self, mut node: Node, span: TokenSpan) -> ParseResult<Node> {
        let remainder = self.lexer.remainder();
        let closing = format!("</{}", node.tag);

        let Some(end) = find_ignore_case(remainder, &closing) else {
            return Err(ParseError::unterminated(span, format!("<{}> element", node.tag)));
        };

        let raw = &remainder[..end];
        if !raw.trim().is_empty() {
            node.text = raw.to_string();
        }
        self.lexer.bump(end);

        // The closing tag itself must follow
        match self.lexer.next() {
            Some(Ok(Token::EndTag(_))) => Ok(node),
            _ => Err(ParseError::unterminated(span, format!("<{}> element", node.tag))),
        }
    }

    fn lex_error(&self, span: TokenSpan) -> ParseError {
        let rest = &self.source[span.start..];
        if rest.starts_with("<!--") {
            ParseError::unterminated(span, "comment")
        } else if rest.len() > 1 && rest.as_bytes()[0] == b'<' && rest.as_bytes()[1].is_ascii_alphabetic() {
            ParseError::unterminated(span, "start tag")
        } else {
            ParseError::lex_error(span, "Unterminated tag or stray '<'")
        }
    }
}

/// Parse markup into an unmanaged tree under a canvas root
pub fn parse_fragment(source: &str) -> ParseResult<Node> {
    let root = Parser::new(source).parse_fragment()?;
    Ok(extract_body(root))
}

/// Append a finished node to the innermost open element
fn attach(stack: &mut [OpenElement], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.node.children.push(node);
    }
}

/// Pop and finish open elements until `stack.len() == depth`
fn close_to(stack: &mut Vec<OpenElement>, depth: usize) {
    while stack.len() > depth {
        let Some(open) = stack.pop() else { break };
        if stack.len() > depth {
            tracing::debug!(tag = %open.node.tag, at = open.span.start, "implicitly closing element");
        }
        let node = open.finish();
        attach(stack, node);
    }
}

/// If the markup was a whole page, keep only the body content
fn extract_body(mut root: Node) -> Node {
    let html_index = root.children.iter().position(|c| c.tag == "html");
    let body = match html_index {
        Some(index) => {
            let mut html = root.children.remove(index);
            html.children
                .iter()
                .position(|c| c.tag == "body")
                .map(|i| html.children.remove(i))
        }
        None => root
            .children
            .iter()
            .position(|c| c.tag == "body")
            .map(|i| root.children.remove(i)),
    };

    match body {
        Some(body) => {
            let mut canvas = Node::root();
            canvas.children = body.children;
            canvas.text = body.text.trim().to_string();
            canvas
        }
        None => root,
    }
}

fn end_tag_name(slice: &str) -> String {
    slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Parse `<tag attr="v" ...>` into a node; returns whether it self-closed
fn parse_start_tag(slice: &str, span: TokenSpan) -> ParseResult<(Node, bool)> {
    let inner = slice[1..slice.len() - 1].trim_end();
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_len = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let mut node = Node::unmanaged(&inner[..name_len]);

    // Offset of the attribute text within the document
    let base = span.start + 1 + name_len;
    let mut tokens = AttrToken::lexer(&inner[name_len..]).spanned().peekable();

    while let Some((result, range)) = tokens.next() {
        let attr_span = TokenSpan::from(range).offset(base);

        let name = match result {
            Ok(AttrToken::Word(name)) => name.to_ascii_lowercase(),
            Ok(other) => {
                return Err(ParseError::unexpected_token(
                    attr_span,
                    "attribute name",
                    format!("{:?}", other),
                ))
            }
            Err(()) => return Err(ParseError::lex_error(attr_span, "Invalid attribute")),
        };

        let value = if matches!(tokens.peek(), Some((Ok(AttrToken::Eq), _))) {
            tokens.next();
            match tokens.next() {
                Some((Ok(AttrToken::Quoted(v)), _)) | Some((Ok(AttrToken::Word(v)), _)) => {
                    decode_html_entities(v).into_owned()
                }
                Some((_, range)) => {
                    return Err(ParseError::unexpected_token(
                        TokenSpan::from(range).offset(base),
                        "attribute value",
                        "invalid token",
                    ))
                }
                None => {
                    return Err(ParseError::unexpected_token(
                        attr_span,
                        "attribute value",
                        "end of tag",
                    ))
                }
            }
        } else {
            String::new()
        };

        apply_attribute(&mut node, name, value);
    }

    Ok((node, self_closing))
}

/// Route an attribute into the node's id, classes, style or attribute map.
/// The first occurrence of a repeated attribute wins.
fn apply_attribute(node: &mut Node, name: String, value: String) {
    match name.as_str() {
        "id" => {
            if node.id.is_empty() {
                node.id = value.trim().to_string();
            }
        }
        "class" => {
            for class in value.split_ascii_whitespace() {
                if class != SELECTED_CLASS {
                    node.classes.insert(class.to_string());
                }
            }
        }
        "style" => {
            for (property, value) in parse_style_declarations(&value) {
                node.style.entry(property).or_insert(value);
            }
        }
        _ => {
            node.attributes.entry(name).or_insert(value);
        }
    }
}

//! Sequences of tree operations against a document, checked through the
//! serialized markup and the tree itself.

use mosaic_editor::{
    Direction, DropPosition, DropResolver, DropZones, Mutation, MutationContext, MutationError,
};
use mosaic_markup::{parse, serialize, BuiltinCatalog, Document, IdGenerator, Node};

fn doc(markup: &str) -> Document {
    Document::from_markup(markup, IdGenerator::new()).unwrap()
}

fn apply(doc: &mut Document, mutation: Mutation) -> Result<mosaic_editor::MutationOutcome, MutationError> {
    let catalog = BuiltinCatalog::new();
    mutation.apply(doc, &MutationContext::new(&catalog))
}

fn strip_selection(node: &mut Node) {
    node.walk_mut(&mut |n| n.set_selected(false));
}

#[test]
fn test_serialize_parse_is_lossless_modulo_selection() {
    let mut document = doc(concat!(
        "<section id=\"hero\" class=\"wide\" style=\"padding: 40px 20px\">",
        "Intro",
        "<h1 id=\"title\">Hello &amp; welcome</h1>",
        "<img id=\"logo\" src=\"logo.png\" alt=\"\">",
        "<ul id=\"list\"><li id=\"one\">One</li><li id=\"two\">Two</li></ul>",
        "</section>"
    ));
    document.mark_selection(&["title".to_string(), "two".to_string()]);

    let markup = document.to_markup();
    let mut reparsed = parse(&markup, &mut IdGenerator::new()).unwrap();

    let mut original = document.root().clone();
    strip_selection(&mut original);
    strip_selection(&mut reparsed);
    assert_eq!(reparsed, original);
}

#[test]
fn test_cyclic_moves_leave_tree_unchanged() {
    let mut document = doc(concat!(
        "<div id=\"outer\">",
        "<div id=\"middle\"><p id=\"leaf\">x</p></div>",
        "</div>"
    ));
    let before = document.to_markup();

    for target in ["outer", "middle", "leaf"] {
        let err = apply(
            &mut document,
            Mutation::MoveNode {
                node_id: "outer".into(),
                target_id: target.into(),
                position: DropPosition::Inside,
            },
        )
        .unwrap_err();
        assert!(matches!(err, MutationError::CyclicMove { .. }), "{target}");
    }

    assert_eq!(document.to_markup(), before);
}

#[test]
fn test_three_level_wrap() {
    let mut document = Document::new();

    let container = apply(
        &mut document,
        Mutation::CreateElement {
            template: "div".into(),
            target_id: "canvas".into(),
            index: None,
        },
    )
    .unwrap()
    .created
    .unwrap();

    let button = apply(
        &mut document,
        Mutation::CreateElement {
            template: "button".into(),
            target_id: container.clone(),
            index: None,
        },
    )
    .unwrap()
    .created
    .unwrap();

    let wrapper = apply(
        &mut document,
        Mutation::WrapSiblings {
            tag: "div".into(),
            node_ids: vec![button.clone()],
        },
    )
    .unwrap()
    .created
    .unwrap();

    let root = document.root();
    assert_eq!(root.children.len(), 1);
    let c = &root.children[0];
    assert_eq!(c.id, container);
    assert_eq!(c.children.len(), 1);
    assert_eq!(c.children[0].id, wrapper);
    assert_eq!(c.children[0].children[0].id, button);

    let markup = serialize(root);
    let button_line = markup
        .lines()
        .find(|line| line.trim_start().starts_with("<button"))
        .unwrap();
    assert!(button_line.starts_with("    <button"));
}

#[test]
fn test_void_target_degrades_inside_drop() {
    let document = doc("<div id=\"box\"><img id=\"pic\" src=\"a.png\"></div><p id=\"p\">x</p>");
    let resolver = DropResolver::new(DropZones::default());

    let intent = DropResolver::evaluate(&document, Some("p"), "pic", DropPosition::Inside);
    assert!(!intent.valid);

    let resolved = resolver.resolve(&document, Some("p"), "pic", 50.0, 100.0);
    assert_eq!(resolved.position, DropPosition::After);
    assert_eq!(resolved.degraded_from, Some(DropPosition::Inside));
    assert!(resolved.valid);
}

#[test]
fn test_set_text_needs_confirmation_to_discard_children() {
    let mut document = doc("<div id=\"d\"><p id=\"a\">a</p><p id=\"b\">b</p></div>");
    let before = document.to_markup();

    let err = apply(
        &mut document,
        Mutation::SetText {
            node_id: "d".into(),
            text: "plain".into(),
            confirm_discard: false,
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        MutationError::WouldDiscardChildren {
            node_id: "d".into(),
            children: 2,
        }
    );
    assert_eq!(document.to_markup(), before);

    apply(
        &mut document,
        Mutation::SetText {
            node_id: "d".into(),
            text: "plain".into(),
            confirm_discard: true,
        },
    )
    .unwrap();
    let node = document.find("d").unwrap();
    assert!(node.children.is_empty());
    assert_eq!(node.text, "plain");
}

#[test]
fn test_move_then_remove_sequence() {
    let mut document = doc(concat!(
        "<div id=\"a\"><p id=\"a1\">1</p></div>",
        "<div id=\"b\"><p id=\"b1\">2</p></div>"
    ));

    apply(
        &mut document,
        Mutation::MoveNode {
            node_id: "b1".into(),
            target_id: "a1".into(),
            position: DropPosition::After,
        },
    )
    .unwrap();
    assert_eq!(document.locate("b1"), Some(("a".to_string(), 1)));

    apply(&mut document, Mutation::RemoveNode { node_id: "a".into() }).unwrap();
    assert!(!document.contains("a1"));
    assert!(!document.contains("b1"));

    let err = apply(&mut document, Mutation::RemoveNode { node_id: "b1".into() }).unwrap_err();
    assert_eq!(err, MutationError::NotFound("b1".into()));

    assert_eq!(document.to_markup(), "<div id=\"b\"></div>\n");
}

#[test]
fn test_duplicate_then_move_up() {
    let mut document = doc("<p id=\"a\">A</p><p id=\"b\">B</p>");

    let copy = apply(&mut document, Mutation::Duplicate { node_id: "b".into() })
        .unwrap()
        .created
        .unwrap();
    assert_eq!(document.locate(&copy), Some(("canvas".to_string(), 2)));

    apply(
        &mut document,
        Mutation::MoveAdjacent {
            node_id: copy.clone(),
            direction: Direction::Up,
        },
    )
    .unwrap();
    apply(
        &mut document,
        Mutation::MoveAdjacent {
            node_id: copy.clone(),
            direction: Direction::Up,
        },
    )
    .unwrap();

    let order: Vec<_> = document.root().children.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(order, vec![copy.as_str(), "a", "b"]);
    assert_eq!(document.find(&copy).unwrap().text, "B");
}

#[test]
fn test_unwrap_after_wrap_restores_layout() {
    let mut document = doc("<p id=\"a\">A</p><p id=\"b\">B</p>");
    let before = document.to_markup();

    let wrapper = apply(
        &mut document,
        Mutation::WrapSiblings {
            tag: "section".into(),
            node_ids: vec!["b".into(), "a".into()],
        },
    )
    .unwrap()
    .created
    .unwrap();
    assert_eq!(document.root().children.len(), 1);

    apply(&mut document, Mutation::Unwrap { node_id: wrapper }).unwrap();
    assert_eq!(document.to_markup(), before);
}

#[test]
fn test_mutations_from_json_script() {
    let script = r#"[
        { "op": "set_style", "node_id": "a", "property": "color", "value": "red" },
        { "op": "set_classes", "node_id": "a", "classes": ["lead", "muted"] },
        { "op": "set_attribute", "node_id": "a", "name": "title", "value": "Intro" }
    ]"#;
    let mutations: Vec<Mutation> = serde_json::from_str(script).unwrap();

    let mut document = doc("<p id=\"a\">x</p>");
    for mutation in mutations {
        apply(&mut document, mutation).unwrap();
    }

    assert_eq!(
        document.to_markup(),
        "<p id=\"a\" class=\"lead muted\" title=\"Intro\" style=\"color: red\">x</p>\n"
    );
}

/// Serializing and re-parsing gives the same tree, and no id repeats
fn assert_reads_back(document: &Document, step: &str) {
    let markup = document.to_markup();
    let mut reparsed = parse(&markup, &mut IdGenerator::new()).unwrap();

    let mut original = document.root().clone();
    strip_selection(&mut original);
    strip_selection(&mut reparsed);
    assert_eq!(reparsed, original, "after {step}:\n{markup}");

    let ids: Vec<_> = original.descendants().into_iter().map(|n| n.id.as_str()).collect();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "after {step}: {ids:?}");
}

#[test]
fn test_every_mutation_kind_reads_back() {
    let mut document = doc(concat!(
        "<div id=\"box\">",
        "<p id=\"p\">Text</p>",
        "<button id=\"btn\">Go <i id=\"i\">now</i></button>",
        "</div>"
    ));
    let imported: Node = serde_json::from_str(
        r#"{
            "tag": "ARTICLE",
            "attributes": { "Data-K": "v" },
            "text": "  lead  ",
            "children": [{ "tag": "b", "text": "bold" }]
        }"#,
    )
    .unwrap();

    let steps = vec![
        (true, Mutation::SetStyle { node_id: "p".into(), property: "Color".into(), value: "red;".into() }),
        (false, Mutation::SetStyle { node_id: "p".into(), property: "color".into(), value: "red; background: blue".into() }),
        (false, Mutation::SetStyle { node_id: "p".into(), property: "a:b".into(), value: "c".into() }),
        (true, Mutation::SetClasses { node_id: "p".into(), classes: vec!["card wide".into(), "x".into()] }),
        (true, Mutation::SetAttribute { node_id: "p".into(), name: "data-note".into(), value: "say \"hi\" <now> & go".into() }),
        (false, Mutation::SetAttribute { node_id: "p".into(), name: "\"".into(), value: "x".into() }),
        (false, Mutation::SetAttribute { node_id: "p".into(), name: "on click".into(), value: "x".into() }),
        (true, Mutation::SetAttribute { node_id: "p".into(), name: "class".into(), value: "  lead   muted ".into() }),
        (true, Mutation::SetAttribute { node_id: "p".into(), name: "style".into(), value: "margin: 0; color: blue".into() }),
        (true, Mutation::SetText { node_id: "p".into(), text: "   ".into(), confirm_discard: false }),
        (true, Mutation::WrapInlineContent { node_id: "btn".into(), tag: "span".into() }),
        (false, Mutation::WrapInlineContent { node_id: "btn".into(), tag: "no way".into() }),
        (true, Mutation::WrapSiblings { tag: "SECTION".into(), node_ids: vec!["p".into(), "btn".into()] }),
        (false, Mutation::WrapSiblings { tag: "style".into(), node_ids: vec!["box".into()] }),
        (true, Mutation::InsertNode {
            parent_id: "canvas".into(),
            index: None,
            node: Node::new("div", "span-1").with_child(Node::unmanaged("span").with_text("   ")),
        }),
        (true, Mutation::InsertNode { parent_id: "canvas".into(), index: Some(0), node: imported.clone() }),
        (true, Mutation::PasteSubtree { subtree: imported, target_id: "box".into() }),
        (true, Mutation::Duplicate { node_id: "box".into() }),
        (true, Mutation::SetId { node_id: "p".into(), id: "intro".into() }),
        (true, Mutation::CreateElement { template: "button".into(), target_id: "canvas".into(), index: None }),
        (true, Mutation::MoveNode { node_id: "intro".into(), target_id: "canvas".into(), position: DropPosition::Inside }),
        (true, Mutation::Unwrap { node_id: "box".into() }),
    ];

    assert_reads_back(&document, "load");
    for (expect_ok, mutation) in steps {
        let step = format!("{mutation:?}");
        let result = apply(&mut document, mutation);
        assert_eq!(result.is_ok(), expect_ok, "{step}: {result:?}");
        assert_reads_back(&document, &step);
    }

    let article = document
        .root()
        .children
        .iter()
        .find(|node| node.tag == "article")
        .unwrap();
    assert_eq!(article.attributes["data-k"], "v");
    assert_eq!(article.text, "lead");
}

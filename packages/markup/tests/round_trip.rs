use mosaic_markup::{parse, serialize, IdGenerator, Node, SELECTED_CLASS};

fn sample_tree() -> Node {
    let mut button = Node::new("button", "button-7")
        .with_class("btn")
        .with_attribute("type", "button")
        .with_style("padding", "10px 20px")
        .with_style("background-color", "#007acc")
        .with_text("Click Me");
    button.classes.insert(SELECTED_CLASS.to_string());

    Node::root()
        .with_child(
            Node::new("section", "hero")
                .with_class("hero")
                .with_class("dark")
                .with_style("padding", "40px 20px")
                .with_text("Intro")
                .with_child(Node::new("h1", "h1-1").with_text("Welcome & hello"))
                .with_child(
                    Node::new("div", "div-2")
                        .with_child(button)
                        .with_child(
                            Node::new("img", "img-3")
                                .with_attribute("src", "https://example.com/a.png?x=1&y=2")
                                .with_attribute("alt", "A \"quoted\" caption"),
                        ),
                ),
        )
        .with_child(Node::new("p", "p-4").with_text("a < b"))
        .with_child(Node::new("video", "video-5").with_attribute("controls", ""))
        .with_child(Node::new("div", "empty-6"))
}

fn without_selection(mut node: Node) -> Node {
    node.clear_transient();
    node
}

#[test]
fn test_parse_serialize_is_structurally_lossless() {
    let tree = sample_tree();
    let markup = serialize(&tree);
    let parsed = parse(&markup, &mut IdGenerator::new()).unwrap();

    assert_eq!(parsed, without_selection(tree));
}

#[test]
fn test_serialization_is_stable() {
    let markup = serialize(&sample_tree());
    let parsed = parse(&markup, &mut IdGenerator::new()).unwrap();

    assert_eq!(serialize(&parsed), markup);
}

#[test]
fn test_markers_never_reach_markup() {
    let markup = serialize(&sample_tree());

    assert!(!markup.contains("mosaic-node"));
    assert!(!markup.contains("mosaic-selected"));
    assert!(markup.contains("class=\"btn\""));
}

#[test]
fn test_serialized_layout() {
    let markup = serialize(&sample_tree());
    let lines: Vec<&str> = markup.lines().collect();

    assert_eq!(
        lines[0],
        "<section id=\"hero\" class=\"hero dark\" style=\"padding: 40px 20px\">"
    );
    assert_eq!(lines[1], "  Intro");
    assert_eq!(lines[2], "  <h1 id=\"h1-1\">Welcome &amp; hello</h1>");
    assert_eq!(lines[3], "  <div id=\"div-2\">");
    assert!(lines[4].starts_with("    <button id=\"button-7\" class=\"btn\" type=\"button\""));
    assert!(lines[5].starts_with("    <img id=\"img-3\""));
    assert_eq!(lines[6], "  </div>");
    assert_eq!(lines[7], "</section>");
    assert_eq!(lines[9], "<video id=\"video-5\" controls></video>");
    assert_eq!(lines[10], "<div id=\"empty-6\"></div>");
}

#[test]
fn test_external_markup_gets_ids_and_markers() {
    let source = r#"
<!DOCTYPE html>
<html>
  <head><title>Landing</title></head>
  <body>
    <!-- hero -->
    <header class="site-header">
      <nav><a href="/">Home</a><a href="/about">About</a></nav>
    </header>
    <main role="main">
      <input type="text" placeholder="Search">
    </main>
  </body>
</html>
"#;

    let root = parse(source, &mut IdGenerator::from_seed("ab12")).unwrap();
    let tags: Vec<_> = root.descendants().iter().map(|n| n.tag.clone()).collect();
    assert_eq!(tags, vec!["header", "nav", "a", "a", "main", "input"]);

    for node in root.descendants() {
        assert!(node.is_managed());
        assert!(node.id.contains("-ab12-"), "unexpected id {}", node.id);
    }
    assert_eq!(root.children[0].children[0].children[1].text, "About");
}

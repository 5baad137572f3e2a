use super::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mosaic_markup::Node;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Markup file to outline
    pub file: String,

    /// Print without colors
    #[arg(long)]
    pub plain: bool,
}

const TEXT_PREVIEW_LEN: usize = 32;

/// One outline row: nesting depth plus the node's label parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub depth: usize,
    pub tag: String,
    pub id: String,
    pub classes: Vec<String>,
    pub text: Option<String>,
}

impl OutlineRow {
    /// Plain `tag#id.class "text"` label
    pub fn label(&self) -> String {
        let mut label = format!("{}#{}", self.tag, self.id);
        for class in &self.classes {
            label.push('.');
            label.push_str(class);
        }
        if let Some(text) = &self.text {
            label.push_str(&format!(" {:?}", text));
        }
        label
    }
}

pub fn tree(args: TreeArgs, cwd: &str) -> Result<()> {
    let path = PathBuf::from(cwd).join(&args.file);
    let (document, _) = load_document(&path)?;

    println!("{}", args.file.bright_white().bold());
    for row in outline(document.root()) {
        if args.plain {
            println!("{}{}", "  ".repeat(row.depth + 1), row.label());
            continue;
        }

        let mut line = format!("{}{}", "  ".repeat(row.depth + 1), row.tag.cyan());
        line.push_str(&format!("#{}", row.id).yellow().to_string());
        for class in &row.classes {
            line.push_str(&format!(".{}", class).green().to_string());
        }
        if let Some(text) = &row.text {
            line.push_str(&format!(" {:?}", text).dimmed().to_string());
        }
        println!("{}", line);
    }

    Ok(())
}

/// Outline rows for the canvas content in document order
pub fn outline(root: &Node) -> Vec<OutlineRow> {
    let mut rows = Vec::new();
    for child in &root.children {
        collect(child, 0, &mut rows);
    }
    rows
}

fn collect(node: &Node, depth: usize, rows: &mut Vec<OutlineRow>) {
    let text = node.text.trim();
    let text = (!text.is_empty()).then(|| preview(text));

    rows.push(OutlineRow {
        depth,
        tag: node.tag.clone(),
        id: node.id.clone(),
        classes: node.user_classes().map(str::to_string).collect(),
        text,
    });

    for child in &node.children {
        collect(child, depth + 1, rows);
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= TEXT_PREVIEW_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(TEXT_PREVIEW_LEN).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_markup::{Document, IdGenerator};

    #[test]
    fn test_outline_rows() {
        let document = Document::from_markup(
            "<div id=\"box\" class=\"card wide\"><p id=\"a\">Hello</p></div><hr id=\"rule\">",
            IdGenerator::new(),
        )
        .unwrap();

        let labels: Vec<_> = outline(document.root())
            .iter()
            .map(|row| format!("{}{}", "  ".repeat(row.depth), row.label()))
            .collect();

        assert_eq!(
            labels,
            vec![
                "div#box.card.wide".to_string(),
                "  p#a \"Hello\"".to_string(),
                "hr#rule".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_text_is_truncated() {
        let long = "x".repeat(40);
        let node = Node::root().with_child(Node::new("p", "a").with_text(long));
        let rows = outline(&node);
        assert_eq!(rows[0].text.as_ref().unwrap().chars().count(), TEXT_PREVIEW_LEN + 1);
    }
}

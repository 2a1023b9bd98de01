//! Markdown document rendering.
//!
//! A page document is YAML front matter, an ancestor breadcrumb line, the
//! title as a level-one heading, and the page body converted from the
//! Confluence `export_view` HTML.
//!
//! The converter is deliberately small. It covers the elements Confluence
//! actually emits for ordinary prose (headings, paragraphs, emphasis, code,
//! links, images, lists, preformatted blocks, simple tables) and strips any
//! tag it does not recognize, keeping the text inside.

use crate::confluence::Page;

/// Render the complete Markdown document for a page.
#[must_use]
pub fn render_document(page: &Page) -> String {
    let mut doc = front_matter(page);
    doc.push('\n');

    if !page.ancestors.is_empty() {
        let trail: Vec<&str> = page.ancestors.iter().map(|a| a.title.as_str()).collect();
        doc.push_str(&trail.join(" > "));
        doc.push_str("\n\n");
    }

    doc.push_str("# ");
    doc.push_str(&page.title);
    doc.push('\n');

    let body = html_to_markdown(&page.body_html);
    if !body.is_empty() {
        doc.push('\n');
        doc.push_str(&body);
    }
    doc
}

fn front_matter(page: &Page) -> String {
    let mut yml = String::from("---\n");
    yml.push_str(&format!("title: {}\n", yaml_quote(&page.title)));
    yml.push_str(&format!("page_id: {}\n", yaml_quote(&page.id)));
    if !page.space_key.is_empty() {
        yml.push_str(&format!("space_key: {}\n", yaml_quote(&page.space_key)));
    }
    if !page.labels.is_empty() {
        yml.push_str("tags:\n");
        for label in &page.labels {
            yml.push_str(&format!("  - {}\n", yaml_quote(&format!("#{label}"))));
        }
    }
    yml.push_str("---\n");
    yml
}

fn yaml_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

enum ListKind {
    Unordered,
    Ordered(usize),
}

/// Convert a fragment of Confluence export HTML to Markdown.
///
/// Unknown tags are stripped, their text content kept. Entities are decoded,
/// whitespace outside `<pre>` is collapsed, and runs of blank lines are
/// reduced to one.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut lists: Vec<ListKind> = Vec::new();
    let mut links: Vec<Option<String>> = Vec::new();
    let mut in_pre = false;

    let mut i = 0;
    while i < html.len() {
        let rest = &html[i..];
        if rest.starts_with("<!--") {
            i += rest.find("-->").map_or(rest.len(), |p| p + 3);
            continue;
        }
        if rest.starts_with('<') {
            let Some(close) = rest.find('>') else {
                push_text(&rest[1..], in_pre, &mut out);
                break;
            };
            let tag = &rest[1..close];
            i += close + 1;

            let (name, closing) = tag_name(tag);
            match name.as_str() {
                // Contents of these never belong in the document.
                "script" | "style" if !closing => {
                    let end_tag = format!("</{name}");
                    let after = &html[i..];
                    i += after
                        .to_ascii_lowercase()
                        .find(&end_tag)
                        .map_or(after.len(), |p| p + end_tag.len() + 1);
                }
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    if closing {
                        out.push_str("\n\n");
                    } else {
                        let level = name[1..].parse::<usize>().unwrap_or(1);
                        out.push_str("\n\n");
                        out.push_str(&"#".repeat(level));
                        out.push(' ');
                    }
                }
                "p" | "div" | "blockquote" => out.push_str("\n\n"),
                "br" => out.push('\n'),
                "strong" | "b" => {
                    if !in_pre {
                        out.push_str("**");
                    }
                }
                "em" | "i" => {
                    if !in_pre {
                        out.push('*');
                    }
                }
                "code" => {
                    if !in_pre {
                        out.push('`');
                    }
                }
                "pre" => {
                    if closing {
                        if !out.ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str("```\n\n");
                        in_pre = false;
                    } else {
                        out.push_str("\n\n```\n");
                        in_pre = true;
                    }
                }
                "ul" => {
                    if closing {
                        lists.pop();
                        out.push('\n');
                    } else {
                        lists.push(ListKind::Unordered);
                    }
                }
                "ol" => {
                    if closing {
                        lists.pop();
                        out.push('\n');
                    } else {
                        lists.push(ListKind::Ordered(0));
                    }
                }
                "li" => {
                    if !closing {
                        let depth = lists.len().max(1);
                        if !out.ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str(&"  ".repeat(depth - 1));
                        match lists.last_mut() {
                            Some(ListKind::Ordered(n)) => {
                                *n += 1;
                                out.push_str(&format!("{n}. "));
                            }
                            _ => out.push_str("- "),
                        }
                    }
                }
                "a" => {
                    if closing {
                        if let Some(Some(href)) = links.pop() {
                            out.push_str("](");
                            out.push_str(&href);
                            out.push(')');
                        }
                    } else {
                        let href = attr_value(tag, "href");
                        if href.is_some() {
                            out.push('[');
                        }
                        links.push(href);
                    }
                }
                "img" => {
                    if !closing {
                        let src = attr_value(tag, "src").unwrap_or_default();
                        let alt = attr_value(tag, "alt").unwrap_or_default();
                        out.push_str(&format!("![{alt}]({src})"));
                    }
                }
                "td" | "th" => {
                    if closing {
                        out.push(' ');
                    }
                }
                "tr" => {
                    if closing {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        } else {
            let next = rest.find('<').map_or(html.len(), |p| i + p);
            push_text(&html[i..next], in_pre, &mut out);
            i = next;
        }
    }

    normalize(&out)
}

/// Lowercased tag name and whether this is a closing tag.
fn tag_name(tag: &str) -> (String, bool) {
    let trimmed = tag.trim();
    let closing = trimmed.starts_with('/');
    let name: String = trimmed
        .trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    (name, closing)
}

/// Pull a quoted attribute value out of a raw tag body.
fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let mut search = 0;
    while let Some(pos) = lower[search..].find(attr) {
        let at = search + pos;
        // Must be a whole attribute name, not the tail of a longer one.
        if at > 0 && !tag.as_bytes()[at - 1].is_ascii_whitespace() {
            search = at + attr.len();
            continue;
        }
        let after = &tag[at + attr.len()..];
        let after = after.trim_start();
        if let Some(rest) = after.strip_prefix('=') {
            let rest = rest.trim_start();
            let quote = rest.chars().next()?;
            if quote == '"' || quote == '\'' {
                let inner = &rest[1..];
                let end = inner.find(quote)?;
                let mut value = String::new();
                decode_entities(&inner[..end], &mut value);
                return Some(value);
            }
        }
        search = at + attr.len();
    }
    None
}

fn push_text(text: &str, in_pre: bool, out: &mut String) {
    let mut decoded = String::with_capacity(text.len());
    decode_entities(text, &mut decoded);
    if in_pre {
        out.push_str(&decoded);
        return;
    }
    for c in decoded.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') && !out.ends_with('\n') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn decode_entities(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        // Entity names are short; anything longer is a bare ampersand.
        let semicolon = match rest.find(';') {
            Some(end) if end <= 10 => end,
            _ => {
                out.push('&');
                rest = &rest[1..];
                continue;
            }
        };
        let entity = &rest[1..semicolon];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32)
            }
            _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semicolon + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
}

/// Trim line endings and squeeze runs of blank lines down to one.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    let trimmed = out.trim_start_matches('\n').trim_end();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confluence::Ancestor;

    fn page(title: &str, body: &str) -> Page {
        Page {
            id: "100".to_string(),
            title: title.to_string(),
            version: 3,
            space_key: "ENG".to_string(),
            ancestors: Vec::new(),
            labels: Vec::new(),
            body_html: body.to_string(),
        }
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let md = html_to_markdown("<h2>Setup</h2><p>First install it.</p><p>Then run it.</p>");
        assert_eq!(md, "## Setup\n\nFirst install it.\n\nThen run it.\n");
    }

    #[test]
    fn test_inline_markup() {
        let md = html_to_markdown("<p>Use <strong>bold</strong>, <em>italics</em> and <code>cme sync</code>.</p>");
        assert_eq!(md, "Use **bold**, *italics* and `cme sync`.\n");
    }

    #[test]
    fn test_links_and_images() {
        let md = html_to_markdown(r#"<p><a href="https://example.com/wiki">the wiki</a></p>"#);
        assert_eq!(md, "[the wiki](https://example.com/wiki)\n");

        let md = html_to_markdown(r#"<img src="diagram.png" alt="overview">"#);
        assert_eq!(md, "![overview](diagram.png)\n");
    }

    #[test]
    fn test_anchor_without_href_keeps_text() {
        let md = html_to_markdown("<p><a name=\"top\">start here</a></p>");
        assert_eq!(md, "start here\n");
    }

    #[test]
    fn test_nested_lists() {
        let html = "<ul><li>one<ul><li>one.a</li></ul></li><li>two</li></ul>";
        assert_eq!(html_to_markdown(html), "- one\n  - one.a\n- two\n");
    }

    #[test]
    fn test_ordered_list_numbering() {
        let html = "<ol><li>first</li><li>second</li><li>third</li></ol>";
        assert_eq!(html_to_markdown(html), "1. first\n2. second\n3. third\n");
    }

    #[test]
    fn test_pre_block_keeps_layout() {
        let html = "<pre><code>fn main() {\n    run();\n}</code></pre>";
        let md = html_to_markdown(html);
        assert_eq!(md, "```\nfn main() {\n    run();\n}\n```\n");
    }

    #[test]
    fn test_entities_are_decoded() {
        let md = html_to_markdown("<p>a &amp; b &lt; c &#8594; d&nbsp;e</p>");
        assert_eq!(md, "a & b < c \u{2192} d e\n");
    }

    #[test]
    fn test_unknown_tags_are_stripped() {
        let md = html_to_markdown(
            r#"<ac:structured-macro ac:name="info"><p>heads up</p></ac:structured-macro>"#,
        );
        assert_eq!(md, "heads up\n");
    }

    #[test]
    fn test_script_and_style_contents_are_dropped() {
        let md = html_to_markdown("<style>p { color: red }</style><p>kept</p><script>alert(1)</script>");
        assert_eq!(md, "kept\n");
    }

    #[test]
    fn test_document_front_matter_and_breadcrumbs() {
        let mut p = page("Getting Started", "<p>Welcome.</p>");
        p.labels = vec!["howto".to_string(), "onboarding".to_string()];
        p.ancestors = vec![
            Ancestor {
                id: "1".to_string(),
                title: "Home".to_string(),
            },
            Ancestor {
                id: "2".to_string(),
                title: "Guides".to_string(),
            },
        ];

        let doc = render_document(&p);
        let expected = "---\n\
                        title: \"Getting Started\"\n\
                        page_id: \"100\"\n\
                        space_key: \"ENG\"\n\
                        tags:\n\
                        \x20 - \"#howto\"\n\
                        \x20 - \"#onboarding\"\n\
                        ---\n\
                        \n\
                        Home > Guides\n\
                        \n\
                        # Getting Started\n\
                        \n\
                        Welcome.\n";
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_document_without_ancestors_or_body() {
        let doc = render_document(&page("Empty", ""));
        assert_eq!(
            doc,
            "---\ntitle: \"Empty\"\npage_id: \"100\"\nspace_key: \"ENG\"\n---\n\n# Empty\n"
        );
    }

    #[test]
    fn test_titles_with_quotes_are_escaped() {
        let doc = render_document(&page("Say \"hi\"", ""));
        assert!(doc.contains("title: \"Say \\\"hi\\\"\""));
    }
}

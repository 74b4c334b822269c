//! Indentation pass over finished documents.
//!
//! Block elements go on their own lines, indented two spaces per level, and
//! the children of `<html>` are indented as well. Runs of text and inline
//! elements stay on one line. The contents of `script`, `style`, `pre` and
//! `textarea` are copied byte for byte.

/// One indentation level.
pub const INDENT: &str = "  ";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "img",
    "input", "kbd", "label", "mark", "q", "s", "samp", "select", "small", "span", "strong",
    "sub", "sup", "time", "u", "var", "wbr",
];

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    /// Doctype, comment, void tag or a whole raw-text element.
    Atom { name: String, source: &'a str },
    Open { name: String, source: &'a str },
    Close { name: String, source: &'a str },
}

#[derive(Debug)]
enum Node<'a> {
    Text(&'a str),
    Atom {
        name: String,
        source: &'a str,
    },
    Element {
        name: String,
        open: &'a str,
        close: Option<&'a str>,
        children: Vec<Node<'a>>,
    },
}

impl Node<'_> {
    fn is_inline(&self) -> bool {
        match self {
            Self::Text(_) => true,
            Self::Atom { name, .. } => INLINE_ELEMENTS.contains(&name.as_str()),
            Self::Element { name, children, .. } => {
                INLINE_ELEMENTS.contains(&name.as_str()) && children.iter().all(Node::is_inline)
            }
        }
    }
}

struct Frame<'a> {
    name: String,
    open: &'a str,
    children: Vec<Node<'a>>,
}

impl<'a> Frame<'a> {
    fn into_node(self, close: Option<&'a str>) -> Node<'a> {
        Node::Element {
            name: self.name,
            open: self.open,
            close,
            children: self.children,
        }
    }
}

/// Indent `html`, two spaces per nesting level.
///
/// Malformed markup is tolerated: unterminated tags are kept as text,
/// unclosed elements end with their parent, and stray closing tags stay where
/// they are.
#[must_use]
pub fn beautify(html: &str) -> String {
    let nodes = build_tree(tokenize(html));
    let mut lines = Vec::new();
    write_children(&nodes, 0, &mut lines);
    lines.join("\n")
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let rest = &html[pos..];

        let len = if rest.starts_with("<!--") {
            let len = rest.find("-->").map_or(rest.len(), |end| end + 3);
            tokens.push(Token::Atom {
                name: String::new(),
                source: &rest[..len],
            });
            len
        } else if starts_markup(rest) {
            match tag_end(rest) {
                Some(end) => push_tag(rest, end, &mut tokens),
                None => {
                    tokens.push(Token::Text(rest));
                    rest.len()
                }
            }
        } else {
            let len = text_len(rest);
            tokens.push(Token::Text(&rest[..len]));
            len
        };

        pos += len;
    }

    tokens
}

/// Push the tag spanning `rest[..end]` and return how many bytes it consumed.
fn push_tag<'a>(rest: &'a str, end: usize, tokens: &mut Vec<Token<'a>>) -> usize {
    let source = &rest[..end];
    let name = tag_name(source);

    if source.starts_with("<!") || source.starts_with("<?") || name.is_empty() {
        tokens.push(Token::Atom {
            name: String::new(),
            source,
        });
        return end;
    }

    if source.starts_with("</") {
        tokens.push(Token::Close { name, source });
        return end;
    }

    if source.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str()) {
        tokens.push(Token::Atom { name, source });
        return end;
    }

    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
        let len = raw_text_end(rest, end, &name);
        tokens.push(Token::Atom {
            name,
            source: &rest[..len],
        });
        return len;
    }

    tokens.push(Token::Open { name, source });
    end
}

/// End of a raw-text element whose opening tag ends at `open_end`.
fn raw_text_end(rest: &str, open_end: usize, name: &str) -> usize {
    let needle = format!("</{name}");
    rest[open_end..]
        .to_ascii_lowercase()
        .find(&needle)
        .and_then(|offset| {
            let at = open_end + offset;
            tag_end(&rest[at..]).map(|end| at + end)
        })
        .unwrap_or(rest.len())
}

fn starts_markup(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

/// Length of the text run before the next tag.
fn text_len(rest: &str) -> usize {
    rest.char_indices()
        .skip(1)
        .find(|&(i, c)| c == '<' && starts_markup(&rest[i..]))
        .map_or(rest.len(), |(i, _)| i)
}

/// Index just past the `>` closing the tag at the start of `s`, skipping
/// quoted attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in s.bytes().enumerate().skip(1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

fn tag_name(source: &str) -> String {
    source
        .trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn build_tree(tokens: Vec<Token<'_>>) -> Vec<Node<'_>> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => push(&mut stack, &mut root, Node::Text(text)),
            Token::Atom { name, source } => push(&mut stack, &mut root, Node::Atom { name, source }),
            Token::Open { name, source } => stack.push(Frame {
                name,
                open: source,
                children: Vec::new(),
            }),
            Token::Close { name, source } => {
                let open_at = stack.iter().rposition(|f| f.name == name);
                match open_at {
                    Some(at) => {
                        while stack.len() > at + 1 {
                            close_frame(&mut stack, &mut root, None);
                        }
                        close_frame(&mut stack, &mut root, Some(source));
                    }
                    None => push(
                        &mut stack,
                        &mut root,
                        Node::Atom {
                            name: String::new(),
                            source,
                        },
                    ),
                }
            }
        }
    }

    while !stack.is_empty() {
        close_frame(&mut stack, &mut root, None);
    }

    root
}

fn push<'a>(stack: &mut [Frame<'a>], root: &mut Vec<Node<'a>>, node: Node<'a>) {
    match stack.last_mut() {
        Some(frame) => frame.children.push(node),
        None => root.push(node),
    }
}

fn close_frame<'a>(stack: &mut Vec<Frame<'a>>, root: &mut Vec<Node<'a>>, close: Option<&'a str>) {
    if let Some(frame) = stack.pop() {
        let node = frame.into_node(close);
        push(stack, root, node);
    }
}

fn write_children(children: &[Node<'_>], depth: usize, lines: &mut Vec<String>) {
    let mut run = String::new();
    for child in children {
        if child.is_inline() {
            write_inline(child, &mut run);
        } else {
            flush(&mut run, depth, lines);
            write_block(child, depth, lines);
        }
    }
    flush(&mut run, depth, lines);
}

fn write_block(node: &Node<'_>, depth: usize, lines: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    match node {
        Node::Element {
            open,
            close,
            children,
            ..
        } if !children.iter().all(Node::is_inline) => {
            lines.push(format!("{pad}{open}"));
            write_children(children, depth + 1, lines);
            if let Some(close) = close {
                lines.push(format!("{pad}{close}"));
            }
        }
        Node::Element {
            open,
            close,
            children,
            ..
        } => {
            let mut inner = String::new();
            for child in children {
                write_inline(child, &mut inner);
            }
            lines.push(format!("{pad}{open}{}{}", inner.trim(), close.unwrap_or("")));
        }
        Node::Atom { source, .. } => lines.push(format!("{pad}{source}")),
        Node::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                lines.push(format!("{pad}{text}"));
            }
        }
    }
}

fn write_inline(node: &Node<'_>, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Atom { source, .. } => out.push_str(source),
        Node::Element {
            open,
            close,
            children,
            ..
        } => {
            out.push_str(open);
            for child in children {
                write_inline(child, out);
            }
            out.push_str(close.unwrap_or(""));
        }
    }
}

fn flush(run: &mut String, depth: usize, lines: &mut Vec<String>) {
    let text = run.trim();
    if !text.is_empty() {
        lines.push(format!("{}{text}", INDENT.repeat(depth)));
    }
    run.clear();
}

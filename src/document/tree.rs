use crate::error::{CompileError, CompileResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One element of the parsed document. Text content is ignored; the
/// configuration schema carries everything in attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub line: usize,
}

/// Traversal mode for [`Element::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Direct children only, in document order.
    Siblings,
    /// Every descendant, depth first in document order.
    Subtree,
}

impl Element {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            line,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// First element whose tag is one of `names`.
    pub fn find(&self, names: &[&str], scan: Scan) -> Option<&Element> {
        for child in &self.children {
            if names.contains(&child.name.as_str()) {
                return Some(child);
            }
            if scan == Scan::Subtree {
                if let Some(found) = child.find(names, scan) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Like [`Element::find`] but fails when nothing matches.
    pub fn require(&self, names: &[&str], scan: Scan) -> CompileResult<&Element> {
        self.find(names, scan)
            .ok_or_else(|| CompileError::MissingElement {
                element: self.name.clone(),
                child: names.join("|"),
                line: self.line,
            })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Number of direct children tagged `name`. Zero is an error only when
    /// the element is mandatory.
    pub fn count_children(&self, name: &str, mandatory: bool) -> CompileResult<usize> {
        let count = self.children_named(name).count();
        if count == 0 && mandatory {
            return Err(CompileError::MissingElement {
                element: self.name.clone(),
                child: name.to_string(),
                line: self.line,
            });
        }
        Ok(count)
    }
}

/// Parse a complete document into its root element.
pub fn parse_document(xml: &str) -> CompileResult<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut lines = LineCounter::new(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        // Whitespace between events is trimmed, so the next markup starts at
        // the first non-blank byte after the previous event.
        let line = lines.line_at_markup(reader.buffer_position());
        let event = reader
            .read_event()
            .map_err(|err| CompileError::Markup(err.to_string()))?;
        match event {
            Event::Start(e) => stack.push(element_from(&e, line)?),
            Event::Empty(e) => {
                let element = element_from(&e, line)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CompileError::Markup(format!("unbalanced end tag at line {}", line)))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CompileError::Markup(format!(
            "element <{}> opened at line {} is never closed",
            open.name, open.line
        )));
    }
    root.ok_or_else(|| CompileError::Markup("document has no root element".into()))
}

fn element_from(start: &BytesStart<'_>, line: usize) -> CompileResult<Element> {
    let name = utf8(start.name().as_ref())?;
    let mut element = Element::new(name, line);
    for attr in start.attributes() {
        let attr = attr.map_err(|err| CompileError::Markup(format!("line {}: {}", line, err)))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|err| CompileError::Markup(format!("line {}: {}", line, err)))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> CompileResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(CompileError::Markup(format!(
            "second root element <{}> at line {}",
            element.name, element.line
        )));
    }
    *root = Some(element);
    Ok(())
}

fn utf8(bytes: &[u8]) -> CompileResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| CompileError::Markup(err.to_string()))
}

/// Incremental byte offset -> 1-based line mapping.
struct LineCounter<'a> {
    text: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text: text.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at_markup(&mut self, pos: usize) -> usize {
        let blank = self
            .text
            .get(pos..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_whitespace()).count());
        self.line_at(pos + blank)
    }

    fn line_at(&mut self, pos: usize) -> usize {
        let pos = pos.min(self.text.len());
        if pos > self.offset {
            self.line += self.text[self.offset..pos].iter().filter(|&&b| b == b'\n').count();
            self.offset = pos;
        }
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<?xml version="1.0"?>
<Root A="1">
  <!-- comment -->
  <Node Address="0x200">
    <USBSocket EndpointAddress="0x01"/>
  </Node>
  <Node Address="0x210"/>
  <Script Name="x &amp; y"/>
</Root>"#;

    #[test]
    fn builds_tree_with_lines_and_attributes() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.name, "Root");
        assert_eq!(root.attr("A"), Some("1"));
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0].line, 4);
        assert_eq!(root.children[1].line, 7);
        assert_eq!(root.children[2].attr("Name"), Some("x & y"));
    }

    #[test]
    fn find_scans_siblings_or_subtree() {
        let root = parse_document(DOC).unwrap();
        assert!(root.find(&["USBSocket"], Scan::Siblings).is_none());
        let socket = root.find(&["USBSocket"], Scan::Subtree).unwrap();
        assert_eq!(socket.attr("EndpointAddress"), Some("0x01"));
        let first = root.find(&["Script", "Node"], Scan::Siblings).unwrap();
        assert_eq!(first.name, "Node");
    }

    #[test]
    fn counts_repeated_children() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.count_children("Node", true).unwrap(), 2);
        assert_eq!(root.count_children("Driver", false).unwrap(), 0);
        assert!(matches!(
            root.count_children("Driver", true),
            Err(CompileError::MissingElement { .. })
        ));
    }

    #[test]
    fn rejects_broken_markup() {
        assert!(matches!(
            parse_document("<Root><Node></Root>"),
            Err(CompileError::Markup(_))
        ));
        assert!(matches!(parse_document("<A/><B/>"), Err(CompileError::Markup(_))));
        assert!(matches!(parse_document(""), Err(CompileError::Markup(_))));
    }

    #[test]
    fn multi_line_tags_report_their_opening_line() {
        let root = parse_document(
            "<Root>\n  <Port\n    Clock=\"1\"\n    Mode=\"2\"/>\n  <Open\n    A=\"1\">\n  </Open>\n</Root>",
        )
        .unwrap();
        assert_eq!(root.line, 1);
        assert_eq!(root.children[0].line, 2);
        assert_eq!(root.children[1].line, 5);
    }
}

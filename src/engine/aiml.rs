//! Minimal AIML pattern-matching kernel.
//!
//! Supports the subset of AIML 1.x that plain rule sets rely on:
//! `<category>`, `<pattern>`, `<template>`, the `*` and `_` wildcards,
//! `<star/>`, `<sr/>`, `<srai>`, `<random>`/`<li>` and `<think>`.
//! `<that>` and `<topic>` constraints are ignored, as are predicates.
//! Any other template element is transparent: its text is kept.

use super::ResponseEngine;
use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Maximum `<srai>` recursion depth.
const MAX_SRAI_DEPTH: usize = 16;

/// A parsed template fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateNode {
    Text(String),
    /// 1-based wildcard capture index.
    Star(usize),
    Srai(Vec<TemplateNode>),
    Random(Vec<Vec<TemplateNode>>),
}

#[derive(Debug)]
struct Category {
    pattern: String,
    template: Vec<TemplateNode>,
}

/// Node of the pattern graph. Each edge consumes one normalized word, or
/// one or more words for the wildcard edges.
#[derive(Debug, Default)]
struct PatternNode {
    words: HashMap<String, PatternNode>,
    underscore: Option<Box<PatternNode>>,
    star: Option<Box<PatternNode>>,
    template: Option<Vec<TemplateNode>>,
}

/// In-memory AIML kernel.
#[derive(Debug, Default)]
pub struct AimlKernel {
    root: PatternNode,
    size: usize,
    random_cursor: AtomicUsize,
}

impl AimlKernel {
    /// Creates an empty kernel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct patterns learned.
    #[must_use]
    pub const fn category_count(&self) -> usize {
        self.size
    }

    /// Learns every category in an AIML document.
    ///
    /// The document is parsed completely before anything is added, so a
    /// malformed document leaves the kernel unchanged.
    pub fn learn_str(&mut self, xml: &str) -> Result<usize> {
        let categories = parse_categories(xml).map_err(|cause| Error::OperationFailed {
            operation: "parse_rule_file".to_string(),
            cause,
        })?;

        let mut learned = 0;
        for category in categories {
            let words = normalize_pattern(&category.pattern);
            if words.is_empty() {
                tracing::debug!(pattern = %category.pattern, "Skipping empty pattern");
                continue;
            }
            self.insert(&words, category.template);
            learned += 1;
        }
        Ok(learned)
    }

    fn insert(&mut self, words: &[String], template: Vec<TemplateNode>) {
        let mut node = &mut self.root;
        for word in words {
            node = match word.as_str() {
                "_" => &mut **node.underscore.get_or_insert_with(Box::default),
                "*" => &mut **node.star.get_or_insert_with(Box::default),
                _ => node.words.entry(word.clone()).or_default(),
            };
        }
        if node.template.replace(template).is_none() {
            self.size += 1;
        }
    }

    fn respond_at(&self, input: &str, depth: usize) -> String {
        if depth > MAX_SRAI_DEPTH {
            tracing::warn!(input, "srai recursion limit reached");
            return String::new();
        }

        let tokens = split_words(input);
        let keys: Vec<String> = tokens.iter().map(|t| t.to_uppercase()).collect();
        let mut stars = Vec::new();

        match find(&self.root, &keys, &tokens, &mut stars) {
            Some(template) => collapse_whitespace(&self.render(template, &stars, depth)),
            None => String::new(),
        }
    }

    fn render(&self, nodes: &[TemplateNode], stars: &[String], depth: usize) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                TemplateNode::Text(text) => out.push_str(text),
                TemplateNode::Star(index) => {
                    if let Some(star) = stars.get(index.saturating_sub(1)) {
                        out.push_str(star);
                    }
                },
                TemplateNode::Srai(inner) => {
                    let query = self.render(inner, stars, depth);
                    out.push_str(&self.respond_at(&query, depth + 1));
                },
                TemplateNode::Random(choices) => {
                    if !choices.is_empty() {
                        let pick =
                            self.random_cursor.fetch_add(1, Ordering::Relaxed) % choices.len();
                        out.push_str(&self.render(&choices[pick], stars, depth));
                    }
                },
            }
        }
        out
    }
}

impl ResponseEngine for AimlKernel {
    fn name(&self) -> &'static str {
        "aiml"
    }

    fn learn(&mut self, path: &Path) -> Result<usize> {
        let xml = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_rule_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        self.learn_str(&xml).map_err(|e| match e {
            Error::OperationFailed { operation, cause } => Error::OperationFailed {
                operation,
                cause: format!("{}: {cause}", path.display()),
            },
            other => other,
        })
    }

    fn respond(&self, input: &str) -> Result<String> {
        Ok(self.respond_at(input, 0))
    }
}

/// Matches `keys` against the graph with AIML priority: `_`, exact word, `*`.
fn find<'a>(
    node: &'a PatternNode,
    keys: &[String],
    tokens: &[String],
    stars: &mut Vec<String>,
) -> Option<&'a [TemplateNode]> {
    let Some(first) = keys.first() else {
        return node.template.as_deref();
    };

    if let Some(next) = node.underscore.as_deref() {
        if let Some(found) = find_wildcard(next, keys, tokens, stars) {
            return Some(found);
        }
    }
    if let Some(next) = node.words.get(first) {
        if let Some(found) = find(next, &keys[1..], &tokens[1..], stars) {
            return Some(found);
        }
    }
    if let Some(next) = node.star.as_deref() {
        return find_wildcard(next, keys, tokens, stars);
    }
    None
}

fn find_wildcard<'a>(
    next: &'a PatternNode,
    keys: &[String],
    tokens: &[String],
    stars: &mut Vec<String>,
) -> Option<&'a [TemplateNode]> {
    for consumed in 1..=keys.len() {
        stars.push(tokens[..consumed].join(" "));
        if let Some(found) = find(next, &keys[consumed..], &tokens[consumed..], stars) {
            return Some(found);
        }
        stars.pop();
    }
    None
}

/// Splits text into alphanumeric words; apostrophes are dropped, every other
/// non-alphanumeric character separates words.
fn split_words(text: &str) -> Vec<String> {
    text.replace('\'', "")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_pattern(pattern: &str) -> Vec<String> {
    let mut words = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "*" || token == "_" {
            words.push(token.to_string());
        } else {
            words.extend(split_words(token).iter().map(|w| w.to_uppercase()));
        }
    }
    words
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Open element inside a template.
enum Frame {
    Template(Vec<TemplateNode>),
    Srai(Vec<TemplateNode>),
    Random(Vec<Vec<TemplateNode>>),
    Li(Vec<TemplateNode>),
    Think(Vec<TemplateNode>),
    Passthrough,
}

#[derive(Default)]
struct CategoryParser {
    categories: Vec<Category>,
    pattern: Option<String>,
    collecting_pattern: bool,
    template: Option<Vec<TemplateNode>>,
    in_category: bool,
    /// Depth inside ignored `<that>`/`<topic>` elements of a category.
    skip_depth: usize,
    stack: Vec<Frame>,
}

impl CategoryParser {
    fn open(&mut self, name: &str) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        if !self.stack.is_empty() {
            let frame = match name {
                "srai" => Frame::Srai(Vec::new()),
                "random" => Frame::Random(Vec::new()),
                "li" if matches!(self.stack.last(), Some(Frame::Random(_))) => {
                    Frame::Li(Vec::new())
                },
                "think" => Frame::Think(Vec::new()),
                _ => Frame::Passthrough,
            };
            self.stack.push(frame);
            return;
        }
        match name {
            "category" => {
                self.in_category = true;
                self.pattern = None;
                self.template = None;
            },
            "pattern" if self.in_category => {
                self.collecting_pattern = true;
                self.pattern = Some(String::new());
            },
            "template" if self.in_category => self.stack.push(Frame::Template(Vec::new())),
            "that" | "topic" if self.in_category => self.skip_depth = 1,
            _ => {},
        }
    }

    fn empty(&mut self, name: &str, element: &BytesStart<'_>) {
        if self.skip_depth > 0 || self.stack.is_empty() {
            return;
        }
        let node = match name {
            "star" => TemplateNode::Star(star_index(element)),
            "sr" => TemplateNode::Srai(vec![TemplateNode::Star(1)]),
            _ => return,
        };
        self.push_node(node);
    }

    fn text(&mut self, text: &str) {
        if self.skip_depth > 0 {
            return;
        }
        if self.collecting_pattern {
            if let Some(pattern) = self.pattern.as_mut() {
                pattern.push_str(text);
            }
        } else if !self.stack.is_empty() {
            self.push_node(TemplateNode::Text(text.to_string()));
        }
    }

    fn close(&mut self, name: &str) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        if let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Template(nodes) => {
                    if self.stack.is_empty() {
                        self.template = Some(nodes);
                    } else {
                        self.extend_nodes(nodes);
                    }
                },
                Frame::Srai(nodes) => self.push_node(TemplateNode::Srai(nodes)),
                Frame::Random(choices) => self.push_node(TemplateNode::Random(choices)),
                Frame::Li(nodes) => {
                    if let Some(Frame::Random(choices)) = self.stack.last_mut() {
                        choices.push(nodes);
                    }
                },
                Frame::Think(_) | Frame::Passthrough => {},
            }
            return;
        }
        match name {
            "pattern" => self.collecting_pattern = false,
            "category" => {
                if let (Some(pattern), Some(template)) = (self.pattern.take(), self.template.take())
                {
                    self.categories.push(Category { pattern, template });
                }
                self.in_category = false;
            },
            _ => {},
        }
    }

    /// The node list that receives content at the current position, if any.
    fn sink(&mut self) -> Option<&mut Vec<TemplateNode>> {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::Template(nodes)
                | Frame::Srai(nodes)
                | Frame::Li(nodes)
                | Frame::Think(nodes) => return Some(nodes),
                Frame::Random(_) => return None,
                Frame::Passthrough => {},
            }
        }
        None
    }

    fn push_node(&mut self, node: TemplateNode) {
        if let Some(nodes) = self.sink() {
            nodes.push(node);
        }
    }

    fn extend_nodes(&mut self, more: Vec<TemplateNode>) {
        if let Some(nodes) = self.sink() {
            nodes.extend(more);
        }
    }
}

fn tag_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).to_ascii_lowercase()
}

fn star_index(element: &BytesStart<'_>) -> usize {
    element
        .try_get_attribute("index")
        .ok()
        .flatten()
        .and_then(|attr| std::str::from_utf8(&attr.value).ok()?.trim().parse().ok())
        .unwrap_or(1)
}

fn parse_categories(xml: &str) -> std::result::Result<Vec<Category>, String> {
    let mut reader = Reader::from_str(xml);
    let mut parser = CategoryParser::default();
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                parser.open(&tag_name(e));
            },
            Ok(Event::Empty(ref e)) => parser.empty(&tag_name(e), e),
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                parser.close(&name);
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| {
                    format!("position {}: {err}", reader.buffer_position())
                })?;
                parser.text(&text);
            },
            Ok(Event::CData(e)) => parser.text(&String::from_utf8_lossy(&e.into_inner())),
            Ok(Event::Eof) => break,
            Err(err) => return Err(format!("position {}: {err}", reader.buffer_position())),
            Ok(_) => {},
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(format!("{depth} unclosed element(s) at end of document"));
    }
    Ok(parser.categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml version="1.0.1">
  <category>
    <pattern>HELLO</pattern>
    <template>Hi there!</template>
  </category>
  <category>
    <pattern>MY NAME IS *</pattern>
    <template>Nice to meet you, <star/>.</template>
  </category>
  <category>
    <pattern>HI</pattern>
    <template><srai>HELLO</srai></template>
  </category>
  <category>
    <pattern>_ PLEASE</pattern>
    <template>Since you asked nicely: <sr/></template>
  </category>
  <category>
    <pattern>* IS *</pattern>
    <template><star index="2"/> describes <star index="1"/></template>
  </category>
</aiml>"#;

    fn kernel() -> AimlKernel {
        let mut kernel = AimlKernel::new();
        assert_eq!(kernel.learn_str(GREETINGS).unwrap(), 5);
        kernel
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        let kernel = kernel();
        assert_eq!(kernel.respond("hello!").unwrap(), "Hi there!");
        assert_eq!(kernel.respond("  Hello  ").unwrap(), "Hi there!");
    }

    #[test]
    fn test_star_capture_keeps_original_case() {
        let kernel = kernel();
        assert_eq!(
            kernel.respond("my name is Jane Doe").unwrap(),
            "Nice to meet you, Jane Doe."
        );
    }

    #[test]
    fn test_srai_and_sr() {
        let kernel = kernel();
        assert_eq!(kernel.respond("hi").unwrap(), "Hi there!");
        assert_eq!(
            kernel.respond("hello please").unwrap(),
            "Since you asked nicely: Hi there!"
        );
    }

    #[test]
    fn test_indexed_stars() {
        let kernel = kernel();
        assert_eq!(kernel.respond("rust is fast").unwrap(), "fast describes rust");
    }

    #[test]
    fn test_no_match_is_empty() {
        let kernel = kernel();
        assert_eq!(kernel.respond("completely unrelated").unwrap(), "");
        assert_eq!(kernel.respond("").unwrap(), "");
    }

    #[test]
    fn test_exact_word_beats_star() {
        let mut kernel = AimlKernel::new();
        kernel
            .learn_str(
                "<aiml><category><pattern>WHAT *</pattern><template>generic</template></category>\
                 <category><pattern>WHAT TIME IS IT</pattern><template>specific</template></category></aiml>",
            )
            .unwrap();
        assert_eq!(kernel.respond("what time is it").unwrap(), "specific");
        assert_eq!(kernel.respond("what day is it").unwrap(), "generic");
    }

    #[test]
    fn test_random_cycles_choices() {
        let mut kernel = AimlKernel::new();
        kernel
            .learn_str(
                "<aiml><category><pattern>COIN</pattern><template>\
                 <random><li>heads</li><li>tails</li></random></template></category></aiml>",
            )
            .unwrap();
        let first = kernel.respond("coin").unwrap();
        let second = kernel.respond("coin").unwrap();
        assert_ne!(first, second);
        assert!(["heads", "tails"].contains(&first.as_str()));
    }

    #[test]
    fn test_think_and_that_are_ignored() {
        let mut kernel = AimlKernel::new();
        kernel
            .learn_str(
                "<aiml><category><pattern>YES</pattern><that>DO YOU LIKE TEA</that>\
                 <template><think><set name=\"tea\">yes</set></think>Good.</template></category></aiml>",
            )
            .unwrap();
        assert_eq!(kernel.respond("yes").unwrap(), "Good.");
    }

    #[test]
    fn test_srai_loop_is_bounded() {
        let mut kernel = AimlKernel::new();
        kernel
            .learn_str("<aiml><category><pattern>LOOP</pattern><template><srai>LOOP</srai></template></category></aiml>")
            .unwrap();
        assert_eq!(kernel.respond("loop").unwrap(), "");
    }

    #[test]
    fn test_malformed_document_adds_nothing() {
        let mut kernel = kernel();
        let err = kernel
            .learn_str("<aiml><category><pattern>BROKEN</template></category></aiml>")
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
        assert_eq!(kernel.category_count(), 5);
        assert_eq!(kernel.respond("broken").unwrap(), "");
    }

    #[test]
    fn test_unclosed_document_is_rejected() {
        let mut kernel = AimlKernel::new();
        assert!(
            kernel
                .learn_str("<aiml><category><pattern>X</pattern><template>y</template>")
                .is_err()
        );
        assert_eq!(kernel.category_count(), 0);
    }

    #[test]
    fn test_redefinition_replaces_template() {
        let mut kernel = kernel();
        kernel
            .learn_str("<aiml><category><pattern>HELLO</pattern><template>Howdy.</template></category></aiml>")
            .unwrap();
        assert_eq!(kernel.category_count(), 5);
        assert_eq!(kernel.respond("hello").unwrap(), "Howdy.");
    }

    #[test]
    fn test_escaped_text() {
        let mut kernel = AimlKernel::new();
        kernel
            .learn_str("<aiml><category><pattern>AMP</pattern><template>this &amp; that</template></category></aiml>")
            .unwrap();
        assert_eq!(kernel.respond("amp").unwrap(), "this & that");
    }
}

// src/tasks/lint_html.rs

//! `html`: lint rendered pages in the dev tree. Any finding fails the task.
//!
//! Rules: `doctype-first`, `tag-pair`, `tagname-lowercase`,
//! `attr-lowercase`, `attr-value-double-quotes`, `attr-no-duplication`,
//! `id-unique`, `src-not-empty`, `title-require`.

use std::collections::HashSet;

use anyhow::Result;

use crate::tasks::report::line_col;
use crate::tasks::{FileError, LintFinding, LintReport, TaskContext, TaskDef, TaskReport};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    for file in def.select(ctx)? {
        report.processed += 1;
        let source = match ctx.fs.read_to_string(&file.path) {
            Ok(s) => s,
            Err(e) => {
                report.errors.push(FileError::new(&file.path, format!("{e:#}")));
                continue;
            }
        };
        let findings = lint(&source);
        if !findings.is_empty() {
            report.lint.push(LintReport {
                file: file.rel.clone(),
                findings,
            });
        }
    }
    Ok(())
}

#[derive(Debug)]
struct Attr<'a> {
    name: &'a str,
    value: Option<&'a str>,
    quote: Option<u8>,
}

#[derive(Debug)]
struct Tag<'a> {
    name: &'a str,
    attrs: Vec<Attr<'a>>,
    self_closing: bool,
    end: usize,
}

/// Lint one HTML document. Findings are sorted by position.
pub fn lint(source: &str) -> Vec<LintFinding> {
    Linter::new(source).run()
}

struct Linter<'a> {
    source: &'a str,
    findings: Vec<LintFinding>,
    open: Vec<(String, usize)>,
    ids: HashSet<String>,
    first_tag_seen: bool,
    head_at: Option<usize>,
    in_head: bool,
    title_seen: bool,
}

impl<'a> Linter<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            findings: Vec::new(),
            open: Vec::new(),
            ids: HashSet::new(),
            first_tag_seen: false,
            head_at: None,
            in_head: false,
            title_seen: false,
        }
    }

    fn report(&mut self, at: usize, rule: &'static str, reason: String) {
        let (line, column) = line_col(self.source, at);
        self.findings.push(LintFinding {
            line,
            column,
            rule,
            reason,
        });
    }

    fn run(mut self) -> Vec<LintFinding> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'<' {
                i += 1;
                continue;
            }
            let rest = &source[i..];

            if rest.starts_with("<!--") {
                i = match rest[4..].find("-->") {
                    Some(end) => i + 4 + end + 3,
                    None => bytes.len(),
                };
                continue;
            }

            if rest.starts_with("<!") {
                let is_doctype = rest
                    .get(2..9)
                    .is_some_and(|s| s.eq_ignore_ascii_case("doctype"));
                if is_doctype {
                    self.first_tag_seen = true;
                }
                i = rest.find('>').map(|end| i + end + 1).unwrap_or(bytes.len());
                continue;
            }

            let next = bytes.get(i + 1).copied().unwrap_or(b' ');
            if next == b'/' && bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic) {
                self.check_doctype(i);
                let name_end = scan_name(bytes, i + 2);
                let name = &source[i + 2..name_end];
                self.close_tag(name, i);
                i = source[name_end..]
                    .find('>')
                    .map(|end| name_end + end + 1)
                    .unwrap_or(bytes.len());
                continue;
            }

            if next.is_ascii_alphabetic() {
                self.check_doctype(i);
                let tag = parse_tag(source, i);
                let end = tag.end;
                let lower = tag.name.to_ascii_lowercase();
                self.open_tag(&tag, &lower, i);

                i = end;
                if RAW_TEXT_ELEMENTS.contains(&lower.as_str()) && !tag.self_closing {
                    let closing = format!("</{lower}");
                    i = find_ci(source, end, &closing).unwrap_or(bytes.len());
                }
                continue;
            }

            i += 1;
        }

        self.finish();
        self.findings.sort_by_key(|f| (f.line, f.column));
        self.findings
    }

    fn check_doctype(&mut self, at: usize) {
        if !self.first_tag_seen {
            self.first_tag_seen = true;
            self.report(at, "doctype-first", "Doctype must be declared first.".to_string());
        }
    }

    fn open_tag(&mut self, tag: &Tag<'_>, lower: &str, at: usize) {
        if tag.name != lower {
            self.report(
                at,
                "tagname-lowercase",
                format!("The html element name of [ {} ] must be in lowercase.", tag.name),
            );
        }

        let mut seen = HashSet::new();
        for attr in &tag.attrs {
            let attr_lower = attr.name.to_ascii_lowercase();
            if attr.name != attr_lower {
                self.report(
                    at,
                    "attr-lowercase",
                    format!("The attribute name of [ {} ] must be in lowercase.", attr.name),
                );
            }
            if attr.value.is_some() && attr.quote != Some(b'"') {
                self.report(
                    at,
                    "attr-value-double-quotes",
                    format!("The value of attribute [ {} ] must be in double quotes.", attr.name),
                );
            }
            if !seen.insert(attr_lower.clone()) {
                self.report(
                    at,
                    "attr-no-duplication",
                    format!("Duplicate of attribute name [ {} ] was found.", attr.name),
                );
            }
            if attr_lower == "id" {
                if let Some(id) = attr.value {
                    if !self.ids.insert(id.to_string()) {
                        self.report(
                            at,
                            "id-unique",
                            format!("The id value [ {id} ] must be unique."),
                        );
                    }
                }
            }
            if requires_value(lower, &attr_lower) && attr.value.is_none_or(|v| v.trim().is_empty()) {
                self.report(
                    at,
                    "src-not-empty",
                    format!(
                        "The attribute [ {} ] of the tag [ {} ] must have a value.",
                        attr.name, tag.name
                    ),
                );
            }
        }

        match lower {
            "head" => {
                self.head_at = Some(at);
                self.in_head = true;
            }
            "title" if self.in_head => self.title_seen = true,
            _ => {}
        }

        if !tag.self_closing && !VOID_ELEMENTS.contains(&lower) {
            self.open.push((tag.name.to_string(), at));
        }
    }

    fn close_tag(&mut self, name: &str, at: usize) {
        let lower = name.to_ascii_lowercase();
        if lower == "head" {
            self.in_head = false;
        }
        if VOID_ELEMENTS.contains(&lower.as_str()) {
            return;
        }

        let Some(idx) = self
            .open
            .iter()
            .rposition(|(open, _)| open.eq_ignore_ascii_case(&lower))
        else {
            self.report(
                at,
                "tag-pair",
                format!("Tag must be paired, no start tag: [ </{name}> ]"),
            );
            return;
        };

        let unclosed: Vec<(String, usize)> = self.open.drain(idx..).skip(1).collect();
        for (open, open_at) in unclosed.into_iter().rev() {
            let (line, _) = line_col(self.source, open_at);
            self.report(
                at,
                "tag-pair",
                format!(
                    "Tag must be paired, missing: [ </{open}> ], start tag match failed [ <{open}> ] on line {line}."
                ),
            );
        }
    }

    fn finish(&mut self) {
        let unclosed = std::mem::take(&mut self.open);
        for (open, open_at) in unclosed.into_iter().rev() {
            let (line, _) = line_col(self.source, open_at);
            self.report(
                open_at,
                "tag-pair",
                format!(
                    "Tag must be paired, missing: [ </{open}> ], start tag match failed [ <{open}> ] on line {line}."
                ),
            );
        }

        if let Some(head_at) = self.head_at {
            if !self.title_seen {
                self.report(
                    head_at,
                    "title-require",
                    "<title> must be present in <head> tag.".to_string(),
                );
            }
        }
    }
}

fn requires_value(tag: &str, attr: &str) -> bool {
    matches!(
        (tag, attr),
        ("img" | "script" | "embed" | "iframe" | "frame" | "audio" | "video" | "source", "src")
            | ("link", "href")
            | ("object", "data")
    )
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'-' | b':'))
    {
        end += 1;
    }
    end
}

fn parse_tag(source: &str, start: usize) -> Tag<'_> {
    let bytes = source.as_bytes();
    let name_end = scan_name(bytes, start + 1);
    let mut tag = Tag {
        name: &source[start + 1..name_end],
        attrs: Vec::new(),
        self_closing: false,
        end: bytes.len(),
    };

    let mut pos = name_end;
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        match bytes[pos] {
            b'>' => {
                tag.end = pos + 1;
                break;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                tag.self_closing = true;
                tag.end = pos + 2;
                break;
            }
            b'/' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let name_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'>' | b'/')
        {
            pos += 1;
        }
        if pos == name_start {
            pos += 1;
            continue;
        }
        let name = &source[name_start..pos];

        let mut look = pos;
        while look < bytes.len() && bytes[look].is_ascii_whitespace() {
            look += 1;
        }
        if bytes.get(look) != Some(&b'=') {
            tag.attrs.push(Attr {
                name,
                value: None,
                quote: None,
            });
            continue;
        }

        pos = look + 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos).copied() {
            Some(q @ (b'"' | b'\'')) => {
                let value_start = pos + 1;
                let value_end = source[value_start..]
                    .find(q as char)
                    .map(|e| value_start + e)
                    .unwrap_or(bytes.len());
                tag.attrs.push(Attr {
                    name,
                    value: Some(&source[value_start..value_end]),
                    quote: Some(q),
                });
                pos = (value_end + 1).min(bytes.len());
            }
            _ => {
                let value_start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                    pos += 1;
                }
                tag.attrs.push(Attr {
                    name,
                    value: Some(&source[value_start..pos]),
                    quote: None,
                });
            }
        }
    }
    tag
}

/// Case-insensitive ASCII search for `needle` from `from`.
fn find_ci(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from >= hay.len() {
        return None;
    }
    (from..=hay.len().saturating_sub(needle.len()))
        .find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

// tests/template_render.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

mod common;
use common::{ConfigFileBuilder, mock_context};

use sitedag::fs::FileSystem;
use sitedag::fs::mock::MockFileSystem;
use sitedag::tasks::template::{escape_html, render_file};
use sitedag::tasks::{BuildMode, TaskId};

fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn renders_variables_comments_and_includes() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "_src/index.html",
        "<%# page %><%- include('partials/_head') %>\
<h1><%= title %></h1>\n<% include partials/_foot %>",
    );
    fs.add_file("_src/partials/_head.ejs", "<head><%- raw %></head>");
    fs.add_file("_src/partials/_foot.ejs", "<footer>&copy;</footer>");

    let vars = data(&[("title", "Fish & <Chips>"), ("raw", "<meta charset=\"utf-8\">")]);
    let html = render_file(&fs, Path::new("_src/index.html"), &vars).unwrap();

    assert_eq!(
        html,
        "<head><meta charset=\"utf-8\"></head>\
<h1>Fish &amp; &lt;Chips&gt;</h1>\n<footer>&copy;</footer>"
    );
}

#[test]
fn literal_open_tag_and_newline_trimming() {
    let fs = MockFileSystem::new();
    fs.add_file("t.html", "<%% not a tag %>\n<%# gone -%>\nnext");
    let html = render_file(&fs, Path::new("t.html"), &BTreeMap::new()).unwrap();
    assert_eq!(html, "<% not a tag %>\nnext");
}

#[test]
fn undefined_variable_reports_location() {
    let fs = MockFileSystem::new();
    fs.add_file("t.html", "line one\n  <%= missing %>");
    let err = render_file(&fs, Path::new("t.html"), &BTreeMap::new()).unwrap_err();
    assert_eq!(err.line, Some(2));
    assert_eq!(err.column, Some(3));
    assert_eq!(err.message, "missing is not defined");
}

#[test]
fn unclosed_tag_is_an_error() {
    let fs = MockFileSystem::new();
    fs.add_file("t.html", "<p><%= title </p>");
    let err = render_file(&fs, Path::new("t.html"), &data(&[("title", "x")])).unwrap_err();
    assert_eq!(err.message, "could not find matching close tag for \"<%\"");
    assert_eq!((err.line, err.column), (Some(1), Some(4)));
}

#[test]
fn include_cycles_are_detected() {
    let fs = MockFileSystem::new();
    fs.add_file("a.html", "<%- include('b') %>");
    fs.add_file("b.ejs", "<%- include('a.html') %>");
    let err = render_file(&fs, Path::new("a.html"), &BTreeMap::new()).unwrap_err();
    assert!(err.message.contains("cycle"));
}

#[test]
fn escape_matches_ejs_entities() {
    assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&#34;x&#34;&gt;&#39;&amp;&#39;&lt;/a&gt;");
}

#[test]
fn ejs_task_renders_pages_into_dev_and_skips_failures() {
    let fs = MockFileSystem::new();
    fs.add_file("_src/index.html", "<title><%= title %></title>");
    fs.add_file("_src/blog/post.html", "<p><%= nope %></p>");
    fs.add_file("_src/partials/_nav.ejs", "<nav></nav>");
    let config = ConfigFileBuilder::new().template_var("title", "Home").build();
    let ctx = mock_context(config, Arc::new(fs.clone()));

    let report = ctx.run(TaskId::Ejs, BuildMode::Interactive).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        fs.read_to_string(Path::new("dev/index.html")).unwrap(),
        "<title>Home</title>"
    );
    assert!(!fs.is_file(Path::new("dev/blog/post.html")));
    assert!(!fs.is_file(Path::new("dev/partials/_nav.ejs")));
}

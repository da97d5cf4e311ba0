// tests/minify.rs

use std::path::Path;
use std::sync::Arc;

mod common;
use common::{ConfigFileBuilder, default_config, mock_context};

use regex::Regex;
use sitedag::config::CommentPolicy;
use sitedag::engine::TaskOutcome;
use sitedag::fs::FileSystem;
use sitedag::fs::mock::MockFileSystem;
use sitedag::tasks::minify_js::minify;
use sitedag::tasks::{BuildMode, TaskId};

fn comments() -> Regex {
    Regex::new(r"/\*[\s\S]*?\*/").unwrap()
}

const SCRIPT: &str = "/*! banner v1 */
/* internal note */
function add(first, second) {
    // sum
    return first + second;
}
";

#[test]
fn minified_script_is_compact() {
    let out = minify(Path::new("a.js"), SCRIPT, CommentPolicy::None, &comments()).unwrap();
    assert!(out.contains("function add(first,second){return first+second"));
    assert!(!out.contains("banner"));
    assert!(!out.contains("internal"));
    assert!(!out.contains("sum"));
    assert!(out.len() < SCRIPT.len());
}

#[test]
fn banner_comments_survive_with_some_policy() {
    let out = minify(Path::new("a.js"), SCRIPT, CommentPolicy::Some, &comments()).unwrap();
    assert!(out.starts_with("/*! banner v1 */\n"));
    assert!(!out.contains("internal note"));
}

#[test]
fn syntax_error_is_located() {
    let err = minify(Path::new("b.js"), "var ok = 1;\nvar = ;\n", CommentPolicy::None, &comments())
        .unwrap_err();
    assert_eq!(err.line, Some(2));
    assert!(err.file.ends_with("b.js"));
}

#[test]
fn uglify_and_cssmin_write_into_dist() {
    let fs = MockFileSystem::new();
    fs.add_file("dev/assets/js/app.js", "var  answer = 40 + 2;\n");
    fs.add_file("dev/assets/css/main.css", ".a {\n  color: #ff0000;\n}\n");
    fs.add_file("dev/index.html", "<p>not touched</p>");
    let ctx = mock_context(default_config(), Arc::new(fs.clone()));

    let js = ctx.run(TaskId::Uglify, BuildMode::Strict).unwrap();
    let css = ctx.run(TaskId::Cssmin, BuildMode::Strict).unwrap();

    assert_eq!(js.outcome, TaskOutcome::Success);
    assert_eq!(css.outcome, TaskOutcome::Success);
    let min_js = fs.read_to_string(Path::new("dist/assets/js/app.js")).unwrap();
    assert!(!min_js.contains("  "));
    assert!(min_js.contains("answer"));
    assert_eq!(
        fs.read_to_string(Path::new("dist/assets/css/main.css")).unwrap(),
        ".a{color:red}"
    );
    assert!(!fs.is_file(Path::new("dist/index.html")));
}

#[test]
fn strict_uglify_fails_on_a_broken_script() {
    let fs = MockFileSystem::new();
    fs.add_file("dev/assets/js/good.js", "var a = 1;");
    fs.add_file("dev/assets/js/bad.js", "function (");
    let config = ConfigFileBuilder::new()
        .preserve_comments(CommentPolicy::None)
        .build();
    let ctx = mock_context(config, Arc::new(fs.clone()));

    let report = ctx.run(TaskId::Uglify, BuildMode::Strict).unwrap();

    assert_eq!(report.outcome, TaskOutcome::Failed(1));
    assert!(fs.is_file(Path::new("dist/assets/js/good.js")));
    assert!(!fs.is_file(Path::new("dist/assets/js/bad.js")));
}

// tests/clean_task.rs

use std::path::Path;
use std::sync::Arc;

mod common;
use common::{SiteFixture, default_config, mock_context};

use sitedag::engine::TaskOutcome;
use sitedag::fs::mock::MockFileSystem;
use sitedag::tasks::{BuildMode, TaskId};

#[test]
fn clean_on_absent_dist_is_a_successful_no_op() {
    let site = SiteFixture::new();
    site.write("_src/index.html", "<p>x</p>");
    let ctx = site.context(default_config());

    let report = ctx.run(TaskId::CleanAll, BuildMode::Strict).unwrap();

    assert_eq!(report.outcome, TaskOutcome::Success);
    assert!(!site.exists("dist"));
    assert!(site.exists("_src/index.html"));
}

#[test]
fn clean_removes_the_whole_dist_tree() {
    let site = SiteFixture::new();
    site.write("dist/index.html", "old");
    site.write("dist/assets/css/main.css", "old");
    site.write("dev/index.html", "keep");
    let ctx = site.context(default_config());

    ctx.run(TaskId::CleanAll, BuildMode::Strict).unwrap();

    assert!(!site.exists("dist"));
    assert!(site.exists("dev/index.html"));
}

#[test]
fn clean_only_touches_dist_in_memory() {
    let fs = MockFileSystem::new();
    fs.add_file("dist/a.js", "a");
    fs.add_file("distant/b.js", "b");
    let ctx = mock_context(default_config(), Arc::new(fs.clone()));

    ctx.run(TaskId::CleanAll, BuildMode::Strict).unwrap();

    assert_eq!(fs.file_paths(), vec![Path::new("distant/b.js").to_path_buf()]);
}

// tests/sass_resilience.rs

mod common;
use common::{SiteFixture, default_config, init_tracing};

use sitedag::engine::TaskOutcome;
use sitedag::tasks::{BuildMode, TaskId};

fn site_with_one_broken_stylesheet() -> SiteFixture {
    let site = SiteFixture::new();
    site.write("_src/assets/sass/a.scss", ".a {\n  color: red;\n");
    site.write(
        "_src/assets/sass/b.scss",
        "@import 'vars';\n.b { color: $brand; user-select: none; }\n",
    );
    site.write("_src/assets/sass/_vars.scss", "$brand: #336699;\n");
    site
}

#[test]
fn interactive_sass_keeps_going_after_a_broken_file() {
    init_tracing();
    let site = site_with_one_broken_stylesheet();
    let ctx = site.context(default_config());

    let report = ctx.run(TaskId::Sass, BuildMode::Interactive).unwrap();

    assert_eq!(report.outcome, TaskOutcome::Success);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].file.ends_with("a.scss"));
    assert!(!report.errors[0].message.is_empty());

    assert_eq!(site.files_under("dev/assets/css"), vec!["b.css".to_string()]);
    let css = site.read("dev/assets/css/b.css");
    assert!(css.contains("#336699") || css.contains("#369"));
    assert!(css.contains("-webkit-user-select"));
}

#[test]
fn strict_sass_fails_after_processing_every_file() {
    let site = site_with_one_broken_stylesheet();
    let ctx = site.context(default_config());

    let report = ctx.run(TaskId::Sass, BuildMode::Strict).unwrap();

    assert_eq!(report.outcome, TaskOutcome::Failed(1));
    assert_eq!(report.processed, 2);
    assert!(site.exists("dev/assets/css/b.css"));
}

#[test]
fn partials_are_not_compiled_on_their_own() {
    let site = SiteFixture::new();
    site.write("_src/assets/sass/_only_partial.scss", ".x { color: red; }");
    let ctx = site.context(default_config());

    let report = ctx.run(TaskId::Sass, BuildMode::Strict).unwrap();

    assert_eq!(report.processed, 0);
    assert!(!site.exists("dev/assets/css"));
}

#[test]
fn sass_publishes_the_changed_stylesheets_for_injection() {
    let site = SiteFixture::new();
    site.write("_src/assets/sass/main.scss", ".m { color: blue; }");
    let ctx = site.context(default_config());
    let before = ctx.reload.sequence();

    ctx.run(TaskId::Sass, BuildMode::Interactive).unwrap();

    let polled = ctx
        .reload
        .wait_after(before, std::time::Duration::from_millis(10))
        .expect("reload event published");
    assert_eq!(
        polled.event,
        Some(sitedag::server::ReloadEvent::InjectCss {
            paths: vec!["/assets/css/main.css".to_string()]
        })
    );
}

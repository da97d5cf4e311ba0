// tests/build_pipeline.rs

use std::sync::Arc;

mod common;
use common::{ConfigFileBuilder, SiteFixture, default_config, init_tracing, with_timeout};

use sitedag::errors::SitedagError;
use sitedag::pipeline::{Pipeline, RunStatus};
use sitedag::tasks::TaskId;
use sitedag::{check_summary, run_pipeline};

fn populated_site() -> SiteFixture {
    let site = SiteFixture::new();
    site.write(
        "_src/index.html",
        "<!DOCTYPE html>\n<html>\n<head><title><%= title %></title></head>\n<body>\n<%- include('partials/_nav') %>\n</body>\n</html>\n",
    );
    site.write("_src/partials/_nav.ejs", "<nav>menu</nav>");
    site.write(
        "_src/assets/sass/main.scss",
        "$pad: 4px;\n.box {\n  padding: $pad * 2;\n  color: #ff0000;\n}\n",
    );
    site.write("_src/assets/js/plugins/b.js", "var second = 2;\n");
    site.write("_src/assets/js/plugins/a.js", "var first = 1;\n");
    site.write("_src/assets/images/logo.svg", "<svg/>");
    site.write("dist/stale.txt", "left over from an older build");
    site
}

#[tokio::test]
async fn build_produces_a_minified_dist_tree() {
    init_tracing();
    let site = populated_site();
    let config = ConfigFileBuilder::new().template_var("title", "Home").build();
    let ctx = Arc::new(site.context(config));

    let summary = with_timeout(run_pipeline(ctx, Pipeline::production()))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert!(summary.failed.is_empty());
    check_summary(&summary, false).unwrap();

    assert_eq!(
        site.files_under("dist"),
        vec![
            "assets/css/main.css".to_string(),
            "assets/images/logo.svg".to_string(),
            "assets/js/lib/plugins.js".to_string(),
            "index.html".to_string(),
        ]
    );
    assert_eq!(site.read("dist/assets/css/main.css"), ".box{padding:8px;color:red}");

    let js = site.read("dist/assets/js/lib/plugins.js");
    assert!(!js.trim_end().contains('\n'), "{js}");
    let first = js.find("first").unwrap();
    let second = js.find("second").unwrap();
    assert!(first < second);

    let html = site.read("dist/index.html");
    assert!(html.contains("<title>Home</title>"));
    assert!(html.contains("<nav>menu</nav>"));

    // The dev tree keeps the readable stylesheet.
    assert!(site.read("dev/assets/css/main.css").contains('\n'));
}

#[tokio::test]
async fn build_of_an_empty_tree_succeeds() {
    init_tracing();
    let site = SiteFixture::new();
    let ctx = Arc::new(site.context(default_config()));

    let summary = with_timeout(run_pipeline(ctx, Pipeline::production()))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert!(site.files_under("dist").is_empty());
}

#[tokio::test]
async fn broken_stylesheet_aborts_the_build() {
    init_tracing();
    let site = populated_site();
    site.write("_src/assets/sass/broken.scss", ".x { color: ");
    let config = ConfigFileBuilder::new().template_var("title", "Home").build();
    let ctx = Arc::new(site.context(config));

    let summary = with_timeout(run_pipeline(ctx, Pipeline::production()))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Aborted { stage: 1 });
    assert_eq!(summary.failed, vec![TaskId::Sass]);
    assert!(matches!(
        check_summary(&summary, false),
        Err(SitedagError::PipelineFailed { stage: 2, .. })
    ));
    // clean:all ran, copy:dev never did.
    assert!(site.files_under("dist").is_empty());
}

#[tokio::test]
async fn single_task_target_runs_strictly() {
    init_tracing();
    let site = SiteFixture::new();
    site.write("_src/index.html", "<p><%= undefined_name %></p>");
    let ctx = Arc::new(site.context(default_config()));

    let summary = with_timeout(run_pipeline(ctx, Pipeline::single(TaskId::Ejs)))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Aborted { stage: 0 });
    assert!(!site.exists("dev/index.html"));
}

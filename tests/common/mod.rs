#![allow(dead_code)]

pub use sitedag_test_utils::builders::{ConfigFileBuilder, SiteFixture, mock_context};
pub use sitedag_test_utils::fake_executor::FakeExecutor;
pub use sitedag_test_utils::{init_tracing, with_timeout};

use sitedag::config::ConfigFile;

/// Defaults: `_src`, `dev`, `dist`, `assets`, no project root.
pub fn default_config() -> ConfigFile {
    ConfigFileBuilder::new().build()
}

/*!
 * Common test utilities for the contentqa test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use contentqa::quality::Requirements;

// Re-export the mock analyzers module
pub mod mock_analyzers;

/// Route pipeline logs through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Requirements used by most pipeline tests
pub fn garden_requirements() -> Requirements {
    Requirements::new("home gardeners", "friendly", &["pruning roses", "rose care"])
}

/// A realistic article with sources, links and first-hand experience
pub fn sample_article() -> &'static str {
    r#"Pruning roses is the single most useful job in early spring rose care. In my experience of tending 40 shrubs over 12 years, a careful cut in March sets up the whole season.

Start by removing dead, damaged and crossing canes. Cut about 6 mm above an outward-facing bud at a 45 degree angle, so water runs away from the bud. According to the [Royal Horticultural Society](https://www.rhs.org.uk/plants/roses/pruning-guide), most shrub roses benefit from losing a third of their height [1].

Hybrid teas respond well to harder cuts, while climbers need only their side shoots shortened. We tested both approaches in our own garden in 2023 and found that lighter pruning produced earlier blooms.

Disclosure: we have no affiliation with any nursery mentioned here.

## References

1. Royal Horticultural Society (2023). Pruning roses. https://www.rhs.org.uk/plants/roses/pruning-guide
"#
}

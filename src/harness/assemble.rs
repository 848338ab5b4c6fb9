//! Test assembly: prelude + includes + body.
//!
//! The prelude and every named fragment are loaded once at startup into a
//! [`FragmentStore`]; the store is immutable afterwards and shared
//! read-only across all concurrent executions, so no locking is needed.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::harness::error::HarnessError;
use crate::harness::metadata::TestMetadata;

/// Fixed fragment prepended to every test.
pub const PRELUDE_NAME: &str = "init.js";

/// Read-only cache of the prelude and all include fragments.
pub struct FragmentStore {
    prelude: String,
    fragments: HashMap<String, String>,
}

impl FragmentStore {
    /// Load the prelude and every fragment file under `includes_dir`.
    ///
    /// A missing prelude is a configuration error: nothing can run without
    /// it, so the run is rejected up front rather than per test.
    pub fn load(includes_dir: &Path) -> Result<Self, HarnessError> {
        let mut fragments = HashMap::new();
        for entry in fs::read_dir(includes_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            fragments.insert(name.to_string(), fs::read_to_string(&path)?);
        }
        let prelude = fragments.remove(PRELUDE_NAME).ok_or_else(|| {
            HarnessError::Config(format!(
                "prelude `{PRELUDE_NAME}` not found in {}",
                includes_dir.display()
            ))
        })?;
        Ok(Self { prelude, fragments })
    }

    /// Build a store from in-memory fragments.
    pub fn from_parts(
        prelude: impl Into<String>,
        fragments: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            prelude: prelude.into(),
            fragments: fragments.into_iter().collect(),
        }
    }

    pub fn prelude(&self) -> &str {
        &self.prelude
    }

    pub fn resolve(&self, name: &str) -> Result<&str, HarnessError> {
        self.fragments
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| HarnessError::MissingInclude(name.to_string()))
    }
}

/// One test's executable source, owned exclusively by its run.
#[derive(Debug, Clone)]
pub struct AssembledUnit {
    pub source: String,
    /// True when the test is strict-mode-only and the run excludes those.
    pub skip: bool,
}

/// Concatenate prelude, resolved includes in declared order, and the test
/// body. A missing include fails this one test. Pure: no side effects.
pub fn assemble(
    metadata: &TestMetadata,
    body: &str,
    store: &FragmentStore,
    include_strict: bool,
) -> Result<AssembledUnit, HarnessError> {
    let mut source = String::with_capacity(store.prelude().len() + body.len());
    source.push_str(store.prelude());
    for name in &metadata.includes {
        source.push_str(store.resolve(name)?);
    }
    source.push_str(body);
    Ok(AssembledUnit {
        source,
        skip: metadata.strict_only() && !include_strict,
    })
}

// ============================================================================
// Tests
// ============================================================================

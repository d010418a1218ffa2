use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const SOURCE_EXTENSION: &str = "cs";
pub const REFERENCE_EXTENSION: &str = "dll";

/// Discovery location categories in reference-resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootCategory {
    Core,
    Plugins,
    Mods,
    Managed,
}

impl RootCategory {
    pub const REFERENCE_ORDER: [RootCategory; 4] = [
        RootCategory::Core,
        RootCategory::Plugins,
        RootCategory::Mods,
        RootCategory::Managed,
    ];
    pub const SOURCE_ORDER: [RootCategory; 2] = [RootCategory::Plugins, RootCategory::Mods];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRoots {
    pub core: PathBuf,
    pub plugins: PathBuf,
    pub mods: PathBuf,
    pub managed: PathBuf,
}

impl DiscoveryRoots {
    pub fn get(&self, category: RootCategory) -> &Path {
        match category {
            RootCategory::Core => &self.core,
            RootCategory::Plugins => &self.plugins,
            RootCategory::Mods => &self.mods,
            RootCategory::Managed => &self.managed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    pub sources: Vec<PathBuf>,
    pub references: Vec<PathBuf>,
}

pub fn discover(roots: &DiscoveryRoots) -> Discovered {
    let mut found = Discovered::default();
    for category in RootCategory::SOURCE_ORDER {
        found
            .sources
            .extend(scan(roots.get(category), SOURCE_EXTENSION));
    }
    for category in RootCategory::REFERENCE_ORDER {
        found
            .references
            .extend(scan(roots.get(category), REFERENCE_EXTENSION));
    }
    debug!(
        sources = found.sources.len(),
        references = found.references.len(),
        "discovery finished"
    );
    found
}

/// Files under `root` with `extension` (case-insensitive), sorted. A missing
/// root yields nothing.
pub fn scan(root: &Path, extension: &str) -> Vec<PathBuf> {
    if !root.is_dir() {
        debug!(root = %root.display(), "discovery root missing");
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

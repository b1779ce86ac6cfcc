use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::filesystem::{self, FilesystemError};
use crate::metadata::{MetadataError, ModMetadata, ModNameParser};
use crate::resources::{Capability, NodeId, NodeRef, PathClassifier, ResourceError, ResourceTree};
use crate::settings::{AppSettings, ParsingSettings};

/// Errors that stop a whole collection scan. Failures of single mods are
/// collected in [`ModCollection::failures`] instead.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Mods root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Invalid mods root in settings: {0}")]
    InvalidRoot(#[from] FilesystemError),
    #[error("Failed to read mods root {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: FilesystemError,
    },
}

/// Why a mod folder could not be turned into a [`Mod`].
#[derive(Debug, Error)]
pub enum ModError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("Failed to read modification time: {0}")]
    ModifiedTime(#[from] FilesystemError),
}

/// A mod folder that was left out of the collection.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: ModError,
}

/// One top-level folder of a mods collection.
#[derive(Debug)]
pub struct Mod {
    tree: ResourceTree,
    metadata: Result<ModMetadata, MetadataError>,
    data_dirs: OnceCell<Vec<NodeId>>,
}

impl Mod {
    /// Classifies a mod folder and parses its name.
    ///
    /// A name the parser cannot handle does not fail the load; the error is
    /// kept and reported by [`Mod::metadata`].
    ///
    /// # Errors
    ///
    /// Returns `ModError` if the folder cannot be classified or stat'ed.
    pub fn load<P: AsRef<Path>>(
        path: P,
        classifier: &PathClassifier,
        parser: &ModNameParser,
    ) -> Result<Self, ModError> {
        let path = path.as_ref();
        let tree = classifier.classify(path)?;
        let modified_time = filesystem::modified_time(path)?;
        let metadata = parser.parse(tree.root().name(), modified_time);
        if let Err(err) = &metadata {
            warn!("Could not parse metadata for {}: {}", path.display(), err);
        }
        Ok(Self { tree, metadata, data_dirs: OnceCell::new() })
    }

    /// The mod folder itself.
    pub fn root(&self) -> NodeRef<'_> {
        self.tree.root()
    }

    pub fn name(&self) -> &str {
        self.root().name()
    }

    pub fn path(&self) -> &Path {
        self.root().path()
    }

    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    pub fn metadata(&self) -> Result<&ModMetadata, &MetadataError> {
        self.metadata.as_ref()
    }

    /// Data directories of this mod, resolved on first use.
    ///
    /// The mod folder itself when it directly holds plugins, archives or
    /// resource directories; otherwise every data directory found by a
    /// recursive search below it. An empty result means the layout is not
    /// recognised.
    pub fn data_directories(&self) -> Vec<NodeRef<'_>> {
        let ids = self.data_dirs.get_or_init(|| {
            let ids = self.find_data_directories();
            if ids.is_empty() {
                warn!("No data directories found in {}", self.path().display());
            }
            ids
        });
        ids.iter().filter_map(|&id| self.tree.get(id)).collect()
    }

    fn find_data_directories(&self) -> Vec<NodeId> {
        let root = self.root();
        if root.is_data_directory() {
            return vec![root.id()];
        }
        root.recurse_search_children(NodeRef::is_data_directory, Some(Capability::Directory))
            .iter()
            .map(NodeRef::id)
            .collect()
    }

    /// Marks an archive of this mod as enabled or disabled.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` when `archive` is not an archive of this mod.
    pub fn set_archive_enabled(&mut self, archive: NodeId, enabled: bool) -> Result<(), ResourceError> {
        self.tree.set_archive_enabled(archive, enabled)
    }
}

/// All mods found directly below one mods root.
#[derive(Debug)]
pub struct ModCollection {
    path: PathBuf,
    mods: Vec<Mod>,
    failures: Vec<ScanFailure>,
}

impl ModCollection {
    /// Scans `root` and builds one [`Mod`] per immediate subdirectory, in
    /// folder-name order. Files in `root` are ignored.
    ///
    /// # Arguments
    ///
    /// * `root` - The mods root directory.
    /// * `settings` - Resource folder names and the posted-time window.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError` only when `root` itself cannot be listed.
    /// A mod that fails to load is logged and recorded in [`Self::failures`].
    pub fn build<P: AsRef<Path>>(root: P, settings: &ParsingSettings) -> Result<Self, CollectionError> {
        let root = root.as_ref();
        if !filesystem::dir_exists(root) {
            return Err(CollectionError::NotADirectory(root.to_path_buf()));
        }

        info!("Scanning {} for mods", root.display());
        let classifier = PathClassifier::from_settings(settings);
        let parser = ModNameParser::from_settings(settings);

        let entries = filesystem::sorted_entries(root).map_err(|source| CollectionError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut mods = Vec::new();
        let mut failures = Vec::new();
        for entry in entries.into_iter().filter(|e| is_dir(e)) {
            match Mod::load(&entry, &classifier, &parser) {
                Ok(m) => {
                    debug!("Classified {} as {:?}", entry.display(), m.root().resource_type());
                    mods.push(m);
                }
                Err(error) => {
                    warn!("Skipping mod {}: {}", entry.display(), error);
                    failures.push(ScanFailure { path: entry, error });
                }
            }
        }

        info!(
            "Found {} mods in {} ({} skipped)",
            mods.len(),
            root.display(),
            failures.len()
        );
        Ok(Self { path: root.to_path_buf(), mods, failures })
    }

    /// Builds one collection per configured mods root.
    ///
    /// # Errors
    ///
    /// Returns the first root that cannot be expanded or listed.
    pub fn build_all(settings: &AppSettings) -> Result<Vec<Self>, CollectionError> {
        settings
            .core
            .mods_paths()?
            .into_iter()
            .map(|root| Self::build(root, &settings.parsing))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every mod that was classified, in folder-name order.
    ///
    /// This includes mods whose folder name could not be parsed; their
    /// [`Mod::metadata`] is an error. Use [`Self::mods_with_metadata`] to skip
    /// them.
    pub fn mods(&self) -> &[Mod] {
        &self.mods
    }

    pub fn mods_mut(&mut self) -> &mut [Mod] {
        &mut self.mods
    }

    /// Mods whose folder name parsed, paired with their metadata.
    pub fn mods_with_metadata(&self) -> impl Iterator<Item = (&Mod, &ModMetadata)> {
        self.mods.iter().filter_map(|m| m.metadata().ok().map(|meta| (m, meta)))
    }

    /// Mod folders that could not be classified.
    pub fn failures(&self) -> &[ScanFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// The `filesystem` module provides small path helpers shared by the other
/// modules: existence checks, sorted directory listings, modification times
/// and `~` expansion.
pub mod filesystem;

/// The `settings` module loads the application settings (mods roots,
/// resource folder names and the accepted folder timestamp window) from
/// YAML or JSON files.
pub mod settings;

/// The `resources` module classifies files and directories of a mod into
/// plugins, archives, resource directories and data directories, and stores
/// the result as an immutable tree.
pub mod resources;

/// The `query` module adds filtering and recursive search over the children
/// of a classified directory.
pub mod query;

/// The `metadata` module parses mod folder names such as
/// `Expansion Delay-47588-1-3-1612481103` into title, catalog id, version,
/// variant and posted time.
pub mod metadata;

/// The `collection` module scans a mods root, building one classified mod
/// per subdirectory along with its metadata and data directories.
pub mod collection;

/// The `listing` module renders a scanned collection as indented text.
pub mod listing;

/// The `logging` module installs a `tracing` subscriber for binaries and demos.
pub mod logging;

pub use collection::{Mod, ModCollection};
pub use metadata::{ModMetadata, ModNameParser};
pub use resources::{NodeRef, PathClassifier, ResourceTree};
pub use settings::AppSettings;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::filesystem::{self, FilesystemError};
use crate::settings::ParsingSettings;

/// Errors raised while classifying a path into a resource tree.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The path handed to the classifier was empty.
    #[error("Cannot classify an empty path")]
    InvalidInput,
    /// The root path is neither a regular file nor a directory.
    #[error("Path is neither a file nor a directory: {0}")]
    Unclassifiable(PathBuf),
    /// A directory could not be listed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: FilesystemError,
    },
    /// The node id does not belong to this tree.
    #[error("No node {0:?} in this tree")]
    UnknownNode(NodeId),
    /// Only archives carry an enabled flag.
    #[error("Not an archive: {0}")]
    NotAnArchive(PathBuf),
}

/// Index of a node inside its [`ResourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The exact classification of a node, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    File,
    EspFile,
    ArchiveFile,
    Directory,
    ResourceDirectory,
    DataDirectory,
}

/// A capability set shared by several resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Any regular file, whatever its suffix.
    File,
    /// Any directory, promoted or not.
    Directory,
}

impl ResourceType {
    /// Checks whether this type belongs to the given capability set.
    pub fn has_capability(self, capability: Capability) -> bool {
        match capability {
            Capability::File => matches!(self, Self::File | Self::EspFile | Self::ArchiveFile),
            Capability::Directory => matches!(
                self,
                Self::Directory | Self::ResourceDirectory | Self::DataDirectory
            ),
        }
    }

    /// Types whose direct presence makes the parent a data directory.
    pub fn marks_data_directory(self) -> bool {
        matches!(self, Self::EspFile | Self::ArchiveFile | Self::ResourceDirectory)
    }
}

/// A classified resource with its type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    EspFile,
    /// A `.bsa` archive. `is_enabled` stays unset until a consumer decides.
    ArchiveFile { is_enabled: Option<bool> },
    Directory { children: Vec<NodeId> },
    ResourceDirectory { children: Vec<NodeId> },
    DataDirectory { children: Vec<NodeId> },
}

impl ResourceKind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::File => ResourceType::File,
            Self::EspFile => ResourceType::EspFile,
            Self::ArchiveFile { .. } => ResourceType::ArchiveFile,
            Self::Directory { .. } => ResourceType::Directory,
            Self::ResourceDirectory { .. } => ResourceType::ResourceDirectory,
            Self::DataDirectory { .. } => ResourceType::DataDirectory,
        }
    }

    /// Children of a directory; files have none.
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Directory { children }
            | Self::ResourceDirectory { children }
            | Self::DataDirectory { children } => children,
            _ => &[],
        }
    }

    fn with_children(resource_type: ResourceType, children: Vec<NodeId>) -> Self {
        match resource_type {
            ResourceType::File => Self::File,
            ResourceType::EspFile => Self::EspFile,
            ResourceType::ArchiveFile => Self::ArchiveFile { is_enabled: None },
            ResourceType::Directory => Self::Directory { children },
            ResourceType::ResourceDirectory => Self::ResourceDirectory { children },
            ResourceType::DataDirectory => Self::DataDirectory { children },
        }
    }
}

/// One file or directory of a mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub path: PathBuf,
    /// File stem for files, full folder name for directories.
    pub name: String,
    /// Navigation only; the tree owns every node.
    pub parent: Option<NodeId>,
    pub kind: ResourceKind,
}

/// An immutable snapshot of a classified directory tree, stored as an arena.
///
/// The root is always the first node. Each directory lists its children in
/// file-name order. The tree remembers the resource folder names it was
/// classified with, so queries match names the same way the classifier did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
    resource_dir_names: HashSet<String>,
}

impl ResourceTree {
    /// The node the tree was built from.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { tree: self, id: NodeId(0) }
    }

    /// Looks up a node, returning `None` for ids from another tree.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// Checks whether `name` is one of the resource folder names, ignoring case.
    pub fn is_resource_dir_name(&self, name: &str) -> bool {
        matches_resource_dir_name(&self.resource_dir_names, name)
    }

    /// Sets the enabled flag of an archive.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::UnknownNode` for a foreign id and
    /// `ResourceError::NotAnArchive` when the node is not a `.bsa` file.
    pub fn set_archive_enabled(&mut self, id: NodeId, enabled: bool) -> Result<(), ResourceError> {
        let node = self.nodes.get_mut(id.0).ok_or(ResourceError::UnknownNode(id))?;
        match &mut node.kind {
            ResourceKind::ArchiveFile { is_enabled } => {
                *is_enabled = Some(enabled);
                Ok(())
            }
            _ => Err(ResourceError::NotAnArchive(node.path.clone())),
        }
    }

    fn node(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id.0]
    }
}

/// A borrowed view of one node together with the tree that owns it.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ResourceTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a ResourceTree {
        self.tree
    }

    pub fn node(&self) -> &'a ResourceNode {
        self.tree.node(self.id)
    }

    pub fn path(&self) -> &'a Path {
        &self.node().path
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn kind(&self) -> &'a ResourceKind {
        &self.node().kind
    }

    pub fn resource_type(&self) -> ResourceType {
        self.kind().resource_type()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.resource_type().has_capability(capability)
    }

    pub fn is_directory(&self) -> bool {
        self.has_capability(Capability::Directory)
    }

    pub fn is_file(&self) -> bool {
        self.has_capability(Capability::File)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| NodeRef { tree: self.tree, id })
    }

    /// Immediate children, in file-name order.
    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> {
        let tree = self.tree;
        self.kind().children().iter().map(move |&id| NodeRef { tree, id })
    }

    /// Enabled flag of an archive; `None` for other nodes or when unset.
    pub fn is_archive_enabled(&self) -> Option<bool> {
        match self.kind() {
            ResourceKind::ArchiveFile { is_enabled } => *is_enabled,
            _ => None,
        }
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Intermediate result of a scan, classified before it enters the arena.
struct Scanned {
    path: PathBuf,
    name: String,
    resource_type: ResourceType,
    children: Vec<Scanned>,
}

/// Decides which resource kind a path represents and builds resource trees.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    resource_dir_names: HashSet<String>,
}

impl PathClassifier {
    /// Creates a classifier that treats `resource_dir_names` (any case) as
    /// resource folders.
    pub fn new<I, S>(resource_dir_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            resource_dir_names: resource_dir_names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_settings(settings: &ParsingSettings) -> Self {
        Self { resource_dir_names: settings.resource_dir_name_set() }
    }

    pub fn is_resource_dir_name(&self, name: &str) -> bool {
        matches_resource_dir_name(&self.resource_dir_names, name)
    }

    /// Classifies `path` and everything below it.
    ///
    /// Directories are scanned eagerly and their children sorted by name.
    /// Entries below the root that are neither files nor directories (for
    /// instance dangling symlinks) are left out.
    ///
    /// # Arguments
    ///
    /// * `path` - The file or directory to classify. Becomes the tree root.
    ///
    /// # Errors
    ///
    /// * `ResourceError::InvalidInput` if `path` is empty.
    /// * `ResourceError::Unclassifiable` if the root is missing or special.
    /// * `ResourceError::Io` if a directory cannot be listed.
    pub fn classify<P: AsRef<Path>>(&self, path: P) -> Result<ResourceTree, ResourceError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ResourceError::InvalidInput);
        }

        let scanned = self
            .scan(path)?
            .ok_or_else(|| ResourceError::Unclassifiable(path.to_path_buf()))?;

        let mut tree = ResourceTree {
            nodes: Vec::new(),
            resource_dir_names: self.resource_dir_names.clone(),
        };
        insert(&mut tree.nodes, scanned, None);
        Ok(tree)
    }

    fn scan(&self, path: &Path) -> Result<Option<Scanned>, ResourceError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!("Skipping {}: {}", path.display(), err);
                return Ok(None);
            }
        };

        if metadata.is_file() {
            return Ok(Some(Scanned {
                path: path.to_path_buf(),
                name: file_stem(path),
                resource_type: file_type(path),
                children: Vec::new(),
            }));
        }

        if !metadata.is_dir() {
            debug!("Skipping unclassifiable entry {}", path.display());
            return Ok(None);
        }

        let entries = filesystem::sorted_entries(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(child) = self.scan(&entry)? {
                children.push(child);
            }
        }

        let name = file_name(path);
        let resource_type = self.directory_type(&name, &children);
        Ok(Some(Scanned { path: path.to_path_buf(), name, resource_type, children }))
    }

    /// Data directories win over resource directories; the folder name only
    /// matters when no child marks the directory as data.
    fn directory_type(&self, name: &str, children: &[Scanned]) -> ResourceType {
        if children.iter().any(|c| c.resource_type.marks_data_directory()) {
            ResourceType::DataDirectory
        } else if self.is_resource_dir_name(name) {
            ResourceType::ResourceDirectory
        } else {
            ResourceType::Directory
        }
    }
}

/// `names` holds lowercased folder names.
fn matches_resource_dir_name(names: &HashSet<String>, name: &str) -> bool {
    names.contains(&name.to_lowercase())
}

fn file_type(path: &Path) -> ResourceType {
    let extension = path.extension().map(|e| e.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("bsa") => ResourceType::ArchiveFile,
        Some("esp") => ResourceType::EspFile,
        _ => ResourceType::File,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl Scanned {
    fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Scanned::subtree_len).sum::<usize>()
    }
}

/// Appends a scanned subtree in pre-order, so child ids are known before the
/// parent is pushed.
fn insert(nodes: &mut Vec<ResourceNode>, scanned: Scanned, parent: Option<NodeId>) -> NodeId {
    let id = NodeId(nodes.len());
    let mut next = id.0 + 1;
    let child_ids = scanned
        .children
        .iter()
        .map(|child| {
            let child_id = NodeId(next);
            next += child.subtree_len();
            child_id
        })
        .collect();

    let Scanned { path, name, resource_type, children } = scanned;
    nodes.push(ResourceNode {
        path,
        name,
        parent,
        kind: ResourceKind::with_children(resource_type, child_ids),
    });
    for child in children {
        insert(nodes, child, Some(id));
    }
    id
}

use crate::resources::{Capability, NodeRef, ResourceType};

impl<'a> NodeRef<'a> {
    /// Immediate children whose type is exactly `resource_type`.
    pub fn children_of_type(self, resource_type: ResourceType) -> Vec<NodeRef<'a>> {
        self.children().filter(|c| c.resource_type() == resource_type).collect()
    }

    pub fn has_child_of_type(self, resource_type: ResourceType) -> bool {
        self.children().any(|c| c.resource_type() == resource_type)
    }

    /// Immediate children belonging to `capability`, whatever their exact type.
    pub fn children_of_capability(self, capability: Capability) -> Vec<NodeRef<'a>> {
        self.children().filter(|c| c.has_capability(capability)).collect()
    }

    /// Filters the immediate children by `condition`, optionally looking only
    /// at children with the given capability. Never descends.
    pub fn search_children<F>(self, condition: F, only: Option<Capability>) -> Vec<NodeRef<'a>>
    where
        F: Fn(NodeRef<'a>) -> bool,
    {
        self.candidates(only).filter(|&c| condition(c)).collect()
    }

    /// Searches the subtree for nodes meeting `condition`.
    ///
    /// Each child is tested first. A matching child is returned as is and
    /// nothing below it is visited, so a shallow match hides deeper matches
    /// in its own subtree. A child directory that does not match is searched
    /// the same way, so sibling subtrees without a shallow match are still
    /// explored in depth. Results keep child order.
    ///
    /// A matching sibling does not stop the search of non-matching siblings.
    ///
    /// # Arguments
    ///
    /// * `condition` - Predicate applied to candidate nodes.
    /// * `only` - If set, only children with this capability are candidates.
    ///   Recursion always follows every child directory.
    ///
    /// # Returns
    ///
    /// The matches, or an empty vector when nothing in the subtree matches.
    pub fn recurse_search_children<F>(self, condition: F, only: Option<Capability>) -> Vec<NodeRef<'a>>
    where
        F: Fn(NodeRef<'a>) -> bool,
    {
        let mut found = Vec::new();
        self.recurse_search(&condition, only, &mut found);
        found
    }

    fn recurse_search<F>(self, condition: &F, only: Option<Capability>, found: &mut Vec<NodeRef<'a>>)
    where
        F: Fn(NodeRef<'a>) -> bool,
    {
        for child in self.children() {
            if is_candidate(child, only) && condition(child) {
                found.push(child);
            } else if child.is_directory() {
                child.recurse_search(condition, only, found);
            }
        }
    }

    fn candidates(self, only: Option<Capability>) -> impl Iterator<Item = NodeRef<'a>> {
        self.children().filter(move |&c| is_candidate(c, only))
    }

    /// Whether this node directly holds a plugin, an archive or a resource
    /// directory.
    pub fn is_data_directory(self) -> bool {
        self.is_directory() && self.children().any(|c| c.resource_type().marks_data_directory())
    }

    /// `.esp` plugins directly inside this directory.
    pub fn esp_files(self) -> Vec<NodeRef<'a>> {
        self.children_of_type(ResourceType::EspFile)
    }

    pub fn has_esp(self) -> bool {
        self.has_child_of_type(ResourceType::EspFile)
    }

    /// `.bsa` archives directly inside this directory.
    pub fn bsa_files(self) -> Vec<NodeRef<'a>> {
        self.children_of_type(ResourceType::ArchiveFile)
    }

    pub fn has_bsa(self) -> bool {
        self.has_child_of_type(ResourceType::ArchiveFile)
    }

    /// Directories directly inside this one whose folder name is a resource
    /// name (meshes, textures, ...), whatever they were classified as.
    pub fn resource_dirs(self) -> Vec<NodeRef<'a>> {
        let tree = self.tree();
        self.search_children(|c| tree.is_resource_dir_name(c.name()), Some(Capability::Directory))
    }

    pub fn has_resource_dirs(self) -> bool {
        !self.resource_dirs().is_empty()
    }
}

fn is_candidate(node: NodeRef<'_>, only: Option<Capability>) -> bool {
    only.is_none_or(|capability| node.has_capability(capability))
}

#[cfg(test)]
mod tests {
    use crate::resources::{PathClassifier, ResourceTree};

    use super::*;
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::tempdir;

    fn build(root: &Path, files: &[&str], dirs: &[&str]) -> ResourceTree {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            File::create(path).unwrap();
        }
        PathClassifier::new(["meshes", "textures"]).classify(root).unwrap()
    }

    fn names(nodes: &[NodeRef<'_>]) -> Vec<String> {
        nodes.iter().map(|n| n.path().display().to_string()).collect()
    }

    #[test]
    fn filters_children_by_type_and_capability() {
        let dir = tempdir().unwrap();
        let tree = build(dir.path(), &["a.esp", "b.bsa", "c.txt", "textures/t.dds"], &["empty"]);
        let root = tree.root();

        assert_eq!(root.esp_files().len(), 1);
        assert_eq!(root.bsa_files().len(), 1);
        assert_eq!(root.children_of_type(ResourceType::File).len(), 1);
        assert_eq!(root.children_of_capability(Capability::File).len(), 3);
        assert_eq!(root.children_of_capability(Capability::Directory).len(), 2);
        assert_eq!(root.resource_dirs().len(), 1);
        assert!(root.has_esp() && root.has_bsa() && root.has_resource_dirs());
    }

    #[test]
    fn resource_dirs_match_by_name_even_when_holding_plugins() {
        let dir = tempdir().unwrap();
        let tree = build(dir.path(), &["main.esp", "Textures/extra.esp", "docs/readme.txt"], &[]);
        let root = tree.root();

        let textures = root.resource_dirs();
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].name(), "Textures");
        assert_eq!(textures[0].resource_type(), ResourceType::DataDirectory);
        assert!(tree.is_resource_dir_name("TEXTURES"));
        assert!(!tree.is_resource_dir_name("docs"));
    }

    #[test]
    fn search_children_does_not_descend() {
        let dir = tempdir().unwrap();
        let tree = build(dir.path(), &["sub/deep.esp"], &[]);

        let found = tree.root().search_children(|n| n.is_file(), None);
        assert!(found.is_empty());
        let found = tree.root().search_children(|n| n.is_directory(), Some(Capability::Directory));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn search_children_of_empty_directory_is_empty() {
        let dir = tempdir().unwrap();
        let tree = build(dir.path(), &[], &[]);
        assert!(tree.root().search_children(|_| true, None).is_empty());
    }

    #[test]
    fn recurse_search_finds_nothing_without_data() {
        let dir = tempdir().unwrap();
        let tree = build(dir.path(), &["docs/readme.txt", "x/y/z.png"], &["empty"]);
        let root = tree.root();

        let first = root.recurse_search_children(NodeRef::is_data_directory, Some(Capability::Directory));
        let second = root.recurse_search_children(NodeRef::is_data_directory, Some(Capability::Directory));
        assert!(first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn recurse_search_does_not_descend_below_a_match() {
        let dir = tempdir().unwrap();
        let tree = build(
            dir.path(),
            &["a/plugin.esp", "a/deeper/other.esp", "c/d/b/patch.esp", "c/d/readme.txt"],
            &[],
        );

        let found = tree
            .root()
            .recurse_search_children(NodeRef::is_data_directory, Some(Capability::Directory));
        let root = dir.path();
        assert_eq!(
            names(&found),
            vec![root.join("a").display().to_string(), root.join("c/d/b").display().to_string()]
        );
    }

    #[test]
    fn recurse_search_collects_matches_across_sibling_subtrees() {
        let dir = tempdir().unwrap();
        let tree = build(
            dir.path(),
            &["x/one/a.esp", "x/two/b.bsa", "y/three/meshes/m.nif"],
            &[],
        );

        let found = tree
            .root()
            .recurse_search_children(NodeRef::is_data_directory, Some(Capability::Directory));
        let found: Vec<_> = found.iter().map(|n| n.name()).collect();
        assert_eq!(found, vec!["one", "two", "three"]);
    }

    #[test]
    fn recurse_search_respects_capability_restriction() {
        let dir = tempdir().unwrap();
        let tree = build(dir.path(), &["sub/notes.txt"], &[]);

        let any = tree.root().recurse_search_children(|n| n.name() == "notes", None);
        assert_eq!(any.len(), 1);
        let dirs_only = tree
            .root()
            .recurse_search_children(|n| n.name() == "notes", Some(Capability::Directory));
        assert!(dirs_only.is_empty());
    }
}

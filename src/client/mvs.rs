//! Minimal version selection over a module's requirement graph.
//!
//! The graph is walked breadth first from the root. Each module keeps the
//! highest version any requirer asked for; when a higher version shows up
//! later, its `go.mod` replaces the one read for the lower version. The
//! selection is then rendered as a tree rooted at the main module.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::client::gomod::{normalize_module_path, Requirement};
use crate::client::ModuleClient;

/// Depth at which [`ModuleClient::dependency_tree`] stops expanding nodes
/// unless told otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Version used for a requirement that names no version.
const UNVERSIONED: &str = "latest";

/// One module in the rendered dependency tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    /// `path@release`.
    pub id: String,
    pub path: String,
    pub release: String,
    /// Zip size in bytes, when sizes were requested and known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub children: Vec<DependencyNode>,
}

/// Order two module versions.
///
/// Two pseudo-versions of the form `v0.0.0-<14-digit timestamp>-<hash>` are
/// ordered by timestamp. Everything else is compared dot-separated part by
/// part after dropping the leading `v`: a missing part counts as `0`, a part
/// carrying a `-suffix` sorts below the same part without one, and parts are
/// otherwise compared by their leading number.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Some(ta), Some(tb)) = (pseudo_timestamp(a), pseudo_timestamp(b)) {
        return ta.cmp(tb);
    }

    let a_parts: Vec<&str> = strip_v(a).split('.').collect();
    let b_parts: Vec<&str> = strip_v(b).split('.').collect();

    for i in 0..a_parts.len().max(b_parts.len()) {
        let pa = a_parts.get(i).copied().unwrap_or("0");
        let pb = b_parts.get(i).copied().unwrap_or("0");

        let ordering = match (pa.split_once('-'), pb.split_once('-')) {
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((na, pre_a)), Some((nb, pre_b))) => leading_number(na)
                .cmp(&leading_number(nb))
                .then_with(|| first_field(pre_a).cmp(first_field(pre_b))),
            (None, None) => leading_number(pa).cmp(&leading_number(pb)),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

// Only the text up to the next `-` takes part in pre-release ordering.
fn first_field(pre_release: &str) -> &str {
    pre_release.split('-').next().unwrap_or("")
}

fn leading_number(part: &str) -> u64 {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().unwrap_or(0)
}

fn pseudo_timestamp(version: &str) -> Option<&str> {
    let rest = version.strip_prefix("v0.0.0-")?;
    let (timestamp, hash) = rest.split_once('-')?;
    let valid = timestamp.len() == 14
        && timestamp.bytes().all(|b| b.is_ascii_digit())
        && !hash.is_empty()
        && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    valid.then_some(timestamp)
}

/// Outcome of the breadth-first walk: the chosen version of every module
/// reached, the requirements of that version and, optionally, its size.
#[derive(Debug, Default)]
pub(crate) struct Selection {
    selected: HashMap<String, String>,
    requirements: HashMap<String, Vec<Requirement>>,
    sizes: HashMap<String, Option<u64>>,
}

impl Selection {
    fn select(&mut self, path: &str, release: &str, requirements: Vec<Requirement>) {
        self.selected.insert(path.to_string(), release.to_string());
        self.requirements.insert(path.to_string(), requirements);
    }

    /// Render the selection as a tree rooted at `root`.
    ///
    /// A module already rendered elsewhere in the tree, or deeper than
    /// `max_depth`, appears as a leaf.
    pub(crate) fn tree(&self, root: &str, max_depth: usize) -> DependencyNode {
        let mut visited = HashSet::new();
        self.node(root, 0, max_depth, &mut visited)
    }

    fn node(
        &self,
        path: &str,
        depth: usize,
        max_depth: usize,
        visited: &mut HashSet<String>,
    ) -> DependencyNode {
        let release = self
            .selected
            .get(path)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let id = format!("{path}@{release}");
        let size = self.sizes.get(path).copied().flatten();

        let mut node = DependencyNode {
            id: id.clone(),
            path: path.to_string(),
            release,
            size,
            children: Vec::new(),
        };
        if !visited.insert(id) || depth > max_depth {
            return node;
        }

        for requirement in self.requirements.get(path).into_iter().flatten() {
            let child = normalize_module_path(&requirement.path);
            if self.selected.contains_key(&child) {
                node.children
                    .push(self.node(&child, depth + 1, max_depth, visited));
            }
        }
        node
    }
}

struct Pending {
    path: String,
    release: String,
    required_by: Option<String>,
}

impl ModuleClient {
    /// Resolve the dependency graph of `module` at `release` with minimal
    /// version selection and render it as a tree.
    ///
    /// A `go.mod` that cannot be fetched contributes no requirements. Zip
    /// sizes are looked up only when `include_sizes` is set.
    pub async fn dependency_tree(
        &self,
        module: &str,
        release: &str,
        include_sizes: bool,
        max_depth: usize,
    ) -> DependencyNode {
        let root = normalize_module_path(module);
        let mut selection = Selection::default();
        let mut queue = VecDeque::from([Pending {
            path: root.clone(),
            release: release.to_string(),
            required_by: None,
        }]);

        while let Some(pending) = queue.pop_front() {
            match selection.selected.get(&pending.path) {
                None => {}
                Some(current) if compare_versions(&pending.release, current).is_gt() => {
                    tracing::debug!(
                        module = %pending.path,
                        from = %current,
                        to = %pending.release,
                        required_by = ?pending.required_by,
                        "Raising selected version"
                    );
                }
                Some(_) => continue,
            }

            let requirements = match self.go_mod(&pending.path, &pending.release).await {
                Ok(requirements) => requirements,
                Err(e) => {
                    tracing::debug!(
                        module = %pending.path,
                        release = %pending.release,
                        error = %e,
                        "Requirements unavailable"
                    );
                    Vec::new()
                }
            };

            if include_sizes {
                let size = self.module_size(&pending.path, &pending.release).await;
                selection.sizes.insert(pending.path.clone(), size);
            }

            for requirement in &requirements {
                queue.push_back(Pending {
                    path: normalize_module_path(&requirement.path),
                    release: requirement
                        .version
                        .clone()
                        .unwrap_or_else(|| UNVERSIONED.to_string()),
                    required_by: Some(pending.path.clone()),
                });
            }
            selection.select(&pending.path, &pending.release, requirements);
        }

        selection.tree(&root, max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requires(paths: &[&str]) -> Vec<Requirement> {
        paths
            .iter()
            .map(|p| Requirement {
                path: p.to_string(),
                version: Some("v1.0.0".into()),
            })
            .collect()
    }

    #[test]
    fn test_semver_ordering() {
        assert_eq!(compare_versions("v1.2.3", "v1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("v1.10.0", "v1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("v1.2.3", "v2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2.3", "v1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("v1.2", "v1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("v1.2.1", "v1.2"), Ordering::Greater);
        assert_eq!(
            compare_versions("v2.0.0+incompatible", "v2.0.0"),
            Ordering::Equal
        );
    }

    #[test]
    fn test_pre_release_sorts_below_release() {
        assert_eq!(compare_versions("v1.0.0-rc.1", "v1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("v1.0.0", "v1.0.0-beta"), Ordering::Greater);
        assert_eq!(compare_versions("v1.0.0-alpha", "v1.0.0-beta"), Ordering::Less);
        assert_eq!(compare_versions("v1.0.1-alpha", "v1.0.0-beta"), Ordering::Greater);
    }

    #[test]
    fn test_pseudo_versions_order_by_timestamp() {
        let older = "v0.0.0-20230101120000-abcdef123456";
        let newer = "v0.0.0-20240301090000-0123456789ab";
        assert_eq!(compare_versions(older, newer), Ordering::Less);
        assert_eq!(compare_versions(newer, older), Ordering::Greater);
        assert_eq!(compare_versions(older, older), Ordering::Equal);

        // A tagged release outranks a v0.0.0 pseudo-version.
        assert_eq!(compare_versions(newer, "v0.1.0"), Ordering::Less);
    }

    #[test]
    fn test_pseudo_version_shape() {
        assert_eq!(
            pseudo_timestamp("v0.0.0-20230101120000-abcdef123456"),
            Some("20230101120000")
        );
        assert_eq!(pseudo_timestamp("v0.0.0-2023010112000-abcdef"), None);
        assert_eq!(pseudo_timestamp("v0.0.0-20230101120000-ABCDEF"), None);
        assert_eq!(pseudo_timestamp("v1.0.0-20230101120000-abcdef"), None);
        assert_eq!(pseudo_timestamp("v0.0.0-20230101120000-"), None);
    }

    #[test]
    fn test_tree_shared_module_expands_once() {
        let mut selection = Selection::default();
        selection.select("root", "v1.0.0", requires(&["a", "b"]));
        selection.select("a", "v1.0.0", requires(&["c"]));
        selection.select("b", "v1.0.0", requires(&["c"]));
        selection.select("c", "v1.2.0", requires(&["d"]));
        selection.select("d", "v1.0.0", Vec::new());

        let tree = selection.tree("root", DEFAULT_MAX_DEPTH);
        assert_eq!(tree.id, "root@v1.0.0");

        let via_a = &tree.children[0].children[0];
        assert_eq!(via_a.id, "c@v1.2.0");
        assert_eq!(via_a.children.len(), 1);

        let via_b = &tree.children[1].children[0];
        assert_eq!(via_b.id, "c@v1.2.0");
        assert!(via_b.children.is_empty());
    }

    #[test]
    fn test_tree_cycle_terminates() {
        let mut selection = Selection::default();
        selection.select("a", "v1.0.0", requires(&["b"]));
        selection.select("b", "v1.0.0", requires(&["a"]));

        let tree = selection.tree("a", DEFAULT_MAX_DEPTH);
        let b = &tree.children[0];
        assert_eq!(b.id, "b@v1.0.0");
        assert_eq!(b.children[0].id, "a@v1.0.0");
        assert!(b.children[0].children.is_empty());
    }

    #[test]
    fn test_tree_depth_limit_and_unselected_requirements() {
        let mut selection = Selection::default();
        selection.select("a", "v1.0.0", requires(&["b", "gone"]));
        selection.select("b", "v1.0.0", requires(&["c"]));
        selection.select("c", "v1.0.0", Vec::new());

        let tree = selection.tree("a", 0);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].id, "b@v1.0.0");
        assert!(tree.children[0].children.is_empty());

        assert_eq!(selection.tree("missing", 5).id, "missing@unknown");
    }

    #[test]
    fn test_size_is_omitted_from_json_when_unknown() {
        let node = DependencyNode {
            id: "m@v1.0.0".into(),
            path: "m".into(),
            release: "v1.0.0".into(),
            size: None,
            children: Vec::new(),
        };
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"id":"m@v1.0.0","path":"m","release":"v1.0.0","children":[]}"#
        );
    }
}

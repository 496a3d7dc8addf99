//! Resolved dependency graph construction and traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use depsteer_core::module::ModuleCoordinate;

use crate::adapter::ResolutionResult;

/// A node in the resolved graph: the scope itself or a selected module.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum GraphNode {
    Scope(String),
    Module(ModuleCoordinate),
}

impl GraphNode {
    /// `org:name` for modules, the scope name for the root.
    pub fn key(&self) -> String {
        match self {
            GraphNode::Scope(name) => name.clone(),
            GraphNode::Module(coordinate) => coordinate.module().to_string(),
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphNode::Scope(name) => f.write_str(name),
            GraphNode::Module(coordinate) => write!(f, "{coordinate}"),
        }
    }
}

/// Edge label: what the parent asked for.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub requested: ModuleCoordinate,
}

/// A resolved dependency graph backed by petgraph.
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DepEdge>,
    /// Lookup from node key to index (one node per module).
    index: HashMap<String, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Build the graph of a scope's resolution, rooted at the scope.
    pub fn from_resolution(scope: &str, result: &ResolutionResult) -> Self {
        let mut graph = Self::new();
        let root = graph.add_node(GraphNode::Scope(scope.to_string()));
        graph.set_root(root);
        for record in result.records() {
            let to = graph.add_node(GraphNode::Module(record.selected.clone()));
            let from = match &record.from {
                Some(parent) => graph.add_node(GraphNode::Module(parent.clone())),
                None => root,
            };
            graph.add_edge(
                from,
                to,
                DepEdge {
                    requested: record.requested.clone(),
                },
            );
        }
        graph
    }

    /// Add or retrieve a node. If the key already exists, returns the existing index.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let key = node.key();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Look up a node by `org:name`.
    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Direct dependencies of a node, in insertion order.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<(NodeIndex, &DepEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        // petgraph walks outgoing edges newest first
        deps.reverse();
        deps
    }

    /// Print the tree below the root. Edges whose requested version differs
    /// from the selection are shown as `org:name:requested -> selected`.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, (idx, edge)) in deps.iter().enumerate() {
            self.print_subtree(
                &mut output,
                *idx,
                edge,
                "",
                i == count - 1,
                1,
                max_depth,
                &mut visited,
            );
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: &DepEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!(
            "{prefix}{connector}{}\n",
            edge_label(edge, &self.graph[idx])
        ));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, child_edge)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                child_edge,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find the path from root to a module.
    ///
    /// Accepts either `org:name` or just `name`.
    pub fn find_path(&self, target_key: &str) -> Option<Vec<&GraphNode>> {
        let root = self.root?;
        let target = self.resolve_key(target_key)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some(&idx) = self.index.get(key) {
            return Some(idx);
        }
        self.index
            .iter()
            .find(|(full_key, _)| full_key.split(':').nth(1) == Some(key))
            .map(|(_, &idx)| idx)
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, path, visited) {
                return true;
            }
        }
        path.pop();
        visited.remove(&current);
        false
    }

    /// Number of module nodes.
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn edge_label(edge: &DepEdge, node: &GraphNode) -> String {
    match node {
        GraphNode::Module(selected)
            if edge.requested.module() == selected.module()
                && edge.requested.version != selected.version =>
        {
            format!("{} -> {}", edge.requested, selected.version_str())
        }
        GraphNode::Module(selected) if edge.requested.module() != selected.module() => {
            format!("{} -> {selected}", edge.requested)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ResolvedDependencyRecord, SelectionCause};

    fn record(from: Option<&str>, requested: &str, selected: &str) -> ResolvedDependencyRecord {
        ResolvedDependencyRecord {
            from: from.map(|f| ModuleCoordinate::parse(f).unwrap()),
            requested: ModuleCoordinate::parse(requested).unwrap(),
            selected: ModuleCoordinate::parse(selected).unwrap(),
            cause: SelectionCause::Requested,
        }
    }

    fn sample() -> DependencyGraph {
        let result = ResolutionResult::Resolved(vec![
            record(None, "g:a:1.0", "g:a:1.2"),
            record(None, "g:b:1.2", "g:b:1.2"),
            record(Some("g:b:1.2"), "g:c:2.0", "g:c:2.0"),
            record(Some("g:b:1.2"), "h:old:1.0", "g:d:3.0"),
        ]);
        DependencyGraph::from_resolution("compile", &result)
    }

    #[test]
    fn builds_one_node_per_module() {
        let g = sample();
        assert_eq!(g.len(), 4);
        let idx = g.find("g:a").unwrap();
        assert_eq!(g.node(idx).to_string(), "g:a:1.2");
        assert!(g.find("h:old").is_none());
    }

    #[test]
    fn tree_shows_version_changes() {
        let tree = sample().print_tree(None);
        assert!(tree.starts_with("compile\n"));
        assert!(tree.contains("├── g:a:1.0 -> 1.2"));
        assert!(tree.contains("└── g:b:1.2"));
        assert!(tree.contains("    ├── g:c:2.0"));
        assert!(tree.contains("h:old:1.0 -> g:d:3.0"));
    }

    #[test]
    fn tree_respects_depth() {
        let tree = sample().print_tree(Some(1));
        assert!(tree.contains("g:b:1.2"));
        assert!(!tree.contains("g:c:2.0"));
    }

    #[test]
    fn find_path_by_name() {
        let g = sample();
        let path = g.find_path("c").unwrap();
        let labels: Vec<String> = path.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["compile", "g:b:1.2", "g:c:2.0"]);
        assert!(g.find_path("g:missing").is_none());
    }
}

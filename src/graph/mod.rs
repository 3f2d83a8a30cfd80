//! Graph construction with a cache-friendly CSR representation.
//!
//! Node identifiers are contiguous integers `0..n`. Adjacency is stored as
//! two flat vectors (Compressed Sparse Row) with each neighbour list sorted
//! and deduplicated, which is what the random walker iterates over.
//!
//! # Examples
//!
//! ```
//! use aprender_node2vec::graph::Graph;
//!
//! let g = Graph::from_edges(&[(0, 1), (1, 2), (2, 0)], false);
//! assert_eq!(g.num_nodes(), 3);
//! assert_eq!(g.neighbors(1), &[0, 2]);
//! ```

/// Graph node identifier (contiguous integers for cache efficiency).
pub type NodeId = usize;

/// Graph structure using CSR (Compressed Sparse Row) adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    row_ptr: Vec<usize>,      // Offset into col_indices (length = n_nodes + 1)
    col_indices: Vec<NodeId>, // Flattened neighbor lists
    is_directed: bool,
    n_nodes: usize,
    n_edges: usize,
}

impl Graph {
    /// Create empty graph.
    ///
    /// # Examples
    /// ```
    /// use aprender_node2vec::graph::Graph;
    ///
    /// let g = Graph::new(false);
    /// assert_eq!(g.num_nodes(), 0);
    /// ```
    #[must_use]
    pub fn new(is_directed: bool) -> Self {
        Self {
            row_ptr: vec![0],
            col_indices: Vec::new(),
            is_directed,
            n_nodes: 0,
            n_edges: 0,
        }
    }

    /// Build graph from edge list, sizing it by the largest node id.
    #[must_use]
    pub fn from_edges(edges: &[(NodeId, NodeId)], is_directed: bool) -> Self {
        let n_nodes = edges
            .iter()
            .flat_map(|&(s, t)| [s, t])
            .max()
            .map_or(0, |max_node| max_node + 1);
        Self::with_nodes(n_nodes, edges, is_directed)
    }

    /// Build graph with a fixed node count.
    ///
    /// Nodes that appear in no edge are kept as isolated nodes. The node
    /// count grows if an edge references an id `>= num_nodes`.
    ///
    /// # Examples
    /// ```
    /// use aprender_node2vec::graph::Graph;
    ///
    /// let g = Graph::with_nodes(4, &[(0, 1)], false);
    /// assert_eq!(g.num_nodes(), 4);
    /// assert!(g.neighbors(3).is_empty());
    /// ```
    #[must_use]
    pub fn with_nodes(num_nodes: usize, edges: &[(NodeId, NodeId)], is_directed: bool) -> Self {
        let n_nodes = edges
            .iter()
            .flat_map(|&(s, t)| [s, t])
            .map(|id| id + 1)
            .fold(num_nodes, usize::max);

        // Build adjacency list first (for sorting and deduplication)
        let mut adj_list: Vec<Vec<NodeId>> = vec![Vec::new(); n_nodes];
        for &(source, target) in edges {
            adj_list[source].push(target);
            if !is_directed && source != target {
                adj_list[target].push(source);
            }
        }

        for neighbors in &mut adj_list {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        let mut row_ptr = Vec::with_capacity(n_nodes + 1);
        let mut col_indices = Vec::new();
        row_ptr.push(0);
        for neighbors in &adj_list {
            col_indices.extend_from_slice(neighbors);
            row_ptr.push(col_indices.len());
        }

        // Undirected adjacency stores both directions; count each edge once
        let n_edges = if is_directed {
            col_indices.len()
        } else {
            let self_loops = (0..n_nodes)
                .filter(|&v| adj_list[v].binary_search(&v).is_ok())
                .count();
            (col_indices.len() - self_loops) / 2 + self_loops
        };

        Self {
            row_ptr,
            col_indices,
            is_directed,
            n_nodes,
            n_edges,
        }
    }

    /// Get number of nodes in graph.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Get number of distinct edges in graph.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.n_edges
    }

    /// Check if graph is directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.is_directed
    }

    /// Iterate over node ids.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.n_nodes
    }

    /// Get neighbors of node v in O(1), sorted ascending.
    ///
    /// Out-of-range ids have no neighbours.
    #[must_use]
    pub fn neighbors(&self, v: NodeId) -> &[NodeId] {
        if v >= self.n_nodes {
            return &[];
        }
        &self.col_indices[self.row_ptr[v]..self.row_ptr[v + 1]]
    }

    /// Number of neighbours of `v`.
    #[must_use]
    pub fn degree(&self, v: NodeId) -> usize {
        self.neighbors(v).len()
    }

    /// Whether the edge `u -> v` exists, in O(log degree(u)).
    #[must_use]
    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.neighbors(u).binary_search(&v).is_ok()
    }
}

#[cfg(test)]
mod tests;

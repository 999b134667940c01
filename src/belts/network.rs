use std::collections::VecDeque;

use crate::belts::model::TOLERANCE;

/// A directed edge in the flow arena. Every edge added by [`FlowNetwork::add_edge`]
/// gets a paired reverse edge with zero capacity, so residual capacity is
/// always `cap - flow` and augmenting along the reverse edge cancels flow.
#[derive(Debug, Clone, Copy)]
struct FlowEdge {
    to: usize,
    cap: f64,
    flow: f64,
    rev: usize,
}

/// Arena-based flow network: nodes are plain indices, edges live in a flat
/// `Vec` with adjacency lists of edge indices. This is the representation
/// spec.md §9 calls for in place of a general-purpose graph library, and is
/// adapted from the `FlowNetwork`/`FlowEdge` shape used for push-relabel max
/// flow elsewhere in this pack, here driven by BFS shortest-augmenting-path
/// (Edmonds-Karp) for the determinism spec.md §4.2 requires.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    adj: Vec<Vec<usize>>,
    edges: Vec<FlowEdge>,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            adj: vec![Vec::new(); num_nodes],
            edges: Vec::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    /// Appends a fresh node (used for the super-source/sink introduced in
    /// each pass of the belts transformation) and returns its index.
    pub fn add_node(&mut self) -> usize {
        self.adj.push(Vec::new());
        self.adj.len() - 1
    }

    /// Adds a forward/reverse edge pair and returns the forward edge's
    /// index (use this to read back its flow later).
    pub fn add_edge(&mut self, from: usize, to: usize, cap: f64) -> usize {
        let forward_idx = self.edges.len();
        let reverse_idx = forward_idx + 1;

        self.edges.push(FlowEdge {
            to,
            cap,
            flow: 0.0,
            rev: reverse_idx,
        });
        self.adj[from].push(forward_idx);

        self.edges.push(FlowEdge {
            to: from,
            cap: 0.0,
            flow: 0.0,
            rev: forward_idx,
        });
        self.adj[to].push(reverse_idx);

        forward_idx
    }

    fn residual(&self, edge_idx: usize) -> f64 {
        self.edges[edge_idx].cap - self.edges[edge_idx].flow
    }

    fn push_flow(&mut self, edge_idx: usize, amount: f64) {
        self.edges[edge_idx].flow += amount;
        let rev = self.edges[edge_idx].rev;
        self.edges[rev].flow -= amount;
    }

    pub fn flow_of(&self, edge_idx: usize) -> f64 {
        self.edges[edge_idx].flow
    }

    /// Sets an edge's capacity to zero, so it can no longer carry
    /// additional flow in future augmenting passes. Used to "remove" the
    /// super-source/sink edges and the circulation-closing edge between
    /// the feasibility and maximization passes (spec.md §4.2) without
    /// reallocating the arena.
    pub fn close_edge(&mut self, edge_idx: usize) {
        self.edges[edge_idx].cap = self.edges[edge_idx].flow.max(0.0);
    }

    /// One BFS shortest-augmenting-path step from `source` to `sink`,
    /// breaking ties by edge insertion order (adjacency lists are built in
    /// `add_edge` call order). Returns the bottleneck path edges, or
    /// `None` if `sink` is unreachable.
    fn find_augmenting_path(&self, source: usize, sink: usize) -> Option<Vec<usize>> {
        let n = self.num_nodes();
        let mut parent_edge: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        visited[source] = true;

        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            if u == sink {
                break;
            }
            for &edge_idx in &self.adj[u] {
                if self.residual(edge_idx) <= TOLERANCE {
                    continue;
                }
                let v = self.edges[edge_idx].to;
                if !visited[v] {
                    visited[v] = true;
                    parent_edge[v] = Some(edge_idx);
                    queue.push_back(v);
                }
            }
        }

        if !visited[sink] {
            return None;
        }

        let mut path = Vec::new();
        let mut current = sink;
        while current != source {
            let edge_idx = parent_edge[current].expect("reachable node has a parent edge");
            path.push(edge_idx);
            let rev = self.edges[edge_idx].rev;
            current = self.edges[rev].to;
        }
        path.reverse();
        Some(path)
    }

    /// Edmonds-Karp max flow from `source` to `sink`. Returns the total
    /// flow value pushed.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> f64 {
        let mut total = 0.0;
        while let Some(path) = self.find_augmenting_path(source, sink) {
            let bottleneck = path
                .iter()
                .map(|&e| self.residual(e))
                .fold(f64::INFINITY, f64::min);
            if bottleneck <= TOLERANCE {
                break;
            }
            for &edge_idx in &path {
                self.push_flow(edge_idx, bottleneck);
            }
            total += bottleneck;
        }
        total
    }

    /// The set of nodes reachable from `source` in the current residual
    /// graph — the reachable side of the minimum cut after a max-flow run
    /// that saturates `source`'s outgoing capacity (spec.md §4.2/§6.4).
    pub fn reachable_from(&self, source: usize) -> Vec<bool> {
        let n = self.num_nodes();
        let mut visited = vec![false; n];
        visited[source] = true;
        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &edge_idx in &self.adj[u] {
                if self.residual(edge_idx) <= TOLERANCE {
                    continue;
                }
                let v = self.edges[edge_idx].to;
                if !visited[v] {
                    visited[v] = true;
                    queue.push_back(v);
                }
            }
        }
        visited
    }

    /// Whether an edge's capacity is saturated (no residual headroom) in
    /// the current state — used to report tight nodes/edges.
    pub fn is_saturated(&self, edge_idx: usize) -> bool {
        self.residual(edge_idx) <= TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_edge_max_flow() {
        let mut net = FlowNetwork::new(2);
        net.add_edge(0, 1, 5.0);
        assert_eq!(net.max_flow(0, 1), 5.0);
    }

    #[test]
    fn bottlenecked_path() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 5.0);
        net.add_edge(1, 2, 3.0);
        assert_eq!(net.max_flow(0, 2), 3.0);
    }

    #[test]
    fn parallel_paths_sum() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 10.0);
        net.add_edge(1, 3, 10.0);
        net.add_edge(0, 2, 10.0);
        net.add_edge(2, 3, 10.0);
        assert_eq!(net.max_flow(0, 3), 20.0);
    }

    #[test]
    fn unreachable_sink_gives_zero_flow() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 5.0);
        assert_eq!(net.max_flow(0, 2), 0.0);
    }
}

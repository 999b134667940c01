use crate::belts::model::{BeltsProblem, Role, TOLERANCE};
use crate::belts::network::FlowNetwork;

const INFINITE_CAP: f64 = f64::INFINITY;

/// The node-split/lower-bound-eliminated network built from a
/// [`BeltsProblem`], plus enough bookkeeping to run both the feasibility
/// pass and the maximization pass and to map results back onto the
/// original nodes/edges (spec.md §3.2, §4.2).
pub struct Transform {
    pub net: FlowNetwork,
    in_idx: Vec<usize>,
    out_idx: Vec<usize>,
    node_cap_edge: Vec<Option<usize>>,
    origin_edge_idx: Vec<usize>,
    closing_edge: usize,
    s_star: usize,
    t_star: usize,
    s_star_edges: Vec<usize>,
    t_star_edges: Vec<usize>,
    pub total_excess_pos: f64,
    sink_pos: usize,
    source_positions: Vec<usize>,
}

impl Transform {
    pub fn build(problem: &BeltsProblem) -> Self {
        let n = problem.nodes.len();
        let mut net = FlowNetwork::new(n);

        let in_idx: Vec<usize> = (0..n).collect();
        let mut out_idx = in_idx.clone();
        let mut node_cap_edge = vec![None; n];

        for (pos, node) in problem.nodes.iter().enumerate() {
            if let Some(cap) = node.cap {
                let out = net.add_node();
                out_idx[pos] = out;
                let edge_idx = net.add_edge(in_idx[pos], out, cap);
                node_cap_edge[pos] = Some(edge_idx);
            }
        }

        let pos_by_id: std::collections::HashMap<&str, usize> = problem
            .nodes
            .iter()
            .enumerate()
            .map(|(pos, node)| (node.id.as_str(), pos))
            .collect();

        let mut excess = vec![0.0_f64; n];
        let mut origin_edge_idx = Vec::with_capacity(problem.edges.len());
        for edge in &problem.edges {
            let u = pos_by_id[edge.from.as_str()];
            let v = pos_by_id[edge.to.as_str()];
            let cap = edge.hi - edge.lo;
            let idx = net.add_edge(out_idx[u], in_idx[v], cap);
            origin_edge_idx.push(idx);
            excess[v] += edge.lo;
            excess[u] -= edge.lo;
        }

        let source_positions: Vec<usize> = problem
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.role == Role::Source)
            .map(|(pos, _)| pos)
            .collect();
        let sink_pos = problem
            .nodes
            .iter()
            .position(|node| node.role == Role::Sink)
            .expect("validated: exactly one sink node");

        let source_agg = net.add_node();
        for &s in &source_positions {
            net.add_edge(source_agg, in_idx[s], INFINITE_CAP);
        }
        let closing_edge = net.add_edge(out_idx[sink_pos], source_agg, INFINITE_CAP);

        let s_star = net.add_node();
        let t_star = net.add_node();
        let mut s_star_edges = Vec::new();
        let mut t_star_edges = Vec::new();
        let mut total_excess_pos = 0.0;
        for pos in 0..n {
            if excess[pos] > TOLERANCE {
                s_star_edges.push(net.add_edge(s_star, in_idx[pos], excess[pos]));
                total_excess_pos += excess[pos];
            } else if excess[pos] < -TOLERANCE {
                t_star_edges.push(net.add_edge(out_idx[pos], t_star, -excess[pos]));
            }
        }

        Self {
            net,
            in_idx,
            out_idx,
            node_cap_edge,
            origin_edge_idx,
            closing_edge,
            s_star,
            t_star,
            s_star_edges,
            t_star_edges,
            total_excess_pos,
            sink_pos,
            source_positions,
        }
    }

    /// Phase 1: max flow from `S*` to `T*`. Returns the flow value; the
    /// lower bounds are satisfiable iff it equals `total_excess_pos`
    /// within tolerance.
    pub fn run_feasibility(&mut self) -> f64 {
        self.net.max_flow(self.s_star, self.t_star)
    }

    pub fn is_feasible(&self, feasibility_flow: f64) -> bool {
        (feasibility_flow - self.total_excess_pos).abs() < TOLERANCE
    }

    /// Reachable-from-`S*` set in the post-feasibility residual graph,
    /// indexed by original node position — the reachable side of the
    /// minimum cut (spec.md §4.2/§6.4).
    pub fn cut_reachable(&self) -> Vec<bool> {
        let reachable = self.net.reachable_from(self.s_star);
        self.in_idx.iter().map(|&idx| reachable[idx]).collect()
    }

    pub fn tight_node_positions(&self) -> Vec<usize> {
        self.node_cap_edge
            .iter()
            .enumerate()
            .filter_map(|(pos, edge)| edge.filter(|&e| self.net.is_saturated(e)).map(|_| pos))
            .collect()
    }

    pub fn tight_edge_positions(&self) -> Vec<usize> {
        self.origin_edge_idx
            .iter()
            .enumerate()
            .filter(|(_, &edge_idx)| self.net.is_saturated(edge_idx))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Phase 2: closes `S*`, `T*`, and the circulation-closing edge so
    /// they can no longer carry flow, adds a fresh super-source/sink, and
    /// runs max flow between them on the same residual graph.
    pub fn run_maximization(&mut self) -> f64 {
        for &e in &self.s_star_edges {
            self.net.close_edge(e);
        }
        for &e in &self.t_star_edges {
            self.net.close_edge(e);
        }
        self.net.close_edge(self.closing_edge);

        let fresh_source = self.net.add_node();
        let fresh_sink = self.net.add_node();
        for &s in &self.source_positions {
            self.net.add_edge(fresh_source, self.in_idx[s], INFINITE_CAP);
        }
        self.net
            .add_edge(self.out_idx[self.sink_pos], fresh_sink, INFINITE_CAP);

        self.net.max_flow(fresh_source, fresh_sink)
    }

    /// Final recovered flow on the original edge at `edge_pos`, adding
    /// back its lower bound (spec.md §3.2 flow mapping).
    pub fn recovered_flow(&self, problem: &BeltsProblem, edge_pos: usize) -> f64 {
        let lo = problem.edges[edge_pos].lo;
        lo + self.net.flow_of(self.origin_edge_idx[edge_pos])
    }

    /// Total inflow at the original sink — reported as `max_flow_per_min`
    /// (spec.md §4.2: "Σ inflow(sink)").
    pub fn sink_inflow(&self, problem: &BeltsProblem) -> f64 {
        problem
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.to == problem.nodes[self.sink_pos].id)
            .map(|(pos, _)| self.recovered_flow(problem, pos))
            .sum()
    }
}

use log::{debug, info};

use crate::belts::model::BeltsProblem;
use crate::belts::output::{BeltsOutput, Deficit, Flow, TightEdge};
use crate::belts::transform::Transform;
use crate::error::PlanResult;

pub fn solve(problem: &BeltsProblem) -> PlanResult<BeltsOutput> {
    debug!(
        "belts model: {} nodes, {} edges",
        problem.nodes.len(),
        problem.edges.len()
    );

    let mut transform = Transform::build(problem);
    let feasibility_flow = transform.run_feasibility();

    if !transform.is_feasible(feasibility_flow) {
        info!("belts infeasible: demand_balance={}", transform.total_excess_pos - feasibility_flow);
        let mut cut_reachable: Vec<String> = transform
            .cut_reachable()
            .into_iter()
            .enumerate()
            .filter(|(_, reachable)| *reachable)
            .map(|(pos, _)| problem.nodes[pos].id.clone())
            .collect();
        cut_reachable.sort();

        let mut tight_nodes: Vec<String> = transform
            .tight_node_positions()
            .into_iter()
            .map(|pos| problem.nodes[pos].id.clone())
            .collect();
        tight_nodes.sort();

        let mut tight_edges: Vec<TightEdge> = transform
            .tight_edge_positions()
            .into_iter()
            .map(|pos| TightEdge {
                from: problem.edges[pos].from.clone(),
                to: problem.edges[pos].to.clone(),
            })
            .collect();
        tight_edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

        return Ok(BeltsOutput::Infeasible {
            cut_reachable,
            deficit: Deficit {
                demand_balance: transform.total_excess_pos - feasibility_flow,
                tight_nodes,
                tight_edges,
            },
        });
    }

    transform.run_maximization();

    let flows: Vec<Flow> = problem
        .edges
        .iter()
        .enumerate()
        .map(|(pos, edge)| Flow {
            from: edge.from.clone(),
            to: edge.to.clone(),
            flow: transform.recovered_flow(problem, pos),
        })
        .collect();
    let max_flow_per_min = transform.sink_inflow(problem);
    info!("belts solved: max_flow_per_min={max_flow_per_min}");

    Ok(BeltsOutput::Ok {
        max_flow_per_min,
        flows,
    })
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub from: String,
    pub to: String,
    pub flow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TightEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deficit {
    pub demand_balance: f64,
    pub tight_nodes: Vec<String>,
    pub tight_edges: Vec<TightEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum BeltsOutput {
    #[serde(rename = "ok")]
    Ok {
        max_flow_per_min: f64,
        flows: Vec<Flow>,
    },
    #[serde(rename = "infeasible")]
    Infeasible {
        cut_reachable: Vec<String>,
        deficit: Deficit,
    },
}

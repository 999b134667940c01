use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum FactoryOutput {
    #[serde(rename = "ok")]
    Ok {
        per_recipe_crafts_per_min: BTreeMap<String, f64>,
        per_machine_counts: BTreeMap<String, u64>,
        raw_consumption_per_min: BTreeMap<String, f64>,
    },
    #[serde(rename = "infeasible")]
    Infeasible {
        max_feasible_target: f64,
        bottlenecks: Vec<String>,
    },
}

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

pub const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Source,
    Sink,
    Internal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub cap: Option<f64>,
}

fn default_role() -> Role {
    Role::Internal
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BeltsProblem {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

impl BeltsProblem {
    pub fn parse(input: &str) -> PlanResult<Self> {
        let problem: BeltsProblem = serde_json::from_str(input)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn sources(&self) -> Vec<&NodeSpec> {
        self.nodes.iter().filter(|n| n.role == Role::Source).collect()
    }

    pub fn sink(&self) -> &NodeSpec {
        self.nodes
            .iter()
            .find(|n| n.role == Role::Sink)
            .expect("validated: exactly one sink node")
    }

    fn validate(&self) -> PlanResult<()> {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(PlanError::MalformedInput(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if let Some(cap) = node.cap {
                if cap < 0.0 {
                    return Err(PlanError::MalformedInput(format!(
                        "node '{}' has a negative cap",
                        node.id
                    )));
                }
            }
        }

        let sinks = self.nodes.iter().filter(|n| n.role == Role::Sink).count();
        if sinks != 1 {
            return Err(PlanError::MalformedInput(format!(
                "expected exactly one sink node, found {sinks}"
            )));
        }
        if self.sources().is_empty() {
            return Err(PlanError::MalformedInput("no source nodes".into()));
        }

        for edge in &self.edges {
            if !seen.contains(edge.from.as_str()) {
                return Err(PlanError::MalformedInput(format!(
                    "edge references undefined node '{}'",
                    edge.from
                )));
            }
            if !seen.contains(edge.to.as_str()) {
                return Err(PlanError::MalformedInput(format!(
                    "edge references undefined node '{}'",
                    edge.to
                )));
            }
            if edge.lo < 0.0 {
                return Err(PlanError::MalformedInput(format!(
                    "edge {}->{} has a negative lo",
                    edge.from, edge.to
                )));
            }
            if edge.hi < edge.lo {
                return Err(PlanError::MalformedInput(format!(
                    "edge {}->{} has hi < lo",
                    edge.from, edge.to
                )));
            }
        }

        Ok(())
    }
}

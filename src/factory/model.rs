use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

/// An opaque item identifier. The set of items is the union of everything
/// mentioned in recipes, the target, and the raw supply caps.
pub type Item = String;

/// Numeric tolerance used throughout the factory solver: anything smaller
/// in absolute value is treated as zero.
pub const TOLERANCE: f64 = 1e-9;

/// Whether productivity multiplies recipe outputs anywhere in the
/// accounting. The reference implementation parses `prod` but ignores it;
/// this is the resolution of the open question in spec.md §9.
pub const APPLY_PRODUCTIVITY: bool = false;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MachineClass {
    pub crafts_per_min: f64,
    pub max_machines: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ModuleLoadout {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub prod: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Recipe {
    pub machine: String,
    pub time_s: f64,
    #[serde(rename = "in", default)]
    pub inputs: HashMap<Item, f64>,
    #[serde(rename = "out", default)]
    pub outputs: HashMap<Item, f64>,
    pub modules: Option<ModuleLoadout>,
}

impl Recipe {
    /// Effective crafts per minute achievable by one machine of
    /// `machine_class` running this recipe, per spec.md §3.1/§9: the
    /// documented sample outputs match `crafts_per_min * (1 + speed) /
    /// time_s`, the simplified form of the source's formula after its
    /// spurious `*60/60` cancels.
    pub fn eff_crafts_per_min(&self, machine_class: &MachineClass) -> f64 {
        let speed = self.modules.map(|m| m.speed).unwrap_or(0.0);
        machine_class.crafts_per_min * (1.0 + speed) / self.time_s
    }

    pub fn output_of(&self, item: &str) -> f64 {
        let base = self.outputs.get(item).copied().unwrap_or(0.0);
        if APPLY_PRODUCTIVITY {
            let prod = self.modules.map(|m| m.prod).unwrap_or(0.0);
            base * (1.0 + prod)
        } else {
            base
        }
    }

    pub fn input_of(&self, item: &str) -> f64 {
        self.inputs.get(item).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Target {
    pub item: Item,
    pub rate_per_min: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FactoryProblem {
    pub target: Target,
    /// Keyed by machine class name in a `BTreeMap`, not `HashMap`: solved
    /// over in sorted order so `good_lp` variable/constraint indices are
    /// assigned identically on every run (spec.md §9: "pin iteration
    /// order everywhere").
    pub machines: BTreeMap<String, MachineClass>,
    /// Keyed by recipe name, sorted for the same reason as `machines`.
    pub recipes: BTreeMap<String, Recipe>,
    #[serde(default)]
    pub raw_supply_per_min: HashMap<Item, f64>,
}

impl FactoryProblem {
    pub fn parse(input: &str) -> PlanResult<Self> {
        let problem: FactoryProblem = serde_json::from_str(input)?;
        problem.validate()?;
        Ok(problem)
    }

    /// All items mentioned anywhere: recipe inputs/outputs, the target,
    /// and the raw caps (spec.md §3.1).
    pub fn items(&self) -> Vec<Item> {
        let mut items: std::collections::BTreeSet<Item> = std::collections::BTreeSet::new();
        for recipe in self.recipes.values() {
            items.extend(recipe.inputs.keys().cloned());
            items.extend(recipe.outputs.keys().cloned());
        }
        items.insert(self.target.item.clone());
        items.extend(self.raw_supply_per_min.keys().cloned());
        items.into_iter().collect()
    }

    fn validate(&self) -> PlanResult<()> {
        if self.target.rate_per_min <= 0.0 {
            return Err(PlanError::MalformedInput(
                "target rate_per_min must be positive".into(),
            ));
        }
        for (name, recipe) in &self.recipes {
            if !self.machines.contains_key(&recipe.machine) {
                return Err(PlanError::MalformedInput(format!(
                    "recipe '{name}' references undefined machine class '{}'",
                    recipe.machine
                )));
            }
            if recipe.time_s <= 0.0 {
                return Err(PlanError::MalformedInput(format!(
                    "recipe '{name}' has non-positive time_s"
                )));
            }
            if let Some(modules) = recipe.modules {
                if modules.speed < -1.0 {
                    return Err(PlanError::MalformedInput(format!(
                        "recipe '{name}' has module speed {} below the -1 floor",
                        modules.speed
                    )));
                }
                if modules.prod < 0.0 {
                    return Err(PlanError::MalformedInput(format!(
                        "recipe '{name}' has negative module prod {}",
                        modules.prod
                    )));
                }
            }
            if let Some(machine) = self.machines.get(&recipe.machine) {
                if recipe.eff_crafts_per_min(machine) <= 0.0 {
                    return Err(PlanError::MalformedInput(format!(
                        "recipe '{name}' has non-positive effective crafts per minute \
                         (module speed cancels out machine throughput)"
                    )));
                }
            }
            for (item, qty) in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if *qty < 0.0 {
                    return Err(PlanError::MalformedInput(format!(
                        "recipe '{name}' has a negative coefficient for '{item}'"
                    )));
                }
            }
        }
        if !self
            .recipes
            .values()
            .any(|r| r.outputs.contains_key(&self.target.item))
        {
            return Err(PlanError::MalformedInput(format!(
                "target item '{}' is not produced by any recipe",
                self.target.item
            )));
        }
        for (item, cap) in &self.raw_supply_per_min {
            if *cap < 0.0 {
                return Err(PlanError::MalformedInput(format!(
                    "raw supply cap for '{item}' is negative"
                )));
            }
        }
        for (class, machine) in &self.machines {
            if machine.crafts_per_min <= 0.0 {
                return Err(PlanError::MalformedInput(format!(
                    "machine class '{class}' has non-positive crafts_per_min"
                )));
            }
        }
        Ok(())
    }
}

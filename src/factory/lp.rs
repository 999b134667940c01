use std::collections::BTreeMap;

use good_lp::{constraint, microlp, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use log::{debug, warn};

use crate::error::{PlanError, PlanResult};
use crate::factory::model::{FactoryProblem, TOLERANCE};
use crate::factory::output::FactoryOutput;

/// Precomputed per-recipe effective rate, keyed by recipe name, sorted for
/// determinism (spec.md §9: pin iteration order everywhere).
fn effective_rates(problem: &FactoryProblem) -> BTreeMap<String, f64> {
    problem
        .recipes
        .iter()
        .map(|(name, recipe)| {
            let machine = &problem.machines[&recipe.machine];
            (name.clone(), recipe.eff_crafts_per_min(machine))
        })
        .collect()
}

/// One recipe variable per recipe, `x_r >= 0`, crafts per minute.
fn add_recipe_vars(
    vars: &mut ProblemVariables,
    problem: &FactoryProblem,
) -> BTreeMap<String, Variable> {
    problem
        .recipes
        .keys()
        .map(|name| {
            let v = vars.add(variable().min(0.0).name(name.clone()));
            (name.clone(), v)
        })
        .collect()
}

fn net_production_expr(
    item: &str,
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
) -> Expression {
    let mut expr = Expression::default();
    for (name, recipe) in &problem.recipes {
        expr += recipe_vars[name] * (recipe.output_of(item) - recipe.input_of(item));
    }
    expr
}

/// Net consumption (consumption minus production) of an item, used for
/// the raw-supply-cap inequality, built directly rather than negating a
/// `net_production_expr`.
fn raw_consumption_expr(
    item: &str,
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
) -> Expression {
    let mut expr = Expression::default();
    for (name, recipe) in &problem.recipes {
        expr += recipe_vars[name] * (recipe.input_of(item) - recipe.output_of(item));
    }
    expr
}

fn machines_used_expr(
    class: &str,
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
    eff: &BTreeMap<String, f64>,
) -> Expression {
    let mut expr = Expression::default();
    for (name, recipe) in &problem.recipes {
        if recipe.machine == class {
            expr += recipe_vars[name] * (1.0 / eff[name]);
        }
    }
    expr
}

fn total_machines_objective(
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
    eff: &BTreeMap<String, f64>,
) -> Expression {
    let mut expr = Expression::default();
    for name in problem.recipes.keys() {
        expr += recipe_vars[name] * (1.0 / eff[name]);
    }
    expr
}

/// Adds the conservation and machine-capacity constraints common to both
/// the primary and the infeasibility-fallback LPs (spec.md §4.1).
///
/// `target_constraint` lets the caller install the target item's equality
/// either against the fixed target rate (primary) or against a free `t`
/// (fallback).
fn add_shared_constraints<M: SolverModel>(
    model: &mut M,
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
    eff: &BTreeMap<String, f64>,
) {
    for item in problem.items() {
        if item == problem.target.item {
            continue;
        }
        if let Some(cap) = problem.raw_supply_per_min.get(&item) {
            let consumption = raw_consumption_expr(&item, problem, recipe_vars);
            model.add_constraint(constraint!(consumption <= *cap));
        } else {
            let net = net_production_expr(&item, problem, recipe_vars);
            model.add_constraint(constraint!(net == 0.0));
        }
    }

    for (class, machine) in &problem.machines {
        if let Some(max_machines) = machine.max_machines {
            let used = machines_used_expr(class, problem, recipe_vars, eff);
            model.add_constraint(constraint!(used <= max_machines as f64));
        }
    }
}

pub fn solve(problem: &FactoryProblem) -> PlanResult<FactoryOutput> {
    let eff = effective_rates(problem);
    debug!(
        "factory model: {} recipes, {} machine classes",
        problem.recipes.len(),
        problem.machines.len()
    );

    let mut vars = ProblemVariables::new();
    let recipe_vars = add_recipe_vars(&mut vars, problem);
    let objective = total_machines_objective(problem, &recipe_vars, &eff);
    let mut model = vars.minimise(objective.clone()).using(microlp);

    let target_net = net_production_expr(&problem.target.item, problem, &recipe_vars);
    model.add_constraint(constraint!(target_net == problem.target.rate_per_min));
    add_shared_constraints(&mut model, problem, &recipe_vars, &eff);

    match model.solve() {
        Ok(solution) => Ok(extract_ok(problem, &recipe_vars, &eff, &solution)),
        Err(err) => {
            warn!("factory LP infeasible at primary formulation: {err}");
            solve_fallback(problem, &eff)
        }
    }
}

/// spec.md §4.1 infeasibility fallback: replace the target's fixed-rate
/// equality with a free `t >= 0` and maximize `t`.
fn solve_fallback(problem: &FactoryProblem, eff: &BTreeMap<String, f64>) -> PlanResult<FactoryOutput> {
    let mut vars = ProblemVariables::new();
    let recipe_vars = add_recipe_vars(&mut vars, problem);
    let t = vars.add(variable().min(0.0).name("t"));

    let mut model = vars.maximise(t).using(microlp);

    let target_net = net_production_expr(&problem.target.item, problem, &recipe_vars);
    model.add_constraint(constraint!(target_net == t));
    add_shared_constraints(&mut model, problem, &recipe_vars, eff);

    let solution = model
        .solve()
        .map_err(|err| PlanError::SolverFailure(format!("fallback LP failed: {err}")))?;

    let max_feasible_target = solution.value(t).max(0.0);
    let bottlenecks = bottleneck_hints(problem, &recipe_vars, eff, &solution);

    Ok(FactoryOutput::Infeasible {
        max_feasible_target,
        bottlenecks,
    })
}

fn extract_ok(
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
    eff: &BTreeMap<String, f64>,
    solution: &impl Solution,
) -> FactoryOutput {
    let mut per_recipe_crafts_per_min = std::collections::BTreeMap::new();
    for (name, var) in recipe_vars {
        let value = solution.value(*var);
        if value.abs() > TOLERANCE {
            per_recipe_crafts_per_min.insert(name.clone(), value);
        }
    }

    let mut machine_load: BTreeMap<String, f64> = BTreeMap::new();
    for (name, recipe) in &problem.recipes {
        let crafts = solution.value(recipe_vars[name]);
        if crafts.abs() <= TOLERANCE {
            continue;
        }
        *machine_load.entry(recipe.machine.clone()).or_default() += crafts / eff[name];
    }
    let per_machine_counts = machine_load
        .into_iter()
        .map(|(class, used)| (class, used.ceil() as u64))
        .collect();

    let mut raw_consumption_per_min = BTreeMap::new();
    for item in problem.raw_supply_per_min.keys() {
        let consumption = solution.eval(raw_consumption_expr(item, problem, recipe_vars));
        if consumption.abs() > TOLERANCE {
            raw_consumption_per_min.insert(item.clone(), consumption);
        }
    }

    FactoryOutput::Ok {
        per_recipe_crafts_per_min,
        per_machine_counts,
        raw_consumption_per_min,
    }
}

/// Bottleneck hints: every binding inequality (machine cap or raw cap)
/// whose slack is below tolerance at the fallback optimum (spec.md §4.1).
fn bottleneck_hints(
    problem: &FactoryProblem,
    recipe_vars: &BTreeMap<String, Variable>,
    eff: &BTreeMap<String, f64>,
    solution: &impl Solution,
) -> Vec<String> {
    let mut hints = Vec::new();

    for (item, cap) in &problem.raw_supply_per_min {
        let consumption = solution.eval(raw_consumption_expr(item, problem, recipe_vars));
        if (cap - consumption).abs() < TOLERANCE {
            hints.push(format!("raw supply cap for '{item}' is binding"));
        }
    }

    for (class, machine) in &problem.machines {
        let Some(max_machines) = machine.max_machines else {
            continue;
        };
        let used_expr = machines_used_expr(class, problem, recipe_vars, eff);
        let used = solution.eval(used_expr);
        if (max_machines as f64 - used).abs() < TOLERANCE {
            hints.push(format!("machine cap for '{class}' is binding"));
        }
    }

    hints.sort();
    hints
}

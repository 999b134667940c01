use factory_planner::factory::output::FactoryOutput;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{a} != {b}");
}

/// S1 — trivial one-recipe factory (spec.md §8).
#[test]
fn trivial_one_recipe() {
    let input = r#"{
        "target": {"item": "iron", "rate_per_min": 60},
        "machines": {"furnace": {"crafts_per_min": 60, "max_machines": null}},
        "recipes": {
            "smelt": {"machine": "furnace", "time_s": 1,
                       "in": {"iron_ore": 1}, "out": {"iron": 1}}
        },
        "raw_supply_per_min": {"iron_ore": 1000}
    }"#;

    let output = factory_planner::factory::solve(input).unwrap();
    match output {
        FactoryOutput::Ok {
            per_recipe_crafts_per_min,
            per_machine_counts,
            raw_consumption_per_min,
        } => {
            assert_close(per_recipe_crafts_per_min["smelt"], 60.0);
            assert_eq!(per_machine_counts["furnace"], 1);
            assert_close(raw_consumption_per_min["iron_ore"], 60.0);
        }
        FactoryOutput::Infeasible { .. } => panic!("expected ok, got infeasible"),
    }
}

/// S2 — raw-cap infeasible (spec.md §8).
#[test]
fn raw_cap_infeasible() {
    let input = r#"{
        "target": {"item": "iron", "rate_per_min": 60},
        "machines": {"furnace": {"crafts_per_min": 60, "max_machines": null}},
        "recipes": {
            "smelt": {"machine": "furnace", "time_s": 1,
                       "in": {"iron_ore": 1}, "out": {"iron": 1}}
        },
        "raw_supply_per_min": {"iron_ore": 30}
    }"#;

    let output = factory_planner::factory::solve(input).unwrap();
    match output {
        FactoryOutput::Infeasible {
            max_feasible_target,
            bottlenecks,
        } => {
            assert_close(max_feasible_target, 30.0);
            assert!(bottlenecks.iter().any(|h| h.contains("iron_ore")));
        }
        FactoryOutput::Ok { .. } => panic!("expected infeasible, got ok"),
    }
}

/// S3 — chained recipes with an intermediate (spec.md §8).
#[test]
fn chained_recipes() {
    let input = r#"{
        "target": {"item": "gear", "rate_per_min": 10},
        "machines": {"press": {"crafts_per_min": 60, "max_machines": null}},
        "recipes": {
            "A": {"machine": "press", "time_s": 1,
                   "in": {"ore": 1}, "out": {"plate": 1}},
            "B": {"machine": "press", "time_s": 1,
                   "in": {"plate": 2}, "out": {"gear": 1}}
        },
        "raw_supply_per_min": {"ore": 1000000}
    }"#;

    let output = factory_planner::factory::solve(input).unwrap();
    match output {
        FactoryOutput::Ok {
            per_recipe_crafts_per_min,
            raw_consumption_per_min,
            ..
        } => {
            assert_close(per_recipe_crafts_per_min["A"], 20.0);
            assert_close(per_recipe_crafts_per_min["B"], 10.0);
            assert_close(raw_consumption_per_min["ore"], 20.0);
        }
        FactoryOutput::Infeasible { .. } => panic!("expected ok, got infeasible"),
    }
}

#[test]
fn malformed_input_is_rejected() {
    let err = factory_planner::factory::solve("{ not json").unwrap_err();
    assert!(err.to_string().contains("malformed input"));
}

#[test]
fn target_with_no_producer_is_malformed() {
    let input = r#"{
        "target": {"item": "widget", "rate_per_min": 1},
        "machines": {"m": {"crafts_per_min": 1, "max_machines": null}},
        "recipes": {}
    }"#;
    let err = factory_planner::factory::solve(input).unwrap_err();
    assert!(err.to_string().contains("widget"));
}

#[test]
fn round_trip_passes_verifier() {
    let input = r#"{
        "target": {"item": "gear", "rate_per_min": 10},
        "machines": {"press": {"crafts_per_min": 60, "max_machines": 5}},
        "recipes": {
            "A": {"machine": "press", "time_s": 1,
                   "in": {"ore": 1}, "out": {"plate": 1}},
            "B": {"machine": "press", "time_s": 1,
                   "in": {"plate": 2}, "out": {"gear": 1}}
        },
        "raw_supply_per_min": {"ore": 1000000}
    }"#;

    let problem = factory_planner::factory::model::FactoryProblem::parse(input).unwrap();
    let output = factory_planner::factory::lp::solve(&problem).unwrap();
    let violations = factory_planner::verify::verify_factory(&problem, &output);
    assert!(violations.is_empty(), "{violations:?}");
}

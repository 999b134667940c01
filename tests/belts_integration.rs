use factory_planner::belts::output::BeltsOutput;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{a} != {b}");
}

/// S4 — belts minimal (spec.md §8).
#[test]
fn minimal_source_sink() {
    let input = r#"{
        "nodes": [
            {"id": "s", "role": "source"},
            {"id": "t", "role": "sink"}
        ],
        "edges": [
            {"from": "s", "to": "t", "lo": 0, "hi": 5}
        ]
    }"#;

    let output = factory_planner::belts::solve(input).unwrap();
    match output {
        BeltsOutput::Ok { max_flow_per_min, .. } => assert_close(max_flow_per_min, 5.0),
        BeltsOutput::Infeasible { .. } => panic!("expected ok, got infeasible"),
    }
}

/// S5 — lower bound forcing infeasibility (spec.md §8).
#[test]
fn lower_bound_infeasible() {
    let input = r#"{
        "nodes": [
            {"id": "s", "role": "source"},
            {"id": "a", "role": "internal"},
            {"id": "t", "role": "sink"}
        ],
        "edges": [
            {"from": "s", "to": "a", "lo": 10, "hi": 10},
            {"from": "a", "to": "t", "lo": 0, "hi": 5}
        ]
    }"#;

    let output = factory_planner::belts::solve(input).unwrap();
    match output {
        BeltsOutput::Infeasible { deficit, .. } => {
            assert_close(deficit.demand_balance, 5.0);
            assert!(deficit
                .tight_edges
                .iter()
                .any(|e| e.from == "a" && e.to == "t"));
        }
        BeltsOutput::Ok { .. } => panic!("expected infeasible, got ok"),
    }
}

/// S6 — node cap (spec.md §8).
#[test]
fn node_cap_limits_flow() {
    let input = r#"{
        "nodes": [
            {"id": "s", "role": "source"},
            {"id": "m", "role": "internal", "cap": 3},
            {"id": "t", "role": "sink"}
        ],
        "edges": [
            {"from": "s", "to": "m", "lo": 0, "hi": 10},
            {"from": "m", "to": "t", "lo": 0, "hi": 10}
        ]
    }"#;

    let output = factory_planner::belts::solve(input).unwrap();
    match output {
        BeltsOutput::Ok { max_flow_per_min, .. } => assert_close(max_flow_per_min, 3.0),
        BeltsOutput::Infeasible { .. } => panic!("expected ok, got infeasible"),
    }
}

#[test]
fn malformed_input_is_rejected() {
    let err = factory_planner::belts::solve("{ not json").unwrap_err();
    assert!(err.to_string().contains("malformed input"));
}

#[test]
fn missing_sink_is_malformed() {
    let input = r#"{
        "nodes": [{"id": "s", "role": "source"}],
        "edges": []
    }"#;
    let err = factory_planner::belts::solve(input).unwrap_err();
    assert!(err.to_string().contains("sink"));
}

#[test]
fn round_trip_passes_verifier() {
    let input = r#"{
        "nodes": [
            {"id": "s", "role": "source"},
            {"id": "m", "role": "internal", "cap": 3},
            {"id": "t", "role": "sink"}
        ],
        "edges": [
            {"from": "s", "to": "m", "lo": 0, "hi": 10},
            {"from": "m", "to": "t", "lo": 0, "hi": 10}
        ]
    }"#;

    let problem = factory_planner::belts::model::BeltsProblem::parse(input).unwrap();
    let output = factory_planner::belts::solve::solve(&problem).unwrap();
    let violations = factory_planner::verify::verify_belts(&problem, &output);
    assert!(violations.is_empty(), "{violations:?}");
}

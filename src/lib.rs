//! Steady-state factory planning and bounded-flow belt planning.
//!
//! Two independent batch solvers, each a pure function from a JSON problem
//! document to a JSON solution document: [`factory`] is a linear-program
//! minimum-machine production planner, [`belts`] is a bounded-flow/max-flow
//! solver over a conveyor network. They share no state; the CLI entry
//! points live under `src/bin/`.

pub mod belts;
pub mod error;
pub mod factory;
pub mod verify;

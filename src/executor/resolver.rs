//! Dependency resolution
//!
//! Flattens test cases and their transitive dependencies into one
//! deduplicated execution order: depth-first, dependencies before dependents,
//! first discovery wins.

use std::collections::HashMap;

use crate::error::GradeError;
use crate::models::TestCase;

/// Resolve `tests` into execution order.
///
/// Dependency factories are invoked to build fresh instances; an instance
/// whose factory was already placed is dropped. A test that depends on
/// itself, directly or transitively, fails with [`GradeError::Cycle`]; two
/// different tests sharing a factory name fail with
/// [`GradeError::DuplicateTest`].
pub fn resolve(tests: Vec<TestCase>) -> Result<Vec<TestCase>, GradeError> {
    let mut order = Vec::new();
    let mut placed = HashMap::new();
    let mut resolving = Vec::new();

    for test in tests {
        place(test, &mut order, &mut placed, &mut resolving)?;
    }

    Ok(order)
}

fn place(
    test: TestCase,
    order: &mut Vec<TestCase>,
    placed: &mut HashMap<&'static str, usize>,
    resolving: &mut Vec<&'static str>,
) -> Result<(), GradeError> {
    if resolving.contains(&test.id()) {
        return Err(GradeError::Cycle(test.description().to_string()));
    }

    resolving.push(test.id());
    for factory in test.dependencies() {
        place(factory.create(), order, placed, resolving)?;
    }
    resolving.pop();

    match placed.get(test.id()).copied() {
        Some(index) if order[index].same_declaration(&test) => {}
        Some(_) => return Err(GradeError::DuplicateTest(test.id().to_string())),
        None => {
            placed.insert(test.id(), order.len());
            order.push(test);
        }
    }
    Ok(())
}

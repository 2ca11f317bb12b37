//! Advisory overload detection

use tracing::debug;

use super::plan::EPSILON;
use crate::domain::{ResourceRow, TaskRow};

/// Summed task demand per week on the resource's function
pub fn resource_load(resource: &ResourceRow, tasks: &[TaskRow]) -> Vec<f64> {
    debug!(resource_id = %resource.id, "resource_load: called");
    let mut load = vec![0.0; resource.weeks.len()];
    for task in tasks.iter().filter(|t| t.function == resource.function) {
        for (week, slot) in load.iter_mut().enumerate() {
            *slot += task.allocation(week);
        }
    }
    load
}

/// Whether demand on the resource's function exceeds its availability
pub fn compute_overload(resource: &ResourceRow, tasks: &[TaskRow], week: usize) -> bool {
    let demand: f64 = tasks
        .iter()
        .filter(|t| t.function == resource.function)
        .map(|t| t.allocation(week))
        .sum();
    let overloaded = demand > resource.availability(week) + EPSILON;
    debug!(resource_id = %resource.id, week, demand, overloaded, "compute_overload: called");
    overloaded
}

/// Overload flag for every week of the resource
pub fn overload_weeks(resource: &ResourceRow, tasks: &[TaskRow]) -> Vec<bool> {
    debug!(resource_id = %resource.id, "overload_weeks: called");
    resource_load(resource, tasks)
        .into_iter()
        .enumerate()
        .map(|(week, load)| load > resource.availability(week) + EPSILON)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_sums_same_function_only() {
        let resource = ResourceRow::with_id("r1", "BE", 3).with_weeks(vec![1.0, 1.0, 0.0]);
        let tasks = vec![
            TaskRow::with_id("a", "A", "BE", 3).with_manual_weeks(vec![0.5, 1.0, 0.0]),
            TaskRow::with_id("b", "B", "BE", 3).with_manual_weeks(vec![0.5, 0.5, 0.0]),
            TaskRow::with_id("c", "C", "QA", 3).with_manual_weeks(vec![5.0, 5.0, 5.0]),
        ];

        assert!(!compute_overload(&resource, &tasks, 0));
        assert!(compute_overload(&resource, &tasks, 1));
        assert!(!compute_overload(&resource, &tasks, 2));
        assert_eq!(resource_load(&resource, &tasks), vec![1.0, 1.5, 0.0]);
        assert_eq!(overload_weeks(&resource, &tasks), vec![false, true, false]);
    }

    #[test]
    fn test_out_of_range_week_not_overloaded() {
        let resource = ResourceRow::with_id("r1", "BE", 2).with_capacity(1.0);
        assert!(!compute_overload(&resource, &[], 7));
    }
}

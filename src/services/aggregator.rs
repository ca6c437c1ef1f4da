//! Submission counting over a course's tasks and students.
//!
//! Pure functions; student lists keep the caller's order, which the
//! repository returns as creation order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Student, SubmissionKey, Task};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmissionCount {
    pub task_id: String,
    pub title: String,
    pub is_done: bool,
    /// Distinct students with at least one submission.
    pub submitted: usize,
    pub total_students: usize,
}

fn distinct_submitters<'a>(keys: &'a [SubmissionKey]) -> HashMap<&'a str, HashSet<&'a str>> {
    let mut by_task: HashMap<&str, HashSet<&str>> = HashMap::new();
    for key in keys {
        by_task
            .entry(key.task_id.as_str())
            .or_default()
            .insert(key.student_id.as_str());
    }
    by_task
}

/// One entry per task, in task order; tasks without submissions report 0.
pub fn submission_counts(
    tasks: &[Task],
    students: &[Student],
    keys: &[SubmissionKey],
) -> Vec<TaskSubmissionCount> {
    let by_task = distinct_submitters(keys);
    tasks
        .iter()
        .map(|task| TaskSubmissionCount {
            task_id: task.id.clone(),
            title: task.title.clone(),
            is_done: task.is_done,
            submitted: by_task.get(task.id.as_str()).map_or(0, HashSet::len),
            total_students: students.len(),
        })
        .collect()
}

/// Students with no submission to `task_id`.
pub fn missing<'a>(task_id: &str, students: &'a [Student], keys: &[SubmissionKey]) -> Vec<&'a Student> {
    let by_task = distinct_submitters(keys);
    let submitted = by_task.get(task_id);
    students
        .iter()
        .filter(|s| submitted.is_none_or(|ids| !ids.contains(s.id.as_str())))
        .collect()
}

/// Students with at least one submission to `task_id`, each listed once.
pub fn to_grade<'a>(task_id: &str, students: &'a [Student], keys: &[SubmissionKey]) -> Vec<&'a Student> {
    let by_task = distinct_submitters(keys);
    let Some(submitted) = by_task.get(task_id) else {
        return Vec::new();
    };
    students
        .iter()
        .filter(|s| submitted.contains(s.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            course_id: "c".to_string(),
            title: format!("Task {id}"),
            text: None,
            due_date: None,
            max_score: None,
            is_done: false,
            is_visible: true,
            created_at: String::new(),
        }
    }

    fn student(id: &str) -> Student {
        Student {
            id: id.to_string(),
            course_id: "c".to_string(),
            alias: format!("alias-{id}"),
            name: format!("Participant_{id}"),
            email: None,
            last_seen: None,
            created_at: String::new(),
        }
    }

    fn key(task_id: &str, student_id: &str) -> SubmissionKey {
        SubmissionKey {
            task_id: task_id.to_string(),
            student_id: student_id.to_string(),
        }
    }

    fn ids(students: &[&Student]) -> Vec<String> {
        students.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_repeat_submissions_count_once() {
        let tasks = vec![task("t")];
        let students = vec![student("a"), student("b"), student("c")];
        let keys = vec![key("t", "a"), key("t", "a"), key("t", "b")];

        let counts = submission_counts(&tasks, &students, &keys);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].submitted, 2);
        assert_eq!(counts[0].total_students, 3);
    }

    #[test]
    fn test_missing_students() {
        let students = vec![student("a"), student("b"), student("c")];
        let keys = vec![key("t", "a")];

        assert_eq!(ids(&missing("t", &students, &keys)), vec!["b", "c"]);
        assert_eq!(ids(&to_grade("t", &students, &keys)), vec!["a"]);
    }

    #[test]
    fn test_task_without_submissions() {
        let tasks = vec![task("t1"), task("t2")];
        let students = vec![student("a"), student("b")];
        let keys = vec![key("t1", "b")];

        let counts = submission_counts(&tasks, &students, &keys);
        assert_eq!(counts[1].task_id, "t2");
        assert_eq!(counts[1].submitted, 0);
        assert_eq!(ids(&missing("t2", &students, &keys)), vec!["a", "b"]);
        assert!(to_grade("t2", &students, &keys).is_empty());
    }

    #[test]
    fn test_to_grade_keeps_creation_order() {
        let students = vec![student("z"), student("m"), student("a")];
        let keys = vec![key("t", "a"), key("t", "z"), key("t", "a")];

        assert_eq!(ids(&to_grade("t", &students, &keys)), vec!["z", "a"]);
    }
}

//! Property-based tests for the task models.

mod common;

use common::strategies::{optional_field_strategy, required_field_strategy, task_type_strategy};
use compute_engine::models::{Task, TaskSubmission};
use compute_engine::EngineError;
use proptest::prelude::*;
use std::collections::HashSet;

fn expected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

proptest! {
    #[test]
    fn test_task_never_stores_empty_optionals(
        organization_id in required_field_strategy(),
        uuid in required_field_strategy(),
        task_type in task_type_strategy(),
        component_uuid in optional_field_strategy(),
        component_key in optional_field_strategy(),
        component_name in optional_field_strategy(),
        submitter_login in optional_field_strategy(),
    ) {
        let task = Task::builder()
            .organization_id(organization_id.clone())
            .uuid(uuid.clone())
            .task_type(task_type.clone())
            .component_uuid(component_uuid.clone())
            .component_key(component_key.clone())
            .component_name(component_name.clone())
            .submitter_login(submitter_login.clone())
            .build()
            .unwrap();

        prop_assert_eq!(task.organization_id(), organization_id.as_str());
        prop_assert_eq!(task.uuid(), uuid.as_str());
        prop_assert_eq!(task.task_type(), task_type.as_str());
        prop_assert_eq!(task.component_uuid(), expected(&component_uuid));
        prop_assert_eq!(task.component_key(), expected(&component_key));
        prop_assert_eq!(task.component_name(), expected(&component_name));
        prop_assert_eq!(task.submitter_login(), expected(&submitter_login));
    }

    #[test]
    fn test_submission_never_stores_empty_optionals(
        uuid in required_field_strategy(),
        task_type in task_type_strategy(),
        component_uuid in optional_field_strategy(),
        submitter_login in optional_field_strategy(),
    ) {
        let submission = TaskSubmission::builder(uuid.clone())
            .task_type(task_type.clone())
            .component_uuid(component_uuid.clone())
            .submitter_login(submitter_login.clone())
            .build()
            .unwrap();

        prop_assert_eq!(submission.uuid(), uuid.as_str());
        prop_assert_eq!(submission.task_type(), task_type.as_str());
        prop_assert_eq!(submission.component_uuid(), expected(&component_uuid));
        prop_assert_eq!(submission.submitter_login(), expected(&submitter_login));
    }

    #[test]
    fn test_task_identity_is_the_uuid(
        uuid in required_field_strategy(),
        first_type in task_type_strategy(),
        second_type in task_type_strategy(),
        first_org in required_field_strategy(),
        second_org in required_field_strategy(),
        component_key in optional_field_strategy(),
    ) {
        let first = Task::builder()
            .organization_id(first_org)
            .uuid(uuid.clone())
            .task_type(first_type)
            .component_key(component_key)
            .build()
            .unwrap();
        let second = Task::builder()
            .organization_id(second_org)
            .uuid(uuid)
            .task_type(second_type)
            .build()
            .unwrap();

        prop_assert_eq!(&first, &second);
        let set: HashSet<Task> = [first, second].into_iter().collect();
        prop_assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_task_type_is_always_rejected(
        uuid in required_field_strategy(),
        component_uuid in optional_field_strategy(),
    ) {
        let result = TaskSubmission::builder(uuid)
            .task_type("")
            .component_uuid(component_uuid)
            .build();

        prop_assert!(matches!(
            result,
            Err(EngineError::ValidationError(ref m)) if m == "task_type can't be null nor empty"
        ));
    }
}

//! # Task Model
//!
//! Immutable record of one accepted unit of background work, plus the
//! submission request it is created from.
//!
//! Both builders validate required fields in a fixed order and normalize
//! optional strings: an empty string is stored as `None`, never as `""`.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// An accepted task.
///
/// Identity is the `uuid`: equality and hashing ignore every other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    organization_id: String,
    uuid: String,
    task_type: String,
    component_uuid: Option<String>,
    component_key: Option<String>,
    component_name: Option<String>,
    submitter_login: Option<String>,
}

impl Task {
    pub fn builder() -> TaskBuilder {
        TaskBuilder::default()
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn component_uuid(&self) -> Option<&str> {
        self.component_uuid.as_deref()
    }

    pub fn component_key(&self) -> Option<&str> {
        self.component_key.as_deref()
    }

    pub fn component_name(&self) -> Option<&str> {
        self.component_name.as_deref()
    }

    pub fn submitter_login(&self) -> Option<&str> {
        self.submitter_login.as_deref()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    organization_id: Option<String>,
    uuid: Option<String>,
    task_type: Option<String>,
    component_uuid: Option<String>,
    component_key: Option<String>,
    component_name: Option<String>,
    submitter_login: Option<String>,
}

impl TaskBuilder {
    pub fn organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn component_uuid<S: Into<String>>(mut self, component_uuid: Option<S>) -> Self {
        self.component_uuid = component_uuid.map(Into::into);
        self
    }

    pub fn component_key<S: Into<String>>(mut self, component_key: Option<S>) -> Self {
        self.component_key = component_key.map(Into::into);
        self
    }

    pub fn component_name<S: Into<String>>(mut self, component_name: Option<S>) -> Self {
        self.component_name = component_name.map(Into::into);
        self
    }

    pub fn submitter_login<S: Into<String>>(mut self, submitter_login: Option<S>) -> Self {
        self.submitter_login = submitter_login.map(Into::into);
        self
    }

    /// Validates `organization_id`, `uuid` then `task_type`, failing on the first missing one
    pub fn build(self) -> EngineResult<Task> {
        Ok(Task {
            organization_id: require("organization_id", self.organization_id)?,
            uuid: require("uuid", self.uuid)?,
            task_type: require("task_type", self.task_type)?,
            component_uuid: normalize(self.component_uuid),
            component_key: normalize(self.component_key),
            component_name: normalize(self.component_name),
            submitter_login: normalize(self.submitter_login),
        })
    }
}

/// A request to enqueue one task, consumed by `TaskQueue::submit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmission {
    uuid: String,
    task_type: String,
    component_uuid: Option<String>,
    submitter_login: Option<String>,
}

impl TaskSubmission {
    pub fn builder(uuid: impl Into<String>) -> TaskSubmissionBuilder {
        TaskSubmissionBuilder {
            uuid: Some(uuid.into()),
            ..TaskSubmissionBuilder::default()
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn component_uuid(&self) -> Option<&str> {
        self.component_uuid.as_deref()
    }

    pub fn submitter_login(&self) -> Option<&str> {
        self.submitter_login.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskSubmissionBuilder {
    uuid: Option<String>,
    task_type: Option<String>,
    component_uuid: Option<String>,
    submitter_login: Option<String>,
}

impl TaskSubmissionBuilder {
    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn component_uuid<S: Into<String>>(mut self, component_uuid: Option<S>) -> Self {
        self.component_uuid = component_uuid.map(Into::into);
        self
    }

    pub fn submitter_login<S: Into<String>>(mut self, submitter_login: Option<S>) -> Self {
        self.submitter_login = submitter_login.map(Into::into);
        self
    }

    pub fn build(self) -> EngineResult<TaskSubmission> {
        Ok(TaskSubmission {
            uuid: require("uuid", self.uuid)?,
            task_type: require("task_type", self.task_type)?,
            component_uuid: normalize(self.component_uuid),
            submitter_login: normalize(self.submitter_login),
        })
    }
}

fn require(field: &str, value: Option<String>) -> EngineResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(EngineError::validation(format!("{field} can't be null nor empty"))),
    }
}

pub(crate) fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

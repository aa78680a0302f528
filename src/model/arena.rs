//! Per-compilation resource arena.
//!
//! Resources live in one growable vector and refer to each other through
//! [`ResourceId`]. Everything is freed together when the arena is dropped.

use crate::error::{CompileError, CompileResult};
use crate::model::resource::Resource;
use serde::Serialize;

/// Handle of a resource inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arena {
    resources: Vec<Resource>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, resource: Resource) -> CompileResult<ResourceId> {
        let what = resource.kind_name();
        self.resources
            .try_reserve(1)
            .map_err(|_| CompileError::Allocation { what })?;
        let id = u32::try_from(self.resources.len()).map_err(|_| CompileError::Allocation { what })?;
        self.resources.push(resource);
        Ok(ResourceId(id))
    }

    pub fn get(&self, id: ResourceId) -> CompileResult<&Resource> {
        self.resources
            .get(id.index())
            .ok_or_else(|| CompileError::Internal(format!("dangling resource handle {}", id.0)))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i as u32), r))
    }
}

/// Ordered, deduplicated list of resources to build for one endpoint.
///
/// Cloning copies the list itself; the handles keep pointing at the same
/// shared resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobList(Vec<ResourceId>);

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already scheduled.
    pub fn push(&mut self, id: ResourceId) {
        if !self.0.contains(&id) {
            self.0.push(id);
        }
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.0.contains(&id)
    }

    pub fn as_slice(&self) -> &[ResourceId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

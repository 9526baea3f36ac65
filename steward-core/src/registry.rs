// steward-core/src/registry.rs

//! Name-keyed tool registry.
//!
//! A [`ToolSpec`] couples the schema the model sees with the handler that runs
//! locally. The registry is filled once when the agent is built and is never
//! mutated afterwards.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::AgentError;
use crate::models::tools::{ToolDefinition, ToolInput, ToolParametersDefinition};

/// Executes one tool with already validated arguments.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: ToolInput) -> Result<String>;
}

/// Adapts a synchronous closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(ToolInput) -> Result<String> + Send + Sync,
{
    async fn call(&self, input: ToolInput) -> Result<String> {
        (self.0)(input)
    }
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(ToolInput) -> Result<String> + Send + Sync,
{
    FnHandler(f)
}

/// A tool the model may call.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: ToolParametersDefinition,
    pub requires_approval: bool,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("requires_approval", &self.requires_approval)
            .finish_non_exhaustive()
    }
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParametersDefinition,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            requires_approval: false,
            handler: Arc::new(handler),
        }
    }

    /// Marks the tool as sensitive: the approval gate is consulted before
    /// every execution.
    pub fn requiring_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// The part of the spec the model is allowed to see.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(specs: Vec<ToolSpec>) -> Result<Self, AgentError> {
        let mut index = HashMap::with_capacity(specs.len());
        for (position, spec) in specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(AgentError::config("Tool name must not be empty"));
            }
            if index.insert(spec.name.clone(), position).is_some() {
                return Err(AgentError::config(format!(
                    "Tool '{}' is registered more than once",
                    spec.name
                )));
            }
        }
        Ok(Self { specs, index })
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Schemas for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.specs.iter().map(ToolSpec::definition).collect()
    }
}

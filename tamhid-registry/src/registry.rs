//! Definition registry — the keyed store of component definitions.
//!
//! The registry maps unique names to [`ComponentDefinition`]s during the
//! bootstrap pass and is consumed later by the instantiation engine. It is
//! owned exclusively by the bootstrap caller and passed by `&mut` through
//! the registration pipeline; no locking is involved.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::definition::{ComponentDefinition, DefinitionHolder};
use crate::error::{DuplicateDefinitionError, Result};
use crate::metadata::{ORDER_ANNOTATION, attributes_for};

/// Keyed store of component definitions.
///
/// Names are unique: registering under a taken name fails rather than
/// overwriting. Callers that want insert-if-absent semantics check
/// [`contains_definition`](DefinitionRegistry::contains_definition) first —
/// that is the whole idempotence protocol of the infrastructure registrar.
pub trait DefinitionRegistry {
    /// Returns `true` if a definition is registered under the name.
    fn contains_definition(&self, name: &str) -> bool;

    /// Registers a definition under a unique name.
    ///
    /// # Errors
    /// Returns [`TamhidError::DuplicateDefinition`] if the name is taken.
    ///
    /// [`TamhidError::DuplicateDefinition`]: crate::error::TamhidError::DuplicateDefinition
    fn register_definition(&mut self, name: &str, definition: ComponentDefinition) -> Result<()>;

    /// Looks up a definition by name.
    fn definition(&self, name: &str) -> Option<&ComponentDefinition>;

    /// All registered names, in registration order.
    fn definition_names(&self) -> Vec<&str>;

    /// Number of registered definitions.
    fn len(&self) -> usize;

    /// Returns `true` if no definitions are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The registry's configurable extension, if it has one.
    ///
    /// Registries without ordering/autowiring slots return `None` and the
    /// infrastructure registrar skips slot setup for them.
    fn as_configurable(&mut self) -> Option<&mut dyn ConfigurableRegistry> {
        None
    }
}

/// Mutable configuration slots some registries expose.
///
/// The registrar sets each slot once, and only when it does not already
/// hold the annotation-aware implementation.
pub trait ConfigurableRegistry {
    /// The comparator used to order dependency candidates.
    fn dependency_comparator(&self) -> Option<&Arc<dyn DependencyComparator>>;

    fn set_dependency_comparator(&mut self, comparator: Arc<dyn DependencyComparator>);

    /// The resolver deciding which definitions participate in autowiring.
    fn autowire_candidate_resolver(&self) -> Option<&Arc<dyn AutowireCandidateResolver>>;

    fn set_autowire_candidate_resolver(&mut self, resolver: Arc<dyn AutowireCandidateResolver>);
}

/// Orders component definitions for dependency-candidate selection.
pub trait DependencyComparator: Send + Sync {
    fn compare(&self, a: &ComponentDefinition, b: &ComponentDefinition) -> Ordering;

    /// Downcast access, used for "is the slot already the right kind" checks.
    fn as_any(&self) -> &dyn Any;
}

/// Decides whether a definition participates in autowiring.
pub trait AutowireCandidateResolver: Send + Sync {
    fn is_autowire_candidate(&self, holder: &DefinitionHolder) -> bool;

    /// Downcast access, used for "is the slot already the right kind" checks.
    fn as_any(&self) -> &dyn Any;
}

/// Annotation-aware dependency comparator.
///
/// Orders definitions by the integer `value` of the order annotation on
/// their intrinsic metadata; definitions without a readable order sort last,
/// ties compare equal.
#[derive(Debug, Default)]
pub struct PriorityOrderComparator;

static PRIORITY_ORDER_COMPARATOR: Lazy<Arc<PriorityOrderComparator>> =
    Lazy::new(|| Arc::new(PriorityOrderComparator));

impl PriorityOrderComparator {
    /// The shared instance installed into registry slots.
    pub fn shared() -> Arc<PriorityOrderComparator> {
        Arc::clone(&PRIORITY_ORDER_COMPARATOR)
    }

    fn order_value(definition: &ComponentDefinition) -> i64 {
        definition
            .metadata()
            .and_then(|metadata| attributes_for(metadata.as_ref(), ORDER_ANNOTATION))
            // an unreadable order sorts last, same as a missing one
            .and_then(|attributes| attributes.get_int("value").ok().flatten())
            .unwrap_or(i64::MAX)
    }
}

impl DependencyComparator for PriorityOrderComparator {
    fn compare(&self, a: &ComponentDefinition, b: &ComponentDefinition) -> Ordering {
        Self::order_value(a).cmp(&Self::order_value(b))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Context-aware autowire candidate resolver.
///
/// Reports a holder as a candidate from the definition's own
/// autowire-candidate flag.
#[derive(Debug, Default)]
pub struct ContextAwareCandidateResolver;

impl AutowireCandidateResolver for ContextAwareCandidateResolver {
    fn is_autowire_candidate(&self, holder: &DefinitionHolder) -> bool {
        holder.definition().autowire_candidate()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Insertion-ordered in-memory [`DefinitionRegistry`] with configuration
/// slots.
///
/// This is the registry a standalone bootstrap uses; embedding containers
/// may bring their own implementation of the traits instead.
#[derive(Default)]
pub struct StandardDefinitionRegistry {
    definitions: HashMap<String, ComponentDefinition>,
    names: Vec<String>,
    dependency_comparator: Option<Arc<dyn DependencyComparator>>,
    autowire_candidate_resolver: Option<Arc<dyn AutowireCandidateResolver>>,
}

impl StandardDefinitionRegistry {
    /// Creates an empty registry with unset slots.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DefinitionRegistry for StandardDefinitionRegistry {
    fn contains_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    fn register_definition(&mut self, name: &str, definition: ComponentDefinition) -> Result<()> {
        if let Some(existing) = self.definitions.get(name) {
            return Err(DuplicateDefinitionError {
                name: name.to_string(),
                existing: existing.descriptor().to_string(),
                refused: definition.descriptor().to_string(),
            }
            .into());
        }

        debug!(name, descriptor = definition.descriptor(), "Registered definition");
        self.names.push(name.to_string());
        self.definitions.insert(name.to_string(), definition);
        Ok(())
    }

    fn definition(&self, name: &str) -> Option<&ComponentDefinition> {
        self.definitions.get(name)
    }

    fn definition_names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    fn len(&self) -> usize {
        self.definitions.len()
    }

    fn as_configurable(&mut self) -> Option<&mut dyn ConfigurableRegistry> {
        Some(self)
    }
}

impl ConfigurableRegistry for StandardDefinitionRegistry {
    fn dependency_comparator(&self) -> Option<&Arc<dyn DependencyComparator>> {
        self.dependency_comparator.as_ref()
    }

    fn set_dependency_comparator(&mut self, comparator: Arc<dyn DependencyComparator>) {
        debug!("Installed dependency comparator");
        self.dependency_comparator = Some(comparator);
    }

    fn autowire_candidate_resolver(&self) -> Option<&Arc<dyn AutowireCandidateResolver>> {
        self.autowire_candidate_resolver.as_ref()
    }

    fn set_autowire_candidate_resolver(&mut self, resolver: Arc<dyn AutowireCandidateResolver>) {
        debug!("Installed autowire candidate resolver");
        self.autowire_candidate_resolver = Some(resolver);
    }
}

impl std::fmt::Debug for StandardDefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardDefinitionRegistry")
            .field("registered", &self.names.len())
            .field("dependency_comparator", &self.dependency_comparator.is_some())
            .field(
                "autowire_candidate_resolver",
                &self.autowire_candidate_resolver.is_some(),
            )
            .finish()
    }
}

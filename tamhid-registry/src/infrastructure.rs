//! Infrastructure processor registration.
//!
//! Every container refresh starts by seeding the registry with the
//! definitions of the framework's own processors: the components that later
//! interpret configuration classes, autowiring annotations and event
//! listeners. Seeding is idempotent — a name that already exists is left
//! untouched, so user customization under a well-known name survives.
//!
//! Optional processors are gated by runtime capabilities. The probing is
//! hoisted into [`ResolvedCapabilities::detect`], resolved once per
//! bootstrap; the registrar itself only consumes the resolved flags.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use tamhid_support::rendering::render_name_list;

use crate::definition::{ComponentDefinition, DefinitionHolder, Role, Source};
use crate::error::{CapabilityLoadError, Result};
use crate::registry::{ContextAwareCandidateResolver, DefinitionRegistry, PriorityOrderComparator};

/// Well-known name of the configuration-class processor definition.
pub const CONFIGURATION_PROCESSOR: &str = "tamhid.internal.configuration-class-processor";

/// Well-known name of the autowired-annotation processor definition.
pub const AUTOWIRED_PROCESSOR: &str = "tamhid.internal.autowired-annotation-processor";

/// Well-known name of the required-attribute validation processor definition.
pub const REQUIRED_PROCESSOR: &str = "tamhid.internal.required-attribute-processor";

/// Well-known name of the resource-annotation processor definition,
/// present only when the common-annotations capability is available.
pub const RESOURCE_PROCESSOR: &str = "tamhid.internal.resource-annotation-processor";

/// Well-known name of the persistence-annotation processor definition,
/// present only when the persistence capability is available.
pub const PERSISTENCE_PROCESSOR: &str = "tamhid.internal.persistence-annotation-processor";

/// Well-known name of the event-listener method processor definition.
pub const EVENT_LISTENER_PROCESSOR: &str = "tamhid.internal.event-listener-processor";

/// Well-known name of the event-listener factory definition.
pub const EVENT_LISTENER_FACTORY: &str = "tamhid.internal.event-listener-factory";

/// Marker type whose presence enables the resource-annotation processor.
pub const RESOURCE_ANNOTATION_TYPE: &str = "tamhid_resource::Resource";

/// Marker type half of the persistence double gate.
pub const PERSISTENCE_MARKER_TYPE: &str = "tamhid_persistence::PersistenceContext";

/// Implementation type half of the persistence double gate.
pub const PERSISTENCE_PROCESSOR_TYPE: &str = "tamhid_persistence::PersistenceAnnotationProcessor";

const CONFIGURATION_PROCESSOR_TYPE: &str = "tamhid_processing::ConfigurationClassProcessor";
const AUTOWIRED_PROCESSOR_TYPE: &str = "tamhid_processing::AutowiredAnnotationProcessor";
const REQUIRED_PROCESSOR_TYPE: &str = "tamhid_processing::RequiredAttributeProcessor";
const RESOURCE_PROCESSOR_TYPE: &str = "tamhid_processing::ResourceAnnotationProcessor";
const EVENT_LISTENER_PROCESSOR_TYPE: &str = "tamhid_events::EventListenerMethodProcessor";
const EVENT_LISTENER_FACTORY_TYPE: &str = "tamhid_events::DefaultEventListenerFactory";

/// Capability a catalog entry needs before it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    Always,
    CommonAnnotations,
}

/// One entry of the fixed processor catalog.
#[derive(Debug, Clone, Copy)]
struct CatalogEntry {
    name: &'static str,
    descriptor: &'static str,
    requires: Requirement,
}

/// The fixed catalog, in registration order. The order is part of the
/// contract: it is identical on every call.
const FIXED_CATALOG: [CatalogEntry; 6] = [
    CatalogEntry {
        name: CONFIGURATION_PROCESSOR,
        descriptor: CONFIGURATION_PROCESSOR_TYPE,
        requires: Requirement::Always,
    },
    CatalogEntry {
        name: AUTOWIRED_PROCESSOR,
        descriptor: AUTOWIRED_PROCESSOR_TYPE,
        requires: Requirement::Always,
    },
    CatalogEntry {
        name: REQUIRED_PROCESSOR,
        descriptor: REQUIRED_PROCESSOR_TYPE,
        requires: Requirement::Always,
    },
    CatalogEntry {
        name: RESOURCE_PROCESSOR,
        descriptor: RESOURCE_PROCESSOR_TYPE,
        requires: Requirement::CommonAnnotations,
    },
    CatalogEntry {
        name: EVENT_LISTENER_PROCESSOR,
        descriptor: EVENT_LISTENER_PROCESSOR_TYPE,
        requires: Requirement::Always,
    },
    CatalogEntry {
        name: EVENT_LISTENER_FACTORY,
        descriptor: EVENT_LISTENER_FACTORY_TYPE,
        requires: Requirement::Always,
    },
];

/// Runtime capability check for optional processor support.
///
/// `is_present` answers whether a type is declared available;
/// [`load`](CapabilityProbe::load) actually resolves it. The split lets an
/// inconsistent environment — declared present, not loadable — be reported
/// as the fatal error it is.
pub trait CapabilityProbe {
    /// Returns `true` if the type is declared available in this runtime.
    fn is_present(&self, type_path: &str) -> bool;

    /// Resolves the type, returning its loadable descriptor.
    ///
    /// # Errors
    /// Fails when the type cannot actually be loaded.
    fn load(&self, type_path: &str) -> std::result::Result<String, CapabilityLoadError>;
}

/// [`CapabilityProbe`] backed by an explicit set of available types.
///
/// This is the feature-flag form of capability detection: the embedding
/// application declares once which optional types it linked in.
///
/// # Examples
/// ```
/// use tamhid_registry::infrastructure::{
///     CapabilityProbe, RESOURCE_ANNOTATION_TYPE, StaticCapabilityProbe,
/// };
///
/// let probe = StaticCapabilityProbe::new().declare(RESOURCE_ANNOTATION_TYPE);
/// assert!(probe.is_present(RESOURCE_ANNOTATION_TYPE));
/// assert!(!probe.is_present("tamhid_persistence::PersistenceContext"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilityProbe {
    available: BTreeSet<String>,
    unloadable: BTreeSet<String>,
}

impl StaticCapabilityProbe {
    /// Creates a probe with no capabilities declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a type as available and loadable.
    pub fn declare(mut self, type_path: impl Into<String>) -> Self {
        self.available.insert(type_path.into());
        self
    }

    /// Declares a type as present but not loadable — an inconsistent
    /// environment, which capability resolution reports as fatal.
    pub fn declare_unloadable(mut self, type_path: impl Into<String>) -> Self {
        self.unloadable.insert(type_path.into());
        self
    }
}

impl CapabilityProbe for StaticCapabilityProbe {
    fn is_present(&self, type_path: &str) -> bool {
        self.available.contains(type_path) || self.unloadable.contains(type_path)
    }

    fn load(&self, type_path: &str) -> std::result::Result<String, CapabilityLoadError> {
        if self.unloadable.contains(type_path) {
            return Err(CapabilityLoadError {
                type_path: type_path.to_string(),
                reason: "type is declared but not linked into this runtime".to_string(),
            });
        }
        if self.available.contains(type_path) {
            return Ok(type_path.to_string());
        }
        Err(CapabilityLoadError {
            type_path: type_path.to_string(),
            reason: "type is not declared by this runtime".to_string(),
        })
    }
}

/// Capability flags resolved once at bootstrap.
///
/// The registrar consumes this struct instead of probing; scattered runtime
/// presence checks collapse into one detection step with one failure point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCapabilities {
    common_annotations: bool,
    persistence: Option<String>,
}

impl ResolvedCapabilities {
    /// No optional capabilities. Only the unconditional catalog applies.
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolves the flags against a probe.
    ///
    /// The persistence capability is double-gated: both the marker type and
    /// the processor implementation type must be present, and the
    /// implementation must actually load.
    ///
    /// # Errors
    /// Returns the fatal [`CapabilityLoadError`] when the implementation
    /// type is declared present but fails to load.
    pub fn detect(probe: &dyn CapabilityProbe) -> Result<Self> {
        let common_annotations = probe.is_present(RESOURCE_ANNOTATION_TYPE);

        let persistence = if probe.is_present(PERSISTENCE_MARKER_TYPE)
            && probe.is_present(PERSISTENCE_PROCESSOR_TYPE)
        {
            Some(probe.load(PERSISTENCE_PROCESSOR_TYPE)?)
        } else {
            None
        };

        debug!(common_annotations, persistence = persistence.is_some(), "Resolved capabilities");
        Ok(Self {
            common_annotations,
            persistence,
        })
    }

    /// Enables the common-annotations capability.
    pub fn with_common_annotations(mut self) -> Self {
        self.common_annotations = true;
        self
    }

    /// Enables the persistence capability with a known-loadable descriptor.
    pub fn with_persistence(mut self, descriptor: impl Into<String>) -> Self {
        self.persistence = Some(descriptor.into());
        self
    }

    /// Whether the common-annotations capability resolved.
    pub fn common_annotations(&self) -> bool {
        self.common_annotations
    }

    /// The loaded persistence processor descriptor, if the double gate
    /// resolved.
    pub fn persistence_descriptor(&self) -> Option<&str> {
        self.persistence.as_deref()
    }
}

/// Idempotently seeds a registry with the infrastructure processor
/// definitions.
#[derive(Debug, Clone)]
pub struct InfrastructureRegistrar {
    capabilities: ResolvedCapabilities,
}

impl InfrastructureRegistrar {
    /// Creates a registrar over already-resolved capabilities.
    pub fn new(capabilities: ResolvedCapabilities) -> Self {
        Self { capabilities }
    }

    /// Registers every applicable processor definition not already present.
    ///
    /// Also installs the annotation-aware dependency comparator and the
    /// context-aware autowire candidate resolver into the registry's
    /// configuration slots, once each, when the registry exposes them.
    ///
    /// Returns the holders actually inserted by this call; names that were
    /// already registered are skipped and excluded from the result. Calling
    /// twice on the same registry returns an empty second result.
    #[instrument(skip_all, name = "register_infrastructure")]
    pub fn register_processors(
        &self,
        registry: &mut dyn DefinitionRegistry,
        source: Option<&Source>,
    ) -> Result<Vec<DefinitionHolder>> {
        if let Some(configurable) = registry.as_configurable() {
            let comparator_installed = configurable
                .dependency_comparator()
                .is_some_and(|c| c.as_any().is::<PriorityOrderComparator>());
            if !comparator_installed {
                configurable.set_dependency_comparator(PriorityOrderComparator::shared());
            }

            let resolver_installed = configurable
                .autowire_candidate_resolver()
                .is_some_and(|r| r.as_any().is::<ContextAwareCandidateResolver>());
            if !resolver_installed {
                configurable
                    .set_autowire_candidate_resolver(Arc::new(ContextAwareCandidateResolver));
            }
        }

        let mut registered = Vec::new();

        for entry in &FIXED_CATALOG {
            let applies = match entry.requires {
                Requirement::Always => true,
                Requirement::CommonAnnotations => self.capabilities.common_annotations(),
            };
            if !applies {
                debug!(name = entry.name, "Skipped: capability not resolved");
                continue;
            }
            if registry.contains_definition(entry.name) {
                debug!(name = entry.name, "Skipped: already registered");
                continue;
            }
            registered.push(register_processor(registry, entry.name, entry.descriptor, source)?);
        }

        if let Some(descriptor) = self.capabilities.persistence_descriptor() {
            if !registry.contains_definition(PERSISTENCE_PROCESSOR) {
                registered.push(register_processor(
                    registry,
                    PERSISTENCE_PROCESSOR,
                    descriptor,
                    source,
                )?);
            }
        }

        let names: Vec<&str> = registered.iter().map(DefinitionHolder::name).collect();
        debug!(inserted = %render_name_list(&names), "Infrastructure processors registered");
        Ok(registered)
    }
}

/// Resolves capabilities and registers the infrastructure processors in one
/// call — the bootstrap-facing entry point.
///
/// # Errors
/// A capability declared present but not loadable aborts the whole call with
/// [`TamhidError::CapabilityLoad`]; nothing is registered in that case.
///
/// [`TamhidError::CapabilityLoad`]: crate::error::TamhidError::CapabilityLoad
pub fn register_infrastructure_processors(
    registry: &mut dyn DefinitionRegistry,
    probe: &dyn CapabilityProbe,
    source: Option<&Source>,
) -> Result<Vec<DefinitionHolder>> {
    let capabilities = ResolvedCapabilities::detect(probe)?;
    InfrastructureRegistrar::new(capabilities).register_processors(registry, source)
}

fn register_processor(
    registry: &mut dyn DefinitionRegistry,
    name: &str,
    descriptor: &str,
    source: Option<&Source>,
) -> Result<DefinitionHolder> {
    let mut definition = ComponentDefinition::new(descriptor);
    definition.set_role(Role::Infrastructure);
    if let Some(source) = source {
        definition.set_source(source.clone());
    }

    registry.register_definition(name, definition.clone())?;
    Ok(DefinitionHolder::new(name, definition))
}

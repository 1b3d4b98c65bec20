//! Core definition-registry implementation for Tamhid DI.

pub mod annotations;
pub mod definition;
pub mod error;
pub mod infrastructure;
pub mod metadata;
pub mod registry;
pub mod scope;

pub use definition::{ComponentDefinition, DefinitionHolder, Role, Source};
pub use error::{Result, TamhidError};
pub use metadata::{AnnotationMetadata, AttributeSet, AttributeValue, DeclaredMetadata};
pub use registry::{DefinitionRegistry, StandardDefinitionRegistry};
pub use scope::{ScopeMetadata, ScopedProxyMode};

pub mod prelude {
    pub use crate::annotations::{
        apply_common_definition_annotations, apply_intrinsic_annotations,
    };
    pub use crate::definition::{ComponentDefinition, DefinitionHolder, Role, Source};
    pub use crate::error::{Result, TamhidError};
    pub use crate::infrastructure::{
        CapabilityProbe, InfrastructureRegistrar, ResolvedCapabilities, StaticCapabilityProbe,
        register_infrastructure_processors,
    };
    pub use crate::metadata::{AnnotationMetadata, AttributeSet, DeclaredMetadata};
    pub use crate::registry::{
        ConfigurableRegistry, DefinitionRegistry, StandardDefinitionRegistry,
    };
    pub use crate::scope::{
        ScopeMetadata, ScopedProxyCreator, ScopedProxyMode, apply_scoped_proxy_mode,
    };
}

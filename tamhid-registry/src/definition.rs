//! Component definition model.
//!
//! A [`ComponentDefinition`] is the declarative descriptor of one managed
//! component: the type that implements it, how it behaves relative to its
//! peers during instantiation (lazy, primary, depends-on), and which role it
//! plays inside the container. Definitions are created once by the scanner,
//! normalized by the annotation applier, and then owned by the registry
//! until container teardown.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tamhid_support::rendering::shorten_type_path;

use crate::metadata::AnnotationMetadata;

/// The role a definition plays within the container.
///
/// Roles are carried as stable numeric codes by the role annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A user-visible application component. Code `0`.
    #[default]
    Application,

    /// A supporting part of some larger configuration, relevant when
    /// inspecting that configuration but not on its own. Code `1`.
    Support,

    /// Framework-owned plumbing with no relevance to the application
    /// developer. Code `2`.
    Infrastructure,
}

impl Role {
    /// The stable numeric code of this role.
    #[inline]
    pub const fn code(self) -> i64 {
        match self {
            Role::Application => 0,
            Role::Support => 1,
            Role::Infrastructure => 2,
        }
    }

    /// Maps a numeric code back to a role, `None` for unknown codes.
    #[inline]
    pub const fn from_code(code: i64) -> Option<Role> {
        match code {
            0 => Some(Role::Application),
            1 => Some(Role::Support),
            2 => Some(Role::Infrastructure),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Application => write!(f, "Application"),
            Role::Support => write!(f, "Support"),
            Role::Infrastructure => write!(f, "Infrastructure"),
        }
    }
}

/// Opaque origin token attached to definitions for diagnostics.
///
/// Cheap to clone; the same token is typically shared by every definition
/// produced in one registration pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(Arc<str>);

impl Source {
    /// Creates a token from a description of the configuration origin.
    pub fn new(origin: impl AsRef<str>) -> Self {
        Source(Arc::from(origin.as_ref()))
    }

    /// The origin description.
    pub fn origin(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extended mutable attributes of a definition.
///
/// Definitions built by this crate carry this section; definitions adopted
/// from foreign sources may not, and the annotation rules targeting role and
/// description skip such definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedAttributes {
    /// The definition's role within the container.
    pub role: Role,
    /// Optional human-readable description.
    pub description: Option<String>,
}

/// Declarative descriptor of one managed component.
#[derive(Clone)]
pub struct ComponentDefinition {
    descriptor: String,
    lazy_init: bool,
    primary: bool,
    autowire_candidate: bool,
    depends_on: Vec<String>,
    source: Option<Source>,
    metadata: Option<Arc<dyn AnnotationMetadata>>,
    extended: Option<ExtendedAttributes>,
}

impl ComponentDefinition {
    /// Creates a definition for the given implementation type path.
    ///
    /// The definition starts eager, non-primary, an autowire candidate,
    /// with no dependencies and the default role.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            lazy_init: false,
            primary: false,
            autowire_candidate: true,
            depends_on: Vec::new(),
            source: None,
            metadata: None,
            extended: Some(ExtendedAttributes::default()),
        }
    }

    /// Creates a definition carrying the metadata it was scanned from.
    ///
    /// The metadata is what the lazy-fallback rule consults when a caller
    /// applies annotations from a different metadata object.
    pub fn with_metadata(
        descriptor: impl Into<String>,
        metadata: Arc<dyn AnnotationMetadata>,
    ) -> Self {
        let mut definition = Self::new(descriptor);
        definition.metadata = Some(metadata);
        definition
    }

    /// Creates a definition adopted from a foreign source.
    ///
    /// Such definitions carry no extended attribute section: role and
    /// description mutations are skipped for them.
    pub fn external(descriptor: impl Into<String>) -> Self {
        let mut definition = Self::new(descriptor);
        definition.extended = None;
        definition
    }

    /// The fully qualified type path of the component implementation.
    #[inline]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Whether instantiation is deferred until first use.
    #[inline]
    pub fn lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn set_lazy_init(&mut self, lazy_init: bool) {
        self.lazy_init = lazy_init;
    }

    /// Whether this definition wins ties during autowire candidate selection.
    #[inline]
    pub fn primary(&self) -> bool {
        self.primary
    }

    pub fn set_primary(&mut self, primary: bool) {
        self.primary = primary;
    }

    /// Whether this definition participates in autowiring at all.
    #[inline]
    pub fn autowire_candidate(&self) -> bool {
        self.autowire_candidate
    }

    pub fn set_autowire_candidate(&mut self, autowire_candidate: bool) {
        self.autowire_candidate = autowire_candidate;
    }

    /// Names of definitions that must be instantiated before this one,
    /// in declaration order.
    #[inline]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Replaces the depends-on list. Always a replacement, never an append.
    pub fn set_depends_on(&mut self, depends_on: Vec<String>) {
        self.depends_on = depends_on;
    }

    /// The configuration origin this definition was registered from.
    #[inline]
    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub fn set_source(&mut self, source: Source) {
        self.source = Some(source);
    }

    /// The metadata this definition was scanned from, if any.
    #[inline]
    pub fn metadata(&self) -> Option<&Arc<dyn AnnotationMetadata>> {
        self.metadata.as_ref()
    }

    /// The extended attribute section, absent on foreign definitions.
    #[inline]
    pub fn extended(&self) -> Option<&ExtendedAttributes> {
        self.extended.as_ref()
    }

    pub fn extended_mut(&mut self) -> Option<&mut ExtendedAttributes> {
        self.extended.as_mut()
    }

    /// The definition's role, `None` when the extended section is absent.
    #[inline]
    pub fn role(&self) -> Option<Role> {
        self.extended.as_ref().map(|ext| ext.role)
    }

    /// Sets the role. Silently skipped on definitions without the extended
    /// attribute section.
    pub fn set_role(&mut self, role: Role) {
        if let Some(ext) = self.extended.as_mut() {
            ext.role = role;
        }
    }

    /// The human-readable description, `None` when unset or unsupported.
    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.extended.as_ref().and_then(|ext| ext.description.as_deref())
    }

    /// Sets the description. Silently skipped on definitions without the
    /// extended attribute section.
    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(ext) = self.extended.as_mut() {
            ext.description = Some(description.into());
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("descriptor", &self.descriptor)
            .field("lazy_init", &self.lazy_init)
            .field("primary", &self.primary)
            .field("autowire_candidate", &self.autowire_candidate)
            .field("depends_on", &self.depends_on)
            .field("source", &self.source)
            .field("metadata", &self.metadata.as_ref().map(|_| "<metadata>"))
            .field("extended", &self.extended)
            .finish()
    }
}

/// A (definition, name) pair.
///
/// This is what the infrastructure registrar returns for newly inserted
/// definitions and what scope-proxy resolution threads through: the proxy
/// creator replaces the holder, not the definition in place.
#[derive(Debug, Clone)]
pub struct DefinitionHolder {
    name: String,
    definition: ComponentDefinition,
}

impl DefinitionHolder {
    pub fn new(name: impl Into<String>, definition: ComponentDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// The registry name of the held definition.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    pub fn definition_mut(&mut self) -> &mut ComponentDefinition {
        &mut self.definition
    }

    pub fn into_definition(self) -> ComponentDefinition {
        self.definition
    }
}

impl fmt::Display for DefinitionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name,
            shorten_type_path(self.definition.descriptor()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DeclaredMetadata;

    #[test]
    fn new_definition_defaults() {
        let definition = ComponentDefinition::new("my_app::cache::RedisCache");

        assert_eq!(definition.descriptor(), "my_app::cache::RedisCache");
        assert!(!definition.lazy_init());
        assert!(!definition.primary());
        assert!(definition.autowire_candidate());
        assert!(definition.depends_on().is_empty());
        assert!(definition.source().is_none());
        assert_eq!(definition.role(), Some(Role::Application));
        assert_eq!(definition.description(), None);
    }

    #[test]
    fn role_codes_round_trip() {
        for role in [Role::Application, Role::Support, Role::Infrastructure] {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(Role::from_code(7), None);
    }

    #[test]
    fn external_definition_skips_role_and_description() {
        let mut definition = ComponentDefinition::external("foreign::Widget");

        assert_eq!(definition.role(), None);
        definition.set_role(Role::Infrastructure);
        definition.set_description("ignored");

        assert_eq!(definition.role(), None);
        assert_eq!(definition.description(), None);
    }

    #[test]
    fn depends_on_replaces() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        definition.set_depends_on(vec!["a".into(), "b".into()]);
        definition.set_depends_on(vec!["c".into()]);

        assert_eq!(definition.depends_on(), ["c".to_string()]);
    }

    #[test]
    fn clone_shares_metadata_object() {
        let metadata: Arc<dyn crate::metadata::AnnotationMetadata> =
            Arc::new(DeclaredMetadata::new());
        let definition =
            ComponentDefinition::with_metadata("my_app::Service", Arc::clone(&metadata));
        let clone = definition.clone();

        assert!(Arc::ptr_eq(
            definition.metadata().unwrap(),
            clone.metadata().unwrap(),
        ));
    }

    #[test]
    fn source_token_display() {
        let source = Source::new("config:app.toml");
        assert_eq!(format!("{source}"), "config:app.toml");
        assert_eq!(source.origin(), "config:app.toml");
    }

    #[test]
    fn holder_display_shortens_descriptor() {
        let holder = DefinitionHolder::new(
            "cache",
            ComponentDefinition::new("my_app::cache::RedisCache"),
        );
        assert_eq!(format!("{holder}"), "cache (RedisCache)");
    }

    #[test]
    fn role_serializes_for_diagnostics() {
        let json = serde_json::to_string(&Role::Infrastructure).unwrap();
        assert_eq!(json, "\"Infrastructure\"");
    }
}

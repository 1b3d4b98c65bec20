//! Scoped-proxy resolution.
//!
//! A definition bound to a narrow scope (e.g. per-request) may need a
//! stand-in that defers resolution of the real instance to lookup time.
//! [`apply_scoped_proxy_mode`] makes that decision per definition:
//! - [`ScopedProxyMode::No`] — the definition passes through untouched
//! - [`ScopedProxyMode::Interfaces`] — proxy through the component's traits
//! - [`ScopedProxyMode::TargetClass`] — proxy through the concrete type
//!
//! Proxy generation itself lives behind the [`ScopedProxyCreator`]
//! collaborator; this core only decides whether and how to delegate.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::definition::DefinitionHolder;
use crate::error::Result;
use crate::registry::DefinitionRegistry;

/// How a scoped definition is proxied.
///
/// Scope resolution upstream normalizes its default to
/// [`ScopedProxyMode::No`] before this decision runs; an unresolved mode is
/// not representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopedProxyMode {
    /// No proxy; the definition is used as-is.
    No,

    /// Proxy implementing the traits of the target component.
    Interfaces,

    /// Proxy of the concrete target type.
    TargetClass,
}

impl fmt::Display for ScopedProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopedProxyMode::No => write!(f, "No"),
            ScopedProxyMode::Interfaces => write!(f, "Interfaces"),
            ScopedProxyMode::TargetClass => write!(f, "TargetClass"),
        }
    }
}

/// A definition's resolved scope: the scope name plus the proxy decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMetadata {
    scope_name: String,
    proxy_mode: ScopedProxyMode,
}

impl ScopeMetadata {
    pub fn new(scope_name: impl Into<String>, proxy_mode: ScopedProxyMode) -> Self {
        Self {
            scope_name: scope_name.into(),
            proxy_mode,
        }
    }

    /// The container-wide singleton scope, unproxied.
    pub fn singleton() -> Self {
        Self::new("singleton", ScopedProxyMode::No)
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    pub fn proxy_mode(&self) -> ScopedProxyMode {
        self.proxy_mode
    }
}

impl Default for ScopeMetadata {
    fn default() -> Self {
        Self::singleton()
    }
}

/// External proxy-generation collaborator.
///
/// The creator registers the proxy definition into the registry under a
/// derived name and returns a holder referencing the proxy, which replaces
/// the original holder in the caller's registration step.
pub trait ScopedProxyCreator {
    fn create_scoped_proxy(
        &self,
        holder: DefinitionHolder,
        registry: &mut dyn DefinitionRegistry,
        proxy_target_class: bool,
    ) -> Result<DefinitionHolder>;
}

/// Decides whether a definition needs a scoped proxy and delegates the
/// wrapping.
///
/// With [`ScopedProxyMode::No`] the input holder is returned unchanged and
/// the creator is never invoked; the other modes delegate exactly once,
/// with `proxy_target_class` `false` for [`ScopedProxyMode::Interfaces`]
/// and `true` for [`ScopedProxyMode::TargetClass`].
pub fn apply_scoped_proxy_mode(
    scope: &ScopeMetadata,
    holder: DefinitionHolder,
    registry: &mut dyn DefinitionRegistry,
    creator: &dyn ScopedProxyCreator,
) -> Result<DefinitionHolder> {
    let proxy_target_class = match scope.proxy_mode() {
        ScopedProxyMode::No => return Ok(holder),
        ScopedProxyMode::Interfaces => false,
        ScopedProxyMode::TargetClass => true,
    };

    trace!(
        name = holder.name(),
        scope = scope.scope_name(),
        proxy_target_class,
        "Creating scoped proxy"
    );
    creator.create_scoped_proxy(holder, registry, proxy_target_class)
}

//! Error types for Tamhid registry operations.
//!
//! Tamhid provides detailed, actionable error messages.
//! Every failure names the definition or attribute involved.

use std::fmt;

use tamhid_support::rendering::shorten_type_path;

/// Main error type for all Tamhid operations.
#[derive(Debug, thiserror::Error)]
pub enum TamhidError {
    /// A definition is already registered under the requested name.
    #[error("{}", .0)]
    DuplicateDefinition(DuplicateDefinitionError),

    /// An optional capability was reported present but its implementation
    /// type could not be loaded.
    #[error("{}", .0)]
    CapabilityLoad(CapabilityLoadError),

    /// An annotation attribute carried a value of the wrong type.
    #[error("{}", .0)]
    AttributeType(AttributeTypeError),
}

/// Error when registering a definition under a name that is already taken.
///
/// The registrar avoids this structurally (check before insert); hitting it
/// means two callers raced for the same name or a caller skipped the check.
#[derive(Debug)]
pub struct DuplicateDefinitionError {
    /// The contested definition name.
    pub name: String,
    /// Descriptor of the definition already registered under that name.
    pub existing: String,
    /// Descriptor of the definition that was refused.
    pub refused: String,
}

impl fmt::Display for DuplicateDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Definition already registered under name {:?}: {}",
            self.name,
            shorten_type_path(&self.existing),
        )?;
        write!(f, "\n  Refused: {}", shorten_type_path(&self.refused))?;
        write!(
            f,
            "\n  Hint: call contains_definition({:?}) before registering, or pick a distinct name",
            self.name,
        )
    }
}

/// Error when an optional capability's implementation type cannot be loaded
/// even though the probe reported it present.
///
/// This signals an inconsistent runtime configuration and is never retried.
#[derive(Debug)]
pub struct CapabilityLoadError {
    /// The type the probe reported present.
    pub type_path: String,
    /// What went wrong while loading it.
    pub reason: String,
}

impl fmt::Display for CapabilityLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot load optional capability type: {}",
            self.type_path,
        )?;
        write!(f, "\n  Reason: {}", self.reason)?;
        write!(
            f,
            "\n  Hint: the capability probe reported {} as present — the runtime configuration is inconsistent",
            shorten_type_path(&self.type_path),
        )
    }
}

/// Error when a typed attribute accessor finds a value of the wrong variant.
#[derive(Debug)]
pub struct AttributeTypeError {
    /// The attribute that was accessed.
    pub attribute: String,
    /// The variant the accessor expected.
    pub expected: &'static str,
    /// The variant actually stored.
    pub actual: &'static str,
}

impl fmt::Display for AttributeTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attribute {:?} has the wrong type: expected {}, found {}",
            self.attribute, self.expected, self.actual,
        )?;
        write!(
            f,
            "\n  Hint: declare the attribute with the type its consumer resolves"
        )
    }
}

impl From<CapabilityLoadError> for TamhidError {
    fn from(err: CapabilityLoadError) -> Self {
        TamhidError::CapabilityLoad(err)
    }
}

impl From<DuplicateDefinitionError> for TamhidError {
    fn from(err: DuplicateDefinitionError) -> Self {
        TamhidError::DuplicateDefinition(err)
    }
}

impl From<AttributeTypeError> for TamhidError {
    fn from(err: AttributeTypeError) -> Self {
        TamhidError::AttributeType(err)
    }
}

/// Convenient Result type for Tamhid operations.
pub type Result<T> = std::result::Result<T, TamhidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_definition_error_display() {
        let err = TamhidError::DuplicateDefinition(DuplicateDefinitionError {
            name: "cache".into(),
            existing: "my_app::caching::RedisCache".into(),
            refused: "my_app::caching::MemoryCache".into(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("already registered"));
        assert!(msg.contains("\"cache\""));
        assert!(msg.contains("RedisCache"));
        assert!(msg.contains("MemoryCache"));
    }

    #[test]
    fn capability_load_error_display() {
        let err = TamhidError::CapabilityLoad(CapabilityLoadError {
            type_path: "tamhid_persistence::PersistenceAnnotationProcessor".into(),
            reason: "type not linked into this binary".into(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("Cannot load optional capability type"));
        assert!(msg.contains("not linked"));
        assert!(msg.contains("inconsistent"));
    }

    #[test]
    fn attribute_type_error_display() {
        let err = TamhidError::AttributeType(AttributeTypeError {
            attribute: "value".into(),
            expected: "bool",
            actual: "string-array",
        });

        let msg = format!("{err}");
        assert!(msg.contains("\"value\""));
        assert!(msg.contains("expected bool"));
        assert!(msg.contains("found string-array"));
    }
}

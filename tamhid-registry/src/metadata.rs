//! Annotation metadata and attribute resolution.
//!
//! [`AnnotationMetadata`] is what the component scanner hands this core for
//! each discovered type: a queryable view of the declarative annotations on
//! it. Attributes are carried as [`AttributeSet`] — a typed bag keyed by
//! attribute name — instead of a loosely-typed string map, so a wrong-typed
//! attribute fails at resolution time, not somewhere downstream.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{AttributeTypeError, Result};

/// Marker with a boolean `value` attribute switching a definition to lazy
/// initialization.
pub const LAZY_ANNOTATION: &str = "Lazy";

/// Marker flagging a definition as the primary autowire candidate.
pub const PRIMARY_ANNOTATION: &str = "Primary";

/// Marker with a string-array `value` attribute naming definitions that must
/// be instantiated first.
pub const DEPENDS_ON_ANNOTATION: &str = "DependsOn";

/// Marker with a numeric `value` attribute carrying a [`Role`] code.
///
/// [`Role`]: crate::definition::Role
pub const ROLE_ANNOTATION: &str = "Role";

/// Marker with a string `value` attribute carrying a human-readable
/// definition description.
pub const DESCRIPTION_ANNOTATION: &str = "Description";

/// Marker with a numeric `value` attribute used by the priority-order
/// comparator when sorting dependency candidates.
pub const ORDER_ANNOTATION: &str = "Order";

/// One resolved annotation attribute value.
///
/// A closed union rather than an open `Any` bag: each consumer resolves the
/// variant it needs through a typed accessor on [`AttributeSet`] and gets a
/// type-mismatch error immediately when the declaration is wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
    StrArray(Vec<String>),
    /// Nested attribute sets, as carried by the `value` attribute of a
    /// repeatable annotation's container.
    NestedSets(Vec<AttributeSet>),
}

impl AttributeValue {
    /// Human-readable variant name, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Int(_) => "int",
            AttributeValue::Str(_) => "string",
            AttributeValue::StrArray(_) => "string-array",
            AttributeValue::NestedSets(_) => "nested-sets",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::StrArray(value)
    }
}

impl From<&[&str]> for AttributeValue {
    fn from(value: &[&str]) -> Self {
        AttributeValue::StrArray(value.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<AttributeSet>> for AttributeValue {
    fn from(value: Vec<AttributeSet>) -> Self {
        AttributeValue::NestedSets(value)
    }
}

/// The resolved attribute mapping of one annotation instance.
///
/// Produced by resolving an annotation against a piece of metadata; an
/// absent annotation produces no set at all, never an empty one. Typed
/// accessors return `Ok(None)` for absent keys and an
/// [`AttributeTypeError`] for present-but-wrong-typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an attribute, replacing any previous value under the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns `true` if the attribute is declared.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Raw access to a declared value.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    /// Resolves a boolean attribute.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(AttributeValue::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(self.mismatch(key, "bool", other)),
        }
    }

    /// Resolves an integer attribute.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(AttributeValue::Int(value)) => Ok(Some(*value)),
            Some(other) => Err(self.mismatch(key, "int", other)),
        }
    }

    /// Resolves a string attribute.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(AttributeValue::Str(value)) => Ok(Some(value)),
            Some(other) => Err(self.mismatch(key, "string", other)),
        }
    }

    /// Resolves a string-array attribute.
    pub fn get_str_array(&self, key: &str) -> Result<Option<&[String]>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(AttributeValue::StrArray(value)) => Ok(Some(value)),
            Some(other) => Err(self.mismatch(key, "string-array", other)),
        }
    }

    /// Resolves a nested-sets attribute.
    pub fn get_nested(&self, key: &str) -> Result<Option<&[AttributeSet]>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(AttributeValue::NestedSets(value)) => Ok(Some(value)),
            Some(other) => Err(self.mismatch(key, "nested-sets", other)),
        }
    }

    /// Number of declared attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no attributes are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn mismatch(
        &self,
        key: &str,
        expected: &'static str,
        actual: &AttributeValue,
    ) -> crate::error::TamhidError {
        AttributeTypeError {
            attribute: key.to_string(),
            expected,
            actual: actual.type_name(),
        }
        .into()
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {}", value.type_name())?;
        }
        write!(f, "}}")
    }
}

/// Queryable view of the declarative annotations on one type.
///
/// Implementations resolve declared values merged with annotation defaults;
/// this core only reads the result.
pub trait AnnotationMetadata: Send + Sync {
    /// Returns `true` if the named annotation is present.
    fn is_annotated(&self, annotation: &str) -> bool;

    /// Returns the fully resolved attribute set of the named annotation,
    /// or `None` when it is not present.
    fn annotation_attributes(&self, annotation: &str) -> Option<AttributeSet>;
}

/// In-memory [`AnnotationMetadata`] built from explicit declarations.
///
/// This is what the scanner produces for each discovered type, and the
/// natural way to construct metadata in tests.
///
/// # Examples
/// ```
/// use tamhid_registry::metadata::{AnnotationMetadata, AttributeSet, DeclaredMetadata};
///
/// let metadata = DeclaredMetadata::new()
///     .marker("Primary")
///     .annotate("Lazy", AttributeSet::new().with("value", true));
///
/// assert!(metadata.is_annotated("Primary"));
/// assert!(metadata.annotation_attributes("Lazy").is_some());
/// assert!(metadata.annotation_attributes("DependsOn").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeclaredMetadata {
    annotations: BTreeMap<String, AttributeSet>,
}

impl DeclaredMetadata {
    /// Creates metadata with no annotations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an annotation with the given attributes.
    pub fn annotate(mut self, annotation: impl Into<String>, attributes: AttributeSet) -> Self {
        self.annotations.insert(annotation.into(), attributes);
        self
    }

    /// Declares a marker annotation with no attributes.
    pub fn marker(self, annotation: impl Into<String>) -> Self {
        self.annotate(annotation, AttributeSet::new())
    }
}

impl AnnotationMetadata for DeclaredMetadata {
    fn is_annotated(&self, annotation: &str) -> bool {
        self.annotations.contains_key(annotation)
    }

    fn annotation_attributes(&self, annotation: &str) -> Option<AttributeSet> {
        self.annotations.get(annotation).cloned()
    }
}

/// Resolves one annotation's attributes off a piece of metadata.
///
/// Returns `None` when the annotation is absent — absence is a normal state,
/// not an error.
pub fn attributes_for(metadata: &dyn AnnotationMetadata, annotation: &str) -> Option<AttributeSet> {
    let attributes = metadata.annotation_attributes(annotation);
    trace!(annotation, present = attributes.is_some(), "Resolved annotation attributes");
    attributes
}

/// Resolves a repeatable annotation: the direct occurrence first (if any),
/// then every nested set from the container's `value` attribute, in
/// declaration order.
///
/// Structurally equal entries are suppressed, ordered-set style;
/// structurally distinct entries are all kept.
///
/// # Errors
/// Fails fast if the container's `value` attribute is present but is not a
/// nested-sets value.
pub fn attributes_for_repeatable(
    metadata: &dyn AnnotationMetadata,
    container: &str,
    element: &str,
) -> Result<Vec<AttributeSet>> {
    let mut result = Vec::new();

    if let Some(direct) = metadata.annotation_attributes(element) {
        result.push(direct);
    }

    if let Some(container_attributes) = metadata.annotation_attributes(container) {
        if let Some(nested) = container_attributes.get_nested("value")? {
            for set in nested {
                if !result.contains(set) {
                    result.push(set.clone());
                }
            }
        }
    }

    trace!(
        element,
        container,
        occurrences = result.len(),
        "Resolved repeatable annotation"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TamhidError;

    fn lazy_metadata(value: bool) -> DeclaredMetadata {
        DeclaredMetadata::new().annotate(
            LAZY_ANNOTATION,
            AttributeSet::new().with("value", value),
        )
    }

    #[test]
    fn absent_annotation_yields_no_set() {
        let metadata = DeclaredMetadata::new();
        assert!(attributes_for(&metadata, LAZY_ANNOTATION).is_none());
        assert!(!metadata.is_annotated(LAZY_ANNOTATION));
    }

    #[test]
    fn marker_annotation_yields_empty_set() {
        let metadata = DeclaredMetadata::new().marker(PRIMARY_ANNOTATION);
        let attributes = attributes_for(&metadata, PRIMARY_ANNOTATION).unwrap();
        assert!(attributes.is_empty());
    }

    #[test]
    fn typed_accessor_resolves_declared_value() {
        let metadata = lazy_metadata(true);
        let attributes = attributes_for(&metadata, LAZY_ANNOTATION).unwrap();
        assert_eq!(attributes.get_bool("value").unwrap(), Some(true));
    }

    #[test]
    fn typed_accessor_absent_key_is_none() {
        let attributes = AttributeSet::new().with("value", true);
        assert_eq!(attributes.get_str("name").unwrap(), None);
    }

    #[test]
    fn typed_accessor_wrong_variant_fails() {
        let attributes = AttributeSet::new().with("value", vec!["a".to_string()]);

        let result = attributes.get_bool("value");
        match result.unwrap_err() {
            TamhidError::AttributeType(err) => {
                assert_eq!(err.attribute, "value");
                assert_eq!(err.expected, "bool");
                assert_eq!(err.actual, "string-array");
            }
            other => panic!("Expected AttributeType, got: {other:?}"),
        }
    }

    #[test]
    fn repeatable_direct_occurrence_first() {
        let direct = AttributeSet::new().with("name", "direct");
        let first = AttributeSet::new().with("name", "first");
        let second = AttributeSet::new().with("name", "second");

        let metadata = DeclaredMetadata::new()
            .annotate("Watch", direct.clone())
            .annotate(
                "Watches",
                AttributeSet::new().with("value", vec![first.clone(), second.clone()]),
            );

        let result = attributes_for_repeatable(&metadata, "Watches", "Watch").unwrap();
        assert_eq!(result, vec![direct, first, second]);
    }

    #[test]
    fn repeatable_container_only() {
        let first = AttributeSet::new().with("name", "first");
        let metadata = DeclaredMetadata::new().annotate(
            "Watches",
            AttributeSet::new().with("value", vec![first.clone()]),
        );

        let result = attributes_for_repeatable(&metadata, "Watches", "Watch").unwrap();
        assert_eq!(result, vec![first]);
    }

    #[test]
    fn repeatable_suppresses_structural_duplicates() {
        let repeated = AttributeSet::new().with("name", "same");
        let distinct = AttributeSet::new().with("name", "other");

        let metadata = DeclaredMetadata::new()
            .annotate("Watch", repeated.clone())
            .annotate(
                "Watches",
                AttributeSet::new()
                    .with("value", vec![repeated.clone(), distinct.clone()]),
            );

        let result = attributes_for_repeatable(&metadata, "Watches", "Watch").unwrap();
        assert_eq!(result, vec![repeated, distinct]);
    }

    #[test]
    fn repeatable_absent_everywhere_is_empty() {
        let metadata = DeclaredMetadata::new();
        let result = attributes_for_repeatable(&metadata, "Watches", "Watch").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn repeatable_container_with_wrong_value_type_fails() {
        let metadata = DeclaredMetadata::new().annotate(
            "Watches",
            AttributeSet::new().with("value", "not-a-nested-set"),
        );

        let result = attributes_for_repeatable(&metadata, "Watches", "Watch");
        assert!(matches!(result, Err(TamhidError::AttributeType(_))));
    }

    #[test]
    fn attribute_set_serializes_for_diagnostics() {
        let attributes = AttributeSet::new()
            .with("value", true)
            .with("scope", "request");

        let json = serde_json::to_string(&attributes).unwrap();
        assert!(json.contains("Bool"));
        assert!(json.contains("request"));
    }

    #[test]
    fn attribute_set_display_lists_keys() {
        let attributes = AttributeSet::new().with("value", 5i64);
        assert_eq!(format!("{attributes}"), "{value: int}");
    }
}

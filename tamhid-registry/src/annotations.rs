//! Common definition annotation rules.
//!
//! Normalizes a definition's declarative annotations into its fields: lazy
//! initialization, primary-candidate status, instantiation ordering and the
//! extended role/description attributes. Each rule is independent and
//! treats an absent annotation as a no-op, so a definition with no
//! recognized annotations passes through untouched.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::definition::{ComponentDefinition, Role};
use crate::error::Result;
use crate::metadata::{
    AnnotationMetadata, DEPENDS_ON_ANNOTATION, DESCRIPTION_ANNOTATION, LAZY_ANNOTATION,
    PRIMARY_ANNOTATION, ROLE_ANNOTATION, attributes_for,
};

/// Applies the common annotation rules from the definition's own metadata.
///
/// Definitions without metadata pass through untouched.
pub fn apply_intrinsic_annotations(definition: &mut ComponentDefinition) -> Result<()> {
    let Some(metadata) = definition.metadata().cloned() else {
        trace!(
            descriptor = definition.descriptor(),
            "No intrinsic metadata, nothing to apply"
        );
        return Ok(());
    };
    apply_common_definition_annotations(definition, &metadata)
}

/// Applies the common annotation rules from the given metadata.
///
/// The metadata is usually the definition's own, but a factory method's
/// metadata may be passed instead; the lazy rule then falls back to the
/// definition's intrinsic metadata when the passed object — compared by
/// identity, not structure — is a different one and carries no lazy marker.
///
/// # Errors
/// Fails fast when a recognized annotation declares an attribute of the
/// wrong type.
pub fn apply_common_definition_annotations(
    definition: &mut ComponentDefinition,
    metadata: &Arc<dyn AnnotationMetadata>,
) -> Result<()> {
    apply_lazy(definition, metadata)?;

    if metadata.is_annotated(PRIMARY_ANNOTATION) {
        definition.set_primary(true);
    }

    if let Some(depends_on) = attributes_for(metadata.as_ref(), DEPENDS_ON_ANNOTATION) {
        if let Some(names) = depends_on.get_str_array("value")? {
            definition.set_depends_on(names.to_vec());
        }
    }

    // role and description need the extended attribute section
    if definition.extended().is_some() {
        if let Some(role) = attributes_for(metadata.as_ref(), ROLE_ANNOTATION) {
            if let Some(code) = role.get_int("value")? {
                match Role::from_code(code) {
                    Some(role) => definition.set_role(role),
                    None => warn!(
                        code,
                        descriptor = definition.descriptor(),
                        "Unrecognized role code, keeping current role"
                    ),
                }
            }
        }
        if let Some(description) = attributes_for(metadata.as_ref(), DESCRIPTION_ANNOTATION) {
            if let Some(text) = description.get_str("value")? {
                definition.set_description(text);
            }
        }
    }

    Ok(())
}

fn apply_lazy(
    definition: &mut ComponentDefinition,
    metadata: &Arc<dyn AnnotationMetadata>,
) -> Result<()> {
    if let Some(lazy) = attributes_for(metadata.as_ref(), LAZY_ANNOTATION) {
        if let Some(value) = lazy.get_bool("value")? {
            definition.set_lazy_init(value);
        }
        return Ok(());
    }

    // Fallback: consult the intrinsic metadata, but only when the passed
    // metadata is a different object. Identity, not structural equality,
    // triggers the fallback.
    let Some(intrinsic) = definition.metadata().cloned() else {
        return Ok(());
    };
    if Arc::ptr_eq(&intrinsic, metadata) {
        return Ok(());
    }
    if let Some(lazy) = attributes_for(intrinsic.as_ref(), LAZY_ANNOTATION) {
        if let Some(value) = lazy.get_bool("value")? {
            definition.set_lazy_init(value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TamhidError;
    use crate::metadata::{AttributeSet, DeclaredMetadata};

    fn shared(metadata: DeclaredMetadata) -> Arc<dyn AnnotationMetadata> {
        Arc::new(metadata)
    }

    fn lazy_set(value: bool) -> AttributeSet {
        AttributeSet::new().with("value", value)
    }

    #[test]
    fn no_annotations_is_a_no_op() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        definition.set_depends_on(vec!["existing".into()]);
        let metadata = shared(DeclaredMetadata::new());

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();

        assert!(!definition.lazy_init());
        assert!(!definition.primary());
        assert_eq!(definition.depends_on(), ["existing".to_string()]);
        assert_eq!(definition.role(), Some(Role::Application));
        assert_eq!(definition.description(), None);
    }

    #[test]
    fn lazy_value_is_applied() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        let metadata = shared(DeclaredMetadata::new().annotate(LAZY_ANNOTATION, lazy_set(true)));

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();
        assert!(definition.lazy_init());
    }

    #[test]
    fn lazy_false_overrides_earlier_true() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        definition.set_lazy_init(true);
        let metadata = shared(DeclaredMetadata::new().annotate(LAZY_ANNOTATION, lazy_set(false)));

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();
        assert!(!definition.lazy_init());
    }

    #[test]
    fn lazy_falls_back_to_intrinsic_metadata() {
        let intrinsic = shared(DeclaredMetadata::new().annotate(LAZY_ANNOTATION, lazy_set(true)));
        let mut definition =
            ComponentDefinition::with_metadata("my_app::Service", Arc::clone(&intrinsic));

        // a different metadata object without the lazy marker
        let passed = shared(DeclaredMetadata::new().marker(PRIMARY_ANNOTATION));
        apply_common_definition_annotations(&mut definition, &passed).unwrap();

        assert!(definition.lazy_init());
    }

    #[test]
    fn lazy_fallback_requires_a_distinct_object() {
        // Structurally the passed metadata equals the intrinsic one; the
        // same Arc means no fallback lookup happens, so lazy stays unset.
        let intrinsic = shared(DeclaredMetadata::new());
        let mut definition =
            ComponentDefinition::with_metadata("my_app::Service", Arc::clone(&intrinsic));

        apply_common_definition_annotations(&mut definition, &intrinsic).unwrap();
        assert!(!definition.lazy_init());
    }

    #[test]
    fn lazy_on_passed_metadata_wins_over_intrinsic() {
        let intrinsic = shared(DeclaredMetadata::new().annotate(LAZY_ANNOTATION, lazy_set(true)));
        let mut definition =
            ComponentDefinition::with_metadata("my_app::Service", Arc::clone(&intrinsic));

        let passed = shared(DeclaredMetadata::new().annotate(LAZY_ANNOTATION, lazy_set(false)));
        apply_common_definition_annotations(&mut definition, &passed).unwrap();

        assert!(!definition.lazy_init());
    }

    #[test]
    fn primary_marker_sets_primary() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        let metadata = shared(DeclaredMetadata::new().marker(PRIMARY_ANNOTATION));

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();
        assert!(definition.primary());
    }

    #[test]
    fn primary_is_never_reset() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        definition.set_primary(true);
        let metadata = shared(DeclaredMetadata::new());

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();
        assert!(definition.primary());
    }

    #[test]
    fn depends_on_replaces_existing_list() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        definition.set_depends_on(vec!["old".into()]);

        let metadata = shared(DeclaredMetadata::new().annotate(
            DEPENDS_ON_ANNOTATION,
            AttributeSet::new().with("value", vec!["first".to_string(), "second".to_string()]),
        ));
        apply_common_definition_annotations(&mut definition, &metadata).unwrap();

        assert_eq!(
            definition.depends_on(),
            ["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn role_and_description_are_applied() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        let metadata = shared(
            DeclaredMetadata::new()
                .annotate(
                    ROLE_ANNOTATION,
                    AttributeSet::new().with("value", Role::Support.code()),
                )
                .annotate(
                    DESCRIPTION_ANNOTATION,
                    AttributeSet::new().with("value", "background cache warmer"),
                ),
        );

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();

        assert_eq!(definition.role(), Some(Role::Support));
        assert_eq!(definition.description(), Some("background cache warmer"));
    }

    #[test]
    fn role_and_description_skip_foreign_definitions() {
        let mut definition = ComponentDefinition::external("foreign::Widget");
        let metadata = shared(
            DeclaredMetadata::new()
                .annotate(
                    ROLE_ANNOTATION,
                    AttributeSet::new().with("value", Role::Infrastructure.code()),
                )
                .annotate(
                    DESCRIPTION_ANNOTATION,
                    AttributeSet::new().with("value", "ignored"),
                ),
        );

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();

        assert_eq!(definition.role(), None);
        assert_eq!(definition.description(), None);
    }

    #[test]
    fn unknown_role_code_is_skipped() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        let metadata = shared(DeclaredMetadata::new().annotate(
            ROLE_ANNOTATION,
            AttributeSet::new().with("value", 42i64),
        ));

        apply_common_definition_annotations(&mut definition, &metadata).unwrap();
        assert_eq!(definition.role(), Some(Role::Application));
    }

    #[test]
    fn wrong_typed_lazy_value_fails_fast() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        let metadata = shared(DeclaredMetadata::new().annotate(
            LAZY_ANNOTATION,
            AttributeSet::new().with("value", "yes"),
        ));

        let result = apply_common_definition_annotations(&mut definition, &metadata);
        assert!(matches!(result, Err(TamhidError::AttributeType(_))));
    }

    #[test]
    fn intrinsic_overload_reads_own_metadata() {
        let intrinsic = shared(
            DeclaredMetadata::new()
                .annotate(LAZY_ANNOTATION, lazy_set(true))
                .marker(PRIMARY_ANNOTATION),
        );
        let mut definition = ComponentDefinition::with_metadata("my_app::Service", intrinsic);

        apply_intrinsic_annotations(&mut definition).unwrap();

        assert!(definition.lazy_init());
        assert!(definition.primary());
    }

    #[test]
    fn intrinsic_overload_without_metadata_is_a_no_op() {
        let mut definition = ComponentDefinition::new("my_app::Service");
        apply_intrinsic_annotations(&mut definition).unwrap();
        assert!(!definition.lazy_init());
    }
}

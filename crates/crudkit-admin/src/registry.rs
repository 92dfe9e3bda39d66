//! The resource registry.
//!
//! [`ResourceRegistry`] holds every [`ResourceSpec`] by name and answers the
//! form orchestrator's spec questions for them.

use std::collections::BTreeMap;

use crudkit_forms::backend::{Document, Operation, ResourceSpecProvider};
use crudkit_forms::{FieldSpec, FormError, FormResult};

use crate::resource::ResourceSpec;

/// Registered resources, keyed by name.
///
/// # Examples
///
/// ```
/// use crudkit_admin::registry::ResourceRegistry;
/// use crudkit_admin::resource::ResourceSpec;
///
/// let mut registry = ResourceRegistry::new();
/// registry.register(ResourceSpec::new("people"));
/// assert!(registry.is_registered("people"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, ResourceSpec>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource, replacing any resource of the same name.
    pub fn register(&mut self, spec: ResourceSpec) {
        self.resources.insert(spec.name.clone(), spec);
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with(mut self, spec: ResourceSpec) -> Self {
        self.register(spec);
        self
    }

    pub fn unregister(&mut self, name: &str) -> Option<ResourceSpec> {
        self.resources.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSpec> {
        self.resources.get(name)
    }

    /// Looks up a resource, failing with [`FormError::UnknownResource`].
    pub fn resource(&self, name: &str) -> FormResult<&ResourceSpec> {
        self.get(name)
            .ok_or_else(|| FormError::UnknownResource(name.to_string()))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceSpecProvider for ResourceRegistry {
    fn field_specs(&self, resource: &str, operation: &Operation) -> FormResult<Vec<FieldSpec>> {
        Ok(self.resource(resource)?.field_specs(operation))
    }

    fn defaults(&self, resource: &str) -> FormResult<Document> {
        Ok(self.resource(resource)?.defaults())
    }

    fn update_keys(&self, resource: &str) -> FormResult<Vec<String>> {
        Ok(self.resource(resource)?.updatable_keys())
    }

    fn merge_create_params(&self, resource: &str, params: Document) -> FormResult<Document> {
        Ok(self.resource(resource)?.merge_create_params(params))
    }
}

#[cfg(test)]
mod tests {
    use crudkit_forms::FieldKind;

    use super::*;

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new()
            .with(
                ResourceSpec::new("people")
                    .field(FieldSpec::new("name", FieldKind::ShortText))
                    .required_on_create(["name"]),
            )
            .with(ResourceSpec::new("jobs"))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["jobs", "people"]);
        assert!(registry.get("people").is_some());
        assert!(!registry.is_registered("ghosts"));
    }

    #[test]
    fn test_unregister() {
        let mut registry = registry();
        assert!(registry.unregister("jobs").is_some());
        assert!(registry.unregister("jobs").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_provider_resolves_required() {
        let specs = registry().field_specs("people", &Operation::Create).unwrap();
        assert!(specs[0].required);
    }

    #[test]
    fn test_unknown_resource() {
        let err = registry().defaults("ghosts").unwrap_err();
        assert_eq!(err.to_string(), "unknown resource: ghosts");
    }
}

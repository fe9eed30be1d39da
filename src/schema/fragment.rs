//! Services and the schema fragments they contribute.

use super::resolver::Bindings;
use super::FragmentError;
use crate::log_schema_warn;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// SDL text plus the resolvers for the fields it declares.
#[derive(Debug, Clone, Default)]
pub struct ServiceFragment {
    pub definition: String,
    pub bindings: Bindings,
}

impl ServiceFragment {
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            bindings: Bindings::default(),
        }
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }
}

/// A module that extends the gateway schema.
pub trait GatewayService: Send + Sync {
    /// Stable identifier, used in logs and in the composition report.
    fn id(&self) -> &str;

    /// The fragment this service contributes. `Ok(None)` means the service has
    /// nothing to add.
    fn fragment(&self) -> Result<Option<ServiceFragment>, FragmentError>;
}

/// Ordered set of services taking part in schema composition.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<dyn GatewayService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. A second service with an id already present is
    /// ignored.
    pub fn register(&mut self, service: Arc<dyn GatewayService>) -> &mut Self {
        if self.services.iter().any(|s| s.id() == service.id()) {
            log_schema_warn!(
                "Service '{}' is already registered; ignoring duplicate",
                service.id()
            );
        } else {
            self.services.push(service);
        }
        self
    }

    pub fn with(mut self, service: impl GatewayService + 'static) -> Self {
        self.register(Arc::new(service));
        self
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.services.iter().map(|s| s.id().to_string()).collect()
    }

    /// Ask every service for its fragment, in registration order.
    ///
    /// A service that panics while producing its fragment is reported as a
    /// retrieval failure. Services without a fragment are left out.
    pub fn retrieve(&self) -> Vec<(String, Result<ServiceFragment, FragmentError>)> {
        let mut fragments = Vec::with_capacity(self.services.len());
        for service in &self.services {
            let id = service.id().to_string();
            let outcome = catch_unwind(AssertUnwindSafe(|| service.fragment()))
                .unwrap_or_else(|_| {
                    Err(FragmentError::Retrieval(
                        "service panicked while providing its fragment".to_string(),
                    ))
                });
            match outcome {
                Ok(Some(fragment)) => fragments.push((id, Ok(fragment))),
                Ok(None) => {}
                Err(error) => fragments.push((id, Err(error))),
            }
        }
        fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    impl GatewayService for Fixed {
        fn id(&self) -> &str {
            self.0
        }

        fn fragment(&self) -> Result<Option<ServiceFragment>, FragmentError> {
            Ok(self.1.map(ServiceFragment::new))
        }
    }

    struct Panicking;

    impl GatewayService for Panicking {
        fn id(&self) -> &str {
            "panicking"
        }

        fn fragment(&self) -> Result<Option<ServiceFragment>, FragmentError> {
            panic!("no fragment today")
        }
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let registry = ServiceRegistry::new()
            .with(Fixed("a", None))
            .with(Fixed("a", Some("type A { x: Int }")));
        assert_eq!(registry.ids(), vec!["a".to_string()]);
    }

    #[test]
    fn retrieve_skips_empty_and_reports_panics() {
        let registry = ServiceRegistry::new()
            .with(Fixed("empty", None))
            .with(Panicking)
            .with(Fixed("full", Some("extend type Query { x: Int }")));

        let fragments = registry.retrieve();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].0, "panicking");
        assert!(matches!(fragments[0].1, Err(FragmentError::Retrieval(_))));
        assert_eq!(fragments[1].0, "full");
        assert!(fragments[1].1.is_ok());
    }
}

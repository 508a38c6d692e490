//! Interface registry: read-only map from [`DomainId`] to record interface.
//!
//! Built once at startup and never modified afterwards. The builder refuses
//! to produce a registry that misses a domain or registers one twice, so a
//! running service always has exactly one interface per domain.

use std::collections::HashMap;
use std::sync::Arc;

use servicedb_domain::domain_id::DomainId;

use crate::ports::{CalllogInterface, ContactInterface, RecordInterface};

/// Reasons a registry cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no interface registered for {0}")]
    Missing(DomainId),
    #[error("interface for {0} registered more than once")]
    Duplicate(DomainId),
    #[error("interface registered as {expected} serves {actual}")]
    Mismatch {
        expected: DomainId,
        actual: DomainId,
    },
}

pub struct InterfaceRegistry {
    interfaces: HashMap<DomainId, Arc<dyn RecordInterface>>,
    contacts: Arc<dyn ContactInterface>,
    calllog: Arc<dyn CalllogInterface>,
}

impl InterfaceRegistry {
    #[must_use]
    pub fn builder() -> InterfaceRegistryBuilder {
        InterfaceRegistryBuilder::default()
    }

    /// The interface serving `domain`, if any.
    #[must_use]
    pub fn get_interface(&self, domain: DomainId) -> Option<&Arc<dyn RecordInterface>> {
        self.interfaces.get(&domain)
    }

    /// The contacts interface with its CRUD and lookup capabilities.
    #[must_use]
    pub fn contacts(&self) -> &Arc<dyn ContactInterface> {
        &self.contacts
    }

    /// The call log interface with its CRUD and last-id capabilities.
    #[must_use]
    pub fn calllog(&self) -> &Arc<dyn CalllogInterface> {
        &self.calllog
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

#[derive(Default)]
pub struct InterfaceRegistryBuilder {
    interfaces: HashMap<DomainId, Arc<dyn RecordInterface>>,
    contacts: Option<Arc<dyn ContactInterface>>,
    calllog: Option<Arc<dyn CalllogInterface>>,
    errors: Vec<RegistryError>,
}

impl InterfaceRegistryBuilder {
    /// Register the contacts interface.
    #[must_use]
    pub fn contacts<T: ContactInterface + 'static>(mut self, interface: Arc<T>) -> Self {
        self.insert(DomainId::Contact, interface.clone());
        self.contacts = Some(interface);
        self
    }

    /// Register the call log interface.
    #[must_use]
    pub fn calllog<T: CalllogInterface + 'static>(mut self, interface: Arc<T>) -> Self {
        self.insert(DomainId::Calllog, interface.clone());
        self.calllog = Some(interface);
        self
    }

    /// Register an interface reachable through generic queries only.
    #[must_use]
    pub fn register(mut self, interface: Arc<dyn RecordInterface>) -> Self {
        let domain = interface.domain();
        self.insert(domain, interface);
        self
    }

    fn insert(&mut self, expected: DomainId, interface: Arc<dyn RecordInterface>) {
        let actual = interface.domain();
        if actual != expected {
            self.errors
                .push(RegistryError::Mismatch { expected, actual });
            return;
        }
        if self.interfaces.insert(actual, interface).is_some() {
            self.errors.push(RegistryError::Duplicate(actual));
        }
    }

    /// Finish the registry.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] encountered: a mismatched or
    /// duplicate registration, or a domain left without an interface.
    pub fn build(self) -> Result<InterfaceRegistry, RegistryError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        if let Some(missing) = DomainId::ALL
            .into_iter()
            .find(|domain| !self.interfaces.contains_key(domain))
        {
            return Err(RegistryError::Missing(missing));
        }
        let contacts = self
            .contacts
            .ok_or(RegistryError::Missing(DomainId::Contact))?;
        let calllog = self
            .calllog
            .ok_or(RegistryError::Missing(DomainId::Calllog))?;
        Ok(InterfaceRegistry {
            interfaces: self.interfaces,
            contacts,
            calllog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{InMemoryCalllog, InMemoryContacts, StubInterface};

    fn complete() -> InterfaceRegistryBuilder {
        let mut builder = InterfaceRegistry::builder()
            .contacts(Arc::new(InMemoryContacts::default()))
            .calllog(Arc::new(InMemoryCalllog::default()));
        for domain in DomainId::ALL {
            if !matches!(domain, DomainId::Contact | DomainId::Calllog) {
                builder = builder.register(Arc::new(StubInterface::new(domain)));
            }
        }
        builder
    }

    #[test]
    fn should_resolve_every_domain_when_complete() {
        let registry = complete().build().unwrap();
        assert_eq!(registry.len(), DomainId::ALL.len());
        for domain in DomainId::ALL {
            let interface = registry.get_interface(domain).unwrap();
            assert_eq!(interface.domain(), domain);
        }
    }

    #[test]
    fn should_return_same_instance_on_every_lookup() {
        let registry = complete().build().unwrap();
        let first = registry.get_interface(DomainId::Notes).unwrap();
        let second = registry.get_interface(DomainId::Notes).unwrap();
        assert!(Arc::ptr_eq(first, second));
    }

    #[test]
    fn should_reject_missing_domain() {
        let result = InterfaceRegistry::builder()
            .contacts(Arc::new(InMemoryContacts::default()))
            .calllog(Arc::new(InMemoryCalllog::default()))
            .build();
        assert!(matches!(result, Err(RegistryError::Missing(_))));
    }

    #[test]
    fn should_reject_duplicate_registration() {
        let result = complete()
            .register(Arc::new(StubInterface::new(DomainId::Quotes)))
            .build();
        assert!(matches!(
            result,
            Err(RegistryError::Duplicate(DomainId::Quotes))
        ));
    }

    #[test]
    fn should_reject_generic_registration_of_contacts() {
        let result = InterfaceRegistry::builder()
            .register(Arc::new(StubInterface::new(DomainId::Contact)))
            .calllog(Arc::new(InMemoryCalllog::default()))
            .build();
        assert!(result.is_err());
    }
}

//! Loading of types that were not registered up front.

use keel_ir::TypeDescriptor;

/// Supplies descriptors for names the registry has never seen.
///
/// Consulted on every resolution miss; a `None` is not remembered, so a
/// type registered later becomes resolvable. Typically backed by a
/// generated table of all storable types in the application.
pub trait TypeSource: Send + Sync {
    fn load(&self, name: &str) -> Option<TypeDescriptor>;
}

impl<F> TypeSource for F
where
    F: Fn(&str) -> Option<TypeDescriptor> + Send + Sync,
{
    fn load(&self, name: &str) -> Option<TypeDescriptor> {
        self(name)
    }
}

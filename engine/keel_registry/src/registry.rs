//! The short-name registry.
//!
//! # Concurrency
//!
//! - Name table: `RwLock<FxHashMap>`; lookups take the read lock, first
//!   registration of a name takes the write lock and re-checks.
//! - Derived views (hierarchy, key chain, field order): `DashMap` caches,
//!   filled at registration and lazily on miss. Only successful results are
//!   cached, so a failed lookup never becomes permanent.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use keel_ir::{
    is_identifier, CodecError, DeclaredType, FieldDescriptor, Record, TypeClass, TypeDescriptor,
    TypeKind, TypeName, ENUM_FIELD, KEY_COLUMN, MEMBER_FIELD, TYPE_FIELD,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::hierarchy::{key_chain_of, merge_fields};
use crate::TypeSource;

/// Shared, immutable sequence of descriptors.
pub type Chain = Arc<[Arc<TypeDescriptor>]>;

/// Field names a type may not declare.
const RESERVED_FIELDS: [&str; 4] = [TYPE_FIELD, KEY_COLUMN, ENUM_FIELD, MEMBER_FIELD];

/// Registry of every type the codecs can produce or consume.
pub struct TypeRegistry {
    types: RwLock<FxHashMap<TypeName, Arc<TypeDescriptor>>>,
    hierarchies: DashMap<TypeName, Chain, FxBuildHasher>,
    key_chains: DashMap<TypeName, Chain, FxBuildHasher>,
    field_orders: DashMap<TypeName, Arc<[FieldDescriptor]>, FxBuildHasher>,
    source: Option<Box<dyn TypeSource>>,
    /// Names each thread is currently loading from `source`, to stop base cycles.
    loading: Mutex<FxHashSet<(ThreadId, TypeName)>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry {
            types: RwLock::new(FxHashMap::default()),
            hierarchies: DashMap::with_hasher(FxBuildHasher),
            key_chains: DashMap::with_hasher(FxBuildHasher),
            field_orders: DashMap::with_hasher(FxBuildHasher),
            source: None,
            loading: Mutex::new(FxHashSet::default()),
        }
    }

    /// Registry that falls back to `source` for unknown names.
    pub fn with_source(source: impl TypeSource + 'static) -> Self {
        TypeRegistry {
            source: Some(Box::new(source)),
            ..TypeRegistry::new()
        }
    }

    /// Register one type.
    ///
    /// Bases must already be registered (or be loadable from the source).
    /// Registering an identical descriptor again is a no-op; a different
    /// descriptor under a taken name fails with `DuplicateTypeName`.
    /// On failure the registry is left unchanged.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %descriptor.name()))]
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<(), CodecError> {
        if let Some(existing) = self.lookup(descriptor.name()) {
            return Self::check_identical(&existing, &descriptor);
        }

        Self::check_definition(&descriptor)?;

        let descriptor = Arc::new(descriptor);
        let hierarchy = self.walk_hierarchy(&descriptor)?;
        let fields: Arc<[FieldDescriptor]> = merge_fields(&hierarchy)?.into();
        let class = descriptor.class();
        let key_chain: Option<Chain> = if class.has_key_chain() {
            Some(key_chain_of(&hierarchy)?.into())
        } else {
            None
        };

        let name = descriptor.name().clone();
        {
            let mut types = self.types.write();
            // Double-check: another thread may have won the race.
            if let Some(existing) = types.get(&name) {
                return Self::check_identical(existing, &descriptor);
            }
            types.insert(name.clone(), Arc::clone(&descriptor));
        }

        self.hierarchies.insert(name.clone(), hierarchy.into());
        self.field_orders.insert(name.clone(), fields);
        if let Some(chain) = key_chain {
            self.key_chains.insert(name, chain);
        }

        tracing::debug!(?class, "registered type");
        Ok(())
    }

    /// Register types in order, stopping at the first failure.
    pub fn register_all(
        &self,
        descriptors: impl IntoIterator<Item = TypeDescriptor>,
    ) -> Result<(), CodecError> {
        descriptors.into_iter().try_for_each(|d| self.register(d))
    }

    /// Register the descriptor of a Rust type implementing [`Record`].
    pub fn register_record<T: Record>(&self) -> Result<(), CodecError> {
        self.register(T::descriptor())
    }

    /// Descriptor registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<TypeDescriptor>, CodecError> {
        if let Some(found) = self.lookup(name) {
            return Ok(found);
        }
        self.load_from_source(name)?;
        self.lookup(name).ok_or_else(|| CodecError::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// All registered names, sorted.
    pub fn type_names(&self) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn classify(&self, name: &str) -> Result<TypeClass, CodecError> {
        Ok(self.resolve(name)?.class())
    }

    /// Inheritance chain of `name`, base first, ending with `name` itself.
    pub fn hierarchy(&self, name: &str) -> Result<Chain, CodecError> {
        if let Some(cached) = self.hierarchies.get(name) {
            return Ok(Arc::clone(cached.value()));
        }
        let descriptor = self.resolve(name)?;
        let chain: Chain = self.walk_hierarchy(&descriptor)?.into();
        self.hierarchies
            .insert(descriptor.name().clone(), Arc::clone(&chain));
        Ok(chain)
    }

    /// `name` followed by its ancestors up to and including its key type.
    pub fn key_chain(&self, name: &str) -> Result<Chain, CodecError> {
        if let Some(cached) = self.key_chains.get(name) {
            return Ok(Arc::clone(cached.value()));
        }
        let hierarchy = self.hierarchy(name)?;
        let chain: Chain = key_chain_of(&hierarchy)?.into();
        tracing::trace!(name, len = chain.len(), "key chain cached");
        self.key_chains.insert(TypeName::new(name), Arc::clone(&chain));
        Ok(chain)
    }

    /// The key type identifying instances of `name`.
    pub fn key_type(&self, name: &str) -> Result<Arc<TypeDescriptor>, CodecError> {
        let chain = self.key_chain(name)?;
        chain
            .last()
            .cloned()
            .ok_or_else(|| CodecError::MissingKeyAncestor {
                type_name: TypeName::new(name),
            })
    }

    /// All fields of `name` across its hierarchy, base first.
    pub fn field_order(&self, name: &str) -> Result<Arc<[FieldDescriptor]>, CodecError> {
        if let Some(cached) = self.field_orders.get(name) {
            return Ok(Arc::clone(cached.value()));
        }
        let hierarchy = self.hierarchy(name)?;
        let fields: Arc<[FieldDescriptor]> = merge_fields(&hierarchy)?.into();
        self.field_orders
            .insert(TypeName::new(name), Arc::clone(&fields));
        Ok(fields)
    }

    /// Whether `sub` is `base` or inherits from it. Unknown names are never subtypes.
    pub fn is_subtype(&self, sub: &str, base: &str) -> bool {
        self.hierarchy(sub)
            .map(|chain| chain.iter().any(|d| d.name() == base))
            .unwrap_or(false)
    }

    /// Check that every type named in a field resolves to the right kind.
    ///
    /// Field types may reference types registered later, so this is run
    /// once warm-up is complete rather than at each registration.
    pub fn check_references(&self) -> Result<(), CodecError> {
        let descriptors: Vec<Arc<TypeDescriptor>> = self.types.read().values().cloned().collect();
        for descriptor in descriptors {
            for field in descriptor.own_fields() {
                self.check_field_references(&descriptor, &field.ty)?;
            }
        }
        Ok(())
    }

    fn check_field_references(
        &self,
        owner: &TypeDescriptor,
        ty: &DeclaredType,
    ) -> Result<(), CodecError> {
        match ty {
            DeclaredType::Primitive(_) => Ok(()),
            DeclaredType::Enum(name) => match self.resolve(name)?.kind() {
                TypeKind::Enum(_) => Ok(()),
                TypeKind::Record(_) => Err(Self::invalid(
                    owner,
                    format!("`{name}` is used as an enum but is a record type"),
                )),
            },
            DeclaredType::Record(name) => match self.resolve(name)?.kind() {
                TypeKind::Record(_) => Ok(()),
                TypeKind::Enum(_) => Err(Self::invalid(
                    owner,
                    format!("`{name}` is used as a record but is an enum"),
                )),
            },
            DeclaredType::List(inner) | DeclaredType::Map(inner) => {
                self.check_field_references(owner, inner)
            }
            DeclaredType::Union(alternatives) => alternatives
                .iter()
                .try_for_each(|alt| self.check_field_references(owner, alt)),
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.read().get(name).cloned()
    }

    fn load_from_source(&self, name: &str) -> Result<(), CodecError> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        let guard = (thread::current().id(), TypeName::new(name));
        if !self.loading.lock().insert(guard.clone()) {
            return Err(CodecError::InvalidSchema {
                type_name: TypeName::new(name),
                reason: "inheritance cycle while loading from type source".to_string(),
            });
        }
        let loaded = source.load(name);
        let result = match loaded {
            Some(descriptor) if descriptor.name() != name => Err(CodecError::InvalidSchema {
                type_name: descriptor.name().clone(),
                reason: format!("type source returned it for `{name}`"),
            }),
            Some(descriptor) => {
                tracing::debug!(name, "loading type from source");
                self.register(descriptor)
            }
            None => Ok(()),
        };
        self.loading.lock().remove(&guard);
        result
    }

    /// Base-first chain ending with `descriptor`, resolving each base.
    fn walk_hierarchy(
        &self,
        descriptor: &Arc<TypeDescriptor>,
    ) -> Result<Vec<Arc<TypeDescriptor>>, CodecError> {
        let mut chain = vec![Arc::clone(descriptor)];
        let mut current = Arc::clone(descriptor);
        while let Some(base_name) = current.base() {
            let base = self.resolve(base_name)?;
            if base.as_record().is_none() {
                return Err(Self::invalid(
                    descriptor,
                    format!("base `{base_name}` is not a record type"),
                ));
            }
            if chain.iter().any(|d| d.name() == base.name()) {
                return Err(Self::invalid(
                    descriptor,
                    format!("inheritance cycle through `{base_name}`"),
                ));
            }
            chain.push(Arc::clone(&base));
            current = base;
        }
        chain.reverse();
        Ok(chain)
    }

    fn check_identical(
        existing: &TypeDescriptor,
        incoming: &TypeDescriptor,
    ) -> Result<(), CodecError> {
        if existing.same_schema(incoming) {
            tracing::trace!(name = %incoming.name(), "already registered");
            Ok(())
        } else {
            Err(CodecError::DuplicateTypeName {
                name: incoming.name().clone(),
            })
        }
    }

    /// Checks that need nothing but the descriptor itself.
    fn check_definition(descriptor: &TypeDescriptor) -> Result<(), CodecError> {
        let name = descriptor.name();
        if !name.is_valid() {
            return Err(CodecError::InvalidTypeName {
                name: name.to_string(),
            });
        }

        match descriptor.kind() {
            TypeKind::Enum(def) => {
                if def.members.is_empty() {
                    return Err(Self::invalid(descriptor, "enum has no members"));
                }
                let mut seen = FxHashSet::default();
                for member in &def.members {
                    if !is_identifier(member) {
                        return Err(CodecError::InvalidTypeName {
                            name: format!("{name}.{member}"),
                        });
                    }
                    if !seen.insert(member.as_str()) {
                        return Err(Self::invalid(
                            descriptor,
                            format!("member `{member}` declared twice"),
                        ));
                    }
                }
            }
            TypeKind::Record(def) => {
                if def.base.as_ref() == Some(name) {
                    return Err(Self::invalid(descriptor, "type extends itself"));
                }
                let mut seen = FxHashSet::default();
                for field in &def.fields {
                    if !is_identifier(&field.name) || RESERVED_FIELDS.contains(&field.name.as_str())
                    {
                        return Err(Self::invalid(
                            descriptor,
                            format!("`{}` cannot be used as a field name", field.name),
                        ));
                    }
                    if !seen.insert(field.name.as_str()) {
                        return Err(Self::invalid(
                            descriptor,
                            format!("field `{}` declared twice", field.name),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn invalid(descriptor: &TypeDescriptor, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidSchema {
            type_name: descriptor.name().clone(),
            reason: reason.into(),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

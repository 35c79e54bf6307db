//! The registration table that replaces class and member decorators.
//!
//! Entries are keyed by the type of the class and an optional member name.
//! A member with a logger override is intercepted; a member without one is
//! passed through untouched. Foreign metadata can be attached to the same keys
//! and is never touched by wrapping.
//!
//! Overrides are meant to be attached once at startup, before the class is
//! used; lookups clone the stored layer so a later re-attachment never affects
//! calls already in flight.

use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{StaticCowStr, config::PartialLoggerConfig, extensions::Extensions};

/// What is attached to a class or to one of its members.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub logger: Option<PartialLoggerConfig>,
    pub extensions: Extensions,
}

#[derive(Debug, Default)]
struct ClassEntry {
    class: Metadata,
    members: HashMap<StaticCowStr, Metadata>,
}

impl ClassEntry {
    fn metadata(&self, member: Option<&str>) -> Option<&Metadata> {
        match member {
            Some(member) => self.members.get(member),
            None => Some(&self.class),
        }
    }

    fn metadata_mut(&mut self, member: Option<&str>) -> &mut Metadata {
        match member {
            Some(member) => self
                .members
                .entry(StaticCowStr::Owned(member.to_owned()))
                .or_default(),
            None => &mut self.class,
        }
    }
}

type Registry = HashMap<TypeId, ClassEntry>;

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

fn registry() -> RwLockReadGuard<'static, Registry> {
    REGISTRY
        .get_or_init(RwLock::default)
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

fn registry_mut() -> RwLockWriteGuard<'static, Registry> {
    REGISTRY
        .get_or_init(RwLock::default)
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}

fn with_metadata_mut<T: 'static>(member: Option<&str>, f: impl FnOnce(&mut Metadata)) {
    let mut registry = registry_mut();
    let entry = registry.entry(TypeId::of::<T>()).or_default();
    f(entry.metadata_mut(member));
}

fn with_metadata<T: 'static, R>(
    member: Option<&str>,
    f: impl FnOnce(&Metadata) -> Option<R>,
) -> Option<R> {
    let registry = registry();
    let metadata = registry.get(&TypeId::of::<T>())?.metadata(member)?;
    f(metadata)
}

/// Attaches a class-level override to `T`.
pub fn attach_class<T: 'static>(config: PartialLoggerConfig) {
    with_metadata_mut::<T>(None, |metadata| metadata.logger = Some(config));
}

/// Marks `member` of `T` as intercepted, with the given override.
pub fn attach_member<T: 'static>(member: &str, config: PartialLoggerConfig) {
    log::trace!(
        "Attaching logger to {}::{member}",
        std::any::type_name::<T>()
    );
    with_metadata_mut::<T>(Some(member), |metadata| metadata.logger = Some(config));
}

/// Attaches foreign metadata to `T`, or to one of its members.
pub fn attach_extension<T, V>(member: Option<&str>, value: V)
where
    T: 'static,
    V: Send + Sync + 'static,
{
    with_metadata_mut::<T>(member, |metadata| {
        metadata.extensions.insert(value);
    });
}

/// The class-level override of `T`, if any.
#[must_use]
pub fn class_override<T: 'static>() -> Option<PartialLoggerConfig> {
    with_metadata::<T, _>(None, |metadata| metadata.logger.clone())
}

/// The override of `member`; `None` means the member is not intercepted.
#[must_use]
pub fn member_override<T: 'static>(member: &str) -> Option<PartialLoggerConfig> {
    with_metadata::<T, _>(Some(member), |metadata| metadata.logger.clone())
}

/// Foreign metadata of type `V` attached to `T` or to one of its members.
#[must_use]
pub fn extension<T, V>(member: Option<&str>) -> Option<Arc<V>>
where
    T: 'static,
    V: Send + Sync + 'static,
{
    with_metadata::<T, _>(member, |metadata| metadata.extensions.get::<V>())
}

/// A copy of everything attached to `T` or to one of its members.
#[must_use]
pub fn metadata<T: 'static>(member: Option<&str>) -> Option<Metadata> {
    with_metadata::<T, _>(member, |metadata| Some(metadata.clone()))
}

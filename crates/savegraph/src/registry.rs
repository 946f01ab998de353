// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: one live descriptor per type name.
//!
//! # Concurrency
//!
//! - Classification and registration run under one [`ReentrantMutex`];
//!   classifying a container re-enters the lock to resolve its element
//!   types on the same thread.
//! - Repeated lookups of the same type are served from a single-slot
//!   last-accessed cache ([`ArcSwapOption`]) without taking the lock.
//! - Polymorphism tags resolve through a [`DashMap`] that readers access
//!   concurrently with classification.
//!
//! # Classification order
//!
//! Enum, array (rank 1..=3), generic container, primitive (must be seeded),
//! `object`, composite. Forward references resolve through the tag table
//! and are never cached under their own entry.

use crate::descriptor::{
    ArrayDescriptor, CompositeDescriptor, DescriptorRef, DictionaryDescriptor, EnumDescriptor,
    PolymorphicDescriptor, PrimitiveDescriptor, SequenceDescriptor, SequenceKind,
};
use crate::error::{CodecError, Result};
use crate::members::MemberTable;
use crate::types::{
    Abstraction, GenericKind, PrimitiveKind, TypeInfo, TypeRef, TypeShape,
};
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Lookups served by the last-accessed slot.
    pub slot_hits: u64,
    /// Lookups served by the locked map.
    pub map_hits: u64,
    /// Types classified on first use.
    pub classified: u64,
    /// Live entries, unsupported ones included.
    pub entries: usize,
}

#[derive(Debug, Clone)]
enum Entry {
    Ready {
        descriptor: DescriptorRef,
        /// Built by classification; rebuilt after an override so nested
        /// descriptor references pick up the replacement.
        derived: bool,
    },
    Unsupported(String),
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<Arc<str>, Entry>,
}

#[derive(Debug)]
struct Slot {
    name: Arc<str>,
    descriptor: DescriptorRef,
}

#[derive(Debug, Default)]
struct Counters {
    slot_hits: AtomicU64,
    map_hits: AtomicU64,
    classified: AtomicU64,
}

/// Registry of type descriptors (the type manager).
pub struct Registry {
    state: ReentrantMutex<RefCell<State>>,
    last: ArcSwapOption<Slot>,
    tags: DashMap<Arc<str>, TypeRef>,
    counters: Counters,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry seeded with every primitive and `object`.
    pub fn new() -> Self {
        let registry = Self {
            state: ReentrantMutex::new(RefCell::new(State::default())),
            last: ArcSwapOption::empty(),
            tags: DashMap::new(),
            counters: Counters::default(),
        };
        registry.seed();
        registry
    }

    /// Fresh registry with hand-written descriptors applied in order.
    pub fn with_overrides<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = DescriptorRef>,
    {
        let registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        registry
    }

    /// Process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Drop every entry, tag and counter, then re-seed.
    pub fn reset(&self) {
        let guard = self.state.lock();
        guard.borrow_mut().entries.clear();
        self.tags.clear();
        self.last.store(None);
        self.counters.slot_hits.store(0, Ordering::Relaxed);
        self.counters.map_hits.store(0, Ordering::Relaxed);
        self.counters.classified.store(0, Ordering::Relaxed);
        self.seed();
        log::debug!("[registry] reset");
    }

    fn seed(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        for kind in PrimitiveKind::ALL {
            let descriptor: DescriptorRef = Arc::new(PrimitiveDescriptor::new(kind));
            self.insert_seed(&mut state, descriptor);
        }
        if let Some(any) = PolymorphicDescriptor::new(TypeInfo::any()) {
            self.insert_seed(&mut state, Arc::new(any));
        }
    }

    fn insert_seed(&self, state: &mut State, descriptor: DescriptorRef) {
        let ty = descriptor.type_ref().clone();
        self.tags.insert(ty.name_arc().clone(), ty.clone());
        state.entries.insert(
            ty.name_arc().clone(),
            Entry::Ready {
                descriptor,
                derived: false,
            },
        );
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Cached descriptor for `ty`, without classification.
    pub fn get(&self, ty: &TypeInfo) -> Option<DescriptorRef> {
        self.get_by_name(ty.name())
    }

    pub fn get_by_name(&self, name: &str) -> Option<DescriptorRef> {
        match self.lookup(name) {
            Some(Entry::Ready { descriptor, .. }) => Some(descriptor),
            _ => None,
        }
    }

    /// Descriptor for `ty`, classifying it on first use.
    ///
    /// Fails with [`CodecError::UnsupportedType`] when no strategy applies.
    pub fn get_or_create(&self, ty: &TypeRef) -> Result<DescriptorRef> {
        if let Some(entry) = self.lookup(ty.name()) {
            return Self::entry_result(ty.name(), entry);
        }

        let guard = self.state.lock();
        if let Some(entry) = guard.borrow().entries.get(ty.name()).cloned() {
            return Self::entry_result(ty.name(), entry);
        }

        if ty.is_forward_ref() {
            return match self.resolve_tag(ty.name()) {
                Some(target) if !target.is_forward_ref() => self.get_or_create(&target),
                _ => Err(CodecError::unsupported(
                    ty.name(),
                    "forward reference to a type that was never declared",
                )),
            };
        }

        // No RefCell borrow is held here: classification re-enters.
        let outcome = self.classify(ty);

        let mut state = guard.borrow_mut();
        match outcome {
            Ok(descriptor) => {
                let descriptor = match state.entries.get(ty.name()) {
                    Some(Entry::Ready { descriptor, .. }) => descriptor.clone(),
                    _ => {
                        state.entries.insert(
                            ty.name_arc().clone(),
                            Entry::Ready {
                                descriptor: descriptor.clone(),
                                derived: true,
                            },
                        );
                        descriptor
                    }
                };
                drop(state);
                self.tags.insert(ty.name_arc().clone(), ty.clone());
                self.counters.classified.fetch_add(1, Ordering::Relaxed);
                self.remember(ty.name_arc(), &descriptor);
                log::debug!(
                    "[registry] classified {} as {:?}",
                    ty.name(),
                    descriptor.kind()
                );
                Ok(descriptor)
            }
            Err(CodecError::UnsupportedType { type_name, reason }) => {
                state
                    .entries
                    .insert(ty.name_arc().clone(), Entry::Unsupported(reason.clone()));
                log::debug!("[registry] {} is unsupported: {}", ty.name(), reason);
                Err(CodecError::UnsupportedType { type_name, reason })
            }
            Err(other) => Err(other),
        }
    }

    /// Speculative lookup: an unsupported type yields `Ok(None)` instead of
    /// an error. Registry consistency errors still propagate.
    pub fn probe(&self, ty: &TypeRef) -> Result<Option<DescriptorRef>> {
        match self.get_or_create(ty) {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(CodecError::UnsupportedType { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// Descriptor for the runtime type carried by a value.
    pub fn runtime_descriptor(&self, type_name: &str) -> Result<DescriptorRef> {
        let ty = self.resolve_tag(type_name).ok_or_else(|| {
            CodecError::unsupported(type_name, "runtime type was never declared or registered")
        })?;
        self.get_or_create(&ty)
    }

    fn lookup(&self, name: &str) -> Option<Entry> {
        if let Some(slot) = self.last.load().as_ref() {
            if &*slot.name == name {
                self.counters.slot_hits.fetch_add(1, Ordering::Relaxed);
                return Some(Entry::Ready {
                    descriptor: slot.descriptor.clone(),
                    derived: false,
                });
            }
        }

        let guard = self.state.lock();
        let state = guard.borrow();
        let (key, entry) = state.entries.get_key_value(name)?;
        self.counters.map_hits.fetch_add(1, Ordering::Relaxed);
        if let Entry::Ready { descriptor, .. } = entry {
            self.remember(key, descriptor);
        }
        Some(entry.clone())
    }

    fn remember(&self, name: &Arc<str>, descriptor: &DescriptorRef) {
        self.last.store(Some(Arc::new(Slot {
            name: name.clone(),
            descriptor: descriptor.clone(),
        })));
    }

    fn entry_result(name: &str, entry: Entry) -> Result<DescriptorRef> {
        match entry {
            Entry::Ready { descriptor, .. } => Ok(descriptor),
            Entry::Unsupported(reason) => Err(CodecError::unsupported(name, reason)),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Insert or override the descriptor for its type.
    ///
    /// Takes effect only if `descriptor.priority()` is greater than or equal
    /// to the live descriptor's priority. Returns whether it took effect.
    pub fn register(&self, descriptor: DescriptorRef) -> bool {
        let ty = descriptor.type_ref().clone();
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();

        let replaced = match state.entries.get(ty.name()) {
            Some(Entry::Ready { descriptor: live, .. }) => {
                if descriptor.priority() < live.priority() {
                    log::debug!(
                        "[registry] kept {} (priority {} over {})",
                        ty.name(),
                        live.priority(),
                        descriptor.priority()
                    );
                    return false;
                }
                true
            }
            _ => false,
        };

        state.entries.insert(
            ty.name_arc().clone(),
            Entry::Ready {
                descriptor: descriptor.clone(),
                derived: false,
            },
        );
        // Containers classified against an unsupported or replaced entry
        // are rebuilt on next use.
        let before = state.entries.len();
        state.entries.retain(|_, entry| match entry {
            Entry::Unsupported(_) => false,
            Entry::Ready { derived, .. } => !(replaced && *derived),
        });
        let evicted = before - state.entries.len();
        drop(state);

        self.tags.insert(ty.name_arc().clone(), ty.clone());
        self.last.store(None);
        log::info!(
            "[registry] registered {} ({:?}, priority {}, {} derived entries evicted)",
            ty.name(),
            descriptor.kind(),
            descriptor.priority(),
            evicted
        );
        true
    }

    /// Make `ty` resolvable as a polymorphism tag before its first use.
    pub fn declare(&self, ty: &TypeRef) {
        if ty.is_forward_ref() {
            return;
        }
        self.tags
            .entry(ty.name_arc().clone())
            .or_insert_with(|| ty.clone());
    }

    /// Resolve a polymorphism tag to its declared type.
    ///
    /// Array and built-in container tags (`int[,]`, `List<Game.Unit>`) are
    /// rebuilt from their name when every leaf inside them resolves.
    pub fn resolve_tag(&self, tag: &str) -> Option<TypeRef> {
        if let Some(ty) = self.declared(tag) {
            return Some(ty);
        }
        let ty = TypeInfo::parse_name(tag, &mut |leaf: &str| self.declared(leaf))?;
        if ty.name() != tag {
            return None;
        }
        log::debug!("[registry] rebuilt {} from its tag", tag);
        self.tags.insert(ty.name_arc().clone(), ty.clone());
        Some(ty)
    }

    fn declared(&self, name: &str) -> Option<TypeRef> {
        self.tags.get(name).map(|entry| entry.value().clone())
    }

    // ========================================================================
    // Validation and introspection
    // ========================================================================

    /// Classify `ty` and everything reachable from it now, so coverage gaps
    /// surface at startup instead of in the middle of a save.
    pub fn validate(&self, ty: &TypeRef) -> Result<()> {
        let mut visited: HashSet<Arc<str>> = HashSet::new();
        let mut pending = vec![self.get_or_create(ty)?];
        while let Some(descriptor) = pending.pop() {
            if !visited.insert(descriptor.type_ref().name_arc().clone()) {
                continue;
            }
            pending.extend(descriptor.children(self)?);
        }
        Ok(())
    }

    /// [`validate`](Self::validate) every declared type.
    pub fn validate_declared(&self) -> Result<()> {
        let declared: Vec<TypeRef> = self.tags.iter().map(|e| e.value().clone()).collect();
        for ty in &declared {
            self.validate(ty)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> RegistryStats {
        let entries = {
            let guard = self.state.lock();
            let len = guard.borrow().entries.len();
            len
        };
        RegistryStats {
            slot_hits: self.counters.slot_hits.load(Ordering::Relaxed),
            map_hits: self.counters.map_hits.load(Ordering::Relaxed),
            classified: self.counters.classified.load(Ordering::Relaxed),
            entries,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(Entry::Ready { .. }))
    }

    // ========================================================================
    // Classification
    // ========================================================================

    fn classify(&self, ty: &TypeRef) -> Result<DescriptorRef> {
        match ty.shape() {
            TypeShape::Enum(_) => EnumDescriptor::new(ty.clone())
                .map(|d| Arc::new(d) as DescriptorRef)
                .ok_or_else(|| CodecError::Internal(format!("{} is not an enum", ty.name()))),
            TypeShape::Array { element, rank } => {
                let element = self.probe_element(ty, element)?;
                Ok(Arc::new(ArrayDescriptor::new(ty.clone(), element, *rank)?))
            }
            TypeShape::Generic { definition, args } => self.classify_generic(ty, definition, args),
            TypeShape::Primitive(kind) => Err(CodecError::Internal(format!(
                "primitive {} was not seeded; the registry is not initialized",
                kind
            ))),
            TypeShape::Any => PolymorphicDescriptor::new(ty.clone())
                .map(|d| Arc::new(d) as DescriptorRef)
                .ok_or_else(|| CodecError::Internal("object is not polymorphic".into())),
            TypeShape::Composite(shape) => {
                MemberTable::check_shape(ty, shape)?;
                if shape.value_type
                    || (shape.constructible && shape.abstraction == Abstraction::Concrete)
                {
                    return CompositeDescriptor::new(ty.clone())
                        .map(|d| Arc::new(d) as DescriptorRef)
                        .ok_or_else(|| {
                            CodecError::Internal(format!("{} is not a composite", ty.name()))
                        });
                }
                if let Some(descriptor) = PolymorphicDescriptor::new(ty.clone()) {
                    return Ok(Arc::new(descriptor));
                }
                Err(CodecError::unsupported(
                    ty.name(),
                    "reference type has no parameterless constructor and is not abstract",
                ))
            }
            TypeShape::Ref => Err(CodecError::Internal(format!(
                "forward reference {} reached classification",
                ty.name()
            ))),
        }
    }

    fn classify_generic(
        &self,
        ty: &TypeRef,
        definition: &GenericKind,
        args: &[TypeRef],
    ) -> Result<DescriptorRef> {
        let arity = match definition {
            GenericKind::Dictionary => 2,
            GenericKind::Other(name) => {
                return Err(CodecError::unsupported(
                    ty.name(),
                    format!("generic collection {} is not supported", name),
                ));
            }
            _ => 1,
        };
        if args.len() != arity {
            return Err(CodecError::unsupported(
                ty.name(),
                format!("expected {} type arguments, found {}", arity, args.len()),
            ));
        }

        if *definition == GenericKind::Dictionary {
            let key = self.probe_element(ty, &args[0])?;
            let value = self.probe_element(ty, &args[1])?;
            return Ok(Arc::new(DictionaryDescriptor::new(ty.clone(), key, value)));
        }

        let kind = SequenceKind::from_generic(definition).ok_or_else(|| {
            CodecError::Internal(format!("{} has no sequence shape", definition.name()))
        })?;
        let element = self.probe_element(ty, &args[0])?;
        Ok(Arc::new(SequenceDescriptor::new(ty.clone(), kind, element)))
    }

    /// An unsupported element type degrades the container to unsupported.
    fn probe_element(&self, container: &TypeRef, element: &TypeRef) -> Result<DescriptorRef> {
        self.probe(element)?.ok_or_else(|| {
            CodecError::unsupported(
                container.name(),
                format!("element type {} is not supported", element.name()),
            )
        })
    }
}

//! Binary metadata resolution backend.
//!
//! Answers queries by reading ECMA-335 tables directly. Base types living in
//! other assemblies are followed by opening the referenced file through the
//! locator; a base that cannot be opened ends the walk with
//! `Search::Continue` so the dispatcher can hand it to another backend.

use crate::cache::ImageCache;
use crate::error::{MetadataError, Result};
use crate::image::MetadataImage;
use crate::locator::AssemblyLocator;
use crate::names::{NameFormatter, TypeRefScope};
use crate::tables::{CodedIndex, TableId, col};
use patchref_common::limits::{DEFAULT_MAX_BASE_DEPTH, MAX_TYPE_REFERENCE_HOPS};
use patchref_model::{
    Accessor, CandidateParam, Inconclusive, InconclusiveReason, MemberKind, MemberQuery, OwnerRef,
    ReflectionName, ResolutionBackend, ResolutionOutcome, Search, TypeDescriptor, TypeIdentity,
    TypeLookup,
};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

const VISIBILITY_MASK: u32 = 0x07;
const NESTED_VISIBILITY_MIN: u32 = 0x02;

/// A TypeDef row of a loaded image, instantiated with `type_args`.
#[derive(Clone)]
pub struct MetadataType {
    pub image: Arc<MetadataImage>,
    pub row: u32,
    pub type_args: Vec<TypeDescriptor>,
}

impl MetadataType {
    pub fn descriptor(&self) -> Result<TypeDescriptor> {
        Ok(NameFormatter::new(&self.image)
            .type_def(self.row)?
            .with_generic(self.type_args.clone()))
    }
}

impl fmt::Debug for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataType")
            .field("image", &self.image.path())
            .field("row", &self.row)
            .field("type_args", &self.type_args)
            .finish()
    }
}

type Located = TypeLookup<(Arc<MetadataImage>, u32)>;

enum Base {
    None,
    Resolved(MetadataType),
    Unresolved(OwnerRef),
}

pub struct MetadataBackend<'a> {
    locator: &'a AssemblyLocator,
    cache: Option<&'a ImageCache>,
    max_base_depth: u32,
}

impl<'a> MetadataBackend<'a> {
    pub fn new(locator: &'a AssemblyLocator) -> Self {
        Self {
            locator,
            cache: None,
            max_base_depth: DEFAULT_MAX_BASE_DEPTH,
        }
    }

    pub fn with_cache(mut self, cache: &'a ImageCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_base_depth(mut self, depth: u32) -> Self {
        self.max_base_depth = depth;
        self
    }

    pub fn locator(&self) -> &AssemblyLocator {
        self.locator
    }

    fn load(&self, path: &Path) -> Result<Arc<MetadataImage>> {
        match self.cache {
            Some(cache) => cache.get_or_load(path),
            None => MetadataImage::open(path).map(Arc::new),
        }
    }

    // =========================================================================
    // Type Lookup
    // =========================================================================

    fn find_in_image(
        &self,
        image: &Arc<MetadataImage>,
        name: &ReflectionName,
        hops: u32,
    ) -> Result<Located> {
        if let Some(row) = find_definition(image, name)? {
            trace!(%name, row, "type definition found");
            return Ok(TypeLookup::Found((Arc::clone(image), row)));
        }
        if hops >= MAX_TYPE_REFERENCE_HOPS {
            return Ok(TypeLookup::NotFound);
        }
        if let Some(assembly) = self.forwarded_assembly(image, name)? {
            return self.find_in_assembly(&assembly, name, hops + 1);
        }
        if let Some(row) = find_reference(image, name)? {
            match NameFormatter::new(image).type_ref_scope(row)? {
                TypeRefScope::Assembly(assembly) => {
                    return self.find_in_assembly(&assembly, name, hops + 1);
                }
                TypeRefScope::Module | TypeRefScope::ModuleRef(_) => {}
            }
        }
        Ok(TypeLookup::NotFound)
    }

    fn find_in_assembly(&self, assembly: &str, name: &ReflectionName, hops: u32) -> Result<Located> {
        match self.locator.locate(assembly) {
            Some(path) => {
                trace!(%name, assembly, "following type reference");
                let image = self.load(path)?;
                self.find_in_image(&image, name, hops)
            }
            None => Ok(TypeLookup::AssemblyNotFound {
                assembly: assembly.to_string(),
            }),
        }
    }

    /// Assembly a top-level ExportedType row forwards `name` to.
    fn forwarded_assembly(&self, image: &MetadataImage, name: &ReflectionName) -> Result<Option<String>> {
        for row in 1..=image.row_count(TableId::ExportedType) {
            let implementation = image.read_coded(
                TableId::ExportedType,
                row,
                col::EXPORTED_IMPLEMENTATION,
                CodedIndex::Implementation,
            )?;
            if implementation.table != TableId::AssemblyRef || implementation.is_null() {
                continue;
            }
            let namespace = image.read_string(TableId::ExportedType, row, col::EXPORTED_NAMESPACE)?;
            let type_name = image.read_string(TableId::ExportedType, row, col::EXPORTED_NAME)?;
            if namespace == name.namespace && ReflectionName::name_matches(&name.name, type_name) {
                return NameFormatter::new(image)
                    .assembly_ref(implementation.row)
                    .map(Some);
            }
        }
        Ok(None)
    }

    /// Searches every located assembly: definitions first, then forwarded
    /// and referenced types.
    fn find_anywhere(&self, name: &ReflectionName) -> std::result::Result<Located, Inconclusive> {
        let mut images = Vec::new();
        let mut unreadable = None;
        for path in self.locator.files() {
            match self.load(path) {
                Ok(image) => images.push(image),
                Err(error) => {
                    debug!(path = %path.display(), %error, "skipping unreadable image");
                    unreadable = Some(error);
                }
            }
        }

        for image in &images {
            if let Some(row) = find_definition(image, name).map_err(unreadable_image)? {
                return Ok(TypeLookup::Found((Arc::clone(image), row)));
            }
        }
        for image in &images {
            match self.find_in_image(image, name, 0).map_err(unreadable_image)? {
                TypeLookup::NotFound => {}
                lookup => return Ok(lookup),
            }
        }
        match unreadable {
            Some(error) => Err(unreadable_image(error)),
            None => Ok(TypeLookup::NotFound),
        }
    }

    // =========================================================================
    // Member Search
    // =========================================================================

    fn search_declared(
        &self,
        ty: &MetadataType,
        query: &MemberQuery,
        owner_name: &str,
    ) -> Result<Option<ResolutionOutcome>> {
        let image = &ty.image;
        let names = NameFormatter::new(image);
        match query.kind {
            MemberKind::Field => {
                for field in image.fields(ty.row)? {
                    if image.read_string(TableId::Field, field, col::FIELD_NAME)? != query.member_name {
                        continue;
                    }
                    if let Some(expected) = &query.field_type {
                        let actual = names.field_type(field)?.substitute(&ty.type_args, &[]);
                        if !actual.same_type(expected) {
                            return Ok(Some(ResolutionOutcome::WrongFieldType {
                                owner: owner_name.to_string(),
                                expected: expected.canonical_string(),
                                actual: actual.canonical_string(),
                            }));
                        }
                    }
                    return Ok(Some(ResolutionOutcome::Found));
                }
            }
            MemberKind::Property => {
                for property in image.properties(ty.row)? {
                    let name = image.read_string(TableId::Property, property, col::PROPERTY_NAME)?;
                    if name != query.member_name {
                        continue;
                    }
                    let accessors = image.property_accessors(property)?;
                    let member_name = query.member_name.clone();
                    return Ok(Some(match query.accessor {
                        Some(Accessor::Getter) if !accessors.getter => {
                            ResolutionOutcome::MissingGetter { member_name }
                        }
                        Some(Accessor::Setter) if !accessors.setter => {
                            ResolutionOutcome::MissingSetter { member_name }
                        }
                        _ => ResolutionOutcome::Found,
                    }));
                }
            }
            MemberKind::Method | MemberKind::Constructor | MemberKind::StaticConstructor => {
                for method in image.methods(ty.row)? {
                    let name = image.read_string(TableId::MethodDef, method, col::METHOD_NAME)?;
                    if name != query.member_name {
                        continue;
                    }
                    let Some(signature) = &query.param_signature else {
                        return Ok(Some(ResolutionOutcome::Found));
                    };
                    let params: Vec<CandidateParam> = names
                        .method_signature(method)?
                        .params
                        .into_iter()
                        .map(|param| {
                            CandidateParam::from_signature(param.substitute(&ty.type_args, &[]))
                        })
                        .collect();
                    if signature.matches(&params) {
                        return Ok(Some(ResolutionOutcome::Found));
                    }
                    trace!(method, "overload rejected by signature");
                }
            }
        }
        Ok(None)
    }

    fn base_type(&self, ty: &MetadataType) -> Result<Base> {
        let image = &ty.image;
        let extends = image.read_coded(
            TableId::TypeDef,
            ty.row,
            col::TYPEDEF_EXTENDS,
            CodedIndex::TypeDefOrRef,
        )?;
        if extends.is_null() {
            return Ok(Base::None);
        }
        match extends.table {
            TableId::TypeDef => Ok(Base::Resolved(MetadataType {
                image: Arc::clone(image),
                row: extends.row,
                type_args: Vec::new(),
            })),
            TableId::TypeRef => self.resolve_type_ref(image, extends.row, Vec::new()),
            TableId::TypeSpec => {
                let names = NameFormatter::new(image);
                let blob = image.read_blob(TableId::TypeSpec, extends.row, col::TYPESPEC_SIGNATURE)?;
                let Some((open, args)) = names.decoder().generic_instance(blob)? else {
                    return Ok(Base::None);
                };
                let args: Vec<TypeDescriptor> = args
                    .iter()
                    .map(|arg| arg.substitute(&ty.type_args, &[]))
                    .collect();
                match open.table {
                    TableId::TypeDef => Ok(Base::Resolved(MetadataType {
                        image: Arc::clone(image),
                        row: open.row,
                        type_args: args,
                    })),
                    TableId::TypeRef => self.resolve_type_ref(image, open.row, args),
                    _ => Ok(Base::None),
                }
            }
            other => Err(MetadataError::Malformed(format!(
                "invalid Extends table {other:?}"
            ))),
        }
    }

    fn resolve_type_ref(
        &self,
        image: &Arc<MetadataImage>,
        row: u32,
        type_args: Vec<TypeDescriptor>,
    ) -> Result<Base> {
        let names = NameFormatter::new(image);
        let descriptor = names.type_ref(row)?;
        let Some(name) = ReflectionName::from_descriptor(&descriptor) else {
            return Ok(Base::None);
        };
        let assembly = match names.type_ref_scope(row)? {
            TypeRefScope::Assembly(assembly) => assembly,
            TypeRefScope::Module | TypeRefScope::ModuleRef(_) => {
                if let Some(found) = find_definition(image, &name)? {
                    return Ok(Base::Resolved(MetadataType {
                        image: Arc::clone(image),
                        row: found,
                        type_args,
                    }));
                }
                image.assembly_name()?.unwrap_or_default().to_string()
            }
        };

        if self.locator.locate(&assembly).is_some() {
            if let TypeLookup::Found((target, found)) = self.find_in_assembly(&assembly, &name, 0)? {
                return Ok(Base::Resolved(MetadataType {
                    image: target,
                    row: found,
                    type_args,
                }));
            }
        }
        debug!(base = %descriptor, assembly, "base type not readable from metadata");
        Ok(Base::Unresolved(OwnerRef::Bound(TypeIdentity::new(
            assembly,
            descriptor.with_generic(type_args),
        ))))
    }
}

impl ResolutionBackend for MetadataBackend<'_> {
    type Handle = MetadataType;

    fn name(&self) -> &'static str {
        "metadata"
    }

    fn find_type(&self, owner: &OwnerRef) -> std::result::Result<TypeLookup<MetadataType>, Inconclusive> {
        let Some(name) = owner.reflection_name() else {
            return Ok(TypeLookup::NotFound);
        };
        let located = match owner.assembly() {
            Some(assembly) => self
                .find_in_assembly(assembly, &name, 0)
                .map_err(unreadable_image)?,
            None => self.find_anywhere(&name)?,
        };
        Ok(match located {
            TypeLookup::Found((image, row)) => TypeLookup::Found(MetadataType {
                image,
                row,
                type_args: owner.type_arguments().to_vec(),
            }),
            TypeLookup::NotFound => TypeLookup::NotFound,
            TypeLookup::AssemblyNotFound { assembly } => TypeLookup::AssemblyNotFound { assembly },
        })
    }

    fn find_member(
        &self,
        ty: &MetadataType,
        query: &MemberQuery,
        depth: u32,
    ) -> std::result::Result<Search, Inconclusive> {
        let owner_name = ty.descriptor().map_err(unreadable_image)?.canonical_string();
        let mut current = ty.clone();
        let mut depth = depth;
        loop {
            if let Some(outcome) = self
                .search_declared(&current, query, &owner_name)
                .map_err(unreadable_image)?
            {
                return Ok(Search::Done(outcome));
            }
            if !query.walks_base_types() || depth >= self.max_base_depth {
                break;
            }
            match self.base_type(&current).map_err(unreadable_image)? {
                Base::None => break,
                Base::Resolved(base) => current = base,
                Base::Unresolved(base) => {
                    return Ok(Search::Continue {
                        base,
                        depth: depth + 1,
                    });
                }
            }
            depth += 1;
        }
        Ok(Search::Done(query.not_found(&owner_name)))
    }
}

fn unreadable_image(error: MetadataError) -> Inconclusive {
    debug!(%error, "metadata read failed");
    Inconclusive::new(InconclusiveReason::UnreadableImage, error.to_string())
}

// =============================================================================
// Name Matching
// =============================================================================

/// Picks the exact match, or else the first arity-tolerant match.
fn pick<'n>(
    requested: &str,
    candidates: impl Iterator<Item = Result<(u32, &'n str)>>,
) -> Result<Option<u32>> {
    let mut tolerant = None;
    for candidate in candidates {
        let (row, name) = candidate?;
        if name == requested {
            return Ok(Some(row));
        }
        if tolerant.is_none() && ReflectionName::name_matches(requested, name) {
            tolerant = Some(row);
        }
    }
    Ok(tolerant)
}

fn find_definition(image: &MetadataImage, name: &ReflectionName) -> Result<Option<u32>> {
    let mut top_level = Vec::new();
    for row in 1..=image.row_count(TableId::TypeDef) {
        let flags = image.read(TableId::TypeDef, row, col::TYPEDEF_FLAGS)?;
        if flags & VISIBILITY_MASK >= NESTED_VISIBILITY_MIN {
            continue;
        }
        if image.read_string(TableId::TypeDef, row, col::TYPEDEF_NAMESPACE)? == name.namespace {
            top_level.push(row);
        }
    }
    let candidates = top_level.iter().map(|&row| {
        image
            .read_string(TableId::TypeDef, row, col::TYPEDEF_NAME)
            .map(|n| (row, n))
    });
    let Some(mut current) = pick(&name.name, candidates)? else {
        return Ok(None);
    };

    for nested in &name.nested {
        let children = image.nested_types(current)?;
        let candidates = children.iter().map(|&row| {
            image
                .read_string(TableId::TypeDef, row, col::TYPEDEF_NAME)
                .map(|n| (row, n))
        });
        match pick(nested, candidates)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Top-level TypeRef naming the outermost type of `name`.
fn find_reference(image: &MetadataImage, name: &ReflectionName) -> Result<Option<u32>> {
    let mut top_level = Vec::new();
    for row in 1..=image.row_count(TableId::TypeRef) {
        let scope = image.read_coded(
            TableId::TypeRef,
            row,
            col::TYPEREF_SCOPE,
            CodedIndex::ResolutionScope,
        )?;
        if scope.table == TableId::TypeRef && !scope.is_null() {
            continue;
        }
        if image.read_string(TableId::TypeRef, row, col::TYPEREF_NAMESPACE)? == name.namespace {
            top_level.push(row);
        }
    }
    let candidates = top_level.iter().map(|&row| {
        image
            .read_string(TableId::TypeRef, row, col::TYPEREF_NAME)
            .map(|n| (row, n))
    });
    pick(&name.name, candidates)
}

#[cfg(test)]
#[path = "../tests/backend_tests.rs"]
mod tests;

//! Query dispatch across the two resolution backends.
//!
//! Backend selection is per owner type: binary metadata when the locator maps
//! the owner's assembly to a file, compiler symbols otherwise. The choice is
//! made again at every base link a backend hands back with
//! `Search::Continue`, so one walk may cross backends several times.

use patchref_common::limits::DEFAULT_MAX_BASE_DEPTH;
use patchref_metadata::{AssemblyLocator, ImageCache, MetadataBackend};
use patchref_model::{
    Inconclusive, InconclusiveReason, MemberQuery, OwnerRef, ReflectionName, Resolution,
    ResolutionBackend, ResolutionOutcome, Search, TypeIdentity, TypeLookup,
};
use patchref_symbols::{SymbolBackend, SymbolTable};
use tracing::{debug, trace};

/// Everything a pass resolves against: referenced assembly files and the
/// symbols the host compiler bound.
#[derive(Debug, Default)]
pub struct Compilation {
    pub locator: AssemblyLocator,
    pub symbols: SymbolTable,
}

impl Compilation {
    pub fn new(locator: AssemblyLocator, symbols: SymbolTable) -> Self {
        Self { locator, symbols }
    }
}

// =============================================================================
// Verdict
// =============================================================================

/// Combined result of a set of alternatives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Inconclusive(Inconclusive),
    /// Every alternative failed; failures are deduplicated, in order.
    Failed(Vec<ResolutionOutcome>),
}

impl Verdict {
    pub fn from_resolution(resolution: Resolution) -> Self {
        match resolution {
            Ok(ResolutionOutcome::Found) => Verdict::Satisfied,
            Ok(failure) => Verdict::Failed(vec![failure]),
            Err(inconclusive) => Verdict::Inconclusive(inconclusive),
        }
    }

    /// Any success suffices. Otherwise an inconclusive alternative suppresses
    /// the failures, and only when every alternative failed are all failures
    /// reported. Stops consuming `verdicts` at the first success.
    pub fn combine(verdicts: impl IntoIterator<Item = Verdict>) -> Self {
        let mut inconclusive = None;
        let mut failures: Vec<ResolutionOutcome> = Vec::new();
        for verdict in verdicts {
            match verdict {
                Verdict::Satisfied => return Verdict::Satisfied,
                Verdict::Inconclusive(reason) => {
                    inconclusive.get_or_insert(reason);
                }
                Verdict::Failed(outcomes) => {
                    for outcome in outcomes {
                        if !failures.contains(&outcome) {
                            failures.push(outcome);
                        }
                    }
                }
            }
        }
        match inconclusive {
            Some(reason) => Verdict::Inconclusive(reason),
            None => Verdict::Failed(failures),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }

    pub fn failures(&self) -> &[ResolutionOutcome] {
        match self {
            Verdict::Failed(failures) => failures,
            _ => &[],
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

enum Step {
    Done(ResolutionOutcome),
    Continue { base: OwnerRef, depth: u32 },
    /// The backend cannot see the type; carries the missing assembly, if any.
    Missing(Option<String>),
}

enum Route {
    /// Metadata first, with the owner rebound to its declaring assembly.
    Metadata(OwnerRef),
    Symbols,
}

fn run<B: ResolutionBackend>(
    backend: &B,
    owner: &OwnerRef,
    query: &MemberQuery,
    depth: u32,
) -> Result<Step, Inconclusive> {
    trace!(backend = backend.name(), %owner, depth, "resolving owner");
    let handle = match backend.find_type(owner)? {
        TypeLookup::Found(handle) => handle,
        TypeLookup::NotFound => return Ok(Step::Missing(None)),
        TypeLookup::AssemblyNotFound { assembly } => return Ok(Step::Missing(Some(assembly))),
    };
    Ok(match backend.find_member(&handle, query, depth)? {
        Search::Done(outcome) => Step::Done(outcome),
        Search::Continue { base, depth } => Step::Continue { base, depth },
    })
}

/// Owner name used in diagnostics: canonical, arity stripped.
fn owner_label(owner: &OwnerRef) -> String {
    match owner {
        OwnerRef::Bound(_) => owner.display_name(),
        OwnerRef::Name(name) => ReflectionName::parse(name)
            .map(|parsed| parsed.to_descriptor().canonical_string())
            .unwrap_or_else(|| name.clone()),
    }
}

pub struct Dispatcher<'a> {
    compilation: &'a Compilation,
    cache: Option<&'a ImageCache>,
    max_base_depth: u32,
}

impl<'a> Dispatcher<'a> {
    pub fn new(compilation: &'a Compilation) -> Self {
        Self {
            compilation,
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

    fn metadata(&self) -> MetadataBackend<'a> {
        let backend =
            MetadataBackend::new(&self.compilation.locator).with_max_base_depth(self.max_base_depth);
        match self.cache {
            Some(cache) => backend.with_cache(cache),
            None => backend,
        }
    }

    fn symbols(&self) -> SymbolBackend<'a> {
        SymbolBackend::new(&self.compilation.symbols).with_max_base_depth(self.max_base_depth)
    }

    fn route(&self, owner: &OwnerRef) -> Route {
        let locator = &self.compilation.locator;
        match owner {
            OwnerRef::Bound(identity) if locator.locate(&identity.assembly).is_some() => {
                Route::Metadata(owner.clone())
            }
            OwnerRef::Bound(_) => Route::Symbols,
            OwnerRef::Name(name) => {
                let table = &self.compilation.symbols;
                let Some(id) = table.get_type_by_metadata_name(name) else {
                    return Route::Metadata(owner.clone());
                };
                match table.get(id) {
                    Some(symbol) if locator.locate(&symbol.assembly).is_some() => Route::Metadata(
                        OwnerRef::Bound(TypeIdentity::new(symbol.assembly.clone(), table.descriptor(id))),
                    ),
                    _ => Route::Symbols,
                }
            }
        }
    }

    /// One hop: the selected backend first, the other one when the selected
    /// backend cannot see the type at all.
    fn step(&self, owner: &OwnerRef, query: &MemberQuery, depth: u32) -> Result<Step, Inconclusive> {
        let metadata = self.metadata();
        let symbols = self.symbols();
        let (first, fallback_to_metadata) = match self.route(owner) {
            Route::Metadata(rebound) => {
                debug!(%owner, "owner routed to metadata");
                (run(&metadata, &rebound, query, depth)?, false)
            }
            Route::Symbols => {
                debug!(%owner, "owner routed to symbols");
                (run(&symbols, owner, query, depth)?, true)
            }
        };
        if !matches!(first, Step::Missing(_)) {
            return Ok(first);
        }
        let second = if fallback_to_metadata {
            run(&metadata, owner, query, depth)?
        } else {
            run(&symbols, owner, query, depth)?
        };
        Ok(match second {
            Step::Missing(_) => first,
            found => found,
        })
    }

    /// Resolves `query` against one owner, following base links across
    /// backends.
    pub fn resolve(&self, owner: &OwnerRef, query: &MemberQuery) -> Resolution {
        let label = owner_label(owner);
        let mut current = owner.clone();
        let mut depth = 0;
        loop {
            match self.step(&current, query, depth)? {
                Step::Done(outcome) if depth == 0 => return Ok(outcome),
                Step::Done(outcome) => return Ok(outcome.with_owner_name(&label)),
                Step::Continue { base, depth: next } => {
                    debug!(owner = %label, %base, depth = next, "base walk handed over");
                    current = base;
                    depth = next;
                }
                Step::Missing(assembly) if depth == 0 => {
                    return Ok(match assembly {
                        Some(assembly) => ResolutionOutcome::AssemblyNotFound {
                            assembly,
                            type_name: label,
                        },
                        None => ResolutionOutcome::type_not_found(label),
                    });
                }
                Step::Missing(_) => {
                    debug!(owner = %label, base = %current, "base link cannot be followed");
                    return Err(Inconclusive::new(
                        InconclusiveReason::BrokenBaseLink,
                        format!("base type `{current}` of `{label}`"),
                    ));
                }
            }
        }
    }

    /// All owner candidates of one query; one success suffices.
    pub fn check_query(&self, query: &MemberQuery) -> Verdict {
        Verdict::combine(
            query
                .owner_candidates
                .iter()
                .map(|owner| Verdict::from_resolution(self.resolve(owner, query))),
        )
    }

    /// Alternative queries of one call site; one success suffices.
    pub fn check_queries(&self, queries: &[MemberQuery]) -> Verdict {
        Verdict::combine(queries.iter().map(|query| self.check_query(query)))
    }
}

#[cfg(test)]
#[path = "../tests/dispatch_tests.rs"]
mod tests;

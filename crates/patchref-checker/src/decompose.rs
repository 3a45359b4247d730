//! Method identifier decomposition.
//!
//! Lookup helpers encode their intent in the method name: `DeclaredField`,
//! `PropertySetter`, `MethodDelegate`. The name is reduced by an ordered
//! table of prefix and suffix rules; whatever is left over means the call is
//! not a member lookup.
//!
//! | # | Anchor | Text | Sets | Skipped when | Requires |
//! |---|---|---|---|---|---|
//! | 1 | prefix | `Get` | | | |
//! | 2 | prefix | `Declared` | `DECLARED` | | |
//! | 3 | prefix | `Property` | `PROPERTY` | a kind is set | |
//! | 4 | prefix | `Setter` | `SETTER` | an accessor is set | `PROPERTY` |
//! | 5 | prefix | `Getter` | `GETTER` | an accessor is set | `PROPERTY` |
//! | 6 | prefix | `Field` | `FIELD` | a kind is set | |
//! | 7 | prefix | `Method` | `METHOD` | a kind is set | |
//! | 8 | prefix | `Constructor` | `CONSTRUCTOR` | a kind is set | |
//! | 9 | suffix | `Delegate` | `DELEGATE` | | |
//!
//! A name that sets no kind defaults to `METHOD`.

use bitflags::bitflags;
use patchref_model::{Accessor, MemberKind};

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct LookupFlags: u16 {
        /// Members declared on the owner only; no base-type search.
        const DECLARED = 1 << 0;
        const FIELD = 1 << 1;
        const PROPERTY = 1 << 2;
        const METHOD = 1 << 3;
        const CONSTRUCTOR = 1 << 4;
        const GETTER = 1 << 5;
        const SETTER = 1 << 6;
        /// Delegate-producing variant; no effect on the lookup itself.
        const DELEGATE = 1 << 7;

        const KINDS = Self::FIELD.bits()
            | Self::PROPERTY.bits()
            | Self::METHOD.bits()
            | Self::CONSTRUCTOR.bits();
        const ACCESSORS = Self::GETTER.bits() | Self::SETTER.bits();
    }
}

impl LookupFlags {
    pub fn member_kind(self) -> MemberKind {
        if self.contains(LookupFlags::FIELD) {
            MemberKind::Field
        } else if self.contains(LookupFlags::PROPERTY) {
            MemberKind::Property
        } else if self.contains(LookupFlags::CONSTRUCTOR) {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        }
    }

    pub fn accessor(self) -> Option<Accessor> {
        if self.contains(LookupFlags::GETTER) {
            Some(Accessor::Getter)
        } else if self.contains(LookupFlags::SETTER) {
            Some(Accessor::Setter)
        } else {
            None
        }
    }

    pub fn searches_base(self) -> bool {
        !self.contains(LookupFlags::DECLARED)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Anchor {
    Prefix,
    Suffix,
}

#[derive(Copy, Clone, Debug)]
struct Rule {
    anchor: Anchor,
    text: &'static str,
    flag: LookupFlags,
    /// The rule is skipped when any of these flags is already set.
    group: LookupFlags,
    /// The rule applies only when all of these flags are set.
    requires: LookupFlags,
}

const fn prefix(text: &'static str, flag: LookupFlags, group: LookupFlags, requires: LookupFlags) -> Rule {
    Rule {
        anchor: Anchor::Prefix,
        text,
        flag,
        group,
        requires,
    }
}

const NONE: LookupFlags = LookupFlags::empty();

const RULES: [Rule; 9] = [
    prefix("Get", NONE, NONE, NONE),
    prefix("Declared", LookupFlags::DECLARED, NONE, NONE),
    prefix("Property", LookupFlags::PROPERTY, LookupFlags::KINDS, NONE),
    prefix("Setter", LookupFlags::SETTER, LookupFlags::ACCESSORS, LookupFlags::PROPERTY),
    prefix("Getter", LookupFlags::GETTER, LookupFlags::ACCESSORS, LookupFlags::PROPERTY),
    prefix("Field", LookupFlags::FIELD, LookupFlags::KINDS, NONE),
    prefix("Method", LookupFlags::METHOD, LookupFlags::KINDS, NONE),
    prefix("Constructor", LookupFlags::CONSTRUCTOR, LookupFlags::KINDS, NONE),
    Rule {
        anchor: Anchor::Suffix,
        text: "Delegate",
        flag: LookupFlags::DELEGATE,
        group: NONE,
        requires: NONE,
    },
];

/// Decomposes a lookup helper's method name. `None` if the name is not a
/// member lookup.
pub fn decompose(method: &str) -> Option<LookupFlags> {
    let mut rest = method;
    let mut flags = LookupFlags::empty();
    for rule in &RULES {
        if flags.intersects(rule.group) || !flags.contains(rule.requires) {
            continue;
        }
        let stripped = match rule.anchor {
            Anchor::Prefix => rest.strip_prefix(rule.text),
            Anchor::Suffix => rest.strip_suffix(rule.text),
        };
        if let Some(stripped) = stripped {
            rest = stripped;
            flags |= rule.flag;
        }
    }
    if !rest.is_empty() {
        return None;
    }
    if !flags.intersects(LookupFlags::KINDS) {
        flags |= LookupFlags::METHOD;
    }
    Some(flags)
}

#[cfg(test)]
#[path = "../tests/decompose_tests.rs"]
mod tests;

use super::*;
use crate::descriptor::PrimitiveType;

fn int() -> TypeDescriptor {
    PrimitiveType::Int32.into()
}

fn string() -> TypeDescriptor {
    PrimitiveType::String.into()
}

fn owner() -> OwnerRef {
    OwnerRef::Name("Game.Player".to_string())
}

#[test]
fn test_constructor_queries_use_reserved_names() {
    let ctor = MemberQuery::constructor(owner(), false);
    assert_eq!(ctor.member_name, ".ctor");
    assert!(!ctor.search_base);
    assert!(!ctor.walks_base_types());

    let cctor = MemberQuery::constructor(owner(), true);
    assert_eq!(cctor.kind, MemberKind::StaticConstructor);
    assert_eq!(cctor.member_name, ".cctor");
}

#[test]
fn test_declared_disables_base_search() {
    let query = MemberQuery::field(owner(), "health");
    assert!(query.walks_base_types());
    assert!(!query.declared().walks_base_types());
}

#[test]
fn test_with_kind_drops_inapplicable_filters() {
    let query = MemberQuery::method(owner(), "Heal")
        .with_params(ParamSignature::from_types(vec![int()]))
        .with_accessor(Accessor::Getter);
    let as_field = query.with_kind(MemberKind::Field);
    assert!(as_field.param_signature.is_none());
    assert!(as_field.accessor.is_none());
    let as_property = query.with_kind(MemberKind::Property);
    assert_eq!(as_property.accessor, Some(Accessor::Getter));
}

#[test]
fn test_signature_without_modes_compares_types_exactly() {
    let sig = ParamSignature::from_types(vec![string(), int()]);
    let exact = [
        CandidateParam::from_signature(string()),
        CandidateParam::from_signature(int()),
    ];
    assert!(sig.matches(&exact));
    assert!(!sig.matches(&exact[..1]));

    let by_ref = [
        CandidateParam::from_signature(string()),
        CandidateParam::from_signature(int().with_by_ref()),
    ];
    assert!(!sig.matches(&by_ref));
    let spelled = ParamSignature::from_types(vec![string(), int().with_by_ref()]);
    assert!(spelled.matches(&by_ref));
}

#[test]
fn test_ref_mode_requires_byref() {
    let sig = ParamSignature::with_modes(vec![int()], vec![PassingMode::Ref]).expect("lengths");
    assert!(sig.matches(&[CandidateParam::from_signature(int().with_by_ref())]));
    assert!(!sig.matches(&[CandidateParam::from_signature(int())]));
}

#[test]
fn test_out_mode_respects_precise_ref_kind() {
    let sig = ParamSignature::with_modes(vec![int()], vec![PassingMode::Out]).expect("lengths");
    let unknown = CandidateParam::from_signature(int().with_by_ref());
    let precise_ref = CandidateParam {
        ty: int().with_by_ref(),
        by_ref: Some(ByRefKind::Ref),
    };
    let precise_out = CandidateParam {
        ty: int().with_by_ref(),
        by_ref: Some(ByRefKind::Out),
    };
    assert!(sig.matches(std::slice::from_ref(&unknown)));
    assert!(sig.matches(std::slice::from_ref(&precise_out)));
    assert!(!sig.matches(std::slice::from_ref(&precise_ref)));
}

#[test]
fn test_pointer_and_normal_modes() {
    let pointer =
        ParamSignature::with_modes(vec![int()], vec![PassingMode::Pointer]).expect("lengths");
    assert!(pointer.matches(&[CandidateParam::from_signature(int().with_pointer())]));
    assert!(!pointer.matches(&[CandidateParam::from_signature(int())]));

    let normal =
        ParamSignature::with_modes(vec![int()], vec![PassingMode::Normal]).expect("lengths");
    assert!(normal.matches(&[CandidateParam::from_signature(int())]));
    assert!(!normal.matches(&[CandidateParam::from_signature(int().with_pointer())]));
    assert!(!normal.matches(&[CandidateParam::from_signature(int().with_by_ref())]));
}

#[test]
fn test_with_modes_rejects_length_mismatch() {
    assert!(ParamSignature::with_modes(vec![int()], vec![]).is_none());
}

#[test]
fn test_owner_display_and_arguments() {
    let ty = TypeDescriptor::named("System.Collections.Generic.List`1").with_generic(vec![int()]);
    let bound = OwnerRef::Bound(TypeIdentity::new("System.Private.CoreLib", ty));
    assert_eq!(bound.display_name(), "System.Collections.Generic.List<System.Int32>");
    assert_eq!(bound.type_arguments(), &[int()]);
    assert_eq!(bound.assembly(), Some("System.Private.CoreLib"));
    assert_eq!(
        bound.reflection_name().map(|n| n.name),
        Some("List`1".to_string())
    );
    assert!(owner().type_arguments().is_empty());
}

#[test]
fn test_not_found_outcome_depends_on_kind() {
    let owner = OwnerRef::Name("Game.Player".into());
    assert_eq!(
        MemberQuery::field(owner.clone(), "health").not_found("Game.Player"),
        ResolutionOutcome::member_not_found("Game.Player", "health")
    );
    assert_eq!(
        MemberQuery::constructor(owner.clone(), false).not_found("Game.Player"),
        ResolutionOutcome::MissingConstructor {
            type_name: "Game.Player".into()
        }
    );
    assert_eq!(
        MemberQuery::constructor(owner, true).not_found("Game.Player"),
        ResolutionOutcome::MissingStaticConstructor {
            type_name: "Game.Player".into()
        }
    );
}

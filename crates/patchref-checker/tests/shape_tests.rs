use super::*;
use patchref_common::SourceLocation;
use patchref_model::{PassingMode, PrimitiveType, TypeIdentity};

fn loc() -> SourceLocation {
    SourceLocation::new("Patches.cs", 0, 1)
}

fn ty(name: &str) -> TypeArg {
    TypeArg::bound("GameLib", TypeDescriptor::parse(name).unwrap())
}

fn owner(name: &str) -> OwnerRef {
    OwnerRef::Bound(TypeIdentity::new("GameLib", TypeDescriptor::parse(name).unwrap()))
}

fn int() -> TypeArg {
    TypeArg::bound("mscorlib", PrimitiveType::Int32.into())
}

fn string() -> TypeArg {
    TypeArg::bound("mscorlib", PrimitiveType::String.into())
}

fn text(value: &str) -> Argument {
    Argument::String(value.to_string())
}

fn invoke(method: &str, generic_args: Vec<TypeArg>, args: Vec<Argument>) -> Shaped {
    shape(&CallSite::invocation(loc(), method, generic_args, args))
}

fn single(shaped: Shaped) -> MemberQuery {
    let mut queries = shaped.unwrap().unwrap();
    assert_eq!(queries.len(), 1);
    queries.remove(0)
}

fn reason(shaped: Shaped) -> InconclusiveReason {
    shaped.unwrap_err().reason
}

// =============================================================================
// Invocations
// =============================================================================

#[test]
fn test_type_and_name() {
    let query = single(invoke("Field", vec![], vec![Argument::Type(ty("Game.Player")), text("health")]));
    assert_eq!(query.kind, MemberKind::Field);
    assert_eq!(query.member_name, "health");
    assert_eq!(query.owner_candidates.as_slice(), &[owner("Game.Player")]);
    assert!(query.search_base);
}

#[test]
fn test_colon_string() {
    let query = single(invoke("DeclaredProperty", vec![], vec![text("Game.Player:Level")]));
    assert_eq!(query.kind, MemberKind::Property);
    assert_eq!(query.member_name, "Level");
    assert_eq!(
        query.owner_candidates.as_slice(),
        &[OwnerRef::Name("Game.Player".into())]
    );
    assert!(!query.search_base);
}

#[test]
fn test_property_getter_sets_accessor() {
    let query = single(invoke(
        "PropertyGetter",
        vec![],
        vec![Argument::Type(ty("Game.Player")), text("Level")],
    ));
    assert_eq!(query.kind, MemberKind::Property);
    assert_eq!(query.accessor, Some(Accessor::Getter));
}

#[test]
fn test_method_with_parameter_types() {
    let query = single(invoke(
        "Method",
        vec![],
        vec![
            Argument::Type(ty("Game.Player")),
            text("Greet"),
            Argument::TypeArray(vec![string(), int()]),
        ],
    ));
    let signature = query.param_signature.unwrap();
    assert_eq!(signature.len(), 2);
    assert!(!signature.modes_specified);
    assert_eq!(signature.params[0].ty, TypeDescriptor::from(PrimitiveType::String));
}

#[test]
fn test_null_parameter_types_do_not_filter() {
    let query = single(invoke(
        "Method",
        vec![],
        vec![text("Game.Player:Greet"), Argument::Null],
    ));
    assert_eq!(query.param_signature, None);
}

#[test]
fn test_generic_method_arguments_are_ignored() {
    let query = single(invoke(
        "Method",
        vec![],
        vec![
            text("Game.Player:Greet"),
            Argument::TypeArray(vec![string()]),
            Argument::TypeArray(vec![int()]),
        ],
    ));
    assert_eq!(query.param_signature.unwrap().len(), 1);
}

#[test]
fn test_default_kind_is_method() {
    let query = single(invoke("GetDeclared", vec![], vec![text("Game.Player:Greet")]));
    assert_eq!(query.kind, MemberKind::Method);
    assert!(!query.search_base);
}

#[test]
fn test_constructor_shapes() {
    let query = single(invoke(
        "Constructor",
        vec![],
        vec![Argument::Type(ty("Game.Player")), Argument::TypeArray(vec![int()])],
    ));
    assert_eq!(query.kind, MemberKind::Constructor);
    assert_eq!(query.member_name, ".ctor");
    assert_eq!(query.param_signature.map(|s| s.len()), Some(1));

    let query = single(invoke(
        "DeclaredConstructor",
        vec![],
        vec![text("Game.Boss"), Argument::Null, Argument::Bool(true)],
    ));
    assert_eq!(query.kind, MemberKind::StaticConstructor);
    assert_eq!(query.member_name, ".cctor");
    assert_eq!(query.owner_candidates.as_slice(), &[OwnerRef::Name("Game.Boss".into())]);
}

#[test]
fn test_field_ref_access_with_two_generic_arguments() {
    let query = single(invoke(
        "FieldRefAccess",
        vec![ty("Game.Player"), string()],
        vec![text("name")],
    ));
    assert_eq!(query.kind, MemberKind::Field);
    assert_eq!(query.member_name, "name");
    assert_eq!(query.owner_candidates.as_slice(), &[owner("Game.Player")]);
    assert_eq!(query.field_type, Some(PrimitiveType::String.into()));
}

#[test]
fn test_field_ref_access_with_owner_argument() {
    let query = single(invoke(
        "StaticFieldRefAccess",
        vec![int()],
        vec![Argument::Type(ty("Game.Player")), text("health")],
    ));
    assert_eq!(query.owner_candidates.as_slice(), &[owner("Game.Player")]);
    assert_eq!(query.field_type, Some(PrimitiveType::Int32.into()));

    let query = single(invoke("StructFieldRefAccess", vec![int()], vec![text("Game.Player:health")]));
    assert_eq!(query.member_name, "health");
    assert_eq!(query.owner_candidates.as_slice(), &[OwnerRef::Name("Game.Player".into())]);
}

#[test]
fn test_type_parameter_owner_fans_out_over_constraints() {
    let parameter = TypeArg::Parameter {
        parameter: "T".into(),
        constraints: vec![
            TypeIdentity::new("GameLib", TypeDescriptor::parse("Game.Player").unwrap()),
            TypeIdentity::new("GameLib", TypeDescriptor::parse("Game.Boss").unwrap()),
        ],
    };
    let query = single(invoke("Field", vec![], vec![Argument::Type(parameter), text("rage")]));
    assert_eq!(
        query.owner_candidates.as_slice(),
        &[owner("Game.Player"), owner("Game.Boss")]
    );
}

#[test]
fn test_calls_that_are_not_lookups() {
    assert_eq!(invoke("CreateInstance", vec![], vec![text("Game.Player:x")]), Ok(None));
    assert_eq!(invoke("Field", vec![], vec![]), Ok(None));
    assert_eq!(invoke("Field", vec![], vec![Argument::Other, text("x")]), Ok(None));
    assert_eq!(invoke("FieldRefAccess", vec![], vec![text("Game.Player:x")]), Ok(None));
}

// =============================================================================
// Ambiguous input
// =============================================================================

#[test]
fn test_non_constant_arguments_are_inconclusive() {
    assert_eq!(
        reason(invoke("Field", vec![], vec![Argument::Type(ty("Game.Player")), Argument::NonConstant])),
        InconclusiveReason::NonConstantArgument
    );
    assert_eq!(
        reason(invoke("Field", vec![], vec![Argument::NonConstant])),
        InconclusiveReason::NonConstantArgument
    );
    assert_eq!(
        reason(invoke(
            "Method",
            vec![],
            vec![text("Game.Player:Greet"), Argument::NonConstant]
        )),
        InconclusiveReason::NonConstantArgument
    );
}

#[test]
fn test_malformed_member_strings_are_inconclusive() {
    for malformed in ["Game.Player", "Game.Player:", ":health", "A:b:c"] {
        assert_eq!(
            reason(invoke("Field", vec![], vec![text(malformed)])),
            InconclusiveReason::UnrecognizedShape,
            "{malformed}"
        );
    }
}

#[test]
fn test_unconstrained_type_parameter_is_inconclusive() {
    let parameter = TypeArg::Parameter {
        parameter: "T".into(),
        constraints: vec![],
    };
    assert_eq!(
        reason(invoke("Field", vec![], vec![Argument::Type(parameter.clone()), text("x")])),
        InconclusiveReason::UnconstrainedTypeParameter
    );
    assert_eq!(
        reason(invoke("FieldRefAccess", vec![ty("Game.Player"), parameter], vec![text("x")])),
        InconclusiveReason::UnconstrainedTypeParameter
    );
}

// =============================================================================
// Patch attributes
// =============================================================================

fn patch(target: PatchTarget) -> Shaped {
    shape(&CallSite::patch_attribute(loc(), target))
}

fn target(member: Option<&str>, method_type: MethodType) -> PatchTarget {
    PatchTarget {
        owner: Some(Argument::Type(ty("Game.Player"))),
        member: member.map(text),
        method_type,
        ..PatchTarget::default()
    }
}

#[test]
fn test_normal_patch_fans_out_over_member_kinds() {
    let mut normal = target(Some("Greet"), MethodType::Normal);
    normal.argument_types = Some(Argument::TypeArray(vec![string()]));
    let queries = patch(normal).unwrap().unwrap();
    let kinds: Vec<MemberKind> = queries.iter().map(|q| q.kind).collect();
    assert_eq!(kinds, vec![MemberKind::Field, MemberKind::Property, MemberKind::Method]);
    assert_eq!(queries[0].param_signature, None);
    assert_eq!(queries[2].param_signature.as_ref().map(|s| s.len()), Some(1));
}

#[test]
fn test_accessor_patches() {
    let getter = single(patch(target(Some("Level"), MethodType::Getter)));
    assert_eq!(getter.kind, MemberKind::Property);
    assert_eq!(getter.accessor, Some(Accessor::Getter));

    let setter = single(patch(target(Some("Level"), MethodType::Setter)));
    assert_eq!(setter.accessor, Some(Accessor::Setter));
}

#[test]
fn test_constructor_patches_ignore_member() {
    let ctor = single(patch(target(None, MethodType::Constructor)));
    assert_eq!(ctor.kind, MemberKind::Constructor);
    let cctor = single(patch(target(Some("ignored"), MethodType::StaticConstructor)));
    assert_eq!(cctor.kind, MemberKind::StaticConstructor);
}

#[test]
fn test_enumerator_and_async_patches_are_method_queries() {
    for method_type in [MethodType::Enumerator, MethodType::Async] {
        let query = single(patch(target(Some("Run"), method_type)));
        assert_eq!(query.kind, MemberKind::Method);
        assert_eq!(query.member_name, "Run");
    }
}

#[test]
fn test_patch_with_argument_modes() {
    let mut swap = target(Some("Swap"), MethodType::Enumerator);
    swap.argument_types = Some(Argument::TypeArray(vec![int()]));
    swap.argument_modes = Some(vec![PassingMode::Ref]);
    let signature = single(patch(swap)).param_signature.unwrap();
    assert!(signature.modes_specified);
    assert_eq!(signature.params[0].mode, PassingMode::Ref);
}

#[test]
fn test_mismatched_modes_are_inconclusive() {
    let mut swap = target(Some("Swap"), MethodType::Normal);
    swap.argument_types = Some(Argument::TypeArray(vec![int()]));
    swap.argument_modes = Some(vec![PassingMode::Ref, PassingMode::Out]);
    assert_eq!(reason(patch(swap)), InconclusiveReason::UnrecognizedShape);
}

#[test]
fn test_incomplete_patch_targets() {
    assert_eq!(patch(PatchTarget::default()), Ok(None));
    assert_eq!(patch(target(None, MethodType::Normal)), Ok(None));

    let mut non_constant = target(None, MethodType::Normal);
    non_constant.member = Some(Argument::NonConstant);
    assert_eq!(reason(patch(non_constant)), InconclusiveReason::NonConstantArgument);
}

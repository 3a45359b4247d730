use super::*;
use crate::testing::{AssemblyBuilder, Sig, field_signature, method_signature};

fn sample() -> MetadataImage {
    let mut asm = AssemblyBuilder::new("GameLib");
    let engine = asm.assembly_ref("Engine");
    let list = asm.type_ref(engine, "System.Collections.Generic", "List`1");
    let behaviour = asm.type_ref(engine, "Engine", "Behaviour");
    let nested_ref = asm.nested_type_ref(behaviour, "Settings");

    let player = asm.type_def("Game", "Player");
    asm.field(player, "items", Sig::generic(list, vec![Sig::string()]));
    asm.field(player, "settings", Sig::class(nested_ref));
    asm.method(player, "Move", Sig::void(), vec![Sig::int32()]);
    let inventory = asm.nested_type(player, "Inventory");
    asm.type_spec(&Sig::generic(list, vec![Sig::class(inventory)]));

    let add = asm.member_ref(list, "Add", method_signature(true, &Sig::void(), &[Sig::Var(0)]));
    asm.member_ref(player, "items", field_signature(&Sig::string()));
    asm.method_spec(add, &[Sig::int32(), Sig::string()]);

    MetadataImage::parse(asm.build()).unwrap()
}

#[test]
fn test_type_definitions_and_nesting() {
    let image = sample();
    let names = NameFormatter::new(&image);
    assert_eq!(names.type_def(2).unwrap().to_string(), "Game.Player");
    assert_eq!(names.type_def(3).unwrap().to_string(), "Game.Player+Inventory");
}

#[test]
fn test_type_references_and_scopes() {
    let image = sample();
    let names = NameFormatter::new(&image);
    assert_eq!(
        names.type_ref(1).unwrap().to_string_with(false),
        "System.Collections.Generic.List`1"
    );
    assert_eq!(names.type_ref(3).unwrap().to_string(), "Engine.Behaviour+Settings");
    assert_eq!(
        names.type_ref_scope(3).unwrap(),
        TypeRefScope::Assembly("Engine".into())
    );
}

#[test]
fn test_type_spec_and_field_types() {
    let image = sample();
    let names = NameFormatter::new(&image);
    assert_eq!(
        names.type_spec(1, 0).unwrap().to_string(),
        "System.Collections.Generic.List<Game.Player+Inventory>"
    );
    assert_eq!(
        names.field_type(1).unwrap().to_string(),
        "System.Collections.Generic.List<System.String>"
    );
    assert_eq!(names.field_type(2).unwrap().to_string(), "Engine.Behaviour+Settings");
}

#[test]
fn test_member_strings() {
    let image = sample();
    let names = NameFormatter::new(&image);
    assert_eq!(names.field_def(1).unwrap(), "Game.Player:items");
    assert_eq!(names.method_def(1).unwrap(), "Game.Player:Move");
    assert_eq!(names.member_ref(1).unwrap(), "System.Collections.Generic.List:Add");
    assert_eq!(names.member_ref(2).unwrap(), "Game.Player:items");
    assert_eq!(
        names.method_spec(1).unwrap(),
        "System.Collections.Generic.List:Add<System.Int32,System.String>"
    );
}

#[test]
fn test_method_signature_of_definition() {
    let image = sample();
    let signature = NameFormatter::new(&image).method_signature(1).unwrap();
    assert!(signature.has_this);
    assert_eq!(signature.params, vec![TypeDescriptor::named("System.Int32")]);
}

#[test]
fn test_non_type_token_is_rejected() {
    let image = sample();
    let names = NameFormatter::new(&image);
    assert!(names
        .type_from_token(MetadataToken::new(TableId::Field, 1), 0)
        .is_err());
}

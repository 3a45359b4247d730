use super::*;

fn list_of(arg: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::named("System.Collections.Generic.List`1").with_generic(vec![arg])
}

#[test]
fn test_primitive_renders_full_name() {
    let ty = TypeDescriptor::from_primitive(PrimitiveType::Int32);
    assert_eq!(ty.canonical_string(), "System.Int32");
}

#[test]
fn test_named_primitive_normalizes() {
    assert_eq!(
        TypeDescriptor::named("System.Boolean"),
        TypeDescriptor::Primitive(PrimitiveType::Boolean)
    );
    assert!(TypeDescriptor::named("System.String").same_type(&PrimitiveType::String.into()));
}

#[test]
fn test_canonical_strips_arity() {
    let ty = list_of(PrimitiveType::String.into());
    assert_eq!(
        ty.canonical_string(),
        "System.Collections.Generic.List<System.String>"
    );
    assert_eq!(
        ty.to_string_with(false),
        "System.Collections.Generic.List`1<System.String>"
    );
}

#[test]
fn test_nested_generic_rendering() {
    let outer = TypeDescriptor::named("Game.Outer`1");
    let nested = TypeDescriptor::nested(outer, "Inner`1")
        .with_generic(vec![PrimitiveType::Int32.into(), PrimitiveType::String.into()]);
    assert_eq!(
        nested.canonical_string(),
        "Game.Outer+Inner<System.Int32,System.String>"
    );
}

#[test]
fn test_wrappers_render_in_order() {
    let ty = TypeDescriptor::from_primitive(PrimitiveType::Char)
        .with_pointer()
        .with_array(ArrayShape::Vector)
        .with_by_ref();
    assert_eq!(ty.canonical_string(), "System.Char*[]&");
    let pinned = TypeDescriptor::from_primitive(PrimitiveType::Byte).with_by_ref().pinned();
    assert_eq!(pinned.canonical_string(), "System.Byte& pinned");
}

#[test]
fn test_array_shape_bounds_and_sizes() {
    let shape = ArrayShape::Shaped {
        rank: 3,
        sizes: vec![4],
        lower_bounds: vec![1, -2],
    };
    let ty = TypeDescriptor::from_primitive(PrimitiveType::Double).with_array(shape);
    assert_eq!(ty.canonical_string(), "System.Double[1...4,-2...,0...]");
}

#[test]
fn test_multi_dimensional_defaults_to_zero_bounds() {
    let ty = TypeDescriptor::from_primitive(PrimitiveType::Int32).with_array(ArrayShape::multi(2));
    assert_eq!(ty.canonical_string(), "System.Int32[0...,0...]");
}

#[test]
fn test_function_pointer_rendering() {
    let fixed = TypeDescriptor::function_pointer(
        PrimitiveType::Void.into(),
        vec![PrimitiveType::Int32.into(), PrimitiveType::String.into()],
        2,
    );
    assert_eq!(
        fixed.canonical_string(),
        "method System.Void *(System.Int32, System.String)"
    );

    let variadic = TypeDescriptor::function_pointer(
        PrimitiveType::Int32.into(),
        vec![PrimitiveType::String.into(), PrimitiveType::Double.into()],
        1,
    );
    assert_eq!(
        variadic.canonical_string(),
        "method System.Int32 *(System.String, ..., System.Double)"
    );
}

#[test]
fn test_generic_parameters() {
    assert_eq!(TypeDescriptor::type_parameter(0).canonical_string(), "!0");
    assert_eq!(TypeDescriptor::method_parameter(2).canonical_string(), "!!2");
}

#[test]
fn test_substitute_replaces_type_parameters() {
    let sig = list_of(TypeDescriptor::type_parameter(0)).with_by_ref();
    let substituted = sig.substitute(&[PrimitiveType::Int64.into()], &[]);
    assert_eq!(
        substituted.canonical_string(),
        "System.Collections.Generic.List<System.Int64>&"
    );
    // Method parameters survive a type-only substitution.
    let method_param = TypeDescriptor::method_parameter(0);
    assert_eq!(
        method_param.substitute(&[PrimitiveType::Int64.into()], &[]),
        method_param
    );
}

#[test]
fn test_with_element_preserves_wrapper() {
    let original = TypeDescriptor::from_primitive(PrimitiveType::Int32).with_pointer();
    let derived = original.with_element(PrimitiveType::Int64.into());
    assert_eq!(original.canonical_string(), "System.Int32*");
    assert_eq!(derived.canonical_string(), "System.Int64*");
}

#[test]
fn test_parse_round_trip() {
    for text in [
        "System.Int32",
        "Game.Player+Inventory",
        "System.Collections.Generic.Dictionary`2<System.String,System.Collections.Generic.List`1<System.Int32>>",
        "System.Int32[]&",
        "System.Byte*",
        "System.Double[0...3,0...]",
        "!0",
        "!!1[]",
        "System.Char& pinned",
    ] {
        let parsed = TypeDescriptor::parse(text).expect("parses");
        assert_eq!(parsed.to_string_with(false), text);
    }
}

#[test]
fn test_parse_errors() {
    assert_eq!(TypeDescriptor::parse("  "), Err(DescriptorParseError::Empty));
    assert!(matches!(
        TypeDescriptor::parse("method System.Void *()"),
        Err(DescriptorParseError::FunctionPointer(_))
    ));
    assert!(matches!(
        TypeDescriptor::parse("List<System.Int32"),
        Err(DescriptorParseError::UnexpectedEnd(_))
    ));
    assert!(matches!(
        TypeDescriptor::parse("A>"),
        Err(DescriptorParseError::Unexpected { found: '>', .. })
    ));
}

#[test]
fn test_parse_rejects_out_of_range_numbers() {
    for (text, offset) in [
        ("!-1", 1),
        ("!!4294967296", 2),
        ("System.Int32[2147483648...]", 13),
        ("System.Int32[-9223372036854775808...9223372036854775807]", 13),
        ("System.Int32[0...9223372036854775807]", 17),
        ("System.Int32[-5...4294967295]", 18),
    ] {
        assert_eq!(
            TypeDescriptor::parse(text),
            Err(DescriptorParseError::OutOfRange {
                text: text.to_string(),
                offset,
            }),
            "{text}"
        );
    }
    assert!(serde_json::from_str::<TypeDescriptor>("\"!-1\"").is_err());
}

#[test]
fn test_parse_extreme_bounds_in_range() {
    let text = "System.Int32[-2147483648...2147483646]";
    let parsed = TypeDescriptor::parse(text).expect("parses");
    assert_eq!(parsed.to_string_with(false), text);
    assert_eq!(
        TypeDescriptor::parse("!!4294967295").expect("parses"),
        TypeDescriptor::method_parameter(u32::MAX)
    );
}

#[test]
fn test_parse_bounds_array_rank() {
    let shaped = |rank: usize| format!("System.Int32[{}]", vec!["0..."; rank].join(","));
    assert!(TypeDescriptor::parse(&shaped(32)).is_ok());
    assert_eq!(
        TypeDescriptor::parse(&shaped(33)),
        Err(DescriptorParseError::RankTooLarge(shaped(33)))
    );
}

#[test]
fn test_serde_uses_textual_form() {
    let ty = list_of(PrimitiveType::Int32.into());
    let json = serde_json::to_string(&ty).expect("serializes");
    assert_eq!(json, "\"System.Collections.Generic.List`1<System.Int32>\"");
    let back: TypeDescriptor = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back, ty);
}

#[test]
fn test_reflection_name_parse() {
    let name = ReflectionName::parse("Game.World.Outer+Inner").expect("parses");
    assert_eq!(name.namespace, "Game.World");
    assert_eq!(name.name, "Outer");
    assert_eq!(name.nested, vec!["Inner".to_string()]);
    assert_eq!(name.to_string(), "Game.World.Outer+Inner");

    let global = ReflectionName::parse("Program").expect("parses");
    assert_eq!(global.namespace, "");
    assert_eq!(global.name, "Program");
}

#[test]
fn test_reflection_name_of_instantiation_is_open_definition() {
    let ty = list_of(PrimitiveType::Int32.into());
    let name = ReflectionName::from_descriptor(&ty).expect("named");
    assert_eq!(name.name, "List`1");
    assert_eq!(name.to_descriptor(), TypeDescriptor::named("System.Collections.Generic.List`1"));
    assert!(ReflectionName::from_descriptor(&ty.with_by_ref()).is_none());
}

#[test]
fn test_name_matches_tolerates_missing_arity() {
    assert!(ReflectionName::name_matches("List", "List`1"));
    assert!(ReflectionName::name_matches("List`1", "List`1"));
    assert!(!ReflectionName::name_matches("List`2", "List`1"));
    assert!(!ReflectionName::name_matches("Lis", "List`1"));
}

use super::*;

fn flags(method: &str) -> LookupFlags {
    decompose(method).unwrap_or_else(|| panic!("`{method}` should decompose"))
}

#[test]
fn test_plain_kinds() {
    assert_eq!(flags("Field"), LookupFlags::FIELD);
    assert_eq!(flags("Property"), LookupFlags::PROPERTY);
    assert_eq!(flags("Method"), LookupFlags::METHOD);
    assert_eq!(flags("Constructor"), LookupFlags::CONSTRUCTOR);
}

#[test]
fn test_get_prefix_is_dropped() {
    assert_eq!(flags("GetField"), LookupFlags::FIELD);
    assert_eq!(flags("GetDeclaredMethod"), LookupFlags::DECLARED | LookupFlags::METHOD);
}

#[test]
fn test_declared_disables_base_search() {
    let declared = flags("DeclaredField");
    assert!(!declared.searches_base());
    assert_eq!(declared.member_kind(), MemberKind::Field);
    assert!(flags("Field").searches_base());
}

#[test]
fn test_property_accessors() {
    let getter = flags("PropertyGetter");
    assert_eq!(getter, LookupFlags::PROPERTY | LookupFlags::GETTER);
    assert_eq!(getter.accessor(), Some(Accessor::Getter));
    assert_eq!(getter.member_kind(), MemberKind::Property);

    let setter = flags("DeclaredPropertySetter");
    assert_eq!(setter.accessor(), Some(Accessor::Setter));
    assert!(!setter.searches_base());
}

#[test]
fn test_accessor_requires_property() {
    // `Getter` alone is not a recognized prefix.
    assert_eq!(decompose("Getter"), None);
    assert_eq!(decompose("FieldGetter"), None);
}

#[test]
fn test_delegate_suffix() {
    let method = flags("MethodDelegate");
    assert!(method.contains(LookupFlags::DELEGATE));
    assert_eq!(method.member_kind(), MemberKind::Method);
    assert!(flags("GetDeclaredConstructorDelegate").contains(LookupFlags::CONSTRUCTOR));
}

#[test]
fn test_empty_name_defaults_to_method() {
    assert_eq!(flags(""), LookupFlags::METHOD);
    assert_eq!(flags("Get"), LookupFlags::METHOD);
    assert_eq!(flags("Declared"), LookupFlags::DECLARED | LookupFlags::METHOD);
    assert_eq!(flags("Delegate"), LookupFlags::DELEGATE | LookupFlags::METHOD);
}

#[test]
fn test_one_kind_only() {
    assert_eq!(decompose("FieldMethod"), None);
    assert_eq!(decompose("PropertyField"), None);
}

#[test]
fn test_unrelated_names_are_not_lookups() {
    assert_eq!(decompose("CreateInstance"), None);
    assert_eq!(decompose("GetTypesFromAssembly"), None);
    assert_eq!(decompose("FieldRefAccess"), None);
}

use super::*;
use crate::testing::{AssemblyBuilder, Sig};
use patchref_model::{ParamSignature, PassingMode, PrimitiveType};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    locator: AssemblyLocator,
}

fn engine() -> AssemblyBuilder {
    let mut asm = AssemblyBuilder::new("Engine");
    let behaviour = asm.type_def("Engine", "Behaviour");
    asm.field(behaviour, "enabled", Sig::boolean());
    asm.method(behaviour, "Update", Sig::void(), vec![]);
    asm.property(behaviour, "Name", Sig::string(), true, true);
    let boxed = asm.type_def("Engine", "Box`1");
    asm.field(boxed, "value", Sig::Var(0));
    asm
}

fn game() -> AssemblyBuilder {
    let mut asm = AssemblyBuilder::new("GameLib");
    let engine = asm.assembly_ref("Engine");
    let ghost = asm.assembly_ref("Ghost");
    let behaviour = asm.type_ref(engine, "Engine", "Behaviour");
    let boxed = asm.type_ref(engine, "Engine", "Box`1");
    asm.type_ref(ghost, "Ghost", "Thing");

    let player = asm.type_def("Game", "Player");
    asm.set_base(player, behaviour);
    asm.field(player, "health", Sig::int32());
    asm.field(player, "name", Sig::string());
    asm.property(player, "Level", Sig::int32(), true, false);
    asm.method(player, "Greet", Sig::void(), vec![Sig::string()]);
    asm.method(player, "Greet", Sig::void(), vec![Sig::string(), Sig::int32()]);
    asm.method(player, "Swap", Sig::void(), vec![Sig::int32().by_ref()]);
    asm.constructor(player, vec![Sig::int32()]);
    let inventory = asm.nested_type(player, "Inventory");
    asm.field(inventory, "slots", Sig::int32());

    let boss = asm.type_def("Game", "Boss");
    asm.set_base(boss, player);
    asm.field(boss, "rage", Sig::int32());
    asm.static_constructor(boss);

    let int_box = asm.type_def("Game", "IntBox");
    let base = asm.type_spec(&Sig::generic(boxed, vec![Sig::int32()]));
    asm.set_base(int_box, base);
    asm
}

fn facade() -> AssemblyBuilder {
    let mut asm = AssemblyBuilder::new("Facade");
    let engine = asm.assembly_ref("Engine");
    asm.forward_type("Engine", "Behaviour", engine);
    asm
}

fn fixture(with_engine: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut locator = AssemblyLocator::new();
    let mut assemblies = vec![game(), facade()];
    if with_engine {
        assemblies.push(engine());
    }
    for asm in assemblies {
        let path = asm.write_to(dir.path()).unwrap();
        locator.add_reference(asm.name(), path);
    }
    Fixture {
        _dir: dir,
        locator,
    }
}

fn bound(assembly: &str, name: &str) -> OwnerRef {
    OwnerRef::Bound(TypeIdentity::new(
        assembly,
        TypeDescriptor::parse(name).unwrap(),
    ))
}

fn player() -> OwnerRef {
    bound("GameLib", "Game.Player")
}

fn search(backend: &MetadataBackend<'_>, query: &MemberQuery) -> Search {
    let ty = backend
        .find_type(&query.owner_candidates[0])
        .unwrap()
        .found()
        .unwrap();
    backend.find_member(&ty, query, 0).unwrap()
}

fn outcome(backend: &MetadataBackend<'_>, query: &MemberQuery) -> ResolutionOutcome {
    match search(backend, query) {
        Search::Done(outcome) => outcome,
        other => panic!("expected a finished search, got {other:?}"),
    }
}

fn int() -> TypeDescriptor {
    PrimitiveType::Int32.into()
}

fn string() -> TypeDescriptor {
    PrimitiveType::String.into()
}

// =============================================================================
// Type lookup
// =============================================================================

#[test]
fn test_find_type_by_assembly_and_by_name() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);

    let ty = backend.find_type(&player()).unwrap().found().unwrap();
    assert_eq!(ty.descriptor().unwrap().to_string(), "Game.Player");

    let nested = backend
        .find_type(&OwnerRef::Name("Game.Player+Inventory".into()))
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(nested.descriptor().unwrap().to_string(), "Game.Player+Inventory");

    // Arity marker may be omitted.
    let boxed = backend
        .find_type(&OwnerRef::Name("Engine.Box".into()))
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(
        boxed.descriptor().unwrap().to_string_with(false),
        "Engine.Box`1"
    );

    assert!(matches!(
        backend.find_type(&OwnerRef::Name("Game.Nobody".into())),
        Ok(TypeLookup::NotFound)
    ));
}

#[test]
fn test_find_type_reports_missing_assemblies() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);

    assert!(matches!(
        backend.find_type(&bound("Nowhere", "A.B")),
        Ok(TypeLookup::AssemblyNotFound { assembly }) if assembly == "Nowhere"
    ));
    // Referenced from GameLib, but Ghost.dll is not available.
    assert!(matches!(
        backend.find_type(&OwnerRef::Name("Ghost.Thing".into())),
        Ok(TypeLookup::AssemblyNotFound { assembly }) if assembly == "Ghost"
    ));
}

#[test]
fn test_find_type_follows_forwarders() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);
    let ty = backend
        .find_type(&bound("Facade", "Engine.Behaviour"))
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(ty.image.assembly_name().unwrap(), Some("Engine"));
}

#[test]
fn test_bound_generic_owner_keeps_arguments() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);
    let owner = bound("Engine", "Engine.Box`1<System.String>");
    let ty = backend.find_type(&owner).unwrap().found().unwrap();
    assert_eq!(ty.type_args, vec![string()]);

    let query = MemberQuery::field(owner, "value").with_field_type(string());
    assert_eq!(outcome(&backend, &query), ResolutionOutcome::Found);
}

#[test]
fn test_unreadable_image_is_inconclusive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Broken.dll");
    std::fs::write(&path, b"MZ-not-really").unwrap();
    let mut locator = AssemblyLocator::new();
    locator.add_reference("Broken", &path);

    let backend = MetadataBackend::new(&locator);
    let error = backend.find_type(&bound("Broken", "A.B")).unwrap_err();
    assert_eq!(error.reason, InconclusiveReason::UnreadableImage);
}

#[test]
fn test_corrupt_section_table_is_inconclusive() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = engine().build();
    // Raw pointer of the only section, pushed past the end of the file.
    bytes[0x18C..0x190].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
    let path = dir.path().join("Engine.dll");
    std::fs::write(&path, bytes).unwrap();
    let mut locator = AssemblyLocator::new();
    locator.add_reference("Engine", &path);

    let backend = MetadataBackend::new(&locator);
    let error = backend
        .find_type(&bound("Engine", "Engine.Behaviour"))
        .unwrap_err();
    assert_eq!(error.reason, InconclusiveReason::UnreadableImage);
}

// =============================================================================
// Member search
// =============================================================================

#[test]
fn test_existing_and_missing_fields() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);

    assert_eq!(
        outcome(&backend, &MemberQuery::field(player(), "health")),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(&backend, &MemberQuery::field(player(), "health1")),
        ResolutionOutcome::member_not_found("Game.Player", "health1")
    );
}

#[test]
fn test_base_members_across_assemblies() {
    let fx = fixture(true);
    let cache = ImageCache::new();
    let backend = MetadataBackend::new(&fx.locator).with_cache(&cache);

    let boss = bound("GameLib", "Game.Boss");
    assert_eq!(
        outcome(&backend, &MemberQuery::field(boss.clone(), "health")),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(&backend, &MemberQuery::field(boss.clone(), "enabled")),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(&backend, &MemberQuery::method(boss.clone(), "Update")),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(&backend, &MemberQuery::field(boss, "enabled").declared()),
        ResolutionOutcome::member_not_found("Game.Boss", "enabled")
    );
    assert!(cache.len() >= 2);
}

#[test]
fn test_max_base_depth_stops_walk() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator).with_max_base_depth(1);
    let boss = bound("GameLib", "Game.Boss");

    assert_eq!(
        outcome(&backend, &MemberQuery::field(boss.clone(), "health")),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(&backend, &MemberQuery::field(boss, "enabled")),
        ResolutionOutcome::member_not_found("Game.Boss", "enabled")
    );
}

#[test]
fn test_unlocatable_base_continues_elsewhere() {
    let fx = fixture(false);
    let backend = MetadataBackend::new(&fx.locator);

    assert_eq!(
        outcome(&backend, &MemberQuery::field(player(), "health")),
        ResolutionOutcome::Found
    );
    assert_eq!(
        search(&backend, &MemberQuery::field(player(), "enabled")),
        Search::Continue {
            base: bound("Engine", "Engine.Behaviour"),
            depth: 1,
        }
    );
}

#[test]
fn test_property_accessors() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);
    let level = MemberQuery::property(player(), "Level");

    assert_eq!(
        outcome(&backend, &level.clone().with_accessor(Accessor::Getter)),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(&backend, &level.with_accessor(Accessor::Setter)),
        ResolutionOutcome::MissingSetter {
            member_name: "Level".into()
        }
    );
    // Inherited property with both accessors.
    assert_eq!(
        outcome(
            &backend,
            &MemberQuery::property(player(), "Name").with_accessor(Accessor::Setter)
        ),
        ResolutionOutcome::Found
    );
}

#[test]
fn test_overloads_match_structurally() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);
    let greet = MemberQuery::method(player(), "Greet");

    for params in [vec![string()], vec![string(), int()]] {
        let query = greet.clone().with_params(ParamSignature::from_types(params));
        assert_eq!(outcome(&backend, &query), ResolutionOutcome::Found);
    }
    let query = greet.with_params(ParamSignature::from_types(vec![int()]));
    assert_eq!(
        outcome(&backend, &query),
        ResolutionOutcome::member_not_found("Game.Player", "Greet")
    );
}

#[test]
fn test_passing_modes_against_byref_parameters() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);
    let swap = MemberQuery::method(player(), "Swap");
    let with_mode = |mode| {
        swap.clone()
            .with_params(ParamSignature::with_modes(vec![int()], vec![mode]).unwrap())
    };

    assert_eq!(outcome(&backend, &with_mode(PassingMode::Ref)), ResolutionOutcome::Found);
    // Metadata cannot tell ref from out.
    assert_eq!(outcome(&backend, &with_mode(PassingMode::Out)), ResolutionOutcome::Found);
    assert!(outcome(&backend, &with_mode(PassingMode::Normal)).is_failure());
    assert!(outcome(&backend, &with_mode(PassingMode::Pointer)).is_failure());
}

#[test]
fn test_field_type_check() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);

    let query = MemberQuery::field(player(), "name").with_field_type(PrimitiveType::Boolean.into());
    assert_eq!(
        outcome(&backend, &query),
        ResolutionOutcome::WrongFieldType {
            owner: "Game.Player".into(),
            expected: "System.Boolean".into(),
            actual: "System.String".into(),
        }
    );

    // Generic base field typed by the derived type's instantiation.
    let int_box = bound("GameLib", "Game.IntBox");
    let query = MemberQuery::field(int_box.clone(), "value").with_field_type(int());
    assert_eq!(outcome(&backend, &query), ResolutionOutcome::Found);
    let query = MemberQuery::field(int_box, "value").with_field_type(string());
    assert_eq!(
        outcome(&backend, &query),
        ResolutionOutcome::WrongFieldType {
            owner: "Game.IntBox".into(),
            expected: "System.String".into(),
            actual: "System.Int32".into(),
        }
    );
}

#[test]
fn test_constructors() {
    let fx = fixture(true);
    let backend = MetadataBackend::new(&fx.locator);

    let ctor = MemberQuery::constructor(player(), false);
    assert_eq!(
        outcome(
            &backend,
            &ctor.clone().with_params(ParamSignature::from_types(vec![int()]))
        ),
        ResolutionOutcome::Found
    );
    assert_eq!(
        outcome(
            &backend,
            &ctor.with_params(ParamSignature::from_types(vec![string()]))
        ),
        ResolutionOutcome::MissingConstructor {
            type_name: "Game.Player".into()
        }
    );

    assert_eq!(
        outcome(&backend, &MemberQuery::constructor(bound("GameLib", "Game.Boss"), true)),
        ResolutionOutcome::Found
    );
    // Constructors are never inherited.
    assert_eq!(
        outcome(&backend, &MemberQuery::constructor(bound("GameLib", "Game.Boss"), false)),
        ResolutionOutcome::MissingConstructor {
            type_name: "Game.Boss".into()
        }
    );
    assert_eq!(
        outcome(&backend, &MemberQuery::constructor(player(), true)),
        ResolutionOutcome::MissingStaticConstructor {
            type_name: "Game.Player".into()
        }
    );
}

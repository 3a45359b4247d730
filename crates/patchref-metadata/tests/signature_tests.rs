use super::*;
use crate::tables::TableId;
use crate::testing::{Sig, TypeHandle, field_signature, method_signature, type_signature};

/// Names every token after its table and row.
struct FakeTypes;

impl TypeHandleProvider for FakeTypes {
    fn type_from_token(&self, token: MetadataToken, _depth: u32) -> Result<TypeDescriptor> {
        Ok(match token.table {
            TableId::TypeDef => TypeDescriptor::named(format!("Defs.T{}", token.row)),
            TableId::TypeRef => TypeDescriptor::named(format!("Refs.R{}`1", token.row)),
            _ => TypeDescriptor::named("Specs.S"),
        })
    }
}

fn decode(sig: &Sig) -> TypeDescriptor {
    SignatureDecoder::new(&FakeTypes)
        .type_spec(&type_signature(sig), 0)
        .unwrap()
}

#[test]
fn test_primitives_and_wrappers() {
    assert_eq!(decode(&Sig::int32()).to_string(), "System.Int32");
    assert_eq!(
        decode(&Sig::string().sz_array().by_ref()).to_string(),
        "System.String[]&"
    );
    assert_eq!(decode(&Sig::int32().pointer()).to_string(), "System.Int32*");
    assert_eq!(decode(&Sig::class(TypeHandle::Def(4))).to_string(), "Defs.T4");
}

#[test]
fn test_generic_instantiation_and_parameters() {
    let sig = Sig::generic(TypeHandle::Ref(2), vec![Sig::Var(0), Sig::MVar(1)]);
    assert_eq!(decode(&sig).to_string(), "Refs.R2<!0,!!1>");
    assert_eq!(decode(&sig).to_string_with(false), "Refs.R2`1<!0,!!1>");
}

#[test]
fn test_general_array_shape() {
    let sig = Sig::Array {
        element: Box::new(Sig::int32()),
        rank: 2,
        sizes: vec![4],
        lower_bounds: vec![-1],
    };
    assert_eq!(decode(&sig).to_string(), "System.Int32[-1...2,0...]");
}

#[test]
fn test_function_pointer_and_modifiers() {
    let sig = Sig::FnPtr {
        return_type: Box::new(Sig::boolean()),
        params: vec![Sig::int32(), Sig::string()],
    };
    let decoded = decode(&sig);
    assert_eq!(
        decoded,
        TypeDescriptor::function_pointer(
            PrimitiveType::Boolean.into(),
            vec![PrimitiveType::Int32.into(), PrimitiveType::String.into()],
            2,
        )
    );

    let modified = Sig::Modified {
        modifier: TypeHandle::Ref(1),
        inner: Box::new(Sig::int32()),
    };
    assert_eq!(decode(&modified).to_string(), "System.Int32");
}

#[test]
fn test_field_and_method_signatures() {
    let decoder = SignatureDecoder::new(&FakeTypes);
    assert_eq!(
        decoder.field(&field_signature(&Sig::boolean())).unwrap(),
        TypeDescriptor::from_primitive(PrimitiveType::Boolean)
    );

    let method = decoder
        .method(&method_signature(
            true,
            &Sig::void(),
            &[Sig::string(), Sig::int32().by_ref()],
        ))
        .unwrap();
    assert!(method.has_this);
    assert_eq!(method.generic_param_count, 0);
    assert_eq!(method.required_count, 2);
    let params: Vec<String> = method.params.iter().map(ToString::to_string).collect();
    assert_eq!(params, ["System.String", "System.Int32&"]);

    // A method blob is not a field blob.
    assert!(decoder.field(&method_signature(false, &Sig::void(), &[])).is_err());
}

#[test]
fn test_vararg_sentinel_sets_required_count() {
    // VARARG, 2 params, void, int32, SENTINEL, string
    let blob = [calling_convention::VARARG, 2, 0x01, 0x08, element::SENTINEL, 0x0e];
    let method = SignatureDecoder::new(&FakeTypes).method(&blob).unwrap();
    assert_eq!(method.params.len(), 2);
    assert_eq!(method.required_count, 1);
}

#[test]
fn test_generic_instance_head() {
    let decoder = SignatureDecoder::new(&FakeTypes);
    let blob = type_signature(&Sig::generic(TypeHandle::Def(3), vec![Sig::string()]));
    let (open, args) = decoder.generic_instance(&blob).unwrap().unwrap();
    assert_eq!(open, MetadataToken::new(TableId::TypeDef, 3));
    assert_eq!(args, vec![TypeDescriptor::from_primitive(PrimitiveType::String)]);

    assert!(decoder
        .generic_instance(&type_signature(&Sig::int32()))
        .unwrap()
        .is_none());
}

#[test]
fn test_depth_limit_and_malformed_blobs() {
    let mut deep = vec![element::PTR; (MAX_SIGNATURE_DEPTH + 2) as usize];
    deep.push(0x08);
    assert!(matches!(
        SignatureDecoder::new(&FakeTypes).type_spec(&deep, 0),
        Err(MetadataError::SignatureTooDeep(_))
    ));

    assert!(SignatureDecoder::new(&FakeTypes).type_spec(&[0x17], 0).is_err());
    assert!(SignatureDecoder::new(&FakeTypes).type_spec(&[element::SZARRAY], 0).is_err());
}

#[test]
fn test_counts_larger_than_the_blob_are_malformed() {
    let decoder = SignatureDecoder::new(&FakeTypes);
    // DEFAULT, 0x1FFFFFFF params, void
    assert!(matches!(
        decoder.method(&[0x00, 0xDF, 0xFF, 0xFF, 0xFF, 0x01]),
        Err(MetadataError::Malformed(_))
    ));
    assert!(matches!(
        decoder.method_instantiation(&[0x0A, 0x7F, 0x08]),
        Err(MetadataError::Malformed(_))
    ));
    // GENERICINST CLASS Def(1) with 127 arguments and none present.
    let generic = [element::GENERICINST, element::CLASS, 0x04, 0x7F];
    assert!(matches!(
        decoder.type_spec(&generic, 0),
        Err(MetadataError::Malformed(_))
    ));
    assert!(matches!(
        decoder.generic_instance(&generic),
        Err(MetadataError::Malformed(_))
    ));
}

#[test]
fn test_array_shape_limits() {
    let decoder = SignatureDecoder::new(&FakeTypes);
    let shape = |rank: u8, tail: &[u8]| {
        let mut blob = vec![element::ARRAY, 0x08, rank];
        blob.extend_from_slice(tail);
        decoder.type_spec(&blob, 0)
    };

    assert_eq!(
        shape(MAX_ARRAY_RANK as u8, &[0, 0]).unwrap().to_string(),
        format!("System.Int32[{}]", vec!["0..."; MAX_ARRAY_RANK as usize].join(","))
    );
    for rank in [0, MAX_ARRAY_RANK as u8 + 1] {
        assert!(
            matches!(shape(rank, &[0, 0]), Err(MetadataError::Malformed(_))),
            "rank {rank}"
        );
    }
    // Two sizes for a rank-1 array.
    assert!(matches!(
        shape(1, &[2, 1, 1, 0]),
        Err(MetadataError::Malformed(_))
    ));
    // 127 lower bounds with nothing after them.
    assert!(matches!(
        shape(2, &[0, 0x7F]),
        Err(MetadataError::Malformed(_))
    ));
}

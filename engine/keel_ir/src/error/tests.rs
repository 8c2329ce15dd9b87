use super::*;
use pretty_assertions::assert_eq;

#[test]
fn messages() {
    let err = CodecError::AmbiguousKeyAncestor {
        type_name: TypeName::new("Trade"),
        candidates: vec!["TradeKey".to_string(), "BookKey".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "`Trade` has more than one key type in its hierarchy: TradeKey, BookKey"
    );

    let err = CodecError::mismatch("Foo.int_field", "int", "str");
    assert_eq!(err.to_string(), "Foo.int_field: expected `int`, found `str`");
}

#[test]
fn registration_errors_are_classified() {
    let dup = CodecError::DuplicateTypeName {
        name: TypeName::new("Foo"),
    };
    let unknown = CodecError::UnknownType {
        name: "Bogus".to_string(),
    };
    assert_eq!(dup.code(), ErrorCode::K1001);
    assert!(dup.is_registration_error());
    assert_eq!(unknown.code().to_string(), "K2001");
    assert!(!unknown.is_registration_error());
    assert!(!CodecError::DepthLimitExceeded { limit: 4 }.is_registration_error());
}

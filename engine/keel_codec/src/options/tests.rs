use super::*;
use pretty_assertions::assert_eq;

#[test]
fn defaults() {
    assert_eq!(CodecOptions::default().max_depth, 128);
}

#[test]
fn json_fills_missing_fields() {
    assert_eq!(CodecOptions::from_json("{}").unwrap(), CodecOptions::default());
    assert_eq!(
        CodecOptions::from_json(r#"{"max_depth": 16}"#).unwrap(),
        CodecOptions { max_depth: 16 }
    );
}

#[test]
fn json_rejects_bad_input() {
    assert!(matches!(
        CodecOptions::from_json(r#"{"max_depth": -1}"#),
        Err(OptionsError::Parse(_))
    ));
    assert!(matches!(
        CodecOptions::from_json(r#"{"depth": 3}"#),
        Err(OptionsError::Parse(_))
    ));
    assert!(matches!(
        CodecOptions::from_json(r#"{"max_depth": 0}"#),
        Err(OptionsError::ZeroDepth)
    ));
}

#[test]
fn env_value_parsing() {
    let base = CodecOptions::default();
    assert_eq!(base.with_env_depth(" 32 ").unwrap().max_depth, 32);
    assert!(matches!(
        base.with_env_depth("deep"),
        Err(OptionsError::InvalidEnv {
            var: MAX_DEPTH_VAR,
            ..
        })
    ));
    assert!(matches!(
        base.with_env_depth("0"),
        Err(OptionsError::ZeroDepth)
    ));
}

use moodtune::types::SessionId;
use moodtune::utils::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    assert!(!challenge.is_empty());

    // Deterministic
    assert_eq!(challenge, generate_code_challenge(verifier));
    assert_ne!(challenge, generate_code_challenge("different_verifier"));

    // URL-safe base64 of a SHA-256 digest, no padding
    assert_eq!(challenge.len(), 43);
    assert!(!challenge.contains('='));
    assert!(!challenge.contains('+'));
    assert!(!challenge.contains('/'));
}

#[test]
fn test_generate_code_challenge_known_value() {
    // RFC 7636 appendix B
    let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn test_generate_state() {
    let state = generate_state();

    assert_eq!(state.len(), 32);
    assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(state, generate_state());
}

#[test]
fn test_generate_session_id() {
    let session = generate_session_id();

    assert_eq!(session.as_str().len(), 32);
    assert_eq!(SessionId::parse(session.as_str()), Some(session.clone()));
    assert_ne!(session, generate_session_id());
}

#[test]
fn test_session_id_parse() {
    assert!(SessionId::parse("abc-DEF_123").is_some());

    assert!(SessionId::parse("").is_none());
    assert!(SessionId::parse("../etc").is_none());
    assert!(SessionId::parse("with space").is_none());
    assert!(SessionId::parse(&"a".repeat(129)).is_none());
    assert!(SessionId::parse(&"a".repeat(128)).is_some());
}

#[test]
fn test_cookie_value() {
    let header = "theme=dark; moodtune_session=abc123; other=x";

    assert_eq!(cookie_value(header, "moodtune_session"), Some("abc123"));
    assert_eq!(cookie_value(header, "theme"), Some("dark"));
    assert_eq!(cookie_value(header, "missing"), None);
    assert_eq!(cookie_value("", "moodtune_session"), None);
    assert_eq!(cookie_value("moodtune_session", "moodtune_session"), None);
}

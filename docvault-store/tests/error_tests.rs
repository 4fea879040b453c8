use docvault_crypto::CryptoError;
use docvault_store::StoreError;
use std::time::Duration;

#[test]
fn not_found_display() {
    assert_eq!(StoreError::NotFound.to_string(), "document not found");
}

#[test]
fn unknown_key_version_display() {
    let err = StoreError::UnknownKeyVersion(4);
    assert_eq!(err.to_string(), "no key available for key version 4");
}

#[test]
fn malformed_identifier_display() {
    let err = StoreError::MalformedIdentifier("expected two dot-separated segments".into());
    assert_eq!(
        err.to_string(),
        "malformed document identifier: expected two dot-separated segments"
    );
}

#[test]
fn unsupported_content_type_display() {
    let err = StoreError::UnsupportedContentType("application/zip".into());
    assert_eq!(err.to_string(), "unsupported content type: application/zip");
}

#[test]
fn invalid_expiry_display() {
    let err = StoreError::InvalidExpiry("ttl 5s is out of range".into());
    assert_eq!(err.to_string(), "invalid document expiry: ttl 5s is out of range");
}

#[test]
fn timeout_display() {
    let err = StoreError::Timeout {
        operation: "backend put",
        after: Duration::from_secs(10),
    };
    assert_eq!(err.to_string(), "backend put timed out after 10s");
}

#[test]
fn serialization_error_converts() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: StoreError = json_err.into();
    assert!(matches!(err, StoreError::Serialization(_)));
    assert!(err.to_string().starts_with("serialization error:"));
}

#[test]
fn crypto_unknown_version_maps_to_store_variant() {
    let err: StoreError = CryptoError::UnknownKeyVersion(9).into();
    assert!(matches!(err, StoreError::UnknownKeyVersion(9)));
}

#[test]
fn crypto_decryption_maps_to_decryption_failed() {
    let err: StoreError = CryptoError::Decryption("bad tag".into()).into();
    assert!(matches!(err, StoreError::DecryptionFailed(ref m) if m == "bad tag"));
}

#[test]
fn other_crypto_errors_are_wrapped() {
    let err: StoreError = CryptoError::KeyDerivation("out of memory".into()).into();
    assert!(matches!(err, StoreError::Crypto(_)));
}

#[test]
fn retryable_classification() {
    assert!(StoreError::Backend("reset".into()).is_retryable());
    assert!(StoreError::VirusScanUnavailable("down".into()).is_retryable());
    assert!(
        StoreError::Timeout {
            operation: "backend get",
            after: Duration::from_millis(5)
        }
        .is_retryable()
    );

    assert!(!StoreError::NotFound.is_retryable());
    assert!(!StoreError::VirusDetected.is_retryable());
    assert!(!StoreError::UnknownKeyVersion(1).is_retryable());
    assert!(!StoreError::DecryptionFailed("x".into()).is_retryable());
    assert!(!StoreError::MalformedIdentifier("x".into()).is_retryable());
    assert!(!StoreError::OwnerUnresolved("x".into()).is_retryable());
    assert!(!StoreError::InvalidExpiry("x".into()).is_retryable());
}

use crate::error::FrameError;
use crate::keys::{LocalKeyPair, TrustedKeys};
use crate::transport::{
    FrameSigner, FrameVerifier, ProtocolTag, SessionTransport, TAG_LENGTH, envelope_length,
};

use std::sync::Arc;

fn trusting(pair: &LocalKeyPair) -> Arc<TrustedKeys> {
    let mut trusted = TrustedKeys::new();
    trusted.insert(pair.public_key());
    Arc::new(trusted)
}

#[test]
fn given_trusted_signer_when_frame_opened_then_payload_is_returned() {
    // GIVEN: A signer whose key is trusted
    let pair = Arc::new(LocalKeyPair::generate());
    let signer = FrameSigner::new(Arc::clone(&pair));
    let verifier = FrameVerifier::new(trusting(&pair));

    // WHEN: Sealing and opening a payload
    let frame = signer.seal(b"payload bytes");
    let opened = verifier.open(&frame).unwrap();

    // THEN: The payload comes back, behind an envelope of the documented size
    assert_eq!(opened, b"payload bytes");
    assert_eq!(frame.len(), envelope_length(true) + opened.len());
    assert_eq!(&frame[..TAG_LENGTH], ProtocolTag::current().as_bytes());
}

/// **VALUE**: Verifies frames from keys outside the trusted set are refused.
///
/// **WHY THIS MATTERS**: The trusted set is the whole authorisation model of
/// the signed variant.
///
/// **BUG THIS CATCHES**: Verifying against the key the frame claims instead of
/// the key the registry holds.
#[test]
fn given_untrusted_signer_when_frame_opened_then_unknown_key() {
    // GIVEN: A verifier that trusts someone else
    let stranger = Arc::new(LocalKeyPair::generate());
    let friend = LocalKeyPair::generate();
    let verifier = FrameVerifier::new(trusting(&friend));

    // WHEN: Opening a frame signed by the stranger
    let frame = FrameSigner::new(Arc::clone(&stranger)).seal(b"hello");
    let err = verifier.open(&frame).unwrap_err();

    // THEN: Unknown key, naming the stranger's key reference
    assert!(matches!(err, FrameError::UnknownKey { .. }));
    assert_eq!(err.key_ref(), Some(stranger.key_ref().to_string().as_str()));
}

/// **VALUE**: Verifies that any change to the payload breaks verification.
///
/// **WHY THIS MATTERS**: Without per-frame verification a peer could replay
/// a valid envelope around a different call.
///
/// **BUG THIS CATCHES**: Verifying only the envelope, or a truncated payload.
#[test]
fn given_tampered_payload_when_frame_opened_then_bad_signature() {
    let pair = Arc::new(LocalKeyPair::generate());
    let verifier = FrameVerifier::new(trusting(&pair));
    let mut frame = FrameSigner::new(Arc::clone(&pair)).seal(b"copy this");

    let last = frame.len() - 1;
    frame[last] ^= 0x01;

    assert!(matches!(
        verifier.open(&frame),
        Err(FrameError::BadSignature { .. })
    ));
}

#[test]
fn given_corrupted_signature_when_frame_opened_then_bad_signature() {
    let pair = Arc::new(LocalKeyPair::generate());
    let verifier = FrameVerifier::new(trusting(&pair));
    let mut frame = FrameSigner::new(Arc::clone(&pair)).seal(b"copy this");

    frame[TAG_LENGTH + 32] ^= 0xff;

    assert!(matches!(
        verifier.open(&frame),
        Err(FrameError::BadSignature { .. })
    ));
}

#[test]
fn given_frame_without_payload_when_opened_then_short_frame() {
    let pair = LocalKeyPair::generate();
    let verifier = FrameVerifier::new(trusting(&pair));

    let exact_envelope = vec![0u8; envelope_length(true)];
    let result = verifier.open(&exact_envelope);

    match result {
        Err(FrameError::ShortFrame { length, minimum, .. }) => {
            assert_eq!(length, minimum);
        }
        other => panic!("Expected short frame, got {other:?}"),
    }
    assert!(matches!(
        verifier.open(&[]),
        Err(FrameError::ShortFrame { .. })
    ));
}

/// **VALUE**: Verifies tag checking covers name and major version only.
///
/// **WHY THIS MATTERS**: Minor and patch releases must keep talking to each
/// other; a major bump must not.
///
/// **BUG THIS CATCHES**: Comparing all eight tag bytes, or none.
#[test]
fn given_tag_versions_when_frame_opened_then_only_major_mismatch_fails() {
    let pair = Arc::new(LocalKeyPair::generate());
    let verifier = FrameVerifier::new(trusting(&pair));
    let current = ProtocolTag::current();
    let name_length = crate::PROTOCOL_NAME.len();
    let major = current.as_bytes()[name_length];

    let newer_minor = ProtocolTag::new(major, 9, 9);
    let frame = FrameSigner::with_tag(Arc::clone(&pair), Some(newer_minor)).seal(b"ok");
    assert!(verifier.open(&frame).is_ok());

    let other_major = ProtocolTag::new(major.wrapping_add(1), 0, 0);
    let frame = FrameSigner::with_tag(Arc::clone(&pair), Some(other_major)).seal(b"ok");
    assert!(matches!(
        verifier.open(&frame),
        Err(FrameError::BadTag { .. })
    ));
}

#[test]
fn given_garbage_tag_when_frame_opened_then_rejected_before_key_lookup() {
    // Nobody is trusted, so reaching the key lookup would yield UnknownKey.
    let verifier = FrameVerifier::new(Arc::new(TrustedKeys::new()));
    let frame = vec![0xAAu8; envelope_length(true) + 4];

    assert!(matches!(
        verifier.open(&frame),
        Err(FrameError::BadTag { .. })
    ));
}

#[test]
fn given_untagged_peers_when_frame_opened_then_payload_is_returned() {
    let pair = Arc::new(LocalKeyPair::generate());
    let signer = FrameSigner::with_tag(Arc::clone(&pair), None);
    let verifier = FrameVerifier::untagged(trusting(&pair));

    let frame = signer.seal(b"no tag");

    assert_eq!(frame.len(), envelope_length(false) + 6);
    assert_eq!(verifier.open(&frame).unwrap(), b"no tag");
}

#[test]
fn given_plain_transport_when_opening_then_frame_is_the_payload() {
    let transport = SessionTransport::Plain;

    let opened = transport.open_inbound(b"raw call").unwrap();

    assert_eq!(&opened[..], b"raw call");
    assert!(!transport.is_signed());
}

#[test]
fn given_signed_transport_when_opening_unsigned_bytes_then_rejected() {
    let pair = LocalKeyPair::generate();
    let transport = SessionTransport::Signed(FrameVerifier::new(trusting(&pair)));

    assert!(transport.open_inbound(b"raw call").is_err());
    assert!(transport.is_signed());
}

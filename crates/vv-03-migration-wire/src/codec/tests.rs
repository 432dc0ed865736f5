//! Tests for WireCodec

use super::*;
use crate::domain::Locale;
use crate::guard::{CORE_ORIGIN, ENTITY_ORIGIN};
use proptest::prelude::*;
use shared_types::{PackageName, SpeciesKind, SpeciesRef};

fn make_snapshot() -> EntitySnapshot {
    let species = SpeciesRef {
        name: "Grazer".into(),
        package: PackageName::new("Grazer, Version=1.0.0.0, Culture=neutral").unwrap(),
        kind: SpeciesKind::Animal,
    };
    let mut snapshot = EntitySnapshot::new(Uuid::new_v4(), species, Point::new(120, -45));
    snapshot.set_stored_energy(87.5).unwrap();
    snapshot.set_generation(4).unwrap();
    snapshot.set_tick_age(1_200).unwrap();
    snapshot.sealed()
}

fn make_wrapper() -> WrapperState {
    WrapperState::new()
        .with("mate", WrapperValue::Id(Uuid::new_v4()))
        .with("mood", WrapperValue::Text("hungry".into()))
        .with("hops", WrapperValue::Integer(-3))
        .with("home", WrapperValue::Point(Point::new(5, 5)))
        .with(
            "next",
            WrapperValue::Action(PendingAction::MoveTo(MovementVector {
                destination: Point::new(9, 1),
                speed: 4,
            })),
        )
}

fn make_message(codec: &WireCodec) -> MigrationMessage {
    let wrapper = codec.encode_wrapper(&make_wrapper()).unwrap();
    MigrationMessage::new(
        Uuid::new_v4(),
        make_snapshot(),
        wrapper,
        Channel::new("EcoSystem"),
        false,
        Locale::new("CA", "BC"),
    )
    .unwrap()
}

/// Frame whose outer tag is chosen by the test.
fn forge_frame(codec: &WireCodec, tag: TypeTag, body: Vec<u8>) -> Vec<u8> {
    codec
        .to_bytes(&Frame {
            magic: MAGIC,
            schema: SCHEMA_VERSION,
            tag,
            body,
        })
        .unwrap()
}

/// Message frame whose nested snapshot tag is chosen by the test.
fn forge_message_with_snapshot_tag(codec: &WireCodec, tag: TypeTag) -> Vec<u8> {
    let body = MessageBody {
        originator: Uuid::new_v4(),
        snapshot: TaggedValue {
            tag,
            body: codec.to_bytes(&make_snapshot()).unwrap(),
        },
        serialized_wrapper: Vec::new(),
        channel: "EcoSystem".into(),
        teleported_to_self: false,
        locale: Locale::default(),
    };
    let body = codec.to_bytes(&body).unwrap();
    forge_frame(codec, tag_of(AllowedType::MigrationMessage), body)
}

#[test]
fn test_delivery_carries_decoded_wrapper() {
    let codec = WireCodec::default();
    let message = make_message(&codec);
    let bytes = codec.encode_message(&message).unwrap();

    let (decoded, wrapper) = codec.decode_delivery(&bytes).unwrap();

    assert_eq!(decoded, message);
    assert_eq!(wrapper.len(), 5);
    assert_eq!(
        wrapper,
        codec.decode_wrapper(message.serialized_wrapper()).unwrap()
    );
}

#[test]
fn test_message_round_trip_preserves_entity() {
    let codec = WireCodec::default();
    let message = make_message(&codec);

    let bytes = codec.encode_message(&message).unwrap();
    let decoded = codec.decode_message(&bytes).unwrap();

    assert_eq!(decoded.snapshot().id(), message.snapshot().id());
    assert_eq!(decoded.snapshot().position(), message.snapshot().position());
    assert_eq!(decoded.snapshot().species(), message.snapshot().species());
    assert!(decoded.snapshot().is_sealed());
    assert_eq!(decoded, message);

    let wrapper = codec.decode_wrapper(decoded.serialized_wrapper()).unwrap();
    assert_eq!(wrapper.len(), 5);
    assert_eq!(wrapper.get("home"), Some(&WrapperValue::Point(Point::new(5, 5))));
}

#[test]
fn test_wrapper_values_survive() {
    let codec = WireCodec::default();
    let decoded = codec
        .decode_wrapper(&codec.encode_wrapper(&make_wrapper()).unwrap())
        .unwrap();

    assert_eq!(decoded.len(), 5);
    assert_eq!(decoded.get("mood"), Some(&WrapperValue::Text("hungry".into())));
    assert_eq!(decoded.get("hops"), Some(&WrapperValue::Integer(-3)));
    assert!(matches!(
        decoded.get("next"),
        Some(WrapperValue::Action(PendingAction::MoveTo(v))) if v.speed == 4
    ));
}

#[test]
fn test_rejects_filesystem_type_at_top_level() {
    let codec = WireCodec::default();
    let bytes = forge_frame(&codec, TypeTag::new("std", "fs::File"), b"/etc/shadow".to_vec());

    let err = codec.decode_message(&bytes).unwrap_err();
    match err {
        WireError::Security(violation) => {
            assert_eq!(violation.origin, "std");
            assert_eq!(violation.type_name, "fs::File");
        }
        other => panic!("expected security violation, got {other:?}"),
    }
}

#[test]
fn test_rejects_process_type_in_nested_snapshot() {
    let codec = WireCodec::default();
    let bytes =
        forge_message_with_snapshot_tag(&codec, TypeTag::new("std::process", "Command"));

    let err = codec.decode_message(&bytes).unwrap_err();
    assert!(err.is_security_violation(), "got {err:?}");
}

#[test]
fn test_rejects_disallowed_wrapper_entry() {
    let codec = WireCodec::default();
    let wrapper = WrapperBody {
        entries: vec![
            (
                "ok".into(),
                TaggedValue {
                    tag: TypeTag::new(CORE_ORIGIN, "i64"),
                    body: codec.to_bytes(&7i64).unwrap(),
                },
            ),
            (
                "payload".into(),
                TaggedValue {
                    tag: TypeTag::new("libloading", "Library"),
                    body: b"evil.so".to_vec(),
                },
            ),
        ],
    };
    let wrapper_bytes = forge_frame(
        &codec,
        tag_of(AllowedType::WrapperState),
        codec.to_bytes(&wrapper).unwrap(),
    );

    let err = codec.decode_wrapper(&wrapper_bytes).unwrap_err();
    assert!(err.is_security_violation());

    // The same wrapper smuggled inside a message poisons the whole message.
    let message = MigrationMessage::new(
        Uuid::new_v4(),
        make_snapshot(),
        wrapper_bytes,
        Channel::default(),
        false,
        Locale::default(),
    )
    .unwrap();
    let bytes = codec.encode_message(&message).unwrap();
    assert!(codec.decode_message(&bytes).unwrap_err().is_security_violation());
}

#[test]
fn test_allowed_but_wrong_type_is_not_substituted() {
    let codec = WireCodec::default();
    let wrapper_bytes = codec.encode_wrapper(&make_wrapper()).unwrap();

    let err = codec.decode_message(&wrapper_bytes).unwrap_err();
    assert!(matches!(
        err,
        WireError::UnexpectedType {
            expected: AllowedType::MigrationMessage,
            found: AllowedType::WrapperState
        }
    ));

    let bytes = forge_message_with_snapshot_tag(
        &codec,
        TypeTag::new(ENTITY_ORIGIN, "WrapperState"),
    );
    assert!(matches!(
        codec.decode_message(&bytes),
        Err(WireError::UnexpectedType { .. })
    ));
}

#[test]
fn test_container_tag_inside_wrapper_rejected() {
    let codec = WireCodec::default();
    let wrapper = WrapperBody {
        entries: vec![(
            "nested".into(),
            TaggedValue {
                tag: tag_of(AllowedType::MigrationMessage),
                body: Vec::new(),
            },
        )],
    };
    let bytes = forge_frame(
        &codec,
        tag_of(AllowedType::WrapperState),
        codec.to_bytes(&wrapper).unwrap(),
    );

    assert!(matches!(
        codec.decode_wrapper(&bytes),
        Err(WireError::NotAValue(AllowedType::MigrationMessage))
    ));
}

#[test]
fn test_schema_and_magic_checked() {
    let codec = WireCodec::default();
    let future = codec
        .to_bytes(&Frame {
            magic: MAGIC,
            schema: SCHEMA_VERSION + 1,
            tag: tag_of(AllowedType::MigrationMessage),
            body: Vec::new(),
        })
        .unwrap();
    assert!(matches!(
        codec.decode_message(&future),
        Err(WireError::UnsupportedSchema { found: 2, expected: 1 })
    ));

    let foreign = codec
        .to_bytes(&Frame {
            magic: *b"HTTP",
            schema: SCHEMA_VERSION,
            tag: tag_of(AllowedType::MigrationMessage),
            body: Vec::new(),
        })
        .unwrap();
    assert!(matches!(codec.decode_message(&foreign), Err(WireError::BadMagic)));
}

#[test]
fn test_size_limit_enforced() {
    let codec = WireCodec::default();
    let bytes = codec.encode_message(&make_message(&codec)).unwrap();

    let tight = WireCodec::new(32);
    assert!(matches!(
        tight.decode_message(&bytes),
        Err(WireError::Codec(_))
    ));
}

#[test]
fn test_truncated_and_trailing_bytes_rejected() {
    let codec = WireCodec::default();
    let bytes = codec.encode_message(&make_message(&codec)).unwrap();

    assert!(codec.decode_message(&bytes[..bytes.len() / 2]).is_err());

    let mut padded = bytes.clone();
    padded.extend_from_slice(&[0u8; 8]);
    assert!(codec.decode_message(&padded).is_err());
}

#[test]
fn test_empty_wrapper_is_empty_state() {
    let codec = WireCodec::default();
    assert!(codec.decode_wrapper(&[]).unwrap().is_empty());
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let codec = WireCodec::default();
        let _ = codec.decode_message(&bytes);
        let _ = codec.decode_wrapper(&bytes);
    }
}

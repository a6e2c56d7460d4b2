use mtcore_tl::deserialize::Error;
use mtcore_tl::json::{json_to_tl, tl_to_json};
use mtcore_tl::{Cursor, EncodeError, Schema, TlObject, TlValue};

fn pong(schema: &Schema, msg_id: i64, ping_id: i64) -> TlObject {
    schema.object("pong").unwrap().with("msg_id", msg_id).with("ping_id", ping_id)
}

#[test]
fn pong_wire_layout() {
    let schema = Schema::mtproto();
    let bytes = schema.object_to_bytes(&pong(&schema, 0x0102, -1)).unwrap();
    let mut expected = hex::decode("c5737734").unwrap();
    expected.extend(0x0102i64.to_le_bytes());
    expected.extend((-1i64).to_le_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn container_of_bare_messages() {
    let schema = Schema::mtproto();
    let message = schema
        .object("message")
        .unwrap()
        .with("msg_id", 77i64)
        .with("seqno", 3i32)
        .with("bytes", 20i32)
        .with("body", pong(&schema, 1, 2));
    let container = schema
        .object("msg_container")
        .unwrap()
        .with("messages", TlValue::vector([message]));

    let bytes = schema.object_to_bytes(&container).unwrap();
    assert_eq!(bytes.len(), 44);
    assert_eq!(&bytes[..4], &0x73f1f8dcu32.to_le_bytes());
    assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
    // bare `message`: msg_id follows the count directly
    assert_eq!(&bytes[8..16], &77i64.to_le_bytes());

    let back = schema.object_from_bytes(&bytes, Some("MessageContainer")).unwrap();
    assert_eq!(back, container);
}

#[test]
fn rpc_result_with_nested_error() {
    let schema = Schema::mtproto();
    let err = schema
        .object("rpc_error")
        .unwrap()
        .with("error_code", 420i32)
        .with("error_message", "FLOOD_WAIT_3");
    let result = schema.object("rpc_result").unwrap().with("req_msg_id", 5i64).with("result", err);

    let bytes = schema.object_to_bytes(&result).unwrap();
    let back = schema.object_from_bytes(&bytes, Some("RpcResult")).unwrap();
    let inner = back.get("result").and_then(TlValue::as_object).unwrap();
    assert_eq!(inner.name, "rpc_error");
    assert_eq!(inner.get("error_message").and_then(TlValue::as_str), Some("FLOOD_WAIT_3"));
}

#[test]
fn boxed_and_bare_vectors() {
    let schema = Schema::mtproto();
    let ack = schema.object("msgs_ack").unwrap().with("msg_ids", TlValue::vector([1i64, 2, 3]));
    let bytes = schema.object_to_bytes(&ack).unwrap();
    assert_eq!(&bytes[4..8], &0x1cb5c415u32.to_le_bytes());
    assert_eq!(bytes.len(), 4 + 8 + 24);

    let salt = schema
        .object("future_salt")
        .unwrap()
        .with("valid_since", 1i32)
        .with("valid_until", 2i32)
        .with("salt", 3i64);
    let salts = schema
        .object("future_salts")
        .unwrap()
        .with("req_msg_id", 9i64)
        .with("now", 10i32)
        .with("salts", TlValue::vector([salt]));
    let bytes = schema.object_to_bytes(&salts).unwrap();
    // id + req_msg_id + now + count + one bare future_salt
    assert_eq!(bytes.len(), 4 + 8 + 4 + 4 + 16);
    assert_eq!(schema.object_from_bytes(&bytes, None).unwrap(), salts);
}

#[test]
fn size_of_matches_encoding() {
    let schema = Schema::mtproto();
    let objects = [
        pong(&schema, 1, 2),
        schema.object("rpc_error").unwrap().with("error_code", 1i32).with("error_message", "x".repeat(300)),
        schema.object("gzip_packed").unwrap().with("packed_data", vec![0u8; 7]),
        json_to_tl(&serde_json::json!({ "a": [1, "b", null], "c": true })),
    ];
    for obj in &objects {
        let bytes = schema.object_to_bytes(obj).unwrap();
        assert_eq!(schema.size_of(obj).unwrap(), bytes.len(), "{obj}");
        assert_eq!(bytes.len() % 4, 0);
    }
}

#[test]
fn unknown_constructor_on_decode() {
    let schema = Schema::mtproto();
    let err = schema.object_from_bytes(&0xdeadbeefu32.to_le_bytes(), None).unwrap_err();
    assert_eq!(err, Error::UnknownConstructor { id: 0xdeadbeef });
}

#[test]
fn unknown_constructor_on_encode() {
    let schema = Schema::mtproto();
    let obj = TlObject::new(0xdeadbeef, "mystery");
    assert_eq!(schema.size_of(&obj), Err(EncodeError::UnknownConstructor { id: 0xdeadbeef }));
}

#[test]
fn unexpected_type_rejected() {
    let schema = Schema::mtproto();
    let bytes = schema.object_to_bytes(&pong(&schema, 1, 2)).unwrap();
    let err = schema.object_from_bytes(&bytes, Some("RpcResult")).unwrap_err();
    assert_eq!(err, Error::UnexpectedConstructor { id: 0x347773c5 });
}

#[test]
fn truncated_object() {
    let schema = Schema::mtproto();
    let bytes = schema.object_to_bytes(&pong(&schema, 1, 2)).unwrap();
    let err = schema.object_from_bytes(&bytes[..bytes.len() - 1], None).unwrap_err();
    assert_eq!(err, Error::UnexpectedEof);
}

#[test]
fn trailing_bytes_after_object() {
    let schema = Schema::mtproto();
    let mut bytes = schema.object_to_bytes(&pong(&schema, 1, 2)).unwrap();
    bytes.extend([0u8; 4]);
    let err = schema.object_from_bytes(&bytes, None).unwrap_err();
    assert_eq!(err, Error::TrailingBytes { count: 4 });

    // a plain cursor read stops at the object boundary
    let mut cursor = Cursor::from_slice(&bytes);
    schema.decode_object(&mut cursor, Some("Pong")).unwrap();
    assert_eq!(cursor.remaining(), 4);
}

#[test]
fn wrong_constructor_for_boxed_field() {
    let schema = Schema::mtproto();
    let copy = schema.object("msg_copy").unwrap().with("orig_message", pong(&schema, 1, 2));
    assert!(matches!(
        schema.object_to_bytes(&copy),
        Err(EncodeError::WrongConstructor { .. })
    ));
}

#[test]
fn extended_schema_with_flags() {
    let mut schema = Schema::mtproto();
    schema
        .extend(
            "---types---\n\
             ns.note#0badf00d flags:# pinned:flags.0?true title:flags.2?string body:string = ns.Note;",
        )
        .unwrap();

    let note = schema.object("ns.note").unwrap().with("pinned", TlValue::True).with("body", "hi");
    let bytes = schema.object_to_bytes(&note).unwrap();
    assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
    let back = schema.object_from_bytes(&bytes, Some("ns.Note")).unwrap();
    assert_eq!(back.get("pinned"), Some(&TlValue::True));
    assert_eq!(back.get("title"), None);

    let titled = schema
        .object("ns.note")
        .unwrap()
        .with("pinned", TlValue::True)
        .with("title", "t")
        .with("body", "hi");
    let bytes = schema.object_to_bytes(&titled).unwrap();
    assert_eq!(&bytes[4..8], &5u32.to_le_bytes());
    assert_eq!(schema.object_from_bytes(&bytes, None).unwrap(), titled);
}

#[test]
fn tl_json_through_the_wire() {
    let schema = Schema::mtproto();
    let value = serde_json::json!({ "list": [1.5, "two", false], "nothing": null });
    let bytes = schema.object_to_bytes(&json_to_tl(&value)).unwrap();
    let back = schema.object_from_bytes(&bytes, Some("JSONValue")).unwrap();
    assert_eq!(tl_to_json(&back).unwrap(), value);
}

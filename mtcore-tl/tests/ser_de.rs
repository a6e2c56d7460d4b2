use mtcore_tl::{Blob, BoxedVec, Cursor, Deserializable, RawVec, Serializable};

// ── Primitive round-trips ─────────────────────────────────────────────────────

#[test]
fn roundtrip_i32() {
    for v in [0i32, -1, i32::MAX, i32::MIN, 42] {
        let bytes = v.to_bytes();
        assert_eq!(bytes, v.to_le_bytes());
        assert_eq!(i32::from_bytes(&bytes).unwrap(), v);
    }
}

#[test]
fn roundtrip_i64() {
    for v in [0i64, -1, i64::MAX, i64::MIN, 1_234_567_890] {
        let bytes = v.to_bytes();
        assert_eq!(i64::from_bytes(&bytes).unwrap(), v);
    }
}

#[test]
fn roundtrip_bool_true() {
    let bytes = true.to_bytes();
    assert_eq!(bytes, 0x997275b5u32.to_le_bytes());
    assert!(bool::from_bytes(&bytes).unwrap());
}

#[test]
fn roundtrip_bool_false() {
    let bytes = false.to_bytes();
    assert_eq!(bytes, 0xbc799737u32.to_le_bytes());
    assert!(!bool::from_bytes(&bytes).unwrap());
}

#[test]
fn bool_rejects_other_ids() {
    use mtcore_tl::deserialize::Error;
    let err = bool::from_bytes(&0x3fedd339u32.to_le_bytes()).unwrap_err();
    assert_eq!(err, Error::UnexpectedConstructor { id: 0x3fedd339 });
}

// ── String / bytes ────────────────────────────────────────────────────────────

#[test]
fn empty_string_is_one_word() {
    let bytes = String::new().to_bytes();
    assert_eq!(bytes, [0, 0, 0, 0]);
    assert_eq!(String::from_bytes(&bytes).unwrap(), "");
}

#[test]
fn short_string_layout() {
    let bytes = "hello".to_bytes();
    assert_eq!(bytes, [5, b'h', b'e', b'l', b'l', b'o', 0, 0]);
    assert_eq!(String::from_bytes(&bytes).unwrap(), "hello");
}

#[test]
fn long_string_uses_marker() {
    // 254+ bytes switch to the 4-byte header
    let s = "x".repeat(300);
    let bytes = s.to_bytes();
    assert_eq!(&bytes[..4], &[0xfe, 0x2c, 0x01, 0x00]);
    assert_eq!(bytes.len() % 4, 0);
    assert_eq!(String::from_bytes(&bytes).unwrap(), s);
}

#[test]
fn roundtrip_bytes_vec() {
    let v: Vec<u8> = (0u8..=255).collect();
    let bytes = v.to_bytes();
    assert_eq!(bytes.len(), v.serialized_len());
    assert_eq!(Vec::<u8>::from_bytes(&bytes).unwrap(), v);
}

#[test]
fn invalid_utf8_rejected() {
    use mtcore_tl::deserialize::Error;
    let bytes = vec![0xffu8, 0xfe].to_bytes();
    assert_eq!(String::from_bytes(&bytes), Err(Error::InvalidUtf8));
}

#[test]
fn oversized_length_prefix_rejected() {
    use mtcore_tl::deserialize::Error;
    let err = Vec::<u8>::from_bytes(&[200, 1, 2, 3]).unwrap_err();
    assert_eq!(err, Error::LengthOverflow { declared: 200, remaining: 3 });
}

// ── Vectors ───────────────────────────────────────────────────────────────────

#[test]
fn boxed_vector_layout() {
    let v = BoxedVec(vec![1i32, 2]);
    let bytes = v.to_bytes();
    assert_eq!(&bytes[..4], &0x1cb5c415u32.to_le_bytes());
    assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
    assert_eq!(bytes.len(), 16);
    assert_eq!(BoxedVec::<i32>::from_bytes(&bytes).unwrap(), v);
}

#[test]
fn raw_vector_has_no_id() {
    let v = RawVec(vec![7i64]);
    let bytes = v.to_bytes();
    assert_eq!(bytes.len(), 12);
    assert_eq!(RawVec::<i64>::from_bytes(&bytes).unwrap(), v);
}

#[test]
fn empty_vector() {
    let bytes = BoxedVec(Vec::<i64>::new()).to_bytes();
    assert_eq!(BoxedVec::<i64>::from_bytes(&bytes).unwrap().0, Vec::<i64>::new());
}

#[test]
fn absurd_vector_count_rejected() {
    let mut bytes = 0x1cb5c415u32.to_le_bytes().to_vec();
    bytes.extend(u32::MAX.to_le_bytes());
    assert!(BoxedVec::<i64>::from_bytes(&bytes).is_err());
}

// ── Fixed-size arrays ─────────────────────────────────────────────────────────

#[test]
fn roundtrip_int128() {
    let v: [u8; 16] = core::array::from_fn(|i| i as u8 + 1);
    assert_eq!(<[u8; 16]>::from_bytes(&v.to_bytes()).unwrap(), v);
}

#[test]
fn roundtrip_int256() {
    let v: [u8; 32] = core::array::from_fn(|i| i as u8);
    assert_eq!(<[u8; 32]>::from_bytes(&v.to_bytes()).unwrap(), v);
}

// ── Cursor ────────────────────────────────────────────────────────────────────

#[test]
fn deserialize_truncated_returns_eof() {
    use mtcore_tl::deserialize::Error;
    let result = i32::from_bytes(&[0x01, 0x02]);
    assert_eq!(result, Err(Error::UnexpectedEof));
}

#[test]
fn from_bytes_rejects_trailing() {
    use mtcore_tl::deserialize::Error;
    let result = i32::from_bytes(&[0, 0, 0, 0, 9]);
    assert_eq!(result, Err(Error::TrailingBytes { count: 1 }));
}

#[test]
fn cursor_reads_sequentially() {
    let mut buf = 5i32.to_bytes();
    buf.extend("ab".to_bytes());
    let mut cur = Cursor::from_slice(&buf);
    assert_eq!(i32::deserialize(&mut cur).unwrap(), 5);
    assert_eq!(String::deserialize(&mut cur).unwrap(), "ab");
    assert_eq!(cur.remaining(), 0);
    cur.finish().unwrap();
}

#[test]
fn blob_takes_the_rest() {
    let blob = Blob::from(vec![1, 2, 3]);
    assert_eq!(blob.to_bytes(), [1, 2, 3]);
    assert_eq!(Blob::from_bytes(&[1, 2, 3]).unwrap(), blob);
}

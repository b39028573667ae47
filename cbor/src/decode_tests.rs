use super::decode::*;
use hex_literal::hex;

fn test_simple<T>(expected: T, data: &[u8])
where
    T: FromCbor + PartialEq + std::fmt::Debug,
    T::Error: std::fmt::Debug,
{
    let (v, len) = T::from_cbor(data).unwrap();
    assert_eq!(len, data.len());
    assert_eq!(v, expected);
}

fn test_value<F>(data: &[u8], expected_tags: &[u64], f: F)
where
    F: FnOnce(Value),
{
    assert_eq!(
        parse_value(data, |value, tags| {
            assert_eq!(tags, expected_tags);
            f(value);
            Ok::<_, Error>(())
        })
        .unwrap()
        .1,
        data.len()
    );
}

#[test]
fn rfc_uint_tests() {
    // RFC 8949, Appendix A:
    // https://www.rfc-editor.org/rfc/rfc8949.html#section-appendix.a

    test_simple(0u64, &hex!("00"));
    test_simple(1u64, &hex!("01"));
    test_simple(10u64, &hex!("0a"));
    test_simple(23u64, &hex!("17"));
    test_simple(24u64, &hex!("1818"));
    test_simple(25u64, &hex!("1819"));
    test_simple(100u64, &hex!("1864"));
    test_simple(1000u64, &hex!("1903e8"));
    test_simple(1000000u64, &hex!("1a000f4240"));
    test_simple(1000000000000u64, &hex!("1b000000e8d4a51000"));
    test_simple(18446744073709551615u64, &hex!("1bffffffffffffffff"));

    test_simple(24u8, &hex!("1818"));
    test_simple(1000u16, &hex!("1903e8"));
    test_simple(1000000u32, &hex!("1a000f4240"));
}

#[test]
fn rfc_negative_tests() {
    test_value(&hex!("20"), &[], |v| {
        assert!(matches!(v, Value::NegativeInteger(0)))
    });
    test_value(&hex!("3863"), &[], |v| {
        assert!(matches!(v, Value::NegativeInteger(99)))
    });
}

#[test]
fn rfc_float_tests() {
    test_value(&hex!("f90000"), &[], |v| {
        assert!(matches!(v, Value::Float(f) if f == 0.0))
    });
    test_value(&hex!("f93c00"), &[], |v| {
        assert!(matches!(v, Value::Float(f) if f == 1.0))
    });
    test_value(&hex!("fb3ff199999999999a"), &[], |v| {
        assert!(matches!(v, Value::Float(f) if f == 1.1))
    });
    test_value(&hex!("fa47c35000"), &[], |v| {
        assert!(matches!(v, Value::Float(f) if f == 100000.0))
    });
    test_value(&hex!("f97c00"), &[], |v| {
        assert!(matches!(v, Value::Float(f) if f.is_infinite()))
    });
}

#[test]
fn rfc_simple_tests() {
    test_value(&hex!("f4"), &[], |v| assert!(matches!(v, Value::False)));
    test_value(&hex!("f5"), &[], |v| assert!(matches!(v, Value::True)));
    test_value(&hex!("f6"), &[], |v| assert!(matches!(v, Value::Null)));
    test_value(&hex!("f7"), &[], |v| assert!(matches!(v, Value::Undefined)));
    test_value(&hex!("f0"), &[], |v| {
        assert!(matches!(v, Value::Simple(16)))
    });
    test_value(&hex!("f8ff"), &[], |v| {
        assert!(matches!(v, Value::Simple(255)))
    });
}

#[test]
fn rfc_string_tests() {
    test_value(&hex!("40"), &[], |v| {
        assert!(matches!(v, Value::Bytes(b) if b.is_empty()))
    });
    test_value(&hex!("4401020304"), &[], |v| {
        assert!(matches!(v, Value::Bytes(b) if b == hex!("01020304")))
    });
    test_value(&hex!("60"), &[], |v| {
        assert!(matches!(v, Value::Text("")))
    });
    test_value(&hex!("6449455446"), &[], |v| {
        assert!(matches!(v, Value::Text("IETF")))
    });
    test_value(&hex!("62c3bc"), &[], |v| {
        assert!(matches!(v, Value::Text("\u{00fc}")))
    });

    // Chunked strings
    test_value(&hex!("5f42010243030405ff"), &[], |v| match v {
        Value::ByteStream(chunks) => {
            assert_eq!(chunks.concat(), hex!("0102030405"))
        }
        _ => panic!("Not a byte stream"),
    });
    test_value(&hex!("7f657374726561646d696e67ff"), &[], |v| match v {
        Value::TextStream(chunks) => assert_eq!(chunks.concat(), "streaming"),
        _ => panic!("Not a text stream"),
    });
}

#[test]
fn rfc_tag_tests() {
    test_value(&hex!("c11a514b67b0"), &[1], |v| {
        assert!(matches!(v, Value::UnsignedInteger(1363896240)))
    });
    test_value(&hex!("d74401020304"), &[23], |v| {
        assert!(matches!(v, Value::Bytes(b) if b == hex!("01020304")))
    });
}

#[test]
fn rfc_array_tests() {
    let ((), len) = parse_array(&hex!("80"), |a, _| {
        assert_eq!(a.count(), Some(0));
        Ok::<_, Error>(())
    })
    .unwrap();
    assert_eq!(len, 1);

    let ((), len) = parse_array(&hex!("83010203"), |a, _| {
        assert!(a.is_definite());
        assert_eq!(a.parse::<u64>()?, 1);
        assert_eq!(a.parse::<u64>()?, 2);
        assert_eq!(a.parse::<u64>()?, 3);
        assert!(a.end()?.is_some());
        Ok::<_, Error>(())
    })
    .unwrap();
    assert_eq!(len, 4);

    // Nested
    parse_array(&hex!("8301820203820405"), |a, _| {
        assert_eq!(a.parse::<u64>()?, 1);
        a.parse_array(|a, _| {
            assert_eq!(a.parse::<u64>()?, 2);
            assert_eq!(a.parse::<u64>()?, 3);
            Ok::<_, Error>(())
        })?;
        a.parse_array(|a, _| {
            a.skip_to_end(16)?;
            Ok::<_, Error>(())
        })?;
        Ok::<_, Error>(())
    })
    .unwrap();

    // Indefinite length, with iteration
    parse_array(&hex!("9f019f0203ff820405ff"), |a, _| {
        assert!(!a.is_definite());
        let mut total = 0u64;
        let mut values = Vec::new();
        loop {
            let done = a
                .try_parse_value(|mut value, _, _| {
                    match &mut value {
                        Value::UnsignedInteger(n) => values.push(*n),
                        _ => value.skip(16)?,
                    }
                    Ok::<_, Error>(())
                })?
                .is_none();
            if done {
                break;
            }
            total += 1;
        }
        assert_eq!(total, 3);
        assert_eq!(values, &[1]);
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn rfc_map_tests() {
    parse_map(&hex!("a201020304"), |m, _| {
        assert_eq!(m.count(), Some(2));
        assert_eq!(m.parse::<u64>()?, 1);
        assert_eq!(m.parse::<u64>()?, 2);
        assert_eq!(m.parse::<u64>()?, 3);
        assert_eq!(m.parse::<u64>()?, 4);
        Ok::<_, Error>(())
    })
    .unwrap();

    // Skipping an unwanted map
    parse_array(&hex!("826161a161626163"), |a, _| {
        a.parse_value(|value, _, _| match value {
            Value::Text(s) => Ok::<_, Error>(assert_eq!(s, "a")),
            _ => panic!("Not text"),
        })?;
        assert!(a.skip_value(16)?.is_some());
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn error_tests() {
    // Truncation
    assert!(matches!(
        u64::from_cbor(&hex!("19")),
        Err(Error::NotEnoughData)
    ));
    assert!(matches!(
        u64::from_cbor(&hex!("1903")),
        Err(Error::NotEnoughData)
    ));
    assert!(matches!(
        parse_value(&hex!("4403"), |_, _| Ok::<_, Error>(())),
        Err(Error::NotEnoughData)
    ));

    // Wrong type
    assert!(matches!(
        u64::from_cbor(&hex!("20")),
        Err(Error::IncorrectType(..))
    ));

    // Tagged where untagged expected
    assert!(matches!(
        u64::from_cbor(&hex!("c101")),
        Err(Error::IncorrectType(..))
    ));

    // Integer narrowing
    assert!(matches!(
        u8::from_cbor(&hex!("190100")),
        Err(Error::TryFromIntError(_))
    ));

    // Tags with no value
    assert!(matches!(
        parse_value(&hex!("c1"), |_, _| Ok::<_, Error>(())),
        Err(Error::JustTags)
    ));

    // Array with unconsumed items
    assert!(matches!(
        parse_array(&hex!("820102"), |a, _| {
            a.parse::<u64>()?;
            Ok::<_, Error>(())
        }),
        Err(Error::MoreItems)
    ));

    // Indefinite map with a dangling key
    assert!(matches!(
        parse_map(&hex!("bf6161ff"), |m, _| {
            m.skip_to_end(16)?;
            Ok::<_, Error>(())
        }),
        Err(Error::PartialMap)
    ));

    // Indefinite array missing its break
    assert!(matches!(
        parse_array(&hex!("9f0102"), |a, _| {
            a.skip_to_end(16)?;
            Ok::<_, Error>(())
        }),
        Err(Error::NotEnoughData)
    ));

    // Invalid chunk inside a chunked string
    assert!(matches!(
        parse_value(&hex!("5f4101616100ff"), |_, _| Ok::<_, Error>(())),
        Err(Error::InvalidChunk)
    ));
}

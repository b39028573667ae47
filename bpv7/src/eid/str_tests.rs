use super::*;

#[test]
fn tests() {
    // Positive tests
    ipn_check("ipn:1.2", 1, 2);
    ipn_check("ipn:1.0", 1, 0);
    ipn_check("ipn:5.12", 5, 12);
    ipn_check("ipn:977000.1", 977000, 1);
    ipn_check(
        "ipn:18446744073709551615.18446744073709551615",
        u64::MAX,
        u64::MAX,
    );

    null_check("ipn:0.0");
    null_check("dtn:none");

    dtn_check("dtn://somewhere/", "somewhere", "");
    dtn_check("dtn://somewhere/else", "somewhere", "else");
    dtn_check(
        "dtn://somewhere/over/the/rainbow",
        "somewhere",
        "over/the/rainbow",
    );
    dtn_check("dtn://node2/inbox", "node2", "inbox");

    // Negative tests
    expect_error("");
    expect_error("dtn");
    expect_error("ipn");
    expect_error(":");
    expect_error("spaniel:");
    expect_error("http://x");

    expect_error("dtn:");
    expect_error("dtn:/");
    expect_error("dtn:somewhere");
    expect_error("dtn:/somewhere");
    expect_error("dtn://");
    expect_error("dtn://somewhere");
    expect_error("dtn:///else");

    expect_error("ipn:");
    expect_error("ipn:1");
    expect_error("ipn:1.2.3");
    expect_error("ipn:1.2.3.4");
    expect_error("ipn:1.");
    expect_error("ipn:.2");

    // Overflow
    expect_error("ipn:111111111111111111111111111111.2");
    expect_error("ipn:1.222222222222222222222222222222");
}

#[test]
fn display_roundtrip() {
    for s in [
        "dtn:none",
        "dtn://somewhere/else",
        "dtn://node1/out",
        "ipn:1.2",
        "ipn:977000.0",
    ] {
        assert_eq!(s.parse::<Eid>().expect("Failed to parse").to_string(), s);
    }
}

#[test]
fn ssp() {
    assert_eq!("dtn://a/b".parse::<Eid>().unwrap().ssp(), "//a/b");
    assert_eq!("dtn:none".parse::<Eid>().unwrap().ssp(), "none");
    assert_eq!("ipn:5.12".parse::<Eid>().unwrap().ssp(), "5.12");
}

fn expect_error(s: &str) -> Error {
    s.parse::<Eid>().expect_err("Parsed successfully!")
}

fn null_check(s: &str) {
    assert!(matches!(
        s.parse::<Eid>().expect("Failed to parse"),
        Eid::Null
    ));
}

fn ipn_check(s: &str, node_number: u64, service_number: u64) {
    match s.parse::<Eid>().expect("Failed to parse") {
        Eid::Ipn {
            node_number: n,
            service_number: sv,
        } => {
            assert_eq!(n, node_number);
            assert_eq!(sv, service_number);
        }
        eid => panic!("Parsed as {eid:?}"),
    }
}

fn dtn_check(s: &str, node_name: &str, demux: &str) {
    match s.parse::<Eid>().expect("Failed to parse") {
        Eid::Dtn {
            node_name: n,
            demux: d,
        } => {
            assert_eq!(&*n, node_name);
            assert_eq!(&*d, demux);
        }
        eid => panic!("Parsed as {eid:?}"),
    }
}

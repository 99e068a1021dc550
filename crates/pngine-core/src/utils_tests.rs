use super::utils::{from_hex, quote, to_hex, width_for_count};

#[test]
fn width_grows_with_digits() {
    assert_eq!(width_for_count(1), 1);
    assert_eq!(width_for_count(100), 2);
    assert_eq!(width_for_count(101), 3);
}

#[test]
fn hex_roundtrip() {
    let bytes = [0x00, 0x7f, 0xff, 0x10];
    assert_eq!(to_hex(&bytes), "007fff10");
    assert_eq!(from_hex("007FFF10"), Some(bytes.to_vec()));
}

#[test]
fn hex_rejects_bad_input() {
    assert_eq!(from_hex("abc"), None);
    assert_eq!(from_hex("zz"), None);
}

#[test]
fn quote_escapes() {
    assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
    assert_eq!(quote("\u{1}"), r#""\u{1}""#);
}

#[test]
fn paint_respects_switch() {
    use crate::Colors;

    assert_eq!(Colors::OFF.paint(Colors::ON.error, "error:"), "error:");
    assert_eq!(
        Colors::ON.paint(Colors::ON.op, "draw"),
        "\x1b[34mdraw\x1b[0m"
    );
}

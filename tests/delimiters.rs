// tests/delimiters.rs

use devloop::exec::delimiter::{end_delimiter, label_name, start_delimiter};

#[test]
fn start_delimiter_is_a_blank_line_then_the_full_label() {
    assert_eq!(start_delimiter("format:prettier"), "\n<format:prettier>");
    assert_eq!(
        start_delimiter("format:prettier(src/a.ts)"),
        "\n<format:prettier(src/a.ts)>"
    );
}

#[test]
fn end_delimiter_drops_the_parenthetical_suffix() {
    assert_eq!(end_delimiter("format:prettier(src/a.ts)"), "</format:prettier>");
    assert_eq!(end_delimiter("run:node"), "</run:node>");
}

#[test]
fn label_name_stops_at_the_first_parenthesis() {
    assert_eq!(label_name("test:ava(src/a(1).test.ts)"), "test:ava");
    assert_eq!(label_name("clean:rimraf"), "clean:rimraf");
}

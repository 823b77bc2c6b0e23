use super::*;
use pretty_assertions::assert_eq;

fn regex_of(pattern: &str) -> String {
    translate(pattern).unwrap().regex
}

#[test]
fn test_magic_classes() {
    assert_eq!(regex_of("%a"), "[a-zA-Z]");
    assert_eq!(regex_of("%d+"), "[0-9]+");
    assert_eq!(regex_of("%S*"), r"[^\t\n\v\f\r ]*");
    assert_eq!(regex_of("%x"), "[0-9A-Fa-f]");
}

#[test]
fn test_literals_are_escaped() {
    assert_eq!(regex_of("a.b"), "a.b");
    assert_eq!(regex_of("%.%+"), r"\.\+");
    assert_eq!(regex_of("{x}"), r"\{x\}");
    assert_eq!(regex_of("a|b"), r"a\|b");
}

#[test]
fn test_positive_set_alternates_pieces() {
    assert_eq!(regex_of("[%d_]"), "(?:[0-9]|[_])");
    assert_eq!(regex_of("[%a%d]"), "(?:[a-zA-Z]|[0-9])");
    assert_eq!(regex_of("[abc]"), "[abc]");
    assert_eq!(regex_of("[%s]"), r"[\t\n\v\f\r ]");
}

#[test]
fn test_set_ranges_and_dashes() {
    assert_eq!(regex_of("[a-f]"), "[a-f]");
    assert_eq!(regex_of("[a-]"), r"[a\-]");
    assert_eq!(regex_of("[-a]"), r"[\-a]");
    assert_eq!(regex_of("[]]"), r"[\]]");
}

#[test]
fn test_negated_set_nests_classes() {
    assert_eq!(regex_of("[^%d,]"), "[^,[0-9]]");
    assert_eq!(regex_of("[^^]"), r"[^\^]");
}

#[test]
fn test_anchors_only_at_ends() {
    assert_eq!(regex_of("^abc$"), "^abc$");
    assert_eq!(regex_of("a^b"), r"a\^b");
    assert_eq!(regex_of("a$b"), r"a\$b");
}

#[test]
fn test_quantifier_after_nothing_is_literal() {
    assert_eq!(regex_of("*a"), r"\*a");
    assert_eq!(regex_of("^*"), r"^\*");
    assert_eq!(regex_of("(+)"), r"(\+)");
}

#[test]
fn test_lazy_dash() {
    assert_eq!(regex_of("a-b"), "a*?b");
    assert_eq!(regex_of("-"), r"\-");
    assert_eq!(regex_of("[a]-"), "[a]*?");
}

#[test]
fn test_captures() {
    let t = translate("(%a+)=()").unwrap();
    assert_eq!(t.regex, "([a-zA-Z]+)=()");
    assert_eq!(t.captures, vec![CaptureKind::Text, CaptureKind::Position]);
}

#[test]
fn test_stray_close_paren_is_literal() {
    assert_eq!(regex_of("a)"), r"a\)");
}

#[test]
fn test_errors() {
    assert_eq!(
        translate("%b()"),
        Err(PatternError::NotImplemented("balanced match %b"))
    );
    assert_eq!(
        translate("%f[%w]"),
        Err(PatternError::NotImplemented("frontier pattern %f"))
    );
    assert_eq!(
        translate("(a)%1"),
        Err(PatternError::NotImplemented("back-reference %n"))
    );
    assert_eq!(translate("abc%"), Err(PatternError::Malformed("ends with '%'")));
    assert_eq!(translate("[abc"), Err(PatternError::Malformed("missing ']'")));
    assert_eq!(translate("(abc"), Err(PatternError::Malformed("unfinished capture")));
}

#[test]
fn test_every_class_letter_expands() {
    for c in "aAlLuUpPwWdDsScCxXzZ".chars() {
        assert!(class_expansion(c).is_some(), "%{c}");
    }
    assert_eq!(class_expansion('q'), None);
}

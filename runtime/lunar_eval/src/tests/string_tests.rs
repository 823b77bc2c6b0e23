//! `string` library.

use super::{n, run, run_err, s};
use crate::errors::ErrorKind;
use crate::Value;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_case_and_length() {
    let src = "return string.upper('abc'), ('ABC'):lower(), string.len('héllo'), ('xyz'):reverse()";
    assert_eq!(run(src).await, vec![s("ABC"), s("abc"), n(5.0), s("zyx")]);
}

#[tokio::test]
async fn test_sub() {
    let src = "local t = 'hello' return t:sub(2, 4), t:sub(-3), t:sub(0), t:sub(4, 2), t:sub(2, 100)";
    assert_eq!(
        run(src).await,
        vec![s("ell"), s("llo"), s("hello"), s(""), s("ello")]
    );
}

#[tokio::test]
async fn test_rep() {
    let src = "return ('ab'):rep(3), ('x'):rep(3, ','), ('x'):rep(0)";
    assert_eq!(run(src).await, vec![s("ababab"), s("x,x,x"), s("")]);
}

#[tokio::test]
async fn test_rep_rejects_oversized_result() {
    let err = run_err("return ('x'):rep(2^62)").await;
    assert_eq!(err.kind, ErrorKind::BadArgumentType);
    assert_eq!(
        err.message,
        "bad argument #2 to 'rep' (resulting string too large)"
    );

    let err = run_err("return ('abc'):rep(2^30, ',')").await;
    assert!(err.message.contains("resulting string too large"), "{}", err.message);

    let src = "local ok = pcall(string.rep, 'x', 2^62) return ok";
    assert_eq!(run(src).await, vec![Value::Boolean(false)]);
}

#[tokio::test]
async fn test_byte_and_char() {
    let src = "return string.byte('A'), string.byte('abc', 2, 3)";
    assert_eq!(run(src).await, vec![n(65.0), n(98.0), n(99.0)]);
    assert_eq!(run("return string.char(72, 105)").await, vec![s("Hi")]);
    let err = run_err("return string.char(-1)").await;
    assert_eq!(err.message, "bad argument #1 to 'char' (value out of range)");
}

#[tokio::test]
async fn test_find_plain_and_pattern() {
    let src = "return ('a123b'):find('%d+')";
    assert_eq!(run(src).await, vec![n(2.0), n(4.0)]);

    let src = "return ('a.b'):find('.', 1, true), ('hello'):find('l'), ('hello'):find('xyz')";
    assert_eq!(run(src).await, vec![n(2.0), n(3.0), Value::Nil]);
}

#[tokio::test]
async fn test_find_returns_captures() {
    let src = "return ('key=value'):find('(%w+)=(%w+)')";
    assert_eq!(
        run(src).await,
        vec![n(1.0), n(9.0), s("key"), s("value")]
    );
}

#[tokio::test]
async fn test_find_init() {
    let src = "return ('abcabc'):find('b', 3), ('abc'):find('c', -1), ('abc'):find('a', 10)";
    assert_eq!(run(src).await, vec![n(5.0), n(3.0), Value::Nil]);
}

#[tokio::test]
async fn test_match() {
    let src = "return ('  trim  '):match('^%s*(.-)%s*$'), ('x=1'):match('(%a)=(%d)'), ('abc'):match('%d')";
    assert_eq!(run(src).await, vec![s("trim"), s("x"), Value::Nil]);
    assert_eq!(run("return ('x=1'):match('(%a)=(%d)')").await, vec![s("x"), s("1")]);
}

#[tokio::test]
async fn test_position_capture() {
    assert_eq!(run("return ('hello'):match('()ll()')").await, vec![n(3.0), n(5.0)]);
}

#[tokio::test]
async fn test_gmatch() {
    let src = "
        local words = {}
        for w in ('one two  three'):gmatch('%a+') do words[#words + 1] = w end
        local pairs_found = 0
        for k, v in ('a=1, b=2'):gmatch('(%w+)=(%w+)') do pairs_found = pairs_found + 1 end
        return #words, words[3], pairs_found";
    assert_eq!(run(src).await, vec![n(3.0), s("three"), n(2.0)]);
}

#[tokio::test]
async fn test_gmatch_anchor_matches_once() {
    let src = "local c = 0 for _ in ('aaa'):gmatch('^a') do c = c + 1 end return c";
    assert_eq!(run(src).await, vec![n(1.0)]);
}

#[tokio::test]
async fn test_gsub_with_string() {
    let src = "return ('hello world'):gsub('o', '0'), ('abc'):gsub('%w', '%0%0'), ('a b'):gsub('(%w)', '<%1>')";
    assert_eq!(
        run(src).await,
        vec![s("hell0 w0rld"), s("aabbcc"), s("<a> <b>"), n(2.0)]
    );
}

#[tokio::test]
async fn test_gsub_limit() {
    assert_eq!(
        run("return ('aaa'):gsub('a', 'b', 2)").await,
        vec![s("bba"), n(2.0)]
    );
}

#[tokio::test]
async fn test_gsub_with_table_and_function() {
    let src = "
        local vars = { name = 'lua', version = 5 }
        local a = ('$name $version $missing'):gsub('%$(%w+)', vars)
        local b = ('1 2 3'):gsub('%d', function(d) return d * 2 end)
        local c = ('keep'):gsub('%w+', function() return false end)
        return a, b, c";
    assert_eq!(
        run(src).await,
        vec![s("lua 5 $missing"), s("2 4 6"), s("keep")]
    );
}

#[tokio::test]
async fn test_gsub_invalid_replacement() {
    let err = run_err("return ('x'):gsub('x', '%2')").await;
    assert_eq!(err.kind, ErrorKind::BadArgumentType);
    assert!(err.message.contains("invalid capture index"), "{}", err.message);

    let err = run_err("return ('x'):gsub('x', '%z')").await;
    assert!(err.message.contains("invalid use of '%'"), "{}", err.message);
}

#[tokio::test]
async fn test_unsupported_pattern_items() {
    let err = run_err("return ('(a)'):find('%b()')").await;
    assert_eq!(err.kind, ErrorKind::NotImplemented);
    assert_eq!(err.message, "balanced match %b is not implemented");

    let err = run_err("return ('aa'):match('(a)%1')").await;
    assert_eq!(err.kind, ErrorKind::NotImplemented);
}

#[tokio::test]
async fn test_malformed_pattern() {
    let err = run_err("return ('x'):find('[a')").await;
    assert_eq!(err.kind, ErrorKind::BadArgumentType);
    assert!(err.message.contains("malformed pattern"), "{}", err.message);
}

#[tokio::test]
async fn test_numbers_coerce_to_strings() {
    assert_eq!(
        run("return string.len(123), string.rep(12, 2)").await,
        vec![n(3.0), s("1212")]
    );
}

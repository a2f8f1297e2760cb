use super::*;
use crate::parser::ParseErrorKind;

fn kinds(source: &str) -> Vec<Vec<TokenKind>> {
    let script = tokenize(source).unwrap();
    script.commands.into_iter().map(|command| command.into_iter().map(|t| t.kind).collect()).collect()
}

fn key(name: &str) -> TokenKind {
    TokenKind::Key(name.to_string())
}

fn num(n: i64) -> TokenKind {
    TokenKind::Value(Literal::Number(n))
}

fn text(s: &str) -> TokenKind {
    TokenKind::Value(Literal::Text(s.to_string()))
}

fn error(source: &str) -> (ParseErrorKind, usize) {
    let err = tokenize(source).unwrap_err();
    (err.kind, err.offset)
}

#[test]
fn test_keys_and_values() {
    assert_eq!(kinds("say \"hi\\n\" ~1F"), [vec![key("say"), text("hi\n"), num(31)]]);
    assert_eq!(kinds("Jump_2 ~"), [vec![key("Jump_2"), num(0)]]);
    assert_eq!(kinds("~ag"), [vec![num(10), key("g")]]);
}

#[test]
fn test_escapes() {
    assert_eq!(kinds(r#""a\"b\\c\t""#), [vec![text("a\"b\\ct")]]);
}

#[test]
fn test_one_command_per_line() {
    let source = "a\n\n   \n// only a comment\nb ~2 // trailing\r\nc";
    assert_eq!(kinds(source), [vec![key("a")], vec![key("b"), num(2)], vec![key("c")]]);
}

#[test]
fn test_operators() {
    assert_eq!(
        kinds("x / y * !z % ~3 = w + v - u"),
        [vec![
            key("x"),
            TokenKind::Operator('/'),
            key("y"),
            TokenKind::Operator('*'),
            TokenKind::Operator('!'),
            key("z"),
            TokenKind::Operator('%'),
            num(3),
            TokenKind::Operator('='),
            key("w"),
            TokenKind::Operator('+'),
            key("v"),
            TokenKind::Operator('-'),
            key("u"),
        ]]
    );
}

#[test]
fn test_end_of_command() {
    assert_eq!(
        kinds("say $i->~2"),
        [vec![key("say"), TokenKind::Variable(0), TokenKind::EndOfCommand, num(2)]]
    );
}

#[test]
fn test_brackets_and_info() {
    assert_eq!(
        kinds("(@time [x])"),
        [vec![
            TokenKind::OpenBracket('('),
            TokenKind::Info("time".to_string()),
            TokenKind::OpenBracket('['),
            key("x"),
            TokenKind::ClosedBracket(']'),
            TokenKind::ClosedBracket(')'),
        ]]
    );
}

#[test]
fn test_variables_share_slots_across_lines() {
    let script = tokenize("$a = $b\n\n$b + $a + $c").unwrap();
    let slots: Vec<Vec<usize>> = script
        .commands
        .iter()
        .map(|command| {
            command
                .iter()
                .filter_map(|t| match t.kind {
                    TokenKind::Variable(slot) => Some(slot),
                    _ => None,
                })
                .collect()
        })
        .collect();
    assert_eq!(slots, [vec![0, 1], vec![1, 0, 2]]);
    assert_eq!(script.variables, ["a", "b", "c"]);
    assert_eq!(script.variable_name(2), Some("c"));
    assert_eq!(script.variable_name(3), None);
}

#[test]
fn test_constants_become_values() {
    assert_eq!(
        kinds("#max : ~ff\nsay #max #max"),
        [vec![num(255)], vec![key("say"), num(255), num(255)]]
    );
}

#[test]
fn test_constant_defined_from_constant() {
    assert_eq!(kinds("#a : #b : \"x\" #b"), [vec![text("x"), text("x")]]);
    assert_eq!(kinds("#a : ~1\n#b : #a\nsay #b"), [vec![num(1)], vec![num(1)], vec![key("say"), num(1)]]);
}

#[test]
fn test_token_offsets() {
    let script = tokenize("ab\n  ~f $x").unwrap();
    let offsets: Vec<usize> = script.commands.iter().flatten().map(|t| t.offset).collect();
    assert_eq!(offsets, [1, 6, 9]);
}

#[test]
fn test_constant_errors() {
    assert_eq!(error("#a : ~1\nsay #nope"), (ParseErrorKind::UnknownConstant("nope".to_string()), 13));
    assert_eq!(error("say #a\n#a : ~1"), (ParseErrorKind::UnknownConstant("a".to_string()), 5));
    assert_eq!(error("#a : ~1\n#a : ~2"), (ParseErrorKind::DuplicateConstant("a".to_string()), 9));
    assert_eq!(error("#a :"), (ParseErrorKind::IncompleteCommand, 1));
    assert_eq!(
        error("#a : $v"),
        (ParseErrorKind::InvalidConstantValue { name: "a".to_string(), value: "$v".to_string() }, 6)
    );
}

#[test]
fn test_lexical_errors() {
    assert_eq!(error("ab ?").0, ParseErrorKind::InvalidCharacter('?'));
    assert_eq!(error("ab ?").1, 4);
    assert_eq!(error("say \"hi").0, ParseErrorKind::UnterminatedString);
    assert_eq!(error("say \"hi\nthere\"").0, ParseErrorKind::UnterminatedString);
    assert_eq!(error("x ~8000000000000000"), (ParseErrorKind::NumberTooLarge, 3));
    assert_eq!(kinds("~7fffffffffffffff"), [vec![num(i64::MAX)]]);
}

#[test]
fn test_error_message() {
    let err = tokenize("say #nope").unwrap_err();
    assert_eq!(err.to_string(), "Constant \"nope\" has not been defined at character 5 (Parsing)\n\"say #nope\"");
}

#[test]
fn test_display() {
    let script = tokenize("say $n \"a\" ~1a -> @t\n(x)").unwrap();
    assert_eq!(
        script.to_string(),
        "KEY: say | VAR: 0 | VAL: \"a\" | VAL: ~1a | EOC | INF: t\nOBR: ( | KEY: x | CBR: )\n"
    );
}

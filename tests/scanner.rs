use rox as lox;

use lox::error::LoxError;
use lox::scanner::Scanner;
use lox::token::{Literal, Token, TokenType};

fn scan_ok(source: &str) -> Vec<Token> {
    Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| panic!("scan failed for {:?}: {}", source, e))
}

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let tokens: Vec<Token> = scan_ok(source);

    assert_eq!(
        tokens.len(),
        expected.len(),
        "token count mismatch for {:?}: {:?}",
        source,
        tokens
    );

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn one_and_two_character_operators() {
    assert_token_sequence(
        "! != = == > >= < <= / - ;",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::SLASH, "/"),
            (TokenType::MINUS, "-"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_token_sequence(
        "var language = lox; while nilable",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "language"),
            (TokenType::EQUAL, "="),
            (TokenType::IDENTIFIER, "lox"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::WHILE, "while"),
            // Keyword prefixes must not swallow identifiers.
            (TokenType::IDENTIFIER, "nilable"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn string_literal_payload() {
    let tokens: Vec<Token> = scan_ok("\"hello world\"");

    assert_eq!(tokens[0].token_type, TokenType::STRING);
    assert_eq!(tokens[0].lexeme, "\"hello world\"");
    assert_eq!(tokens[0].literal, Literal::Str("hello world".to_string()));
}

#[test]
fn multiline_string_advances_line() {
    let tokens: Vec<Token> = scan_ok("\"a\nb\" x");

    // The string starts on line 1; the identifier after it is on line 2.
    assert_eq!(tokens[0].token_type, TokenType::STRING);
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn number_literals() {
    let tokens: Vec<Token> = scan_ok("123 45.67");

    assert_eq!(tokens[0].literal, Literal::Number(123.0));
    assert_eq!(tokens[1].literal, Literal::Number(45.67));
}

#[test]
fn trailing_dot_is_not_consumed() {
    assert_token_sequence(
        "123.",
        &[
            (TokenType::NUMBER, "123"),
            (TokenType::DOT, "."),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn line_comment_is_a_token() {
    assert_token_sequence(
        "1 // rest of line\n2",
        &[
            (TokenType::NUMBER, "1"),
            (TokenType::COMMENT, "// rest of line"),
            (TokenType::NUMBER, "2"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn block_comment_is_a_token() {
    assert_token_sequence(
        "1 /* spans\ntwo lines */ 2",
        &[
            (TokenType::NUMBER, "1"),
            (TokenType::COMMENT, "/* spans\ntwo lines */"),
            (TokenType::NUMBER, "2"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn block_comment_does_not_nest() {
    // The first `*/` closes the comment; the rest is scanned normally.
    assert_token_sequence(
        "/* a /* b */ c",
        &[
            (TokenType::COMMENT, "/* a /* b */"),
            (TokenType::IDENTIFIER, "c"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn unexpected_chars_are_skipped() {
    let source = ",.$(#";
    let results: Vec<_> = Scanner::new(source.as_bytes()).collect();

    // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2, "expected 2 error items");

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            err
        );
    }

    let tokens: Vec<&Token> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(tokens[0].token_type, TokenType::COMMA);
    assert_eq!(tokens[1].token_type, TokenType::DOT);
    assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
    assert_eq!(tokens[3].token_type, TokenType::EOF);
}

#[test]
fn unterminated_string_is_an_error() {
    let results: Vec<_> = Scanner::new(b"\"oops").collect();

    let err = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("expected a scan error");

    assert!(matches!(err, LoxError::Lex { .. }));
    assert!(err.to_string().contains("Unterminated string."));
}

#[test]
fn unterminated_block_comment_is_an_error() {
    let results: Vec<_> = Scanner::new(b"/* never closed").collect();

    let err = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("expected a scan error");

    assert!(err.to_string().contains("Unterminated block comment."));
}

#[test]
fn lines_and_columns() {
    let tokens: Vec<Token> = scan_ok("var x;\n  x = 1;");

    // line 1: `var` at column 1, `x` at 5, `;` at 6
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
    assert_eq!((tokens[2].line, tokens[2].column), (1, 6));

    // line 2: `x` at column 3 after the indent
    assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
}

#[test]
fn lexeme_coverage_reconstructs_source() {
    // Concatenating lexemes (comments included, EOF excluded) in order, with
    // the skipped whitespace, reproduces the source: every lexeme occurs at
    // a position at or after the end of the previous one.
    let source = "var a = 1; // note\nfun f(n) { /* body */ return n; }";

    let mut cursor: usize = 0;

    for result in Scanner::new(source.as_bytes()) {
        let token = result.expect("source scans cleanly");

        if token.token_type == TokenType::EOF {
            break;
        }

        let at = source[cursor..]
            .find(&token.lexeme)
            .unwrap_or_else(|| panic!("lexeme {:?} not found after {}", token.lexeme, cursor));

        // Only whitespace may separate consecutive lexemes.
        assert!(
            source[cursor..cursor + at].chars().all(char::is_whitespace),
            "non-whitespace gap before {:?}",
            token.lexeme
        );

        cursor += at + token.lexeme.len();
    }

    assert!(source[cursor..].chars().all(char::is_whitespace));
}

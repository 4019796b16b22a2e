//! Query Parser (C10): recursive-descent lexer + parser over the grammar
//! spec §4.9 describes, lowering to Redis/RediSearch wire syntax. Grounded
//! 1:1 in `original_source/include/search_core/QueryParser.hpp` and
//! `src/search_core/QueryParser.cpp` (`Lexer`/`Parser`/`Node::to_redis`).

use crate::error::{CoreError, Result};
use crate::models::QueryNode;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenType {
    Word,
    QuotedString,
    And,
    Or,
    Filter,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenType,
    value: String,
    field: String,
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && (self.input[self.pos] as char).is_whitespace() {
            self.pos += 1;
        }
    }

    fn parse_quoted_string(&mut self) -> Result<Token> {
        self.pos += 1;
        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos] != b'"' {
            self.pos += 1;
        }
        if self.pos >= self.input.len() {
            return Err(CoreError::QueryParse("unmatched quote in query".to_string()));
        }
        let value = String::from_utf8_lossy(&self.input[start..self.pos]).to_string();
        self.pos += 1;
        Ok(Token { kind: TokenType::QuotedString, value, field: String::new() })
    }

    fn parse_word(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.input.len() {
            let c = self.input[self.pos] as char;
            if c.is_whitespace() || c == '"' {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).to_string()
    }

    fn next(&mut self) -> Result<Token> {
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return Ok(Token { kind: TokenType::Eof, value: String::new(), field: String::new() });
        }
        if self.input[self.pos] == b'"' {
            return self.parse_quoted_string();
        }

        let word = self.parse_word();
        if word.is_empty() {
            return Err(CoreError::QueryParse(format!("unexpected character at position {}", self.pos)));
        }

        if let Some(colon) = word.find(':') {
            if colon == 0 {
                return Ok(Token { kind: TokenType::Word, value: normalize(&word[1..]), field: String::new() });
            }
            if colon == word.len() - 1 {
                return Ok(Token { kind: TokenType::Word, value: normalize(&word[..colon]), field: String::new() });
            }
            let mut field = word[..colon].to_string();
            let value = word[colon + 1..].to_string();
            if field == "site" {
                field = "domain".to_string();
            }
            return Ok(Token { kind: TokenType::Filter, value, field });
        }

        let lower = word.to_lowercase();
        if lower == "and" {
            return Ok(Token { kind: TokenType::And, value: "AND".to_string(), field: String::new() });
        }
        if lower == "or" || lower == "|" {
            return Ok(Token { kind: TokenType::Or, value: "OR".to_string(), field: String::new() });
        }

        Ok(Token { kind: TokenType::Word, value: normalize(&word), field: String::new() })
    }

    fn peek(&mut self) -> Result<Token> {
        let saved = self.pos;
        let token = self.next()?;
        self.pos = saved;
        Ok(token)
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '|' | ':'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { lexer: Lexer::new(input) }
    }

    fn parse(&mut self) -> Result<QueryNode> {
        let result = self.parse_expression()?;
        let token = self.lexer.next()?;
        if token.kind != TokenType::Eof {
            return Err(CoreError::QueryParse(format!("unexpected token: {}", token.value)));
        }
        result.ok_or_else(|| CoreError::QueryParse("empty query".to_string()))
    }

    fn parse_expression(&mut self) -> Result<Option<QueryNode>> {
        let Some(mut left) = self.parse_term()? else { return Ok(None) };

        loop {
            let token = self.lexer.peek()?;
            match token.kind {
                TokenType::Or => {
                    self.lexer.next()?;
                    let right = self
                        .parse_term()?
                        .ok_or_else(|| CoreError::QueryParse("expected term after OR".to_string()))?;
                    left = combine_or(left, right);
                }
                TokenType::And => {
                    self.lexer.next()?;
                    let right = self
                        .parse_term()?
                        .ok_or_else(|| CoreError::QueryParse("expected term after AND".to_string()))?;
                    left = combine_and(left, right);
                }
                TokenType::Word | TokenType::QuotedString | TokenType::Filter => {
                    let Some(right) = self.parse_term()? else { break };
                    left = combine_and(left, right);
                }
                _ => break,
            }
        }

        Ok(Some(left))
    }

    fn parse_term(&mut self) -> Result<Option<QueryNode>> {
        let token = self.lexer.peek()?;
        match token.kind {
            TokenType::Word => {
                self.lexer.next()?;
                Ok(Some(QueryNode::term(token.value, false)))
            }
            TokenType::QuotedString => {
                self.lexer.next()?;
                Ok(Some(QueryNode::term(token.value, true)))
            }
            TokenType::Filter => {
                self.lexer.next()?;
                Ok(Some(QueryNode::filter(token.field, token.value)))
            }
            _ => Ok(None),
        }
    }
}

fn combine_and(left: QueryNode, right: QueryNode) -> QueryNode {
    match left {
        QueryNode::And(mut children) => {
            children.push(right);
            QueryNode::And(children)
        }
        other => QueryNode::And(vec![other, right]),
    }
}

fn combine_or(left: QueryNode, right: QueryNode) -> QueryNode {
    match left {
        QueryNode::Or(mut children) => {
            children.push(right);
            QueryNode::Or(children)
        }
        other => QueryNode::Or(vec![other, right]),
    }
}

/// Parses a raw user query into a [`QueryNode`] AST (spec §4.9).
pub fn parse(query: &str) -> Result<QueryNode> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(CoreError::QueryParse("empty query".to_string()));
    }
    Parser::new(trimmed).parse()
}

/// Lowers an AST node to Redis/RediSearch wire syntax (spec §4.9/§6).
pub fn to_redis(node: &QueryNode) -> String {
    match node {
        QueryNode::Term { value, exact } => {
            if *exact {
                format!("\"{value}\"")
            } else {
                value.clone()
            }
        }
        QueryNode::Filter { field, value } => format!("@{field}:{{{value}}}"),
        QueryNode::And(children) => children.iter().map(to_redis).collect::<Vec<_>>().join(" "),
        QueryNode::Or(children) => children.iter().map(to_redis).collect::<Vec<_>>().join("|"),
    }
}

/// Convenience: parse then lower in one call, as the external surface uses it.
pub fn compile(query: &str) -> Result<String> {
    Ok(to_redis(&parse(query)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_parses_to_term() {
        assert_eq!(parse("rust").unwrap(), QueryNode::term("rust", false));
    }

    #[test]
    fn quoted_string_is_exact_term() {
        assert_eq!(parse("\"hello world\"").unwrap(), QueryNode::term("hello world", true));
    }

    #[test]
    fn filter_syntax_lowers_to_redis_tag_filter() {
        let ast = parse("domain:example.com").unwrap();
        assert_eq!(to_redis(&ast), "@domain:{example.com}");
    }

    #[test]
    fn site_is_an_alias_for_domain() {
        let ast = parse("site:example.com").unwrap();
        assert_eq!(ast, QueryNode::filter("domain", "example.com"));
    }

    #[test]
    fn implicit_and_between_adjacent_terms() {
        let ast = parse("rust search").unwrap();
        assert_eq!(to_redis(&ast), "rust search");
    }

    #[test]
    fn explicit_or_uses_pipe_in_wire_syntax() {
        let ast = parse("rust or python").unwrap();
        assert_eq!(to_redis(&ast), "rust|python");
    }

    #[test]
    fn mixed_and_or_flattens_same_operator_runs() {
        let ast = parse("a and b and c").unwrap();
        match ast {
            QueryNode::And(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected And node"),
        }
    }

    #[test]
    fn unmatched_quote_is_a_parse_error() {
        assert!(parse("\"unterminated").is_err());
    }

    #[test]
    fn empty_query_is_a_parse_error() {
        assert!(parse("   ").is_err());
    }
}

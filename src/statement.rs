//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG statements and their parser.

use crate::error::{Error, Result};

/// A parsed YANG statement: `[prefix:]keyword [argument] (";" | "{" ... "}")`.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    prefix: Option<String>,
    keyword: String,
    argument: Option<String>,
    substatements: Vec<Statement>,
}

impl Statement {
    /// Keyword of the statement, without the extension prefix.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Extension prefix of the statement, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Argument of a statement that requires one.
    pub fn expect_argument(&self) -> Result<&str> {
        self.argument.as_deref().ok_or_else(|| {
            Error::BadYangLibrary(format!(
                "missing argument of '{}' statement",
                self.keyword
            ))
        })
    }

    pub fn substatements(&self) -> &[Statement] {
        &self.substatements
    }

    pub(crate) fn substatements_mut(&mut self) -> &mut Vec<Statement> {
        &mut self.substatements
    }

    /// First substatement with the given (unprefixed) keyword.
    pub fn find1(&self, keyword: &str) -> Option<&Statement> {
        self.substatements
            .iter()
            .find(|s| s.prefix.is_none() && s.keyword == keyword)
    }

    /// All substatements with the given (unprefixed) keyword, in order.
    pub fn find_all<'a>(
        &'a self,
        keyword: &'a str,
    ) -> impl Iterator<Item = &'a Statement> + 'a {
        self.substatements
            .iter()
            .filter(move |s| s.prefix.is_none() && s.keyword == keyword)
    }
}

/// Parse YANG source text into its single top-level statement.
pub fn parse(text: &str) -> Result<Statement> {
    let mut lexer = Lexer { src: text, pos: 0 };
    lexer.skip_trivia()?;
    let statement = lexer.statement()?;
    lexer.skip_trivia()?;
    if lexer.pos < lexer.src.len() {
        return Err(Error::unexpected_input(lexer.pos, "end of input"));
    }
    Ok(statement)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    /// Skip whitespace and both comment forms.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.pos += 1;
                }
                Some(b'/') if self.src[self.pos..].starts_with("//") => {
                    match self.src[self.pos..].find('\n') {
                        Some(eol) => self.pos += eol + 1,
                        None => self.pos = self.src.len(),
                    }
                }
                Some(b'/') if self.src[self.pos..].starts_with("/*") => {
                    match self.src[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => {
                            return Err(Error::EndOfInput(
                                "end of comment".to_string(),
                            ))
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.pos += 1,
            Some(_) => {
                return Err(Error::unexpected_input(self.pos, "identifier"))
            }
            None => return Err(Error::EndOfInput("identifier".to_string())),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'-') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(&self.src[start..self.pos])
    }

    fn statement(&mut self) -> Result<Statement> {
        let first = self.identifier()?;
        let (prefix, keyword) = if self.peek() == Some(b':') {
            self.pos += 1;
            (Some(first.to_string()), self.identifier()?.to_string())
        } else {
            (None, first.to_string())
        };
        self.skip_trivia()?;

        let argument = self.argument()?;
        self.skip_trivia()?;

        let mut substatements = Vec::new();
        match self.peek() {
            Some(b';') => self.pos += 1,
            Some(b'{') => {
                self.pos += 1;
                loop {
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b'}') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => substatements.push(self.statement()?),
                        None => {
                            return Err(Error::EndOfInput("'}'".to_string()))
                        }
                    }
                }
            }
            Some(_) => {
                return Err(Error::unexpected_input(self.pos, "';' or '{'"))
            }
            None => return Err(Error::EndOfInput("';' or '{'".to_string())),
        }

        Ok(Statement {
            prefix,
            keyword,
            argument,
            substatements,
        })
    }

    fn argument(&mut self) -> Result<Option<String>> {
        match self.peek() {
            Some(b';') | Some(b'{') => Ok(None),
            Some(b'"') | Some(b'\'') => {
                let mut argument = self.quoted()?;
                // String concatenation with '+'.
                loop {
                    self.skip_trivia()?;
                    if self.peek() == Some(b'+') {
                        self.pos += 1;
                        self.skip_trivia()?;
                        argument.push_str(&self.quoted()?);
                    } else {
                        break;
                    }
                }
                Ok(Some(argument))
            }
            Some(_) => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_ascii_whitespace()
                        || matches!(c, b';' | b'{' | b'}' | b'"' | b'\'')
                        || self.src[self.pos..].starts_with("//")
                        || self.src[self.pos..].starts_with("/*")
                    {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(Error::unexpected_input(start, "argument"));
                }
                Ok(Some(self.src[start..self.pos].to_string()))
            }
            None => Err(Error::EndOfInput("argument".to_string())),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(Error::unexpected_input(self.pos, "quote")),
        };
        self.pos += 1;
        let mut result = String::new();
        loop {
            let rest = &self.src[self.pos..];
            let mut chars = rest.char_indices();
            match chars.next() {
                None => {
                    return Err(Error::EndOfInput(format!(
                        "closing {}",
                        quote as char
                    )))
                }
                Some((_, c)) if c as u32 == quote as u32 => {
                    self.pos += 1;
                    return Ok(result);
                }
                // Escape sequences are recognized in double quotes only.
                Some((_, '\\')) if quote == b'"' => match chars.next() {
                    Some((_, 'n')) => {
                        result.push('\n');
                        self.pos += 2;
                    }
                    Some((_, 't')) => {
                        result.push('\t');
                        self.pos += 2;
                    }
                    Some((_, '"')) => {
                        result.push('"');
                        self.pos += 2;
                    }
                    Some((_, '\\')) => {
                        result.push('\\');
                        self.pos += 2;
                    }
                    _ => {
                        return Err(Error::unexpected_input(
                            self.pos,
                            "escape sequence",
                        ))
                    }
                },
                Some((_, c)) => {
                    result.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_module() {
        let module = parse(
            r#"module test {
                 namespace "urn:test";  // line comment
                 prefix t;
                 /* block
                    comment */
                 container c {
                   leaf l {
                     type string;
                     description "first part " + 'and second';
                   }
                 }
               }"#,
        )
        .unwrap();

        assert_eq!(module.keyword(), "module");
        assert_eq!(module.argument(), Some("test"));
        assert_eq!(
            module.find1("namespace").unwrap().argument(),
            Some("urn:test")
        );
        let leaf = module.find1("container").unwrap().find1("leaf").unwrap();
        assert_eq!(
            leaf.find1("description").unwrap().argument(),
            Some("first part and second")
        );
    }

    #[test]
    fn parse_escapes() {
        let statement = parse(r#"description "a\"b\n";"#).unwrap();
        assert_eq!(statement.argument(), Some("a\"b\n"));
    }

    #[test]
    fn parse_prefixed_keyword() {
        let module =
            parse("container c { nacm:default-deny-write; }").unwrap();
        let sub = &module.substatements()[0];
        assert_eq!(sub.prefix(), Some("nacm"));
        assert_eq!(sub.keyword(), "default-deny-write");
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            parse("module m { leaf l }"),
            Err(Error::UnexpectedInput { .. })
        ));
        assert!(matches!(
            parse("module m {"),
            Err(Error::EndOfInput(_))
        ));
    }
}

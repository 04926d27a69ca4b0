// crates/suitebase-core/src/descriptor.rs
// ============================================================================
// Module: Extension Descriptors
// Description: Compact textual form naming a class and its arguments.
// Purpose: Parse `Class(name="value", ...)` strings into validated arguments.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A descriptor names an extension class and optionally supplies text
//! arguments, typically from a command line:
//!
//! ```text
//! descriptor := class [ "(" [ argument ( "," argument )* ] ")" ]
//! argument   := name "=" quoted-string
//! ```
//!
//! Quoted strings use single or double quotes with the escapes `\\`, `\"`,
//! `\'`, `\n`, `\t`, and `\r`. Values are taken verbatim; nothing is
//! evaluated. When the class names an existing extension file, the file is
//! loaded first and the explicit arguments override its arguments by name.
//! Security posture: descriptor input is untrusted and size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::element::ElementError;
use crate::element::ExtensionElement;
use crate::extension::ArgumentError;
use crate::extension::ClassLoader;
use crate::extension::ClassSchema;
use crate::extension::Extension;
use crate::extension::SchemaError;
use crate::field::AttachmentResolver;
use crate::value::Arguments;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum allowed descriptor input size in bytes.
pub const MAX_DESCRIPTOR_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that can occur while parsing a descriptor string.
///
/// # Invariants
/// - `offset` values are byte offsets into the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Input was empty or contained only whitespace.
    EmptyInput,
    /// Input exceeded [`MAX_DESCRIPTOR_BYTES`].
    InputTooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual input length in bytes.
        actual_bytes: usize,
    },
    /// The input does not follow the descriptor grammar.
    Syntax {
        /// Human-friendly expectation summary.
        expected: &'static str,
        /// Byte offset of the failure.
        offset: usize,
        /// Unparsed input starting at `offset`.
        remainder: String,
    },
    /// The same argument name was given twice.
    DuplicateArgument {
        /// Repeated argument name.
        name: String,
        /// Byte offset of the second occurrence.
        offset: usize,
    },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "descriptor is empty"),
            Self::InputTooLarge {
                max_bytes,
                actual_bytes,
            } => {
                write!(f, "descriptor exceeds size limit: {actual_bytes} bytes (max {max_bytes})")
            }
            Self::Syntax {
                expected,
                offset,
                remainder,
            } => {
                write!(f, "descriptor syntax error at {offset}: expected {expected}, found `{remainder}`")
            }
            Self::DuplicateArgument {
                name,
                offset,
            } => write!(f, "argument `{name}` given more than once at {offset}"),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Errors produced while resolving a descriptor against a class loader.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The descriptor text is malformed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    /// The named class could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// An explicit argument was rejected.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// The referenced extension file could not be loaded.
    #[error(transparent)]
    Element(#[from] ElementError),
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Parsed descriptor: class name and raw text arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Class name or path to an extension file.
    pub class_name: String,
    /// Explicit text arguments keyed by name.
    pub arguments: BTreeMap<String, String>,
}

/// Descriptor resolved to a class schema and typed arguments.
#[derive(Debug, Clone)]
pub struct ResolvedDescriptor {
    /// Schema of the resolved class.
    pub schema: Arc<ClassSchema>,
    /// Merged explicit arguments.
    pub arguments: Arguments,
}

impl ResolvedDescriptor {
    /// Instantiates the resolved class.
    ///
    /// # Errors
    ///
    /// See [`ClassSchema::instantiate`].
    pub fn instantiate(&self, computed: &Arguments) -> Result<Extension, ArgumentError> {
        self.schema.instantiate(&self.arguments, computed)
    }
}

/// Parses a descriptor string.
///
/// # Errors
///
/// Returns [`DescriptorError`] for empty or oversized input, grammar
/// violations (including unquoted values), and repeated argument names.
pub fn parse_descriptor(input: &str) -> Result<Descriptor, DescriptorError> {
    if input.len() > MAX_DESCRIPTOR_BYTES {
        return Err(DescriptorError::InputTooLarge {
            max_bytes: MAX_DESCRIPTOR_BYTES,
            actual_bytes: input.len(),
        });
    }
    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser::new(input, tokens);
    let descriptor = parser.parse_descriptor()?;
    parser.expect_eof()?;
    Ok(descriptor)
}

/// Parses a descriptor and validates its arguments against the class.
///
/// When the class name is the path of an existing extension file, the file
/// supplies the class and base arguments; explicit arguments override them.
///
/// # Errors
///
/// Returns [`ResolveError`] when parsing, class loading, file loading, or
/// argument validation fails.
pub fn resolve_descriptor(
    loader: &dyn ClassLoader,
    input: &str,
    resolver: Option<&dyn AttachmentResolver>,
) -> Result<ResolvedDescriptor, ResolveError> {
    let descriptor = parse_descriptor(input)?;
    let path = Path::new(&descriptor.class_name);
    let (schema, mut arguments) = if path.is_file() {
        ExtensionElement::read_file(path)?.decode_arguments(loader, resolver)?
    } else {
        (loader.load_class(&descriptor.class_name)?, Arguments::new())
    };
    let explicit = schema.validate_arguments(&descriptor.arguments)?;
    arguments.extend(explicit);
    Ok(ResolvedDescriptor {
        schema,
        arguments,
    })
}

// ============================================================================
// SECTION: Lexer
// ============================================================================

/// Lexer token produced from descriptor input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    /// Bare word: class name or argument name.
    Word(&'a str),
    /// Unescaped contents of a quoted string.
    Str(String),
    /// Left parenthesis.
    LParen,
    /// Right parenthesis.
    RParen,
    /// Comma separator.
    Comma,
    /// Equals sign.
    Equals,
    /// End-of-input marker.
    Eof,
}

/// Token paired with its byte offset.
#[derive(Debug, Clone)]
struct SpannedToken<'a> {
    /// Token value.
    token: Token<'a>,
    /// Byte offset into the input.
    position: usize,
}

/// Lexer for descriptor strings.
struct Lexer<'a> {
    /// Source input being tokenized.
    input: &'a str,
    /// Current byte offset into the input.
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
        }
    }

    /// Lexes the input into a sequence of tokens.
    fn lex(&mut self) -> Result<Vec<SpannedToken<'a>>, DescriptorError> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                ch if ch.is_whitespace() => self.offset += ch.len_utf8(),
                '(' => tokens.push(self.single(Token::LParen)),
                ')' => tokens.push(self.single(Token::RParen)),
                ',' => tokens.push(self.single(Token::Comma)),
                '=' => tokens.push(self.single(Token::Equals)),
                '"' | '\'' => tokens.push(self.quoted(ch)?),
                _ => {
                    let start = self.offset;
                    self.consume_while(is_word_char);
                    tokens.push(SpannedToken {
                        token: Token::Word(&self.input[start .. self.offset]),
                        position: start,
                    });
                }
            }
        }
        if tokens.is_empty() {
            return Err(DescriptorError::EmptyInput);
        }
        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
        });
        Ok(tokens)
    }

    /// Returns the character at the current offset.
    fn peek(&self) -> Option<char> {
        self.input[self.offset ..].chars().next()
    }

    /// Emits a one-byte token at the current offset and advances past it.
    fn single(&mut self, token: Token<'a>) -> SpannedToken<'a> {
        let spanned = SpannedToken {
            token,
            position: self.offset,
        };
        self.offset += 1;
        spanned
    }

    /// Advances while the condition matches the current character.
    fn consume_while(&mut self, condition: fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !condition(ch) {
                break;
            }
            self.offset += ch.len_utf8();
        }
    }

    /// Lexes a quoted string starting at the current offset.
    fn quoted(&mut self, quote: char) -> Result<SpannedToken<'a>, DescriptorError> {
        let start = self.offset;
        self.offset += quote.len_utf8();
        let mut value = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(syntax_error(self.input, "closing quote", start));
            };
            self.offset += ch.len_utf8();
            if ch == quote {
                break;
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            let escape_start = self.offset - 1;
            let escaped = match self.peek() {
                Some('\\') => '\\',
                Some('"') => '"',
                Some('\'') => '\'',
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                _ => return Err(syntax_error(self.input, "valid escape sequence", escape_start)),
            };
            self.offset += 1;
            value.push(escaped);
        }
        Ok(SpannedToken {
            token: Token::Str(value),
            position: start,
        })
    }
}

/// Returns true for characters that may appear in a bare word.
fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | ',' | '=' | '"' | '\'')
}

/// Builds a syntax error at `offset` carrying the unparsed remainder.
fn syntax_error(input: &str, expected: &'static str, offset: usize) -> DescriptorError {
    DescriptorError::Syntax {
        expected,
        offset,
        remainder: input.get(offset ..).unwrap_or_default().to_string(),
    }
}

// ============================================================================
// SECTION: Parser
// ============================================================================

/// Recursive-descent parser for descriptor strings.
struct Parser<'a> {
    /// Original input string (for diagnostics).
    input: &'a str,
    /// Token stream with source positions.
    tokens: Vec<SpannedToken<'a>>,
    /// Current token index.
    index: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the token stream.
    const fn new(input: &'a str, tokens: Vec<SpannedToken<'a>>) -> Self {
        Self {
            input,
            tokens,
            index: 0,
        }
    }

    /// Parses `class [ "(" arguments ")" ]`.
    fn parse_descriptor(&mut self) -> Result<Descriptor, DescriptorError> {
        let class_name = self.expect_word("class name")?;
        let mut arguments = BTreeMap::new();
        if self.matches(&Token::LParen) {
            if self.matches(&Token::RParen) {
                return Ok(Descriptor {
                    class_name,
                    arguments,
                });
            }
            loop {
                let position = self.current_position();
                let (name, value) = self.parse_argument()?;
                if arguments.contains_key(&name) {
                    return Err(DescriptorError::DuplicateArgument {
                        name,
                        offset: position,
                    });
                }
                arguments.insert(name, value);
                if self.matches(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, "`,` or `)`")?;
                break;
            }
        }
        Ok(Descriptor {
            class_name,
            arguments,
        })
    }

    /// Parses `name "=" quoted-string`.
    fn parse_argument(&mut self) -> Result<(String, String), DescriptorError> {
        let name = self.expect_word("argument name")?;
        self.expect(&Token::Equals, "`=`")?;
        let value = match self.current_token() {
            Some(Token::Str(value)) => value.clone(),
            _ => return Err(self.error_here("quoted string")),
        };
        self.advance();
        Ok((name, value))
    }

    /// Consumes a bare word or returns an error.
    fn expect_word(&mut self, expected: &'static str) -> Result<String, DescriptorError> {
        match self.current_token() {
            Some(Token::Word(word)) => {
                let word = (*word).to_string();
                self.advance();
                Ok(word)
            }
            _ => Err(self.error_here(expected)),
        }
    }

    /// Consumes the expected token or returns an error.
    fn expect(&mut self, token: &Token<'_>, expected: &'static str) -> Result<(), DescriptorError> {
        if self.matches(token) { Ok(()) } else { Err(self.error_here(expected)) }
    }

    /// Ensures the parser is at end-of-input.
    fn expect_eof(&self) -> Result<(), DescriptorError> {
        match self.current_token() {
            Some(Token::Eof) | None => Ok(()),
            Some(_) => Err(self.error_here("end of input")),
        }
    }

    /// Consumes the token if it has the same kind as `kind`.
    fn matches(&mut self, kind: &Token<'_>) -> bool {
        let same = self
            .current_token()
            .is_some_and(|token| std::mem::discriminant(token) == std::mem::discriminant(kind));
        if same {
            self.advance();
        }
        same
    }

    /// Returns the current token.
    fn current_token(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.index).map(|spanned| &spanned.token)
    }

    /// Returns the byte offset of the current token.
    fn current_position(&self) -> usize {
        self.tokens.get(self.index).map_or(self.input.len(), |spanned| spanned.position)
    }

    /// Advances to the next token.
    const fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    /// Builds a syntax error at the current token.
    fn error_here(&self, expected: &'static str) -> DescriptorError {
        syntax_error(self.input, expected, self.current_position())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

//! Parser for rule bodies.
//!
//! Accepted form:
//!
//! ```text
//! PREFIX ex: <http://example.org/>
//! CONSTRUCT { ?a ex:rel ?b . }
//! WHERE {
//!     $this ex:left ?a ; ex:right ?b .
//!     BIND(MINT(ex:rel, ?root, ?gloss) AS ?m)
//! }
//! ```
//!
//! Triple blocks use Turtle abbreviations (`;` `,` `a` `[ ]`). `$this` and
//! `?this` both name the focus node. Blank nodes in WHERE are anonymous
//! variables; blank nodes in CONSTRUCT are fresh for every solution.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RuleError, RuleResult};
use crate::graph::pattern::{PatternTerm, TriplePattern};
use crate::graph::{Iri, Literal, Term};
use crate::vocab;

use super::{FOCUS_VAR, MintBind, RuleBody, TemplateTerm, TemplateTriple};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Iri(String),
    PName { prefix: String, local: String },
    Var(String),
    Blank(String),
    Str(String),
    LangTag(String),
    DoubleCaret,
    Number { lexical: String, datatype: &'static str },
    Word(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

struct Lexer<'a> {
    rule: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl<'a> Lexer<'a> {
    fn new(rule: &'a str, text: &str) -> Self {
        Self {
            rule,
            chars: text.char_indices().collect(),
            pos: 0,
            len: text.len(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |&(o, _)| o)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> RuleError {
        RuleError::Syntax {
            rule: self.rule.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        out
    }

    fn tokens(mut self) -> RuleResult<Vec<Spanned>> {
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            let offset = self.offset();
            let token = match c {
                c if c.is_whitespace() => {
                    self.pos += 1;
                    continue;
                }
                '#' => {
                    self.take_while(|c| c != '\n');
                    continue;
                }
                '<' => {
                    self.pos += 1;
                    let iri = self.take_while(|c| c != '>' && !c.is_whitespace());
                    if self.bump() != Some('>') {
                        return Err(self.error(offset, "unterminated IRI"));
                    }
                    Token::Iri(iri)
                }
                '?' | '$' => {
                    self.pos += 1;
                    let name = self.take_while(is_name_char);
                    if name.is_empty() {
                        return Err(self.error(offset, "empty variable name"));
                    }
                    Token::Var(name)
                }
                '_' if self.peek_at(1) == Some(':') => {
                    self.pos += 2;
                    let label = self.local_name();
                    if label.is_empty() {
                        return Err(self.error(offset, "empty blank node label"));
                    }
                    Token::Blank(label)
                }
                '"' | '\'' => Token::Str(self.string(c)?),
                '@' => {
                    self.pos += 1;
                    let tag = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
                    if tag.is_empty() {
                        return Err(self.error(offset, "empty language tag"));
                    }
                    Token::LangTag(tag)
                }
                '^' if self.peek_at(1) == Some('^') => {
                    self.pos += 2;
                    Token::DoubleCaret
                }
                c if c.is_ascii_digit()
                    || ((c == '+' || c == '-' || c == '.')
                        && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.number()
                }
                '{' | '}' | '(' | ')' | '.' | ';' | ',' | '[' | ']' => {
                    self.pos += 1;
                    Token::Punct(c)
                }
                c if c.is_alphabetic() || c == ':' => {
                    let word = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '-');
                    if self.peek() == Some(':') {
                        self.pos += 1;
                        let local = self.local_name();
                        Token::PName {
                            prefix: word,
                            local,
                        }
                    } else {
                        Token::Word(word)
                    }
                }
                other => return Err(self.error(offset, format!("unexpected character {other:?}"))),
            };
            out.push(Spanned { token, offset });
        }
        Ok(out)
    }

    /// Local part of a prefixed name or blank label; a trailing `.` ends the statement.
    fn local_name(&mut self) -> String {
        let mut name = self.take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '%'));
        while name.ends_with('.') {
            name.pop();
            self.pos -= 1;
        }
        name
    }

    fn number(&mut self) -> Token {
        let mut lexical = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            lexical.push(sign);
            self.pos += 1;
        }
        lexical.push_str(&self.take_while(|c| c.is_ascii_digit()));
        let mut datatype = vocab::XSD_INTEGER;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            lexical.push('.');
            lexical.push_str(&self.take_while(|c| c.is_ascii_digit()));
            datatype = vocab::XSD_DECIMAL;
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            let digits_at = if matches!(self.peek_at(1), Some('+' | '-')) { 2 } else { 1 };
            if self.peek_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                lexical.push(e);
                self.pos += 1;
                if digits_at == 2 {
                    lexical.extend(self.bump());
                }
                lexical.push_str(&self.take_while(|c| c.is_ascii_digit()));
                datatype = vocab::XSD_DOUBLE;
            }
        }
        Token::Number { lexical, datatype }
    }

    fn string(&mut self, quote: char) -> RuleResult<String> {
        let start = self.offset();
        let long = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if long { 3 } else { 1 };

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(start, "unterminated string"));
            };
            match c {
                '\\' => out.push(self.escape(start)?),
                c if c == quote && !long => return Ok(out),
                c if c == quote && self.peek() == Some(quote) && self.peek_at(1) == Some(quote) => {
                    self.pos += 2;
                    return Ok(out);
                }
                '\n' | '\r' if !long => return Err(self.error(start, "newline in short string")),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, start: usize) -> RuleResult<char> {
        let c = self.bump().ok_or_else(|| self.error(start, "dangling escape"))?;
        Ok(match c {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '"' | '\'' | '\\' => c,
            'u' | 'U' => {
                let width = if c == 'u' { 4 } else { 8 };
                let hex: String = (0..width).filter_map(|_| self.bump()).collect();
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(start, format!("bad unicode escape \\{c}{hex}")))?
            }
            other => return Err(self.error(start, format!("unknown escape \\{other}"))),
        })
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// A parsed term before it is placed in a pattern or a template.
#[derive(Debug, Clone)]
enum Node {
    Var(String),
    Iri(String),
    Blank(String),
    Anon(usize),
    Literal(Literal),
}

type RawTriple = (Node, Node, Node);

struct RawBind {
    base: Node,
    root: Node,
    gloss: Node,
    target: String,
    offset: usize,
}

struct Parser<'a> {
    rule: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    prefixes: BTreeMap<String, String>,
    anon: usize,
}

/// Parse a rule body. `prefixes` are the declarations in scope before any
/// `PREFIX` line (built-ins plus `sh:prefixes`).
pub fn parse_construct(
    rule: &str,
    text: &str,
    prefixes: &BTreeMap<String, String>,
) -> RuleResult<RuleBody> {
    let tokens = Lexer::new(rule, text).tokens()?;
    let mut parser = Parser {
        rule,
        tokens,
        pos: 0,
        end: text.len(),
        prefixes: prefixes.clone(),
        anon: 0,
    };
    parser.query()
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn error(&self, message: impl Into<String>) -> RuleError {
        RuleError::Syntax {
            rule: self.rule.to_string(),
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(word))
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn expect_word(&mut self, word: &str) -> RuleResult<()> {
        if self.is_word(word) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {word}")))
        }
    }

    fn expect_punct(&mut self, c: char) -> RuleResult<()> {
        if self.is_punct(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn query(&mut self) -> RuleResult<RuleBody> {
        while self.is_word("PREFIX") {
            self.pos += 1;
            let prefix = match self.next() {
                Some(Token::PName { prefix, local }) if local.is_empty() => prefix,
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected a prefix name like `ex:`"));
                }
            };
            let Some(Token::Iri(namespace)) = self.next() else {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected a namespace IRI"));
            };
            self.prefixes.insert(prefix, namespace);
        }

        self.expect_word("CONSTRUCT")?;
        self.expect_punct('{')?;
        let (template, _) = self.block(false)?;
        self.expect_punct('}')?;

        if self.is_word("WHERE") {
            self.pos += 1;
        }
        self.expect_punct('{')?;
        let (pattern, binds) = self.block(true)?;
        self.expect_punct('}')?;
        if self.peek().is_some() {
            return Err(self.error("unexpected input after WHERE block"));
        }

        self.assemble(template, pattern, binds)
    }

    /// Triples (and, in WHERE, BIND clauses) up to a closing `}`.
    fn block(&mut self, allow_bind: bool) -> RuleResult<(Vec<RawTriple>, Vec<RawBind>)> {
        let mut triples = Vec::new();
        let mut binds = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Punct('}')) => break,
                Some(Token::Punct('.')) => {
                    self.pos += 1;
                }
                _ if allow_bind && self.is_word("BIND") => binds.push(self.bind()?),
                _ => {
                    let subject = self.node(&mut triples)?;
                    let standalone_list = matches!(subject, Node::Anon(_)) && self.is_punct('.');
                    if !standalone_list {
                        self.predicate_objects(&subject, &mut triples)?;
                    }
                    match self.peek() {
                        Some(Token::Punct('.')) => self.pos += 1,
                        Some(Token::Punct('}')) | None => {}
                        _ if allow_bind && self.is_word("BIND") => {}
                        _ => return Err(self.error("expected '.' after triple")),
                    }
                }
            }
        }
        Ok((triples, binds))
    }

    fn predicate_objects(&mut self, subject: &Node, out: &mut Vec<RawTriple>) -> RuleResult<()> {
        loop {
            let verb = if matches!(self.peek(), Some(Token::Word(w)) if w == "a") {
                self.pos += 1;
                Node::Iri(vocab::RDF_TYPE.to_string())
            } else {
                self.node(out)?
            };
            loop {
                let object = self.node(out)?;
                out.push((subject.clone(), verb.clone(), object));
                if self.is_punct(',') {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            if !self.is_punct(';') {
                return Ok(());
            }
            while self.is_punct(';') {
                self.pos += 1;
            }
            if matches!(
                self.peek(),
                None | Some(Token::Punct('.' | '}' | ']'))
            ) {
                return Ok(());
            }
        }
    }

    fn node(&mut self, out: &mut Vec<RawTriple>) -> RuleResult<Node> {
        let offset_err = |p: &Self, what: &str| p.error(format!("expected {what}"));
        let Some(token) = self.next() else {
            return Err(offset_err(self, "a term"));
        };
        Ok(match token {
            Token::Var(name) => Node::Var(name),
            Token::Iri(iri) => Node::Iri(iri),
            Token::PName { prefix, local } => Node::Iri(self.expand(&prefix, &local)?),
            Token::Blank(label) => Node::Blank(label),
            Token::Str(value) => Node::Literal(self.literal_suffix(value)?),
            Token::Number { lexical, datatype } => {
                Node::Literal(Literal::typed(lexical, Iri::new(datatype)))
            }
            Token::Word(w) if w == "true" || w == "false" => Node::Literal(Literal::boolean(w == "true")),
            Token::Punct('[') => {
                let anon = Node::Anon(self.anon);
                self.anon += 1;
                if !self.is_punct(']') {
                    self.predicate_objects(&anon, out)?;
                }
                self.expect_punct(']')?;
                anon
            }
            other => {
                self.pos -= 1;
                return Err(offset_err(self, &format!("a term, found {other:?}")));
            }
        })
    }

    fn literal_suffix(&mut self, value: String) -> RuleResult<Literal> {
        match self.peek() {
            Some(Token::LangTag(_)) => {
                let Some(Token::LangTag(tag)) = self.next() else {
                    unreachable!("peeked a language tag");
                };
                Ok(Literal::lang(value, tag))
            }
            Some(Token::DoubleCaret) => {
                self.pos += 1;
                let datatype = match self.next() {
                    Some(Token::Iri(iri)) => iri,
                    Some(Token::PName { prefix, local }) => self.expand(&prefix, &local)?,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.error("expected a datatype IRI after ^^"));
                    }
                };
                Ok(Literal::typed(value, Iri::new(datatype)))
            }
            _ => Ok(Literal::simple(value)),
        }
    }

    fn bind(&mut self) -> RuleResult<RawBind> {
        let offset = self.offset();
        self.expect_word("BIND")?;
        self.expect_punct('(')?;
        if !self.is_word("MINT") {
            return Err(self.error("only MINT(...) can be bound"));
        }
        self.pos += 1;
        self.expect_punct('(')?;
        let mut scratch = Vec::new();
        let base = self.node(&mut scratch)?;
        self.expect_punct(',')?;
        let root = self.node(&mut scratch)?;
        self.expect_punct(',')?;
        let gloss = self.node(&mut scratch)?;
        self.expect_punct(')')?;
        if !scratch.is_empty() {
            return Err(self.error("MINT arguments cannot be property lists"));
        }
        self.expect_word("AS")?;
        let Some(Token::Var(target)) = self.next() else {
            self.pos = self.pos.saturating_sub(1);
            return Err(self.error("expected a variable after AS"));
        };
        self.expect_punct(')')?;
        Ok(RawBind {
            base,
            root,
            gloss,
            target,
            offset,
        })
    }

    fn expand(&self, prefix: &str, local: &str) -> RuleResult<String> {
        self.prefixes
            .get(prefix)
            .map(|ns| format!("{ns}{local}"))
            .ok_or_else(|| RuleError::UnknownPrefix {
                rule: self.rule.to_string(),
                prefix: prefix.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Assembly and static checks
    // -----------------------------------------------------------------------

    fn assemble(
        &self,
        template: Vec<RawTriple>,
        pattern: Vec<RawTriple>,
        binds: Vec<RawBind>,
    ) -> RuleResult<RuleBody> {
        let pattern = pattern
            .into_iter()
            .map(|(s, p, o)| {
                self.check_positions(&s, &p)?;
                Ok(TriplePattern::new(pattern_term(s), pattern_term(p), pattern_term(o)))
            })
            .collect::<RuleResult<Vec<_>>>()?;

        let mut bound: BTreeSet<String> = pattern
            .iter()
            .flat_map(|t| t.variables().map(str::to_string))
            .collect();
        bound.insert(FOCUS_VAR.to_string());

        let mut mint_binds = Vec::with_capacity(binds.len());
        for raw in binds {
            let base = match raw.base {
                Node::Iri(iri) => Iri::new(iri),
                _ => return Err(self.mint_error("the base must be an IRI")),
            };
            let root = self.mint_argument(raw.root, &bound)?;
            let gloss = self.mint_argument(raw.gloss, &bound)?;
            if !bound.insert(raw.target.clone()) {
                return Err(RuleError::Syntax {
                    rule: self.rule.to_string(),
                    offset: raw.offset,
                    message: format!("BIND target ?{} is already bound", raw.target),
                });
            }
            mint_binds.push(MintBind {
                base,
                root,
                gloss,
                target: raw.target,
            });
        }

        let template = template
            .into_iter()
            .map(|(s, p, o)| {
                self.check_positions(&s, &p)?;
                let triple = TemplateTriple {
                    subject: template_term(s),
                    predicate: template_term(p),
                    object: template_term(o),
                };
                for term in [&triple.subject, &triple.predicate, &triple.object] {
                    if let TemplateTerm::Var(name) = term {
                        if !bound.contains(name) {
                            return Err(RuleError::UnboundVariable {
                                rule: self.rule.to_string(),
                                variable: name.clone(),
                            });
                        }
                    }
                }
                Ok(triple)
            })
            .collect::<RuleResult<Vec<_>>>()?;

        Ok(RuleBody {
            pattern,
            binds: mint_binds,
            template,
        })
    }

    fn check_positions(&self, subject: &Node, predicate: &Node) -> RuleResult<()> {
        if let Node::Literal(lit) = subject {
            return Err(RuleError::InvalidTriple {
                rule: self.rule.to_string(),
                message: format!("literal {lit} in subject position"),
            });
        }
        match predicate {
            Node::Iri(_) | Node::Var(_) => Ok(()),
            other => Err(RuleError::InvalidTriple {
                rule: self.rule.to_string(),
                message: format!("{other:?} in predicate position"),
            }),
        }
    }

    fn mint_argument(&self, node: Node, bound: &BTreeSet<String>) -> RuleResult<PatternTerm> {
        match node {
            Node::Var(name) if bound.contains(&name) => Ok(PatternTerm::Var(name)),
            Node::Var(name) => Err(RuleError::UnboundVariable {
                rule: self.rule.to_string(),
                variable: name,
            }),
            Node::Iri(iri) => Ok(PatternTerm::Const(Term::iri(iri))),
            Node::Literal(lit) => Ok(PatternTerm::Const(Term::Literal(lit))),
            Node::Blank(_) | Node::Anon(_) => Err(self.mint_error("blank nodes cannot be key parts")),
        }
    }

    fn mint_error(&self, message: &str) -> RuleError {
        RuleError::InvalidMintKey {
            rule: self.rule.to_string(),
            message: message.to_string(),
        }
    }
}

/// Pattern blank nodes become variables no user variable can collide with.
fn pattern_term(node: Node) -> PatternTerm {
    match node {
        Node::Var(name) => PatternTerm::Var(name),
        Node::Iri(iri) => PatternTerm::Const(Term::iri(iri)),
        Node::Blank(label) => PatternTerm::Var(format!("~{label}")),
        Node::Anon(n) => PatternTerm::Var(format!("~anon{n}")),
        Node::Literal(lit) => PatternTerm::Const(Term::Literal(lit)),
    }
}

fn template_term(node: Node) -> TemplateTerm {
    match node {
        Node::Var(name) => TemplateTerm::Var(name),
        Node::Iri(iri) => TemplateTerm::Const(Term::iri(iri)),
        Node::Blank(label) => TemplateTerm::Fresh(label),
        Node::Anon(n) => TemplateTerm::Fresh(format!("~anon{n}")),
        Node::Literal(lit) => TemplateTerm::Const(Term::Literal(lit)),
    }
}

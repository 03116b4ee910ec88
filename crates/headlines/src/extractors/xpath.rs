// ABOUTME: Compiler and evaluator for the node-path query subset used by TreeQuery.
// ABOUTME: Supports /, // steps, name and * tests, attribute, contains() and positional predicates.

//! Node-path queries over a `scraper` document.
//!
//! Grammar:
//!
//! ```text
//! path      := sep step (sep step)*
//! sep       := "/" | "//"
//! step      := ( NAME | "*" ) predicate*
//! predicate := "[" ( "@" NAME [ ("=" | "!=") LITERAL ]
//!                  | "contains(" "@" NAME "," LITERAL ")"
//!                  | INTEGER ) "]"
//! ```
//!
//! Results are a node set: document order, no duplicates.

use std::collections::{HashMap, HashSet};

use ego_tree::NodeId;
use scraper::{ElementRef, Html};

/// A node-path expression that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset} in {expr:?}")]
pub struct PathSyntaxError {
    pub expr: String,
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttr(String),
    AttrEq(String, String),
    AttrNe(String, String),
    Contains(String, String),
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A compiled node-path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    expr: String,
    steps: Vec<Step>,
}

impl NodePath {
    pub fn compile(expr: &str) -> Result<Self, PathSyntaxError> {
        let steps = Lexer::new(expr).path()?;
        Ok(Self {
            expr: expr.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expr
    }

    /// Evaluate against a parsed document, returning matches in document order.
    pub fn select<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        let root = html.tree.root();
        let order: HashMap<NodeId, usize> = root
            .descendants()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();

        let mut context = vec![root];
        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            // Context is in document order, so an ancestor is expanded before
            // its descendants and every node is visited once per step.
            let mut covered = HashSet::new();
            for ctx in &context {
                let parents: Vec<_> = match step.axis {
                    Axis::Child => vec![*ctx],
                    Axis::Descendant if covered.contains(&ctx.id()) => continue,
                    Axis::Descendant => ctx.descendants().collect(),
                };
                if step.axis == Axis::Descendant {
                    covered.extend(parents.iter().map(|node| node.id()));
                }
                for parent in parents {
                    for el in step.apply(parent.children().filter_map(ElementRef::wrap)) {
                        if seen.insert(el.id()) {
                            next.push(*el);
                        }
                    }
                }
            }
            next.sort_by_key(|node| order.get(&node.id()).copied().unwrap_or(usize::MAX));
            context = next;
        }

        context.into_iter().filter_map(ElementRef::wrap).collect()
    }
}

impl Step {
    /// Apply the name test and then each predicate in turn to one parent's children.
    fn apply<'a>(&self, children: impl Iterator<Item = ElementRef<'a>>) -> Vec<ElementRef<'a>> {
        let mut matched: Vec<ElementRef<'a>> = children.filter(|el| self.test.matches(el)).collect();
        for predicate in &self.predicates {
            matched = match predicate {
                Predicate::Position(n) => matched.get(n - 1).copied().into_iter().collect(),
                other => matched.into_iter().filter(|el| other.matches(el)).collect(),
            };
        }
        matched
    }
}

impl NameTest {
    fn matches(&self, el: &ElementRef<'_>) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name(name) => el.value().name().eq_ignore_ascii_case(name),
        }
    }
}

impl Predicate {
    fn matches(&self, el: &ElementRef<'_>) -> bool {
        let value = el.value();
        match self {
            Predicate::HasAttr(attr) => value.attr(attr).is_some(),
            Predicate::AttrEq(attr, want) => value.attr(attr) == Some(want.as_str()),
            Predicate::AttrNe(attr, want) => value.attr(attr).is_some_and(|v| v != want),
            Predicate::Contains(attr, needle) => {
                value.attr(attr).is_some_and(|v| v.contains(needle.as_str()))
            }
            Predicate::Position(_) => true,
        }
    }
}

struct Lexer<'a> {
    expr: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(expr: &'a str) -> Self {
        Self { expr, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> PathSyntaxError {
        PathSyntaxError {
            expr: self.expr.to_string(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.expr[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), PathSyntaxError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}", token)))
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.expr.len() - trimmed.len();
    }

    fn path(mut self) -> Result<Vec<Step>, PathSyntaxError> {
        self.skip_ws();
        if self.rest().is_empty() {
            return Err(self.error("empty path"));
        }
        let mut steps = Vec::new();
        while !self.rest().is_empty() {
            let axis = if self.eat("//") {
                Axis::Descendant
            } else if self.eat("/") {
                Axis::Child
            } else {
                return Err(self.error("expected \"/\" or \"//\""));
            };
            steps.push(self.step(axis)?);
            self.skip_ws();
        }
        Ok(steps)
    }

    fn step(&mut self, axis: Axis) -> Result<Step, PathSyntaxError> {
        let test = if self.eat("*") {
            NameTest::Any
        } else {
            NameTest::Name(self.name()?.to_ascii_lowercase())
        };
        let mut predicates = Vec::new();
        while self.eat("[") {
            self.skip_ws();
            predicates.push(self.predicate()?);
            self.skip_ws();
            self.expect("]")?;
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate, PathSyntaxError> {
        if self.eat("@") {
            let attr = self.name()?.to_ascii_lowercase();
            self.skip_ws();
            if self.eat("!=") {
                self.skip_ws();
                return Ok(Predicate::AttrNe(attr, self.literal()?));
            }
            if self.eat("=") {
                self.skip_ws();
                return Ok(Predicate::AttrEq(attr, self.literal()?));
            }
            return Ok(Predicate::HasAttr(attr));
        }
        if self.eat("contains(") {
            self.skip_ws();
            self.expect("@")?;
            let attr = self.name()?.to_ascii_lowercase();
            self.skip_ws();
            self.expect(",")?;
            self.skip_ws();
            let needle = self.literal()?;
            self.skip_ws();
            self.expect(")")?;
            return Ok(Predicate::Contains(attr, needle));
        }
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let digits: String = self.rest().chars().take_while(char::is_ascii_digit).collect();
            self.pos += digits.len();
            return match digits.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Predicate::Position(n)),
                _ => Err(self.error("position must be a positive integer")),
            };
        }
        Err(self.error("unsupported predicate"))
    }

    fn name(&mut self) -> Result<&'a str, PathSyntaxError> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn literal(&mut self) -> Result<String, PathSyntaxError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        self.pos += 1;
        let rest = self.rest();
        let end = rest
            .find(quote)
            .ok_or_else(|| self.error("unterminated string"))?;
        self.pos += end + 1;
        Ok(rest[..end].to_string())
    }
}

use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use crate::element::Element;
use crate::mol::Mol;

use super::error::PatternError;
use super::query::{flatten_and, flatten_or, AtomExpr, BondExpr};

/// Parses the pattern language: bracket atoms built from `#n`, element
/// symbols, `*`, `D<n>` and the logical operators `! & , ;`; bare element
/// symbols; branches; ring-closure digits (`%nn` for two digits) and the
/// bonds `- = # $ ~`. Disconnected parts are separated with `.`.
pub fn parse_pattern(input: &str) -> Result<Mol<AtomExpr, BondExpr>, PatternError> {
    if input.trim().is_empty() {
        return Err(PatternError::EmptyInput);
    }
    Parser::new(input.trim()).parse()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, ch: char) -> Result<(), PatternError> {
        match self.peek() {
            Some(c) if c == ch => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(PatternError::UnexpectedChar { pos: self.pos, ch: c }),
            None => Err(PatternError::Invalid {
                pos: self.pos,
                msg: format!("expected '{ch}', got end of input"),
            }),
        }
    }

    fn parse_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos > start {
            let s: String = self.chars[start..self.pos].iter().collect();
            s.parse().ok()
        } else {
            None
        }
    }

    fn parse(&mut self) -> Result<Mol<AtomExpr, BondExpr>, PatternError> {
        let mut mol = Mol::new();
        let mut stack: Vec<(NodeIndex, Option<BondExpr>)> = Vec::new();
        let mut current: Option<NodeIndex> = None;
        let mut pending_bond: Option<BondExpr> = None;
        let mut open_rings: HashMap<u16, (NodeIndex, Option<BondExpr>)> = HashMap::new();

        while let Some(ch) = self.peek() {
            match ch {
                '(' => {
                    let cur = current.ok_or(PatternError::UnmatchedParen { pos: self.pos })?;
                    stack.push((cur, pending_bond.take()));
                    self.pos += 1;
                }
                ')' => {
                    let (prev, saved) = stack
                        .pop()
                        .ok_or(PatternError::UnmatchedParen { pos: self.pos })?;
                    current = Some(prev);
                    pending_bond = saved;
                    self.pos += 1;
                }
                '.' => {
                    current = None;
                    pending_bond = None;
                    self.pos += 1;
                }
                '-' | '=' | '#' | '$' | '~' => {
                    if pending_bond.is_some() {
                        return Err(PatternError::Invalid {
                            pos: self.pos,
                            msg: "consecutive bond expressions".into(),
                        });
                    }
                    pending_bond = Some(self.parse_bond()?);
                }
                '0'..='9' | '%' => {
                    let digit = self.parse_ring_closure()?;
                    let cur = current.ok_or_else(|| PatternError::Invalid {
                        pos: self.pos,
                        msg: "ring closure without preceding atom".into(),
                    })?;
                    if let Some((other, saved)) = open_rings.remove(&digit) {
                        let bond = pending_bond.take().or(saved).unwrap_or(BondExpr::Single);
                        mol.add_bond(cur, other, bond);
                    } else {
                        open_rings.insert(digit, (cur, pending_bond.take()));
                    }
                }
                _ => {
                    let atom = if ch == '[' {
                        self.parse_bracket_atom()?
                    } else {
                        self.parse_bare_atom()?
                    };
                    let idx = mol.add_atom(atom);
                    if let Some(prev) = current {
                        mol.add_bond(prev, idx, pending_bond.take().unwrap_or(BondExpr::Single));
                    }
                    current = Some(idx);
                }
            }
        }

        if !stack.is_empty() {
            return Err(PatternError::UnmatchedParen { pos: self.pos });
        }
        if let Some(&digit) = open_rings.keys().min() {
            return Err(PatternError::UnclosedRing { digit });
        }
        if pending_bond.is_some() {
            return Err(PatternError::Invalid {
                pos: self.pos,
                msg: "dangling bond".into(),
            });
        }
        Ok(mol)
    }

    fn parse_ring_closure(&mut self) -> Result<u16, PatternError> {
        let start = self.pos;
        if self.peek() == Some('%') {
            self.pos += 1;
            let d1 = self.peek().and_then(|c| c.to_digit(10));
            let d2 = self.chars.get(self.pos + 1).and_then(|c| c.to_digit(10));
            match (d1, d2) {
                (Some(d1), Some(d2)) => {
                    self.pos += 2;
                    Ok((d1 * 10 + d2) as u16)
                }
                _ => Err(PatternError::Invalid {
                    pos: start,
                    msg: "expected two digits after %".into(),
                }),
            }
        } else {
            let d = self
                .peek()
                .and_then(|c| c.to_digit(10))
                .ok_or(PatternError::Invalid {
                    pos: start,
                    msg: "expected ring-closure digit".into(),
                })?;
            self.pos += 1;
            Ok(d as u16)
        }
    }

    fn parse_bond(&mut self) -> Result<BondExpr, PatternError> {
        let pos = self.pos;
        let ch = self.peek().ok_or(PatternError::Invalid {
            pos,
            msg: "expected bond".into(),
        })?;
        self.pos += 1;
        match ch {
            '-' => Ok(BondExpr::Single),
            '=' => Ok(BondExpr::Double),
            '#' => Ok(BondExpr::Triple),
            '$' => Ok(BondExpr::Quadruple),
            '~' => Ok(BondExpr::Any),
            _ => Err(PatternError::UnexpectedChar { pos, ch }),
        }
    }

    fn parse_bare_atom(&mut self) -> Result<AtomExpr, PatternError> {
        if self.peek() == Some('*') {
            self.pos += 1;
            return Ok(AtomExpr::Any);
        }
        self.parse_element_symbol()
    }

    /// Two-letter symbols win over one-letter ones (`Cl` over `C`).
    fn parse_element_symbol(&mut self) -> Result<AtomExpr, PatternError> {
        let start = self.pos;
        let first = self.peek().ok_or(PatternError::Invalid {
            pos: start,
            msg: "expected atom".into(),
        })?;
        if !first.is_ascii_uppercase() {
            return Err(PatternError::UnexpectedChar { pos: start, ch: first });
        }
        if let Some(second) = self.chars.get(start + 1).filter(|c| c.is_ascii_lowercase()) {
            let symbol: String = [first, *second].iter().collect();
            if let Some(e) = Element::from_symbol(&symbol) {
                self.pos += 2;
                return Ok(AtomExpr::Element(e));
            }
        }
        match Element::from_symbol(&first.to_string()) {
            Some(e) => {
                self.pos += 1;
                Ok(AtomExpr::Element(e))
            }
            None => Err(PatternError::UnexpectedChar { pos: start, ch: first }),
        }
    }

    fn parse_bracket_atom(&mut self) -> Result<AtomExpr, PatternError> {
        let bracket_start = self.pos;
        self.expect('[')?;
        let expr = self.parse_low_and()?;
        if self.peek() != Some(']') {
            return Err(PatternError::UnclosedBracket { pos: bracket_start });
        }
        self.pos += 1;
        Ok(expr)
    }

    fn parse_low_and(&mut self) -> Result<AtomExpr, PatternError> {
        let mut parts = vec![self.parse_or()?];
        while self.peek() == Some(';') {
            self.pos += 1;
            parts.push(self.parse_or()?);
        }
        Ok(flatten_and(parts))
    }

    fn parse_or(&mut self) -> Result<AtomExpr, PatternError> {
        let mut parts = vec![self.parse_high_and()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            parts.push(self.parse_high_and()?);
        }
        Ok(flatten_or(parts))
    }

    fn parse_high_and(&mut self) -> Result<AtomExpr, PatternError> {
        let mut parts = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                ']' | ',' | ';' => break,
                '&' => self.pos += 1,
                _ => parts.push(self.parse_not()?),
            }
        }
        if parts.is_empty() {
            return Err(PatternError::Invalid {
                pos: self.pos,
                msg: "empty atom expression".into(),
            });
        }
        Ok(flatten_and(parts))
    }

    fn parse_not(&mut self) -> Result<AtomExpr, PatternError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            Ok(AtomExpr::Not(Box::new(self.parse_not()?)))
        } else {
            self.parse_primitive()
        }
    }

    fn parse_primitive(&mut self) -> Result<AtomExpr, PatternError> {
        let pos = self.pos;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(AtomExpr::Any)
            }
            Some('#') => {
                self.pos += 1;
                let num = self
                    .parse_number()
                    .ok_or(PatternError::InvalidAtomicNum { pos: self.pos })?;
                u8::try_from(num)
                    .ok()
                    .and_then(Element::from_atomic_num)
                    .map(AtomExpr::Element)
                    .ok_or(PatternError::InvalidAtomicNum { pos })
            }
            Some('D') => {
                self.pos += 1;
                let n = self.parse_number().unwrap_or(1);
                Ok(AtomExpr::Degree(n.min(u8::MAX as u32) as u8))
            }
            Some(c) if c.is_ascii_uppercase() => self.parse_element_symbol(),
            Some(ch) => Err(PatternError::UnexpectedChar { pos, ch }),
            None => Err(PatternError::Invalid {
                pos,
                msg: "expected atom primitive".into(),
            }),
        }
    }
}

/*!
march.rs - The March-test data model and pattern-string grammar.

Overview
========
`MarchTest` is an ordered sequence of `MarchElement`s, each sweeping every
address in a declared direction while applying a fixed operation sequence.
This module owns the wire-level pattern grammar (`a(W0,R0);d(R1,W0,R0)`)
independently of JSON catalogue loading, so it can be reused by the
synthesis drivers to print a `MarchTest` back out, and by tests to build
fixtures inline.
*/

use crate::error::AtpgError;
use crate::val::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrOrder {
    Up,
    Down,
    Any,
}

impl AddrOrder {
    pub fn flip(self) -> Self {
        match self {
            AddrOrder::Up => AddrOrder::Down,
            AddrOrder::Down => AddrOrder::Up,
            AddrOrder::Any => AddrOrder::Up,
        }
    }

    fn to_char(self) -> char {
        match self {
            AddrOrder::Up => 'a',
            AddrOrder::Down => 'd',
            AddrOrder::Any => 'b',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Write,
    Read,
    ComputeAnd,
}

/// A single March operation. `value` carries the Read/Write bit; `c_t`,
/// `c_m`, `c_b` carry the ComputeAnd operand polarities (top/middle/bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
    pub kind: OpKind,
    pub value: Val,
    pub c_t: Val,
    pub c_m: Val,
    pub c_b: Val,
}

impl Op {
    pub fn write(v: Val) -> Self {
        Op { kind: OpKind::Write, value: v, c_t: Val::X, c_m: Val::X, c_b: Val::X }
    }

    pub fn read(v: Val) -> Self {
        Op { kind: OpKind::Read, value: v, c_t: Val::X, c_m: Val::X, c_b: Val::X }
    }

    pub fn compute(t: Val, m: Val, b: Val) -> Self {
        Op { kind: OpKind::ComputeAnd, value: Val::X, c_t: t, c_m: m, c_b: b }
    }

    pub fn to_token(self) -> String {
        match self.kind {
            OpKind::Write => format!("W{}", bit_char(self.value)),
            OpKind::Read => format!("R{}", bit_char(self.value)),
            OpKind::ComputeAnd => {
                format!("C({})({})({})", bit_char(self.c_t), bit_char(self.c_m), bit_char(self.c_b))
            }
        }
    }
}

fn bit_char(v: Val) -> char {
    match v {
        Val::Zero => '0',
        Val::One => '1',
        Val::X => 'x',
    }
}

#[derive(Debug, Clone)]
pub struct MarchElement {
    pub order: AddrOrder,
    pub ops: Vec<Op>,
}

impl MarchElement {
    pub fn new(order: AddrOrder) -> Self {
        MarchElement { order, ops: Vec::new() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarchTest {
    pub name: String,
    pub elements: Vec<MarchElement>,
}

impl MarchTest {
    pub fn new(name: impl Into<String>) -> Self {
        MarchTest { name: name.into(), elements: Vec::new() }
    }

    pub fn to_pattern(&self) -> String {
        self.elements
            .iter()
            .map(|e| {
                let ops = e.ops.iter().map(|op| op.to_token()).collect::<Vec<_>>().join(",");
                format!("{}({})", e.order.to_char(), ops)
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Parse a pattern string such as `a(W0,R0);d(R1,W0,R0)` into a
    /// `MarchTest` (name is assigned separately by the caller).
    pub fn parse_pattern(path: &str, name: &str, pattern: &str) -> Result<Self, AtpgError> {
        let stripped: String = pattern.chars().filter(|c| !c.is_whitespace()).collect();
        let mut elements = Vec::new();
        for elem_tok in stripped.split(';') {
            if elem_tok.is_empty() {
                continue;
            }
            elements.push(parse_element(path, elem_tok)?);
        }
        Ok(MarchTest { name: name.to_string(), elements })
    }
}

fn parse_element(path: &str, tok: &str) -> Result<MarchElement, AtpgError> {
    let mut chars = tok.chars();
    let order = match chars.next() {
        Some('a') | Some('A') => AddrOrder::Up,
        Some('d') | Some('D') => AddrOrder::Down,
        Some('b') | Some('B') => AddrOrder::Any,
        _ => {
            return Err(AtpgError::syntax(
                path,
                format!("invalid or missing address order in element token '{tok}'"),
            ));
        }
    };
    let rest = chars.as_str();
    let body = rest
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| AtpgError::syntax(path, format!("element '{tok}' missing parentheses")))?;

    let mut ops = Vec::new();
    // Ops are comma-separated, but ComputeAnd tokens themselves contain
    // commas inside parentheses, so split on top-level commas only.
    for op_tok in split_top_level(body) {
        if op_tok.is_empty() {
            continue;
        }
        ops.push(parse_op_token(path, op_tok)?);
    }
    Ok(MarchElement { order, ops })
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

fn parse_op_token(path: &str, tok: &str) -> Result<Op, AtpgError> {
    let bytes: Vec<char> = tok.chars().collect();
    if bytes.is_empty() {
        return Err(AtpgError::syntax(path, "empty operation token".to_string()));
    }
    match bytes[0] {
        'R' | 'W' => {
            if bytes.len() != 2 || (bytes[1] != '0' && bytes[1] != '1') {
                return Err(AtpgError::syntax(path, format!("invalid op token '{tok}'")));
            }
            let v = if bytes[1] == '0' { Val::Zero } else { Val::One };
            Ok(if bytes[0] == 'R' { Op::read(v) } else { Op::write(v) })
        }
        'C' => {
            // C(x)(y)(z)
            let digits: Vec<char> = tok.chars().filter(|c| *c == '0' || *c == '1').collect();
            if digits.len() != 3 {
                return Err(AtpgError::syntax(path, format!("invalid compute op token '{tok}'")));
            }
            let bit = |c: char| if c == '0' { Val::Zero } else { Val::One };
            Ok(Op::compute(bit(digits[0]), bit(digits[1]), bit(digits[2])))
        }
        _ => Err(AtpgError::syntax(path, format!("unknown operation type in token '{tok}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_pattern() {
        let mt = MarchTest::parse_pattern("t", "mt0", "a(W0,R0)").unwrap();
        assert_eq!(mt.elements.len(), 1);
        assert_eq!(mt.elements[0].order, AddrOrder::Up);
        assert_eq!(mt.elements[0].ops.len(), 2);
    }

    #[test]
    fn parses_compute_ops_with_inner_commas() {
        let mt = MarchTest::parse_pattern("t", "mt0", "a(W0,R0);d(C(1)(1)(1),R1)").unwrap();
        assert_eq!(mt.elements.len(), 2);
        assert_eq!(mt.elements[1].ops[0].kind, OpKind::ComputeAnd);
    }

    #[test]
    fn round_trips_through_to_pattern() {
        let mt = MarchTest::parse_pattern("t", "mt0", "a(W0,R0);d(C(1)(0)(1),R1)").unwrap();
        let printed = mt.to_pattern();
        let reparsed = MarchTest::parse_pattern("t", "mt0", &printed).unwrap();
        assert_eq!(reparsed.elements.len(), mt.elements.len());
        for (a, b) in reparsed.elements.iter().zip(mt.elements.iter()) {
            assert_eq!(a.order, b.order);
            assert_eq!(a.ops, b.ops);
        }
    }

    #[test]
    fn rejects_missing_order() {
        assert!(MarchTest::parse_pattern("t", "mt0", "(W0,R0)").is_err());
    }

    #[test]
    fn empty_element_is_legal() {
        let mt = MarchTest::parse_pattern("t", "mt0", "a()").unwrap();
        assert_eq!(mt.elements.len(), 1);
        assert!(mt.elements[0].ops.is_empty());
    }
}

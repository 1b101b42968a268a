/*!
fault.rs - Fault catalogue domain types and the `<S / F / R>` primitive parser.

Overview
========
A `Fault` names a detection `category` and a `cell_scope`, and carries one or
more `FaultPrimitive`s, each a compact encoding of a sensitising pre-state /
operation sequence (`S`), a faulty effect (`F`), and a detection expectation
(`R`).

Primitive grammar (decided; see DESIGN.md for the ambiguity this resolves)
---------------------------------------------------------------------------
```text
primitive := '<' s_spec '/' f_bit '/' r_bit '>'
s_spec    := cell_spec                 -- single-cell fault: victim only
           | cell_spec ';' cell_spec   -- two-cell fault: aggressor ';' victim
cell_spec := bit bit op*               -- pre_D bit, Ci bit, then 0+ ops
bit       := '0' | '1' | '-'
op        := 'W0' | 'W1' | 'R0' | 'R1' | 'C(' bit ')(' bit ')(' bit ')'
```
Two segments (split on a top-level `;`) means aggressor-then-victim; one
segment means victim-only (no aggressor, matching `SingleCell` scope).
`F` and `R` are each a single `bit`. Whitespace is insignificant.
*/

use crate::error::AtpgError;
use crate::march::Op;
use crate::val::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    EitherReadOrCompute,
    MustRead,
    MustCompute,
}

impl Category {
    pub fn parse(path: &str, s: &str) -> Result<Self, AtpgError> {
        match s {
            "either_read_or_compute" => Ok(Category::EitherReadOrCompute),
            "must_read" => Ok(Category::MustRead),
            "must_compute" => Ok(Category::MustCompute),
            other => Err(AtpgError::semantic(path, format!("unknown category '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellScope {
    SingleCell,
    TwoCellSameRow,
    TwoCellRowAgnostic,
    TwoCellCrossRow,
}

impl CellScope {
    pub fn parse(path: &str, s: &str) -> Result<Self, AtpgError> {
        match s {
            "single cell" => Ok(CellScope::SingleCell),
            "two cell (row-agnostic)" => Ok(CellScope::TwoCellRowAgnostic),
            "two cell same row" => Ok(CellScope::TwoCellSameRow),
            "two cell cross row" => Ok(CellScope::TwoCellCrossRow),
            other => Err(AtpgError::semantic(path, format!("unknown cell_scope '{other}'"))),
        }
    }

    pub fn is_single(self) -> bool {
        matches!(self, CellScope::SingleCell)
    }
}

/// One cell's slice of a fault primitive's `S` segment: its pre-state and
/// the sensitising operation sequence applied to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSpec {
    pub pre_d: Val,
    pub ci: Val,
    pub ops: Vec<Op>,
}

impl CellSpec {
    /// The value D holds after `ops` run: the last `Write`'s value if any,
    /// else the initial `pre_d`.
    pub fn last_d(&self) -> Val {
        self.ops
            .iter()
            .rev()
            .find_map(|op| if op.kind == crate::march::OpKind::Write { Some(op.value) } else { None })
            .unwrap_or(self.pre_d)
    }

    /// The middle operand of the last `ComputeAnd` in `ops`, if any.
    pub fn last_compute_mid(&self) -> Option<Val> {
        self.ops.iter().rev().find_map(|op| {
            if op.kind == crate::march::OpKind::ComputeAnd { Some(op.c_m) } else { None }
        })
    }

    pub fn has_any_op(&self) -> bool {
        !self.ops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultPrimitive {
    pub raw: String,
    pub sa: Option<CellSpec>,
    pub sv: CellSpec,
    pub f_effect: Val,
    pub r_expect: Val,
}

#[derive(Debug, Clone)]
pub struct Fault {
    pub id: String,
    pub category: Category,
    pub cell_scope: CellScope,
    pub primitives: Vec<FaultPrimitive>,
}

fn split_top_level_semicolon(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ';' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

fn parse_bit(path: &str, c: char) -> Result<Val, AtpgError> {
    match c {
        '0' => Ok(Val::Zero),
        '1' => Ok(Val::One),
        '-' => Ok(Val::X),
        other => Err(AtpgError::syntax(path, format!("expected 0/1/- bit, found '{other}'"))),
    }
}

fn parse_cell_spec(path: &str, s: &str) -> Result<CellSpec, AtpgError> {
    let mut chars: Vec<char> = s.chars().collect();
    let pre_d = if chars.is_empty() { Val::X } else { parse_bit(path, chars.remove(0))? };
    let ci = if chars.is_empty() { Val::X } else { parse_bit(path, chars.remove(0))? };
    let rest: String = chars.into_iter().collect();
    let ops = parse_ops(path, &rest)?;
    Ok(CellSpec { pre_d, ci, ops })
}

fn parse_ops(path: &str, s: &str) -> Result<Vec<Op>, AtpgError> {
    let mut ops = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        match chars[i] {
            'W' => {
                let v = chars.get(i + 1).copied();
                let val = match v {
                    Some('0') => Val::Zero,
                    Some('1') => Val::One,
                    _ => return Err(AtpgError::syntax(path, format!("invalid W op in '{s}'"))),
                };
                ops.push(Op::write(val));
                i += 2;
            }
            'R' => {
                let v = chars.get(i + 1).copied();
                let val = match v {
                    Some('0') => Val::Zero,
                    Some('1') => Val::One,
                    _ => return Err(AtpgError::syntax(path, format!("invalid R op in '{s}'"))),
                };
                ops.push(Op::read(val));
                i += 2;
            }
            'C' => {
                // C(x)(y)(z)
                let mut bits = Vec::new();
                let mut j = i + 1;
                while bits.len() < 3 && j < chars.len() {
                    if chars[j] == '(' {
                        if j + 2 >= chars.len() || chars[j + 2] != ')' {
                            return Err(AtpgError::syntax(path, format!("invalid C op in '{s}'")));
                        }
                        bits.push(chars[j + 1]);
                        j += 3;
                    } else {
                        j += 1;
                    }
                }
                if bits.len() != 3 {
                    return Err(AtpgError::syntax(path, format!("invalid C op in '{s}'")));
                }
                let bit = |c: char| -> Result<Val, AtpgError> {
                    match c {
                        '0' => Ok(Val::Zero),
                        '1' => Ok(Val::One),
                        _ => Err(AtpgError::syntax(path, format!("invalid C operand in '{s}'"))),
                    }
                };
                ops.push(Op::compute(bit(bits[0])?, bit(bits[1])?, bit(bits[2])?));
                i = j;
            }
            other => {
                return Err(AtpgError::syntax(path, format!("unexpected char '{other}' in ops '{s}'")));
            }
        }
    }
    Ok(ops)
}

pub fn parse_primitive(path: &str, raw: &str) -> Result<FaultPrimitive, AtpgError> {
    let trimmed: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let inner = trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| AtpgError::syntax(path, format!("primitive '{raw}' missing angle brackets")))?;

    let segs = split_top_level(inner, '/');
    if segs.len() != 3 {
        return Err(AtpgError::syntax(path, format!("primitive '{raw}' must have exactly 3 '/'-segments")));
    }
    let (s_part, f_part, r_part) = (segs[0], segs[1], segs[2]);

    let s_segs = split_top_level_semicolon(s_part);
    let (sa, sv) = match s_segs.as_slice() {
        [sv_only] => (None, parse_cell_spec(path, sv_only)?),
        [sa_s, sv_s] => (Some(parse_cell_spec(path, sa_s)?), parse_cell_spec(path, sv_s)?),
        _ => {
            return Err(AtpgError::syntax(path, format!("primitive '{raw}' has too many ';'-segments")));
        }
    };

    if f_part.chars().count() != 1 || r_part.chars().count() != 1 {
        return Err(AtpgError::syntax(path, format!("F/R fields in '{raw}' must each be a single bit")));
    }
    let f_effect = parse_bit(path, f_part.chars().next().unwrap())?;
    let r_expect = parse_bit(path, r_part.chars().next().unwrap())?;

    Ok(FaultPrimitive { raw: raw.to_string(), sa, sv, f_effect, r_expect })
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_cell_stuck_at_zero() {
        let fp = parse_primitive("t", "<0-/1/->").unwrap();
        assert!(fp.sa.is_none());
        assert_eq!(fp.sv.pre_d, Val::Zero);
        assert_eq!(fp.sv.ci, Val::X);
        assert!(fp.sv.ops.is_empty());
        assert_eq!(fp.f_effect, Val::One);
        assert_eq!(fp.r_expect, Val::X);
        assert_eq!(fp.sv.last_d(), Val::Zero);
    }

    #[test]
    fn parses_two_cell_with_sensitising_ops() {
        let fp = parse_primitive("t", "<0-W1;1-/0/->").unwrap();
        let sa = fp.sa.unwrap();
        assert_eq!(sa.pre_d, Val::Zero);
        assert_eq!(sa.ops.len(), 1);
        assert_eq!(fp.sv.pre_d, Val::One);
    }

    #[test]
    fn parses_read_sensitising_op() {
        let fp = parse_primitive("t", "<1-R1/0/1>").unwrap();
        assert!(fp.sa.is_none());
        assert_eq!(fp.sv.pre_d, Val::One);
        assert_eq!(fp.sv.ops.len(), 1);
        assert_eq!(fp.sv.ops[0].kind, crate::march::OpKind::Read);
        assert_eq!(fp.sv.ops[0].value, Val::One);
    }

    #[test]
    fn parses_compute_ops() {
        let fp = parse_primitive("t", "<01C(1)(0)(1);--/-/1>").unwrap();
        let sa = fp.sa.unwrap();
        assert_eq!(sa.pre_d, Val::Zero);
        assert_eq!(sa.ci, Val::One);
        assert_eq!(sa.ops.len(), 1);
        assert_eq!(sa.last_compute_mid(), Some(Val::Zero));
    }

    #[test]
    fn rejects_missing_brackets() {
        assert!(parse_primitive("t", "0-/1/-").is_err());
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(parse_primitive("t", "<0-/1>").is_err());
    }

    #[test]
    fn category_and_scope_parse_known_strings() {
        assert_eq!(Category::parse("t", "must_read").unwrap(), Category::MustRead);
        assert_eq!(CellScope::parse("t", "two cell cross row").unwrap(), CellScope::TwoCellCrossRow);
        assert!(Category::parse("t", "bogus").is_err());
    }
}

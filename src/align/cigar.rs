/// CIGAR operations of an aligned record
use crate::error::Error;
use noodles::sam::alignment::record::cigar::op::Kind;
use std::fmt;

/// CIGAR operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    /// M: match/mismatch (default mode)
    Match(u32),
    /// =: exact match (optional)
    Equal(u32),
    /// X: mismatch (optional)
    Diff(u32),
    /// I: insertion to reference
    Ins(u32),
    /// D: deletion from reference
    Del(u32),
    /// N: splice junction (skipped reference region)
    RefSkip(u32),
    /// S: soft clip (clipped sequence present in read)
    SoftClip(u32),
    /// H: hard clip (clipped sequence not present)
    HardClip(u32),
    /// P: padding (silent deletion from padded reference)
    Pad(u32),
}

impl CigarOp {
    /// Build an operation from its SAM character code
    pub fn from_code(code: char, len: u32) -> Result<Self, Error> {
        match code {
            'M' => Ok(CigarOp::Match(len)),
            '=' => Ok(CigarOp::Equal(len)),
            'X' => Ok(CigarOp::Diff(len)),
            'I' => Ok(CigarOp::Ins(len)),
            'D' => Ok(CigarOp::Del(len)),
            'N' => Ok(CigarOp::RefSkip(len)),
            'S' => Ok(CigarOp::SoftClip(len)),
            'H' => Ok(CigarOp::HardClip(len)),
            'P' => Ok(CigarOp::Pad(len)),
            other => Err(Error::Alignment(format!(
                "unknown CIGAR operation '{other}'"
            ))),
        }
    }

    /// Build an operation from a decoded BAM operation kind
    pub fn from_kind(kind: Kind, len: usize) -> Self {
        let len = len as u32;
        match kind {
            Kind::Match => CigarOp::Match(len),
            Kind::SequenceMatch => CigarOp::Equal(len),
            Kind::SequenceMismatch => CigarOp::Diff(len),
            Kind::Insertion => CigarOp::Ins(len),
            Kind::Deletion => CigarOp::Del(len),
            Kind::Skip => CigarOp::RefSkip(len),
            Kind::SoftClip => CigarOp::SoftClip(len),
            Kind::HardClip => CigarOp::HardClip(len),
            Kind::Pad => CigarOp::Pad(len),
        }
    }

    /// Get the operation character
    pub fn op_char(&self) -> char {
        match self {
            CigarOp::Match(_) => 'M',
            CigarOp::Equal(_) => '=',
            CigarOp::Diff(_) => 'X',
            CigarOp::Ins(_) => 'I',
            CigarOp::Del(_) => 'D',
            CigarOp::RefSkip(_) => 'N',
            CigarOp::SoftClip(_) => 'S',
            CigarOp::HardClip(_) => 'H',
            CigarOp::Pad(_) => 'P',
        }
    }

    /// Get the operation length
    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Equal(n)
            | CigarOp::Diff(n)
            | CigarOp::Ins(n)
            | CigarOp::Del(n)
            | CigarOp::RefSkip(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n)
            | CigarOp::Pad(n) => *n,
        }
    }

    /// Check if operation places read bases on reference bases (M, =, X)
    pub fn is_aligned(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_) | CigarOp::Equal(_) | CigarOp::Diff(_)
        )
    }

    /// Check if operation consumes reference bases
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_)
                | CigarOp::Equal(_)
                | CigarOp::Diff(_)
                | CigarOp::Del(_)
                | CigarOp::RefSkip(_)
        )
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len(), self.op_char())
    }
}

/// Parse a SAM CIGAR string such as `50M1000N50M`
///
/// `*` yields an empty operation list.
pub fn parse_cigar(s: &str) -> Result<Vec<CigarOp>, Error> {
    if s == "*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;

    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            let current = len.unwrap_or(0);
            len = Some(
                current
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(d))
                    .ok_or_else(|| {
                        Error::Alignment(format!("CIGAR length overflow in '{s}'"))
                    })?,
            );
        } else {
            let n = len.take().ok_or_else(|| {
                Error::Alignment(format!("CIGAR operation '{c}' without length in '{s}'"))
            })?;
            ops.push(CigarOp::from_code(c, n)?);
        }
    }

    if len.is_some() {
        return Err(Error::Alignment(format!(
            "CIGAR '{s}' ends with a dangling length"
        )));
    }

    Ok(ops)
}

/// Format a CIGAR operation list
pub fn cigar_string(ops: &[CigarOp]) -> String {
    if ops.is_empty() {
        return "*".to_string();
    }
    ops.iter().map(|op| op.to_string()).collect()
}

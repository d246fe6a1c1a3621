// Literal and call-site tie-break tables.

use crate::ast::Literal;
use crate::rules::Rule;

use super::Specializer;

/// Integral constants: `src + 1`, or the `1 -> 0` reset. Byte and short
/// wrap from their maximum to their minimum; int and long do not.
/// Floating constants: `src + 1`, or any value reset to `1.0`.
fn is_inline_constant(src: &Literal, dst: &Literal) -> bool {
    match (src, dst) {
        (Literal::Byte(s), Literal::Byte(d)) => *d == s.wrapping_add(1) || (*s == 1 && *d == 0),
        (Literal::Short(s), Literal::Short(d)) => *d == s.wrapping_add(1) || (*s == 1 && *d == 0),
        (Literal::Int(s), Literal::Int(d)) => s.checked_add(1) == Some(*d) || (*s == 1 && *d == 0),
        (Literal::Long(s), Literal::Long(d)) => s.checked_add(1) == Some(*d) || (*s == 1 && *d == 0),
        (Literal::Float(s), Literal::Float(d)) => s != d && (*d == s + 1.0 || *d == 1.0),
        (Literal::Double(s), Literal::Double(d)) => s != d && (*d == s + 1.0 || *d == 1.0),
        _ => false,
    }
}

/// A numeric constant replaced by a constant of the same type per the
/// inline-constant table
pub struct InlineConstant;

impl Specializer for InlineConstant {
    fn name(&self) -> &'static str {
        "inline-constant"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::LiteralReplaced { src, dst: Some(dst) } if is_inline_constant(src, dst) => Some(Rule::InlineConstant),
            _ => None,
        }
    }
}

/// A numeric constant replaced by something that is no longer a literal
pub struct InvertNegatives;

impl Specializer for InvertNegatives {
    fn name(&self) -> &'static str {
        "invert-negatives"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::LiteralReplaced { src, dst: None } if src.is_numeric() => Some(Rule::InvertNegatives),
            _ => None,
        }
    }
}

/// A call replaced by its receiver (argument index 0)
pub struct NakedReceiver;

impl Specializer for NakedReceiver {
    fn name(&self) -> &'static str {
        "naked-receiver"
    }

    fn build(&self, base: &Rule) -> Option<Rule> {
        match base {
            Rule::ArgumentPropagated { index: 0 } => Some(Rule::NakedReceiver),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replaced(src: Literal, dst: Literal) -> Rule {
        Rule::LiteralReplaced { src, dst: Some(dst) }
    }

    #[test]
    fn test_inline_constant_integers() {
        assert!(InlineConstant.build(&replaced(Literal::Int(1), Literal::Int(0))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Int(5), Literal::Int(6))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Int(5), Literal::Int(5))).is_none());
        assert!(InlineConstant.build(&replaced(Literal::Long(41), Literal::Long(42))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Long(5), Literal::Long(0))).is_none());
    }

    #[test]
    fn test_inline_constant_wraps_only_narrow_types() {
        assert!(InlineConstant.build(&replaced(Literal::Byte(i8::MAX), Literal::Byte(i8::MIN))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Short(i16::MAX), Literal::Short(i16::MIN))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Int(i32::MAX), Literal::Int(i32::MIN))).is_none());
        assert!(InlineConstant.build(&replaced(Literal::Long(i64::MAX), Literal::Long(i64::MIN))).is_none());
    }

    #[test]
    fn test_inline_constant_doubles() {
        assert!(InlineConstant.build(&replaced(Literal::Double(1.0), Literal::Double(2.0))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Double(5.0), Literal::Double(1.0))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Double(5.0), Literal::Double(2.0))).is_none());
        assert!(InlineConstant.build(&replaced(Literal::Float(0.0), Literal::Float(1.0))).is_some());
        assert!(InlineConstant.build(&replaced(Literal::Float(1.0), Literal::Float(1.0))).is_none());
    }

    #[test]
    fn test_inline_constant_requires_same_type() {
        assert!(InlineConstant.build(&replaced(Literal::Int(1), Literal::Long(0))).is_none());
        assert!(InlineConstant.build(&replaced(Literal::Float(1.0), Literal::Double(2.0))).is_none());
    }

    #[test]
    fn test_invert_negatives() {
        for src in [
            Literal::Byte(3),
            Literal::Short(3),
            Literal::Int(3),
            Literal::Long(3),
            Literal::Float(3.0),
            Literal::Double(3.0),
        ] {
            assert!(InvertNegatives.build(&Rule::LiteralReplaced { src, dst: None }).is_some());
        }
        let boolean = Rule::LiteralReplaced {
            src: Literal::Boolean(true),
            dst: None,
        };
        assert!(InvertNegatives.build(&boolean).is_none());
        assert!(InvertNegatives.build(&replaced(Literal::Int(3), Literal::Int(4))).is_none());
    }

    #[test]
    fn test_naked_receiver() {
        assert_eq!(NakedReceiver.build(&Rule::ArgumentPropagated { index: 0 }), Some(Rule::NakedReceiver));
        assert!(NakedReceiver.build(&Rule::ArgumentPropagated { index: 1 }).is_none());
        assert!(NakedReceiver.build(&Rule::ArgumentPropagated { index: 3 }).is_none());
    }
}

//! Evaluates an `Exp` to a lattice `Value` given a fact mapping variables
//! to their current values. This is the transfer function's core: every
//! non-constant operand taints the result to `NAC`, any `UNDEF` operand
//! keeps the result `UNDEF` (we haven't seen enough of the program yet to
//! know), and a statically-detectable division or remainder by a known
//! zero divisor degrades to `NAC` rather than panicking the analysis.

use crate::ir::{BinOp, Exp, Method, UnOp};
use crate::lattice::fact::CPFact;
use crate::lattice::value::Value;

pub fn evaluate(exp: &Exp, fact: &CPFact, method: &Method) -> Value {
    match exp {
        Exp::Var(v) => {
            if method.var(*v).can_hold_int() {
                fact.get(*v)
            } else {
                Value::Nac
            }
        }
        Exp::IntConst(c) => Value::Const(*c),
        Exp::Binary(op, l, r) => evaluate_binary(*op, fact.get(*l), fact.get(*r)),
        Exp::Unary(op, v) => evaluate_unary(*op, fact.get(*v)),
        // Everything else (allocation, field/array access, casts, calls)
        // is outside the intra-procedural lattice's domain: treat as NAC
        // unless wired in by the inter-procedural solver's heap model.
        _ => Value::Nac,
    }
}

fn evaluate_binary(op: BinOp, l: Value, r: Value) -> Value {
    // Div/rem by a known-zero divisor is unreachable in any concrete run,
    // so it contributes nothing to the meet, regardless of the other
    // operand — not even NAC.
    if matches!(op, BinOp::Div | BinOp::Rem) && r == Value::Const(0) {
        return Value::Undef;
    }
    match (l, r) {
        (Value::Nac, _) | (_, Value::Nac) => Value::Nac,
        (Value::Undef, _) | (_, Value::Undef) => Value::Undef,
        (Value::Const(a), Value::Const(b)) => apply_binop(op, a, b),
    }
}

fn apply_binop(op: BinOp, a: i32, b: i32) -> Value {
    match op {
        BinOp::Add => Value::Const(a.wrapping_add(b)),
        BinOp::Sub => Value::Const(a.wrapping_sub(b)),
        BinOp::Mul => Value::Const(a.wrapping_mul(b)),
        // `b == 0` is already handled above for both operators.
        BinOp::Div => Value::Const(a.wrapping_div(b)),
        BinOp::Rem => Value::Const(a.wrapping_rem(b)),
        BinOp::And => Value::Const(a & b),
        BinOp::Or => Value::Const(a | b),
        BinOp::Xor => Value::Const(a ^ b),
        BinOp::Shl => Value::Const(a.wrapping_shl(b as u32)),
        // Arithmetic (sign-extending) right shift.
        BinOp::Shr => Value::Const(a.wrapping_shr(b as u32)),
        // Logical (zero-extending) right shift: shift the bit pattern as
        // unsigned so the sign bit doesn't propagate.
        BinOp::Ushr => Value::Const((a as u32).wrapping_shr(b as u32) as i32),
        BinOp::Eq => Value::Const((a == b) as i32),
        BinOp::Ne => Value::Const((a != b) as i32),
        BinOp::Lt => Value::Const((a < b) as i32),
        BinOp::Le => Value::Const((a <= b) as i32),
        BinOp::Gt => Value::Const((a > b) as i32),
        BinOp::Ge => Value::Const((a >= b) as i32),
    }
}

fn evaluate_unary(op: UnOp, v: Value) -> Value {
    match v {
        Value::Undef => Value::Undef,
        Value::Nac => Value::Nac,
        Value::Const(a) => match op {
            UnOp::Neg => Value::Const(a.wrapping_neg()),
            UnOp::Not => Value::Const(!a),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Type;

    fn int_method() -> Method {
        Method {
            id: crate::ir::MethodId::from_u32(0),
            declaring_class: crate::ir::ClassId::from_u32(0),
            name: "m".into(),
            subsignature: "m()".into(),
            is_static: true,
            is_abstract: false,
            vars: vec![
                crate::ir::Var { id: crate::ir::VarId::from_u32(0), name: "a".into(), ty: Type::Int },
                crate::ir::Var { id: crate::ir::VarId::from_u32(1), name: "b".into(), ty: Type::Int },
            ],
            params: vec![],
            this_var: None,
            return_type: Type::Int,
            stmts: vec![],
        }
    }

    #[test]
    fn undef_operand_keeps_result_undef() {
        let m = int_method();
        let fact = CPFact::new();
        let a = crate::ir::VarId::from_u32(0);
        let b = crate::ir::VarId::from_u32(1);
        let exp = Exp::Binary(BinOp::Add, a, b);
        assert_eq!(evaluate(&exp, &fact, &m), Value::Undef);
    }

    #[test]
    fn division_by_known_zero_is_undef_not_a_panic() {
        let m = int_method();
        let mut fact = CPFact::new();
        let a = crate::ir::VarId::from_u32(0);
        let b = crate::ir::VarId::from_u32(1);
        fact.update(a, Value::Const(10));
        fact.update(b, Value::Const(0));
        let exp = Exp::Binary(BinOp::Div, a, b);
        assert_eq!(evaluate(&exp, &fact, &m), Value::Undef);
    }

    #[test]
    fn division_by_known_zero_is_undef_even_with_nac_dividend() {
        let m = int_method();
        let mut fact = CPFact::new();
        let a = crate::ir::VarId::from_u32(0);
        let b = crate::ir::VarId::from_u32(1);
        fact.update(a, Value::Nac);
        fact.update(b, Value::Const(0));
        let exp = Exp::Binary(BinOp::Rem, a, b);
        assert_eq!(evaluate(&exp, &fact, &m), Value::Undef);
    }

    #[test]
    fn logical_shift_right_does_not_sign_extend() {
        let m = int_method();
        let mut fact = CPFact::new();
        let a = crate::ir::VarId::from_u32(0);
        let b = crate::ir::VarId::from_u32(1);
        fact.update(a, Value::Const(-8));
        fact.update(b, Value::Const(1));
        let arithmetic = evaluate(&Exp::Binary(BinOp::Shr, a, b), &fact, &m);
        let logical = evaluate(&Exp::Binary(BinOp::Ushr, a, b), &fact, &m);
        assert_eq!(arithmetic, Value::Const(-4));
        assert_eq!(logical, Value::Const(0x7FFF_FFFC));
        assert_ne!(arithmetic, logical);
    }

    #[test]
    fn constant_folding() {
        let m = int_method();
        let mut fact = CPFact::new();
        let a = crate::ir::VarId::from_u32(0);
        let b = crate::ir::VarId::from_u32(1);
        fact.update(a, Value::Const(3));
        fact.update(b, Value::Const(4));
        let exp = Exp::Binary(BinOp::Mul, a, b);
        assert_eq!(evaluate(&exp, &fact, &m), Value::Const(12));
    }
}

use super::expr::{ExprError, ExprOp, ExprProgram, MAX_STACK, Xorshift32, derive_seed, op};

fn push_const(out: &mut Vec<u8>, v: f32) {
    out.push(op::PUSH_CONST);
    out.extend_from_slice(&v.to_le_bytes());
}

#[test]
fn index_times_two_plus_one() {
    let mut bytes = vec![op::PUSH_INDEX];
    push_const(&mut bytes, 2.0);
    bytes.push(op::MUL);
    push_const(&mut bytes, 1.0);
    bytes.push(op::ADD);

    let program = ExprProgram::parse(&bytes, MAX_STACK).unwrap();
    assert_eq!(program.eval(0, 4), 1.0);
    assert_eq!(program.eval(3, 4), 7.0);
    assert_eq!(program.max_depth(), 2);
    assert_eq!(program.to_bytes(), bytes);
}

#[test]
fn normalized_index() {
    let bytes = [op::PUSH_INDEX, op::PUSH_COUNT, op::DIV];
    let program = ExprProgram::parse(&bytes, MAX_STACK).unwrap();
    assert_eq!(program.eval(2, 8), 0.25);
}

#[test]
fn fract_of_negative() {
    let mut bytes = Vec::new();
    push_const(&mut bytes, -1.25);
    bytes.push(op::FRACT);
    let program = ExprProgram::parse(&bytes, MAX_STACK).unwrap();
    assert_eq!(program.eval(0, 1), 0.75);
}

#[test]
fn underflow_rejected() {
    let bytes = [op::PUSH_INDEX, op::ADD];
    assert_eq!(
        ExprProgram::parse(&bytes, MAX_STACK),
        Err(ExprError::StackUnderflow { offset: 1 })
    );
}

#[test]
fn overflow_rejected() {
    let bytes = vec![op::PUSH_INDEX; 3];
    assert_eq!(
        ExprProgram::parse(&bytes, 2),
        Err(ExprError::StackOverflow {
            offset: 2,
            limit: 2
        })
    );
}

#[test]
fn leftover_values_rejected() {
    let bytes = [op::PUSH_INDEX, op::PUSH_COUNT];
    assert_eq!(
        ExprProgram::parse(&bytes, MAX_STACK),
        Err(ExprError::Unbalanced { depth: 2 })
    );
    assert_eq!(
        ExprProgram::parse(&[], MAX_STACK),
        Err(ExprError::Unbalanced { depth: 0 })
    );
}

#[test]
fn unknown_op_and_truncated_const() {
    assert_eq!(
        ExprProgram::parse(&[op::PUSH_INDEX, 0x7F], MAX_STACK),
        Err(ExprError::UnknownOp {
            offset: 1,
            byte: 0x7F
        })
    );
    assert_eq!(
        ExprProgram::parse(&[op::PUSH_CONST, 0, 0], MAX_STACK),
        Err(ExprError::UnexpectedEof { offset: 3 })
    );
}

#[test]
fn parsed_ops() {
    let program = ExprProgram::parse(&[op::PUSH_COUNT, op::NEG], MAX_STACK).unwrap();
    assert_eq!(program.ops().len(), 2);
    assert_eq!(program.ops()[0], ExprOp::PushCount);
}

#[test]
fn seed_is_deterministic_and_nonzero() {
    let a = derive_seed("particles", 0, 1);
    assert_eq!(a, derive_seed("particles", 0, 1));
    assert_ne!(a, derive_seed("particles", 1, 0));
    assert_ne!(a, 0);
}

#[test]
fn xorshift_sequence_is_stable() {
    let mut rng = Xorshift32::new(1);
    assert_eq!(rng.next_u32(), 270_369);
    assert_eq!(rng.next_u32(), 67_634_689);

    let mut zero = Xorshift32::new(0);
    assert_ne!(zero.next_u32(), 0);

    let mut unit = Xorshift32::new(42);
    for _ in 0..100 {
        let u = unit.next_unit();
        assert!((0.0..1.0).contains(&u));
    }
}

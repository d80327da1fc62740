//! Shape compiler unit tests: expressions, constants and indexing.

use super::{closure, closure_with, compile, glsl};
use crate::dialect::Target;
use crate::op::{BinaryOp, Op, OpKind, Pattern, UnaryOp};
use crate::sc::{ErrorKind, Scalar, ScCompiler, Ty};
use crate::value::{Module, Value};

#[test]
fn test_constant_index_is_direct_component_access() {
    let body = Op::index(Op::local(0), Op::num(2.0));
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::num_vec(4)], Ty::Num, &f).unwrap();
    assert_eq!(
        out,
        "float f(vec4 r0)\n{\n  /* constants */\n  /* body */\n  float r1 = r0.z;\n  return r1;\n}\n"
    );
}

#[test]
fn test_constant_index_in_each_dialect() {
    let body = Op::index(Op::local(0), Op::num(2.0));
    let f = closure(1, body, Module::new());
    let cl = compile(Target::OpenCl, &[Ty::num_vec(4)], Ty::Num, &f).unwrap();
    assert!(cl.starts_with("float f(float4 r0)\n"));
    assert!(cl.contains("float r1 = r0.z;"));
    let cpp = compile(Target::Cpp, &[Ty::num_vec(4)], Ty::Num, &f).unwrap();
    assert!(cpp.starts_with("extern \"C\" void f(const vec4* param0, float* result)\n"));
    assert!(cpp.contains("  vec4 r0 = *param0;\n"));
    assert!(cpp.contains("  *result = r1;\n"));
}

#[test]
fn test_if_else_selects_between_vector_constants() {
    let cond = Op::binary(
        BinaryOp::Gt,
        Op::index(Op::local(0), Op::num(0.0)),
        Op::num(0.0),
    );
    let body = Op::if_else(
        cond,
        Op::constant(Value::nums(&[1.0, 0.0, 0.0])),
        Op::constant(Value::nums(&[0.0, 1.0, 0.0])),
    );
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::num_vec(3)], Ty::num_vec(3), &f).unwrap();
    assert_eq!(
        out,
        "vec3 f(vec3 r0)\n\
         {\n\
         \x20 /* constants */\n\
         \x20 float r2 = 0.0;\n\
         \x20 vec3 r4 = vec3(1.0,0.0,0.0);\n\
         \x20 vec3 r5 = vec3(0.0,1.0,0.0);\n\
         \x20 /* body */\n\
         \x20 float r1 = r0.x;\n\
         \x20 bool r3 = r1>r2;\n\
         \x20 vec3 r6 = (r3 ? r4 : r5);\n\
         \x20 return r6;\n\
         }\n"
    );
}

#[test]
fn test_reactive_expression_compiled_once() {
    let u = Value::uniform("time", "u_time", Ty::Num, Value::Num(0.0));
    let expr = Op::binary(BinaryOp::Add, Op::constant(u), Op::num(1.0));
    let reactive = Value::reactive(Ty::Num, expr);
    let mut module = Module::new();
    module.define("t", reactive);
    let body = Op::list(vec![Op::nonlocal(0), Op::nonlocal(0)]);
    let f = closure(1, body, module);
    let out = glsl(&[Ty::Num], Ty::num_vec(2), &f).unwrap();
    assert_eq!(
        out,
        "vec2 f(float r0)\n\
         {\n\
         \x20 /* constants */\n\
         \x20 float r1 = u_time;\n\
         \x20 float r2 = 1.0;\n\
         \x20 float r3 = r1+r2;\n\
         \x20 vec2 r4 = vec2(r3,r3);\n\
         \x20 /* body */\n\
         \x20 return r4;\n\
         }\n"
    );
    assert_eq!(out.matches("r1+r2").count(), 1);
}

#[test]
fn test_pure_subexpressions_shared() {
    let mut module = Module::new();
    module.define("k", Value::Num(2.0));
    let square = || Op::binary(BinaryOp::Mul, Op::nonlocal(0), Op::nonlocal(0));
    let body = Op::binary(
        BinaryOp::Add,
        Op::local(0),
        Op::binary(BinaryOp::Add, square(), square()),
    );
    let f = closure(1, body, module);
    let out = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert_eq!(out.matches("= 2.0;").count(), 1);
    assert_eq!(out.matches("r1*r1").count(), 1);
    assert!(out.contains("float r3 = r2+r2;"));
    assert!(out.contains("float r4 = r0+r3;"));
}

#[test]
fn test_nonlocals_of_different_closures_are_distinct() {
    let scale = |k: f64| {
        let mut m = Module::new();
        m.define("k", Value::Num(k));
        closure(1, Op::binary(BinaryOp::Mul, Op::local(0), Op::nonlocal(0)), m)
    };
    let mut module = Module::new();
    module.define("g", scale(2.0));
    module.define("h", scale(3.0));
    let body = Op::binary(
        BinaryOp::Add,
        Op::call(Op::nonlocal(0), Op::local(0)),
        Op::call(Op::nonlocal(1), Op::local(0)),
    );
    let f = closure(1, body, module);
    let out = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert!(out.contains("float r1 = 2.0;"));
    assert!(out.contains("float r3 = 3.0;"));
    assert!(out.contains("float r2 = r0*r1;"));
    assert!(out.contains("float r4 = r0*r3;"));
    assert!(out.contains("float r5 = r2+r4;"));
}

#[test]
fn test_scalar_broadcasts_to_vector() {
    let body = Op::binary(BinaryOp::Mul, Op::local(0), Op::num(2.0));
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::num_vec(3)], Ty::num_vec(3), &f).unwrap();
    assert!(out.contains("  float r1 = 2.0;\n"));
    assert!(out.contains("  vec3 r2 = vec3(r1,r1,r1);\n"));
    assert!(out.contains("  vec3 r3 = r0*r2;\n"));
}

#[test]
fn test_bool_broadcasts_to_mask() {
    let eq = Op::binary(BinaryOp::Eq, Op::local(0), Op::constant(Value::Bool(true)));
    let f = closure(1, eq, Module::new());
    let out = glsl(&[Ty::Bool32], Ty::Bool, &f).unwrap();
    assert!(out.contains("bool r1 = true;"));
    assert!(out.contains("uint r2 = uint(-int(r1));"));
    assert!(out.contains("bool r3 = (r0 == r2);"));

    let ne = Op::binary(BinaryOp::Ne, Op::local(0), Op::constant(Value::Bool(true)));
    let f = closure(1, ne, Module::new());
    let out = glsl(&[Ty::Bool32], Ty::Bool, &f).unwrap();
    assert!(out.contains("bool r3 = !(r0 == r2);"));
}

#[test]
fn test_vector_extends_to_matrix_rows() {
    let body = Op::binary(BinaryOp::Add, Op::local(0), Op::local(1));
    let f = pair_closure(body);
    let out = glsl(&[Ty::num_vec(3), Ty::Mat(3)], Ty::Mat(3), &f).unwrap();
    assert!(out.starts_with("mat3 f(vec3 r0, mat3 r1)\n"));
    assert!(out.contains(
        "  float r2 = r0.x;\n\
         \x20 vec3 r3 = vec3(r2,r2,r2);\n\
         \x20 float r4 = r0.y;\n\
         \x20 vec3 r5 = vec3(r4,r4,r4);\n\
         \x20 float r6 = r0.z;\n\
         \x20 vec3 r7 = vec3(r6,r6,r6);\n\
         \x20 mat3 r8 = mat3(r3,r5,r7);\n\
         \x20 mat3 r9 = r8+r1;\n\
         \x20 return r9;\n"
    ));
}

#[test]
fn test_matrix_with_vector_extends_right_operand() {
    let body = Op::binary(BinaryOp::Add, Op::local(1), Op::local(0));
    let f = pair_closure(body);
    let out = glsl(&[Ty::num_vec(3), Ty::Mat(3)], Ty::Mat(3), &f).unwrap();
    assert!(out.contains("  mat3 r8 = mat3(r3,r5,r7);\n"));
    assert!(out.contains("  mat3 r9 = r1+r8;\n"));
    assert!(out.contains("  return r9;\n"));
}

#[test]
fn test_bool_vector_extends_to_mask_vector() {
    let bvec3 = Ty::Vec(Scalar::Bool, 3);
    let uvec3 = Ty::Vec(Scalar::Bool32, 3);
    for (lhs, rhs, eq) in [(0, 1, "(r8 == r1)"), (1, 0, "(r1 == r8)")] {
        let body = Op::binary(BinaryOp::Eq, Op::local(lhs), Op::local(rhs));
        let f = pair_closure(body);
        let out = glsl(&[bvec3.clone(), uvec3.clone()], Ty::Bool, &f).unwrap();
        assert!(out.contains("  bool r2 = r0.x;\n"));
        assert!(out.contains("  uint r3 = uint(-int(r2));\n"));
        assert!(out.contains("  uint r7 = uint(-int(r6));\n"));
        assert!(out.contains("  uvec3 r8 = uvec3(r3,r5,r7);\n"));
        assert!(out.contains(&format!("  bool r9 = {};\n", eq)));
    }
}

#[test]
fn test_bool_vector_not_in_each_dialect() {
    let body = Op::unary(UnaryOp::Not, Op::local(0));
    let f = closure(1, body, Module::new());
    let bvec2 = Ty::Vec(Scalar::Bool, 2);
    let out = glsl(&[bvec2.clone()], bvec2.clone(), &f).unwrap();
    assert!(out.contains("  bvec2 r1 = not(r0);\n"));
    let cpp = compile(Target::Cpp, &[bvec2.clone()], bvec2, &f).unwrap();
    assert!(cpp.contains("  bvec2 r1 = not_(r0);\n"));
}

#[test]
fn test_mismatched_vectors_fail_without_output() {
    let body = Op::binary(
        BinaryOp::Add,
        Op::local(0),
        Op::constant(Value::nums(&[1.0, 2.0])),
    );
    let f = closure(1, body, Module::new());
    let mut sc = ScCompiler::new(Target::Glsl);
    let err = sc
        .define_function("f", &[Ty::num_vec(3)], &Ty::num_vec(3), &f)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.message, "vec3, vec2 not convertible to a common type");
    assert_eq!(sc.output(), "");
}

#[test]
fn test_result_type_checked() {
    let f = closure(1, Op::local(0), Module::new());
    let err = glsl(&[Ty::Num], Ty::num_vec(3), &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ResultTypeMismatch);
    assert_eq!(err.message, "f function returns float, expected vec3");
}

#[test]
fn test_non_function_rejected() {
    let err = glsl(&[Ty::Num], Ty::Num, &Value::Num(1.0)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedValue);
    assert!(err.message.contains("is not a function"));
}

#[test]
fn test_swizzle() {
    let body = Op::index(Op::local(0), Op::constant(Value::nums(&[2.0, 0.0])));
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::num_vec(3)], Ty::num_vec(2), &f).unwrap();
    assert!(out.contains("vec2 r1 = r0.zx;"));
    let cpp = compile(Target::Cpp, &[Ty::num_vec(3)], Ty::num_vec(2), &f).unwrap();
    assert!(cpp.contains("vec2 r1 = vec2(r0.z,r0.x);"));
}

#[test]
fn test_swizzle_out_of_range() {
    let body = Op::index(Op::local(0), Op::constant(Value::nums(&[0.0, 1.0, 3.0])));
    let f = closure(1, body, Module::new());
    let err = glsl(&[Ty::num_vec(3)], Ty::num_vec(3), &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadIndex);
    assert_eq!(err.message, "got 3, expected 0..2");
}

#[test]
fn test_swizzle_length_checked() {
    let body = Op::index(Op::local(0), Op::constant(Value::nums(&[0.0; 5])));
    let f = closure(1, body, Module::new());
    let err = glsl(&[Ty::num_vec(4)], Ty::num_vec(4), &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadIndex);
    assert_eq!(err.message, "list index vector must have between 2 and 4 elements");
}

#[test]
fn test_runtime_vector_index() {
    let body = Op::index(Op::constant(Value::nums(&[1.0, 2.0, 3.0])), Op::local(0));
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert!(out.contains("vec3 r1 = vec3(1.0,2.0,3.0);"));
    assert!(out.contains("float r2 = r1[int(r0)];"));
    let cl = compile(Target::OpenCl, &[Ty::Num], Ty::Num, &f).unwrap();
    assert!(cl.contains("float r2 = ((float*)&r1)[(int)(r0)];"));
}

#[test]
fn test_runtime_mask_index() {
    let body = Op::index(Op::local(0), Op::local(1));
    let out = glsl(&[Ty::Bool32, Ty::Num], Ty::Bool, &pair_closure(body)).unwrap();
    assert!(out.starts_with("bool f(uint r0, float r1)\n"));
    assert!(out.contains("bool r2 = ((r0 >> uint(r1)) & 1u) != 0u;"));
}

#[test]
fn test_array_constant_and_runtime_index() {
    let table = Op::constant(Value::nums(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    let f = closure(1, Op::index(table, Op::local(0)), Module::new());
    let out = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert!(out.contains("float[6] r1 = float[6](1.0,2.0,3.0,4.0,5.0,6.0);"));
    assert!(out.contains("float r2 = r1[int(r0)];"));
    let cl = compile(Target::OpenCl, &[Ty::Num], Ty::Num, &f).unwrap();
    assert!(cl.contains("float r1[] = {1.0f,2.0f,3.0f,4.0f,5.0f,6.0f};"));
}

fn pair_closure(body: crate::op::OpRef) -> Value {
    closure_with(Pattern::List(vec![Pattern::Slot(0), Pattern::Slot(1)]), 2, body, Module::new())
}

#[test]
fn test_two_dimensional_array_index() {
    let grid = Value::list(vec![
        Value::nums(&[1.0, 2.0, 3.0, 4.0, 5.0]),
        Value::nums(&[6.0, 7.0, 8.0, 9.0, 10.0]),
    ]);
    let body = Op::new(OpKind::Slice {
        base: Op::constant(grid),
        indices: Op::list(vec![Op::local(0), Op::local(1)]),
    });
    let out = glsl(&[Ty::Num, Ty::Num], Ty::Num, &pair_closure(body)).unwrap();
    assert!(out.contains(
        "float[10] r2 = float[10](1.0,2.0,3.0,4.0,5.0,6.0,7.0,8.0,9.0,10.0);"
    ));
    assert!(out.contains("float r3 = r2[int(r0)*5+int(r1)];"));
}

#[test]
fn test_array_of_vectors_two_indexes() {
    let rows = Value::list(vec![
        Value::nums(&[1.0, 2.0, 3.0]),
        Value::nums(&[4.0, 5.0, 6.0]),
    ]);
    let body = Op::new(OpKind::Slice {
        base: Op::constant(rows),
        indices: Op::list(vec![Op::local(0), Op::local(1)]),
    });
    let out = glsl(&[Ty::Num, Ty::Num], Ty::Num, &pair_closure(body)).unwrap();
    assert!(out.contains("vec3[2] r2 = vec3[2](vec3(1.0,2.0,3.0),vec3(4.0,5.0,6.0));"));
    assert!(out.contains("float r3 = r2[int(r0)][int(r1)];"));
}

#[test]
fn test_index_list_arity() {
    let body = Op::new(OpKind::Slice {
        base: Op::local(0),
        indices: Op::list(vec![Op::num(0.0); 4]),
    });
    let f = closure(1, body, Module::new());
    let err = glsl(&[Ty::num_vec(4)], Ty::Num, &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadIndex);
    assert_eq!(err.message, "index list has 4 components: only 1..3 supported");
}

#[test]
fn test_matrix_element_by_two_indexes() {
    let body = Op::new(OpKind::Slice {
        base: Op::local(0),
        indices: Op::list(vec![Op::num(1.0), Op::num(0.0)]),
    });
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::Mat(2)], Ty::Num, &f).unwrap();
    assert!(out.contains("float r3 = r0[int(r1)][int(r2)];"));
}

#[test]
fn test_packed_mask_constant() {
    let mut bits = vec![Value::Bool(false); 32];
    bits[0] = Value::Bool(true);
    bits[2] = Value::Bool(true);
    let body = Op::constant(Value::list(bits));
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::Num], Ty::Bool32, &f).unwrap();
    assert!(out.contains("uint r1 = 5u;"));
}

#[test]
fn test_runtime_vector_constructor() {
    let body = Op::list(vec![Op::local(0), Op::num(0.0), Op::local(0)]);
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::Num], Ty::num_vec(3), &f).unwrap();
    assert!(out.contains("float r1 = 0.0;"));
    assert!(out.contains("vec3 r2 = vec3(r0,r1,r0);"));
}

#[test]
fn test_vector_elements_must_agree() {
    let body = Op::list(vec![Op::local(0), Op::constant(Value::Bool(true))]);
    let f = closure(1, body, Module::new());
    let err = glsl(&[Ty::Num], Ty::num_vec(2), &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(
        err.message,
        "vector elements must have uniform type; got types float and bool"
    );
}

#[test]
fn test_unsupported_type_in_dialect() {
    let f = closure(1, Op::local(0), Module::new());
    let err = compile(Target::OpenCl, &[Ty::Mat(3)], Ty::Mat(3), &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedValue);
    assert_eq!(err.message, "type mat3 is not supported by opencl");
    let err = compile(Target::OpenCl, &[Ty::Vec(Scalar::Bool, 2)], Ty::Bool, &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedValue);
}

#[test]
fn test_record_field_folds() {
    let mut module = Module::new();
    module.define("shape", Value::record([("radius", Value::Num(0.5))]));
    let radius = Op::new(OpKind::Dot {
        base: Op::nonlocal(0),
        field: "radius".to_string(),
    });
    let body = Op::binary(BinaryOp::Sub, Op::local(0), radius);
    let f = closure(1, body, module);
    let out = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert!(out.contains("float r1 = 0.5;"));
    assert!(out.contains("float r2 = r0-r1;"));
}

#[test]
fn test_unknown_field_is_not_constant() {
    let mut module = Module::new();
    module.define("shape", Value::record([("radius", Value::Num(0.5))]));
    let body = Op::new(OpKind::Dot {
        base: Op::nonlocal(0),
        field: "colour".to_string(),
    });
    let f = closure(1, body, module);
    let err = glsl(&[Ty::Num], Ty::Num, &f).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotConstant);
}

#[test]
fn test_negative_literal_parenthesized() {
    let body = Op::binary(BinaryOp::Mul, Op::local(0), Op::num(-1.5));
    let f = closure(1, body, Module::new());
    let out = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert!(out.contains("float r1 = (-1.5);"));
}

#[test]
fn test_compilation_is_deterministic() {
    let body = Op::if_else(
        Op::binary(BinaryOp::Lt, Op::local(0), Op::num(1.0)),
        Op::binary(BinaryOp::Pow, Op::local(0), Op::num(2.0)),
        Op::local(0),
    );
    let f = closure(1, body, Module::new());
    let first = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    let second = glsl(&[Ty::Num], Ty::Num, &f).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("pow(r0,r3)"));
}

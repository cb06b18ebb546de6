//! Terse constructors for IR fragments.
//!
//! Used by tests and by embedders that generate programs directly instead
//! of loading them from JSON.

use crate::ids::Id;
use crate::syntax::{
    Alt, AltCon, AltType, Arg, Binding, DataCon, Expr, Lambda, Lit, PrimRep, ResultType, Rhs,
    TyCon,
};
use std::rc::Rc;

/// An id whose key is its name. Fine for hand-written programs where every
/// binder is named distinctly.
pub fn id(name: &str) -> Id {
    Id::new(name, name)
}

pub fn var(name: &str) -> Arg {
    Arg::Var(id(name))
}

pub fn int(n: i64) -> Arg {
    Arg::Lit(Lit::Int(n))
}

pub fn float(x: f32) -> Arg {
    Arg::Lit(Lit::Float(x))
}

pub fn double(x: f64) -> Arg {
    Arg::Lit(Lit::Double(x))
}

pub fn real_world() -> Arg {
    Arg::Var(Id::real_world())
}

pub fn data_con(name: &str, tag: u32, arity: usize) -> DataCon {
    DataCon {
        name: name.into(),
        tag,
        arity,
    }
}

pub fn tycon(name: &str, data_cons: Vec<DataCon>) -> TyCon {
    TyCon {
        name: name.into(),
        data_cons,
    }
}

pub fn lit(l: Lit) -> Rc<Expr> {
    Rc::new(Expr::Lit(l))
}

pub fn lit_int(n: i64) -> Rc<Expr> {
    lit(Lit::Int(n))
}

pub fn app(fun: &str, args: Vec<Arg>) -> Rc<Expr> {
    let fun = id(fun);
    Rc::new(Expr::App { fun, args })
}

/// A bare variable occurrence: an application to no arguments.
pub fn var_expr(name: &str) -> Rc<Expr> {
    app(name, vec![])
}

pub fn con_app(con: &DataCon, args: Vec<Arg>) -> Rc<Expr> {
    Rc::new(Expr::ConApp {
        con: con.clone(),
        args,
    })
}

pub fn multi_val(args: Vec<Arg>) -> Rc<Expr> {
    Rc::new(Expr::MultiVal { args })
}

pub fn op(name: &str, args: Vec<Arg>, result: PrimRep) -> Rc<Expr> {
    Rc::new(Expr::OpApp {
        op: name.to_string(),
        args,
        result_type: ResultType::Single(result),
        result_tycon: None,
    })
}

pub fn op_typed(
    name: &str,
    args: Vec<Arg>,
    result_type: ResultType,
    tycon: Option<TyCon>,
) -> Rc<Expr> {
    Rc::new(Expr::OpApp {
        op: name.to_string(),
        args,
        result_type,
        result_tycon: tycon,
    })
}

pub fn case(scrutinee: Rc<Expr>, binder: &str, alt_type: AltType, alts: Vec<Alt>) -> Rc<Expr> {
    Rc::new(Expr::Case {
        scrutinee,
        binder: id(binder),
        alt_type,
        alts: alts.into(),
    })
}

pub fn alt(con: &DataCon, binders: &[&str], rhs: Rc<Expr>) -> Alt {
    Alt {
        con: AltCon::Data(con.clone()),
        binders: binders.iter().map(|b| id(b)).collect(),
        rhs,
    }
}

pub fn alt_lit(l: Lit, rhs: Rc<Expr>) -> Alt {
    Alt {
        con: AltCon::Lit(l),
        binders: vec![],
        rhs,
    }
}

/// The single alternative of an unboxed-tuple case.
pub fn alt_tuple(binders: &[&str], rhs: Rc<Expr>) -> Alt {
    Alt {
        con: AltCon::Default,
        binders: binders.iter().map(|b| id(b)).collect(),
        rhs,
    }
}

pub fn alt_default(rhs: Rc<Expr>) -> Alt {
    Alt {
        con: AltCon::Default,
        binders: vec![],
        rhs,
    }
}

pub fn closure(free_vars: &[&str], params: &[&str], body: Rc<Expr>) -> Rhs {
    Rhs::Closure {
        free_vars: free_vars.iter().map(|v| id(v)).collect(),
        lambda: Rc::new(Lambda {
            params: params.iter().map(|p| id(p)).collect(),
            body,
        }),
    }
}

pub fn thunk(free_vars: &[&str], body: Rc<Expr>) -> Rhs {
    closure(free_vars, &[], body)
}

pub fn con_rhs(con: &DataCon, args: Vec<Arg>) -> Rhs {
    Rhs::Con {
        con: con.clone(),
        args,
    }
}

pub fn let_(name: &str, rhs: Rhs, body: Rc<Expr>) -> Rc<Expr> {
    Rc::new(Expr::Let {
        binding: Binding::NonRec(id(name), rhs),
        body,
    })
}

pub fn letrec(pairs: Vec<(&str, Rhs)>, body: Rc<Expr>) -> Rc<Expr> {
    Rc::new(Expr::Let {
        binding: Binding::Rec(pairs.into_iter().map(|(n, rhs)| (id(n), rhs)).collect()),
        body,
    })
}

pub fn top(name: &str, rhs: Rhs) -> Binding {
    Binding::NonRec(id(name), rhs)
}

//! Expression evaluation.

use lunar_ir::{BinaryOp, CallExpr, Expr, ExprKind, TableField};

use super::Interpreter;
use crate::errors::{attempt_to_call, unsupported_node, EvalResult};
use crate::protocol;
use crate::value::{first, BoxFuture, Table, Value, Values};

impl Interpreter<'_> {
    /// Evaluate `expr` to exactly one value.
    pub(super) fn eval_expr<'s>(
        &'s self,
        expr: &'s Expr,
        scope: &'s Table,
    ) -> BoxFuture<'s, EvalResult<Value>> {
        Box::pin(async move {
            match &expr.kind {
                ExprKind::Nil => Ok(Value::Nil),
                ExprKind::Bool(b) => Ok(Value::Boolean(*b)),
                ExprKind::Number(n) => Ok(Value::Number(*n)),
                ExprKind::String(s) => Ok(Value::String(s.clone())),
                ExprKind::Varargs => Ok(first(self.frame.varargs())),
                ExprKind::Binary { op, left, right } => {
                    let left = self.eval_expr(left, scope).await?;
                    match op {
                        BinaryOp::And if !left.as_bool() => Ok(left),
                        BinaryOp::Or if left.as_bool() => Ok(left),
                        BinaryOp::And | BinaryOp::Or => self.eval_expr(right, scope).await,
                        _ => {
                            let right = self.eval_expr(right, scope).await?;
                            protocol::binary(self.engine, *op, left, right, self.cx).await
                        }
                    }
                }
                ExprKind::Unary { op, operand } => {
                    let operand = self.eval_expr(operand, scope).await?;
                    protocol::unary(self.engine, *op, operand, self.cx).await
                }
                ExprKind::Variable(name) => {
                    let holder = Value::Table(scope.clone());
                    protocol::index(self.engine, holder, Value::String(name.clone()), self.cx).await
                }
                ExprKind::Index { object, key } => {
                    let object = self.eval_expr(object, scope).await?;
                    let key = self.eval_expr(key, scope).await?;
                    protocol::index(self.engine, object, key, self.cx).await
                }
                ExprKind::Call(call) => Ok(first(&self.eval_call(call, scope).await?)),
                ExprKind::Function(def) => Ok(Value::Function(
                    self.engine.new_closure(def.clone(), scope.clone()),
                )),
                ExprKind::Table(fields) => self.eval_table(fields, scope).await,
                ExprKind::Paren(inner) => self.eval_expr(inner, scope).await,
                ExprKind::Unsupported(what) => Err(unsupported_node(what)),
            }
        })
    }

    /// Evaluate a possibly multi-valued expression to all its values.
    async fn eval_multi(&self, expr: &Expr, scope: &Table) -> EvalResult<Values> {
        match &expr.kind {
            ExprKind::Call(call) => self.eval_call(call, scope).await,
            ExprKind::Varargs => Ok(self.frame.varargs().clone()),
            _ => {
                let mut values = Values::new();
                values.push(self.eval_expr(expr, scope).await?);
                Ok(values)
            }
        }
    }

    /// Evaluate an expression list: every expression contributes its first
    /// value except the last, which contributes all of them.
    pub(super) async fn eval_list(&self, exprs: &[Expr], scope: &Table) -> EvalResult<Values> {
        let mut values = Values::with_capacity(exprs.len());
        let Some((last, init)) = exprs.split_last() else {
            return Ok(values);
        };
        for expr in init {
            values.push(self.eval_expr(expr, scope).await?);
        }
        values.extend(self.eval_multi(last, scope).await?);
        Ok(values)
    }

    pub(super) fn eval_call<'s>(
        &'s self,
        call: &'s CallExpr,
        scope: &'s Table,
    ) -> BoxFuture<'s, EvalResult<Values>> {
        Box::pin(async move {
            let (callee, args) = match &call.method {
                Some(method) => {
                    let receiver = self.eval_expr(&call.callee, scope).await?;
                    let callee = protocol::index(
                        self.engine,
                        receiver.clone(),
                        Value::String(method.clone()),
                        self.cx,
                    )
                    .await?;
                    let mut args = Values::with_capacity(call.args.len() + 1);
                    args.push(receiver);
                    args.extend(self.eval_list(&call.args, scope).await?);
                    (callee, args)
                }
                None => {
                    let callee = self.eval_expr(&call.callee, scope).await?;
                    (callee, self.eval_list(&call.args, scope).await?)
                }
            };

            if !is_callable(self.engine, &callee) {
                let err = attempt_to_call(&callee);
                return Err(match call_hint(call, scope) {
                    Some(hint) => err.with_hint(&hint),
                    None => err,
                });
            }
            protocol::call(self.engine, &callee, args, self.cx).await
        })
    }

    async fn eval_table(&self, fields: &[TableField], scope: &Table) -> EvalResult<Value> {
        let table = self.engine.new_table();
        let mut next_index = 1usize;
        for (i, field) in fields.iter().enumerate() {
            match field {
                TableField::Positional(expr) if i + 1 == fields.len() => {
                    for value in self.eval_multi(expr, scope).await? {
                        table.raw_set(Value::from(next_index), value)?;
                        next_index += 1;
                    }
                }
                TableField::Positional(expr) => {
                    let value = self.eval_expr(expr, scope).await?;
                    table.raw_set(Value::from(next_index), value)?;
                    next_index += 1;
                }
                TableField::Keyed { key, value } => {
                    let key = self.eval_expr(key, scope).await?;
                    let value = self.eval_expr(value, scope).await?;
                    table.raw_set(key, value)?;
                }
            }
        }
        Ok(Value::Table(table))
    }
}

fn is_callable(engine: &crate::engine::Engine, value: &Value) -> bool {
    match value {
        Value::Function(_) => true,
        other => matches!(
            protocol::metamethod(engine, other, "__call"),
            Some(Value::Function(_))
        ),
    }
}

/// Describe the callee for "attempt to call" errors.
fn call_hint(call: &CallExpr, scope: &Table) -> Option<String> {
    if let Some(method) = &call.method {
        return Some(format!("method '{method}'"));
    }
    match &call.callee.kind {
        ExprKind::Variable(name) => {
            let key = Value::String(name.clone());
            let mut current = Some(scope.clone());
            while let Some(table) = current {
                if table.is_scope() && table.binds(&key) {
                    return Some(format!("local '{name}'"));
                }
                current = table.parent();
            }
            Some(format!("global '{name}'"))
        }
        ExprKind::Index { key, .. } => match &key.kind {
            ExprKind::String(field) => Some(format!("field '{field}'")),
            _ => None,
        },
        _ => None,
    }
}

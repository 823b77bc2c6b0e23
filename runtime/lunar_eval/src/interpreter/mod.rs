//! Tree-walking evaluator.
//!
//! Statements and expressions are evaluated in source order. Nothing here
//! suspends except calls: every call goes through `Function::call`, which
//! is also where the recursion is boxed. Cancellation is checked before
//! each statement and each loop iteration and unwinds as a `Cancelled`
//! error that `Engine::execute*` turns into a clean result.

mod expr;
mod frame;

use lunar_ir::{Block, Expr, ExprKind, Stmt, StmtKind};

pub(crate) use frame::{Flow, Frame};

use crate::context::CallContext;
use crate::engine::Engine;
use crate::errors::{unsupported_node, ErrorKind, EvalResult, RuntimeError};
use crate::protocol;
use crate::value::{first, BoxFuture, Closure, Table, Value, Values};

/// Run an interpreted function.
///
/// The body runs in a fresh scope whose parent is the captured scope, or
/// directly in the captured scope for the top-level chunk.
pub(crate) async fn call_closure(
    engine: &Engine,
    closure: &Closure,
    args: Values,
    cx: &CallContext,
) -> EvalResult<Values> {
    let def = closure.def.clone();
    let scope = if closure.extends_scope {
        engine.new_scope(closure.scope.clone())
    } else {
        closure.scope.clone()
    };

    let mut args = args.into_iter();
    for param in &def.params {
        scope.declare(Value::String(param.clone()), args.next().unwrap_or_default())?;
    }
    let varargs: Values = if def.is_variadic {
        args.collect()
    } else {
        Values::new()
    };

    let frame = Frame::new(varargs);
    let interpreter = Interpreter {
        engine,
        frame: &frame,
        cx,
    };
    interpreter.exec_statements(&def.body, &scope).await?;
    Ok(frame.take_outcome())
}

pub(crate) struct Interpreter<'a> {
    engine: &'a Engine,
    frame: &'a Frame,
    cx: &'a CallContext,
}

impl<'a> Interpreter<'a> {
    /// Run `block` in a new child scope of `scope`.
    fn exec_block<'s>(&'s self, block: &'s Block, scope: &'s Table) -> BoxFuture<'s, EvalResult<Flow>> {
        Box::pin(async move {
            let child = self.engine.new_scope(scope.clone());
            self.exec_statements(block, &child).await
        })
    }

    /// Run the statements of `block` directly in `scope`.
    fn exec_statements<'s>(
        &'s self,
        block: &'s Block,
        scope: &'s Table,
    ) -> BoxFuture<'s, EvalResult<Flow>> {
        Box::pin(async move {
            for stmt in &block.stmts {
                if self.frame.has_returned() {
                    return Ok(Flow::Return);
                }
                self.cx.check_cancelled()?;
                let flow = self
                    .exec_stmt(stmt, scope)
                    .await
                    .map_err(|e| e.at_line(stmt.span.line))?;
                if flow != Flow::Normal {
                    return Ok(flow);
                }
            }
            Ok(Flow::Normal)
        })
    }

    async fn exec_stmt(&self, stmt: &Stmt, scope: &Table) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::Assign { targets, values } => {
                let values = self.eval_list(values, scope).await?;
                for (i, target) in targets.iter().enumerate() {
                    let value = values.get(i).cloned().unwrap_or_default();
                    self.assign(target, value, scope).await?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::Local { names, values } => {
                let values = self.eval_list(values, scope).await?;
                for (i, name) in names.iter().enumerate() {
                    let value = values.get(i).cloned().unwrap_or_default();
                    scope.declare(Value::String(name.clone()), value)?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::LocalFunction { name, func } => {
                let key = Value::String(name.clone());
                scope.declare(key.clone(), Value::Nil)?;
                let function = self.engine.new_closure(func.clone(), scope.clone());
                scope.declare(key, Value::Function(function))?;
                Ok(Flow::Normal)
            }
            StmtKind::Call(call) => {
                self.eval_call(call, scope).await?;
                Ok(Flow::Normal)
            }
            StmtKind::Do(block) => self.exec_block(block, scope).await,
            StmtKind::If {
                branches,
                else_block,
            } => {
                for (cond, block) in branches {
                    if self.eval_expr(cond, scope).await?.as_bool() {
                        return self.exec_block(block, scope).await;
                    }
                }
                match else_block {
                    Some(block) => self.exec_block(block, scope).await,
                    None => Ok(Flow::Normal),
                }
            }
            StmtKind::While { cond, body } => {
                loop {
                    self.cx.check_cancelled()?;
                    if !self.eval_expr(cond, scope).await?.as_bool() {
                        return Ok(Flow::Normal);
                    }
                    match self.exec_block(body, scope).await? {
                        Flow::Normal => {}
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Return => return Ok(Flow::Return),
                    }
                }
            }
            StmtKind::Repeat { body, cond } => loop {
                self.cx.check_cancelled()?;
                let child = self.engine.new_scope(scope.clone());
                match self.exec_statements(body, &child).await? {
                    Flow::Normal => {}
                    Flow::Break => return Ok(Flow::Normal),
                    Flow::Return => return Ok(Flow::Return),
                }
                if self.eval_expr(cond, &child).await?.as_bool() {
                    return Ok(Flow::Normal);
                }
            },
            StmtKind::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => {
                let start = self.for_number(start, scope, "initial").await?;
                let limit = self.for_number(limit, scope, "limit").await?;
                let step = match step {
                    Some(step) => self.for_number(step, scope, "step").await?,
                    None => 1.0,
                };
                let mut i = start;
                while (step > 0.0 && i <= limit) || (step <= 0.0 && i >= limit) {
                    self.cx.check_cancelled()?;
                    let iteration = self.engine.new_scope(scope.clone());
                    iteration.declare(Value::String(var.clone()), Value::Number(i))?;
                    match self.exec_statements(body, &iteration).await? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                    }
                    i += step;
                }
                Ok(Flow::Normal)
            }
            StmtKind::GenericFor { names, exprs, body } => {
                let init = self.eval_list(exprs, scope).await?;
                let iterator = first(&init);
                let state = init.get(1).cloned().unwrap_or_default();
                let mut control = init.get(2).cloned().unwrap_or_default();
                loop {
                    self.cx.check_cancelled()?;
                    let args: Values = [state.clone(), control.clone()].into_iter().collect();
                    let results = protocol::call(self.engine, &iterator, args, self.cx)
                        .await
                        .map_err(iterator_hint)?;
                    control = first(&results);
                    if control.is_nil() {
                        return Ok(Flow::Normal);
                    }
                    let iteration = self.engine.new_scope(scope.clone());
                    for (i, name) in names.iter().enumerate() {
                        let value = results.get(i).cloned().unwrap_or_default();
                        iteration.declare(Value::String(name.clone()), value)?;
                    }
                    match self.exec_statements(body, &iteration).await? {
                        Flow::Normal => {}
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Return => return Ok(Flow::Return),
                    }
                }
            }
            StmtKind::Return(exprs) => {
                let values = self.eval_list(exprs, scope).await?;
                self.frame.set_return(values);
                Ok(Flow::Return)
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Unsupported(what) => Err(unsupported_node(what)),
        }
    }

    async fn assign(&self, target: &Expr, value: Value, scope: &Table) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Variable(name) => {
                let holder = Value::Table(scope.clone());
                protocol::new_index(self.engine, holder, Value::String(name.clone()), value, self.cx)
                    .await
            }
            ExprKind::Index { object, key } => {
                let object = self.eval_expr(object, scope).await?;
                let key = self.eval_expr(key, scope).await?;
                protocol::new_index(self.engine, object, key, value, self.cx).await
            }
            _ => Err(unsupported_node("assignment target")),
        }
    }

    async fn for_number(&self, expr: &Expr, scope: &Table, what: &str) -> EvalResult<f64> {
        self.eval_expr(expr, scope).await?.to_number().ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::ArithmeticOnNonNumber,
                format!("'for' {what} value must be a number"),
            )
        })
    }
}

#[cold]
fn iterator_hint(err: RuntimeError) -> RuntimeError {
    if err.kind == ErrorKind::NotCallable && !err.message.contains('(') {
        err.with_hint("for iterator")
    } else {
        err
    }
}

//! Tree-walking evaluator: `eval(node, env) -> Value`, implemented as one
//! recursive `Evaluator` that branches on AST node variant. No host
//! exceptions are used for control flow — `return`/`break`/`continue`/
//! runtime errors are all ordinary [`Value`] variants that block/loop
//! evaluation checks for and propagates.

pub mod builtins;
pub mod classes;
pub mod environment;
pub mod value;

use std::cell::Cell;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::loader::Loader;
use crate::parser::ast::*;
use crate::parser::{ParseError, Parser};

use environment::Environment;
use value::{
    BoundMethodValue, ClassValue, EnumTypeValue, FunctionValue, InstanceValue, MapKey, ModuleValue, Value,
};

pub struct Evaluator {
    loader: Loader,
    program_args: Vec<String>,
    unsafe_depth: Cell<u32>,
}

impl Evaluator {
    pub fn new(entry_dir: PathBuf, search_paths: Vec<PathBuf>, program_args: Vec<String>) -> Self {
        Evaluator {
            loader: Loader::new(entry_dir, search_paths),
            program_args,
            unsafe_depth: Cell::new(0),
        }
    }

    pub fn new_root_env(&self) -> Environment {
        let env = Environment::root();
        builtins::install_globals(&env, self.program_args.clone());
        env
    }

    /// Lexes, parses, and (if parsing produced no errors) evaluates `source`
    /// in `env`. Used both for the top-level entry point and for module
    /// loading — an imported file re-enters this same pipeline.
    pub fn eval_source(&self, source: &str, env: &Environment) -> (Value, Vec<ParseError>) {
        let (program, errors) = Parser::from_source(source).parse_program();
        if !errors.is_empty() {
            return (Value::Null, errors);
        }
        (self.eval_program(&program, env), errors)
    }

    pub fn eval_program(&self, program: &Program, env: &Environment) -> Value {
        let mut last = Value::Null;
        for stmt in &program.statements {
            let value = self.eval_statement(stmt, env);
            match value {
                Value::Return(inner) => return *inner,
                Value::Error(_) => return value,
                _ => last = value,
            }
        }
        last
    }

    fn eval_block(&self, block: &Block, env: &Environment) -> Value {
        let mut last = Value::Null;
        for stmt in &block.statements {
            let value = self.eval_statement(stmt, env);
            if value.is_control_signal() {
                return value;
            }
            last = value;
        }
        last
    }

    // ---- statements ---------------------------------------------------------

    fn eval_statement(&self, stmt: &Statement, env: &Environment) -> Value {
        match stmt {
            Statement::Declaration(decl) => self.eval_declaration(decl, env),
            Statement::Assignment(assign) => self.eval_assignment(assign, env),
            Statement::FunctionDecl(fd) => {
                let func = Rc::new(FunctionValue {
                    name: Some(fd.name.clone()),
                    params: Rc::new(fd.params.clone()),
                    body: Rc::new(fd.body.clone()),
                    env: env.clone(),
                });
                env.declare(fd.name.clone(), Value::Function(func), false);
                Value::Null
            }
            Statement::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expression(expr, env),
                    None => Value::Null,
                };
                if value.is_error() {
                    return value;
                }
                Value::Return(Box::new(value))
            }
            Statement::If(ifstmt) => self.eval_if(ifstmt, env),
            Statement::ForIn(f) => self.eval_for_in(f, env),
            Statement::ForCond(f) => self.eval_for_cond(f, env),
            Statement::Break(_) => Value::Break,
            Statement::Continue(_) => Value::Continue,
            Statement::Nop(_) => Value::Null,
            Statement::ClassDecl(decl) => {
                let class = classes::build_class(decl, env);
                env.declare(decl.name.clone(), Value::Class(class), false);
                Value::Null
            }
            Statement::ImplDecl(decl) => self.eval_impl(decl, env),
            Statement::SpecDecl(decl) => {
                let spec = classes::build_spec(decl);
                env.declare(decl.name.clone(), Value::Spec(spec), false);
                Value::Null
            }
            Statement::EnumDecl(decl) => {
                let enum_type = Rc::new(EnumTypeValue {
                    name: decl.name.clone(),
                    variants: decl.variants.clone(),
                });
                env.declare(decl.name.clone(), Value::EnumType(enum_type), false);
                Value::Null
            }
            Statement::Import(stmt) => self.eval_import(stmt, env),
            Statement::Assert(a) => self.eval_assert(a, env),
            Statement::Unsafe(u) => {
                self.unsafe_depth.set(self.unsafe_depth.get() + 1);
                let child = Environment::child(env);
                let result = self.eval_block(&u.body, &child);
                self.unsafe_depth.set(self.unsafe_depth.get() - 1);
                result
            }
            Statement::Expression(expr) => self.eval_expression(expr, env),
        }
    }

    fn eval_declaration(&self, decl: &Declaration, env: &Environment) -> Value {
        let value = self.eval_expression(&decl.value, env);
        if value.is_error() {
            return value;
        }
        env.declare(decl.name.clone(), value, decl.mutable);
        Value::Null
    }

    fn eval_assignment(&self, assign: &Assignment, env: &Environment) -> Value {
        let mut values = Vec::with_capacity(assign.values.len());
        for expr in &assign.values {
            let v = self.eval_expression(expr, env);
            if v.is_error() {
                return v;
            }
            values.push(v);
        }
        // All RHS values are computed before any store, so `a, b = b, a` swaps.
        for (target, value) in assign.targets.iter().zip(values.into_iter()) {
            let result = self.assign_target(target, value, env);
            if result.is_error() {
                return result;
            }
        }
        Value::Null
    }

    fn assign_target(&self, target: &AssignTarget, value: Value, env: &Environment) -> Value {
        match target {
            AssignTarget::Ident(name) => match env.assign(name, value) {
                Ok(()) => Value::Null,
                Err(message) => Value::Error(message),
            },
            AssignTarget::Member { object, property } => {
                let obj = self.eval_expression(object, env);
                if obj.is_error() {
                    return obj;
                }
                match obj {
                    Value::Instance(inst) => {
                        inst.fields.borrow_mut().insert(property.clone(), value);
                        Value::Null
                    }
                    other => Value::Error(format!(
                        "cannot assign to member '{property}' of {}",
                        other.type_name()
                    )),
                }
            }
            AssignTarget::Index { collection, index } => {
                let coll = self.eval_expression(collection, env);
                if coll.is_error() {
                    return coll;
                }
                let idx = self.eval_expression(index, env);
                if idx.is_error() {
                    return idx;
                }
                match (&coll, &idx) {
                    (Value::List(items), Value::Integer(n)) => {
                        let mut items = items.borrow_mut();
                        match normalize_index(*n, items.len()) {
                            Some(i) => {
                                items[i] = value;
                                Value::Null
                            }
                            None => Value::Error(format!("index out of range: {n}")),
                        }
                    }
                    (Value::Map(map), key) => match MapKey::from_value(key) {
                        Some(k) => {
                            map.borrow_mut().insert(k, value);
                            Value::Null
                        }
                        None => Value::Error(format!("unhashable map key: {}", key.type_name())),
                    },
                    _ => Value::Error(format!(
                        "type mismatch: cannot index {} with {}",
                        coll.type_name(),
                        idx.type_name()
                    )),
                }
            }
        }
    }

    fn eval_if(&self, ifstmt: &IfStmt, env: &Environment) -> Value {
        let cond = self.eval_expression(&ifstmt.condition, env);
        if cond.is_error() {
            return cond;
        }
        if cond.truthy() {
            let child = Environment::child(env);
            return self.eval_block(&ifstmt.then_block, &child);
        }
        match &ifstmt.else_block {
            Some(ElseBranch::Block(block)) => {
                let child = Environment::child(env);
                self.eval_block(block, &child)
            }
            Some(ElseBranch::If(nested)) => self.eval_if(nested, env),
            None => Value::Null,
        }
    }

    fn eval_for_in(&self, f: &ForInStmt, env: &Environment) -> Value {
        let iterable = self.eval_expression(&f.iterable, env);
        if iterable.is_error() {
            return iterable;
        }
        let items: Vec<Value> = match &iterable {
            Value::Str(s) => s.chars().map(|c| Value::str(c.to_string())).collect(),
            Value::List(items) => items.borrow().clone(),
            Value::Range(start, end, inclusive) => {
                let end = if *inclusive { end + 1 } else { *end };
                (*start..end).map(Value::Integer).collect()
            }
            Value::Map(map) => {
                let mut keys: Vec<MapKey> = map.borrow().keys().cloned().collect();
                keys.sort_by(|a, b| a.into_value().inspect().cmp(&b.into_value().inspect()));
                keys.into_iter().map(|k| k.into_value()).collect()
            }
            other => {
                return Value::Error(format!("type mismatch: cannot iterate over {}", other.type_name()))
            }
        };
        for item in items {
            let child = Environment::child(env);
            child.declare(f.var.clone(), item, false);
            let result = self.eval_block(&f.body, &child);
            match result {
                Value::Break => return Value::Null,
                Value::Continue => continue,
                v if v.is_control_signal() => return v,
                _ => {}
            }
        }
        Value::Null
    }

    fn eval_for_cond(&self, f: &ForCondStmt, env: &Environment) -> Value {
        loop {
            if let Some(cond_expr) = &f.condition {
                let cond = self.eval_expression(cond_expr, env);
                if cond.is_error() {
                    return cond;
                }
                if !cond.truthy() {
                    break;
                }
            }
            let child = Environment::child(env);
            let result = self.eval_block(&f.body, &child);
            match result {
                Value::Break => break,
                Value::Continue => continue,
                v if v.is_control_signal() => return v,
                _ => {}
            }
        }
        Value::Null
    }

    fn eval_impl(&self, decl: &ImplDecl, env: &Environment) -> Value {
        let Some(Value::Class(class)) = env.get(&decl.class_name) else {
            return Value::Error(format!("identifier not found: {}", decl.class_name));
        };
        for method in &decl.methods {
            let entry = classes::build_method_entry(method, env);
            let table = if entry.is_static {
                &class.static_methods
            } else {
                &class.methods
            };
            table.borrow_mut().insert(method.name.clone(), entry);
        }
        if let Some(spec_name) = &decl.spec_name {
            let Some(Value::Spec(spec)) = env.get(spec_name) else {
                return Value::Error(format!("identifier not found: {spec_name}"));
            };
            log::debug!(
                "entering spec conformance check for impl {} for {}",
                class.name,
                spec.name
            );
            if let Some(missing) = classes::missing_spec_method(&class, &spec) {
                return Value::Error(format!(
                    "class {} does not implement spec {}: missing method {missing}",
                    class.name, spec.name
                ));
            }
            class.specs.borrow_mut().push(spec);
        }
        Value::Null
    }

    fn eval_assert(&self, a: &AssertStmt, env: &Environment) -> Value {
        let cond = self.eval_expression(&a.condition, env);
        if cond.is_error() {
            return cond;
        }
        if cond.truthy() {
            return Value::Null;
        }
        let message = match &a.message {
            Some(expr) => {
                let v = self.eval_expression(expr, env);
                if v.is_error() {
                    return v;
                }
                v.inspect()
            }
            None => "assertion failed".to_string(),
        };
        Value::Error(message)
    }

    fn eval_import(&self, stmt: &ImportStmt, env: &Environment) -> Value {
        log::debug!("loading module for '{}'", stmt.path);
        let resolved = match self.loader.resolve(&stmt.path) {
            Ok(p) => p,
            Err(e) => return Value::Error(e),
        };
        let module = match self.loader.cache_get(&resolved) {
            Some(module) => module,
            None => {
                let source = match std::fs::read_to_string(&resolved) {
                    Ok(s) => s,
                    Err(e) => return Value::Error(format!("module not found: {} ({e})", stmt.path)),
                };
                let module_env = self.new_root_env();
                let parent_dir = resolved
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let old_dir = self.loader.push_dir(parent_dir);
                let (result, errors) = self.eval_source(&source, &module_env);
                self.loader.set_dir(old_dir);
                if !errors.is_empty() {
                    let joined = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n");
                    return Value::Error(joined);
                }
                if result.is_error() {
                    return result;
                }
                let basename = resolved
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| stmt.path.clone());
                let module = Rc::new(ModuleValue {
                    name: basename,
                    env: module_env,
                });
                self.loader.cache_put(resolved, module.clone());
                module
            }
        };
        let bind_name = stmt.alias.clone().unwrap_or_else(|| module.name.clone());
        env.declare(bind_name, Value::Module(module), false);
        Value::Null
    }

    // ---- expressions ----------------------------------------------------------

    fn eval_expression(&self, expr: &Expression, env: &Environment) -> Value {
        match expr {
            Expression::Integer { value, .. } => Value::Integer(*value),
            Expression::Float { value, .. } => Value::Float(*value),
            Expression::Str { value, .. } => Value::str(value.clone()),
            Expression::InterpolatedString { parts, .. } => self.eval_interpolated(parts, env),
            Expression::Boolean { value, .. } => Value::Boolean(*value),
            Expression::Nil { .. } => Value::Null,
            Expression::Ident { name, .. } => env
                .get(name)
                .unwrap_or_else(|| Value::Error(format!("identifier not found: {name}"))),
            Expression::This { .. } => env
                .get("this")
                .unwrap_or_else(|| Value::Error("identifier not found: this".into())),
            Expression::List { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for e in elements {
                    let v = self.eval_expression(e, env);
                    if v.is_error() {
                        return v;
                    }
                    items.push(v);
                }
                Value::list(items)
            }
            Expression::Map { pairs, .. } => self.eval_map_literal(pairs, env),
            Expression::FunctionLit { params, body, .. } => Value::Function(Rc::new(FunctionValue {
                name: None,
                params: Rc::new(params.clone()),
                body: Rc::new(body.clone()),
                env: env.clone(),
            })),
            Expression::Match { scrutinee, arms, .. } => self.eval_match(scrutinee, arms, env),
            Expression::Ok { value, .. } => {
                let v = self.eval_expression(value, env);
                if v.is_error() {
                    return v;
                }
                Value::ResultOk(Box::new(v))
            }
            Expression::Err { value, .. } => {
                let v = self.eval_expression(value, env);
                if v.is_error() {
                    return v;
                }
                Value::ResultErr(Box::new(v))
            }
            Expression::Binary { op, left, right, .. } => self.eval_binary(*op, left, right, env),
            Expression::Unary { op, operand, .. } => self.eval_unary(*op, operand, env),
            Expression::Is { value, type_name, .. } => {
                let v = self.eval_expression(value, env);
                if v.is_error() {
                    return v;
                }
                Value::Boolean(v.is_type(type_name))
            }
            Expression::Range { start, end, inclusive, .. } => {
                let s = self.eval_expression(start, env);
                if s.is_error() {
                    return s;
                }
                let e = self.eval_expression(end, env);
                if e.is_error() {
                    return e;
                }
                match (s, e) {
                    (Value::Integer(a), Value::Integer(b)) => Value::Range(a, b, *inclusive),
                    _ => Value::Error("type mismatch: range bounds must be integers".into()),
                }
            }
            Expression::Call { callee, args, .. } => self.eval_call(callee, args, env),
            Expression::Index { collection, index, .. } => self.eval_index(collection, index, env),
            Expression::Member { object, property, .. } => {
                let obj = self.eval_expression(object, env);
                if obj.is_error() {
                    return obj;
                }
                self.eval_member(&obj, property)
            }
            Expression::Asm { args, .. } => self.eval_asm(args, env),
        }
    }

    fn eval_interpolated(&self, parts: &[StringPart], env: &Environment) -> Value {
        let mut out = String::new();
        for part in parts {
            match part {
                StringPart::Literal(s) => out.push_str(s),
                StringPart::Expr(e) => {
                    let v = self.eval_expression(e, env);
                    if v.is_error() {
                        return v;
                    }
                    out.push_str(&v.inspect());
                }
            }
        }
        Value::str(out)
    }

    fn eval_map_literal(&self, pairs: &[(Expression, Expression)], env: &Environment) -> Value {
        let mut map = std::collections::HashMap::new();
        for (k, v) in pairs {
            let key_val = self.eval_expression(k, env);
            if key_val.is_error() {
                return key_val;
            }
            let Some(key) = MapKey::from_value(&key_val) else {
                return Value::Error(format!("unhashable map key: {}", key_val.type_name()));
            };
            let value = self.eval_expression(v, env);
            if value.is_error() {
                return value;
            }
            map.insert(key, value);
        }
        Value::Map(Rc::new(std::cell::RefCell::new(map)))
    }

    fn eval_match(&self, scrutinee: &Expression, arms: &[MatchArm], env: &Environment) -> Value {
        let value = self.eval_expression(scrutinee, env);
        if value.is_error() {
            return value;
        }
        for arm in arms {
            if !match_pattern(&arm.pattern, &value) {
                continue;
            }
            if let Some(guard) = &arm.guard {
                let child = Environment::child(env);
                let g = self.eval_expression(guard, &child);
                if g.is_error() {
                    return g;
                }
                if !g.truthy() {
                    continue;
                }
            }
            let child = Environment::child(env);
            return self.eval_block(&arm.body, &child);
        }
        Value::Null
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expression, right: &Expression, env: &Environment) -> Value {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let l = self.eval_expression(left, env);
            if l.is_error() {
                return l;
            }
            let decided = if op == BinaryOp::And { !l.truthy() } else { l.truthy() };
            if decided {
                return l;
            }
            return self.eval_expression(right, env);
        }
        let l = self.eval_expression(left, env);
        if l.is_error() {
            return l;
        }
        let r = self.eval_expression(right, env);
        if r.is_error() {
            return r;
        }
        apply_binary_op(op, l, r)
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expression, env: &Environment) -> Value {
        let v = self.eval_expression(operand, env);
        if v.is_error() {
            return v;
        }
        match op {
            UnaryOp::Neg => match v {
                Value::Integer(n) => Value::Integer(-n),
                Value::Float(f) => Value::Float(-f),
                other => Value::Error(format!("unknown operator: - {}", other.type_name())),
            },
            UnaryOp::Not => match v {
                Value::Null => Value::Boolean(true),
                Value::Boolean(b) => Value::Boolean(!b),
                _ => Value::Boolean(false),
            },
            UnaryOp::Ref => Value::Reference(Rc::new(std::cell::RefCell::new(v))),
        }
    }

    fn eval_call(&self, callee: &Expression, arg_exprs: &[Expression], env: &Environment) -> Value {
        if let Expression::Member { object, property, .. } = callee {
            let obj = self.eval_expression(object, env);
            if obj.is_error() {
                return obj;
            }
            let args = match self.eval_args(arg_exprs, env) {
                Ok(a) => a,
                Err(e) => return e,
            };
            return self.call_method(&obj, property, args);
        }
        let callee_val = self.eval_expression(callee, env);
        if callee_val.is_error() {
            return callee_val;
        }
        let args = match self.eval_args(arg_exprs, env) {
            Ok(a) => a,
            Err(e) => return e,
        };
        self.call_value(callee_val, args)
    }

    fn eval_args(&self, arg_exprs: &[Expression], env: &Environment) -> Result<Vec<Value>, Value> {
        let mut args = Vec::with_capacity(arg_exprs.len());
        for expr in arg_exprs {
            let v = self.eval_expression(expr, env);
            if v.is_error() {
                return Err(v);
            }
            args.push(v);
        }
        Ok(args)
    }

    fn eval_index(&self, collection: &Expression, index: &Expression, env: &Environment) -> Value {
        let coll = self.eval_expression(collection, env);
        if coll.is_error() {
            return coll;
        }
        let idx = self.eval_expression(index, env);
        if idx.is_error() {
            return idx;
        }
        match (&coll, &idx) {
            (Value::List(items), Value::Integer(n)) => {
                let items = items.borrow();
                match normalize_index(*n, items.len()) {
                    Some(i) => items[i].clone(),
                    None => Value::Error(format!("index out of range: {n}")),
                }
            }
            (Value::Str(s), Value::Integer(n)) => {
                let chars: Vec<char> = s.chars().collect();
                match normalize_index(*n, chars.len()) {
                    Some(i) => Value::str(chars[i].to_string()),
                    None => Value::Error(format!("index out of range: {n}")),
                }
            }
            (Value::Map(map), key) => match MapKey::from_value(key) {
                Some(k) => map.borrow().get(&k).cloned().unwrap_or(Value::Null),
                None => Value::Error(format!("unhashable map key: {}", key.type_name())),
            },
            _ => Value::Error(format!(
                "type mismatch: cannot index {} with {}",
                coll.type_name(),
                idx.type_name()
            )),
        }
    }

    fn eval_asm(&self, arg_exprs: &[Expression], env: &Environment) -> Value {
        if self.unsafe_depth.get() == 0 {
            return Value::Error("asm() can only be used inside an unsafe block".into());
        }
        let args = match self.eval_args(arg_exprs, env) {
            Ok(a) => a,
            Err(e) => return e,
        };
        let Some(Value::Str(op_name)) = args.first() else {
            return Value::Error("asm() operation name must be a string".into());
        };
        let rest = &args[1..];
        match op_name.as_ref() {
            "sys_os" => Value::str(std::env::consts::OS),
            "sys_arch" => Value::str(std::env::consts::ARCH),
            "str_upper" => match rest.first() {
                Some(Value::Str(s)) => Value::str(s.to_uppercase()),
                _ => Value::Error("str_upper expects a string".into()),
            },
            "byte_chr" => match rest.first() {
                Some(Value::Integer(n)) => match u8::try_from(*n).ok().map(|b| b as char) {
                    Some(c) => Value::str(c.to_string()),
                    None => Value::Error(format!("byte_chr() argument out of range: {n}")),
                },
                _ => Value::Error("byte_chr expects an int".into()),
            },
            "file_read_n" => self.asm_file_read_n(rest),
            "file_seek" => self.asm_file_seek(rest),
            "file_tell" => self.asm_file_tell(rest),
            other => Value::Error(format!("unknown asm function: {other}")),
        }
    }

    fn asm_file_read_n(&self, args: &[Value]) -> Value {
        let (Some(Value::File(f)), Some(Value::Integer(n))) = (args.first(), args.get(1)) else {
            return Value::Error("file_read_n expects (file, n)".into());
        };
        let mut handle = f.borrow_mut();
        let Some(file) = handle.handle.as_mut() else {
            return Value::Error("file is closed".into());
        };
        let mut buf = vec![0u8; (*n).max(0) as usize];
        match file.read(&mut buf) {
            Ok(read) => Value::str(String::from_utf8_lossy(&buf[..read]).to_string()),
            Err(e) => Value::Error(format!("read failed: {e}")),
        }
    }

    fn asm_file_seek(&self, args: &[Value]) -> Value {
        let (Some(Value::File(f)), Some(Value::Integer(pos))) = (args.first(), args.get(1)) else {
            return Value::Error("file_seek expects (file, pos)".into());
        };
        let mut handle = f.borrow_mut();
        let Some(file) = handle.handle.as_mut() else {
            return Value::Error("file is closed".into());
        };
        match file.seek(SeekFrom::Start((*pos).max(0) as u64)) {
            Ok(_) => Value::Null,
            Err(e) => Value::Error(format!("seek failed: {e}")),
        }
    }

    fn asm_file_tell(&self, args: &[Value]) -> Value {
        let Some(Value::File(f)) = args.first() else {
            return Value::Error("file_tell expects a file".into());
        };
        let mut handle = f.borrow_mut();
        let Some(file) = handle.handle.as_mut() else {
            return Value::Error("file is closed".into());
        };
        match file.stream_position() {
            Ok(pos) => Value::Integer(pos as i64),
            Err(e) => Value::Error(format!("tell failed: {e}")),
        }
    }

    // ---- calling and member access --------------------------------------------

    fn call_value(&self, callee: Value, args: Vec<Value>) -> Value {
        match callee {
            Value::Function(f) => self.call_function(&f, args, None),
            Value::BuiltinFunction(_, f) => f(&args),
            Value::BoundMethod(b) => self.call_function(&b.method, args, Some(b.instance.clone())),
            Value::Class(c) => self.instantiate(&c, args),
            Value::Reference(h) => {
                let inner = h.borrow().clone();
                self.call_value(inner, args)
            }
            other => Value::Error(format!("not a function: {}", other.type_name())),
        }
    }

    fn call_function(&self, func: &FunctionValue, args: Vec<Value>, this: Option<Value>) -> Value {
        let call_env = Environment::child(&func.env);
        if let Some(this_val) = this {
            call_env.declare("this", this_val, false);
        }
        for (i, param) in func.params.iter().enumerate() {
            let value = if let Some(arg) = args.get(i) {
                arg.clone()
            } else if let Some(default) = &param.default {
                // Defaults are evaluated in the captured (defining) environment,
                // not at the call site.
                self.eval_expression(default, &func.env)
            } else {
                Value::Null
            };
            call_env.declare(param.name.clone(), value, true);
        }
        // Extra arguments beyond the parameter count are silently ignored.
        match self.eval_block(&func.body, &call_env) {
            Value::Return(v) => *v,
            Value::Break | Value::Continue => Value::Null,
            other => other,
        }
    }

    fn instantiate(&self, class: &Rc<ClassValue>, args: Vec<Value>) -> Value {
        let fields = classes::instantiate_fields(class, |expr, env| self.eval_expression(expr, env));
        let instance = Rc::new(InstanceValue {
            class: class.clone(),
            fields: std::cell::RefCell::new(fields),
        });
        let init = class.methods.borrow().get("init").cloned();
        if let Some(entry) = init {
            let result = self.call_function(&entry.func, args, Some(Value::Instance(instance.clone())));
            if result.is_error() {
                return result;
            }
        }
        Value::Instance(instance)
    }

    fn call_method(&self, object: &Value, property: &str, args: Vec<Value>) -> Value {
        match object {
            Value::Instance(inst) => match inst.class.methods.borrow().get(property).cloned() {
                Some(entry) => self.call_function(&entry.func, args, Some(object.clone())),
                None => Value::Error(format!("identifier not found: {property}")),
            },
            Value::Class(c) => match c.static_methods.borrow().get(property).cloned() {
                Some(entry) => self.call_function(&entry.func, args, None),
                None => Value::Error(format!("identifier not found: {property}")),
            },
            Value::Module(m) => match m.env.get(property) {
                Some(v) => self.call_value(v, args),
                None => Value::Error(format!("identifier not found: {property}")),
            },
            Value::Str(s) => builtins::str_mod::dispatch(property, s, &args)
                .unwrap_or_else(|| Value::Error(format!("unknown string method: {property}"))),
            Value::List(items) => builtins::list_methods::dispatch(items, property, &args, &|f, a| {
                self.call_value(f.clone(), a.to_vec())
            })
            .unwrap_or_else(|| Value::Error(format!("unknown list method: {property}"))),
            Value::Map(map) => builtins::map_methods::dispatch(map, property, &args)
                .unwrap_or_else(|| Value::Error(format!("unknown map method: {property}"))),
            Value::File(f) => builtins::io_mod::dispatch(f, property, &args)
                .unwrap_or_else(|| Value::Error(format!("unknown file method: {property}"))),
            Value::Reference(h) => {
                let inner = h.borrow().clone();
                self.call_method(&inner, property, args)
            }
            other => Value::Error(format!("not a function: {}", other.type_name())),
        }
    }

    fn eval_member(&self, object: &Value, property: &str) -> Value {
        match object {
            Value::Instance(inst) => {
                if let Some(v) = inst.fields.borrow().get(property) {
                    return v.clone();
                }
                if let Some(entry) = inst.class.methods.borrow().get(property).cloned() {
                    return Value::BoundMethod(Rc::new(BoundMethodValue {
                        instance: object.clone(),
                        method: entry.func.clone(),
                    }));
                }
                Value::Error(format!("identifier not found: {property}"))
            }
            Value::Class(c) => match c.static_methods.borrow().get(property).cloned() {
                Some(entry) => Value::Function(entry.func.clone()),
                None => Value::Error(format!("identifier not found: {property}")),
            },
            Value::Module(m) => m
                .env
                .get(property)
                .unwrap_or_else(|| Value::Error(format!("identifier not found: {property}"))),
            Value::EnumType(e) => {
                if e.variants.iter().any(|v| v == property) {
                    Value::EnumValue(e.name.as_str().into(), property.into())
                } else {
                    Value::Error(format!("identifier not found: {property}"))
                }
            }
            Value::ResultOk(v) if property == "value" => (**v).clone(),
            Value::ResultErr(v) if property == "error" => (**v).clone(),
            Value::Reference(h) => {
                let inner = h.borrow().clone();
                self.eval_member(&inner, property)
            }
            _ => Value::Error(format!("identifier not found: {property}")),
        }
    }
}

fn normalize_index(n: i64, len: usize) -> Option<usize> {
    if n < 0 || n as usize >= len {
        None
    } else {
        Some(n as usize)
    }
}

fn match_pattern(pattern: &Pattern, value: &Value) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Literal(lit) => match (lit, value) {
            (LiteralPattern::Int(n), Value::Integer(v)) => n == v,
            (LiteralPattern::Float(f), Value::Float(v)) => f == v,
            (LiteralPattern::Str(s), Value::Str(v)) => s.as_str() == v.as_ref(),
            (LiteralPattern::Bool(b), Value::Boolean(v)) => b == v,
            (LiteralPattern::Nil, Value::Null) => true,
            _ => false,
        },
        Pattern::Variant { enum_name, variant } => match value {
            Value::EnumValue(en, v) => {
                enum_name.as_deref().map_or(true, |n| n == en.as_ref()) && v.as_ref() == variant
            }
            Value::ResultOk(_) => variant == "Ok",
            Value::ResultErr(_) => variant == "Err",
            _ => false,
        },
        Pattern::Alternative(pats) => pats.iter().any(|p| match_pattern(p, value)),
    }
}

fn apply_binary_op(op: BinaryOp, l: Value, r: Value) -> Value {
    use Value::*;
    match op {
        BinaryOp::Add => match (&l, &r) {
            (Integer(a), Integer(b)) => Integer(a + b),
            (Integer(a), Float(b)) => Float(*a as f64 + b),
            (Float(a), Integer(b)) => Float(a + *b as f64),
            (Float(a), Float(b)) => Float(a + b),
            (Str(a), Str(b)) => Value::str(format!("{a}{b}")),
            _ => unknown_op("+", &l, &r),
        },
        BinaryOp::Sub => numeric_op(&l, &r, "-", |a, b| a - b, |a, b| a - b),
        BinaryOp::Mul => numeric_op(&l, &r, "*", |a, b| a * b, |a, b| a * b),
        BinaryOp::Div => match (&l, &r) {
            (Integer(_), Integer(0)) | (Float(_), Integer(0)) => Error("division by zero".into()),
            (_, Float(b)) if *b == 0.0 => Error("division by zero".into()),
            (Integer(a), Integer(b)) => Integer(a / b),
            (Integer(a), Float(b)) => Float(*a as f64 / b),
            (Float(a), Integer(b)) => Float(a / *b as f64),
            (Float(a), Float(b)) => Float(a / b),
            _ => unknown_op("/", &l, &r),
        },
        BinaryOp::Mod => match (&l, &r) {
            (Integer(_), Integer(0)) | (Float(_), Integer(0)) => Error("division by zero".into()),
            (_, Float(b)) if *b == 0.0 => Error("division by zero".into()),
            (Integer(a), Integer(b)) => Integer(a % b),
            (Float(a), Integer(b)) => Float(a % *b as f64),
            (Integer(a), Float(b)) => Float(*a as f64 % b),
            (Float(a), Float(b)) => Float(a % b),
            _ => unknown_op("%", &l, &r),
        },
        BinaryOp::Pow => match (&l, &r) {
            (Integer(base), Integer(exp)) => Integer(int_pow(*base, *exp)),
            (Integer(a), Float(b)) => Float((*a as f64).powf(*b)),
            (Float(a), Integer(b)) => Float(a.powi(*b as i32)),
            (Float(a), Float(b)) => Float(a.powf(*b)),
            _ => unknown_op("**", &l, &r),
        },
        BinaryOp::Eq => Boolean(l.value_eq(&r)),
        BinaryOp::NotEq => Boolean(!l.value_eq(&r)),
        BinaryOp::Lt => compare(&l, &r, "<", |o| o == std::cmp::Ordering::Less),
        BinaryOp::Gt => compare(&l, &r, ">", |o| o == std::cmp::Ordering::Greater),
        BinaryOp::LtEq => compare(&l, &r, "<=", |o| o != std::cmp::Ordering::Greater),
        BinaryOp::GtEq => compare(&l, &r, ">=", |o| o != std::cmp::Ordering::Less),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops handled in eval_binary"),
    }
}

fn numeric_op(
    l: &Value,
    r: &Value,
    symbol: &str,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Value {
    use Value::*;
    match (l, r) {
        (Integer(a), Integer(b)) => Integer(int_op(*a, *b)),
        (Integer(a), Float(b)) => Float(float_op(*a as f64, *b)),
        (Float(a), Integer(b)) => Float(float_op(*a, *b as f64)),
        (Float(a), Float(b)) => Float(float_op(*a, *b)),
        _ => unknown_op(symbol, l, r),
    }
}

fn compare(l: &Value, r: &Value, symbol: &str, accept: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    use Value::*;
    let ordering = match (l, r) {
        (Integer(a), Integer(b)) => a.partial_cmp(b),
        (Integer(a), Float(b)) => (*a as f64).partial_cmp(b),
        (Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Float(a), Float(b)) => a.partial_cmp(b),
        (Str(a), Str(b)) => Some(a.as_ref().cmp(b.as_ref())),
        _ => None,
    };
    match ordering {
        Some(o) => Value::Boolean(accept(o)),
        None => unknown_op(symbol, l, r),
    }
}

fn unknown_op(symbol: &str, l: &Value, r: &Value) -> Value {
    Value::Error(format!("unknown operator: {} {symbol} {}", l.type_name(), r.type_name()))
}

fn int_pow(base: i64, exp: i64) -> i64 {
    if exp < 0 {
        return 0;
    }
    let mut result: i64 = 1;
    let mut b = base;
    let mut e = exp as u64;
    while e > 0 {
        if e & 1 == 1 {
            result = result.wrapping_mul(b);
        }
        b = b.wrapping_mul(b);
        e >>= 1;
    }
    result
}

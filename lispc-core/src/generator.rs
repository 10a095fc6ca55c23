//! Lowering of the syntax tree into C++ text.
//!
//! Generation is a single pass that appends to two buffers: `header`
//! collects one `DEF(...)` record per function, `body` collects the
//! top-level statements. Nested forms that need their text on its own
//! (function bodies, `let` initializers) note the body length, emit,
//! then split the new suffix off again.
//!
//! `let` bindings are substituted, not stored: the initializer text is
//! repeated at every reference, so its side effects happen once per
//! reference when the program runs.

use std::fmt::Write as _;

use crate::ast::Node;
use crate::error::CoreError;
use crate::runtime::Runtime;
use crate::scope::{Scopes, Value};

const STATEMENT_SEPARATOR: &str = ",";

/// A function defined by the program, in the order the `defun` forms
/// were reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub name: String,
    pub generated: String,
    pub arity: usize,
}

/// Output of one generator run, before it is spliced into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    /// One `DECLARE(...)` per function, so records may refer to
    /// functions whose own record comes later.
    pub declarations: String,
    pub header: String,
    pub body: String,
    pub functions: Vec<FunctionSymbol>,
}

impl GeneratedCode {
    pub fn render(&self, runtime: &Runtime) -> String {
        let header = format!("{}{}", self.declarations, self.header);
        runtime.splice(&header, &self.body)
    }
}

/// Generate a complete C++ program using the bundled runtime.
pub fn generate(program: &Node) -> Result<String, CoreError> {
    generate_with_runtime(program, &Runtime::bundled())
}

pub fn generate_with_runtime(program: &Node, runtime: &Runtime) -> Result<String, CoreError> {
    let code = Generator::new().run(program)?;
    Ok(code.render(runtime))
}

#[derive(Debug, Default)]
pub struct Generator {
    declarations: String,
    header: String,
    body: String,
    scopes: Scopes,
    counter: usize,
    functions: Vec<FunctionSymbol>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a whole program. Consumes the generator so the name
    /// counter and root scope cannot leak into another compilation.
    pub fn run(mut self, program: &Node) -> Result<GeneratedCode, CoreError> {
        let Node::Program(expressions) = program else {
            return Err(CoreError::UnexpectedForm(format!(
                "expected a program but found {}",
                program.describe()
            )));
        };
        for expression in expressions {
            self.generate_expression(expression, false)?;
            self.body.push_str(STATEMENT_SEPARATOR);
        }
        Ok(GeneratedCode {
            declarations: self.declarations,
            header: self.header,
            body: self.body,
            functions: self.functions,
        })
    }

    fn generate_expression(&mut self, node: &Node, quoted: bool) -> Result<(), CoreError> {
        match node {
            Node::Integer(value) => {
                self.generate_integer(*value);
                Ok(())
            }
            Node::Floating(value) => {
                let _ = write!(self.body, "FLOAT({value:?})");
                Ok(())
            }
            Node::String(value) => {
                self.generate_string(value);
                Ok(())
            }
            Node::Identifier(name) => self.generate_identifier(name, quoted),
            Node::Keyword(name) => self.generate_keyword(name, quoted),
            Node::Quoted(inner) => self.generate_quoted(inner, quoted),
            Node::List(items) if quoted => self.generate_quoted_list(items),
            Node::List(items) => self.generate_form(items),
            Node::Program(_) => Err(CoreError::UnexpectedForm(
                "a program cannot be nested in an expression".to_string(),
            )),
        }
    }

    fn generate_integer(&mut self, value: i64) {
        if value == i64::MIN {
            // The positive half of i64::MIN does not fit a C++ literal.
            self.body.push_str("INT((-9223372036854775807LL - 1))");
        } else {
            let _ = write!(self.body, "INT({value})");
        }
    }

    fn generate_string(&mut self, value: &str) {
        self.body.push_str("STRING(\"");
        for ch in value.chars() {
            match ch {
                '"' => self.body.push_str("\\\""),
                '\\' => self.body.push_str("\\\\"),
                '\n' => self.body.push_str("\\n"),
                '\r' => self.body.push_str("\\r"),
                '\t' => self.body.push_str("\\t"),
                other => self.body.push(other),
            }
        }
        self.body.push_str("\")");
    }

    fn generate_symbol(&mut self, name: &str) {
        let _ = write!(self.body, "SYMBOL(\"{name}\")");
    }

    fn generate_identifier(&mut self, name: &str, quoted: bool) -> Result<(), CoreError> {
        if quoted {
            self.generate_symbol(name);
            return Ok(());
        }
        match self.scopes.get(name)? {
            Value::Expression(text) => {
                self.body.push_str(text);
                Ok(())
            }
            Value::Function(_) => Err(CoreError::UnexpectedFunctionValue(name.to_string())),
        }
    }

    fn generate_keyword(&mut self, name: &str, quoted: bool) -> Result<(), CoreError> {
        if quoted {
            self.generate_symbol(name);
            return Ok(());
        }
        match name {
            "nil" => self.body.push_str("NIL()"),
            "t" => self.body.push_str("T()"),
            other => return Err(CoreError::UnexpectedKeyword(other.to_string())),
        }
        Ok(())
    }

    fn generate_quoted(&mut self, inner: &Node, quoted: bool) -> Result<(), CoreError> {
        if !quoted {
            return self.generate_expression(inner, true);
        }
        self.body.push_str("QUOTED(");
        self.generate_expression(inner, true)?;
        self.body.push(')');
        Ok(())
    }

    fn generate_quoted_list(&mut self, items: &[Node]) -> Result<(), CoreError> {
        self.body.push_str("LIST(");
        for item in items {
            self.generate_expression(item, true)?;
            self.body.push(',');
        }
        self.body.push(')');
        Ok(())
    }

    /// A list in evaluated position: a call or a special form.
    fn generate_form(&mut self, items: &[Node]) -> Result<(), CoreError> {
        let Some((head, args)) = items.split_first() else {
            return Err(CoreError::UnexpectedForm(
                "empty list in call position".to_string(),
            ));
        };

        match head {
            Node::Identifier(name) => match self.scopes.get(name) {
                Ok(Value::Function(generated)) => {
                    let target = generated.clone();
                    self.generate_call(&target, args)
                }
                Ok(Value::Expression(_)) | Err(CoreError::SymbolNotFound(_)) => {
                    Err(CoreError::UnexpectedFunctionUse(name.clone()))
                }
                Err(err) => Err(err),
            },
            Node::Keyword(name) => {
                if let Some(target) = builtin_target(name) {
                    self.generate_call(target, args)
                } else if let ("defun", [fname, params, body]) = (name.as_str(), args) {
                    self.generate_defun(fname, params, body)
                } else if let ("let", [bindings, body]) = (name.as_str(), args) {
                    self.generate_let(bindings, body)
                } else {
                    Err(CoreError::UnexpectedForm(format!(
                        "({name} ...) with {} arguments",
                        args.len()
                    )))
                }
            }
            other => Err(CoreError::UnexpectedForm(format!(
                "{} in call position",
                other.describe()
            ))),
        }
    }

    /// Arity is not checked here; the runtime rejects bad calls.
    fn generate_call(&mut self, target: &str, args: &[Node]) -> Result<(), CoreError> {
        let _ = write!(self.body, "FUNC({target}, ");
        for arg in args {
            self.generate_expression(arg, false)?;
            self.body.push(',');
        }
        self.body.push(')');
        Ok(())
    }

    fn generate_defun(&mut self, name: &Node, params: &Node, body: &Node) -> Result<(), CoreError> {
        self.scopes.enter();
        let result = self.generate_defun_in_scope(name, params, body);
        self.scopes.leave();
        result
    }

    fn generate_defun_in_scope(
        &mut self,
        name: &Node,
        params: &Node,
        body: &Node,
    ) -> Result<(), CoreError> {
        let Node::Identifier(name) = name else {
            return Err(CoreError::InvalidFunctionName(name.describe()));
        };

        let generated = format!("L{}", self.counter);
        self.counter += 1;
        let _ = writeln!(self.declarations, "DECLARE({generated});");
        // Function names are global no matter how deeply the defun is nested.
        self.scopes
            .set(name, Value::Function(generated.clone()), true)?;

        let arity = match params {
            Node::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    let Node::Identifier(param) = item else {
                        return Err(CoreError::InvalidParameterList(name.clone()));
                    };
                    self.scopes
                        .set(param, Value::Expression(format!("ARG({index})")), false)?;
                }
                items.len()
            }
            params if params.is_keyword("nil") => 0,
            _ => return Err(CoreError::InvalidParameterList(name.clone())),
        };

        self.functions.push(FunctionSymbol {
            name: name.clone(),
            generated: generated.clone(),
            arity,
        });

        let body_text = self.capture(|generator| generator.generate_expression(body, false))?;
        let _ = writeln!(self.header, "DEF({generated},{arity},{body_text});");

        // As an expression, a defun evaluates to the function's name.
        self.generate_symbol(name);
        Ok(())
    }

    fn generate_let(&mut self, bindings: &Node, body: &Node) -> Result<(), CoreError> {
        self.scopes.enter();
        let result = self.generate_let_in_scope(bindings, body);
        self.scopes.leave();
        result
    }

    fn generate_let_in_scope(&mut self, bindings: &Node, body: &Node) -> Result<(), CoreError> {
        let Node::List(entries) = bindings else {
            return Err(CoreError::InvalidBinding(format!(
                "expected a binding list but found {}",
                bindings.describe()
            )));
        };

        // Each initializer already sees the bindings before it.
        for entry in entries {
            let (name, init) = match entry {
                Node::List(pair) => match pair.as_slice() {
                    [Node::Identifier(name), init] => (name, init),
                    _ => return Err(CoreError::InvalidBinding(entry.describe())),
                },
                _ => return Err(CoreError::InvalidBinding(entry.describe())),
            };
            let text = self.capture(|generator| generator.generate_expression(init, false))?;
            self.scopes.set(name, Value::Expression(text), false)?;
        }

        self.generate_expression(body, false)
    }

    /// Run `emit` and return what it appended to the body, leaving the
    /// body as it was before.
    fn capture(
        &mut self,
        emit: impl FnOnce(&mut Self) -> Result<(), CoreError>,
    ) -> Result<String, CoreError> {
        let mark = self.body.len();
        let result = emit(self);
        let text = self.body.split_off(mark);
        result.map(|()| text)
    }
}

fn builtin_target(name: &str) -> Option<&'static str> {
    let target = match name {
        "null" => "Null",
        "not" => "Not",
        "if" => "If",
        "car" => "Car",
        "cdr" => "Cdr",
        "cons" => "Cons",
        "list" => "List_",
        "progn" => "Progn",
        "print" => "Print",
        ">=" => "GreaterEqual",
        "<=" => "LessEqual",
        ">" => "Greater",
        "<" => "Less",
        "=" => "Equal",
        "/=" => "NotEqual",
        "+" => "Add",
        "-" => "Subtract",
        "*" => "Multiply",
        "/" => "Divide",
        _ => return None,
    };
    Some(target)
}

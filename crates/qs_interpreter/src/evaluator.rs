use std::rc::Rc;

use tracing::debug;

use qs_parser::{
    cursor::Cursor,
    span::{Span, WithSpan},
    token::{Keyword, Token, TokenKind},
};

use crate::{
    config::Config,
    environment::Environment,
    error::{EvalResult, InterpretationError},
    scan::{self, Nesting, ADDITIVE, MULTIPLICATIVE},
    value::{Function, Value},
};

/// Parses and evaluates in the same pass. Every parse routine returns the
/// value of the construct it just read; there is no syntax tree.
///
/// Loops and calls replay part of the token stream by moving the cursor back to
/// a bookmark, so a loop body is parsed again on every iteration.
///
/// Evaluation recurses on the native stack. The default limits in [`Config`]
/// fit in [`STACK_SIZE`](crate::STACK_SIZE).
pub struct Interpreter {
    cursor: Cursor,
    env: Environment,
    max_depth: usize,
    max_nesting: usize,
    call_depth: usize,
    nesting: usize,
}

impl Interpreter {
    /// A sandboxed interpreter: the environment starts empty.
    pub fn new(source: &str) -> Self {
        Self::with_config(source, &Config::default())
    }

    pub fn with_config(source: &str, config: &Config) -> Self {
        Self::with_environment(source, Environment::with_config(config), config)
    }

    /// Run `source` against an existing environment, e.g. the one a REPL keeps
    /// between lines. Functions defined by earlier runs stay callable. Only the
    /// limits are taken from `config`; the environment is not reseeded.
    pub fn with_environment(source: &str, env: Environment, config: &Config) -> Self {
        Interpreter {
            cursor: Cursor::from_source(source),
            env,
            max_depth: config.max_depth,
            max_nesting: config.max_nesting,
            call_depth: 0,
            nesting: 0,
        }
    }

    /// Evaluate the whole program and hand back the final symbol table.
    ///
    /// On failure the environment keeps every binding made before the error;
    /// inspect it with [`Interpreter::environment`].
    pub fn interpret(&mut self) -> EvalResult<&Environment> {
        while !self.cursor.is_at_end() {
            self.parse_expr()?;
        }
        Ok(&self.env)
    }

    /// Evaluate the whole program and return the value of the last top-level
    /// expression (nil for an empty program).
    pub fn run(&mut self) -> EvalResult<Value> {
        let mut result = Value::Nil;
        while !self.cursor.is_at_end() {
            result = self.parse_expr()?;
        }
        Ok(result)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_environment(self) -> Environment {
        self.env
    }

    // EXPR = ATOM (('*' | '/' | '%') ATOM)*
    fn parse_expr(&mut self) -> EvalResult<Value> {
        let mut left = self.parse_atom()?;
        while let Some(operator) = scan::current_operator(&self.cursor, MULTIPLICATIVE) {
            self.cursor.advance();
            let right = self.parse_atom()?;
            left = apply_operator(&operator, left, right)?;
        }
        Ok(left)
    }

    // ATOM = BASE (('+' | '-') BASE)*
    fn parse_atom(&mut self) -> EvalResult<Value> {
        let mut left = self.parse_base()?;
        while let Some(operator) = scan::current_operator(&self.cursor, ADDITIVE) {
            self.cursor.advance();
            let right = self.parse_base()?;
            left = apply_operator(&operator, left, right)?;
        }
        Ok(left)
    }

    fn parse_base(&mut self) -> EvalResult<Value> {
        let token = match self.cursor.current() {
            Some(token) => token.clone(),
            None => return Err(InterpretationError::expected("an expression", None)),
        };

        if self.nesting >= self.max_nesting {
            return Err(InterpretationError::nesting_too_deep(
                self.max_nesting,
                Some(token.span),
            ));
        }

        self.nesting += 1;
        let result = self.eval_base(token);
        self.nesting -= 1;
        result
    }

    fn eval_base(&mut self, token: WithSpan<Token>) -> EvalResult<Value> {
        match token.value.kind {
            TokenKind::Num => {
                self.cursor.advance();
                Ok(Value::Number(parse_number(&token.value.lexeme)))
            }
            TokenKind::Str => {
                self.cursor.advance();
                Ok(Value::String(token.value.lexeme))
            }
            TokenKind::Var => match token.value.keyword() {
                Some(Keyword::Call) => self.parse_call(),
                Some(Keyword::If) => self.parse_if(),
                Some(Keyword::For) => self.parse_for(),
                Some(Keyword::While) => self.parse_while(),
                Some(Keyword::Fn) => self.parse_fn(),
                Some(Keyword::Set) => self.parse_set(),
                Some(Keyword::Else) | None => {
                    self.cursor.advance();
                    self.lookup(&token.value.lexeme, token.span).cloned()
                }
            },
            TokenKind::Punct if token.value.is("(") => {
                let mut values = self.parse_list()?;
                values.pop().ok_or_else(|| {
                    InterpretationError::at("an empty list has no value", token.span)
                })
            }
            _ => Err(InterpretationError::expected("an expression", Some(&token))),
        }
    }

    /// LIST = '(' EXPR (','? EXPR)* ')' | '(' ')'
    ///
    /// Commas are optional so a list can hold several statements.
    fn parse_list(&mut self) -> EvalResult<Vec<Value>> {
        scan::expect_punct(&mut self.cursor, "(")?;

        let mut values = Vec::new();
        while !self.cursor.is_at_end() && !self.cursor.current_is_punct(")") {
            values.push(self.parse_expr()?);
            if self.cursor.current_is_punct(",") {
                self.cursor.advance();
            }
        }

        scan::expect_punct(&mut self.cursor, ")")?;
        Ok(values)
    }

    fn lookup(&self, name: &str, span: Span) -> EvalResult<&Value> {
        self.env
            .get(name)
            .ok_or_else(|| InterpretationError::identifier_not_found(name, span))
    }

    // call NAME LIST
    fn parse_call(&mut self) -> EvalResult<Value> {
        self.cursor.advance();
        let (name, span) = scan::expect_identifier(&mut self.cursor)?;

        let callee = self.lookup(&name, span)?.clone();
        if !callee.is_callable() {
            return Err(InterpretationError::not_callable(&name, &callee, span));
        }

        let arguments = self.parse_list()?;

        match callee {
            Value::Function(func) => self.call_function(&func, arguments, span),
            Value::Native(host) => match arguments.first() {
                Some(Value::String(code)) => host
                    .execute(code)
                    .map_err(|message| InterpretationError::at(message, span)),
                _ => Err(InterpretationError::at(
                    format!("`{}` expects a string of {} code", name, host.name()),
                    span,
                )),
            },
            other => Err(InterpretationError::not_callable(&name, &other, span)),
        }
    }

    /// Bind the parameters, replay the body, then put the cursor back after the call site.
    fn call_function(
        &mut self,
        func: &Function,
        arguments: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        if self.call_depth >= self.max_depth {
            return Err(InterpretationError::at(
                format!("maximum call depth of {} exceeded", self.max_depth),
                span,
            ));
        }

        debug!(name = %func.name, arguments = arguments.len(), "call");

        let mut arguments = arguments.into_iter();
        for parameter in &func.parameters {
            let value = arguments.next().unwrap_or(Value::Nil);
            self.env.set(parameter.clone(), value);
        }

        let return_to = std::mem::replace(&mut self.cursor, func.body.clone());
        self.call_depth += 1;
        let result = self.parse_list();
        self.call_depth -= 1;
        self.cursor = return_to;

        Ok(result?.pop().unwrap_or(Value::Nil))
    }

    // if EXPR LIST else LIST
    fn parse_if(&mut self) -> EvalResult<Value> {
        self.cursor.advance();
        let condition = self.parse_expr()?;

        let taken = if condition.is_truthy() {
            let values = self.parse_list()?;
            if self.cursor.current_keyword() == Some(Keyword::Else) {
                self.cursor.advance();
                scan::skip_list(&mut self.cursor)?;
            }
            values
        } else {
            scan::skip_list(&mut self.cursor)?;
            if self.cursor.current_keyword() == Some(Keyword::Else) {
                self.cursor.advance();
                self.parse_list()?
            } else {
                Vec::new()
            }
        };

        Ok(taken.into_iter().last().unwrap_or(Value::Number(0.0)))
    }

    // for INIT ; CONDITION ; INCREMENT LIST
    fn parse_for(&mut self) -> EvalResult<Value> {
        self.cursor.advance();
        self.parse_expr()?;
        scan::expect_punct(&mut self.cursor, ";")?;

        let start = self.cursor.bookmark();
        let mut result = Value::Nil;
        let mut iterations = 0usize;

        while self.parse_expr()?.is_truthy() {
            scan::expect_punct(&mut self.cursor, ";")?;
            self.parse_expr()?;
            result = self.parse_list()?.pop().unwrap_or(Value::Nil);
            iterations += 1;
            self.cursor.rewind(start);
        }

        // The condition was falsy: step over the increment and the body
        scan::expect_punct(&mut self.cursor, ";")?;
        scan::skip_expr(&mut self.cursor, Nesting::new(self.nesting, self.max_nesting))?;
        scan::skip_list(&mut self.cursor)?;

        debug!(iterations, "for loop finished");
        Ok(result)
    }

    // while CONDITION LIST
    fn parse_while(&mut self) -> EvalResult<Value> {
        self.cursor.advance();

        let start = self.cursor.bookmark();
        let mut result = Value::Nil;
        let mut iterations = 0usize;

        while self.parse_expr()?.is_truthy() {
            result = self.parse_list()?.pop().unwrap_or(Value::Nil);
            iterations += 1;
            self.cursor.rewind(start);
        }

        scan::skip_list(&mut self.cursor)?;

        debug!(iterations, "while loop finished");
        Ok(result)
    }

    // fn NAME ( PARAM, ... ) LIST
    fn parse_fn(&mut self) -> EvalResult<Value> {
        self.cursor.advance();
        let (name, _) = scan::expect_identifier(&mut self.cursor)?;

        scan::expect_punct(&mut self.cursor, "(")?;
        let mut parameters = Vec::new();
        while !self.cursor.is_at_end() && !self.cursor.current_is_punct(")") {
            let (parameter, _) = scan::expect_identifier(&mut self.cursor)?;
            parameters.push(parameter);
            if self.cursor.current_is_punct(",") {
                self.cursor.advance();
            } else {
                break;
            }
        }
        scan::expect_punct(&mut self.cursor, ")")?;

        // The body is only checked for its opening `(` when the function is called
        let body = self.cursor.clone();
        if self.cursor.current_is_punct("(") {
            scan::skip_list(&mut self.cursor)?;
        }

        debug!(%name, ?parameters, "defined function");
        self.env.set(
            name.clone(),
            Value::Function(Rc::new(Function {
                name,
                parameters,
                body,
            })),
        );

        Ok(Value::Nil)
    }

    // set NAME = EXPR
    fn parse_set(&mut self) -> EvalResult<Value> {
        self.cursor.advance();
        let (name, _) = scan::expect_identifier(&mut self.cursor)?;
        scan::expect_punct(&mut self.cursor, "=")?;

        let value = self.parse_expr()?;
        self.env.set(name, value);

        Ok(Value::Nil)
    }
}

/// Numeric lexemes are read like a float prefix: `1.2.3` is `1.2` and a lone
/// `.` is NaN.
fn parse_number(lexeme: &str) -> f64 {
    let end = lexeme
        .match_indices('.')
        .nth(1)
        .map(|(index, _)| index)
        .unwrap_or(lexeme.len());

    lexeme[..end].parse().unwrap_or(f64::NAN)
}

fn apply_operator(operator: &WithSpan<Token>, left: Value, right: Value) -> EvalResult<Value> {
    match (operator.value.lexeme.as_str(), &left, &right) {
        (op, Value::Number(l), Value::Number(r)) => {
            let (l, r) = (*l, *r);
            match op {
                "+" => Ok(Value::Number(l + r)),
                "-" => Ok(Value::Number(l - r)),
                "*" => Ok(Value::Number(l * r)),
                "/" => Ok(Value::Number(l / r)),
                "%" => Ok(Value::Number(l % r)),
                _ => Err(InterpretationError::invalid_operands(operator, &left, &right)),
            }
        }
        ("+", Value::String(_), _) | ("+", _, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", left, right)))
        }
        _ => Err(InterpretationError::invalid_operands(operator, &left, &right)),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::{
        config::{Config, STACK_SIZE},
        environment::Environment,
        error::InterpretationError,
        evaluator::{parse_number, Interpreter},
        host::Host,
        value::Value,
    };

    #[test]
    fn eval_number_expression() {
        let tests = vec![
            ("5", 5.0),
            ("10.5", 10.5),
            ("5 + 5 + 5 + 5 - 10", 10.0),
            ("2 * 2 * 2 * 2 * 2", 32.0),
            ("10 - 2 - 3", 5.0),
            ("20 / 2 / 5", 2.0),
            ("17 % 5", 2.0),
            // Additive binds tighter than multiplicative
            ("2 + 3 * 4", 20.0),
            ("2 * 3 + 4", 14.0),
            ("10 - 4 / 2 + 1", 2.0),
            ("1 + 2 % 2", 1.0),
            ("(2 * 3) + 4", 10.0),
            ("2 + (3 * 4)", 14.0),
            ("0.1 + 0.2", 0.1 + 0.2),
        ];

        for (input, expected_value) in tests {
            test_number_value(evaluate(input), expected_value);
        }
    }

    #[test]
    fn eval_number_edge_cases() {
        assert!(matches!(evaluate("1 / 0"), Value::Number(v) if v == f64::INFINITY));
        assert!(matches!(evaluate("1 % 0"), Value::Number(v) if v.is_nan()));
        assert!(matches!(evaluate("."), Value::Number(v) if v.is_nan()));
        test_number_value(evaluate("1.2.3"), 1.2);
    }

    #[test]
    fn parse_number_prefix() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("5."), 5.0);
        assert_eq!(parse_number("3.14.15"), 3.14);
        assert!(parse_number("..").is_nan());
    }

    #[test]
    fn eval_string_expression() {
        let tests = vec![
            ("'hello'", "hello"),
            ("\"hello\" + ' ' + `world`", "hello world"),
            ("'n = ' + 5", "n = 5"),
            ("1 + 2 + 'x'", "3x"),
            ("'x' + 1 + 2", "x12"),
            ("'' + 0.5", "0.5"),
        ];

        for (input, expected_value) in tests {
            test_string_value(evaluate(input), expected_value);
        }
    }

    #[test]
    fn eval_set_and_lookup() {
        let tests = vec![
            ("set x = 5 x", 5.0),
            ("set x = 5 set x = 7 x", 7.0),
            ("set x = 2 set y = x * 3 y", 6.0),
            ("set x = 1 set x = x + 1 x", 2.0),
        ];

        for (input, expected_value) in tests {
            test_number_value(evaluate(input), expected_value);
        }

        test_nil_value(evaluate("set x = 5"));
    }

    #[test]
    fn eval_list_expression() {
        test_number_value(evaluate("(1, 2, 3)"), 3.0);
        test_number_value(evaluate("(set a = 4 a * 2)"), 8.0);
        test_number_value(evaluate("((1, 2) + 1) * 2"), 6.0);
    }

    #[test]
    fn eval_if_else_expression() {
        let tests = vec![
            ("if 1 (10) else (20)", 10.0),
            ("if 0 (10) else (20)", 20.0),
            ("if 0 (10)", 0.0),
            ("if 1 (10)", 10.0),
            ("if 'text' (1) else (2)", 1.0),
            ("if '' (1) else (2)", 2.0),
            ("if 2 - 2 (1) else (2)", 2.0),
            ("if 1 (1, 2, 3) else (4)", 3.0),
            ("if 1 () else (4)", 0.0),
            ("if 1 (if 0 (1) else (2)) else (3)", 2.0),
            ("if 1 (5) else (6) + 1", 6.0),
        ];

        for (input, expected_value) in tests {
            test_number_value(evaluate(input), expected_value);
        }
    }

    #[test]
    fn if_skips_untaken_branch() {
        let env = interpret("set a = 0 set b = 0 if 1 (set a = 1) else (set b = 1)");
        test_number_value(env.get("a").cloned().unwrap(), 1.0);
        test_number_value(env.get("b").cloned().unwrap(), 0.0);

        let env = interpret("set a = 0 set b = 0 if 0 (set a = 1) else (set b = 1)");
        test_number_value(env.get("a").cloned().unwrap(), 0.0);
        test_number_value(env.get("b").cloned().unwrap(), 1.0);

        // Undefined names in the skipped branch are never looked up
        test_number_value(evaluate("if 0 (call missing(nope)) else (3)"), 3.0);
    }

    #[test]
    fn eval_while_expression() {
        let env = interpret("set n = 5 set total = 0 while n (set total = total + n set n = n - 1)");
        test_number_value(env.get("n").cloned().unwrap(), 0.0);
        test_number_value(env.get("total").cloned().unwrap(), 15.0);

        test_number_value(evaluate("set n = 3 while n (set n = n - 1, n * 10)"), 0.0);
        test_number_value(
            evaluate("set n = 3 set k = 0 while n (set n = n - 1 set k = k + 1 k * 10)"),
            30.0,
        );
        test_nil_value(evaluate("set n = 3 while n (set n = n - 1)"));
    }

    #[test]
    fn eval_for_expression() {
        let env = interpret("set total = 0 for set i = 0; 5 - i; set i = i + 1 (set total = total + i)");
        // The increment runs before the body
        test_number_value(env.get("total").cloned().unwrap(), 15.0);
        test_number_value(env.get("i").cloned().unwrap(), 5.0);

        test_number_value(evaluate("for set i = 0; 3 - i; set i = i + 1 (i * 2)"), 6.0);
        test_number_value(evaluate("for set i = 0; 3 - i; set i = i + 1 (i) + 100"), 103.0);
    }

    #[test]
    fn loops_false_on_entry_never_run_body() {
        let env = interpret("set hits = 0 while 0 (set hits = hits + 1) set after = 1");
        test_number_value(env.get("hits").cloned().unwrap(), 0.0);
        test_number_value(env.get("after").cloned().unwrap(), 1.0);

        let env = interpret("set hits = 0 for set i = 0; 0; set i = i + 1 (set hits = 1) set after = 2");
        test_number_value(env.get("hits").cloned().unwrap(), 0.0);
        // Neither the increment nor the body ran
        test_number_value(env.get("i").cloned().unwrap(), 0.0);
        test_number_value(env.get("after").cloned().unwrap(), 2.0);

        test_nil_value(evaluate("while 0 (1)"));
        test_nil_value(evaluate("for 0; 0; 0 (1)"));
    }

    #[test]
    fn eval_function_definition() {
        test_nil_value(evaluate("fn add(a, b) (a + b)"));

        let env = interpret("fn add(a, b) (a + b)");
        match env.get("add") {
            Some(Value::Function(func)) => {
                assert_eq!(func.name, "add");
                assert_eq!(func.parameters, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected function binding but got {:?}", other),
        }

        // The body is not evaluated at definition time
        let env = interpret("set hit = 0 fn f() (set hit = 1)");
        test_number_value(env.get("hit").cloned().unwrap(), 0.0);
    }

    #[test]
    fn eval_call_expression() {
        let tests = vec![
            ("fn add(a, b) (a + b) call add(3, 4)", 7.0),
            ("fn add(a, b) (a + b) call add(3, 4) * 2", 14.0),
            ("fn add(a, b) (a + b) fn add(a, b) (a * b) call add(3, 4)", 12.0),
            ("fn one() (1) call one()", 1.0),
            ("fn twice(x) (set y = x * 2, y) call twice(21)", 42.0),
            ("fn inc(x) (x + 1) call inc(call inc(1))", 3.0),
            ("fn first(a) (a) call first(1, 2, 3)", 1.0),
            (
                "fn countdown(n) (if n (call countdown(n - 1)) else (99)) call countdown(5)",
                99.0,
            ),
        ];

        for (input, expected_value) in tests {
            test_number_value(evaluate(input), expected_value);
        }

        test_nil_value(evaluate("fn id(a) (a) call id()"));
        test_nil_value(evaluate("fn nothing() () call nothing()"));
    }

    #[test]
    fn functions_see_global_rebinding() {
        let tests = vec![
            ("set x = 5 fn getx() (x) set x = 7 call getx()", 7.0),
            // Parameters overwrite globals of the same name for good
            ("set a = 1 fn f(a) (a) call f(9) a", 9.0),
        ];

        for (input, expected_value) in tests {
            test_number_value(evaluate(input), expected_value);
        }
    }

    #[test]
    fn call_returns_to_call_site() {
        let env = interpret("fn f() (1) set r = call f() + 1 set after = 2");
        test_number_value(env.get("r").cloned().unwrap(), 2.0);
        test_number_value(env.get("after").cloned().unwrap(), 2.0);
    }

    #[test]
    fn functions_survive_between_runs() {
        let mut first = Interpreter::new("fn add(a, b) (a + b)");
        first.interpret().unwrap();

        let env = first.into_environment();
        let mut second = Interpreter::with_environment("call add(2, 3)", env, &Config::default());
        test_number_value(second.run().unwrap(), 5.0);
    }

    #[test]
    fn interpret_returns_symbol_table() {
        let env = interpret("set x = 1 set y = 'two' fn f() (x)");
        let names: Vec<&str> = env.bindings().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["f", "x", "y"]);
    }

    #[test]
    fn host_binding() {
        struct Echo {
            seen: RefCell<Vec<String>>,
        }

        impl Host for Echo {
            fn name(&self) -> &str {
                "echo"
            }

            fn execute(&self, code: &str) -> Result<Value, String> {
                self.seen.borrow_mut().push(code.to_owned());
                if code == "fail" {
                    Err("host refused".to_string())
                } else {
                    Ok(Value::String(code.to_uppercase()))
                }
            }
        }

        let host = Rc::new(Echo {
            seen: RefCell::new(Vec::new()),
        });
        let config = Config::with_host(host.clone());

        let result = Interpreter::with_config("call sh_raw('abc') + '!'", &config).run();
        assert_eq!(result, Ok(Value::from("ABC!")));
        assert_eq!(*host.seen.borrow(), vec!["abc".to_string()]);

        let err = Interpreter::with_config("call sh_raw('fail')", &config)
            .run()
            .unwrap_err();
        assert_eq!(err.message, "host refused");

        let err = Interpreter::with_config("call sh_raw(1)", &config)
            .run()
            .unwrap_err();
        assert_eq!(err.message, "`sh_raw` expects a string of echo code");

        // Sandboxed by default
        let err = Interpreter::new("call sh_raw('abc')").run().unwrap_err();
        assert_eq!(err.message, "identifier 'sh_raw' not found");
    }

    #[test]
    fn error_handling() {
        let tests = vec![
            ("foobar", "identifier 'foobar' not found (at 0:6)"),
            ("call nope(1)", "identifier 'nope' not found (at 5:9)"),
            ("set x = 1 call x()", "`x` is not callable: it is bound to `number` (1) (at 15:16)"),
            ("()", "an empty list has no value (at 0:1)"),
            ("'a' - 'b'", "unsupported operand type(s) for - operator: `string` (\"a\") and `string` (\"b\") (at 4:5)"),
            ("fn f() (1) f * 2", "unsupported operand type(s) for * operator: `function` (fn f()) and `number` (2) (at 13:14)"),
            ("set = 5", "expected identifier, got `=` (at 4:5)"),
            ("set x 5", "expected `=`, got `5` (at 6:7)"),
            ("(1, 2", "expected `)`, got EOF"),
            ("1 +", "expected an expression, got EOF"),
            (")", "expected an expression, got `)` (at 0:1)"),
            ("if 1 (1) else", "expected `(`, got EOF"),
            ("fn f(1) (1)", "expected identifier, got `1` (at 5:6)"),
            ("fn f() 5 call f()", "expected `(`, got `5` (at 7:8)"),
            ("for set i = 0 i (i)", "expected `;`, got `i` (at 14:15)"),
        ];

        for (input, expected_message) in tests {
            let err = evaluate_err(input);
            assert_eq!(err.to_string(), expected_message, "input: {}", input);
        }
    }

    #[test]
    fn deep_recursion_within_default_limits() {
        on_large_stack(|| {
            test_number_value(
                evaluate("fn down(n) (if n (call down(n - 1)) else (7)) call down(500)"),
                7.0,
            );

            let err = evaluate_err("fn f() (call f()) call f()");
            assert_eq!(err.to_string(), "maximum call depth of 1000 exceeded (at 13:14)");
        });
    }

    #[test]
    fn configured_call_depth_is_enforced() {
        let config = Config::default().max_depth(10);
        let down = |n: usize| {
            let source = format!("fn down(n) (if n (call down(n - 1)) else (0)) call down({})", n);
            Interpreter::with_config(&source, &config).run()
        };

        // down(9) makes ten calls, down(10) eleven
        assert_eq!(down(9), Ok(Value::Number(0.0)));
        assert_eq!(
            down(10).unwrap_err().to_string(),
            "maximum call depth of 10 exceeded (at 23:27)"
        );

        // A kept environment runs under the limits of the config it is resumed with
        let mut interpreter =
            Interpreter::with_config("fn down(n) (if n (call down(n - 1)) else (0))", &config);
        interpreter.interpret().unwrap();
        let env = interpreter.into_environment();
        let mut again = Interpreter::with_environment("call down(9)", env, &config.max_depth(5));
        assert_eq!(
            again.run().unwrap_err().to_string(),
            "maximum call depth of 5 exceeded (at 23:27)"
        );
    }

    #[test]
    fn deep_nesting_is_an_error() {
        on_large_stack(|| {
            let nested = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
            let err = evaluate_err(&nested);
            assert_eq!(err.to_string(), "maximum nesting depth of 5000 exceeded (at 5000:5001)");

            let shallow = format!("{}1{}", "(".repeat(400), ")".repeat(400));
            test_number_value(evaluate(&shallow), 1.0);
        });
    }

    #[test]
    fn configured_nesting_is_enforced() {
        let config = Config::default().max_nesting(50);
        let run = |source: String| Interpreter::with_config(&source, &config).run();

        let err = run(format!("{}1{}", "(".repeat(100), ")".repeat(100))).unwrap_err();
        assert_eq!(err.to_string(), "maximum nesting depth of 50 exceeded (at 50:51)");

        let err = run(format!("{}1", "set a = ".repeat(100))).unwrap_err();
        assert_eq!(err.to_string(), "maximum nesting depth of 50 exceeded (at 400:403)");

        // The increment of a loop that never runs is skipped under the same limit
        let err = run(format!("for 0; 0; {}1 ()", "set a = ".repeat(100))).unwrap_err();
        assert_eq!(err.to_string(), "maximum nesting depth of 50 exceeded (at 402:405)");

        assert_eq!(run(format!("{}1{}", "(".repeat(49), ")".repeat(49))), Ok(Value::Number(1.0)));
    }

    #[test]
    fn failure_keeps_earlier_bindings() {
        let mut interpreter = Interpreter::new("set a = 1 set b = missing set c = 3");
        assert!(interpreter.interpret().is_err());

        let env = interpreter.environment();
        test_number_value(env.get("a").cloned().unwrap(), 1.0);
        assert!(!env.contains("b"));
        assert!(!env.contains("c"));
    }

    #[test]
    fn not_callable_leaves_arguments_unevaluated() {
        let mut interpreter = Interpreter::new("set x = 1 call x(set y = 2)");
        assert!(interpreter.interpret().is_err());
        assert!(!interpreter.environment().contains("y"));
    }

    fn evaluate(input: &str) -> Value {
        match Interpreter::new(input).run() {
            Ok(value) => value,
            Err(err) => panic!("evaluating '{}' failed: {}", input, err),
        }
    }

    fn evaluate_err(input: &str) -> InterpretationError {
        match Interpreter::new(input).run() {
            Ok(value) => panic!("expected '{}' to fail but got {:?}", input, value),
            Err(err) => err,
        }
    }

    fn interpret(input: &str) -> Environment {
        let mut interpreter = Interpreter::new(input);
        if let Err(err) = interpreter.interpret() {
            panic!("interpreting '{}' failed: {}", input, err);
        }
        interpreter.into_environment()
    }

    /// Run `test` on a thread with the stack the default limits are sized for.
    fn on_large_stack(test: impl FnOnce() + Send + 'static) {
        std::thread::Builder::new()
            .stack_size(STACK_SIZE)
            .spawn(test)
            .unwrap()
            .join()
            .unwrap();
    }

    fn test_number_value(value: Value, expected_value: f64) {
        match value {
            Value::Number(number) => {
                if number != expected_value {
                    panic!(
                        "expected number value {} but got {:?}",
                        expected_value, value
                    )
                }
            }
            _ => panic!("expected number value but got {:?}", value),
        }
    }

    fn test_string_value(value: Value, expected_value: &str) {
        match &value {
            Value::String(string) => {
                if string != expected_value {
                    panic!(
                        "expected string value {} but got {:?}",
                        expected_value, value
                    )
                }
            }
            _ => panic!("expected string value but got {:?}", value),
        }
    }

    fn test_nil_value(value: Value) {
        match value {
            Value::Nil => {}
            _ => panic!("expected nil value but got {:?}", value),
        }
    }
}

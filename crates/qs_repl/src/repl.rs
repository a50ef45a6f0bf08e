use rustyline::error::ReadlineError;
use rustyline::Editor;

use qs_interpreter::{Config, Environment, Interpreter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn repl(config: &Config) {
    println!("qs language v{}", VERSION);

    // Taken out for each line and put back afterwards, even when the line fails
    let mut env = Environment::with_config(config);

    // `()` can be used when no completer is required
    let mut rl = Editor::<()>::new();
    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                if line.trim() == "exit" || line.trim() == "quit" {
                    break;
                }
                // Skip empty lines
                else if line.trim().is_empty() {
                    continue;
                }

                rl.add_history_entry(line.as_str());

                if line.trim() == ":env" {
                    print_environment(&env);
                    continue;
                }

                let mut interpreter = Interpreter::with_environment(&line, env, config);
                match interpreter.run() {
                    Ok(value) => println!("{}", value.to_code_string()),
                    Err(err) => println!("Error: {}", err),
                }
                env = interpreter.into_environment();
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
}

/// One `name = value` line per binding, sorted by name
pub fn print_environment(env: &Environment) {
    for (name, value) in env.bindings() {
        println!("{} = {}", name, value.to_code_string());
    }
}

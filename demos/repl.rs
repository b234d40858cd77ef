use diylang::ast::Value;
use diylang::{Environment, Error, interpret, interpret_file, parse_multiple};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::env;
use std::panic;
use std::process;
use tracing_subscriber::EnvFilter;

mod colors {
    pub const RED: &str = "\x1b[31m";
    pub const FADED: &str = "\x1b[0m\x1b[2m";
    pub const RESET: &str = "\x1b[0m";
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn use_colors() -> bool {
    env::var_os("ANSI_COLORS_DISABLED").is_none()
}

fn colored(text: &str, color: &str) -> String {
    if use_colors() {
        format!("{color}{text}{}", colors::RESET)
    } else {
        text.to_owned()
    }
}

fn faded(text: &str) -> String {
    colored(text, colors::FADED)
}

fn print_error(e: &Error) {
    println!("{} {}", colored("!", colors::RED), faded(&format!("{}:", e.kind())));
    println!("{e}");
}

/// What the text typed so far amounts to
#[derive(Debug, PartialEq, Eq)]
enum Pending {
    /// Only whitespace and comments
    Blank,
    /// An expression that is still open
    More,
    /// Something to hand to the interpreter, possibly an error
    Ready,
}

fn pending_input(source: &str) -> Pending {
    match parse_multiple(source) {
        Ok(exprs) if exprs.is_empty() => Pending::Blank,
        Err(e) if e.is_incomplete() => Pending::More,
        _ => Pending::Ready,
    }
}

fn run_repl() {
    println!();
    println!("    Welcome to the DIY Lang REPL");
    println!("{}", faded("  use ^D to exit, :help for commands"));
    println!();

    let env = Environment::new();

    for path in env::args().skip(1) {
        match interpret_file(&path, Some(&env)) {
            Ok(_) => println!("{}", faded(&format!("loaded {path}"))),
            Err(e) => {
                println!("{}", faded(&format!("while loading {path}")));
                print_error(&e);
            }
        }
    }

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            process::exit(1);
        }
    };

    let mut source = String::new();

    loop {
        let prompt = if source.is_empty() { "> " } else { "… " };

        match rl.readline(&faded(prompt)) {
            Ok(line) => {
                if source.is_empty() {
                    match line.trim() {
                        "" => continue,
                        ":help" => {
                            print_help();
                            continue;
                        }
                        ":env" => {
                            print_environment(&env);
                            continue;
                        }
                        ":quit" | ":exit" => break,
                        _ => {}
                    }
                }

                source.push_str(&line);
                source.push('\n');

                match pending_input(&source) {
                    Pending::Blank => {
                        source.clear();
                        continue;
                    }
                    // Keep reading lines until the expression is closed
                    Pending::More => continue,
                    Pending::Ready => {}
                }

                match interpret(&source, Some(&env)) {
                    Ok(result) => println!("{result}"),
                    Err(e) => print_error(&e),
                }

                let _ = rl.add_history_entry(source.trim());
                source.clear();
            }

            Err(ReadlineError::Interrupted) => {
                source.clear();
                println!(
                    "{} Interrupted. {}",
                    colored("!", colors::RED),
                    faded("(Use ^D to exit)")
                );
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }

    println!("{}", faded("Bye! o/"));
}

fn print_help() {
    println!("DIY Lang REPL:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  Ctrl+C     - Discard the expression being typed");
    println!("  Ctrl+D     - Exit the interpreter");
    println!();
    println!("Files given on the command line are loaded before the prompt.");
    println!();
    println!("Special forms:");
    println!("  quote atom eq if define let defn lambda cond");
    println!("  cons head tail empty");
    println!("  + - * / mod >");
    println!();
    println!("Examples:");
    println!("  (define square (lambda (x) (* x x)))");
    println!("  (square 5)");
    println!("  (let ((x 1) (y (+ x 1))) (+ x y))");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    // Separate functions from plain values
    let mut functions = Vec::new();
    let mut values = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Closure(_) => functions.push((name, value)),
            _ => values.push((name, value)),
        }
    }

    if !functions.is_empty() {
        println!("Functions ({}):", functions.len());
        for (name, value) in functions {
            println!("  {name:<15} {value}");
        }
    }

    if !values.is_empty() {
        println!("Values ({}):", values.len());
        for (name, value) in values {
            println!("  {name} = {value}");
        }
    }
}

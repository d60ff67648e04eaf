use liteshell::Interpreter;
use liteshell::config::{Options, ShellConfig};
use liteshell::logging::init_tracing;
use std::io::Write;
use std::sync::Arc;

fn main() {
    let options: Options = argh::from_env();
    let config = ShellConfig::from_options(options);
    init_tracing(&config);

    let shell = match Interpreter::with_builtins() {
        Ok(shell) => Arc::new(shell),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let code = match &config.command {
        Some(line) => {
            let mut stdout = std::io::stdout();
            let code = shell.execute_reporting(line, &mut stdout);
            let _ = stdout.flush();
            code
        }
        None => shell.run_repl(&config).unwrap_or_else(|e| {
            eprintln!("error: {:#}", e);
            1
        }),
    };
    shell.wait_background();
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}

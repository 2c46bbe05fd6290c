use clap::Parser;
use lox_treewalk::{
    printer,
    scanner::Scanner,
    Error, ErrorKind, STACK_SIZE,
};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process,
    thread,
};

/// Runs a Lox script.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the script to run.
    script: PathBuf,

    /// Print the token stream instead of running the script.
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the parsed syntax tree instead of running the script.
    #[arg(long)]
    ast: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let source = match fs::read_to_string(&args.script) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read '{}': {}", args.script.display(), e);
            process::exit(74);
        },
    };
    log::debug!("read {} bytes from {}", source.len(), args.script.display());

    let worker = thread::Builder::new()
        .name("lox".into())
        .stack_size(STACK_SIZE)
        .spawn(move || run_script(&args, &source));

    let code = match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => 70,
        Err(e) => {
            eprintln!("Could not start the interpreter thread: {}", e);
            74
        },
    };
    process::exit(code);
}

fn run_script(args: &Args, source: &str) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if args.tokens {
        dump_tokens(source, &mut out)
    } else if args.ast {
        dump_ast(source, &mut out)
    } else {
        lox_treewalk::run(source, &mut out)
    };
    let result = result.and_then(|()| out.flush().map_err(Error::from));

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            exit_code(&e)
        },
    }
}

fn dump_tokens(source: &str, out: &mut impl Write) -> lox_treewalk::Result<()> {
    for token in Scanner::new(source).scan_tokens()? {
        writeln!(out, "{}", token)?;
    }
    Ok(())
}

fn dump_ast(source: &str, out: &mut impl Write) -> lox_treewalk::Result<()> {
    for statement in lox_treewalk::parse(source)? {
        writeln!(out, "{}", printer::print_stmt(&statement))?;
    }
    Ok(())
}

fn exit_code(e: &Error) -> i32 {
    match e.kind() {
        ErrorKind::Io(_) => 74,
        _ if e.is_runtime_error() => 70,
        _ => 65,
    }
}

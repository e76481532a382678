use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rox as lox;

use clap::Parser as ClapParser;
use clap::Subcommand;

use lox::ast_printer::AstPrinter;
use lox::error::ErrorReporter;
use lox::lox::Lox;
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::token::{Token, TokenType};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes the provided input from a given valid filepath
    Tokenize { filename: PathBuf },

    /// Parses the provided input and prints the program in prefix form
    Parse { filename: PathBuf },

    /// Runs a script, or starts the REPL when no filepath is given
    Run { filename: Option<PathBuf> },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::try_parse().unwrap_or_else(|e| {
        // The host reserves 64 for usage errors.
        let _ = e.print();
        std::process::exit(64);
    });

    match args.commands {
        Commands::Tokenize { filename } => tokenize(&filename)?,

        Commands::Parse { filename } => parse(&filename)?,

        Commands::Run { filename } => match filename {
            Some(filename) => run_file(&filename)?,

            None => run_prompt()?,
        },
    }

    Ok(())
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
    reader.read_to_end(&mut buf)?;

    Ok(String::from_utf8(buf)?)
}

fn tokenize(filename: &Path) -> anyhow::Result<()> {
    let source: String = read_source(filename)?;

    let mut tokenized = true;

    for token in Scanner::new(source.as_bytes()) {
        match token {
            Ok(token) => {
                if token.token_type != TokenType::COMMENT {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        std::process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path) -> anyhow::Result<()> {
    let source: String = read_source(filename)?;

    let mut reporter: ErrorReporter = ErrorReporter::new();
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => {
                if token.token_type != TokenType::COMMENT {
                    tokens.push(token);
                }
            }

            Err(e) => reporter.error(&e),
        }
    }

    let mut next_id: usize = 0;
    let statements = Parser::new(tokens, &mut reporter, &mut next_id).parse();

    if reporter.had_error() {
        std::process::exit(65);
    }

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    Ok(())
}

fn run_file(filename: &Path) -> anyhow::Result<()> {
    let source: String = read_source(filename)?;

    let mut output = io::stdout();
    let mut lox: Lox<'_, _> = Lox::new(&mut output);

    lox.run(&source);

    if lox.had_error() {
        std::process::exit(65);
    }

    if lox.had_runtime_error() {
        std::process::exit(70);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut output = io::stdout();
    let mut lox: Lox<'_, _> = Lox::new(&mut output);

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        // Prompt on stderr so piped output stays clean.
        eprint!("> ");
        io::stderr().flush()?;

        line.clear();

        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        // One bad line must not poison the next; runtime errors never end
        // the session.
        lox.reset_error();
        lox.run(&line);
    }

    Ok(())
}

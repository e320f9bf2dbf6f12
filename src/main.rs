use std::io;
use std::{env, process};

use monkey_lang::{repl, Monkey};

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        n if n > 2 => {
            println!("Usage: monkey [script]");
            process::exit(64);
        },
        2 => {
            let mut stdout = io::stdout();
            Monkey::new(&mut stdout).run_file(&args[1]);
        },
        _ => {
            match env::var("USER") {
                Ok(user) => println!("Hello {user}! This is the Monkey programming language."),
                Err(_) => println!("This is the Monkey programming language."),
            }
            println!("Feel free to type in commands.");

            if let Err(error) = repl::start() {
                eprintln!("{error}");
                process::exit(74);
            }
        },
    };
}

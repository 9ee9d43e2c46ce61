//! Interactive front-end: reads a line, hands it to the command layer, prints the result.

use std::io::{self, BufRead, Write};

use flatfs::{execute, FileSystem};

mod logger;

const PROMPT: &str = "flatfs> ";

fn main() {
    logger::init();

    let mut fs = FileSystem::new();
    let mut lines = io::stdin().lock().lines();

    loop {
        print!("{}", PROMPT);
        // A failed flush only delays the prompt.
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("failed to read command: {}", e);
                break;
            }
            None => break,
        };

        let Some(command) = line.split_whitespace().next() else {
            continue;
        };
        if command == "quit" || command == "exit" {
            break;
        }

        match execute(&mut fs, &line) {
            Ok(Some(output)) => print!("{}", output),
            Ok(None) => println!("{}: Command not found.", command),
            Err(e) => println!("{}: {}", command, e),
        }
    }
}

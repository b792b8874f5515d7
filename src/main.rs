use call_session::config::{Cli, Command};
use call_session::{client, server};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Call(args) => {
            println!("Starting call session...");
            match client::main(args) {
                Ok(_) => println!("Call session completed"),
                Err(e) => {
                    println!("Call session error:\n{:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Server(args) => {
            println!("Starting credential server...");
            if let Err(e) = server::main(args) {
                println!("Server error:\n{:#}", e);
                std::process::exit(1);
            }
        }
    }
}

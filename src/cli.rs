use clap::{Parser, Subcommand};
use inquire::Text;

use crate::models::command::CommandOutcome;
use crate::runtime::Components;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single command and print the assistant's reply.
    Command {
        text: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Interactive prompt loop; type "exit" to leave.
    Repl {},
}

pub async fn cli(components: Components) {
    // Fine to panic here
    let cli = Cli::parse();
    match cli.command {
        Commands::Command { text, user } => {
            let user_id = user.unwrap_or_else(|| components.default_user.clone());
            let outcome = components.engine.handle_command(&user_id, &text).await;
            print_outcome(&outcome);
        }
        Commands::Repl {} => {
            repl(&components).await;
        }
    }
}

async fn repl(components: &Components) {
    println!("Executive assistant. Try \"Summarize last week\", \"Schedule a meeting tomorrow at 3 PM\", or \"When am I free today?\".");
    loop {
        let line = match specify_command() {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        let outcome = components
            .engine
            .handle_command(&components.default_user, trimmed)
            .await;
        print_outcome(&outcome);
    }
}

fn print_outcome(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::EventCreated { event_id, message } => {
            println!("{}", message);
            println!("Event created successfully: {}", event_id);
        }
        CommandOutcome::Summary(text) => println!("{}", text),
        CommandOutcome::Question(text) => println!("{}", text),
        CommandOutcome::Message(text) => println!("{}", text),
        CommandOutcome::Error(text) => println!("Error: {}", text),
    }
}

fn specify_command() -> Result<String, Box<dyn std::error::Error>> {
    Ok(Text::new("Ask your assistant.").prompt()?)
}

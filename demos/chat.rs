//! Example: Interactive chat with Gemini
//!
//! Needs `GEMINI_API_KEY` in the environment or in a `.env` file.
//! Prefix a message with `/search ` to ask with Google Search grounding.

use nook_gemini::{create_client, ChatOptions, ConfigOverrides};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut client = create_client(None, ConfigOverrides::new().temperature(0.7))?;
    client.create_chat(ChatOptions::default());
    println!("Chat session created with {}.\n", client.config().model);

    println!("=== Gemini Chat ===");
    println!("Type your message and press Enter. Type 'quit' to exit.");
    println!("Start a message with '/search ' to ground the answer in Google Search.\n");

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        let result = match input.strip_prefix("/search ") {
            Some(question) => client.chat_with_search(question.trim(), None).await,
            None => client.send_message(input).await,
        };

        match result {
            Ok(response) => {
                println!("\nGemini: {}\n", response);
            }
            Err(e) => {
                eprintln!("\nError: {}\n", e);
            }
        }
    }

    Ok(())
}

use std::future;
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use llmchat::chat::{ChatClient, TurnOutcome};
use llmchat::models::message::MessageDraft;
use llmchat::settings::Settings;
use llmchat::store::ConversationStore;

use crate::commands::{parse_input, Command, HELP};
use crate::render::{conversation_line, print_markdown, stats_line, StreamPrinter};

/// An interactive chat over one conversation store
pub struct Session {
    client: ChatClient,
    store: ConversationStore,
    settings: Settings,
    state_file: PathBuf,
}

impl Session {
    pub fn new(
        client: ChatClient,
        store: ConversationStore,
        settings: Settings,
        state_file: PathBuf,
    ) -> Self {
        Self {
            client,
            store,
            settings,
            state_file,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        println!(
            "llmchat {} {}",
            style(&self.settings.model).cyan(),
            style("- type \"exit\" to end the session, /help for commands").dim()
        );
        println!();

        loop {
            let line: String = match cliclack::input("Message:").placeholder("").interact() {
                Ok(line) => line,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => break,
                Err(err) => return Err(err.into()),
            };

            match parse_input(&line) {
                Command::Exit => break,
                Command::Empty => continue,
                Command::Message(text) => self.send_message(&text).await,
                command => {
                    let reply = self.run_command(command);
                    println!("{}\n", reply);
                }
            }
            self.persist();
        }
        Ok(())
    }

    async fn send_message(&mut self, text: &str) {
        let stream = self.settings.stream;
        let mut printer = StreamPrinter::new(io::stdout());
        let cancel = async {
            // Without a signal handler the turn simply runs to completion
            if tokio::signal::ctrl_c().await.is_err() {
                future::pending::<()>().await;
            }
        };

        let spin = cliclack::spinner();
        if !stream {
            spin.start("awaiting reply");
        }
        let result = self
            .client
            .send_until(
                &mut self.store,
                &self.settings,
                MessageDraft::user().with_text(text),
                cancel,
                |snapshot| {
                    if stream {
                        if let Err(err) = printer.print(snapshot) {
                            tracing::warn!("failed to write reply: {}", err);
                        }
                    }
                },
            )
            .await;
        if !stream {
            spin.stop("");
        }

        match result {
            Ok(outcome) => {
                if stream {
                    if printer.has_output() {
                        println!();
                    }
                } else if let Err(err) = print_markdown(&outcome.snapshot().content) {
                    tracing::warn!("failed to render reply: {}", err);
                    println!("{}", outcome.snapshot().content);
                }
                let stats = stats_line(outcome.snapshot());
                match outcome {
                    TurnOutcome::Completed(_) => println!("{}\n", style(stats).dim()),
                    TurnOutcome::Cancelled(_) => {
                        println!("{} {}\n", style("cancelled").yellow(), style(stats).dim())
                    }
                }
            }
            Err(err) => {
                if printer.has_output() {
                    println!();
                }
                println!("{} {}\n", style("error:").red().bold(), err);
            }
        }
    }

    /// Apply a non-message command to the store and describe the result
    fn run_command(&mut self, command: Command) -> String {
        match command {
            Command::New => {
                let id = self.store.create_conversation();
                format!("started conversation {}", id)
            }
            Command::List => {
                let active = self.store.current_conversation_id();
                self.store
                    .conversations()
                    .iter()
                    .map(|conversation| {
                        conversation_line(conversation, Some(conversation.id.as_str()) == active)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Command::Switch(id) => {
                if !self.has_conversation(&id) {
                    return format!("no conversation {}", id);
                }
                self.store.switch_conversation(&id);
                format!("switched to {}", id)
            }
            Command::Delete(id) => {
                let Some(id) = id.or_else(|| self.store.current_conversation_id().map(String::from))
                else {
                    return "no active conversation".to_string();
                };
                if !self.has_conversation(&id) {
                    return format!("no conversation {}", id);
                }
                self.store.delete_conversation(&id);
                format!("deleted {}", id)
            }
            Command::Title(title) => match self.store.current_conversation_id().map(String::from) {
                Some(id) => {
                    self.store.update_conversation_title(&id, &title);
                    format!("renamed to {}", title)
                }
                None => "no active conversation".to_string(),
            },
            Command::Help => HELP.to_string(),
            Command::Unknown(name) => format!("unknown command /{} (try /help)", name),
            Command::Message(_) | Command::Empty | Command::Exit => String::new(),
        }
    }

    fn has_conversation(&self, id: &str) -> bool {
        self.store.conversations().iter().any(|c| c.id == id)
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.state_file) {
            tracing::warn!(
                "failed to save conversations to {}: {}",
                self.state_file.display(),
                err
            );
        }
    }
}

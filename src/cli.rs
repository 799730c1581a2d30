use crate::clipboard;
use crate::commands::{self, SettingsUpdate};
use crate::models::ContentType;
use crate::shell::{self, Shell, View};
use crate::state::AppState;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Generate marketing copy with an LLM and keep a local archive", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding the local database (overrides NEXUS_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory for this session only
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate content for a topic and archive it
    Generate {
        #[arg(short = 't', long = "type", value_enum, default_value = "linkedin")]
        content_type: ContentType,

        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },

    /// Summarize market data into a short executive insight
    Insight {
        #[arg(long)]
        context: Option<String>,
    },

    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Write settings (without the API key) and history to a JSON file
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete the entire archive
    Purge {
        #[arg(long)]
        yes: bool,
    },

    /// Render one screen and exit
    View {
        #[arg(value_enum)]
        screen: View,
    },

    /// Interactive session (the default)
    Shell,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    List,
    Show {
        id: String,
        /// Also copy the body to the clipboard
        #[arg(long)]
        copy: bool,
    },
    Delete { id: String },
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        auto_save: Option<bool>,
    },
    /// Store the API key (a blank value clears it)
    SetKey { key: String },
    ClearKey,
}

pub async fn dispatch(state: &AppState, command: Option<Commands>) -> anyhow::Result<()> {
    match command.unwrap_or(Commands::Shell) {
        Commands::Generate {
            content_type,
            topic,
        } => {
            let report = commands::generate_content(state, &topic.join(" "), content_type)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("{}", report.text());
            if let Some(item) = report.archived {
                log::info!("Archived as {}", item.id);
            }
        }
        Commands::Insight { context } => {
            println!("{}", commands::analyze_trends(state, context.as_deref()).await);
        }
        Commands::History { command } => run_history(state, command).await?,
        Commands::Settings { command } => run_settings(state, command).await?,
        Commands::Export { output } => {
            let path = commands::export_data(state, output.as_deref())
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Exported to {}", path.display());
        }
        Commands::Purge { yes } => {
            require_confirmation(yes)?;
            commands::purge_archives(state).await.map_err(anyhow::Error::msg)?;
            println!("Local archives purged.");
        }
        Commands::View { screen } => {
            print!("{}", render_view(state, screen, None).await);
        }
        Commands::Shell => run_interactive(state).await?,
    }
    Ok(())
}

fn require_confirmation(yes: bool) -> anyhow::Result<()> {
    if yes {
        Ok(())
    } else {
        anyhow::bail!("This permanently deletes the archive. Re-run with --yes to proceed.")
    }
}

async fn run_history(state: &AppState, command: HistoryCommand) -> anyhow::Result<()> {
    match command {
        HistoryCommand::List => {
            let history = commands::list_history(state).await;
            print!("{}", shell::render_generator(None, &history));
        }
        HistoryCommand::Show { id, copy } => {
            let item = commands::get_history_item(state, &id)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("{}\n\n{}", item.title, item.body);
            if copy {
                clipboard::copy_to_clipboard(&item.body)?;
                println!("\nCopied to clipboard.");
            }
        }
        HistoryCommand::Delete { id } => {
            let remaining = commands::delete_history_item(state, &id)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("{} items remain.", remaining.len());
        }
        HistoryCommand::Clear { yes } => {
            require_confirmation(yes)?;
            commands::clear_history(state).await.map_err(anyhow::Error::msg)?;
            println!("History cleared.");
        }
    }
    Ok(())
}

async fn run_settings(state: &AppState, command: SettingsCommand) -> anyhow::Result<()> {
    let settings = match command {
        SettingsCommand::Show => commands::load_settings(state).await,
        SettingsCommand::Set {
            username,
            role,
            email_notifications,
            auto_save,
        } => commands::update_settings(
            state,
            SettingsUpdate {
                username,
                role,
                email_notifications,
                auto_save,
            },
        )
        .await
        .map_err(anyhow::Error::msg)?,
        SettingsCommand::SetKey { key } => commands::set_api_key(state, &key)
            .await
            .map_err(anyhow::Error::msg)?,
        SettingsCommand::ClearKey => commands::clear_api_key(state)
            .await
            .map_err(anyhow::Error::msg)?,
    };
    print!("{}", shell::render_settings(&settings));
    Ok(())
}

/// Re-reads the stores and renders `view`.
pub async fn render_view(state: &AppState, view: View, output: Option<&str>) -> String {
    match view {
        View::Dashboard => {
            let metrics = commands::dashboard_metrics(state).await;
            let insight = commands::analyze_trends(state, None).await;
            shell::render_dashboard(&metrics, &insight)
        }
        View::Generator => {
            let history = commands::list_history(state).await;
            shell::render_generator(output, &history)
        }
        View::Monetization => shell::render_monetization(),
        View::Settings => shell::render_settings(&commands::load_settings(state).await),
    }
}

// --- Interactive session ---

#[derive(Debug, PartialEq, Eq)]
pub enum ShellInput {
    Switch(View),
    Generate { content_type: ContentType, topic: String },
    Regenerate,
    Copy,
    Show(String),
    Delete(String),
    SetKey(String),
    SetUsername(String),
    SetRole(String),
    SetEmailNotifications(bool),
    SetAutoSave(bool),
    Export(Option<PathBuf>),
    Purge,
    Help,
    Quit,
    Empty,
}

const SHELL_HELP: &str = "\
Commands:
  1-4 | <screen>              switch screen (dashboard, generator, monetization, settings)
  gen <type> <topic...>       generate content (type: linkedin, twitter, blog, email)
  gen                         repeat the last topic and type
  copy                        copy the output pane to the clipboard
  show <id>                   load an archived item (body, topic and type)
  del <id>                    delete an archived item
  key <api-key>               store the API key (blank clears it)
  user <name> | role <role>   update identity
  notify on|off               email reports
  autosave on|off             auto-archive flag
  export [path]               write a JSON backup
  purge                       delete all archives
  help | quit";

pub fn parse_shell_input(line: &str) -> Result<ShellInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellInput::Empty);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let require = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("Usage: {} <{}>", head, what))
        } else {
            Ok(rest.to_string())
        }
    };

    match head.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => Ok(ShellInput::Quit),
        "help" | "?" => Ok(ShellInput::Help),
        "gen" | "generate" if rest.is_empty() => Ok(ShellInput::Regenerate),
        "gen" | "generate" => {
            let (type_str, topic) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "Usage: gen <type> <topic>".to_string())?;
            let content_type = type_str.parse::<ContentType>()?;
            Ok(ShellInput::Generate {
                content_type,
                topic: topic.trim().to_string(),
            })
        }
        "show" | "load" => require("id").map(ShellInput::Show),
        "del" | "delete" => require("id").map(ShellInput::Delete),
        "key" => Ok(ShellInput::SetKey(rest.to_string())),
        "copy" => Ok(ShellInput::Copy),
        "user" => require("name").map(ShellInput::SetUsername),
        "role" => require("role").map(ShellInput::SetRole),
        "notify" => parse_toggle(head, rest).map(ShellInput::SetEmailNotifications),
        "autosave" => parse_toggle(head, rest).map(ShellInput::SetAutoSave),
        "export" => Ok(ShellInput::Export(
            (!rest.is_empty()).then(|| PathBuf::from(rest)),
        )),
        "purge" => Ok(ShellInput::Purge),
        _ => line.parse::<View>().map(ShellInput::Switch),
    }
}

fn parse_toggle(head: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(format!("Usage: {} on|off", head)),
    }
}

async fn next_line(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    Ok(lines.next_line().await?)
}

async fn run_interactive(state: &AppState) -> anyhow::Result<()> {
    let mut shell = Shell::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", SHELL_HELP);
    print!("{}", render_menu_and_view(state, &shell).await);

    loop {
        println!("\n[{}]>", shell.current().label());
        let Some(line) = next_line(&mut lines).await? else {
            break;
        };

        let input = match parse_shell_input(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match input {
            ShellInput::Empty => continue,
            ShellInput::Quit => break,
            ShellInput::Help => {
                println!("{}", SHELL_HELP);
                continue;
            }
            ShellInput::Switch(view) => shell.select(view),
            ShellInput::Generate {
                content_type,
                topic,
            } => generate_into(state, &mut shell, content_type, &topic).await,
            ShellInput::Regenerate => {
                let Some((content_type, topic)) = shell
                    .last_request()
                    .map(|(content_type, topic)| (content_type, topic.to_string()))
                else {
                    println!("Nothing to repeat yet. Usage: gen <type> <topic>");
                    continue;
                };
                generate_into(state, &mut shell, content_type, &topic).await;
            }
            ShellInput::Copy => {
                match shell.output() {
                    Some(text) => match clipboard::copy_to_clipboard(text) {
                        Ok(()) => println!("Copied to clipboard."),
                        Err(e) => println!("{:#}", e),
                    },
                    None => println!("Nothing to copy yet."),
                }
                continue;
            }
            ShellInput::Show(id) => match commands::get_history_item(state, &id).await {
                Ok(item) => shell.restore(&item),
                Err(e) => println!("{}", e),
            },
            ShellInput::Delete(id) => {
                if let Err(e) = commands::delete_history_item(state, &id).await {
                    println!("{}", e);
                }
            }
            ShellInput::SetKey(key) => {
                report_settings_change(commands::set_api_key(state, &key).await);
                shell.select(View::Settings);
            }
            ShellInput::SetUsername(username) => {
                let update = SettingsUpdate {
                    username: Some(username),
                    ..SettingsUpdate::default()
                };
                report_settings_change(commands::update_settings(state, update).await);
                shell.select(View::Settings);
            }
            ShellInput::SetRole(role) => {
                let update = SettingsUpdate {
                    role: Some(role),
                    ..SettingsUpdate::default()
                };
                report_settings_change(commands::update_settings(state, update).await);
                shell.select(View::Settings);
            }
            ShellInput::SetEmailNotifications(enabled) => {
                let update = SettingsUpdate {
                    email_notifications: Some(enabled),
                    ..SettingsUpdate::default()
                };
                report_settings_change(commands::update_settings(state, update).await);
                shell.select(View::Settings);
            }
            ShellInput::SetAutoSave(enabled) => {
                let update = SettingsUpdate {
                    auto_save: Some(enabled),
                    ..SettingsUpdate::default()
                };
                report_settings_change(commands::update_settings(state, update).await);
                shell.select(View::Settings);
            }
            ShellInput::Export(path) => match commands::export_data(state, path.as_deref()).await {
                Ok(path) => println!("Exported to {}", path.display()),
                Err(e) => println!("{}", e),
            },
            ShellInput::Purge => {
                println!("WARNING: This will purge all local archives. Proceed? [y/N]");
                let answer = next_line(&mut lines).await?.unwrap_or_default();
                if !answer.trim().eq_ignore_ascii_case("y") {
                    println!("Purge cancelled.");
                    continue;
                }
                match commands::purge_archives(state).await {
                    // Start over as a fresh session
                    Ok(()) => shell.reset(),
                    Err(e) => println!("{}", e),
                }
            }
        }

        print!("{}", render_menu_and_view(state, &shell).await);
    }

    Ok(())
}

async fn generate_into(state: &AppState, shell: &mut Shell, content_type: ContentType, topic: &str) {
    shell.select(View::Generator);
    println!("PROCESSING...");
    match commands::generate_content(state, topic, content_type).await {
        Ok(report) => shell.record_generation(content_type, topic.trim(), report.text()),
        Err(e) => println!("{}", e),
    }
}

fn report_settings_change<T>(result: Result<T, String>) {
    match result {
        Ok(_) => println!("Configuration Saved"),
        Err(e) => println!("{}", e),
    }
}

async fn render_menu_and_view(state: &AppState, shell: &Shell) -> String {
    format!(
        "\n{}\n{}",
        shell::render_menu(shell.current()),
        render_view(state, shell.current(), shell.output()).await
    )
}

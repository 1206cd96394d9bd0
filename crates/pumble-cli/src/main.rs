//! CLI interface for pumble - Pumble team messaging from the terminal.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, BufRead as _, IsTerminal, Write as _};
use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow, bail};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use env_logger::fmt::WriteStyle;
use log::{LevelFilter, debug};
use pumble_core::paths::write_default_config;
use pumble_core::{
    AppConfig, AppPaths, Channel, HttpTransport, Message, MessageCollection, PumbleService,
    SendAs, User, generate_schema,
};
use serde_json::Value;

const APP_NAME: &str = "pumble";

/// Repository URL used as the schema `$id` base.
const REPO_URL: &str = "https://github.com/pumble-rs/pumble";

fn main() -> anyhow::Result<()> {
    try_main()
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("resolved paths: {}", ctx.paths);

    match cli.command {
        Command::Init(cmd) => handle_init(&ctx, cmd),
        Command::Config { command } => handle_config(&ctx, command),
        Command::Completions { shell } => {
            handle_completions(shell);
            Ok(())
        }
        command => {
            let service = ctx.service()?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(handle_api(&ctx, &service, command))
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pumble",
    author,
    version,
    about = "Pumble team messaging from the terminal",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

/// Common CLI options shared across all subcommands.
#[derive(Debug, Clone, Args)]
pub struct CommonOpts {
    /// Override the config file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
    /// Reduce output to only errors.
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    pub quiet: bool,
    /// Increase logging verbosity (stackable).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
    /// Enable trace logging.
    #[arg(long, global = true)]
    pub trace: bool,
    /// Output machine-readable JSON.
    #[arg(long, global = true)]
    pub json: bool,
    /// Disable ANSI colors in output.
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    pub no_color: bool,
    /// Control color output.
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    pub color: ColorOption,
    /// Show what would be sent without calling the API or touching disk.
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,
    /// Assume "yes" for interactive prompts.
    #[arg(short = 'y', long = "yes", global = true)]
    pub assume_yes: bool,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
    /// Detect terminal capabilities automatically.
    Auto,
    /// Always emit ANSI color codes.
    Always,
    /// Never emit ANSI color codes.
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show messages in a channel.
    Messages {
        /// Channel name or ID.
        channel: String,
        /// Continue from a cursor printed by a previous call.
        #[arg(long, conflicts_with = "all")]
        cursor: Option<String>,
        /// Messages per page.
        #[arg(short = 'n', long)]
        limit: Option<u32>,
        /// Fetch the whole channel history.
        #[arg(long)]
        all: bool,
    },
    /// List channels in the workspace.
    Channels,
    /// List users in the workspace.
    Users,
    /// Send a message to a channel.
    Send {
        /// Channel name or ID.
        channel: String,
        /// Message text.
        text: String,
        /// Post from your personal account instead of the bot.
        #[arg(long)]
        personal: bool,
    },
    /// Reply in a message thread.
    Reply {
        /// Channel name or ID.
        channel: String,
        /// ID of the message to reply to.
        message_id: String,
        /// Reply text.
        text: String,
        /// Post from your personal account instead of the bot.
        #[arg(long)]
        personal: bool,
    },
    /// Add an emoji reaction to a message.
    React {
        /// Channel name or ID.
        channel: String,
        /// ID of the message to react to.
        message_id: String,
        /// Emoji name, e.g. "thumbsup".
        emoji: String,
    },
    /// Delete a message.
    Delete {
        /// Channel name or ID.
        channel: String,
        /// ID of the message to delete.
        message_id: String,
    },
    /// Create a channel.
    CreateChannel {
        /// Channel name.
        name: String,
        /// Make the channel private.
        #[arg(long)]
        private: bool,
    },
    /// Search a channel's history for text (case-insensitive).
    Search {
        /// Channel name or ID.
        channel: String,
        /// Text to look for.
        term: String,
    },
    /// Show every message a user wrote in a channel.
    ByUser {
        /// Channel name or ID.
        channel: String,
        /// Author's user ID.
        user_id: String,
    },
    /// Create config directories and default files.
    Init(InitCommand),
    /// Inspect and manage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, Args)]
struct InitCommand {
    /// Recreate configuration even if it already exists.
    #[arg(long = "force")]
    force: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration.
    Show,
    /// Print the resolved config file path.
    Path,
    /// Print the JSON schema.
    Schema,
    /// Regenerate the default configuration file.
    Reset,
}

// ─── Runtime ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.as_deref())?;
        let config = AppConfig::load(&paths, common.dry_run)?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        builder.filter_level(self.effective_log_level());

        if let Some(ref file) = self.config.logging.file {
            let sink = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .with_context(|| format!("opening log file {file}"))?;
            builder.target(env_logger::Target::Pipe(Box::new(sink)));
            builder.write_style(WriteStyle::Never);
        } else if self.stderr_color() {
            builder.write_style(if self.force_color() {
                WriteStyle::Always
            } else {
                WriteStyle::Auto
            });
        } else {
            builder.write_style(WriteStyle::Never);
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    /// Flags win; without any, the configured `logging.level` applies.
    const fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => self.config.logging.level.to_level_filter(),
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    fn force_color(&self) -> bool {
        matches!(self.common.color, ColorOption::Always) || env::var_os("FORCE_COLOR").is_some()
    }

    fn color_disabled(&self) -> bool {
        self.common.no_color
            || matches!(self.common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some()
    }

    fn stderr_color(&self) -> bool {
        !self.color_disabled() && (self.force_color() || io::stderr().is_terminal())
    }

    fn stdout_color(&self) -> bool {
        !self.color_disabled() && (self.force_color() || io::stdout().is_terminal())
    }

    /// Build the API service. Called once per invocation.
    fn service(&self) -> Result<PumbleService<HttpTransport>> {
        PumbleService::from_config(&self.config.api).map_err(|e| {
            anyhow!(
                "{e}\nset {} or add api_key under [api] in {}",
                pumble_core::API_KEY_ENV,
                self.paths.config_file.display()
            )
        })
    }

    /// Ask before a destructive action unless `--yes` was given.
    fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.common.assume_yes {
            return Ok(true);
        }
        if !io::stdin().is_terminal() {
            bail!("{prompt}: refusing without confirmation (pass --yes)");
        }
        eprint!("{prompt} [y/N] ");
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    fn dry_run(&self, what: &str) -> bool {
        if self.common.dry_run {
            eprintln!("dry-run: would {what}");
        }
        self.common.dry_run
    }
}

// ─── Handlers ────────────────────────────────────────────────────────

async fn handle_api(
    ctx: &RuntimeContext,
    service: &PumbleService<HttpTransport>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Messages {
            channel,
            cursor,
            limit,
            all,
        } => {
            if all {
                let page_size = limit.unwrap_or_else(|| service.page_size());
                let messages = service.get_all_messages(&channel, page_size).await?;
                print_messages(ctx, &messages)
            } else {
                let page = service
                    .get_messages(&channel, cursor.as_deref(), limit)
                    .await?;
                print_page(ctx, &page)
            }
        }
        Command::Channels => {
            let channels = service.get_channels().await?;
            print_channels(ctx, &channels)
        }
        Command::Users => {
            let users = service.get_users().await?;
            print_users(ctx, &users)
        }
        Command::Send {
            channel,
            text,
            personal,
        } => {
            if ctx.dry_run(&format!("send {:?} to {channel}", truncate(&text, 40))) {
                return Ok(());
            }
            let sent = service
                .send_message(&channel, &text, send_as(personal))
                .await?;
            print_response(ctx, "sent", &sent)
        }
        Command::Reply {
            channel,
            message_id,
            text,
            personal,
        } => {
            if ctx.dry_run(&format!("reply to {message_id} in {channel}")) {
                return Ok(());
            }
            let sent = service
                .reply_to_message(&channel, &message_id, &text, send_as(personal))
                .await?;
            print_response(ctx, "replied", &sent)
        }
        Command::React {
            channel,
            message_id,
            emoji,
        } => {
            if ctx.dry_run(&format!("react :{emoji}: to {message_id} in {channel}")) {
                return Ok(());
            }
            let reacted = service.add_reaction(&channel, &message_id, &emoji).await?;
            print_response(ctx, "reacted", &reacted)
        }
        Command::Delete {
            channel,
            message_id,
        } => {
            if ctx.dry_run(&format!("delete {message_id} in {channel}")) {
                return Ok(());
            }
            if !ctx.confirm(&format!("Delete message {message_id} in {channel}?"))? {
                eprintln!("aborted");
                return Ok(());
            }
            let deleted = service.delete_message(&channel, &message_id).await?;
            print_response(ctx, "deleted", &deleted)
        }
        Command::CreateChannel { name, private } => {
            let kind = if private { "private" } else { "public" };
            if ctx.dry_run(&format!("create {kind} channel {name}")) {
                return Ok(());
            }
            let created = service.create_channel(&name, private).await?;
            print_response(ctx, "created", &created)
        }
        Command::Search { channel, term } => {
            let hits = service.search_messages(&channel, &term).await?;
            print_messages(ctx, &hits)
        }
        Command::ByUser { channel, user_id } => {
            let hits = service.get_messages_by_user(&channel, &user_id).await?;
            print_messages(ctx, &hits)
        }
        Command::Init(_) | Command::Config { .. } | Command::Completions { .. } => {
            Err(anyhow!("not an API command"))
        }
    }
}

const fn send_as(personal: bool) -> SendAs {
    if personal {
        SendAs::Personal
    } else {
        SendAs::Bot
    }
}

fn handle_init(ctx: &RuntimeContext, cmd: InitCommand) -> Result<()> {
    if ctx.paths.config_file.exists() && !(cmd.force || ctx.common.assume_yes) {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            ctx.paths.config_file.display()
        ));
    }
    if ctx.common.dry_run {
        log::info!(
            "dry-run: would write default config to {}",
            ctx.paths.config_file.display()
        );
        return Ok(());
    }
    write_default_config(&ctx.paths.config_file)?;
    Ok(())
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if ctx.common.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ctx.config)
                        .context("serializing config to JSON")?
                );
            } else {
                println!(
                    "{}",
                    toml::to_string_pretty(&ctx.config).context("serializing config to TOML")?
                );
            }
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths.config_file.display());
            Ok(())
        }
        ConfigCommand::Schema => {
            println!("{}", generate_schema(APP_NAME, REPO_URL)?);
            Ok(())
        }
        ConfigCommand::Reset => {
            if ctx.common.dry_run {
                log::info!(
                    "dry-run: would reset config at {}",
                    ctx.paths.config_file.display()
                );
                return Ok(());
            }
            if !ctx.confirm(&format!(
                "Overwrite {} with defaults?",
                ctx.paths.config_file.display()
            ))? {
                eprintln!("aborted");
                return Ok(());
            }
            write_default_config(&ctx.paths.config_file)?;
            Ok(())
        }
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
}

// ─── Formatting helpers ──────────────────────────────────────────────

fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing output to JSON")?
    );
    Ok(())
}

fn print_page(ctx: &RuntimeContext, page: &MessageCollection) -> Result<()> {
    if ctx.common.json {
        return print_json(&page.to_canonical());
    }
    print_messages(ctx, page.messages())?;
    if page.has_more()
        && let Some(cursor) = page.cursor()
    {
        println!("more: --cursor {cursor}");
    }
    Ok(())
}

fn print_messages(ctx: &RuntimeContext, messages: &[Message]) -> Result<()> {
    if ctx.common.json {
        let list: Vec<Value> = messages.iter().map(Message::to_canonical).collect();
        return print_json(&Value::Array(list));
    }
    if messages.is_empty() {
        println!("  (no messages)");
        return Ok(());
    }

    let color = ctx.stdout_color();
    for msg in messages {
        let author = if msg.user_id.is_empty() {
            "?"
        } else {
            &msg.user_id
        };
        let thread = msg
            .thread_id
            .as_deref()
            .map(|id| format!(" (in thread {id})"))
            .unwrap_or_default();
        println!("  {}  {author}{thread}", dim(&msg.created_at, color));
        for line in msg.text.lines() {
            println!("    {line}");
        }
        println!("    {}", dim(&msg.id, color));
        println!();
    }
    Ok(())
}

fn print_channels(ctx: &RuntimeContext, channels: &[Channel]) -> Result<()> {
    if ctx.common.json {
        let list: Vec<Value> = channels.iter().map(Channel::to_canonical).collect();
        return print_json(&Value::Array(list));
    }

    let color = ctx.stdout_color();
    for ch in channels {
        let lock = if ch.is_private { " [private]" } else { "" };
        println!("  {}{lock}", ch.name);
        if let Some(desc) = ch.description.as_deref().filter(|d| !d.is_empty()) {
            println!("    {}", truncate(desc, 80));
        }
        println!("    {}", dim(&format!("ID: {}", ch.id), color));
    }
    Ok(())
}

fn print_users(ctx: &RuntimeContext, users: &[User]) -> Result<()> {
    if ctx.common.json {
        let list: Vec<Value> = users.iter().map(User::to_canonical).collect();
        return print_json(&Value::Array(list));
    }

    let color = ctx.stdout_color();
    for user in users {
        let bot = if user.is_bot == Some(true) { " [bot]" } else { "" };
        println!("  {}{bot}  {}", user.name, user.email);
        if let Some(status) = user.status.as_deref().filter(|s| !s.is_empty()) {
            println!("    {}", truncate(status, 80));
        }
        println!("    {}", dim(&format!("ID: {}", user.id), color));
    }
    Ok(())
}

/// Write operations print the API's answer as-is; in text mode only the
/// record ID is shown when one can be found.
fn print_response(ctx: &RuntimeContext, verb: &str, response: &Value) -> Result<()> {
    if ctx.common.json {
        return print_json(response);
    }
    let id = ["message", "channel", "data"]
        .iter()
        .find_map(|key| response.get(key))
        .unwrap_or(response)
        .get("id")
        .and_then(Value::as_str);
    match id {
        Some(id) => println!("{verb}: {id}"),
        None => println!("{verb}"),
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{truncated}...")
    }
}

fn dim(s: &str, color: bool) -> String {
    if color {
        format!("\x1b[2m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_message_paging_flags() {
        let cli = Cli::try_parse_from(["pumble", "messages", "general", "--cursor", "A", "-n", "5"])
            .expect("parse");
        match cli.command {
            Command::Messages {
                channel,
                cursor,
                limit,
                all,
            } => {
                assert_eq!(channel, "general");
                assert_eq!(cursor.as_deref(), Some("A"));
                assert_eq!(limit, Some(5));
                assert!(!all);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cursor_conflicts_with_all() {
        let err = Cli::try_parse_from(["pumble", "messages", "general", "--cursor", "A", "--all"])
            .expect_err("conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn personal_flag_selects_identity() {
        let cli = Cli::try_parse_from(["pumble", "send", "general", "hello", "--personal"])
            .expect("parse");
        match cli.command {
            Command::Send { personal, .. } => assert_eq!(send_as(personal), SendAs::Personal),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(send_as(false), SendAs::Bot);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["pumble", "channels", "--json", "--dry-run", "-vv"])
            .expect("parse");
        assert!(cli.common.json);
        assert!(cli.common.dry_run);
        assert_eq!(cli.common.verbose, 2);
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 6), "hello...");
    }

    #[test]
    fn dim_respects_color_setting() {
        assert_eq!(dim("x", false), "x");
        assert_eq!(dim("x", true), "\x1b[2mx\x1b[0m");
    }
}

//! Interactive REPL for browsing a pattern store.
//!
//! Launch with `pensent-mcp repl`. Type `/help` for commands, Tab for completion.

use std::path::Path;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use pensent_core::{Domain, PensReader};

use crate::config::resolve_store_path;
use crate::session::PatternSessionManager;
use crate::tools::ToolRegistry;

const COMMANDS: &[(&str, &str)] = &[
    ("/info", "Show server capabilities and tools"),
    ("/tools", "List available MCP tools"),
    ("/load", "Open a .pens pattern file"),
    ("/validate", "Check a .pens file without opening it"),
    ("/stats", "Pattern counts per domain"),
    ("/recent", "Show the newest patterns"),
    ("/archetypes", "List archetypes for a domain"),
    ("/classify", "Classify tags into an archetype: /classify <domain> <tag>..."),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

const DOMAIN_COMMANDS: &[&str] = &["/archetypes", "/classify"];

struct PensHelper;

impl Completer for PensHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<14} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let prefix_start = input.len() - args.len();

        if DOMAIN_COMMANDS.contains(&cmd) && !args.contains(' ') {
            let matches: Vec<Pair> = Domain::ALL
                .iter()
                .map(|d| d.as_str())
                .filter(|d| d.starts_with(args))
                .map(|d| Pair {
                    display: d.to_string(),
                    replacement: format!("{d} "),
                })
                .collect();
            return Ok((prefix_start, matches));
        }

        if cmd == "/load" || cmd == "/validate" {
            let mut files = Vec::new();
            if let Ok(entries) = std::fs::read_dir(".") {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().is_some_and(|e| e == "pens") {
                        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                            files.push(name.to_string());
                        }
                    }
                }
            }
            files.sort();
            let matches: Vec<Pair> = files
                .iter()
                .filter(|f| f.starts_with(args.trim()))
                .map(|f| Pair {
                    display: f.clone(),
                    replacement: format!("{f} "),
                })
                .collect();
            return Ok((prefix_start, matches));
        }

        Ok((pos, Vec::new()))
    }
}

impl Hinter for PensHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for PensHelper {}
impl Validator for PensHelper {}
impl Helper for PensHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// The open store, if any. Opened lazily from the resolved default path.
struct ReplState {
    session: Option<PatternSessionManager>,
}

impl ReplState {
    fn session(&mut self) -> Option<&PatternSessionManager> {
        if self.session.is_none() {
            let path = resolve_store_path(None);
            match PatternSessionManager::open(&path) {
                Ok(session) => self.session = Some(session),
                Err(e) => {
                    eprintln!("  Cannot open pattern store {path}: {e}");
                    return None;
                }
            }
        }
        self.session.as_ref()
    }
}

/// Run the interactive REPL.
pub fn run(store: Option<&str>) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{265e}\x1b[0m \x1b[1mpensent-mcp v{}\x1b[0m \x1b[90mpattern store browser\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<PensHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(PensHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".pensent_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut state = ReplState { session: None };
    if let Some(path) = store {
        cmd_load(path, &mut state);
    }
    let prompt = " \x1b[36mpensent>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(),
                    "tools" => cmd_tools(),
                    "load" => cmd_load(args, &mut state),
                    "validate" => cmd_validate(args),
                    "stats" => cmd_stats(&mut state),
                    "recent" => cmd_recent(args, &mut state),
                    "archetypes" => cmd_archetypes(args, &mut state),
                    "classify" => cmd_classify(args, &mut state),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<14} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands, domains, and .pens files.");
    eprintln!();
}

fn cmd_info() {
    let capabilities = crate::types::InitializeResult::default_result();
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!(
        "  Server:   {} v{}",
        capabilities.server_info.name, capabilities.server_info.version
    );
    eprintln!("  Protocol: {}", capabilities.protocol_version);
    eprintln!("  Tools:    {}", tools.len());
    eprintln!();
}

fn cmd_tools() {
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!("  {} MCP tools available:", tools.len());
    eprintln!();
    for tool in &tools {
        eprintln!(
            "    {:<20} {}",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        );
    }
    eprintln!();
}

fn cmd_load(args: &str, state: &mut ReplState) {
    let Some(path) = args.split_whitespace().next() else {
        eprintln!("  Usage: /load <file.pens>");
        return;
    };
    match PatternSessionManager::open(path) {
        Ok(session) => {
            eprintln!("  Loaded: {path} ({} patterns)", session.store().count());
            state.session = Some(session);
        }
        Err(e) => eprintln!("  Failed to load: {e}"),
    }
}

fn cmd_validate(args: &str) {
    let path = match args.split_whitespace().next() {
        Some(p) => p.to_string(),
        None => resolve_store_path(None),
    };

    match PensReader::read_from_file(Path::new(&path)) {
        Ok(store) => {
            eprintln!();
            eprintln!("  Valid pattern file: {path}");
            eprintln!("    Patterns: {}", store.count());
            eprintln!("    Sessions: {}", store.session_count);
            eprintln!();
        }
        Err(e) => eprintln!("  Invalid pattern file: {e}"),
    }
}

fn cmd_stats(state: &mut ReplState) {
    let Some(session) = state.session() else {
        return;
    };
    let store = session.store();
    eprintln!();
    eprintln!("  Pattern store: {}", session.file_path().display());
    eprintln!("    Patterns: {}", store.count());
    for (domain, count) in store.domain_counts() {
        eprintln!("      {:<8} {count}", domain.as_str());
    }
    eprintln!("    Sessions: {}", store.session_count);
    eprintln!();
}

fn cmd_recent(args: &str, state: &mut ReplState) {
    let limit = args.parse::<usize>().unwrap_or(10);
    let Some(session) = state.session() else {
        return;
    };
    let recent = session.store().recent(limit);
    if recent.is_empty() {
        eprintln!("  No patterns recorded yet.");
        return;
    }
    eprintln!();
    for p in recent {
        eprintln!(
            "    #{:<5} {:<7} {:<24} {}",
            p.id,
            p.domain.as_str(),
            p.archetype,
            p.outcome
        );
    }
    eprintln!();
}

fn parse_domain_arg(arg: Option<&str>) -> Option<Domain> {
    let Some(arg) = arg else {
        eprintln!("  A domain is required: chess, code, or market.");
        return None;
    };
    match arg.parse::<Domain>() {
        Ok(d) => Some(d),
        Err(e) => {
            eprintln!("  {e}");
            None
        }
    }
}

fn cmd_archetypes(args: &str, state: &mut ReplState) {
    let Some(domain) = parse_domain_arg(args.split_whitespace().next()) else {
        return;
    };
    let Some(session) = state.session() else {
        return;
    };
    let Some(registry) = session.catalog().registry(domain) else {
        eprintln!("  No registry for {domain}.");
        return;
    };
    eprintln!();
    eprintln!("  {domain} archetypes (registry v{}):", registry.version);
    for def in registry.iter() {
        eprintln!(
            "    {:<24} {:>4.0}%  {}",
            def.id,
            def.success_rate * 100.0,
            def.name
        );
    }
    eprintln!();
}

fn cmd_classify(args: &str, state: &mut ReplState) {
    let mut words = args.split_whitespace();
    let Some(domain) = parse_domain_arg(words.next()) else {
        return;
    };
    let tags: Vec<&str> = words.collect();
    if tags.is_empty() {
        eprintln!("  Usage: /classify <domain> <tag> [tag...]");
        return;
    }
    let Some(session) = state.session() else {
        return;
    };
    match session
        .catalog()
        .registry(domain)
        .and_then(|r| r.classify(&tags))
    {
        Some(def) => eprintln!("  {} ({})", def.id, def.name),
        None => eprintln!("  No archetype matches those tags."),
    }
}

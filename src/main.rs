mod app;
mod board;
mod config;
mod input;
mod remote;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre};

use app::AppState;
use board::reorder::DropOutcome;
use board::{Board, Card};
use remote::dispatch::{DispatchOutcome, Dispatcher};
use remote::ApiClient;

#[derive(Parser)]
#[command(name = "kanri", about = "A Kanban board client with optimistic reordering")]
struct Cli {
    /// Base URL of the Kanban API (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Board ID to operate on (overrides config)
    #[arg(short, long, global = true)]
    board: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the board with its columns and cards in order
    Show,
    /// Move a card to a different column
    Move {
        /// Card ID
        card_id: String,
        /// Target column (ID or title, fuzzy matched)
        column: String,
        /// Position in the target column (defaults to the end)
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Set the full card order of a column
    Reorder {
        /// Column (ID or title, fuzzy matched)
        column: String,
        /// Card IDs in the desired order (must list every card)
        #[arg(required = true)]
        card_ids: Vec<String>,
    },
    /// Set the column order of the board
    Columns {
        /// Column IDs in the desired order (must list every column)
        #[arg(required = true)]
        column_ids: Vec<String>,
    },
    /// Print the path of the config file
    ConfigPath,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        print_user_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> color_eyre::Result<()> {
    if let Command::ConfigPath = cli.command {
        println!("{}", config::config_path()?.display());
        return Ok(());
    }

    let mut cfg = config::load()?;
    if let Some(url) = cli.api_url {
        cfg.api_url = url;
    }
    let board_id = cli
        .board
        .or_else(|| cfg.board.clone())
        .ok_or_else(|| eyre!("No board selected. Pass --board or set `board` in the config file."))?;

    let client = ApiClient::new(&cfg)?;

    match cli.command {
        Command::Show => cmd_show(&client, &board_id),
        Command::Move {
            card_id,
            column,
            index,
        } => cmd_move(&client, &board_id, &card_id, &column, index),
        Command::Reorder { column, card_ids } => cmd_reorder(&client, &board_id, &column, card_ids),
        Command::Columns { column_ids } => cmd_columns(&client, &board_id, column_ids),
        Command::ConfigPath => unreachable!("handled above"),
    }
}

/// Print a user-friendly error message, with actionable hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    if let Some(remote_err) = error.downcast_ref::<remote::RemoteError>() {
        match remote_err {
            remote::RemoteError::BoardNotFound(id) => {
                eprintln!("error: board '{id}' not found on the server.");
                eprintln!("  Check --board or the `board` setting in the config file.");
            }
            remote::RemoteError::Status { context, status } => {
                eprintln!("error: the server rejected {context} (HTTP {status}).");
            }
            remote::RemoteError::Http(e) => {
                eprintln!("error: could not reach the Kanban API.");
                eprintln!("  {e}");
                eprintln!("  Check --api-url or the `api_url` setting in the config file.");
            }
        }
        return;
    }

    if let Some(config_err) = error.downcast_ref::<config::ConfigError>() {
        match config_err {
            config::ConfigError::TomlDe(e) => {
                eprintln!("error: config file has invalid TOML syntax.");
                eprintln!("  {e}");
                eprintln!("  Run `kanri config-path` to locate it.");
            }
            config::ConfigError::Io(e) => {
                eprintln!("error: could not read the config file.");
                eprintln!("  {e}");
            }
            config::ConfigError::NoConfigDir => {
                eprintln!("error: could not locate a user config directory.");
            }
        }
        return;
    }

    // For eyre::eyre!() / bail!() messages, print the full error chain.
    eprintln!("error: {e:#}", e = error);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_show(client: &ApiClient, board_id: &str) -> color_eyre::Result<()> {
    let board = client.fetch_board(board_id)?;
    println!("\nBoard {}", board.id);
    for col in &board.columns {
        println!("\n{} ({})", col.title, col.real_card_count());
        println!("{}", "─".repeat(40));
        if col.real_card_count() == 0 {
            println!("  (empty)");
            continue;
        }
        for id in &col.card_order {
            let Some(card) = col.cards.iter().find(|c| c.id() == id) else {
                continue;
            };
            if let Card::Real(card) = card {
                println!("  {}  {}  [{}]", card.id, card.title, card.priority);
            }
        }
    }
    println!();
    Ok(())
}

fn cmd_move(
    client: &ApiClient,
    board_id: &str,
    card_id: &str,
    column: &str,
    index: Option<usize>,
) -> color_eyre::Result<()> {
    let board = client.fetch_board(board_id)?;
    let target = resolve_column(&board, column).map_err(|msg| eyre!(msg))?;
    let target_id = board.columns[target].id.clone();
    let target_title = board.columns[target].title.clone();

    let (col_idx, _) = board
        .find_card(card_id)
        .ok_or_else(|| eyre!("Card '{}' not found", card_id))?;
    let source_id = board.columns[col_idx].id.clone();

    let drop = if source_id == target_id {
        let Some(index) = index else {
            println!("Card is already in '{target_title}'");
            return Ok(());
        };
        let order = reposition(&board.columns[col_idx].card_order, card_id, index);
        DropOutcome::CardReorder {
            column_id: source_id,
            card_order: order,
        }
    } else {
        DropOutcome::CardMove {
            card_id: card_id.to_string(),
            source_column_id: source_id,
            target_column_id: target_id,
            drop_index: index,
            column_order: board.column_order.clone(),
        }
    };

    let mut state = open_state(client, board)?;
    if !state.handle_drop(&drop) {
        bail!("Move rejected: the board changed, refetch and retry");
    }
    println!("Moved {card_id} to {target_title}");
    finish(state)
}

fn cmd_reorder(
    client: &ApiClient,
    board_id: &str,
    column: &str,
    card_ids: Vec<String>,
) -> color_eyre::Result<()> {
    let board = client.fetch_board(board_id)?;
    let col = resolve_column(&board, column).map_err(|msg| eyre!(msg))?;
    let column_id = board.columns[col].id.clone();
    let title = board.columns[col].title.clone();

    let drop = DropOutcome::CardReorder {
        column_id,
        card_order: card_ids,
    };
    let mut state = open_state(client, board)?;
    if !state.handle_drop(&drop) {
        bail!("Reorder rejected: the IDs must list every card in '{title}' exactly once");
    }
    println!("Reordered {title}");
    finish(state)
}

fn cmd_columns(
    client: &ApiClient,
    board_id: &str,
    column_ids: Vec<String>,
) -> color_eyre::Result<()> {
    let board = client.fetch_board(board_id)?;
    let drop = DropOutcome::ColumnReorder {
        column_order: column_ids,
    };
    let mut state = open_state(client, board)?;
    if !state.handle_drop(&drop) {
        bail!("Reorder rejected: the IDs must list every column exactly once");
    }
    let order = state
        .board
        .as_ref()
        .map(|b| b.column_order.join(", "))
        .unwrap_or_default();
    println!("Column order: {order}");
    finish(state)
}

/// Build an app state with a live dispatcher around a fetched board.
fn open_state(client: &ApiClient, board: Board) -> color_eyre::Result<AppState> {
    let dispatcher = Dispatcher::spawn(client.clone());
    let mut state = AppState::new(Some(dispatcher));
    state.open_board(board);
    Ok(state)
}

/// Flush the dispatcher before exit. Persist failures are warnings, not
/// errors: the optimistic change was already shown and is not rolled back.
fn finish(mut state: AppState) -> color_eyre::Result<()> {
    let Some(dispatcher) = state.take_dispatcher() else {
        return Ok(());
    };
    for outcome in dispatcher.drain() {
        if let DispatchOutcome::Failed { what, error, .. } = outcome {
            eprintln!("warning: saving {what} failed: {error}");
        }
    }
    Ok(())
}

/// Compute a column's card order with `card_id` moved to `index`.
fn reposition(card_order: &[String], card_id: &str, index: usize) -> Vec<String> {
    let mut order = card_order.to_vec();
    if let Some(from) = order.iter().position(|id| id == card_id) {
        let id = order.remove(from);
        let at = index.min(order.len());
        order.insert(at, id);
    }
    order
}

// ---------------------------------------------------------------------------
// Column fuzzy matching
// ---------------------------------------------------------------------------

/// Find a column by fuzzy match on ID or title (case-insensitive).
/// Returns Ok(index) or Err(error message).
fn resolve_column(board: &Board, query: &str) -> Result<usize, String> {
    if query.is_empty() {
        return Err("Column name required".into());
    }

    let query_lower = query.to_lowercase();

    // Exact match first (by ID or title)
    for (i, col) in board.columns.iter().enumerate() {
        if col.id.to_lowercase() == query_lower || col.title.to_lowercase() == query_lower {
            return Ok(i);
        }
    }

    // Prefix match
    let mut matches: Vec<usize> = Vec::new();
    for (i, col) in board.columns.iter().enumerate() {
        if col.id.to_lowercase().starts_with(&query_lower)
            || col.title.to_lowercase().starts_with(&query_lower)
        {
            matches.push(i);
        }
    }

    // Contains match (only if prefix didn't match)
    if matches.is_empty() {
        for (i, col) in board.columns.iter().enumerate() {
            if col.id.to_lowercase().contains(&query_lower)
                || col.title.to_lowercase().contains(&query_lower)
            {
                matches.push(i);
            }
        }
    }

    match matches.len() {
        0 => Err(format!("Unknown column: {query}")),
        1 => Ok(matches[0]),
        _ => {
            let names: Vec<&str> = matches
                .iter()
                .map(|&i| board.columns[i].title.as_str())
                .collect();
            Err(format!("Ambiguous: {}", names.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::testutil::test_board;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_column_exact_id() {
        let board = test_board(&[("todo", &[]), ("doing", &[])]);
        assert_eq!(resolve_column(&board, "doing"), Ok(1));
    }

    #[test]
    fn resolve_column_exact_title_case_insensitive() {
        // test_board uppercases IDs for titles
        let board = test_board(&[("todo", &[]), ("doing", &[])]);
        assert_eq!(resolve_column(&board, "TODO"), Ok(0));
    }

    #[test]
    fn resolve_column_prefix() {
        let board = test_board(&[("todo", &[]), ("review", &[])]);
        assert_eq!(resolve_column(&board, "rev"), Ok(1));
    }

    #[test]
    fn resolve_column_contains_when_no_prefix() {
        let board = test_board(&[("in-progress", &[]), ("done", &[])]);
        assert_eq!(resolve_column(&board, "progress"), Ok(0));
    }

    #[test]
    fn resolve_column_ambiguous() {
        let board = test_board(&[("done", &[]), ("doing", &[])]);
        let err = resolve_column(&board, "do").unwrap_err();
        assert!(err.starts_with("Ambiguous:"), "unexpected: {err}");
    }

    #[test]
    fn resolve_column_unknown() {
        let board = test_board(&[("todo", &[])]);
        assert_eq!(
            resolve_column(&board, "zzz"),
            Err("Unknown column: zzz".into())
        );
    }

    #[test]
    fn resolve_column_empty_query() {
        let board = test_board(&[("todo", &[])]);
        assert!(resolve_column(&board, "").is_err());
    }

    #[test]
    fn reposition_moves_within_bounds() {
        assert_eq!(
            reposition(&ids(&["a", "b", "c"]), "c", 0),
            ids(&["c", "a", "b"])
        );
    }

    #[test]
    fn reposition_clamps_past_the_end() {
        assert_eq!(
            reposition(&ids(&["a", "b", "c"]), "a", 99),
            ids(&["b", "c", "a"])
        );
    }

    #[test]
    fn reposition_unknown_card_is_identity() {
        assert_eq!(
            reposition(&ids(&["a", "b"]), "zzz", 0),
            ids(&["a", "b"])
        );
    }
}

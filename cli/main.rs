use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vaultfs::auth::{PasswordStore, Session};
use vaultfs::cipher::StreamTransformer;
use vaultfs::config::Config;
use vaultfs::file_ops;
use vaultfs::tree::{RemovalOutcome, TreeRemover};
use zeroize::Zeroizing;

/// VaultFS - password-gated local file vault with in-place encryption
#[derive(Parser)]
#[command(name = "vaultfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,
}

/// Shell state threaded through every dispatched command.
///
/// `session` is the explicit authorization context: `None` until a
/// successful login, and required by every command that touches the
/// filesystem.
struct Shell {
    store: PasswordStore,
    remover: TreeRemover,
    transformer: StreamTransformer,
    session: Option<Session>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging
    // Use RUST_LOG environment variable to control log level (e.g., RUST_LOG=info,vaultfs=debug)
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_with_env(Some(&cli.config))?;
    info!(config = %cli.config, "VaultFS starting");

    let mut shell = Shell {
        store: PasswordStore::new(&cfg),
        remover: TreeRemover::new().with_max_depth(cfg.max_depth),
        transformer: StreamTransformer::new(),
        session: None,
    };

    println!("Welcome to VaultFS. Type 'help' for commands.");
    loop {
        let line = match prompt_line("> ")? {
            Some(line) => line,
            None => break, // EOF
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens[0] == "exit" {
            println!("Exiting VaultFS.");
            break;
        }
        if let Err(e) = dispatch(&mut shell, &tokens).await {
            println!("Error: {e:#}");
        }
    }

    Ok(())
}

/// Print `prompt`, then read one line from stdin. `None` on EOF.
fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    let n = io::stdin().read_line(&mut line).context("reading input")?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn print_usage() {
    println!("Commands:");
    println!("  setpass <password>            Set the vault password");
    println!("  login <password>              Login with the vault password");
    println!("  create <filename>             Create a file");
    println!("  open <filename>               Open a file with the default application");
    println!("  delete <filename>             Delete a file");
    println!("  metadata <filename>           Show file metadata");
    println!("  list [path]                   List directory contents");
    println!("  copy <source> <dest>          Copy a file");
    println!("  move <source> <dest>          Move a file");
    println!("  rename <oldname> <newname>    Rename a file");
    println!("  renamedir <oldname> <newname> Rename a directory");
    println!("  createdir <dirname>           Create a directory");
    println!("  deletedir <dirname>           Delete a directory tree");
    println!("  search <path> <name>          Search a directory by name substring");
    println!("  cd <dirname>                  Change working directory");
    println!("  encrypt <filename> <key>      Encrypt a file in place");
    println!("  decrypt <filename> <key>      Decrypt a file in place");
    println!("  exit                          Exit");
    println!("  help                          Show this help");
}

async fn dispatch(shell: &mut Shell, tokens: &[&str]) -> Result<()> {
    // setpass, login, and help work without authentication
    match tokens {
        ["help"] => {
            print_usage();
            return Ok(());
        }
        ["setpass", password] => {
            shell.store.set_password(password).await?;
            println!("Password set successfully.");
            return Ok(());
        }
        ["login", password] => {
            shell.session = Some(shell.store.login(password).await?);
            println!("Login successful.");
            return Ok(());
        }
        _ => {}
    }

    // Everything else needs a live session
    if shell.session.is_none() {
        println!(
            "Please login first. Use 'login <password>' or set a password with 'setpass <password>'."
        );
        return Ok(());
    }

    match tokens {
        ["create", filename] => {
            file_ops::create_file(Path::new(filename)).await?;
            println!("File {filename} created.");
        }
        ["open", filename] => {
            file_ops::open_with_default(Path::new(filename))?;
            println!("File {filename} opened.");
        }
        ["delete", filename] => {
            file_ops::delete_file(Path::new(filename)).await?;
            println!("File {filename} deleted.");
        }
        ["metadata", filename] => {
            let report = file_ops::entry_report(Path::new(filename)).await?;
            println!("File: {}", report.path);
            println!("Kind: {}", report.kind);
            println!("Size: {} bytes", report.size);
            if let Some(mode) = report.mode {
                println!("Permissions: {mode:o}");
            }
            if let Some(modified) = report.modified {
                println!("Last modified: {}", modified.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        ["list"] => cmd_list(Path::new(".")).await?,
        ["list", path] => cmd_list(Path::new(path)).await?,
        ["copy", src, dst] => {
            let bytes = file_ops::copy_file(Path::new(src), Path::new(dst)).await?;
            println!("File copied from {src} to {dst} ({bytes} bytes)");
        }
        ["move", src, dst] => {
            file_ops::rename_entry(Path::new(src), Path::new(dst)).await?;
            println!("File moved from {src} to {dst}");
        }
        ["rename", old, new] => {
            file_ops::rename_entry(Path::new(old), Path::new(new)).await?;
            println!("File renamed from {old} to {new}");
        }
        ["renamedir", old, new] => {
            file_ops::rename_entry(Path::new(old), Path::new(new)).await?;
            println!("Directory renamed from {old} to {new}");
        }
        ["createdir", dirname] => {
            file_ops::create_dir(Path::new(dirname)).await?;
            println!("Directory {dirname} created.");
        }
        ["deletedir", dirname] => cmd_deletedir(shell, dirname).await?,
        ["search", path, needle] => {
            let matches = file_ops::search(Path::new(path), needle).await?;
            if matches.is_empty() {
                println!("No matches for '{needle}' in {path}");
            }
            for (hit, kind) in matches {
                println!("{} ({kind})", hit.display());
            }
        }
        ["cd", dirname] => {
            file_ops::change_dir(Path::new(dirname))?;
            println!("Changed to directory {dirname}");
        }
        ["encrypt", filename, key] => cmd_transform(shell, filename, key, "encrypted").await?,
        ["decrypt", filename, key] => cmd_transform(shell, filename, key, "decrypted").await?,
        _ => {
            println!("Unknown command or wrong arguments.");
            print_usage();
        }
    }

    Ok(())
}

async fn cmd_list(path: &Path) -> Result<()> {
    let entries = file_ops::list_dir(path).await?;
    for (name, kind) in entries {
        println!("{name} ({kind})");
    }
    Ok(())
}

/// Two-phase directory removal: check, confirm if non-empty, execute.
async fn cmd_deletedir(shell: &Shell, dirname: &str) -> Result<()> {
    let path = Path::new(dirname);

    let forced = match shell.remover.check_removable(path).await {
        RemovalOutcome::Removed => false, // empty, no confirmation needed
        RemovalOutcome::NotEmptyNeedsConfirmation => {
            let answer =
                prompt_line(&format!("Directory {dirname} is not empty. Delete all contents? (y/n): "))?
                    .unwrap_or_default();
            if !answer.trim().eq_ignore_ascii_case("y") {
                println!("Deletion aborted.");
                return Ok(());
            }
            true
        }
        outcome => {
            render_removal_failure(&outcome);
            return Ok(());
        }
    };

    match shell.remover.execute(path, forced).await {
        RemovalOutcome::Removed => println!("Directory {dirname} deleted."),
        // The directory gained children between check and execute
        RemovalOutcome::NotEmptyNeedsConfirmation => {
            println!("Directory {dirname} is no longer empty. Deletion aborted.")
        }
        outcome => render_removal_failure(&outcome),
    }
    Ok(())
}

fn render_removal_failure(outcome: &RemovalOutcome) {
    match outcome {
        RemovalOutcome::NotFound => println!("Error: directory not found"),
        RemovalOutcome::NotADirectory => println!("Error: not a directory"),
        RemovalOutcome::PartialFailure { kind, path } => {
            println!(
                "Error: deletion stopped at {} ({kind}); entries removed before this point are gone",
                path.display()
            );
        }
        RemovalOutcome::Removed | RemovalOutcome::NotEmptyNeedsConfirmation => {}
    }
}

/// Encrypt and decrypt are the same in-place transform; only the verb in
/// the output differs.
async fn cmd_transform(shell: &Shell, filename: &str, key: &str, verb: &str) -> Result<()> {
    let path = Path::new(filename);
    let key = Zeroizing::new(key.as_bytes().to_vec());

    let total = fs::metadata(path)
        .await
        .with_context(|| format!("reading metadata for {filename}"))?
        .len();

    let pb = create_progress_bar(total, &format!("Transforming {filename}"));
    let bytes = shell.transformer.transform_in_place(path, &key).await?;
    pb.set_position(bytes);
    pb.finish_with_message(format!("{bytes} bytes {verb}"));

    println!("File {filename} {verb}.");
    Ok(())
}

/// Create a styled progress bar for file operations
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

//! Command dispatch: one function per subcommand.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{load_outline, require_label, TreeStats};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{NodeId, NodeRef, Outline, Traversal};
use crate::exitcode;
use crate::tree_traits::TreeNodeConvert;

/// Run the parsed command line, returning the process exit code.
pub fn execute(cli: &Cli) -> CliResult<i32> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `arbor --help`".to_string(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(exitcode::OK);
    }

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let settings = Settings::load(config_dir.as_deref())?;
    debug!(?settings, "settings loaded");

    match command {
        Commands::Show { file } => show(file, &settings),
        Commands::Walk { file, order, from } => {
            walk(file, order.as_deref(), from.as_deref(), &settings)
        }
        Commands::Ancestors { file, label } => ancestors(file, label, &settings),
        Commands::Siblings { file, label } => siblings(file, label, &settings),
        Commands::Contains { file, label, under } => {
            contains(file, label, under.as_deref(), &settings)
        }
        Commands::Branches { file } => branches(file, &settings),
        Commands::Stats { file } => stats(file, &settings),
        Commands::Config { command } => config(command, config_dir.as_deref(), &settings),
        Commands::Completion { .. } => Ok(exitcode::OK),
    }
}

fn node<'a>(outline: &'a Outline, id: NodeId) -> CliResult<NodeRef<'a, String>> {
    Ok(outline.forest.node(id)?)
}

#[instrument(skip(settings))]
fn show(file: &Path, settings: &Settings) -> CliResult<i32> {
    let outline = load_outline(file, settings)?;
    if outline.forest.is_empty() {
        output::warning("outline is empty");
        return Ok(exitcode::OK);
    }
    print!("{}", outline.forest.to_tree_string());
    Ok(exitcode::OK)
}

#[instrument(skip(settings))]
fn walk(
    file: &Path,
    order: Option<&str>,
    from: Option<&str>,
    settings: &Settings,
) -> CliResult<i32> {
    let order: Traversal = match order {
        Some(name) => name.parse()?,
        None => settings.traversal,
    };
    let outline = load_outline(file, settings)?;
    let starts = match from {
        Some(label) => vec![require_label(&outline, label)?],
        None => outline.roots.clone(),
    };

    for start in starts {
        for visited in node(&outline, start)?.self_and_descendants(order) {
            if settings.show_depth {
                output::info(&format!("{}\t{}", visited.depth(), visited.value()));
            } else {
                output::info(visited.value());
            }
        }
    }
    Ok(exitcode::OK)
}

#[instrument(skip(settings))]
fn ancestors(file: &Path, label: &str, settings: &Settings) -> CliResult<i32> {
    let outline = load_outline(file, settings)?;
    let target = node(&outline, require_label(&outline, label)?)?;
    if target.is_root() {
        output::warning(&format!("{label} is a root"));
    }
    for ancestor in target.ancestors() {
        output::info(ancestor.value());
    }
    Ok(exitcode::OK)
}

#[instrument(skip(settings))]
fn siblings(file: &Path, label: &str, settings: &Settings) -> CliResult<i32> {
    let outline = load_outline(file, settings)?;
    let target = node(&outline, require_label(&outline, label)?)?;

    let previous: Vec<_> = target.previous_siblings().collect();
    for sibling in previous.iter().rev() {
        output::detail(sibling.value());
    }
    println!("{} {}", "*".cyan().bold(), target.value().as_str().bold());
    for sibling in target.following_siblings() {
        output::detail(sibling.value());
    }
    Ok(exitcode::OK)
}

#[instrument(skip(settings))]
fn contains(file: &Path, label: &str, under: Option<&str>, settings: &Settings) -> CliResult<i32> {
    let outline = load_outline(file, settings)?;
    let scopes = match under {
        Some(scope) => vec![require_label(&outline, scope)?],
        None => outline.roots.clone(),
    };

    let wanted = label.to_string();
    let mut found = false;
    for scope in scopes {
        if node(&outline, scope)?.contains_value(&wanted) {
            found = true;
            break;
        }
    }

    output::info(&found);
    Ok(if found {
        exitcode::OK
    } else {
        exitcode::NOT_FOUND
    })
}

#[instrument(skip(settings))]
fn branches(file: &Path, settings: &Settings) -> CliResult<i32> {
    let outline = load_outline(file, settings)?;
    for &root in &outline.roots {
        for branch in node(&outline, root)?.branches() {
            output::info(&branch.iter().map(|n| n.value()).join(" <- "));
        }
    }
    Ok(exitcode::OK)
}

#[instrument(skip(settings))]
fn stats(file: &Path, settings: &Settings) -> CliResult<i32> {
    let outline = load_outline(file, settings)?;
    let stats = TreeStats::collect(&outline)?;
    output::header(&file.display());
    output::action("roots", &stats.roots);
    output::action("nodes", &stats.nodes);
    output::action("leaves", &stats.leaves);
    output::action("max depth", &stats.max_depth);
    output::action("max children", &stats.max_children);
    Ok(exitcode::OK)
}

fn config(command: &ConfigCommands, dir: Option<&Path>, settings: &Settings) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => print!("{}", settings.to_toml()?),
        ConfigCommands::Template => print!("{}", Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            if let Some(dir) = dir {
                output::action("local", &local_config_path(dir).display());
            }
        }
    }
    Ok(exitcode::OK)
}

//! Command dispatch: every editing command loads the form, edits it through the
//! tree store and saves the full tree.

use std::io::{self, BufRead};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::TreeStore;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::sample::sample_forest;
use crate::domain::{FormMeta, FormTree, WireNode};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{GatewayError, PersistenceGateway};
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeDisplay;

pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `formtree --help`".into(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    if let Commands::Config { command } = command {
        return cmd_config(command, &settings, cli.config.as_deref());
    }

    let container = ServiceContainer::new(settings)?;
    match command {
        Commands::Show { form, ids } => cmd_show(&container, form, *ids).await,
        Commands::Export { form } => cmd_export(&container, form).await,
        Commands::Import { form, file } => cmd_import(&container, form, file).await,
        Commands::Seed { form, force } => cmd_seed(&container, form, *force).await,
        Commands::Add {
            form,
            parent,
            label,
        } => cmd_add(&container, form, parent, label).await,
        Commands::Rename { form, id, label } => cmd_rename(&container, form, id, label).await,
        Commands::Select { form, ids } => cmd_select(&container, form, ids).await,
        Commands::Delete {
            form,
            ids,
            children,
            yes,
        } => cmd_delete(&container, form, ids, *children, *yes).await,
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

async fn open(container: &ServiceContainer, form: &str) -> CliResult<TreeStore> {
    let mut store = container.tree_store();
    store.load(form).await?;
    Ok(store)
}

/// Turn the store's last notification into a refusal.
fn rejected(store: &TreeStore, fallback: String) -> CliError {
    match store.notification() {
        Some(n) if n.is_error() => CliError::Rejected(n.message.clone()),
        _ => CliError::InvalidArgs(fallback),
    }
}

async fn save(store: &mut TreeStore) -> CliResult<()> {
    let result = store.save().await;
    if let Some(n) = store.notification() {
        output::notification(n);
    }
    result.map_err(CliError::from)
}

fn warn_unknown(tree: &FormTree, ids: &[String]) {
    for id in ids.iter().filter(|id| !tree.contains(id)) {
        output::warning(&format!("unknown node id: {}", id));
    }
}

fn loaded_tree(store: &TreeStore) -> CliResult<&FormTree> {
    store.tree().ok_or_else(|| ApplicationError::NotLoaded.into())
}

#[instrument(skip(container))]
async fn cmd_show(container: &ServiceContainer, form: &str, ids: bool) -> CliResult<()> {
    let store = open(container, form).await?;
    if let Some(meta) = store.form() {
        output::header(&meta.name);
        if !meta.description.is_empty() {
            output::detail(&meta.description);
        }
    }
    for tree in loaded_tree(&store)?.to_display_trees(ids) {
        output::info(&tree);
    }
    Ok(())
}

#[instrument(skip(container))]
async fn cmd_export(container: &ServiceContainer, form: &str) -> CliResult<()> {
    let store = open(container, form).await?;
    let json = serde_json::to_string_pretty(&loaded_tree(&store)?.to_forest())
        .map_err(|e| InfraError::json("serialize form tree", e))?;
    output::info(&json);
    Ok(())
}

/// Form metadata to save under: the stored one if the form exists.
///
/// Only a missing form yields fresh metadata; a stored form that cannot be read is an error.
async fn existing_or_new_meta(
    container: &ServiceContainer,
    form: &str,
) -> CliResult<(FormMeta, bool)> {
    match container.gateway.load_tree(form).await {
        Ok(doc) => Ok((doc.meta(), true)),
        Err(GatewayError::NotFound(_)) => {
            debug!("{}: no stored form", form);
            let meta = FormMeta {
                id: form.to_string(),
                name: form.to_string(),
                description: String::new(),
            };
            Ok((meta, false))
        }
        Err(e) => Err(ApplicationError::from(e).into()),
    }
}

#[instrument(skip(container))]
async fn cmd_import(container: &ServiceContainer, form: &str, file: &Path) -> CliResult<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| InfraError::io(format!("read {}", file.display()), e))?;
    let forest: Vec<WireNode> = serde_json::from_str(&content)
        .map_err(|e| InfraError::json(format!("parse {}", file.display()), e))?;
    let tree = FormTree::from_forest(forest).map_err(ApplicationError::from)?;

    let (meta, _) = existing_or_new_meta(container, form).await?;
    let mut store = container.tree_store();
    store.adopt(meta, tree);
    save(&mut store).await
}

#[instrument(skip(container))]
async fn cmd_seed(container: &ServiceContainer, form: &str, force: bool) -> CliResult<()> {
    let (meta, exists) = existing_or_new_meta(container, form).await?;
    if exists && !force {
        return Err(CliError::Usage(format!(
            "form {} already has a tree, use --force to overwrite",
            form
        )));
    }
    let tree = FormTree::from_forest(sample_forest()).map_err(ApplicationError::from)?;

    let mut store = container.tree_store();
    store.adopt(meta, tree);
    save(&mut store).await
}

#[instrument(skip(container))]
async fn cmd_add(
    container: &ServiceContainer,
    form: &str,
    parent: &str,
    label: &str,
) -> CliResult<()> {
    let mut store = open(container, form).await?;
    if !store.apply_insert(parent, label) {
        return Err(rejected(&store, format!("unknown node id: {}", parent)));
    }
    if let Some(id) = loaded_tree(&store)?.children_of(parent).last() {
        output::action("Added", id);
    }
    save(&mut store).await
}

#[instrument(skip(container))]
async fn cmd_rename(
    container: &ServiceContainer,
    form: &str,
    id: &str,
    label: &str,
) -> CliResult<()> {
    let mut store = open(container, form).await?;
    if !store.apply_update(id, label) {
        return Err(rejected(&store, format!("unknown node id: {}", id)));
    }
    output::action("Renamed", id);
    save(&mut store).await
}

/// Toggle `ids` on and compute their selection closure.
fn select_closure(store: &mut TreeStore, ids: &[String]) {
    for id in ids {
        store.toggle(id, true);
    }
    store.select_descendants_of_toggled();
}

#[instrument(skip(container))]
async fn cmd_select(container: &ServiceContainer, form: &str, ids: &[String]) -> CliResult<()> {
    let mut store = open(container, form).await?;
    warn_unknown(loaded_tree(&store)?, ids);
    select_closure(&mut store, ids);

    let tree = loaded_tree(&store)?;
    for id in store.selection() {
        output::info(&format!("{}\t{}", id, tree.label_of(id).unwrap_or_default()));
    }
    Ok(())
}

fn confirm(question: &str) -> CliResult<bool> {
    output::prompt(&format!("{} [y/N]", question));
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| InfraError::io("read confirmation", e))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[instrument(skip(container))]
async fn cmd_delete(
    container: &ServiceContainer,
    form: &str,
    ids: &[String],
    children: bool,
    yes: bool,
) -> CliResult<()> {
    let mut store = open(container, form).await?;
    warn_unknown(loaded_tree(&store)?, ids);

    if children {
        select_closure(&mut store, ids);
    } else {
        store.set_selection(ids.iter().cloned());
    }

    if !store.request_delete_selected() {
        return Err(rejected(&store, "nothing to delete".into()));
    }

    let tree = loaded_tree(&store)?;
    output::header(&format!("Deleting {} nodes:", store.selection().len()));
    for id in store.selection() {
        output::detail(&tree.label_of(id).unwrap_or(id.as_str()));
    }

    if !yes && !confirm("Delete the selected nodes?")? {
        store.cancel_delete();
        output::info("Cancelled");
        return Ok(());
    }

    store.confirm_delete();
    save(&mut store).await
}

fn cmd_config(
    command: &ConfigCommands,
    settings: &Settings,
    config_file: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            let local = config_file
                .map(Path::to_path_buf)
                .unwrap_or_else(|| local_config_path(Path::new(".")));
            output::action("local", &local.display());
        }
    }
    Ok(())
}

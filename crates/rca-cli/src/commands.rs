//! Command-line surface
//!
//! [`cli`] declares the commands, [`Request::from_matches`] turns parsed
//! arguments into a typed request and [`execute`] runs it against an engine,
//! producing the JSON document printed on stdout.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rca_core::{NewRootCause, ProjectId, RootCauseId, RootCauseScope};
use rca_engine::RootCauseEngine;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Options shared by every command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Seed file for the in-memory adapters
    pub seed: Option<PathBuf>,
    /// Engine configuration file
    pub config: Option<PathBuf>,
    /// Act as an administrator
    pub admin: bool,
}

/// One engine operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Tree visible to a project
    Tree {
        /// Requested project
        project: ProjectId,
        /// Keep disabled subtrees
        include_disabled: bool,
    },
    /// Flat listing, optionally narrowed to one project
    List {
        /// Requested project
        project: Option<ProjectId>,
    },
    /// One record
    Get(RootCauseId),
    /// Direct children of a record as seen by a project
    Children {
        /// Parent record
        id: RootCauseId,
        /// Requested project
        project: ProjectId,
    },
    /// New record
    Create(NewRootCause),
    /// Record plus subtree
    Delete(RootCauseId),
    /// Set the disabled flag
    Disable(RootCauseId),
    /// Clear the disabled flag
    Enable(RootCauseId),
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(RootCauseId))
        .help("Root cause id (ULID)")
}

fn project_arg(required: bool) -> Arg {
    Arg::new("project")
        .long("project")
        .short('p')
        .required(required)
        .help("Project key")
}

/// Declare the `rca` command line
#[must_use]
pub fn cli() -> Command {
    Command::new("rca")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Root-cause classification hierarchy")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON or YAML file with records and test runs to start from"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML engine configuration"),
        )
        .arg(
            Arg::new("admin")
                .long("admin")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Act as an administrator"),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the tree a project sees")
                .arg(project_arg(true))
                .arg(
                    Arg::new("include-disabled")
                        .long("include-disabled")
                        .action(ArgAction::SetTrue)
                        .help("Keep disabled nodes and their subtrees"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List records")
                .arg(project_arg(false)),
        )
        .subcommand(Command::new("get").about("Show one record").arg(id_arg()))
        .subcommand(
            Command::new("children")
                .about("List the direct children of a record")
                .arg(id_arg())
                .arg(project_arg(true)),
        )
        .subcommand(
            Command::new("create")
                .about("Create a record")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .short('n')
                        .required(true)
                        .help("Display name"),
                )
                .arg(project_arg(false).help("Owning project; omit for a GLOBAL record"))
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .value_parser(value_parser!(RootCauseId))
                        .help("Parent record id"),
                )
                .arg(
                    Arg::new("disabled")
                        .long("disabled")
                        .action(ArgAction::SetTrue)
                        .help("Create disabled"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a record and its subtree")
                .arg(id_arg()),
        )
        .subcommand(Command::new("disable").about("Disable a record").arg(id_arg()))
        .subcommand(Command::new("enable").about("Enable a record").arg(id_arg()))
}

impl GlobalOptions {
    /// Read the global options
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            seed: matches.get_one::<PathBuf>("seed").cloned(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            admin: matches.get_flag("admin"),
        }
    }
}

impl Request {
    /// Read the selected subcommand
    ///
    /// # Errors
    /// Fails if no known subcommand was selected.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let project =
            |args: &ArgMatches| args.get_one::<String>("project").cloned().map(ProjectId::from);
        let id = |args: &ArgMatches| {
            args.get_one::<RootCauseId>("id")
                .copied()
                .context("missing root cause id")
        };

        let request = match matches.subcommand() {
            Some(("tree", args)) => Self::Tree {
                project: project(args).context("missing --project")?,
                include_disabled: args.get_flag("include-disabled"),
            },
            Some(("list", args)) => Self::List {
                project: project(args),
            },
            Some(("get", args)) => Self::Get(id(args)?),
            Some(("children", args)) => Self::Children {
                id: id(args)?,
                project: project(args).context("missing --project")?,
            },
            Some(("create", args)) => {
                let name = args
                    .get_one::<String>("name")
                    .context("missing --name")?;
                let scope = match project(args) {
                    Some(project_id) => RootCauseScope::Custom(project_id),
                    None => RootCauseScope::Global,
                };
                let mut candidate = NewRootCause::new(name.as_str(), scope);
                if let Some(parent) = args.get_one::<RootCauseId>("parent") {
                    candidate = candidate.with_parent(*parent);
                }
                if args.get_flag("disabled") {
                    candidate = candidate.disabled();
                }
                Self::Create(candidate)
            }
            Some(("delete", args)) => Self::Delete(id(args)?),
            Some(("disable", args)) => Self::Disable(id(args)?),
            Some(("enable", args)) => Self::Enable(id(args)?),
            Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
            None => anyhow::bail!("no command given"),
        };
        Ok(request)
    }
}

/// Run `request` and render its result
///
/// # Errors
/// Engine failures are returned with the command as context.
pub async fn execute(engine: &RootCauseEngine, request: Request) -> Result<Value> {
    let value = match request {
        Request::Tree {
            project,
            include_disabled,
        } => {
            let forest = engine
                .get_tree(&project, !include_disabled)
                .await
                .with_context(|| format!("building tree for project '{project}'"))?;
            serde_json::to_value(forest)?
        }
        Request::List { project: None } => {
            serde_json::to_value(engine.get_all().await.context("listing root causes")?)?
        }
        Request::List {
            project: Some(project),
        } => serde_json::to_value(
            engine
                .get_all_by_project(&project)
                .await
                .with_context(|| format!("listing root causes of project '{project}'"))?,
        )?,
        Request::Get(id) => {
            serde_json::to_value(engine.get(id).await.with_context(|| format!("reading {id}"))?)?
        }
        Request::Children { id, project } => {
            let node = engine.get(id).await.with_context(|| format!("reading {id}"))?;
            let children = engine
                .children_of(&node, &project)
                .await
                .with_context(|| format!("listing children of {id}"))?;
            serde_json::to_value(children)?
        }
        Request::Create(candidate) => {
            serde_json::to_value(engine.create(candidate).await.context("creating root cause")?)?
        }
        Request::Delete(id) => {
            engine
                .delete_by_id(id)
                .await
                .with_context(|| format!("deleting {id}"))?;
            json!({
                "deleted": id,
                "remaining": engine.get_all().await?.len(),
            })
        }
        Request::Disable(id) => serde_json::to_value(
            engine
                .disable(id)
                .await
                .with_context(|| format!("disabling {id}"))?,
        )?,
        Request::Enable(id) => serde_json::to_value(
            engine
                .enable(id)
                .await
                .with_context(|| format!("enabling {id}"))?,
        )?,
    };
    Ok(value)
}

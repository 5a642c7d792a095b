use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kurl_cli::{ContextFile, Operation, Report};
use kurl_resolver::NodeContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn url_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).arg(
        Arg::new("url")
            .required(true)
            .help("knime:// URL, e.g. knime://knime.workflow/data/x.csv"),
    )
}

fn cli() -> Command {
    Command::new("kurl")
        .version(kurl_resolver::VERSION)
        .about("Resolve knime:// workflow URLs")
        .subcommand_required(true)
        .arg(
            Arg::new("context")
                .long("context")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Context file (TOML, or JSON with a .json extension)"),
        )
        .arg(
            Arg::new("node-workflow-dir")
                .long("node-workflow-dir")
                .global(true)
                .requires("node-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Workflow directory of the node for node-relative URLs"),
        )
        .arg(
            Arg::new("node-dir")
                .long("node-dir")
                .global(true)
                .requires("node-workflow-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Directory of the node for node-relative URLs"),
        )
        .arg(
            Arg::new("unsaved-node")
                .long("unsaved-node")
                .global(true)
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["node-workflow-dir", "node-dir"])
                .help("Resolve node-relative URLs for a node that was never saved"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log resolution steps to stderr"),
        )
        .subcommand(url_command("classify", "Show category, path and version of a URL"))
        .subcommand(url_command("resolve", "Resolve a URL to a concrete location"))
        .subcommand(url_command("absolute", "Show the mountpoint-absolute form of a URL"))
        .subcommand(url_command("link-types", "List every symbolic form of a URL"))
}

fn node_context(args: &ArgMatches) -> Option<NodeContext> {
    if args.get_flag("unsaved-node") {
        return Some(NodeContext::unsaved());
    }
    let workflow_dir = args.get_one::<PathBuf>("node-workflow-dir")?;
    let node_dir = args.get_one::<PathBuf>("node-dir")?;
    Some(NodeContext::saved(workflow_dir, node_dir))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };

    let filter = if args.get_flag("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let operation = Operation::from_name(name).context("unknown subcommand")?;
    let url = args
        .get_one::<String>("url")
        .context("missing URL argument")?;

    let file = match args.get_one::<PathBuf>("context") {
        Some(path) => ContextFile::load(path)?,
        None => ContextFile::default(),
    };
    let resolver = file.resolver()?;
    let node = node_context(args);

    let report = Report::run(operation, &resolver, url, node.as_ref())?;
    if args.get_flag("json") {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
    }
    Ok(())
}

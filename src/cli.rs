use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::ImportOptions;

/// Import an OWL ontology or JSON export into a content store.
#[derive(Parser, Debug)]
#[command(name = "owl-import", author, version, about, long_about = None)]
pub struct Args {
    /// Content store directory (holds store.json and files/)
    pub store: PathBuf,

    /// Input file (.owl, .rdf, .xml, .ttl, .nt or .json)
    pub input: PathBuf,

    /// Id of the user owning created nodes and files
    pub user_id: u64,

    /// Import vocabularies and their terms (1/0)
    #[arg(action = ArgAction::Set, required = true, value_parser = parse_flag)]
    pub import_vocabularies: bool,

    /// Import nodes (1/0)
    #[arg(action = ArgAction::Set, required = true, value_parser = parse_flag)]
    pub import_nodes: bool,

    /// Import classes under Node as nodes too (1/0)
    #[arg(action = ArgAction::Set, required = true, value_parser = parse_flag)]
    pub classes_as_nodes: bool,

    /// Only import leaf classes as nodes (1/0)
    #[arg(action = ArgAction::Set, required = true, value_parser = parse_flag)]
    pub only_leaf_classes: bool,

    /// Clear existing vocabularies before importing (1/0)
    #[arg(action = ArgAction::Set, required = true, value_parser = parse_flag)]
    pub overwrite: bool,

    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log file, defaults to the configured name inside the store directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Delete everything created by a run that fails
    #[arg(long)]
    pub rollback: bool,
}

impl Args {
    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            user_id: self.user_id,
            import_vocabularies: self.import_vocabularies,
            import_nodes: self.import_nodes,
            classes_as_nodes: self.classes_as_nodes,
            only_leaf_classes: self.only_leaf_classes,
            overwrite: self.overwrite,
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(format!("expected 1/0, true/false or yes/no, got '{other}'")),
    }
}

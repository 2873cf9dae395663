//! Feedstore command line
//!
//! Builds a fresh store (seeded with demo data unless `--empty` is given),
//! runs one operation against it and prints the result as JSON.

use clap::{value_parser, Arg, ArgMatches, Command};
use feedstore::core::types::DocId;
use feedstore::storage::{create_shared_storage, DocumentStorage};
use feedstore::system::metrics;
use feedstore::{Config, Error, FeedService, Result};
use serde::Serialize;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    let matches = cli().get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;

    feedstore::init(&config)?;

    let storage = create_shared_storage(&config.store)?;
    let service = FeedService::new(storage);

    let (name, args) = matches
        .subcommand()
        .ok_or_else(|| Error::config("No command given"))?;
    info!(command = name, "Running command");

    run(&service, name, args).map_err(|e| {
        if e.is_client_error() {
            warn!(command = name, error = %e, "Command rejected");
        } else {
            error!(command = name, error = %e, "Command failed");
        }
        e
    })
}

fn cli() -> Command {
    Command::new("feedstore")
        .version(feedstore::VERSION)
        .about("In-memory document store serving hydrated social feeds.")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("empty")
                .long("empty")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Start without demo data"),
        )
        .subcommand(
            Command::new("feed")
                .about("Show a user's hydrated feed")
                .arg(id_arg("user")),
        )
        .subcommand(
            Command::new("item")
                .about("Show a hydrated feed item")
                .arg(id_arg("id")),
        )
        .subcommand(
            Command::new("search")
                .about("Search a user's feed, ignoring case")
                .arg(id_arg("user"))
                .arg(text_arg("query")),
        )
        .subcommand(
            Command::new("post")
                .about("Post a status update")
                .arg(id_arg("user"))
                .arg(text_arg("location"))
                .arg(text_arg("text")),
        )
        .subcommand(
            Command::new("comment")
                .about("Comment on a feed item")
                .arg(id_arg("item"))
                .arg(id_arg("user"))
                .arg(text_arg("text")),
        )
        .subcommand(
            Command::new("like")
                .about("Like a feed item")
                .arg(id_arg("item"))
                .arg(id_arg("user")),
        )
        .subcommand(
            Command::new("unlike")
                .about("Withdraw a like from a feed item")
                .arg(id_arg("item"))
                .arg(id_arg("user")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a feed item and remove it from every feed")
                .arg(id_arg("item")),
        )
        .subcommand(
            Command::new("dump")
                .about("Print every document of a collection")
                .arg(text_arg("collection")),
        )
        .subcommand(Command::new("metrics").about("Print metrics in Prometheus text format"))
}

fn id_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("ID")
        .required(true)
        .value_parser(value_parser!(u64))
}

fn text_arg(name: &'static str) -> Arg {
    Arg::new(name).long(name).value_name("TEXT").required(true)
}

/// Apply command line overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) -> Result<()> {
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if matches.get_flag("empty") {
        config.store.seed_demo_data = false;
    }

    config.validate()
}

fn run(service: &FeedService, command: &str, args: &ArgMatches) -> Result<()> {
    match command {
        "feed" => print_json(&service.get_feed(id(args, "user")?)?),
        "item" => print_json(&service.resolve_feed_item(id(args, "id")?)?),
        "search" => print_json(&service.search_feed_items(id(args, "user")?, text(args, "query")?)?),
        "post" => print_json(&service.post_status_update(
            id(args, "user")?,
            text(args, "location")?,
            text(args, "text")?,
        )?),
        "comment" => print_json(&service.post_comment(
            id(args, "item")?,
            id(args, "user")?,
            text(args, "text")?,
        )?),
        "like" => print_json(&service.like_feed_item(id(args, "item")?, id(args, "user")?)?),
        "unlike" => print_json(&service.unlike_feed_item(id(args, "item")?, id(args, "user")?)?),
        "delete" => {
            let item = id(args, "item")?;
            let feeds = service.delete_feed_item(item)?;
            print_json(&serde_json::json!({ "deleted": item, "feedsUpdated": feeds }))
        }
        "dump" => print_json(&service.store().get_collection(text(args, "collection")?)),
        "metrics" => {
            print!("{}", metrics::gather_text());
            Ok(())
        }
        other => Err(Error::config(format!("Unknown command: {}", other))),
    }
}

fn id(args: &ArgMatches, name: &str) -> Result<DocId> {
    args.get_one::<u64>(name)
        .copied()
        .ok_or_else(|| Error::config(format!("Missing --{}", name)))
}

fn text<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| Error::config(format!("Missing --{}", name)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_post_arguments_parse() {
        let matches = cli()
            .try_get_matches_from([
                "feedstore", "post", "--user", "4", "--location", "NYC", "--text", "hello",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "post");
        assert_eq!(id(args, "user").unwrap(), 4);
        assert_eq!(text(args, "text").unwrap(), "hello");
    }

    #[test]
    fn test_missing_item_is_a_client_error() {
        let store = create_shared_storage(&Default::default()).unwrap();
        let service = FeedService::new(store);
        let matches = cli()
            .try_get_matches_from(["feedstore", "like", "--item", "77", "--user", "2"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();

        let err = run(&service, name, args).unwrap_err();
        assert!(err.is_client_error());
        assert!(matches!(err, Error::NotFound { id: 77, .. }));
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        assert!(cli().try_get_matches_from(["feedstore", "feed", "--user", "four"]).is_err());
    }

    #[test]
    fn test_empty_flag_disables_seeding() {
        let matches = cli()
            .try_get_matches_from(["feedstore", "--empty", "metrics"])
            .unwrap();
        let mut config = Config::default();
        apply_cli_overrides(&mut config, &matches).unwrap();
        assert!(!config.store.seed_demo_data);
    }
}

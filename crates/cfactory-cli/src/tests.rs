use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["cfactory-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["cfactory-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["cfactory-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn runs_submit_defaults_config_to_empty_object() {
    let cli = Cli::try_parse_from(["cfactory-cli", "runs", "submit", "harvest"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Runs {
            command: RunsCommands::Submit { ref kind, ref config }
        }) if kind == "harvest" && config == "{}"
    ));
}

#[test]
fn runs_exec_accepts_json_config() {
    let cli = Cli::try_parse_from([
        "cfactory-cli",
        "runs",
        "exec",
        "discovery",
        "--config",
        r#"{"queries":["wildberries"],"limit":5}"#,
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Runs {
            command: RunsCommands::Exec { ref kind, .. }
        }) if kind == "discovery"
    ));
}

#[test]
fn runs_submit_requires_a_kind() {
    assert!(Cli::try_parse_from(["cfactory-cli", "runs", "submit"]).is_err());
}

#[test]
fn runs_list_defaults_limit() {
    let cli = Cli::try_parse_from(["cfactory-cli", "runs", "list"]).expect("valid");
    assert!(matches!(
        cli.command,
        Some(Commands::Runs {
            command: RunsCommands::List { limit: 20 }
        })
    ));
}

#[test]
fn content_approve_takes_theme() {
    let cli = Cli::try_parse_from(["cfactory-cli", "content", "approve", "42", "--theme", "light"])
        .expect("valid");
    assert!(matches!(
        cli.command,
        Some(Commands::Content {
            command: ContentCommands::Approve { id: 42, theme: Some(ref t) }
        }) if t == "light"
    ));
}

#[test]
fn content_approve_rejects_non_numeric_id() {
    assert!(Cli::try_parse_from(["cfactory-cli", "content", "approve", "abc"]).is_err());
}

#[test]
fn worker_once_flag() {
    let cli = Cli::try_parse_from(["cfactory-cli", "worker", "--once"]).expect("valid");
    assert!(matches!(cli.command, Some(Commands::Worker { once: true })));

    let cli = Cli::try_parse_from(["cfactory-cli", "worker"]).expect("valid");
    assert!(matches!(cli.command, Some(Commands::Worker { once: false })));
}

#[test]
fn recover_accepts_staleness_override() {
    let cli = Cli::try_parse_from(["cfactory-cli", "recover", "--stale-after-secs", "60"])
        .expect("valid");
    assert!(matches!(
        cli.command,
        Some(Commands::Recover {
            stale_after_secs: Some(60)
        })
    ));
}

#[test]
fn parse_config_accepts_objects_only() {
    assert!(runs::parse_config(r#"{"batch_size":10}"#).is_ok());
    assert!(runs::parse_config("[1,2]").is_err());
    assert!(runs::parse_config("not json").is_err());
}

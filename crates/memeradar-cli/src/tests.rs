use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["memeradar", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["memeradar"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn analyze_defaults_to_summary_output() {
    let cli = Cli::try_parse_from(["memeradar", "analyze"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Analyze { json: false })));
}

#[test]
fn analyze_json_flag() {
    let cli = Cli::try_parse_from(["memeradar", "analyze", "--json"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Analyze { json: true })));
}

#[test]
fn trends_defaults() {
    let cli = Cli::try_parse_from(["memeradar", "trends"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Trends {
            hours: 24,
            limit: 20
        })
    ));
}

#[test]
fn trends_with_window_and_limit() {
    let cli =
        Cli::try_parse_from(["memeradar", "trends", "--hours", "6", "--limit", "5"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Trends { hours: 6, limit: 5 })
    ));
}

#[test]
fn watchlist_without_status_shows_top_creators() {
    let cli = Cli::try_parse_from(["memeradar", "watchlist"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Watchlist {
            status: None,
            limit: 20
        })
    ));
}

#[test]
fn watchlist_status_filter_parses() {
    let cli = Cli::try_parse_from(["memeradar", "watchlist", "--status", "dropped"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Watchlist {
            status: Some(WatchlistStatus::Dropped),
            ..
        })
    ));
}

#[test]
fn watchlist_rejects_unknown_status() {
    let result = Cli::try_parse_from(["memeradar", "watchlist", "--status", "paused"]);
    assert!(result.is_err());
}

#[test]
fn phrases_min_videos() {
    let cli = Cli::try_parse_from(["memeradar", "phrases", "--min-videos", "3"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Phrases {
            min_videos: 3,
            limit: 20
        })
    ));
}

#[test]
fn trends_rejects_negative_hours() {
    let result = Cli::try_parse_from(["memeradar", "trends", "--hours", "-1"]);
    assert!(result.is_err());
}

use super::*;
use clap::error::ErrorKind;

#[test]
fn capture_defaults_to_single_iteration() {
    let cli = Cli::try_parse_from(["redump", "capture", "--decoder", "ipv4", "cur_input"])
        .expect("parse capture");
    match cli.command {
        Commands::Capture {
            decoder,
            persistent,
            unbounded,
            input,
            ..
        } => {
            assert_eq!(decoder, DecoderKind::Ipv4);
            assert_eq!(persistent, None);
            assert!(!unbounded);
            assert_eq!(input, PathBuf::from("cur_input"));
            let budget = select_budget(&HarnessConfig::default(), persistent, unbounded);
            assert_eq!(budget, IterationBudget::Once);
        }
        _ => panic!("expected capture command"),
    }
}

#[test]
fn persistent_flag_takes_optional_count() {
    let bare = Cli::try_parse_from([
        "redump",
        "capture",
        "--decoder",
        "ipv6",
        "--persistent",
        "--",
        "cur_input",
    ])
    .expect("parse bare --persistent");
    let Commands::Capture { persistent, .. } = bare.command else {
        panic!("expected capture command");
    };
    assert_eq!(persistent, Some(None));
    assert_eq!(
        select_budget(&HarnessConfig::default(), persistent, false),
        IterationBudget::Persistent(1000)
    );

    let counted = Cli::try_parse_from([
        "redump",
        "capture",
        "--decoder",
        "ipv6",
        "--persistent",
        "25",
        "cur_input",
    ])
    .expect("parse --persistent 25");
    let Commands::Capture { persistent, .. } = counted.command else {
        panic!("expected capture command");
    };
    assert_eq!(persistent, Some(Some(25)));
}

#[test]
fn persistent_count_falls_back_to_config() {
    let config = HarnessConfig {
        persistent_iterations: Some(7),
        ..HarnessConfig::default()
    };
    assert_eq!(
        select_budget(&config, Some(None), false),
        IterationBudget::Persistent(7)
    );
    assert_eq!(
        select_budget(&config, Some(Some(3)), false),
        IterationBudget::Persistent(3)
    );
    assert_eq!(select_budget(&config, None, true), IterationBudget::Unbounded);
}

#[test]
fn persistent_conflicts_with_unbounded() {
    let err = Cli::try_parse_from([
        "redump",
        "capture",
        "--decoder",
        "ipv4",
        "--persistent",
        "5",
        "--unbounded",
        "cur_input",
    ])
    .expect_err("flags are exclusive");
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn unknown_decoder_is_rejected() {
    let err = Cli::try_parse_from(["redump", "replay", "--decoder", "tcp", "crash"])
        .expect_err("tcp is not a decoder");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn global_flags_parse_after_subcommand() {
    let cli = Cli::try_parse_from([
        "redump", "list", "--json", "--dump-dir", "/tmp/d", "--config", "h.toml", "-v",
    ])
    .expect("parse list");
    assert_eq!(cli.dump_dir, Some(PathBuf::from("/tmp/d")));
    assert_eq!(cli.config, Some(PathBuf::from("h.toml")));
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::List { json: true }));
}

#[test]
fn replay_parses_limit_and_prefix() {
    let cli = Cli::try_parse_from([
        "redump",
        "replay",
        "--decoder",
        "ipv4",
        "--limit",
        "2",
        "1700000000-5",
    ])
    .expect("parse replay");
    match cli.command {
        Commands::Replay { limit, prefix, .. } => {
            assert_eq!(limit, Some(2));
            assert_eq!(prefix, "1700000000-5");
        }
        _ => panic!("expected replay command"),
    }
}

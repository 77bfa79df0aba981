use super::*;

fn cli() -> Cli {
    Cli {
        config: PathBuf::from("config.yaml"),
        id: None,
        server_address: None,
        batch_max_amount: None,
        poll_retry_ms: None,
        poll_max_attempts: None,
        connect_delay_ms: None,
        io_timeout_ms: None,
        data_file: None,
        log_level: None,
        bet: SingleBetArgs::default(),
    }
}

fn yaml(raw: &str) -> FileConfig {
    FileConfig::parse(raw, Path::new("config.yaml")).expect("yaml")
}

#[test]
fn defaults_apply_when_only_id_given() {
    let cfg = ClientConfig::resolve(
        Cli {
            id: Some("3".to_owned()),
            ..cli()
        },
        FileConfig::default(),
    )
    .expect("config");

    assert_eq!(cfg.id, "3");
    assert_eq!(cfg.server_address, DEFAULT_SERVER_ADDRESS);
    assert_eq!(cfg.max_batch_size.get(), DEFAULT_BATCH_MAX_AMOUNT);
    assert_eq!(cfg.poll_retry, Duration::from_millis(DEFAULT_POLL_RETRY_MS));
    assert_eq!(cfg.connect_delay, Duration::from_millis(DEFAULT_CONNECT_DELAY_MS));
    assert_eq!(cfg.poll_max_attempts, None);
    assert_eq!(cfg.io_timeout, None);
    assert_eq!(cfg.data_file, PathBuf::from(DEFAULT_DATA_FILE));
    assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
    assert_eq!(cfg.single_bet, None);
}

#[test]
fn missing_id_is_error() {
    let err = ClientConfig::resolve(cli(), FileConfig::default()).expect_err("no id");
    assert!(matches!(err, ConfigError::Missing("id")));
}

#[test]
fn id_with_protocol_separator_is_rejected() {
    let err = ClientConfig::resolve(
        Cli {
            id: Some("1|2".to_owned()),
            ..cli()
        },
        FileConfig::default(),
    )
    .expect_err("bad id");
    assert!(matches!(err, ConfigError::Invalid { field: "id", .. }));
}

#[test]
fn file_values_fill_unset_flags() {
    let file = yaml(
        r"
id: '5'
server:
  address: lottery:9000
batch:
  maxAmount: 25
poll:
  retryMs: 250
  maxAttempts: 40
connect:
  delayMs: 0
  ioTimeoutMs: 5000
log:
  level: debug
data:
  file: /data/agency-5.csv
",
    );

    let cfg = ClientConfig::resolve(cli(), file).expect("config");
    assert_eq!(cfg.id, "5");
    assert_eq!(cfg.server_address, "lottery:9000");
    assert_eq!(cfg.max_batch_size.get(), 25);
    assert_eq!(cfg.poll_retry, Duration::from_millis(250));
    assert_eq!(cfg.poll_max_attempts.map(NonZeroU32::get), Some(40));
    assert_eq!(cfg.connect_delay, Duration::ZERO);
    assert_eq!(cfg.io_timeout, Some(Duration::from_secs(5)));
    assert_eq!(cfg.log_level, "debug");
    assert_eq!(cfg.data_file, PathBuf::from("/data/agency-5.csv"));
}

#[test]
fn flags_override_file_values() {
    let file = yaml("id: '5'\nbatch:\n  maxAmount: 25\nserver:\n  address: lottery:9000\n");
    let cfg = ClientConfig::resolve(
        Cli {
            id: Some("6".to_owned()),
            batch_max_amount: Some(8),
            ..cli()
        },
        file,
    )
    .expect("config");

    assert_eq!(cfg.id, "6");
    assert_eq!(cfg.max_batch_size.get(), 8);
    assert_eq!(cfg.server_address, "lottery:9000");
}

#[test]
fn zero_batch_size_is_rejected() {
    let err = ClientConfig::resolve(
        Cli {
            id: Some("1".to_owned()),
            batch_max_amount: Some(0),
            ..cli()
        },
        FileConfig::default(),
    )
    .expect_err("zero batch");
    assert!(matches!(err, ConfigError::Invalid { field: "batch_max_amount", .. }));
}

#[test]
fn zero_poll_attempts_is_rejected_and_zero_timeout_disables() {
    let err = ClientConfig::resolve(
        Cli {
            id: Some("1".to_owned()),
            poll_max_attempts: Some(0),
            ..cli()
        },
        FileConfig::default(),
    )
    .expect_err("zero attempts");
    assert!(matches!(err, ConfigError::Invalid { field: "poll_max_attempts", .. }));

    let cfg = ClientConfig::resolve(
        Cli {
            id: Some("1".to_owned()),
            io_timeout_ms: Some(0),
            ..cli()
        },
        FileConfig::default(),
    )
    .expect("config");
    assert_eq!(cfg.io_timeout, None);
}

#[test]
fn complete_single_bet_is_built_with_agency_id() {
    let cfg = ClientConfig::resolve(
        Cli {
            id: Some("2".to_owned()),
            bet: SingleBetArgs {
                first_name: Some("Santiago Lionel".to_owned()),
                last_name: Some("Lorca".to_owned()),
                document: Some("30904465".to_owned()),
                birthdate: Some("1999-03-17".to_owned()),
                number: Some("7574".to_owned()),
            },
            ..cli()
        },
        FileConfig::default(),
    )
    .expect("config");

    let bet = cfg.single_bet.expect("single bet");
    assert_eq!(bet.agency_id, "2");
    assert_eq!(bet.document, "30904465");
    assert_eq!(bet.number, "7574");
}

#[test]
fn partial_single_bet_is_error() {
    let err = ClientConfig::resolve(
        Cli {
            id: Some("2".to_owned()),
            bet: SingleBetArgs {
                document: Some("30904465".to_owned()),
                ..SingleBetArgs::default()
            },
            ..cli()
        },
        FileConfig::default(),
    )
    .expect_err("partial bet");
    assert!(matches!(err, ConfigError::Missing("bet_first_name")));
}

#[test]
fn unknown_yaml_key_is_parse_error() {
    let err = FileConfig::parse("serevr:\n  address: x\n", Path::new("config.yaml")).expect_err("typo");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn empty_yaml_is_empty_config() {
    let file = yaml("   \n");
    assert!(file.id.is_none());
}

#[test]
fn missing_file_is_empty_config() {
    let file = FileConfig::read_optional(Path::new("/definitely/not/here.yaml")).expect("missing ok");
    assert!(file.server.address.is_none());
}

#[test]
fn cli_parses_flags() {
    let cli = Cli::try_parse_from([
        "client",
        "--id",
        "4",
        "--server-address",
        "127.0.0.1:12345",
        "--batch-max-amount",
        "10",
        "--bet-number",
        "12",
    ])
    .expect("parse");
    assert_eq!(cli.id.as_deref(), Some("4"));
    assert_eq!(cli.server_address.as_deref(), Some("127.0.0.1:12345"));
    assert_eq!(cli.batch_max_amount, Some(10));
    assert_eq!(cli.bet.number.as_deref(), Some("12"));
}

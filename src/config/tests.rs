use super::*;
use tempfile::tempdir;

fn entry(table: &str, columns: &[&str]) -> TableEntry {
    TableEntry {
        table: table.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        ..TableEntry::default()
    }
}

fn file_config(tables: Vec<TableEntry>) -> MySqlFileConfig {
    MySqlFileConfig {
        dsn: "root:pw@tcp(127.0.0.1:3306)/shop".to_string(),
        tables,
        ..MySqlFileConfig::default()
    }
}

#[test]
fn defaults_fill_unset_values() {
    let job = file_config(vec![entry("posts", &["title"])])
        .resolve(&Defaults::default(), "test.json")
        .unwrap();

    assert_eq!(job.tables_parallel, 1);
    assert_eq!(job.connection.max_open, 200);
    assert_eq!(job.connection.max_idle, 20);
    assert_eq!(job.connection.max_lifetime, Duration::from_secs(1800));

    let scan = &job.scans[0];
    assert_eq!(scan.variant, "s2twp");
    assert_eq!(scan.batch_size, 500);
    assert_eq!(scan.rows_per_second, 0);
    assert!(!scan.dry_run);
}

#[test]
fn table_overrides_beat_file_values() {
    let mut overridden = entry("posts", &["title"]);
    overridden.batch_size = Some(800);
    overridden.rps = Some(20);
    overridden.to = Some("s2hk".to_string());

    let mut config = file_config(vec![overridden, entry("orders", &["remark"])]);
    config.batch_size = Some(200);
    config.rps = Some(50);
    config.to = Some("s2t".to_string());
    config.dry_run = Some(false);
    config.conn_max_lifetime = Some("1h 30m".to_string());
    config.tables_parallel = Some(3);

    let job = config.resolve(&Defaults::default(), "test.json").unwrap();
    assert_eq!(job.tables_parallel, 3);
    assert_eq!(job.connection.max_lifetime, Duration::from_secs(90 * 60));

    let posts = &job.scans[0];
    assert_eq!(posts.batch_size, 800);
    assert_eq!(posts.rows_per_second, 20);
    assert_eq!(posts.variant, "s2hk");
    assert!(!posts.dry_run);

    let orders = &job.scans[1];
    assert_eq!(orders.batch_size, 200);
    assert_eq!(orders.rows_per_second, 50);
    assert_eq!(orders.variant, "s2t");
}

#[test]
fn zero_values_count_as_unset() {
    let mut posts = entry("posts", &["title"]);
    posts.rps = Some(0);
    posts.batch_size = Some(0);
    posts.to = Some(" ".to_string());

    let mut config = file_config(vec![posts]);
    config.rps = Some(50);
    config.batch_size = Some(0);
    config.tables_parallel = Some(0);
    config.to = Some(String::new());

    let job = config.resolve(&Defaults::default(), "test.json").unwrap();
    assert_eq!(job.tables_parallel, 1);

    let scan = &job.scans[0];
    assert_eq!(scan.rows_per_second, 50);
    assert_eq!(scan.batch_size, 500);
    assert_eq!(scan.variant, "s2twp");
}

#[test]
fn missing_dry_run_writes_unless_a_table_opts_in() {
    let mut careful = entry("orders", &["remark"]);
    careful.dry_run = Some(true);

    let job = file_config(vec![entry("posts", &["title"]), careful])
        .resolve(&Defaults::default(), "test.json")
        .unwrap();
    assert!(!job.scans[0].dry_run);
    assert!(job.scans[1].dry_run);

    let mut config = file_config(vec![entry("posts", &["title"])]);
    config.dry_run = Some(true);
    let job = config.resolve(&Defaults::default(), "test.json").unwrap();
    assert!(job.scans[0].dry_run);
}

#[test]
fn invalid_files_are_rejected() {
    let defaults = Defaults::default();

    let mut no_dsn = file_config(vec![entry("posts", &["title"])]);
    no_dsn.dsn = " ".to_string();
    assert!(matches!(
        no_dsn.resolve(&defaults, "a.json"),
        Err(ConfigError::Invalid { reason, .. }) if reason.contains("dsn")
    ));

    assert!(file_config(Vec::new()).resolve(&defaults, "a.json").is_err());
    assert!(file_config(vec![entry("", &["title"])]).resolve(&defaults, "a.json").is_err());
    assert!(file_config(vec![entry("posts", &[])]).resolve(&defaults, "a.json").is_err());

    let mut bad_lifetime = file_config(vec![entry("posts", &["title"])]);
    bad_lifetime.conn_max_lifetime = Some("forever".to_string());
    assert!(matches!(
        bad_lifetime.resolve(&defaults, "a.json"),
        Err(ConfigError::Lifetime { .. })
    ));
}

#[test]
fn load_reads_snake_case_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shop.json");
    std::fs::write(
        &path,
        r#"{
            "dsn": "root:pw@tcp(127.0.0.1:3306)/shop",
            "dry_run": false,
            "workers": 8,
            "tables": [
                {"table": "comments", "identify_by": ["uuid"], "columns": ["body"], "workers": 2}
            ]
        }"#,
    )
    .unwrap();

    let config = load_file_config(&path).unwrap();
    assert_eq!(config.dry_run, Some(false));
    assert_eq!(config.tables[0].identify_by, vec!["uuid".to_string()]);

    let job = config.resolve(&Defaults::default(), "shop.json").unwrap();
    assert!(!job.scans[0].dry_run);
    assert!(job.scans[0].key_columns.is_empty());
}

#[test]
fn load_reports_parse_errors_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let error = load_file_config(&path).unwrap_err();
    assert!(matches!(error, ConfigError::Parse { .. }));
    assert!(error.to_string().contains("broken.json"));
}

#[test]
fn config_targets_walk_directories_in_order() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    for name in ["b.json", "a.JSON", "nested/c.json", "notes.txt"] {
        std::fs::write(dir.path().join(name), "{}").unwrap();
    }

    let targets = resolve_config_targets(dir.path()).unwrap();
    let names = targets
        .iter()
        .map(|path| {
            path.strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a.JSON", "b.json", "nested/c.json"]);

    let single = dir.path().join("b.json");
    assert_eq!(resolve_config_targets(&single).unwrap(), vec![single]);

    assert!(matches!(
        resolve_config_targets(&dir.path().join("notes.txt")),
        Err(ConfigError::UnsupportedTarget(_))
    ));
    assert!(matches!(
        resolve_config_targets(&dir.path().join("missing")),
        Err(ConfigError::Read { .. })
    ));

    let empty = tempdir().unwrap();
    assert!(matches!(
        resolve_config_targets(empty.path()),
        Err(ConfigError::NoConfigFiles(_))
    ));
}

#[test]
fn generated_template_resolves() {
    let dir = tempdir().unwrap();
    let out = generate_config_template(&dir.path().join("configs")).unwrap();
    assert!(out.ends_with(TEMPLATE_FILE_NAME));

    let raw = std::fs::read_to_string(&out).unwrap();
    // Keys keep their declared order and '&' is written as-is.
    assert!(raw.trim_start().starts_with("{\n  \"_comment\""));
    assert!(raw.contains("charset=utf8mb4&parseTime=true"));

    let job = load_file_config(&out)
        .unwrap()
        .resolve(&Defaults::default(), "template")
        .unwrap();
    assert_eq!(job.scans.len(), 4);
    assert_eq!(job.scans[0].batch_size, 800);
    assert!(job.scans.iter().all(|scan| scan.dry_run));
    assert_eq!(job.scans[1].key_columns, vec!["order_id", "item_id"]);
    assert_eq!(job.scans[2].identify_by, vec!["uuid"]);
    assert!(job.scans[3].key_columns.is_empty() && job.scans[3].identify_by.is_empty());
}

use super::*;

#[test]
fn test_statement_display_renders_args() {
    let statement = Statement::new(
        "UPDATE `t` SET `name` = ? WHERE `id` = ? LIMIT ?",
        vec![
            SqlArg::Text("簡體".to_string()),
            SqlArg::Text("1".to_string()),
            SqlArg::Int(1),
        ],
    );

    assert_eq!(
        statement.to_string(),
        "UPDATE `t` SET `name` = ? WHERE `id` = ? LIMIT ? -- args=[\"簡體\", \"1\", 1]"
    );
}

#[test]
fn test_fetched_batch_counts_skipped_rows() {
    let mut batch = FetchedBatch::default();
    batch.push_skipped();
    batch.push_row(vec![Some("1".to_string())]);
    batch.push_skipped();
    batch.push_skipped();

    assert_eq!(batch.skipped, 3);
    assert_eq!(batch.trailing_skipped, 2);
    assert_eq!(batch.returned(), 4);
    assert!(!batch.is_empty());
    assert!(FetchedBatch::default().is_empty());
}

// tests/staging_store.rs

use std::error::Error;
use std::fs;
use std::sync::Arc;

use recoverd::errors::StagingError;
use recoverd::fs::RealFileSystem;
use recoverd::staging::{StagedFile, StagingStore};
use recoverd_test_utils::scratch::Scratch;
use recoverd_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn store(scratch: &Scratch) -> StagingStore {
    StagingStore::new(
        Arc::new(RealFileSystem),
        scratch.staging_dir(),
        "create.sql",
        "ibd",
    )
}

#[tokio::test]
async fn second_upload_replaces_the_first_completely() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let store = store(&scratch);

        store
            .replace_inputs(
                Some(StagedFile::new("v1.sql", "CREATE TABLE a (id INT);")),
                vec![StagedFile::new("a.ibd", "A"), StagedFile::new("b.ibd", "B")],
            )
            .await?;
        assert_eq!(scratch.staged_names(), vec!["a.ibd", "b.ibd", "create.sql"]);

        let receipt = store
            .replace_inputs(
                Some(StagedFile::new("v2.sql", "CREATE TABLE c (id INT);")),
                vec![StagedFile::new("c.ibd", "C")],
            )
            .await?;

        assert_eq!(receipt.definition, "create.sql");
        assert_eq!(receipt.data_files, vec!["c.ibd"]);
        assert_eq!(scratch.staged_names(), vec!["c.ibd", "create.sql"]);
        assert_eq!(
            fs::read_to_string(scratch.staging_dir().join("create.sql"))?,
            "CREATE TABLE c (id INT);"
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn client_paths_are_reduced_to_file_names() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let store = store(&scratch);

        let receipt = store
            .replace_inputs(
                Some(StagedFile::new("create.sql", "x")),
                vec![
                    StagedFile::new("../../etc/evil.ibd", "E"),
                    StagedFile::new("C:\\dumps\\orders.ibd", "O"),
                    StagedFile::new(".hidden.ibd", "H"),
                    StagedFile::new("notes.txt", "N"),
                ],
            )
            .await?;

        assert_eq!(receipt.data_files, vec!["evil.ibd", "orders.ibd"]);
        assert_eq!(receipt.skipped, vec![".hidden.ibd", "notes.txt"]);
        assert_eq!(
            scratch.staged_names(),
            vec!["create.sql", "evil.ibd", "orders.ibd"]
        );
        assert!(!scratch.path().join("etc").exists());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn missing_inputs_leave_existing_set_untouched() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let store = store(&scratch);

        store
            .replace_inputs(
                Some(StagedFile::new("create.sql", "x")),
                vec![StagedFile::new("keep.ibd", "K")],
            )
            .await?;

        let no_data = store
            .replace_inputs(Some(StagedFile::new("create.sql", "y")), Vec::new())
            .await;
        assert!(matches!(no_data, Err(StagingError::MissingRequired(_))));

        let no_definition = store
            .replace_inputs(None, vec![StagedFile::new("other.ibd", "O")])
            .await;
        assert!(matches!(no_definition, Err(StagingError::MissingRequired(_))));

        assert_eq!(scratch.staged_names(), vec!["create.sql", "keep.ibd"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn missing_staging_directory_is_created_on_replace() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        fs::remove_dir_all(scratch.staging_dir())?;
        let store = store(&scratch);

        store
            .replace_inputs(
                Some(StagedFile::new("create.sql", "x")),
                vec![StagedFile::new("t.ibd", "T")],
            )
            .await?;

        assert_eq!(scratch.staged_names(), vec!["create.sql", "t.ibd"]);
        Ok(())
    })
    .await
}

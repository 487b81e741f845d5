// tests/backup_locator.rs

use std::error::Error;
use std::fs;
use std::sync::Arc;

use recoverd::backup::BackupLocator;
use recoverd::errors::LocatorError;
use recoverd::fs::RealFileSystem;
use recoverd_test_utils::builders::ConfigFileBuilder;
use recoverd_test_utils::scratch::Scratch;
use recoverd_test_utils::{init_tracing, with_timeout};
use tokio::io::AsyncReadExt;

type TestResult = Result<(), Box<dyn Error>>;

fn locator(scratch: &Scratch) -> BackupLocator {
    let cfg = scratch.config().build();
    BackupLocator::from_config(Arc::new(RealFileSystem), &cfg).unwrap()
}

#[test]
fn newest_matching_name_wins() -> TestResult {
    init_tracing();
    let scratch = Scratch::new();
    scratch.write_backup("backup_20230101.sql", "old");
    scratch.write_backup("backup_20230215.sql", "new");
    scratch.write_backup("readme.txt", "not a backup");

    let artifact = locator(&scratch).latest()?;
    assert_eq!(artifact.name, "backup_20230215.sql");
    assert_eq!(artifact.path, scratch.backup_dir().join("backup_20230215.sql"));
    assert_eq!(artifact.size, 3);
    Ok(())
}

#[test]
fn empty_or_unrelated_directory_is_not_found() -> TestResult {
    init_tracing();
    let scratch = Scratch::new();
    let locator = locator(&scratch);

    assert!(matches!(locator.latest(), Err(LocatorError::NotFound(_))));

    scratch.write_backup("notes.txt", "x");
    scratch.write_backup("backup_20230101.sql.gz", "x");
    scratch.write_backup("backup_latest.sql", "x");
    assert!(matches!(locator.latest(), Err(LocatorError::NotFound(_))));
    Ok(())
}

#[test]
fn missing_backup_directory_is_not_found() -> TestResult {
    init_tracing();
    let scratch = Scratch::new();
    fs::remove_dir_all(scratch.backup_dir())?;

    assert!(matches!(locator(&scratch).latest(), Err(LocatorError::NotFound(_))));
    Ok(())
}

#[test]
fn directories_with_backup_names_are_ignored() -> TestResult {
    init_tracing();
    let scratch = Scratch::new();
    scratch.write_backup("backup_20230101.sql", "file");
    fs::create_dir(scratch.backup_dir().join("backup_20991231.sql"))?;

    assert_eq!(locator(&scratch).latest()?.name, "backup_20230101.sql");
    Ok(())
}

#[test]
fn custom_naming_convention_is_honoured() -> TestResult {
    init_tracing();
    let scratch = Scratch::new();
    scratch.write_backup("dump-2024-03-01.sql.gz", "a");
    scratch.write_backup("dump-2024-11-30.sql.gz", "b");
    scratch.write_backup("backup_20990101.sql", "c");

    let cfg = ConfigFileBuilder::new()
        .with_backup_dir(scratch.backup_dir())
        .with_backup_naming("dump-", ".sql.gz")
        .build();
    let locator = BackupLocator::from_config(Arc::new(RealFileSystem), &cfg)?;

    assert_eq!(
        locator.list()?,
        vec!["dump-2024-11-30.sql.gz", "dump-2024-03-01.sql.gz"]
    );
    Ok(())
}

#[tokio::test]
async fn open_latest_reads_the_selected_file() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        scratch.write_backup("backup_20230101.sql", "-- old\n");
        scratch.write_backup("backup_20230215.sql", "-- newest\nINSERT INTO t VALUES (1);\n");

        let (artifact, mut file) = locator(&scratch).open_latest().await?;
        let mut body = String::new();
        file.read_to_string(&mut body).await?;

        assert_eq!(artifact.name, "backup_20230215.sql");
        assert_eq!(body, "-- newest\nINSERT INTO t VALUES (1);\n");
        Ok(())
    })
    .await
}

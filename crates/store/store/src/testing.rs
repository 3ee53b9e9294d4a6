use std::sync::Arc;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use snote_core::note::{NewNote, StoredNote};

use crate::error::RepositoryError;
use crate::repository::NoteRepository;

/// Second-precision timestamps survive every backend unchanged.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn test_note(content: &str, expires_in: TimeDelta) -> NewNote {
    let created_at = now();
    NewNote {
        content: content.as_bytes().to_vec(),
        created_at,
        expires_at: created_at + expires_in,
        expires_at_time_zone: "Europe/Berlin".to_owned(),
        key_hash: vec![0xab; 32],
    }
}

fn assert_same_note(stored: &StoredNote, note: &NewNote) {
    assert_eq!(stored.content, note.content);
    assert_eq!(stored.created_at, note.created_at);
    assert_eq!(stored.expires_at, note.expires_at);
    assert_eq!(stored.expires_at_time_zone, note.expires_at_time_zone);
    assert_eq!(stored.key_hash, note.key_hash);
}

/// Run the full repository conformance test suite.
///
/// Call this from your backend's test module with a fresh repository.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_repository_conformance_tests(
    repo: &dyn NoteRepository,
) -> Result<(), RepositoryError> {
    test_create_assigns_ids(repo).await?;
    test_get_returns_note(repo).await?;
    test_get_consumes_note(repo).await?;
    test_get_missing(repo).await?;
    test_get_expired(repo).await?;
    test_purge_expired(repo).await?;
    Ok(())
}

async fn test_create_assigns_ids(repo: &dyn NoteRepository) -> Result<(), RepositoryError> {
    let note = test_note("first", TimeDelta::hours(1));
    let a = repo.create(&note).await?;
    let b = repo.create(&note).await?;
    assert_ne!(a.id, b.id, "each create should assign a new id");
    assert_same_note(&a, &note);
    assert_same_note(&b, &note);
    Ok(())
}

async fn test_get_returns_note(repo: &dyn NoteRepository) -> Result<(), RepositoryError> {
    let note = test_note("readable", TimeDelta::hours(1));
    let created = repo.create(&note).await?;
    let fetched = repo.get(created.id).await?;
    assert_eq!(fetched, created);
    Ok(())
}

async fn test_get_consumes_note(repo: &dyn NoteRepository) -> Result<(), RepositoryError> {
    let note = test_note("read once", TimeDelta::hours(1));
    let created = repo.create(&note).await?;
    repo.get(created.id).await?;

    let second = repo.get(created.id).await;
    assert!(
        matches!(second, Err(RepositoryError::NotFound(id)) if id == created.id),
        "second get should report NotFound, got {second:?}"
    );
    Ok(())
}

async fn test_get_missing(repo: &dyn NoteRepository) -> Result<(), RepositoryError> {
    let result = repo.get(u64::MAX).await;
    assert!(
        matches!(result, Err(RepositoryError::NotFound(_))),
        "get on missing id should report NotFound, got {result:?}"
    );
    Ok(())
}

async fn test_get_expired(repo: &dyn NoteRepository) -> Result<(), RepositoryError> {
    let note = test_note("stale", -TimeDelta::seconds(1));
    let created = repo.create(&note).await?;
    let result = repo.get(created.id).await;
    assert!(
        matches!(result, Err(RepositoryError::NotFound(_))),
        "expired note should not be returned, got {result:?}"
    );
    Ok(())
}

async fn test_purge_expired(repo: &dyn NoteRepository) -> Result<(), RepositoryError> {
    let expired = repo
        .create(&test_note("expired", -TimeDelta::minutes(5)))
        .await?;
    let live = repo.create(&test_note("live", TimeDelta::hours(1))).await?;

    let purged = repo.purge_expired(now()).await?;
    assert!(purged >= 1, "purge should remove the expired note");

    assert!(repo.get(expired.id).await.is_err());
    let fetched = repo.get(live.id).await?;
    assert_eq!(fetched.id, live.id, "purge must not touch live notes");
    Ok(())
}

/// Create one note and race `readers` concurrent reads against it.
///
/// Exactly one read must succeed; every other read must report
/// [`RepositoryError::NotFound`].
///
/// # Errors
///
/// Returns an error if the note cannot be created or a reader fails with
/// anything other than `NotFound`.
pub async fn run_concurrent_consume_test(
    repo: Arc<dyn NoteRepository>,
    readers: usize,
) -> Result<(), RepositoryError> {
    let created = repo
        .create(&test_note("contended", TimeDelta::hours(1)))
        .await?;

    let mut handles = Vec::with_capacity(readers);
    for _ in 0..readers {
        let repo = Arc::clone(&repo);
        let id = created.id;
        handles.push(tokio::spawn(async move { repo.get(id).await }));
    }

    let mut successes = 0;
    for handle in handles {
        let result = handle
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        match result {
            Ok(note) => {
                assert_eq!(note.id, created.id);
                successes += 1;
            }
            Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    assert_eq!(successes, 1, "exactly one concurrent reader should win");
    Ok(())
}

//! Frame listing integration tests.

use std::fs;
use std::path::Path;

use stillreel::{FrameSourceOptions, OverflowPolicy, StillreelError};

fn touch(directory: &Path, name: &str) {
    fs::write(directory.join(name), b"x").expect("write file");
}

fn names(frames: &stillreel::FramePaths) -> Vec<String> {
    frames
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn lists_in_lexicographic_order() {
    let directory = tempfile::tempdir().expect("temp dir");
    for name in ["frame_010.jpg", "frame_002.jpg", "frame_001.jpg", "a.jpg"] {
        touch(directory.path(), name);
    }

    let frames = stillreel::list_frames(directory.path(), &FrameSourceOptions::new())
        .expect("list frames");

    assert_eq!(
        names(&frames),
        vec!["a.jpg", "frame_001.jpg", "frame_002.jpg", "frame_010.jpg"]
    );
    for path in frames.iter() {
        assert!(path.starts_with(directory.path()));
    }
}

#[test]
fn skips_subdirectories_without_recursing() {
    let directory = tempfile::tempdir().expect("temp dir");
    touch(directory.path(), "b.png");
    fs::create_dir(directory.path().join("a_subdir")).unwrap();
    touch(&directory.path().join("a_subdir"), "nested.png");

    let frames = stillreel::list_frames(directory.path(), &FrameSourceOptions::new())
        .expect("list frames");

    assert_eq!(names(&frames), vec!["b.png"]);
    assert!(frames.iter().all(|path| !path.is_dir()));
}

#[test]
fn listing_is_deterministic() {
    let directory = tempfile::tempdir().expect("temp dir");
    for index in (0..20).rev() {
        touch(directory.path(), &format!("{index:03}.png"));
    }

    let first = stillreel::list_frames(directory.path(), &FrameSourceOptions::new()).unwrap();
    let second = stillreel::list_frames(directory.path(), &FrameSourceOptions::new()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 20);
}

#[test]
fn truncates_at_capacity() {
    let directory = tempfile::tempdir().expect("temp dir");
    for name in ["1.png", "2.png", "3.png", "4.png"] {
        touch(directory.path(), name);
    }

    let options = FrameSourceOptions::new().with_max_count(2);
    let frames = stillreel::list_frames(directory.path(), &options).unwrap();
    assert_eq!(names(&frames), vec!["1.png", "2.png"]);
}

#[test]
fn capacity_error_policy_fails() {
    let directory = tempfile::tempdir().expect("temp dir");
    for name in ["1.png", "2.png", "3.png"] {
        touch(directory.path(), name);
    }

    let options = FrameSourceOptions::new()
        .with_max_count(2)
        .with_overflow_policy(OverflowPolicy::Error);
    let result = stillreel::list_frames(directory.path(), &options);
    assert!(matches!(
        result,
        Err(StillreelError::CapacityExceeded { capacity: 2, .. })
    ));
}

#[test]
fn exactly_at_capacity_is_not_an_error() {
    let directory = tempfile::tempdir().expect("temp dir");
    for name in ["1.png", "2.png"] {
        touch(directory.path(), name);
    }

    let options = FrameSourceOptions::new()
        .with_max_count(2)
        .with_overflow_policy(OverflowPolicy::Error);
    let frames = stillreel::list_frames(directory.path(), &options).unwrap();
    assert_eq!(frames.len(), 2);
}

#[test]
fn extension_filter() {
    let directory = tempfile::tempdir().expect("temp dir");
    for name in ["1.JPG", "2.png", "3.txt", "Thumbs.db"] {
        touch(directory.path(), name);
    }

    let options = FrameSourceOptions::new().with_extensions(["jpg", "png"]);
    let frames = stillreel::list_frames(directory.path(), &options).unwrap();
    assert_eq!(names(&frames), vec!["1.JPG", "2.png"]);
}

#[test]
fn empty_directory_yields_empty_list() {
    let directory = tempfile::tempdir().expect("temp dir");
    let frames = stillreel::list_frames(directory.path(), &FrameSourceOptions::new()).unwrap();
    assert!(frames.is_empty());
}

#[test]
fn missing_directory_is_unreadable() {
    let directory = tempfile::tempdir().expect("temp dir");
    let missing = directory.path().join("nope");

    let result = stillreel::list_frames(&missing, &FrameSourceOptions::new());
    let error = result.unwrap_err();
    assert!(matches!(error, StillreelError::DirectoryUnreadable { .. }));
    assert!(
        error.to_string().contains("Failed to read frame directory"),
        "unexpected message: {error}"
    );
}

#[test]
fn file_instead_of_directory_is_unreadable() {
    let directory = tempfile::tempdir().expect("temp dir");
    touch(directory.path(), "plain.png");

    let result =
        stillreel::list_frames(directory.path().join("plain.png"), &FrameSourceOptions::new());
    assert!(matches!(
        result,
        Err(StillreelError::DirectoryUnreadable { .. })
    ));
}

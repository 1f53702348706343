//! Tests for the comparison policies

use filetime::{FileTime, set_file_mtime};
use mirror_fs::{Comparator, ContentComparator, ShallowComparator};
use mirror_test_utils::TreeFixture;
use rstest::rstest;

fn pin_mtime(path: &std::path::Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[rstest]
#[case::shallow(&ShallowComparator)]
#[case::content(&ContentComparator)]
fn identical_files_are_equivalent(#[case] comparator: &dyn Comparator) {
    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "same");
    let rep = fixture.write_replica("a.txt", "same");
    pin_mtime(&src, 1_600_000_000);
    pin_mtime(&rep, 1_600_000_000);

    assert!(comparator.equivalent(&src, &rep));
}

#[rstest]
#[case::shallow(&ShallowComparator)]
#[case::content(&ContentComparator)]
fn missing_replica_is_not_equivalent(#[case] comparator: &dyn Comparator) {
    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "same");

    assert!(!comparator.equivalent(&src, &fixture.replica().join("a.txt")));
}

#[rstest]
#[case::shallow(&ShallowComparator)]
#[case::content(&ContentComparator)]
fn directory_is_never_equivalent_to_file(#[case] comparator: &dyn Comparator) {
    let fixture = TreeFixture::new();
    let src = fixture.write_source("x", "file");
    let rep = fixture.mkdir_replica("x");

    assert!(!comparator.equivalent(&src, &rep));
}

#[rstest]
#[case::shallow(&ShallowComparator)]
#[case::content(&ContentComparator)]
fn size_change_is_detected(#[case] comparator: &dyn Comparator) {
    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "longer content");
    let rep = fixture.write_replica("a.txt", "short");
    pin_mtime(&src, 1_600_000_000);
    pin_mtime(&rep, 1_600_000_000);

    assert!(!comparator.equivalent(&src, &rep));
}

#[test]
fn shallow_detects_mtime_change() {
    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "same");
    let rep = fixture.write_replica("a.txt", "same");
    pin_mtime(&src, 1_600_000_100);
    pin_mtime(&rep, 1_600_000_000);

    assert!(!ShallowComparator.equivalent(&src, &rep));
}

#[test]
fn shallow_misses_same_size_same_mtime_edit() {
    // Known limitation of metadata-only comparison
    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "abc");
    let rep = fixture.write_replica("a.txt", "xyz");
    pin_mtime(&src, 1_600_000_000);
    pin_mtime(&rep, 1_600_000_000);

    assert!(ShallowComparator.equivalent(&src, &rep));
    assert!(!ContentComparator.equivalent(&src, &rep));
}

#[test]
fn content_ignores_mtime_difference() {
    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "same");
    let rep = fixture.write_replica("a.txt", "same");
    pin_mtime(&src, 1_600_000_100);
    pin_mtime(&rep, 1_600_000_000);

    assert!(ContentComparator.equivalent(&src, &rep));
}

#[cfg(unix)]
#[test]
fn unreadable_replica_is_not_equivalent_for_content() {
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let fixture = TreeFixture::new();
    let src = fixture.write_source("a.txt", "same");
    let rep = fixture.write_replica("a.txt", "same");
    fs::set_permissions(&rep, Permissions::from_mode(0o000)).unwrap();

    // Root can still read the file, so only assert when the read really fails
    let readable = fs::File::open(&rep).is_ok();
    let result = ContentComparator.equivalent(&src, &rep);

    let _ = fs::set_permissions(&rep, Permissions::from_mode(0o644));
    assert_eq!(result, readable);
}

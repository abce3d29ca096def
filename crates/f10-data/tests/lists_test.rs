//! Integration tests for the bookkeeping list files.

use f10_data::ListEntry;
use f10_data::lists::{
    NEW_PROBLEM_LIST, NOT_EXIST_LIST, PROBLEM_LIST, check_problem_list, read_download_list,
    read_problem_list, write_problem_list,
};
use std::fs;

#[test]
fn test_problem_list_round_trip_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let problems = dir.path().join(PROBLEM_LIST);
    let not_exist = dir.path().join(NOT_EXIST_LIST);
    let out = dir.path().join(NEW_PROBLEM_LIST);

    write_problem_list(
        &problems,
        &[
            ListEntry::new("600000", "1"),
            ListEntry::new("600001", "4"),
            ListEntry::new("600002", "3"),
        ],
    )
    .unwrap();
    fs::write(&not_exist, "600001\n\n").unwrap();

    let written = check_problem_list(&not_exist, &problems, &out).unwrap();
    assert_eq!(written, 2);
    assert_eq!(fs::read_to_string(&out).unwrap(), "600000 1\n600002 3\n");
    assert_eq!(read_problem_list(&out).unwrap().len(), 2);
}

#[test]
fn test_missing_download_list() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_download_list(dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, f10_data::DataError::Io(_)));
}

use bd_store::{PORT_FILENAME, StoreError, read_port_file};

use googletest::assert_that;
use googletest::prelude::eq;
use tempfile::TempDir;

#[test]
fn given_port_file_with_newline_when_read_then_trimmed() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(PORT_FILENAME), "51234\r\n").unwrap();

    let port = read_port_file(temp.path()).unwrap();

    assert_that!(port, eq("51234"));
}

#[test]
fn given_no_port_file_when_read_then_io_error() {
    let temp = TempDir::new().unwrap();

    let result = read_port_file(temp.path());

    assert!(matches!(result, Err(StoreError::Io { .. })));
    assert!(result.unwrap_err().is_transient());
}

use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/lists.zg";
const EXPECTED: Expected = Expected {
    stdout: "[6, 8]\n",
    stderr: "",
};

#[test]
fn map_and_filter_compose() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

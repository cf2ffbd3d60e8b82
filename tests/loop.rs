use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/loop.zg";
const EXPECTED: Expected = Expected {
    stdout: "15\n",
    stderr: "",
};

#[test]
fn sums_an_inclusive_range() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

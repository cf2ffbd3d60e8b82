use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/functions.zg";
const EXPECTED: Expected = Expected {
    stdout: "30\n",
    stderr: "",
};

#[test]
fn calls_a_function() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

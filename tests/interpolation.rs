use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/interpolation.zg";
const EXPECTED: Expected = Expected {
    stdout: "Hello, World!\n",
    stderr: "",
};

#[test]
fn interpolates_identifiers() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

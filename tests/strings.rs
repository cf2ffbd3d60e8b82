use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/strings.zg";
const EXPECTED: Expected = Expected {
    stdout: "HI\n",
    stderr: "",
};

#[test]
fn chains_str_module_functions() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

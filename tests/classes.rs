use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/classes.zg";
const EXPECTED: Expected = Expected {
    stdout: "7\n",
    stderr: "",
};

#[test]
fn init_and_methods_see_this() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/import_main.zg";
const EXPECTED: Expected = Expected {
    stdout: "hi there 42\n",
    stderr: "",
};

#[test]
fn imports_a_sibling_module() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

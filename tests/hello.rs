use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/hello.zg";
const EXPECTED: Expected = Expected {
    stdout: "hello world\n",
    stderr: "",
};

#[test]
fn prints_hello_world() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

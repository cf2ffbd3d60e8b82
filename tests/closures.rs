use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/closures.zg";
const EXPECTED: Expected = Expected {
    stdout: "15\n",
    stderr: "",
};

#[test]
fn closures_capture_their_defining_environment() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

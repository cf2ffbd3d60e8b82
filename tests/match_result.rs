use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/match_result.zg";
const EXPECTED: Expected = Expected {
    stdout: "failure\n",
    stderr: "",
};

#[test]
fn matches_on_result_variants() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

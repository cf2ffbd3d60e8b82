use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/assignment_swap.zg";
const EXPECTED: Expected = Expected {
    stdout: "2 1\n",
    stderr: "",
};

#[test]
fn multi_target_assignment_swaps_atomically() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

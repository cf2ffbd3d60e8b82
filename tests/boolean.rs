use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/short_circuit.zg";
const EXPECTED: Expected = Expected {
    stdout: "false\ntrue\n",
    stderr: "",
};

#[test]
fn and_or_short_circuit_without_evaluating_the_rhs() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

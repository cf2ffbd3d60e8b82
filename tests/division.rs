use std::{error::Error, path::Path};

use test_utils::check_program_fails;

const SRC_PATH: &str = "./demos/division_by_zero.zg";

#[test]
fn integer_division_by_zero_is_a_runtime_error() -> Result<(), Box<dyn Error>> {
    check_program_fails(Path::new(SRC_PATH), "division by zero")
}

use std::{error::Error, path::Path};

use test_utils::check_program_fails;

const SRC_PATH: &str = "./demos/immutable_assign_fails.zg";

#[test]
fn assigning_to_an_immutable_binding_fails() -> Result<(), Box<dyn Error>> {
    check_program_fails(Path::new(SRC_PATH), "cannot assign to immutable variable: x")
}

use std::{error::Error, path::Path};

use test_utils::check_program_fails;

const SRC_PATH: &str = "./demos/spec_conformance_fails.zg";

#[test]
fn impl_for_spec_checks_conformance() -> Result<(), Box<dyn Error>> {
    check_program_fails(Path::new(SRC_PATH), "missing method speak")
}

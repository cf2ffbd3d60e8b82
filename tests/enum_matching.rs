use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/enum_match.zg";
const EXPECTED: Expected = Expected {
    stdout: "gb\n",
    stderr: "",
};

#[test]
fn match_alternatives_cover_multiple_enum_variants() -> Result<(), Box<dyn Error>> {
    check_program(Path::new(SRC_PATH), EXPECTED)
}

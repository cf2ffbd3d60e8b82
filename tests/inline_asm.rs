use std::{error::Error, path::Path};

use test_utils::{check_program, Expected};

const SRC_PATH: &str = "./demos/unsafe_asm.zg";

#[test]
fn asm_exposes_the_host_os_inside_unsafe() -> Result<(), Box<dyn Error>> {
    let expected_stdout = format!("{}\n", std::env::consts::OS);
    check_program(
        Path::new(SRC_PATH),
        Expected {
            stdout: &expected_stdout,
            stderr: "",
        },
    )
}

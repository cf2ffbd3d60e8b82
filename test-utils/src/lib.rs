use std::{
    error::Error,
    io,
    path::Path,
    process::{Command, Output},
    str,
};

const ZERG_PATH: &str = "./target/debug/zerg-bootstrap";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr);
        Ok(())
    }
}

fn run_zerg(src_path: &Path) -> Result<Output, io::Error> {
    Command::new(ZERG_PATH).arg(src_path).output()
}

pub fn check_program(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    let output = run_zerg(src_path)?;
    expected.assert_matches(&output)?;
    assert!(
        output.status.success(),
        "zerg-bootstrap exited with status {:?}",
        output.status.code()
    );
    Ok(())
}

pub fn check_program_fails(src_path: &Path, expected_stderr_contains: &str) -> Result<(), Box<dyn Error>> {
    let output = run_zerg(src_path)?;
    let stderr = str::from_utf8(&output.stderr)?;
    assert!(
        !output.status.success(),
        "expected zerg-bootstrap to fail on {src_path:?}"
    );
    assert!(
        stderr.contains(expected_stderr_contains),
        "expected stderr to contain {expected_stderr_contains:?}, got {stderr:?}"
    );
    Ok(())
}

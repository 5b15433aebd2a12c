//! Runs tests using actual binary, apapted from 'fd' method: https://github.com/sharkdp/fd/blob/master/tests/testenv/mod.rs
#![allow(dead_code)]
use std::env;
use std::path::PathBuf;
use std::process;

use uvcscan::usb::descriptors::Configuration;

// if changing the fixtures, keep bLength and wTotalLength fields in step with the bytes
/// Hex dump of a UVC 1.0 webcam: IAD, Video Control interface 0 and Video Streaming interface 1
/// with one YUY2 format, two frames and a still image frame
pub const CAMERA_HEX: &str = "./tests/data/camera.hex";
/// [`CAMERA_HEX`] as raw bytes
pub const CAMERA_BIN: &str = "./tests/data/camera.bin";
/// [`CAMERA_HEX`] cut off in the middle of the second frame descriptor
pub const CAMERA_TRUNCATED_HEX: &str = "./tests/data/camera_truncated.hex";
/// Config descriptor with a bad bDescriptorType
pub const NOT_CONFIG_HEX: &str = "./tests/data/not_config.hex";
/// Empty config file passed with `--config` so a user config does not change output
pub const EMPTY_CONFIG: &str = "./tests/data/empty_config.json";

pub fn read_fixture(file_name: &str) -> Vec<u8> {
    uvcscan::dump::read_dump(file_name, false)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", file_name, e))
}

pub fn camera_configuration() -> Configuration {
    Configuration::parse(&read_fixture(CAMERA_HEX))
        .expect("camera fixture parses")
        .configuration
}

/// Builds descriptor buffers for tests, patching wTotalLength on [`DescriptorBuilder::build`]
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    buf: Vec<u8>,
}

impl DescriptorBuilder {
    /// Start with a configuration descriptor declaring `num_interfaces`
    pub fn config(num_interfaces: u8) -> Self {
        DescriptorBuilder {
            buf: vec![0x09, 0x02, 0x00, 0x00, num_interfaces, 0x01, 0x00, 0x80, 0x32],
        }
    }

    pub fn interface(
        mut self,
        number: u8,
        alt: u8,
        num_endpoints: u8,
        class: u8,
        sub_class: u8,
    ) -> Self {
        self.buf.extend_from_slice(&[
            0x09,
            0x04,
            number,
            alt,
            num_endpoints,
            class,
            sub_class,
            0x00,
            0x00,
        ]);
        self
    }

    pub fn endpoint(mut self, address: u8, attributes: u8, max_packet_size: u16) -> Self {
        let mps = max_packet_size.to_le_bytes();
        self.buf
            .extend_from_slice(&[0x07, 0x05, address, attributes, mps[0], mps[1], 0x01]);
        self
    }

    /// Class specific interface block: bLength and CS_INTERFACE are added
    pub fn class(mut self, subtype: u8, body: &[u8]) -> Self {
        self.buf.push(body.len() as u8 + 3);
        self.buf.push(0x24);
        self.buf.push(subtype);
        self.buf.extend_from_slice(body);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let total = (self.buf.len() as u16).to_le_bytes();
        self.buf[2] = total[0];
        self.buf[3] = total[1];
        self.buf
    }
}

/// Environment for the integration tests.
pub struct TestEnv {
    /// Path to the *uvcscan* executable.
    uvcscan_exe: PathBuf,
}

/// Find the *uvcscan* executable.
fn find_uvcscan_exe() -> PathBuf {
    // Tests exe is in target/debug/deps, the *uvcscan* exe is in target/debug
    let root = env::current_exe()
        .expect("tests executable")
        .parent()
        .expect("tests executable directory")
        .parent()
        .expect("uvcscan executable directory")
        .to_path_buf();

    let exe_name = if cfg!(windows) {
        "uvcscan.exe"
    } else {
        "uvcscan"
    };

    root.join(exe_name)
}

/// Format an error message for when *uvcscan* did not exit successfully.
fn format_exit_error(args: &[&str], output: &process::Output) -> String {
    format!(
        "`uvcscan {}` did not exit successfully.\nstdout:\n---\n{}---\nstderr:\n---\n{}---",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Format an error message for when the output of *uvcscan* did not match the expected output.
fn format_output_error(args: &[&str], expected: &str, actual: &str) -> String {
    // Generate diff text.
    let diff_text = diff::lines(expected, actual)
        .into_iter()
        .map(|diff| match diff {
            diff::Result::Left(l) => format!("-{}", l),
            diff::Result::Both(l, _) => format!(" {}", l),
            diff::Result::Right(r) => format!("+{}", r),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        concat!(
            "`uvcscan {}` did not produce the expected output.\n",
            "Showing diff between expected and actual:\n{}\n"
        ),
        args.join(" "),
        diff_text
    )
}

/// Trim whitespace from the end of each line.
fn trim_lines(s: &str) -> String {
    s.lines()
        .map(|line| line.trim_end())
        .fold(String::new(), |mut str, line| {
            str.push_str(line);
            str.push('\n');
            str
        })
}

impl TestEnv {
    pub fn new() -> TestEnv {
        TestEnv {
            uvcscan_exe: find_uvcscan_exe(),
        }
    }

    fn run(&self, dump_file: &str, args: &[&str]) -> process::Output {
        process::Command::new(&self.uvcscan_exe)
            .arg("--config")
            .arg(EMPTY_CONFIG)
            .arg("--no-colour")
            .arg(dump_file)
            .args(args)
            .output()
            .expect("uvcscan output")
    }

    /// Assert that calling *uvcscan* on `dump_file` with the specified arguments succeeds
    pub fn assert_success_and_get_output(
        &self,
        dump_file: &str,
        args: &[&str],
    ) -> process::Output {
        let output = self.run(dump_file, args);

        // Check for exit status.
        if !output.status.success() {
            panic!("{}", format_exit_error(args, &output));
        }

        output
    }

    /// Assert that calling *uvcscan* with the specified arguments produces the expected output,
    /// or output containing it if `contains`.
    ///
    /// Trailing whitespace of each line is ignored; a `contains` match may span part of a line.
    pub fn assert_output(&self, dump_file: &str, args: &[&str], expected: &str, contains: bool) {
        let output = self.assert_success_and_get_output(dump_file, args);
        let actual = trim_lines(&String::from_utf8_lossy(&output.stdout));
        // don't add a line ending when doing contains
        let expected = if contains {
            expected.to_string()
        } else {
            trim_lines(expected)
        };

        // Compare actual output to expected output.
        if contains {
            if !actual.contains(&expected) {
                panic!("{}", format_output_error(args, &expected, &actual));
            }
        } else if expected != actual {
            panic!("{}", format_output_error(args, &expected, &actual));
        }
    }

    /// Assert the `--json` output includes `expected`
    pub fn assert_output_json(&self, dump_file: &str, args: &[&str], expected: serde_json::Value) {
        let output = self.assert_success_and_get_output(dump_file, args);
        let actual: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("uvcscan output is json");

        // Compare actual output to expected output.
        assert_json_diff::assert_json_include!(actual: actual, expected: expected);
    }

    /// Assert that calling *uvcscan* with the specified arguments produces the expected error,
    /// and does not succeed.
    pub fn assert_failure_with_error(&self, dump_file: &str, args: &[&str], expected: &str) {
        let output = self.run(dump_file, args);
        if output.status.success() {
            panic!("error '{}' did not occur.", expected);
        }

        let actual_err = String::from_utf8_lossy(&output.stderr);
        if !actual_err.contains(expected) {
            panic!("{}", format_output_error(args, expected, &actual_err));
        }
    }
}

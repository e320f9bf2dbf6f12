#![allow(dead_code)]

use monkey_lang::Monkey;

/// Path of an interpreted test script.
pub fn script_path(scope: &str, name: &str) -> String {
    format!("tests/target/{scope}/{name}.monkey")
}

/// Runs a script in-process against a captured output sink and returns the
/// lines it printed.
pub fn run_script(scope: &str, name: &str) -> Vec<String> {
    let mut output = Vec::new();
    Monkey::new(&mut output).run_file(&script_path(scope, name));

    String::from_utf8(output)
        .expect("interpreted output should be valid UTF-8")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Declares one test per script line. A `prints` script runs in-process and
/// must write exactly the given lines. A `fails` script runs through the
/// built binary and must exit nonzero with exactly the given stderr lines.
#[macro_export]
macro_rules! script_tests {
    () => {};

    ($scope:ident / $name:ident prints $($line:literal)+ ; $($rest:tt)*) => {
        #[test]
        fn $name() {
            let lines = crate::common::run_script(stringify!($scope), stringify!($name));
            let expected: Vec<&str> = vec![$($line),+];
            assert_eq!(lines, expected);
        }

        script_tests!($($rest)*);
    };

    ($scope:ident / $name:ident fails $($line:literal)+ ; $($rest:tt)*) => {
        #[test]
        fn $name() {
            use assert_cmd::Command;

            let stderr: String = [$($line),+].iter()
                .map(|line| format!("{line}\n"))
                .collect();

            Command::cargo_bin("monkey").unwrap()
                .arg(crate::common::script_path(stringify!($scope), stringify!($name)))
                .assert()
                .failure()
                .stderr(stderr);
        }

        script_tests!($($rest)*);
    };
}

#[macro_use]
mod common;

script_tests! {
    string / operations prints "Hello World!" "11" "true" "false" "true";
}

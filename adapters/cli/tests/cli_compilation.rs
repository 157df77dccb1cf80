use std::process::Command;

#[test]
fn simulation_binary_type_checks() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "gridfire"])
        .status()
        .expect("could not launch cargo check");

    assert!(status.success(), "the gridfire binary no longer type-checks");
}
